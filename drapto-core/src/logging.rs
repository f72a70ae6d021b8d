//! Section-heading and command-tracing helpers shared by the pipeline stages.
//!
//! Console/file log sink setup lives in `drapto-cli::logging` (it needs a
//! second sink for the log file, which this crate's consumers don't all
//! need); this module only provides the formatting helpers the pipeline
//! calls into directly.

use log::debug;
use std::process::Command;
use colored::*;

/// Create a section heading in the logs to separate different pipeline stages
pub fn log_section(title: &str) {
    log::info!("");
    log::info!("{}", "=".repeat(50).bright_blue());
    log::info!("{}", title.bold().bright_white());
    log::info!("{}", "=".repeat(50).bright_blue());
    log::info!("");
}

/// Log a command being executed
pub fn log_command(cmd: &Command) {
    let program = cmd.get_program().to_string_lossy();
    let args: Vec<_> = cmd.get_args().map(|arg| arg.to_string_lossy()).collect();

    debug!("Executing command: {} {}", program.cyan(), args.join(" ").blue());
}
