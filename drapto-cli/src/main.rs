// ============================================================================
// drapto-cli/src/main.rs
// ============================================================================
//
// MAIN ENTRY POINT: Drapto CLI Application
//
// Parses arguments, sets up logging, checks external dependencies are on
// PATH, then drives the pipeline against the given input.
//
// AI-ASSISTANT-INFO: Entry point for CLI application, handles arg parsing and command dispatch

use clap::Parser;
use log::{error, LevelFilter};

use drapto_cli::cli::Cli;
use drapto_cli::{logging, preflight};

/// Exit code used when the user interrupts the process (Ctrl-C), per the
/// CLI's documented exit-code contract (0 success, 1 failure, 130 interrupted).
const EXIT_INTERRUPTED: i32 = 130;

/// Grace period between SIGTERM and SIGKILL when a Ctrl-C cancels any
/// in-flight ffmpeg/ab-av1/mediainfo children (§4.1 signal discipline).
const CANCEL_GRACE_PERIOD: std::time::Duration = std::time::Duration::from_secs(5);

fn main() {
    ctrlc::set_handler(|| {
        eprintln!("interrupted");
        drapto_core::process::cancel_all_children(CANCEL_GRACE_PERIOD);
        std::process::exit(EXIT_INTERRUPTED);
    })
    .expect("failed to install SIGINT handler");

    let cli = Cli::parse();

    let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    if let Err(e) = logging::init(level, cli.log_dir.as_deref()) {
        eprintln!("failed to initialize logging: {e}");
        std::process::exit(1);
    }

    if cli.no_color {
        // SAFETY: called once, before any other thread is spawned.
        unsafe { std::env::set_var("NO_COLOR", "1") };
    }

    if let Err(e) = preflight::check_dependencies() {
        error!("dependency check failed: {e}");
        std::process::exit(1);
    }

    match drapto_cli::run(&cli) {
        Ok(()) => std::process::exit(0),
        Err(e) => {
            error!("{e:#}");
            std::process::exit(1);
        }
    }
}
