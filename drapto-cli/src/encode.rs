// ============================================================================
// drapto-cli/src/encode.rs
// ============================================================================
//
// ENCODE DRIVER: Builds a CoreConfig from parsed args and drives the pipeline
//
// Dispatches on whether `input` is a file or directory, calls the matching
// `drapto_core::pipeline` entry point, prints a summary, and sends a
// best-effort ntfy notification on completion.
//
// AI-ASSISTANT-INFO: CLI-to-core glue, file vs. directory dispatch, summary printing

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use owo_colors::OwoColorize;

use drapto_core::config::CoreConfigBuilder;
use drapto_core::notifications::{NotificationType, NtfyNotificationSender};
use drapto_core::pipeline::{self, BatchSummary, Summary};

use crate::cli::Cli;

/// Runs the pipeline against `cli.input`, dispatching on whether it names a
/// file or a directory, and reports the result.
pub fn run(cli: &Cli) -> Result<()> {
    if !cli.input.exists() {
        bail!("input not found: {}", cli.input.display());
    }

    let log_dir = resolve_log_dir(cli);
    let config = CoreConfigBuilder::new()
        .input_dir(cli.input.clone())
        .output_dir(cli.output.clone())
        .log_dir(log_dir)
        .disable_crop(cli.disable_crop)
        .build();

    let result = if cli.input.is_dir() {
        pipeline::process_directory(&config, &cli.input, &cli.output)
            .map(EncodeOutcome::Batch)
            .context("batch processing failed")
    } else {
        pipeline::process_file(&config, &cli.input, &cli.output)
            .map(EncodeOutcome::Single)
            .context("encoding failed")
    };

    notify(cli, &result);

    match result {
        Ok(outcome) => {
            print_outcome(&outcome);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

enum EncodeOutcome {
    Single(Summary),
    Batch(BatchSummary),
}

/// Resolves the log directory: `--log-dir` if given, else the `DRAPTO_LOG_DIR`
/// environment variable, else `$HOME/drapto_logs`, per the CLI's documented
/// environment contract.
fn resolve_log_dir(cli: &Cli) -> std::path::PathBuf {
    if let Some(dir) = &cli.log_dir {
        return dir.clone();
    }
    let home = std::env::var("HOME").map(PathBuf::from).unwrap_or_else(|_| PathBuf::from("."));
    drapto_core::config::get_env_path("DRAPTO_LOG_DIR", home.join("drapto_logs"))
}

fn notify(cli: &Cli, result: &Result<EncodeOutcome>) {
    let Some(topic) = &cli.ntfy else { return };

    let sender = match NtfyNotificationSender::new(topic) {
        Ok(sender) => sender,
        Err(e) => {
            log::warn!("ntfy notification skipped: {e}");
            return;
        }
    };

    let hostname = hostname();
    let notification = match result {
        Ok(EncodeOutcome::Single(summary)) => NotificationType::EncodeComplete {
            input_path: cli.input.clone(),
            output_path: summary.output_file.clone(),
            input_size: summary.input_size,
            output_size: summary.output_size,
            duration: std::time::Duration::from_secs_f64(summary.encoding_time),
            hostname,
        },
        Ok(EncodeOutcome::Batch(batch)) => NotificationType::Custom {
            title: "Batch Complete".to_string(),
            message: format!(
                "{} file(s), {:.1}% total reduction, {:.1}s total",
                batch.files.len(),
                batch.total_reduction,
                batch.total_encoding_time
            ),
            priority: 3,
        },
        Err(e) => NotificationType::EncodeError {
            input_path: cli.input.clone(),
            message: e.to_string(),
            hostname,
        },
    };

    if let Err(e) = sender.send_notification(&notification) {
        log::warn!("ntfy notification failed: {e}");
    }
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "unknown".to_string())
}

fn print_outcome(outcome: &EncodeOutcome) {
    match outcome {
        EncodeOutcome::Single(summary) => print_summary(summary),
        EncodeOutcome::Batch(batch) => {
            for summary in &batch.files {
                print_summary(summary);
            }
            println!();
            println!("{}", "batch complete".bold().green());
            println!(
                "  {} file(s), {:.1}% total reduction, {:.1}s total",
                batch.files.len(),
                batch.total_reduction,
                batch.total_encoding_time
            );
        }
    }
}

fn print_summary(summary: &Summary) {
    println!(
        "{} -> {} ({:.1}% reduction, {:.1}s)",
        summary.filename,
        summary.output_file.display(),
        summary.reduction,
        summary.encoding_time
    );
    if let Some(seg) = &summary.segment_summary {
        print!(
            "  {} segment(s), mean bitrate {:.0}kbps, mean realtime {:.2}x",
            seg.segment_count, seg.mean_bitrate_kbps, seg.mean_realtime_factor
        );
        match seg.vmaf_avg {
            Some(avg) => println!(", vmaf avg {avg:.1}"),
            None => println!(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli_with(output: &str, log_dir: Option<&str>) -> Cli {
        Cli {
            input: PathBuf::from("movie.mkv"),
            output: PathBuf::from(output),
            log_dir: log_dir.map(PathBuf::from),
            disable_crop: false,
            ntfy: None,
            verbose: false,
            no_color: false,
        }
    }

    #[test]
    fn resolve_log_dir_prefers_explicit_flag() {
        let cli = cli_with("/out", Some("/custom/logs"));
        assert_eq!(resolve_log_dir(&cli), PathBuf::from("/custom/logs"));
    }

    /// Exercises the `DRAPTO_LOG_DIR` and `$HOME` fallback tiers in one test
    /// so the two env-var mutations can't race against a sibling test.
    #[test]
    fn resolve_log_dir_falls_back_to_env_var_then_home() {
        let cli = cli_with("/out", None);
        let prev_log_dir = std::env::var("DRAPTO_LOG_DIR").ok();
        let prev_home = std::env::var("HOME").ok();

        // SAFETY: single-threaded within this test; env is restored below.
        unsafe {
            std::env::set_var("DRAPTO_LOG_DIR", "/env/logs");
        }
        assert_eq!(resolve_log_dir(&cli), PathBuf::from("/env/logs"));

        // SAFETY: see above.
        unsafe {
            std::env::remove_var("DRAPTO_LOG_DIR");
            std::env::set_var("HOME", "/home/tester");
        }
        assert_eq!(resolve_log_dir(&cli), PathBuf::from("/home/tester/drapto_logs"));

        // SAFETY: see above.
        unsafe {
            match prev_log_dir {
                Some(v) => std::env::set_var("DRAPTO_LOG_DIR", v),
                None => std::env::remove_var("DRAPTO_LOG_DIR"),
            }
            match prev_home {
                Some(v) => std::env::set_var("HOME", v),
                None => std::env::remove_var("HOME"),
            }
        }
    }
}
