// ============================================================================
// drapto-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console + Optional File Sink
//
// drapto-core's own `logging::init` sets up a standalone `env_logger` and
// isn't composable with a second sink, so the CLI builds its own `fern`
// dispatch: always a colored console sink, plus a plain-text file sink when
// a log directory is configured.
//
// AI-ASSISTANT-INFO: fern dual console+file logger, timestamped log filenames

use std::path::Path;

use log::LevelFilter;
use owo_colors::OwoColorize;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS", used
/// to name per-run log files.
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Initializes the global logger: a colored console sink at `level`, plus
/// (when `log_dir` is `Some`) a plain-text file sink at
/// `<log_dir>/drapto_<timestamp>.log`. Creates `log_dir` if needed.
pub fn init(level: LevelFilter, log_dir: Option<&Path>) -> std::io::Result<()> {
    let console = fern::Dispatch::new()
        .format(|out, message, record| {
            let level_str = match record.level() {
                log::Level::Error => "ERROR".bright_red().to_string(),
                log::Level::Warn => "WARN ".yellow().to_string(),
                log::Level::Info => "INFO ".green().to_string(),
                log::Level::Debug => "DEBUG".blue().to_string(),
                log::Level::Trace => "TRACE".magenta().to_string(),
            };
            out.finish(format_args!("{level_str} {message}"))
        })
        .level(level)
        .chain(std::io::stdout());

    let mut dispatch = fern::Dispatch::new().chain(console);

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(format!("drapto_{}.log", get_timestamp()));
        let file = fern::log_file(&path)?;
        let file_sink = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{} [{}] {}",
                    chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                    record.level(),
                    message
                ))
            })
            .level(level)
            .chain(file);
        dispatch = dispatch.chain(file_sink);
    }

    dispatch
        .apply()
        .map_err(|e| std::io::Error::other(e.to_string()))
}
