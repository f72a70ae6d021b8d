// ============================================================================
// drapto-cli/src/cli.rs
// ============================================================================
//
// COMMAND-LINE INTERFACE: Argument Definitions
//
// Defines the single-command CLI surface: an input path (file or directory)
// and an output path, plus the handful of flags the pipeline exposes.
//
// AI-ASSISTANT-INFO: clap derive CLI definition, single `encode`-shaped command

use std::path::PathBuf;

use clap::Parser;

/// Transcode a video file or directory of video files to chunked, scene-aware AV1.
#[derive(Parser, Debug)]
#[command(
    name = "drapto",
    version,
    about = "Chunked AV1 transcoding pipeline",
    long_about = "Segments input video at scene boundaries, encodes each segment in \
                  parallel via ab-av1 under a memory-aware scheduler, then re-muxes \
                  video, Opus audio, and subtitles into the output container."
)]
pub struct Cli {
    /// Input video file, or a directory of video files.
    pub input: PathBuf,

    /// Output file (single-input mode) or directory (directory mode).
    pub output: PathBuf,

    /// Directory for log files (defaults to OUTPUT/logs, or OUTPUT's parent/logs
    /// when OUTPUT is a file path).
    #[arg(long, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Disable automatic crop detection.
    #[arg(long)]
    pub disable_crop: bool,

    /// ntfy.sh topic URL for a job-complete push notification.
    #[arg(long, value_name = "TOPIC_URL", env = "DRAPTO_NTFY_TOPIC")]
    pub ntfy: Option<String>,

    /// Enable debug-level logging.
    #[arg(short, long)]
    pub verbose: bool,

    /// Disable colored terminal output.
    #[arg(long)]
    pub no_color: bool,
}
