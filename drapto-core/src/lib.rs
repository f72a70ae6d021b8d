//! # drapto-core
//!
//! Core library for a chunked AV1 transcoding pipeline: scene-aware
//! segmentation, memory-aware parallel segment encoding via `ab-av1`, Opus
//! audio, and a stream-copy mux, orchestrated around `ffmpeg`/`ffprobe`.
//!
//! ## Module structure
//!
//! - `config` — immutable [`CoreConfig`] record plus [`config::CoreConfigBuilder`].
//! - `error` — [`CoreError`] taxonomy and [`CoreResult`].
//! - `process` — external-process runner and ffmpeg progress parsing (C1).
//! - `probe` — per-file ffprobe session and duration fallback ladder (C2).
//! - `classify` — resolution/HDR/Dolby Vision classification (C3).
//! - `crop` — crop detection (C4).
//! - `segment` — scene-aware boundary planning and stream-copy cutting (C5/C6).
//! - `encode` — per-segment `ab-av1` drive with retry ladder (C7).
//! - `scheduler` — memory-aware parallel dispatch loop (C8).
//! - `concat` — segment stitching (C9).
//! - `audio` — per-track Opus encode (C10).
//! - `mux` — final container mux and AV-sync validation (C11).
//! - `pipeline` — per-file state machine and directory batch mode (C12).
//! - `discovery`, `temp_files`, `notifications`, `hardware_accel`, `logging` —
//!   ambient stack shared with `drapto-cli`.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use drapto_core::config::CoreConfigBuilder;
//! use std::path::PathBuf;
//!
//! let config = CoreConfigBuilder::new()
//!     .input_dir(PathBuf::from("/path/to/input"))
//!     .output_dir(PathBuf::from("/path/to/output"))
//!     .log_dir(PathBuf::from("/path/to/logs"))
//!     .build();
//!
//! let summary = drapto_core::pipeline::process_file(
//!     &config,
//!     &PathBuf::from("/path/to/input/movie.mkv"),
//!     &PathBuf::from("/path/to/output"),
//! ).unwrap();
//! ```
//!
//! AI-ASSISTANT-INFO: Core library for the chunked AV1 transcoding pipeline

// ============================================================================
// MODULE DECLARATIONS
// ============================================================================

pub mod audio;
pub mod classify;
pub mod concat;
pub mod config;
pub mod crop;
pub mod discovery;
pub mod encode;
pub mod error;
pub mod hardware_accel;
pub mod logging;
pub mod mux;
pub mod notifications;
pub mod pipeline;
pub mod probe;
pub mod process;
pub mod scheduler;
pub mod segment;
pub mod temp_files;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

pub use config::CoreConfig;
pub use discovery::find_processable_files;
pub use error::{CoreError, CoreResult};
pub use pipeline::{process_directory, process_file, BatchSummary, Summary};
