// ============================================================================
// drapto-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Custom Error Types and Result Definitions
//
// This module defines the custom error handling infrastructure for the drapto-core
// library. It provides a comprehensive error type hierarchy that covers all possible
// error conditions that can occur during the chunked encoding pipeline, from
// dependency checks through segmentation, parallel encoding, concatenation, audio
// encoding, muxing, and final validation.
//
// KEY COMPONENTS:
// - CoreError: Enum of all possible errors with descriptive messages
// - CoreResult: Type alias for Result<T, CoreError> for consistent return types
//
// ERROR CATEGORIES:
// - I/O and filesystem errors (Io, PathError)
// - External command errors (Command with CommandErrorKind, ProcessError)
// - Dependency errors (DependencyError)
// - Metadata/probing errors (MetadataError, FfprobeParse, JsonParseError)
// - Stage-specific pipeline errors (SegmentationError, SegmentEncodingError,
//   ConcatenationError, AudioEncodingError, MuxingError, ValidationError)
// - Notification errors (NotificationError)
//
// USAGE:
// Functions in the library return CoreResult<T> to provide consistent error
// handling. Consumers can use the ? operator to propagate errors or match
// on specific error variants for custom handling.
//
// AI-ASSISTANT-INFO: Error handling infrastructure for the drapto-core library

// ---- External crate imports ----
use thiserror::Error;

// ---- Standard library imports ----
use std::io;
use std::process::ExitStatus;

// ============================================================================
// COMMAND ERROR TYPES
// ============================================================================

/// Represents the kind of command error that occurred.
#[derive(Debug)]
pub enum CommandErrorKind {
    /// Error occurred when attempting to start a command
    Start(io::Error),

    /// Error occurred when waiting for a command to complete
    Wait(io::Error),

    /// Command completed but returned a non-zero exit status
    Failed(ExitStatus, String), // exit status and stderr output
}

/// Represents an error that occurred when executing an external command.
#[derive(Debug)]
pub struct CommandError {
    /// The name of the command that failed (e.g., "ffmpeg", "ffprobe")
    pub command: String,

    /// The specific kind of error that occurred
    pub kind: CommandErrorKind,
}

// ============================================================================
// CORE ERROR TYPE
// ============================================================================

/// Comprehensive error type for the drapto-core library.
///
/// This enum represents all possible errors that can occur while driving the
/// chunked encode pipeline. Each variant carries enough context to produce a
/// single terminal error line plus (where relevant) the last stderr tail from
/// the external tool that failed.
///
/// # Examples
///
/// ```rust,no_run
/// use drapto_core::{CoreError, CoreResult};
/// use std::path::Path;
///
/// fn process_file(path: &Path) -> CoreResult<()> {
///     if !path.exists() {
///         return Err(CoreError::PathError(format!(
///             "File does not exist: {}",
///             path.display()
///         )));
///     }
///     // Process the file...
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum CoreError {
    // ---- I/O and Filesystem Errors ----
    /// Standard I/O errors from the std::io module
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// General path-related errors (invalid paths, missing files, etc.)
    #[error("Path error: {0}")]
    PathError(String),

    // ---- External Command Errors ----
    /// Errors that occur when executing external commands
    #[error("{}", format_command_error(.0))]
    Command(CommandError),

    /// Generic external-command failure carrying exit code and stderr tail,
    /// used where no more specific stage error applies.
    #[error("process failed (exit {exit_code:?}): {stderr_tail}")]
    ProcessError {
        exit_code: Option<i32>,
        stderr_tail: String,
    },

    /// A required external binary is missing. Fatal at startup.
    #[error("missing required dependency: {0}")]
    DependencyError(String),

    // ---- Parsing / Metadata Errors ----
    /// Errors that occur when parsing ffprobe output
    #[error("ffprobe output parsing error: {0}")]
    FfprobeParse(String),

    /// Errors that occur when parsing JSON output
    #[error("Failed to parse JSON output: {0}")]
    JsonParseError(String),

    /// A probe result is absent or unparseable and every fallback was exhausted.
    #[error("metadata error: {0}")]
    MetadataError(String),

    /// Errors that occur when extracting video information
    #[error("Failed to extract video information: {0}")]
    VideoInfoError(String),

    // ---- Pipeline Stage Errors ----
    /// Error indicating that no suitable video files were found
    #[error("No suitable video files found in input directory")]
    NoFilesFound,

    /// General operation failure
    #[error("Operation failed: {0}")]
    OperationFailed(String),

    /// The cut command failed, or the planner produced no boundaries.
    #[error("segmentation error: {0}")]
    SegmentationError(String),

    /// A segment could not be produced after exhausting the retry ladder.
    #[error("segment encoding error: {0}")]
    SegmentEncodingError(String),

    /// Segment, concat, or mux invariants were violated.
    #[error("validation error: {0}")]
    ValidationError(String),

    /// The concat command or its post-checks failed.
    #[error("concatenation error: {0}")]
    ConcatenationError(String),

    /// The mux command failed, or its AV-sync invariants were violated.
    #[error("muxing error: {0}")]
    MuxingError(String),

    /// A per-track audio encode failed.
    #[error("audio encoding error: {0}")]
    AudioEncodingError(String),

    // ---- Notification Errors ----
    /// Errors that occur when sending notifications. Never fatal to a job;
    /// logged and swallowed by the caller.
    #[error("Notification error: {0}")]
    NotificationError(String),

    /// Error indicating that ffmpeg reported no streams found
    #[error("FFmpeg reported 'No streams found' for input file: {0}")]
    NoStreamsFound(String),
}

// ============================================================================
// RESULT TYPE ALIAS
// ============================================================================

/// Type alias for Result using our custom error type.
///
/// This type alias is used throughout the library to provide a consistent
/// return type for functions that can fail. It simplifies function signatures
/// and makes it clear that the function can return a CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// ============================================================================
// HELPER FUNCTIONS
// ============================================================================

/// Helper function to format command errors for display.
/// This is used by the thiserror #[error] attribute for the Command variant.
fn format_command_error(err: &CommandError) -> String {
    match &err.kind {
        CommandErrorKind::Start(io_err) => {
            format!("Failed to execute {}: {}", err.command, io_err)
        }
        CommandErrorKind::Wait(io_err) => {
            format!("Failed to wait for {}: {}", err.command, io_err)
        }
        CommandErrorKind::Failed(status, stderr) => {
            format!(
                "Command {} failed with status {}. Stderr: {}",
                err.command, status, stderr
            )
        }
    }
}

/// Takes the tail of a stderr buffer for error reporting, bounded to a
/// reasonable number of lines so a terminal error doesn't dump megabytes.
pub fn stderr_tail(stderr: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = stderr.lines().collect();
    if lines.len() <= max_lines {
        stderr.trim().to_string()
    } else {
        lines[lines.len() - max_lines..].join("\n")
    }
}

// ============================================================================
// CONVERSION FUNCTIONS
// ============================================================================

/// Convenience function to create a CommandStart error
pub fn command_start_error(command: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::Command(CommandError {
        command: command.into(),
        kind: CommandErrorKind::Start(error),
    })
}

/// Convenience function to create a CommandWait error
pub fn command_wait_error(command: impl Into<String>, error: io::Error) -> CoreError {
    CoreError::Command(CommandError {
        command: command.into(),
        kind: CommandErrorKind::Wait(error),
    })
}

/// Convenience function to create a CommandFailed error
pub fn command_failed_error(
    command: impl Into<String>,
    status: ExitStatus,
    stderr: impl Into<String>,
) -> CoreError {
    CoreError::Command(CommandError {
        command: command.into(),
        kind: CommandErrorKind::Failed(status, stderr.into()),
    })
}
