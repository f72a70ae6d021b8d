// ============================================================================
// drapto-core/src/discovery.rs
// ============================================================================
//
// FILE DISCOVERY: Finding Video Files for Processing
//
// This module handles the discovery of video files eligible for processing.
// It provides functions to scan directories and identify files that match
// specific criteria for video encoding.
//
// KEY COMPONENTS:
// - find_processable_files: Main function to find eligible files in a directory
//
// DESIGN NOTES:
// - Matches `pipeline::DEFAULT_EXTENSIONS` (mkv, mp4), case-insensitive
// - Only searches the top level of the provided directory (no recursion)
// - Returns a CoreError::NoFilesFound if no matching files are found
//
// AI-ASSISTANT-INFO: File discovery module for finding video files to process

// ---- Internal crate imports ----
use crate::error::{CoreError, CoreResult};


// ---- Standard library imports ----
use std::path::{Path, PathBuf};

// ============================================================================
// PUBLIC FUNCTIONS
// ============================================================================

/// Finds video files eligible for processing in the specified directory.
///
/// Scans the top level of `input_dir` (no recursion) for files whose
/// extension matches [`crate::pipeline::DEFAULT_EXTENSIONS`], case-insensitive.
///
/// # Examples
///
/// ```rust,no_run
/// use drapto_core::find_processable_files;
/// use std::path::Path;
///
/// let input_dir = Path::new("/path/to/videos");
/// match find_processable_files(input_dir) {
///     Ok(files) => {
///         println!("Found {} video files:", files.len());
///         for file in files {
///             println!("  {}", file.display());
///         }
///     },
///     Err(e) => println!("Error finding video files: {}", e),
/// }
/// ```
pub fn find_processable_files(input_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let read_dir = std::fs::read_dir(input_dir)?;

    let files: Vec<PathBuf> = read_dir
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let path = entry.path();

            if !path.is_file() {
                return None;
            }

            path.extension()
                .and_then(|ext| ext.to_str())
                .filter(|ext_str| {
                    crate::pipeline::DEFAULT_EXTENSIONS
                        .iter()
                        .any(|known| known.eq_ignore_ascii_case(ext_str))
                })
                .map(|_| path.clone())
        })
        .collect();

    if files.is_empty() {
        Err(CoreError::NoFilesFound)
    } else {
        Ok(files)
    }
}
