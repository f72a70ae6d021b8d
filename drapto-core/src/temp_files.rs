// ============================================================================
// drapto-core/src/temp_files.rs
// ============================================================================
//
// TEMPORARY FILE MANAGEMENT: Helper Functions for Temporary Files
//
// Helpers for creating and managing the job's temp workspace under
// `CoreConfig::workdir` (`segments/`, `encoded_segments/`, `working/`). The
// fixed layout itself is assembled by `pipeline.rs`; this module provides the
// primitives it builds on.
//
// AI-ASSISTANT-INFO: Temporary file/directory helpers scoped to the configured workdir

use crate::config::CoreConfig;
use crate::error::CoreResult;

/// Removes the job's temp workspace (`segments/`, `encoded_segments/`,
/// `working/`) after a successful run. Failures are left in place for
/// diagnosis, so this is only called from the success path of the pipeline.
pub fn cleanup_workspace(config: &CoreConfig) -> CoreResult<()> {
    for dir in [
        config.segments_dir(),
        config.encoded_segments_dir(),
        config.working_dir(),
    ] {
        if dir.exists() {
            std::fs::remove_dir_all(&dir)?;
        }
    }
    Ok(())
}
