// ============================================================================
// drapto-core/src/segment/cut.rs
// ============================================================================
//
// SEGMENTER (C6)
//
// Splits the input file into raw (unencoded) segments at the planned
// boundaries using a stream-copy `-f segment`, then validates the resulting
// set against the source duration and the plan.
//
// AI-ASSISTANT-INFO: ffmpeg stream-copy segmentation + post-cut validation

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{info, warn};

use crate::error::{CoreError, CoreResult};
use crate::probe::{Session, StreamType};

/// Cuts `input` into raw segments under `segments_dir`, named `%04d.mkv`.
/// Boundaries at or below 1.0s are dropped to avoid a trivial leading
/// segment. Returns the sorted list of segment file paths.
pub fn cut_segments(input: &Path, segments_dir: &Path, boundaries: &[f64]) -> CoreResult<Vec<PathBuf>> {
    std::fs::create_dir_all(segments_dir).map_err(CoreError::Io)?;

    let segment_times = boundaries
        .iter()
        .filter(|&&t| t > 1.0)
        .map(|t| format!("{t:.2}"))
        .collect::<Vec<_>>()
        .join(",");

    let output_pattern = segments_dir.join("%04d.mkv");

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "warning", "-i"])
        .arg(input)
        .args(["-c:v", "copy", "-an", "-f", "segment"]);

    if !segment_times.is_empty() {
        cmd.args(["-segment_times", &segment_times]);
    }

    cmd.args(["-reset_timestamps", "1"]).arg(&output_pattern);

    crate::process::run(&mut cmd).map_err(|e| CoreError::SegmentationError(e.to_string()))?;

    let mut segments = Vec::new();
    for entry in std::fs::read_dir(segments_dir).map_err(CoreError::Io)? {
        let entry = entry.map_err(CoreError::Io)?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "mkv") {
            segments.push(path);
        }
    }
    segments.sort();

    if segments.is_empty() {
        return Err(CoreError::SegmentationError(
            "cut command produced no segments".to_string(),
        ));
    }

    info!("cut {} into {} segments", input.display(), segments.len());
    Ok(segments)
}

/// Validates the cut segment set against the source duration and the
/// planned boundaries, per the invariants in §4.6/§8.
pub fn validate_segments(source_duration: f64, segments: &[PathBuf], planned_boundaries: &[f64]) -> CoreResult<()> {
    if segments.is_empty() {
        return Err(CoreError::ValidationError("no segments to validate".to_string()));
    }

    let mut total_duration = 0.0;
    for (i, segment) in segments.iter().enumerate() {
        let metadata = std::fs::metadata(segment).map_err(CoreError::Io)?;
        if metadata.len() < 1024 {
            return Err(CoreError::ValidationError(format!(
                "segment {} is smaller than 1 KiB",
                segment.display()
            )));
        }

        let session = Session::open(segment)?;
        let duration = crate::probe::get_duration(&session, StreamType::Video, 0)?;
        let is_final = i == segments.len() - 1;

        if is_final {
            if duration < 0.1 {
                return Err(CoreError::ValidationError(format!(
                    "final segment {} is below the 0.1s floor ({duration:.3}s)",
                    segment.display()
                )));
            }
        } else if duration < 1.0 {
            let aligned = planned_boundaries
                .iter()
                .any(|&b| (b - total_duration - duration).abs() <= 0.5);
            if !aligned {
                warn!(
                    "segment {} is short ({duration:.3}s) and not aligned with a planned scene boundary",
                    segment.display()
                );
            }
        }

        total_duration += duration;
    }

    let tolerance = (source_duration * 0.02).max(1.0);
    if (total_duration - source_duration).abs() > tolerance {
        return Err(CoreError::ValidationError(format!(
            "segment durations sum to {total_duration:.2}s, source is {source_duration:.2}s (tolerance {tolerance:.2}s)"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_segments_rejects_empty_set() {
        let err = validate_segments(100.0, &[], &[]).unwrap_err();
        assert!(matches!(err, CoreError::ValidationError(_)));
    }
}
