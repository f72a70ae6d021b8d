// ============================================================================
// drapto-core/src/concat.rs
// ============================================================================
//
// CONCATENATOR (C9)
//
// Writes a concat-demuxer list file for the encoded segments (in plan order)
// and stream-copies them into a single file, then checks the result's
// duration and codec.
//
// AI-ASSISTANT-INFO: concat-list generation, stream-copy concat, post-checks

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use crate::error::{CoreError, CoreResult};
use crate::probe::{Session, StreamType};

const DURATION_TOLERANCE_SECS: f64 = 1.0;

/// Writes `concat_list_path` listing `segments` in order, then stream-copies
/// them into `output`. Validates that the output exists, is nonempty, its
/// duration matches the summed segment durations within 1.0s, and its video
/// codec is `av1`.
pub fn concat_segments(segments: &[PathBuf], concat_list_path: &Path, output: &Path) -> CoreResult<()> {
    if segments.is_empty() {
        return Err(CoreError::ConcatenationError("no segments to concatenate".to_string()));
    }

    let mut total_duration = 0.0;
    {
        let mut file = File::create(concat_list_path).map_err(CoreError::Io)?;
        for segment in segments {
            let session = Session::open(segment)?;
            total_duration += crate::probe::get_duration(&session, StreamType::Video, 0)?;

            let absolute = segment
                .canonicalize()
                .map_err(CoreError::Io)?;
            writeln!(file, "file '{}'", absolute.display()).map_err(CoreError::Io)?;
        }
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "warning"])
        .args(["-f", "concat", "-safe", "0", "-i"])
        .arg(concat_list_path)
        .args(["-c", "copy", "-y"])
        .arg(output);

    crate::process::run(&mut cmd).map_err(|e| CoreError::ConcatenationError(e.to_string()))?;

    let metadata = std::fs::metadata(output).map_err(|_| {
        CoreError::ConcatenationError(format!("concat output missing: {}", output.display()))
    })?;
    if metadata.len() == 0 {
        return Err(CoreError::ConcatenationError(format!(
            "concat output is empty: {}",
            output.display()
        )));
    }

    let output_session = Session::open(output)?;
    let output_duration = crate::probe::get_duration(&output_session, StreamType::Video, 0)?;
    if (output_duration - total_duration).abs() > DURATION_TOLERANCE_SECS {
        return Err(CoreError::ConcatenationError(format!(
            "concat output duration {output_duration:.2}s differs from segment sum {total_duration:.2}s by more than {DURATION_TOLERANCE_SECS}s"
        )));
    }

    let codec = output_session.get_string("codec_name", StreamType::Video, 0)?;
    if codec != "av1" {
        return Err(CoreError::ConcatenationError(format!(
            "concat output video codec is `{codec}`, expected `av1`"
        )));
    }

    info!("concatenated {} segments into {}", segments.len(), output.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concat_segments_rejects_empty_input() {
        let err = concat_segments(&[], Path::new("/tmp/concat.txt"), Path::new("/tmp/out.mkv")).unwrap_err();
        assert!(matches!(err, CoreError::ConcatenationError(_)));
    }
}
