// ============================================================================
// drapto-core/src/mux.rs
// ============================================================================
//
// MUXER (C11)
//
// Combines one video input and N audio inputs into a single container via
// stream copy, then validates AV sync between the video and first audio
// stream.
//
// AI-ASSISTANT-INFO: stream-copy mux, two-tier AV-sync tolerance

use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use crate::error::{CoreError, CoreResult};
use crate::probe::{Session, StreamType};

/// AV-sync tolerance used when both sides' durations came straight from their
/// own stream (no fallback involved).
const SYNC_TOLERANCE_SECS: f64 = 0.2;
/// Widened tolerance used when either side's duration required the
/// container-duration fallback.
const SYNC_TOLERANCE_FALLBACK_SECS: f64 = 0.5;

/// Muxes `video` and `audio_tracks` (stream copy only) into `output`, then
/// validates the result. Raises `MuxingError` on any failure.
pub fn mux(video: &Path, audio_tracks: &[PathBuf], output: &Path) -> CoreResult<()> {
    if !video.exists() {
        return Err(CoreError::MuxingError(format!(
            "video track does not exist: {}",
            video.display()
        )));
    }
    for audio in audio_tracks {
        if !audio.exists() {
            return Err(CoreError::MuxingError(format!(
                "audio track does not exist: {}",
                audio.display()
            )));
        }
    }

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "warning"])
        .arg("-i")
        .arg(video);
    for audio in audio_tracks {
        cmd.arg("-i").arg(audio);
    }

    cmd.args(["-map", "0:v:0"]);
    for (i, _) in audio_tracks.iter().enumerate() {
        cmd.args(["-map", &format!("{}:a:0", i + 1)]);
    }
    cmd.args(["-c", "copy", "-y"]).arg(output);

    crate::process::run(&mut cmd).map_err(|e| CoreError::MuxingError(e.to_string()))?;

    let metadata = std::fs::metadata(output)
        .map_err(|_| CoreError::MuxingError(format!("muxed output missing: {}", output.display())))?;
    if metadata.len() == 0 {
        return Err(CoreError::MuxingError(format!(
            "muxed output is empty: {}",
            output.display()
        )));
    }

    if !audio_tracks.is_empty() {
        validate_sync(output)?;
    }

    info!(
        "muxed 1 video + {} audio track(s) into {}",
        audio_tracks.len(),
        output.display()
    );
    Ok(())
}

/// Resolves `start_time` for a stream, falling back to `0.0` (ffprobe omits
/// `start_time` when it is exactly zero) and reports whether the fallback
/// duration ladder had to be used for the duration comparison.
fn stream_start(session: &Session, stream_type: StreamType) -> f64 {
    session.get_float_opt("start_time", stream_type, 0).unwrap_or(0.0)
}

fn validate_sync(output: &Path) -> CoreResult<()> {
    let session = Session::open(output)?;

    let video_start = stream_start(&session, StreamType::Video);
    let audio_start = stream_start(&session, StreamType::Audio);

    let video_duration_direct = session.get_float_opt("duration", StreamType::Video, 0);
    let audio_duration_direct = session.get_float_opt("duration", StreamType::Audio, 0);

    let video_duration = match video_duration_direct {
        Some(d) if d > 0.0 => d,
        _ => crate::probe::get_duration(&session, StreamType::Video, 0)?,
    };
    let audio_duration = match audio_duration_direct {
        Some(d) if d > 0.0 => d,
        _ => crate::probe::get_duration(&session, StreamType::Audio, 0)?,
    };

    let used_fallback = video_duration_direct.is_none_or(|d| d <= 0.0)
        || audio_duration_direct.is_none_or(|d| d <= 0.0);
    let tolerance = if used_fallback {
        SYNC_TOLERANCE_FALLBACK_SECS
    } else {
        SYNC_TOLERANCE_SECS
    };

    let start_diff = (video_start - audio_start).abs();
    let duration_diff = (video_duration - audio_duration).abs();

    if start_diff > tolerance || duration_diff > tolerance {
        return Err(CoreError::MuxingError(format!(
            "AV sync issue: |start_video {video_start:.2}s - start_audio {audio_start:.2}s| = {start_diff:.2}s, \
             |dur_video {video_duration:.2}s - dur_audio {audio_duration:.2}s| = {duration_diff:.2}s, \
             tolerance {tolerance:.2}s"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mux_rejects_missing_video() {
        let err = mux(Path::new("/nonexistent/video.mkv"), &[], Path::new("/tmp/out.mkv")).unwrap_err();
        assert!(matches!(err, CoreError::MuxingError(_)));
    }

    #[test]
    fn mux_rejects_missing_audio_track() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let err = mux(
            tmp.path(),
            &[PathBuf::from("/nonexistent/audio.mkv")],
            Path::new("/tmp/out.mkv"),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::MuxingError(_)));
    }
}
