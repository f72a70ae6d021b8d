// ============================================================================
// drapto-core/src/audio.rs
// ============================================================================
//
// AUDIO ENCODER (C10)
//
// Encodes each audio track to Opus independently, deriving bitrate and
// layout from the channel count read via the probe session. Tracks are
// encoded in parallel with rayon since each is an independent external
// process invocation.
//
// AI-ASSISTANT-INFO: per-track Opus encode, channel-derived bitrate, rayon fan-out

use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;
use rayon::prelude::*;

use crate::error::{CoreError, CoreResult};
use crate::probe::{Session, StreamType};
use crate::process;

const OPUS_APPLICATION: &str = "audio";
const OPUS_VBR: &str = "on";
const OPUS_COMPRESSION_LEVEL: u8 = 10;
const OPUS_FRAME_DURATION_MS: u32 = 20;
const LAYOUT_FILTER: &str = "aformat=channel_layouts=7.1|5.1|stereo|mono";

/// Channel-derived bitrate and layout label, per `{1->64k mono, 2->128k
/// stereo, 6->256k 5.1, 8->384k 7.1, else->48*ch kbps}`.
pub fn determine_bitrate(channels: u32) -> (String, &'static str) {
    match channels {
        1 => ("64k".to_string(), "mono"),
        2 => ("128k".to_string(), "stereo"),
        6 => ("256k".to_string(), "5.1"),
        8 => ("384k".to_string(), "7.1"),
        _ => (format!("{}k", channels as u64 * 48), "custom"),
    }
}

/// Encodes audio track `track_index` from `input` into `output`, using
/// `duration` (falling back to container duration) to drive progress.
pub fn encode_track(
    input: &Path,
    output: &Path,
    track_index: usize,
    channels: u32,
    duration: Option<f64>,
) -> CoreResult<()> {
    let (bitrate, layout) = determine_bitrate(channels);

    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-hide_banner", "-loglevel", "warning"])
        .arg("-i")
        .arg(input)
        .arg("-map")
        .arg(format!("0:a:{track_index}"))
        .arg("-c:a")
        .arg("libopus")
        .arg("-af")
        .arg(LAYOUT_FILTER)
        .arg("-application")
        .arg(OPUS_APPLICATION)
        .arg("-vbr")
        .arg(OPUS_VBR)
        .arg("-compression_level")
        .arg(OPUS_COMPRESSION_LEVEL.to_string())
        .arg("-frame_duration")
        .arg(OPUS_FRAME_DURATION_MS.to_string())
        .arg("-b:a")
        .arg(&bitrate)
        .arg("-avoid_negative_ts")
        .arg("make_zero")
        .arg("-y")
        .arg(output);

    info!(
        "audio track {track_index}: {channels} channels ({layout}), bitrate {bitrate}"
    );

    process::run_with_progress(&mut cmd, duration, 10.0, None)
        .map_err(|e| CoreError::AudioEncodingError(format!("track {track_index}: {e}")))?;

    if !output.exists() || std::fs::metadata(output).map(|m| m.len()).unwrap_or(0) == 0 {
        return Err(CoreError::AudioEncodingError(format!(
            "encoded audio track {track_index} missing or empty"
        )));
    }

    Ok(())
}

/// Encodes every audio track in `input` into `working_dir/audio-<i>.mkv`,
/// one track at a time in parallel. Returns the output paths in track order.
/// Returns an empty vec if the input has no audio streams.
pub fn encode_all_tracks(input: &Path, working_dir: &Path) -> CoreResult<Vec<PathBuf>> {
    let session = Session::open(input)?;
    let track_count = session.stream_count(StreamType::Audio);

    if track_count == 0 {
        return Ok(Vec::new());
    }

    std::fs::create_dir_all(working_dir)?;

    let mut jobs = Vec::with_capacity(track_count);
    for i in 0..track_count {
        let channels = session.get_int("channels", StreamType::Audio, i)? as u32;
        let duration = crate::probe::get_duration(&session, StreamType::Audio, i)
            .or_else(|_| crate::probe::get_duration(&session, StreamType::Format, 0))
            .ok();
        let output = working_dir.join(format!("audio-{i}.mkv"));
        jobs.push((i, channels, duration, output));
    }

    jobs.par_iter()
        .map(|(i, channels, duration, output)| encode_track(input, output, *i, *channels, *duration))
        .collect::<CoreResult<Vec<()>>>()?;

    Ok(jobs.into_iter().map(|(_, _, _, output)| output).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn determine_bitrate_matches_known_layouts() {
        assert_eq!(determine_bitrate(1), ("64k".to_string(), "mono"));
        assert_eq!(determine_bitrate(2), ("128k".to_string(), "stereo"));
        assert_eq!(determine_bitrate(6), ("256k".to_string(), "5.1"));
        assert_eq!(determine_bitrate(8), ("384k".to_string(), "7.1"));
    }

    #[test]
    fn determine_bitrate_falls_back_to_per_channel() {
        assert_eq!(determine_bitrate(4), ("192k".to_string(), "custom"));
        assert_eq!(determine_bitrate(3), ("144k".to_string(), "custom"));
    }
}
