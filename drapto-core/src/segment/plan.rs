// ============================================================================
// drapto-core/src/segment/plan.rs
// ============================================================================
//
// SEGMENT PLANNER (C5)
//
// Shells out to the `drapto-scd` scene-change detector, converts its frame
// numbers to second-granular timestamps, drops candidates closer than
// `min_scene_gap`, then sweeps the timeline inserting synthetic boundaries
// wherever a gap would otherwise exceed `max_segment_len`.
//
// AI-ASSISTANT-INFO: Scene detection + min-gap filter + max-gap synthetic fill

use std::path::Path;
use std::process::Command;

use tempfile::NamedTempFile;

use crate::error::{CoreError, CoreResult};
use crate::probe::{Session, StreamType};

/// Plans segment boundary timestamps (strictly inside `(0, duration)`) for
/// `input`. Fails with `SegmentationError` if the detector produces no
/// candidate scenes at all — fixed-interval segmentation is explicitly
/// refused.
pub fn plan_segments(session: &Session, input: &Path, min_scene_gap: f64, max_segment_len: f64) -> CoreResult<Vec<f64>> {
    let duration = crate::probe::get_duration(session, StreamType::Video, 0)
        .or_else(|_| crate::probe::get_duration(session, StreamType::Format, 0))?;

    let frame_rate = session.get_string("r_frame_rate", StreamType::Video, 0)?;
    let (fps_num, fps_den) = parse_frame_rate(&frame_rate)
        .ok_or_else(|| CoreError::SegmentationError(format!("unparseable frame rate: {frame_rate}")))?;
    let total_frames = total_frame_count(session, duration, fps_num, fps_den)?;

    let frames = detect_scene_frames(input, fps_num, fps_den, total_frames)?;

    let fps = fps_num / fps_den;
    let min_gap_frames = (min_scene_gap * fps).round() as u64;

    let mut kept: Vec<f64> = Vec::new();
    let mut last_frame: Option<u64> = None;
    for &frame in &frames {
        if frame == 0 || frame as f64 / fps >= duration {
            continue;
        }
        if let Some(last) = last_frame {
            if frame.saturating_sub(last) < min_gap_frames {
                continue;
            }
        }
        kept.push(frame as f64 / fps);
        last_frame = Some(frame);
    }

    // `detect_scene_frames` always carries a synthetic frame-0 entry from
    // `drapto-scd`, which is dropped above — `kept` empty means no real scene
    // boundary survived, and the planner refuses to fall back to
    // fixed-interval segmentation.
    if kept.is_empty() {
        return Err(CoreError::SegmentationError(
            "scene detector produced no candidate boundaries".to_string(),
        ));
    }

    Ok(enforce_max_gap(kept, duration, max_segment_len))
}

/// Inserts synthetic boundaries so that no gap between consecutive
/// boundaries (including the implicit `0` and `duration` ends) exceeds
/// `max_segment_len`.
fn enforce_max_gap(kept: Vec<f64>, duration: f64, max_segment_len: f64) -> Vec<f64> {
    let mut boundaries = Vec::new();
    let mut prev = 0.0;

    for &ts in kept.iter().chain(std::iter::once(&duration)) {
        let mut cursor = prev;
        while ts - cursor > max_segment_len {
            cursor += max_segment_len;
            if cursor < ts {
                boundaries.push(cursor);
            }
        }
        if ts < duration {
            boundaries.push(ts);
        }
        prev = ts;
    }

    boundaries.sort_by(|a, b| a.partial_cmp(b).unwrap());
    boundaries.dedup_by(|a, b| (*a - *b).abs() < 1e-6);
    boundaries
}

fn parse_frame_rate(s: &str) -> Option<(f64, f64)> {
    let (num, den) = s.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    if den == 0.0 {
        None
    } else {
        Some((num, den))
    }
}

fn total_frame_count(session: &Session, duration: f64, fps_num: f64, fps_den: f64) -> CoreResult<u64> {
    if let Ok(n) = session.get_int("nb_frames", StreamType::Video, 0) {
        if n > 0 {
            return Ok(n as u64);
        }
    }
    Ok((duration * (fps_num / fps_den)).round() as u64)
}

/// Invokes `drapto-scd` and parses its one-frame-number-per-line output file.
fn detect_scene_frames(input: &Path, fps_num: f64, fps_den: f64, total_frames: u64) -> CoreResult<Vec<u64>> {
    let output_file = NamedTempFile::new().map_err(CoreError::Io)?;

    let mut cmd = Command::new("drapto-scd");
    cmd.arg("--input")
        .arg(input)
        .arg("--output")
        .arg(output_file.path())
        .arg("--fps-num")
        .arg(fps_num.to_string())
        .arg("--fps-den")
        .arg(fps_den.to_string())
        .arg("--total-frames")
        .arg(total_frames.to_string());

    crate::process::run(&mut cmd)?;

    let contents = std::fs::read_to_string(output_file.path()).map_err(CoreError::Io)?;
    let frames: Vec<u64> = contents
        .lines()
        .filter_map(|l| l.trim().parse::<u64>().ok())
        .collect();

    Ok(frames)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enforce_max_gap_fills_long_spans() {
        let boundaries = enforce_max_gap(vec![10.0, 100.0], 150.0, 30.0);
        assert!(boundaries.windows(2).all(|w| w[1] - w[0] <= 30.0 + 1e-6));
        assert!(boundaries.iter().all(|&b| b > 0.0 && b < 150.0));
    }

    #[test]
    fn enforce_max_gap_keeps_close_scenes_untouched() {
        let boundaries = enforce_max_gap(vec![5.0, 10.0, 15.0], 20.0, 30.0);
        assert_eq!(boundaries, vec![5.0, 10.0, 15.0]);
    }

    #[test]
    fn parse_frame_rate_handles_ratio() {
        assert_eq!(parse_frame_rate("24000/1001"), Some((24000.0, 1001.0)));
        assert_eq!(parse_frame_rate("garbage"), None);
    }
}
