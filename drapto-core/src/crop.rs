// ============================================================================
// drapto-core/src/crop.rs
// ============================================================================
//
// CROP DETECTOR (C4)
//
// Samples a handful of frames through ffmpeg's `cropdetect` filter and picks
// the modal detected height, skipping opening/closing credits on long films.
// Threshold starts low for SDR and high for HDR, with HDR further calibrated
// against a `blackdetect` sample of the actual black level.
//
// AI-ASSISTANT-INFO: cropdetect sampling, modal height selection, bar math

use std::path::Path;
use std::process::Command;

use log::warn;

use crate::hardware_accel::HardwareAcceleration;
use crate::probe::{Session, StreamType};

const SDR_THRESHOLD: u32 = 16;
const HDR_THRESHOLD: u32 = 128;
const MIN_SAMPLES: usize = 20;

/// Result of crop detection: an optional ffmpeg `crop=W:H:X:Y` filter string
/// (`None` means no crop is needed, or detection failed) and the HDR flag
/// used to pick the threshold.
pub struct CropResult {
    pub filter: Option<String>,
    pub is_hdr: bool,
}

/// Runs the 8-step crop detection algorithm against the file backing `session`.
/// Never fails the caller: on any sampling/parsing problem it logs a warning
/// and returns `filter: None` so the pipeline can continue without crop.
pub fn detect(session: &Session, path: &Path, is_hdr: bool) -> CropResult {
    match try_detect(session, path, is_hdr) {
        Ok(filter) => CropResult { filter, is_hdr },
        Err(e) => {
            warn!("crop detection failed for {}: {e}", path.display());
            CropResult { filter: None, is_hdr }
        }
    }
}

fn try_detect(session: &Session, path: &Path, is_hdr: bool) -> Result<Option<String>, String> {
    let width = session
        .get_int("width", StreamType::Video, 0)
        .map_err(|e| e.to_string())? as u32;
    let height = session
        .get_int("height", StreamType::Video, 0)
        .map_err(|e| e.to_string())? as u32;
    let duration = crate::probe::get_duration(session, StreamType::Video, 0)
        .or_else(|_| crate::probe::get_duration(session, StreamType::Format, 0))
        .map_err(|e| e.to_string())?;

    let hwaccel = HardwareAcceleration::detect();
    let threshold = choose_threshold(path, duration, is_hdr, &hwaccel);

    let skip = credits_skip(duration);
    let effective_duration = (duration - skip).max(0.0);

    let interval = (effective_duration / MIN_SAMPLES as f64).max(1.0);
    let sample_count = MIN_SAMPLES.max((effective_duration / interval).ceil() as usize);

    let sample_times: Vec<f64> = (0..sample_count)
        .map(|i| skip + i as f64 * interval)
        .filter(|&t| t < duration)
        .collect();

    // Insertion-ordered counts: a `HashMap`'s iteration order is
    // nondeterministic, which would make tie-breaks arbitrary. Keeping a
    // `Vec` in first-seen order lets the modal-height pick below favor
    // whichever height was observed first among equally-frequent heights.
    let mut height_counts: Vec<(u32, usize)> = Vec::new();
    for &start in &sample_times {
        let frames_per_sample = 2;
        if let Some(crops) = sample_cropdetect(path, start, threshold, frames_per_sample, &hwaccel) {
            for (w, h) in crops {
                if w == width && h >= 100 {
                    match height_counts.iter_mut().find(|(height, _)| *height == h) {
                        Some((_, count)) => *count += 1,
                        None => height_counts.push((h, 1)),
                    }
                }
            }
        }
    }

    let Some(modal_height) = pick_modal_height(&height_counts) else {
        return Ok(None);
    };

    let bar = (height as i64 - modal_height as i64) / 2;
    if bar <= 0 {
        return Ok(None);
    }

    if (bar as f64) * 100.0 / height as f64 > 1.0 {
        Ok(Some(format!("crop={width}:{modal_height}:0:{bar}")))
    } else {
        Ok(Some(format!("crop={width}:{height}:0:0")))
    }
}

/// Picks the most-frequent height in `counts`, breaking ties toward whichever
/// entry appears first (§4.4 step 7: "first encountered").
fn pick_modal_height(counts: &[(u32, usize)]) -> Option<u32> {
    counts
        .iter()
        .fold(None, |best: Option<&(u32, usize)>, entry| match best {
            Some(b) if b.1 >= entry.1 => Some(b),
            _ => Some(entry),
        })
        .map(|&(height, _)| height)
}

fn credits_skip(duration: f64) -> f64 {
    if duration > 3600.0 {
        180.0
    } else if duration > 1200.0 {
        60.0
    } else if duration > 300.0 {
        30.0
    } else {
        0.0
    }
}

/// SDR starts at 16; HDR starts at 128 and is refined by sampling average
/// black level through `blackdetect` and scaling it.
fn choose_threshold(path: &Path, duration: f64, is_hdr: bool, hwaccel: &HardwareAcceleration) -> u32 {
    if !is_hdr {
        return SDR_THRESHOLD;
    }

    match sample_black_level(path, duration, hwaccel) {
        Some(avg_black) => ((avg_black * 1.5).round() as u32).clamp(16, 256),
        None => HDR_THRESHOLD,
    }
}

fn sample_black_level(path: &Path, duration: f64, hwaccel: &HardwareAcceleration) -> Option<f64> {
    let sample_positions: Vec<f64> = [0.2, 0.4, 0.6, 0.8]
        .iter()
        .map(|frac| duration * frac)
        .collect();

    let mut levels = Vec::new();
    for start in sample_positions {
        let mut cmd = Command::new("ffmpeg");
        cmd.args(["-ss", &format!("{start:.2}")])
            .args(hwaccel.get_ffmpeg_hwaccel_args())
            .arg("-i")
            .arg(path)
            .args([
                "-vframes",
                "5",
                "-vf",
                "blackdetect=d=0:pic_th=0.98",
                "-f",
                "null",
                "-",
            ]);

        if let Ok(output) = crate::process::run(&mut cmd) {
            let stderr = String::from_utf8_lossy(&output.stderr);
            for line in stderr.lines() {
                if let Some(level) = parse_black_level(line) {
                    levels.push(level);
                }
            }
        }
    }

    if levels.is_empty() {
        None
    } else {
        Some(levels.iter().sum::<f64>() / levels.len() as f64)
    }
}

fn parse_black_level(line: &str) -> Option<f64> {
    line.find("pic_th:")
        .and_then(|pos| line[pos + "pic_th:".len()..].split_whitespace().next())
        .and_then(|s| s.parse::<f64>().ok())
        .map(|ratio| ratio * 255.0)
}

/// Runs `cropdetect` over `frame_count` frames starting at `start`, returning
/// every distinct `(w, h)` pair seen (x/y are not needed for modal-height
/// selection and are discarded).
fn sample_cropdetect(
    path: &Path,
    start: f64,
    threshold: u32,
    frame_count: u32,
    hwaccel: &HardwareAcceleration,
) -> Option<Vec<(u32, u32)>> {
    let mut cmd = Command::new("ffmpeg");
    cmd.args(["-ss", &format!("{start:.2}")])
        .args(hwaccel.get_ffmpeg_hwaccel_args())
        .arg("-i")
        .arg(path)
        .args([
            "-vframes",
            &frame_count.to_string(),
            "-vf",
            &format!("cropdetect=limit={threshold}:round=2:reset=1"),
            "-f",
            "null",
            "-",
        ]);

    let output = crate::process::run(&mut cmd).ok()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    Some(parse_crop_lines(&stderr))
}

fn parse_crop_lines(output: &str) -> Vec<(u32, u32)> {
    let mut results = Vec::new();
    for line in output.lines() {
        let Some(pos) = line.find("crop=") else { continue };
        let rest = &line[pos + 5..];
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let value = &rest[..end];
        let parts: Vec<&str> = value.split(':').collect();
        if parts.len() == 4 {
            if let (Ok(w), Ok(h)) = (parts[0].parse::<u32>(), parts[1].parse::<u32>()) {
                results.push((w, h));
            }
        }
    }
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credits_skip_buckets() {
        assert_eq!(credits_skip(4000.0), 180.0);
        assert_eq!(credits_skip(1300.0), 60.0);
        assert_eq!(credits_skip(400.0), 30.0);
        assert_eq!(credits_skip(100.0), 0.0);
    }

    #[test]
    fn parse_crop_lines_extracts_pairs() {
        let output = "[cropdetect] crop=1920:800:0:140\n[cropdetect] crop=1920:800:0:140 pts:1\n";
        assert_eq!(parse_crop_lines(output), vec![(1920, 800), (1920, 800)]);
    }

    #[test]
    fn parse_crop_lines_ignores_non_matching() {
        assert_eq!(parse_crop_lines("no crop here"), Vec::<(u32, u32)>::new());
    }

    #[test]
    fn pick_modal_height_breaks_ties_toward_first_encountered() {
        let counts = vec![(800, 3), (816, 3), (790, 1)];
        assert_eq!(pick_modal_height(&counts), Some(800));
    }

    #[test]
    fn pick_modal_height_picks_strict_majority() {
        let counts = vec![(790, 1), (800, 5), (816, 2)];
        assert_eq!(pick_modal_height(&counts), Some(800));
    }

    #[test]
    fn pick_modal_height_empty_is_none() {
        assert_eq!(pick_modal_height(&[]), None);
    }
}
