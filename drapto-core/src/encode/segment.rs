// ============================================================================
// drapto-core/src/encode/segment.rs
// ============================================================================
//
// SEGMENT ENCODER (C7)
//
// Drives the external VMAF-targeted encoder (`ab-av1 auto-encode`) against a
// single raw segment, following a three-rung retry ladder when the target
// VMAF can't be hit. Collects the stats the scheduler needs to calibrate its
// memory model and report progress.
//
// AI-ASSISTANT-INFO: ab-av1 invocation, VMAF parsing, retry ladder

use std::path::Path;
use std::time::Instant;

use log::{debug, info};

use crate::classify::ResolutionCategory;
use crate::error::{CoreError, CoreResult};
use crate::probe::{Session, StreamType};

/// `{SDR, 1080p, 4k}` — the memory-model category, distinct from the SD/HD/UHD
/// CRF bucket in `classify::ResolutionCategory`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryCategory {
    Sdr,
    Hd1080,
    Uhd4k,
}

impl MemoryCategory {
    pub fn from_dimensions(width: u32, _is_hdr: bool) -> Self {
        if width >= 3840 {
            MemoryCategory::Uhd4k
        } else if width >= 1920 {
            MemoryCategory::Hd1080
        } else {
            MemoryCategory::Sdr
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VmafScores {
    pub avg: Option<f64>,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

/// Per-encode record for one segment.
#[derive(Debug, Clone)]
pub struct SegmentStats {
    pub segment_name: String,
    pub input_duration: f64,
    pub output_duration: f64,
    pub output_size_bytes: u64,
    pub bitrate_kbps: f64,
    pub encoding_time_secs: f64,
    pub realtime_factor: f64,
    pub peak_rss_bytes: u64,
    pub resolution: ResolutionCategory,
    pub memory_category: MemoryCategory,
    pub vmaf: VmafScores,
    pub crop_filter: Option<String>,
}

const RETRY_LIMIT: usize = 3;

struct RetryParams {
    samples: usize,
    sample_duration_secs: u32,
    target_vmaf: f32,
}

fn retry_params(retry: usize, target_vmaf: f32, target_vmaf_hdr: f32, is_hdr: bool) -> CoreResult<RetryParams> {
    let target = if is_hdr { target_vmaf_hdr } else { target_vmaf };
    match retry {
        0 => Ok(RetryParams {
            samples: 3,
            sample_duration_secs: 1,
            target_vmaf: target,
        }),
        1 => Ok(RetryParams {
            samples: 4,
            sample_duration_secs: 2,
            target_vmaf: target,
        }),
        2 => Ok(RetryParams {
            samples: 4,
            sample_duration_secs: 2,
            target_vmaf: crate::config::FINAL_RETRY_MIN_VMAF,
        }),
        _ => Err(CoreError::SegmentEncodingError(format!(
            "exceeded retry limit ({RETRY_LIMIT}) for segment encode"
        ))),
    }
}

/// Encodes `src` into `dst` via `ab-av1 auto-encode`, retrying on encode or
/// probe failure up to `RETRY_LIMIT` attempts. Returns the collected stats
/// alongside the buffered stderr lines (for source-ordered log emission by
/// the scheduler).
pub fn encode_segment(
    src: &Path,
    dst: &Path,
    crop_filter: Option<&str>,
    is_hdr: bool,
    is_dv: bool,
    encoder_preset: u8,
    svt_params: &str,
    keyframe_interval: &str,
    pixel_format: &str,
    vmaf_options: &str,
    encoder: &str,
    target_vmaf: f32,
    target_vmaf_hdr: f32,
) -> CoreResult<(SegmentStats, Vec<String>)> {
    encode_with_retry(
        src,
        dst,
        crop_filter,
        is_hdr,
        is_dv,
        0,
        encoder_preset,
        svt_params,
        keyframe_interval,
        pixel_format,
        vmaf_options,
        encoder,
        target_vmaf,
        target_vmaf_hdr,
    )
}

#[allow(clippy::too_many_arguments)]
fn encode_with_retry(
    src: &Path,
    dst: &Path,
    crop_filter: Option<&str>,
    is_hdr: bool,
    is_dv: bool,
    retry: usize,
    encoder_preset: u8,
    svt_params: &str,
    keyframe_interval: &str,
    pixel_format: &str,
    vmaf_options: &str,
    encoder: &str,
    target_vmaf: f32,
    target_vmaf_hdr: f32,
) -> CoreResult<(SegmentStats, Vec<String>)> {
    let params = retry_params(retry, target_vmaf, target_vmaf_hdr, is_hdr)?;

    let attempt = try_encode(
        src,
        dst,
        crop_filter,
        is_hdr,
        is_dv,
        &params,
        encoder_preset,
        svt_params,
        keyframe_interval,
        pixel_format,
        vmaf_options,
        encoder,
    );

    match attempt {
        Ok(result) => Ok(result),
        Err(e) => {
            debug!(
                "segment encode attempt {retry} failed for {}: {e}",
                src.display()
            );
            encode_with_retry(
                src,
                dst,
                crop_filter,
                is_hdr,
                is_dv,
                retry + 1,
                encoder_preset,
                svt_params,
                keyframe_interval,
                pixel_format,
                vmaf_options,
                encoder,
                target_vmaf,
                target_vmaf_hdr,
            )
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn try_encode(
    src: &Path,
    dst: &Path,
    crop_filter: Option<&str>,
    is_hdr: bool,
    is_dv: bool,
    params: &RetryParams,
    encoder_preset: u8,
    svt_params: &str,
    keyframe_interval: &str,
    pixel_format: &str,
    vmaf_options: &str,
    encoder: &str,
) -> CoreResult<(SegmentStats, Vec<String>)> {
    let input_session = Session::open(src)?;
    let input_duration = crate::probe::get_duration(&input_session, StreamType::Video, 0)?;
    let width = input_session.get_int("width", StreamType::Video, 0)? as u32;

    let mut cmd = std::process::Command::new("ab-av1");
    cmd.arg("auto-encode")
        .arg("--input")
        .arg(src)
        .arg("--output")
        .arg(dst)
        .arg("--encoder")
        .arg(encoder)
        .arg("--min-vmaf")
        .arg(params.target_vmaf.to_string())
        .arg("--preset")
        .arg(encoder_preset.to_string())
        .arg("--svt")
        .arg(svt_params)
        .arg("--keyint")
        .arg(keyframe_interval)
        .arg("--samples")
        .arg(params.samples.to_string())
        .arg("--sample-duration")
        .arg(format!("{}s", params.sample_duration_secs))
        .arg("--vmaf")
        .arg(vmaf_options)
        .arg("--pix-format")
        .arg(pixel_format);

    if let Some(filter) = crop_filter {
        cmd.arg("--vfilter").arg(filter);
    }
    if is_dv {
        cmd.arg("--enc").arg("dolbyvision=true");
    }

    let start = Instant::now();
    let output = crate::process::run(&mut cmd)
        .map_err(|e| CoreError::SegmentEncodingError(e.to_string()))?;
    let encoding_time_secs = start.elapsed().as_secs_f64();

    let stderr = String::from_utf8_lossy(&output.stderr);
    let vmaf = parse_vmaf_scores(&stderr);
    let log_lines: Vec<String> = stderr.lines().map(str::to_string).collect();

    let output_session = Session::open(dst)?;
    let output_duration = crate::probe::get_duration(&output_session, StreamType::Video, 0)?;
    let output_size_bytes = std::fs::metadata(dst).map_err(CoreError::Io)?.len();
    let bitrate_kbps = if output_duration > 0.0 {
        (output_size_bytes as f64 * 8.0) / (output_duration * 1000.0)
    } else {
        0.0
    };
    let realtime_factor = if encoding_time_secs > 0.0 {
        input_duration / encoding_time_secs
    } else {
        0.0
    };

    let stats = SegmentStats {
        segment_name: src
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        input_duration,
        output_duration,
        output_size_bytes,
        bitrate_kbps,
        encoding_time_secs,
        realtime_factor,
        peak_rss_bytes: peak_rss_bytes(),
        resolution: ResolutionCategory::from_width(width),
        memory_category: MemoryCategory::from_dimensions(width, is_hdr),
        vmaf,
        crop_filter: crop_filter.map(str::to_string),
    };

    info!(
        "encoded segment {} in {:.1}s (realtime {:.2}x)",
        stats.segment_name, stats.encoding_time_secs, stats.realtime_factor
    );

    Ok((stats, log_lines))
}

/// Parses `VMAF <number>`-shaped lines (and the common `ab-av1`/SVT-AV1
/// variants) out of encoder stderr.
fn parse_vmaf_scores(stderr: &str) -> VmafScores {
    let mut values = Vec::new();

    for line in stderr.lines() {
        if let Some(pos) = line.find("VMAF") {
            let rest = &line[pos + 4..];
            let rest = rest.trim_start_matches([' ', ':']).trim_start_matches("score:").trim();
            let token = rest.split_whitespace().next().unwrap_or("");
            if let Ok(v) = token.trim_end_matches(['%', ',']).parse::<f64>() {
                values.push(v);
            }
        }
    }

    if values.is_empty() {
        return VmafScores::default();
    }

    let avg = values.iter().sum::<f64>() / values.len() as f64;
    let min = values.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = values.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    VmafScores {
        avg: Some(avg),
        min: Some(min),
        max: Some(max),
    }
}

/// Best-effort peak RSS of the current process, in bytes. Returns 0 when the
/// platform doesn't expose it.
#[cfg(target_os = "linux")]
fn peak_rss_bytes() -> u64 {
    std::fs::read_to_string("/proc/self/status")
        .ok()
        .and_then(|status| {
            status.lines().find_map(|l| {
                l.strip_prefix("VmHWM:")
                    .and_then(|rest| rest.trim().trim_end_matches(" kB").parse::<u64>().ok())
                    .map(|kb| kb * 1024)
            })
        })
        .unwrap_or(0)
}

#[cfg(not(target_os = "linux"))]
fn peak_rss_bytes() -> u64 {
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_params_ladder_matches_spec() {
        let p0 = retry_params(0, 93.0, 95.0, false).unwrap();
        assert_eq!((p0.samples, p0.sample_duration_secs), (3, 1));
        assert_eq!(p0.target_vmaf, 93.0);

        let p1 = retry_params(1, 93.0, 95.0, true).unwrap();
        assert_eq!((p1.samples, p1.sample_duration_secs), (4, 2));
        assert_eq!(p1.target_vmaf, 95.0);

        let p2 = retry_params(2, 93.0, 95.0, false).unwrap();
        assert_eq!((p2.samples, p2.sample_duration_secs), (4, 2));
        assert_eq!(p2.target_vmaf, 95.0);

        assert!(retry_params(3, 93.0, 95.0, false).is_err());
    }

    #[test]
    fn parse_vmaf_scores_extracts_values() {
        let stderr = "frame 1\nVMAF 94.321\nVMAF 95.112\ndone";
        let scores = parse_vmaf_scores(stderr);
        assert!(scores.avg.is_some());
        assert!((scores.min.unwrap() - 94.321).abs() < 1e-6);
        assert!((scores.max.unwrap() - 95.112).abs() < 1e-6);
    }

    #[test]
    fn parse_vmaf_scores_empty_on_no_match() {
        let scores = parse_vmaf_scores("nothing here");
        assert!(scores.avg.is_none());
    }
}
