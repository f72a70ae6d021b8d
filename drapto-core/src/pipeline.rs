// ============================================================================
// drapto-core/src/pipeline.rs
// ============================================================================
//
// PIPELINE ORCHESTRATOR (C12)
//
// Drives a single input file through `Init -> Classify -> Plan -> Cut ->
// EncodeParallel -> Concat -> AudioEncode -> Mux -> Validate -> Summarize`.
// Dolby Vision content takes a sibling single-pass leaf that skips
// segmentation/scheduling entirely but shares classification, crop
// detection, audio encoding, muxing and validation with the chunked path.
//
// AI-ASSISTANT-INFO: Per-file state machine, DV single-pass sibling, directory batch roll-up

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use log::{info, warn};
use serde::Serialize;

use crate::classify;
use crate::concat;
use crate::config::CoreConfig;
use crate::crop;
use crate::encode::{self, MemoryCategory, SegmentStats};
use crate::error::{CoreError, CoreResult};
use crate::mux;
use crate::probe::{Session, StreamType};
use crate::scheduler;
use crate::{audio, temp_files};

/// Extensions considered in directory mode, per the external-interface
/// contract. Case-insensitive.
pub const DEFAULT_EXTENSIONS: &[&str] = &["mkv", "mp4"];

/// Per-file summary record: `{filename, input_size, output_size, reduction,
/// encoding_time, output_file}`.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub filename: String,
    pub input_size: u64,
    pub output_size: u64,
    pub reduction: f64,
    pub encoding_time: f64,
    pub output_file: PathBuf,
    /// C8's "progress summary" — totals/means/VMAF aggregates over the
    /// chunked encode's segments. `None` on the Dolby Vision single-pass
    /// path, which never runs the scheduler.
    pub segment_summary: Option<EncodeProgressSummary>,
}

/// C8 §4.8 "Progress summary": totals (duration, size), means (bitrate,
/// realtime factor), and VMAF aggregates computed over the segments that
/// reported a score, after the scheduler's dispatch loop drains.
#[derive(Debug, Clone, Serialize)]
pub struct EncodeProgressSummary {
    pub segment_count: usize,
    pub total_input_duration_secs: f64,
    pub total_output_duration_secs: f64,
    pub total_output_size_bytes: u64,
    pub mean_bitrate_kbps: f64,
    pub mean_realtime_factor: f64,
    pub vmaf_avg: Option<f64>,
    pub vmaf_min: Option<f64>,
    pub vmaf_max: Option<f64>,
}

fn summarize_segment_stats(stats: &[SegmentStats]) -> EncodeProgressSummary {
    let segment_count = stats.len();
    let total_input_duration_secs = stats.iter().map(|s| s.input_duration).sum();
    let total_output_duration_secs = stats.iter().map(|s| s.output_duration).sum();
    let total_output_size_bytes = stats.iter().map(|s| s.output_size_bytes).sum();

    let mean = |f: fn(&SegmentStats) -> f64| -> f64 {
        if segment_count == 0 {
            0.0
        } else {
            stats.iter().map(f).sum::<f64>() / segment_count as f64
        }
    };
    let mean_bitrate_kbps = mean(|s| s.bitrate_kbps);
    let mean_realtime_factor = mean(|s| s.realtime_factor);

    let scored: Vec<&SegmentStats> = stats.iter().filter(|s| s.vmaf.avg.is_some()).collect();
    let (vmaf_avg, vmaf_min, vmaf_max) = if scored.is_empty() {
        (None, None, None)
    } else {
        let avg = scored.iter().filter_map(|s| s.vmaf.avg).sum::<f64>() / scored.len() as f64;
        let min = scored.iter().filter_map(|s| s.vmaf.min.or(s.vmaf.avg)).fold(f64::INFINITY, f64::min);
        let max = scored.iter().filter_map(|s| s.vmaf.max.or(s.vmaf.avg)).fold(f64::NEG_INFINITY, f64::max);
        (Some(avg), Some(min), Some(max))
    };

    EncodeProgressSummary {
        segment_count,
        total_input_duration_secs,
        total_output_duration_secs,
        total_output_size_bytes,
        mean_bitrate_kbps,
        mean_realtime_factor,
        vmaf_avg,
        vmaf_min,
        vmaf_max,
    }
}

/// Aggregate roll-up for directory-mode batch processing.
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub files: Vec<Summary>,
    pub total_input_size: u64,
    pub total_output_size: u64,
    pub total_reduction: f64,
    pub total_encoding_time: f64,
}

impl BatchSummary {
    fn from_summaries(files: Vec<Summary>) -> Self {
        let total_input_size: u64 = files.iter().map(|s| s.input_size).sum();
        let total_output_size: u64 = files.iter().map(|s| s.output_size).sum();
        let total_encoding_time: f64 = files.iter().map(|s| s.encoding_time).sum();
        let total_reduction = if total_input_size > 0 {
            (total_input_size as f64 - total_output_size as f64) / total_input_size as f64 * 100.0
        } else {
            0.0
        };

        Self {
            files,
            total_input_size,
            total_output_size,
            total_reduction,
            total_encoding_time,
        }
    }
}

/// Resolves the final output path per the CLI contract: if `output` is an
/// existing directory (or has no extension and doesn't exist yet), the
/// output filename is `<input stem>.mkv` inside it; otherwise `output` is
/// used verbatim.
pub fn resolve_output_path(input: &Path, output: &Path) -> CoreResult<PathBuf> {
    let treat_as_dir = output.is_dir() || (output.extension().is_none() && !output.exists());
    if !treat_as_dir {
        return Ok(output.to_path_buf());
    }

    std::fs::create_dir_all(output).map_err(CoreError::Io)?;
    let stem = input
        .file_stem()
        .ok_or_else(|| CoreError::PathError(format!("invalid input filename: {}", input.display())))?;
    Ok(output.join(format!("{}.mkv", stem.to_string_lossy())))
}

/// Processes a single input file through the full pipeline, writing the
/// result to `output` (resolved per [`resolve_output_path`]) and returning
/// its summary record. On any stage failure the job's temp workspace
/// (`segments/`, `encoded_segments/`, `working/`) is left in place for
/// diagnosis; on success it is removed.
pub fn process_file(config: &CoreConfig, input: &Path, output: &Path) -> CoreResult<Summary> {
    let start = Instant::now();

    if !input.exists() {
        return Err(CoreError::PathError(format!("input not found: {}", input.display())));
    }
    let output_file = resolve_output_path(input, output)?;
    let input_size = std::fs::metadata(input).map_err(CoreError::Io)?.len();

    std::fs::create_dir_all(config.segments_dir()).map_err(CoreError::Io)?;
    std::fs::create_dir_all(config.encoded_segments_dir()).map_err(CoreError::Io)?;
    std::fs::create_dir_all(config.working_dir()).map_err(CoreError::Io)?;

    let result = run_stages(config, input, &output_file);

    let segment_summary = match result {
        Ok(summary) => {
            temp_files::cleanup_workspace(config)?;
            summary
        }
        Err(e) => {
            warn!(
                "pipeline failed for {}, preserving workspace at {} for diagnosis",
                input.display(),
                config.workdir.display()
            );
            return Err(e);
        }
    };

    let output_size = std::fs::metadata(&output_file).map_err(CoreError::Io)?.len();
    let reduction = if input_size > 0 {
        (input_size as f64 - output_size as f64) / input_size as f64 * 100.0
    } else {
        0.0
    };
    let encoding_time = start.elapsed().as_secs_f64();

    let summary = Summary {
        filename: input.file_name().unwrap_or_default().to_string_lossy().to_string(),
        input_size,
        output_size,
        reduction,
        encoding_time,
        output_file,
        segment_summary,
    };

    info!(
        "finished {} in {:.1}s ({:.1}% reduction)",
        summary.filename, summary.encoding_time, summary.reduction
    );
    if let Some(seg) = &summary.segment_summary {
        info!(
            "segments: {} encoded, mean bitrate {:.0}kbps, mean realtime {:.2}x, vmaf avg={:?} min={:?} max={:?}",
            seg.segment_count, seg.mean_bitrate_kbps, seg.mean_realtime_factor, seg.vmaf_avg, seg.vmaf_min, seg.vmaf_max
        );
    }

    Ok(summary)
}

fn run_stages(config: &CoreConfig, input: &Path, output_file: &Path) -> CoreResult<Option<EncodeProgressSummary>> {
    // Classify
    crate::logging::log_section("CLASSIFY");
    let session = Session::open(input)?;
    let classification = classify::classify(&session, input)?;
    info!(
        "{}: {:?} ({}w), hdr={}, dolby_vision={}",
        input.display(),
        classification.resolution,
        classification.width,
        classification.is_hdr,
        classification.is_dolby_vision
    );

    let crop_filter = if config.disable_crop {
        None
    } else {
        crop::detect(&session, input, classification.is_hdr).filter
    };

    let (video_track, segment_summary) = if classification.is_dolby_vision {
        let track = run_dv_path(config, input, &session, crop_filter.as_deref(), classification.is_hdr)?;
        (track, None)
    } else {
        let (track, summary) =
            run_chunked_path(config, input, &session, crop_filter.as_deref(), classification.is_hdr)?;
        (track, Some(summary))
    };

    // AudioEncode
    crate::logging::log_section("AUDIO ENCODE");
    let audio_tracks = audio::encode_all_tracks(input, &config.working_dir())?;

    // Mux
    crate::logging::log_section("MUX");
    mux::mux(&video_track, &audio_tracks, output_file)?;

    // Validate
    crate::logging::log_section("VALIDATE");
    validate_output(input, output_file, audio_tracks.len())?;

    Ok(segment_summary)
}

/// Plan -> Cut -> EncodeParallel -> Concat, producing the muxable video track.
fn run_chunked_path(
    config: &CoreConfig,
    input: &Path,
    session: &Session,
    crop_filter: Option<&str>,
    is_hdr: bool,
) -> CoreResult<(PathBuf, EncodeProgressSummary)> {
    crate::logging::log_section("PLAN");
    let boundaries = crate::segment::plan_segments(session, input, config.min_scene_gap, config.max_segment_len)?;

    crate::logging::log_section("CUT");
    let source_duration = crate::probe::get_duration(session, StreamType::Video, 0)
        .or_else(|_| crate::probe::get_duration(session, StreamType::Format, 0))?;
    let segments = crate::segment::cut_segments(input, &config.segments_dir(), &boundaries)?;
    crate::segment::validate_segments(source_duration, &segments, &boundaries)?;

    crate::logging::log_section("ENCODE (parallel, memory-aware)");
    let (encoded_segments, segment_summary) = encode_segments_parallel(config, &segments, crop_filter, is_hdr)?;

    crate::logging::log_section("CONCAT");
    let concat_list_path = config.working_dir().join("concat.txt");
    let video_track = config.working_dir().join("video.mkv");
    concat::concat_segments(&encoded_segments, &concat_list_path, &video_track)?;

    Ok((video_track, segment_summary))
}

/// Single external encode call, no segmentation or scheduler involvement.
fn run_dv_path(
    config: &CoreConfig,
    input: &Path,
    session: &Session,
    crop_filter: Option<&str>,
    is_hdr: bool,
) -> CoreResult<PathBuf> {
    crate::logging::log_section("ENCODE (Dolby Vision, single pass)");
    let _ = session;
    let video_track = config.working_dir().join("video.mkv");

    let (stats, _log_lines) = encode::encode_segment(
        input,
        &video_track,
        crop_filter,
        is_hdr,
        true,
        config.encoder_preset,
        &config.svt_params,
        &config.keyframe_interval,
        &config.pixel_format,
        &config.vmaf_options,
        &config.encoder,
        config.target_vmaf,
        config.target_vmaf_hdr,
    )?;
    info!(
        "dolby vision encode complete: {:.1}s (realtime {:.2}x)",
        stats.encoding_time_secs, stats.realtime_factor
    );

    Ok(video_track)
}

/// Determines each segment's memory category up front (from its width, via
/// a cheap probe), then drives the scheduler's encode loop.
fn encode_segments_parallel(
    config: &CoreConfig,
    segments: &[PathBuf],
    crop_filter: Option<&str>,
    is_hdr: bool,
) -> CoreResult<(Vec<PathBuf>, EncodeProgressSummary)> {
    let mut categories = Vec::with_capacity(segments.len());
    for segment in segments {
        let session = Session::open(segment)?;
        let width = session.get_int("width", StreamType::Video, 0)? as u32;
        categories.push(MemoryCategory::from_dimensions(width, is_hdr));
    }

    let encoded_dir = config.encoded_segments_dir();
    let segments = Arc::new(segments.to_vec());
    let crop_filter = crop_filter.map(str::to_string);
    let preset = config.encoder_preset;
    let svt_params = config.svt_params.clone();
    let keyframe_interval = config.keyframe_interval.clone();
    let pixel_format = config.pixel_format.clone();
    let vmaf_options = config.vmaf_options.clone();
    let encoder = config.encoder.clone();
    let target_vmaf = config.target_vmaf;
    let target_vmaf_hdr = config.target_vmaf_hdr;

    let encode_fn = {
        let segments = Arc::clone(&segments);
        Arc::new(move |i: usize| -> CoreResult<(SegmentStats, Vec<String>)> {
            let src = &segments[i];
            let dst = encoded_dir.join(src.file_name().expect("segment path has a filename"));
            encode::encode_segment(
                src,
                &dst,
                crop_filter.as_deref(),
                is_hdr,
                false,
                preset,
                &svt_params,
                &keyframe_interval,
                &pixel_format,
                &vmaf_options,
                &encoder,
                target_vmaf,
                target_vmaf_hdr,
            )
        })
    };

    let stats = scheduler::run(
        &categories,
        config.warmup_segments,
        config.max_tokens,
        config.stagger_delay_ms,
        encode_fn,
    )?;
    let summary = summarize_segment_stats(&stats);
    info!(
        "scheduler progress summary: {} segment(s), {:.1}s -> {:.1}s, mean bitrate {:.0}kbps, mean realtime {:.2}x",
        summary.segment_count,
        summary.total_input_duration_secs,
        summary.total_output_duration_secs,
        summary.mean_bitrate_kbps,
        summary.mean_realtime_factor
    );

    let mut encoded: Vec<PathBuf> = std::fs::read_dir(config.encoded_segments_dir())
        .map_err(CoreError::Io)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().is_some_and(|ext| ext == "mkv"))
        .collect();
    encoded.sort();

    Ok((encoded, summary))
}

/// Final validation pass: confirms the muxed output exists, is AV1/Opus, and
/// carries the expected audio track count. The finer-grained AV-sync check
/// already ran inside [`mux::mux`].
fn validate_output(_input: &Path, output: &Path, expected_audio_tracks: usize) -> CoreResult<()> {
    let session = Session::open(output)?;

    let video_codec = session.get_string("codec_name", StreamType::Video, 0)?;
    if video_codec != "av1" {
        return Err(CoreError::ValidationError(format!(
            "output video codec is `{video_codec}`, expected `av1`"
        )));
    }

    let audio_count = session.stream_count(StreamType::Audio);
    if audio_count != expected_audio_tracks {
        return Err(CoreError::ValidationError(format!(
            "output has {audio_count} audio tracks, expected {expected_audio_tracks}"
        )));
    }

    for i in 0..audio_count {
        let codec = session.get_string("codec_name", StreamType::Audio, i)?;
        if codec != "opus" {
            return Err(CoreError::ValidationError(format!(
                "output audio track {i} codec is `{codec}`, expected `opus`"
            )));
        }
    }

    Ok(())
}

/// Processes every eligible file (by [`DEFAULT_EXTENSIONS`]) beneath
/// `input_dir`, in directory order, aggregating a final roll-up. A single
/// file's failure is logged and excluded from the batch rather than
/// aborting the whole run.
pub fn process_directory(config: &CoreConfig, input_dir: &Path, output_dir: &Path) -> CoreResult<BatchSummary> {
    std::fs::create_dir_all(output_dir).map_err(CoreError::Io)?;

    let mut files = crate::discovery::find_processable_files(input_dir)?;
    files.sort();

    info!("found {} input file(s) in {}", files.len(), input_dir.display());

    let mut summaries = Vec::with_capacity(files.len());
    for (i, input) in files.iter().enumerate() {
        info!("processing file {}/{}: {}", i + 1, files.len(), input.display());
        match process_file(config, input, output_dir) {
            Ok(summary) => summaries.push(summary),
            Err(e) => warn!("failed to process {}: {e}", input.display()),
        }
    }

    let batch = BatchSummary::from_summaries(summaries);
    info!(
        "batch complete: {} file(s), {:.1}% total reduction, {:.1}s total",
        batch.files.len(),
        batch.total_reduction,
        batch.total_encoding_time
    );

    Ok(batch)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ResolutionCategory;
    use crate::encode::VmafScores;

    fn stub_stats(input_duration: f64, output_duration: f64, size: u64, bitrate: f64, realtime: f64, vmaf: Option<f64>) -> SegmentStats {
        SegmentStats {
            segment_name: "0000.mkv".to_string(),
            input_duration,
            output_duration,
            output_size_bytes: size,
            bitrate_kbps: bitrate,
            encoding_time_secs: 1.0,
            realtime_factor: realtime,
            peak_rss_bytes: 0,
            resolution: ResolutionCategory::Hd,
            memory_category: MemoryCategory::Hd1080,
            vmaf: VmafScores { avg: vmaf, min: vmaf, max: vmaf },
            crop_filter: None,
        }
    }

    #[test]
    fn summarize_segment_stats_aggregates_totals_means_and_vmaf() {
        let stats = vec![
            stub_stats(10.0, 9.5, 1_000_000, 800.0, 1.5, Some(95.0)),
            stub_stats(20.0, 19.0, 2_000_000, 1000.0, 2.0, Some(97.0)),
            stub_stats(5.0, 4.8, 500_000, 600.0, 1.2, None),
        ];
        let summary = summarize_segment_stats(&stats);

        assert_eq!(summary.segment_count, 3);
        assert!((summary.total_input_duration_secs - 35.0).abs() < 1e-9);
        assert!((summary.total_output_duration_secs - 33.3).abs() < 1e-9);
        assert_eq!(summary.total_output_size_bytes, 3_500_000);
        assert!((summary.mean_bitrate_kbps - 800.0).abs() < 1e-9);
        assert!((summary.mean_realtime_factor - (1.5 + 2.0 + 1.2) / 3.0).abs() < 1e-9);
        // only the two scored segments feed the VMAF aggregate
        assert!((summary.vmaf_avg.unwrap() - 96.0).abs() < 1e-9);
        assert_eq!(summary.vmaf_min.unwrap(), 95.0);
        assert_eq!(summary.vmaf_max.unwrap(), 97.0);
    }

    #[test]
    fn summarize_segment_stats_handles_no_segments() {
        let summary = summarize_segment_stats(&[]);
        assert_eq!(summary.segment_count, 0);
        assert_eq!(summary.mean_bitrate_kbps, 0.0);
        assert!(summary.vmaf_avg.is_none());
    }

    #[test]
    fn resolve_output_path_uses_input_stem_for_directory_output() {
        let tmp = tempfile::tempdir().unwrap();
        let input = Path::new("/videos/movie.mkv");
        let resolved = resolve_output_path(input, tmp.path()).unwrap();
        assert_eq!(resolved, tmp.path().join("movie.mkv"));
    }

    #[test]
    fn resolve_output_path_keeps_explicit_file_path() {
        let tmp = tempfile::tempdir().unwrap();
        let output = tmp.path().join("out.mkv");
        let input = Path::new("/videos/movie.mkv");
        let resolved = resolve_output_path(input, &output).unwrap();
        assert_eq!(resolved, output);
    }

    #[test]
    fn batch_summary_aggregates_totals() {
        let summaries = vec![
            Summary {
                filename: "a.mkv".to_string(),
                input_size: 1000,
                output_size: 500,
                reduction: 50.0,
                encoding_time: 10.0,
                output_file: PathBuf::from("/out/a.mkv"),
                segment_summary: None,
            },
            Summary {
                filename: "b.mkv".to_string(),
                input_size: 2000,
                output_size: 1000,
                reduction: 50.0,
                encoding_time: 20.0,
                output_file: PathBuf::from("/out/b.mkv"),
                segment_summary: None,
            },
        ];
        let batch = BatchSummary::from_summaries(summaries);
        assert_eq!(batch.total_input_size, 3000);
        assert_eq!(batch.total_output_size, 1500);
        assert_eq!(batch.total_encoding_time, 30.0);
        assert!((batch.total_reduction - 50.0).abs() < 1e-9);
    }
}
