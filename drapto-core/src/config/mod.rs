// ============================================================================
// drapto-core/src/config/mod.rs
// ============================================================================
//
// CONFIGURATION: Core Configuration Structures and Constants
//
// This module defines the configuration structures and constants used throughout
// the drapto-core library: encoder settings, quality targets per resolution
// bucket, scheduler limits, and the temp workspace root. It provides a
// flexible way to configure pipeline behavior via the builder pattern.
//
// KEY COMPONENTS:
// - CoreConfig: Main configuration structure for the library
// - CoreConfigBuilder: Builder pattern for creating CoreConfig instances
// - Default constants: Predefined values for common settings
//
// USAGE:
// Instances of CoreConfig are created by consumers of the library (like drapto-cli)
// and passed to the pipeline orchestrator to control encoding behavior.
//
// AI-ASSISTANT-INFO: Configuration structures and constants for the drapto-core library

// ---- Module declarations ----
mod builder;
mod utils;

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Re-exports ----
pub use builder::CoreConfigBuilder;
pub use utils::get_env_path;

// ============================================================================
// DEFAULT CONSTANTS
// ============================================================================

/// Default CRF quality value for Standard Definition videos (<1920 width).
pub const DEFAULT_CORE_QUALITY_SD: u8 = 25;

/// Default CRF quality value for High Definition videos (>=1920 width, <3840 width).
pub const DEFAULT_CORE_QUALITY_HD: u8 = 25;

/// Default CRF quality value for Ultra High Definition videos (>=3840 width).
pub const DEFAULT_CORE_QUALITY_UHD: u8 = 29;

/// Default encoder preset (0-13, lower is slower/better quality).
pub const DEFAULT_ENCODER_PRESET: u8 = 6;

/// Default crop mode for the main encode.
pub const DEFAULT_CROP_MODE: &str = "auto";

/// Default target VMAF score for SDR content.
pub const DEFAULT_TARGET_VMAF: f32 = 93.0;

/// Default target VMAF score for HDR content.
pub const DEFAULT_TARGET_VMAF_HDR: f32 = 95.0;

/// The fixed min-VMAF used on the final (retry 2) attempt of the retry ladder.
pub const FINAL_RETRY_MIN_VMAF: f32 = 95.0;

/// Minimum gap between kept scene boundaries, in seconds.
pub const DEFAULT_MIN_SCENE_GAP: f64 = 5.0;

/// Maximum gap between consecutive segment boundaries, in seconds.
pub const DEFAULT_MAX_SEGMENT_LEN: f64 = 30.0;

/// Number of segments processed sequentially during scheduler warm-up.
pub const DEFAULT_WARMUP_SEGMENTS: usize = 3;

/// Hard ceiling on scheduler token usage.
pub const DEFAULT_MAX_TOKENS: u32 = 8;

/// Default base memory cost of one token, used before warm-up has run.
pub const DEFAULT_BASE_BYTES_PER_TOKEN: u64 = 512 * 1024 * 1024;

/// Delay between successive task submissions, to avoid a startup thundering herd.
pub const DEFAULT_STAGGER_DELAY_MS: u64 = 250;

/// Keyframe interval passed to the external encoder.
pub const DEFAULT_KEYFRAME_INTERVAL: &str = "10s";

/// Pixel format of the encoded output.
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p10le";

/// SVT-AV1 parameter string; grain analysis/denoise is always disabled.
pub const DEFAULT_SVT_PARAMS: &str = "tune=0:film-grain=0:film-grain-denoise=0";

/// Encoder name passed to the external VMAF-targeted encoder.
pub const DEFAULT_ENCODER: &str = "libsvtav1";

/// VMAF analysis options passed to the external encoder.
pub const DEFAULT_VMAF_OPTIONS: &str = "n_subsample=8:pool=perc5_min";

/// Default temp workspace root.
pub const DEFAULT_WORKDIR: &str = "/tmp/drapto";

// ============================================================================
// CORE CONFIGURATION
// ============================================================================

/// Main configuration structure for the drapto-core library.
///
/// This structure holds all the parameters required for the chunked encode
/// pipeline: paths, encoder settings, quality targets, and scheduler limits.
/// It is typically created by the consumer of the library (e.g. drapto-cli)
/// via [`CoreConfigBuilder`] and passed by reference throughout the pipeline.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    // ---- Path Configuration ----
    /// Directory containing input video files to process, or the single input file.
    pub input_dir: PathBuf,

    /// Directory where encoded output files will be saved.
    pub output_dir: PathBuf,

    /// Directory for log files.
    pub log_dir: PathBuf,

    /// Temp workspace root (`segments/`, `encoded_segments/`, `working/`).
    /// Defaults to `DRAPTO_WORKDIR` or `/tmp/drapto`.
    pub workdir: PathBuf,

    // ---- Encoder Settings ----
    /// Encoder preset (0-13, lower is slower/better quality).
    pub encoder_preset: u8,

    /// CRF quality for Standard Definition videos (<1920 width).
    pub quality_sd: u8,

    /// CRF quality for High Definition videos (>=1920 width, <3840 width).
    pub quality_hd: u8,

    /// CRF quality for Ultra High Definition videos (>=3840 width).
    pub quality_uhd: u8,

    /// Crop mode for the main encode ("auto", "none").
    pub crop_mode: String,

    /// SVT-AV1 encoder parameter string.
    pub svt_params: String,

    /// Encoder name passed to the external VMAF-targeted encoder.
    pub encoder: String,

    /// Keyframe interval (e.g. "10s").
    pub keyframe_interval: String,

    /// Output pixel format (e.g. "yuv420p10le").
    pub pixel_format: String,

    /// Target VMAF score for SDR content.
    pub target_vmaf: f32,

    /// Target VMAF score for HDR content.
    pub target_vmaf_hdr: f32,

    /// VMAF analysis options string passed to the encoder.
    pub vmaf_options: String,

    // ---- Segment Planning ----
    /// Minimum gap between kept scene boundaries, in seconds.
    pub min_scene_gap: f64,

    /// Maximum gap between consecutive segment boundaries, in seconds.
    pub max_segment_len: f64,

    // ---- Scheduler Limits ----
    /// Number of segments processed sequentially during warm-up.
    pub warmup_segments: usize,

    /// Hard ceiling on scheduler token usage.
    pub max_tokens: u32,

    /// Delay between successive task submissions.
    pub stagger_delay_ms: u64,

    // ---- Notification Settings ----
    /// Optional ntfy.sh topic URL for sending notifications.
    pub ntfy_topic: Option<String>,

    // ---- Processing Options ----
    /// Disable automatic crop detection.
    pub disable_crop: bool,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("."),
            output_dir: PathBuf::from("."),
            log_dir: PathBuf::from("."),
            workdir: get_env_path("DRAPTO_WORKDIR", PathBuf::from(DEFAULT_WORKDIR)),

            encoder_preset: DEFAULT_ENCODER_PRESET,
            quality_sd: DEFAULT_CORE_QUALITY_SD,
            quality_hd: DEFAULT_CORE_QUALITY_HD,
            quality_uhd: DEFAULT_CORE_QUALITY_UHD,
            crop_mode: DEFAULT_CROP_MODE.to_string(),
            svt_params: DEFAULT_SVT_PARAMS.to_string(),
            encoder: DEFAULT_ENCODER.to_string(),
            keyframe_interval: DEFAULT_KEYFRAME_INTERVAL.to_string(),
            pixel_format: DEFAULT_PIXEL_FORMAT.to_string(),
            target_vmaf: DEFAULT_TARGET_VMAF,
            target_vmaf_hdr: DEFAULT_TARGET_VMAF_HDR,
            vmaf_options: DEFAULT_VMAF_OPTIONS.to_string(),

            min_scene_gap: DEFAULT_MIN_SCENE_GAP,
            max_segment_len: DEFAULT_MAX_SEGMENT_LEN,

            warmup_segments: DEFAULT_WARMUP_SEGMENTS,
            max_tokens: DEFAULT_MAX_TOKENS,
            stagger_delay_ms: DEFAULT_STAGGER_DELAY_MS,

            ntfy_topic: None,
            disable_crop: false,
        }
    }
}

impl CoreConfig {
    /// CRF quality for a given pixel width, per the resolution-bucket rule.
    pub fn quality_for_width(&self, width: u32) -> u8 {
        if width >= 3840 {
            self.quality_uhd
        } else if width >= 1920 {
            self.quality_hd
        } else {
            self.quality_sd
        }
    }

    pub fn segments_dir(&self) -> PathBuf {
        self.workdir.join("segments")
    }

    pub fn encoded_segments_dir(&self) -> PathBuf {
        self.workdir.join("encoded_segments")
    }

    pub fn working_dir(&self) -> PathBuf {
        self.workdir.join("working")
    }
}
