// ============================================================================
// drapto-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// This module implements the builder pattern for the CoreConfig structure,
// providing a fluent API for creating and configuring CoreConfig instances.
//
// AI-ASSISTANT-INFO: Builder pattern implementation for CoreConfig

// ---- Standard library imports ----
use std::path::PathBuf;

// ---- Internal crate imports ----
use super::CoreConfig;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use drapto_core::config::CoreConfigBuilder;
/// use std::path::PathBuf;
///
/// let config = CoreConfigBuilder::new()
///     .input_dir(PathBuf::from("/path/to/input"))
///     .output_dir(PathBuf::from("/path/to/output"))
///     .log_dir(PathBuf::from("/path/to/logs"))
///     .encoder_preset(6)
///     .quality_sd(24)
///     .quality_hd(26)
///     .quality_uhd(28)
///     .crop_mode("auto")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfigBuilder {
    input_dir: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    workdir: Option<PathBuf>,

    encoder_preset: u8,
    quality_sd: u8,
    quality_hd: u8,
    quality_uhd: u8,
    crop_mode: String,
    svt_params: String,
    encoder: String,
    keyframe_interval: String,
    pixel_format: String,
    target_vmaf: f32,
    target_vmaf_hdr: f32,
    vmaf_options: String,

    min_scene_gap: f64,
    max_segment_len: f64,

    warmup_segments: usize,
    max_tokens: u32,
    stagger_delay_ms: u64,

    ntfy_topic: Option<String>,
    disable_crop: bool,
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder seeded with the default CoreConfig.
    pub fn new() -> Self {
        let defaults = CoreConfig::default();
        Self {
            input_dir: None,
            output_dir: None,
            log_dir: None,
            workdir: Some(defaults.workdir),

            encoder_preset: defaults.encoder_preset,
            quality_sd: defaults.quality_sd,
            quality_hd: defaults.quality_hd,
            quality_uhd: defaults.quality_uhd,
            crop_mode: defaults.crop_mode,
            svt_params: defaults.svt_params,
            encoder: defaults.encoder,
            keyframe_interval: defaults.keyframe_interval,
            pixel_format: defaults.pixel_format,
            target_vmaf: defaults.target_vmaf,
            target_vmaf_hdr: defaults.target_vmaf_hdr,
            vmaf_options: defaults.vmaf_options,

            min_scene_gap: defaults.min_scene_gap,
            max_segment_len: defaults.max_segment_len,

            warmup_segments: defaults.warmup_segments,
            max_tokens: defaults.max_tokens,
            stagger_delay_ms: defaults.stagger_delay_ms,

            ntfy_topic: None,
            disable_crop: false,
        }
    }

    pub fn input_dir(mut self, input_dir: PathBuf) -> Self {
        self.input_dir = Some(input_dir);
        self
    }

    pub fn output_dir(mut self, output_dir: PathBuf) -> Self {
        self.output_dir = Some(output_dir);
        self
    }

    pub fn log_dir(mut self, log_dir: PathBuf) -> Self {
        self.log_dir = Some(log_dir);
        self
    }

    pub fn workdir(mut self, workdir: PathBuf) -> Self {
        self.workdir = Some(workdir);
        self
    }

    pub fn encoder_preset(mut self, preset: u8) -> Self {
        self.encoder_preset = preset;
        self
    }

    pub fn quality_sd(mut self, quality: u8) -> Self {
        self.quality_sd = quality;
        self
    }

    pub fn quality_hd(mut self, quality: u8) -> Self {
        self.quality_hd = quality;
        self
    }

    pub fn quality_uhd(mut self, quality: u8) -> Self {
        self.quality_uhd = quality;
        self
    }

    pub fn crop_mode(mut self, mode: &str) -> Self {
        self.crop_mode = mode.to_string();
        self
    }

    pub fn disable_crop(mut self, disable: bool) -> Self {
        self.disable_crop = disable;
        self
    }

    pub fn target_vmaf(mut self, vmaf: f32) -> Self {
        self.target_vmaf = vmaf;
        self
    }

    pub fn target_vmaf_hdr(mut self, vmaf: f32) -> Self {
        self.target_vmaf_hdr = vmaf;
        self
    }

    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = tokens;
        self
    }

    pub fn warmup_segments(mut self, count: usize) -> Self {
        self.warmup_segments = count;
        self
    }

    pub fn min_scene_gap(mut self, seconds: f64) -> Self {
        self.min_scene_gap = seconds;
        self
    }

    pub fn max_segment_len(mut self, seconds: f64) -> Self {
        self.max_segment_len = seconds;
        self
    }

    pub fn ntfy_topic(mut self, topic: &str) -> Self {
        self.ntfy_topic = Some(topic.to_string());
        self
    }

    /// Builds a CoreConfig instance from the builder.
    ///
    /// # Panics
    ///
    /// If any required path fields (`input_dir`, `output_dir`, `log_dir`) are missing.
    pub fn build(self) -> CoreConfig {
        let input_dir = self.input_dir.expect("input_dir is required");
        let output_dir = self.output_dir.expect("output_dir is required");
        let log_dir = self.log_dir.expect("log_dir is required");

        CoreConfig {
            input_dir,
            output_dir,
            log_dir,
            workdir: self.workdir.unwrap_or_else(|| PathBuf::from(super::DEFAULT_WORKDIR)),

            encoder_preset: self.encoder_preset,
            quality_sd: self.quality_sd,
            quality_hd: self.quality_hd,
            quality_uhd: self.quality_uhd,
            crop_mode: self.crop_mode,
            svt_params: self.svt_params,
            encoder: self.encoder,
            keyframe_interval: self.keyframe_interval,
            pixel_format: self.pixel_format,
            target_vmaf: self.target_vmaf,
            target_vmaf_hdr: self.target_vmaf_hdr,
            vmaf_options: self.vmaf_options,

            min_scene_gap: self.min_scene_gap,
            max_segment_len: self.max_segment_len,

            warmup_segments: self.warmup_segments,
            max_tokens: self.max_tokens,
            stagger_delay_ms: self.stagger_delay_ms,

            ntfy_topic: self.ntfy_topic,
            disable_crop: self.disable_crop,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_requires_paths_and_applies_defaults() {
        let config = CoreConfigBuilder::new()
            .input_dir(PathBuf::from("/in"))
            .output_dir(PathBuf::from("/out"))
            .log_dir(PathBuf::from("/logs"))
            .build();

        assert_eq!(config.quality_uhd, super::super::DEFAULT_CORE_QUALITY_UHD);
        assert_eq!(config.max_tokens, super::super::DEFAULT_MAX_TOKENS);
        assert!(!config.disable_crop);
    }

    #[test]
    fn quality_for_width_buckets_correctly() {
        let config = CoreConfigBuilder::new()
            .input_dir(PathBuf::from("/in"))
            .output_dir(PathBuf::from("/out"))
            .log_dir(PathBuf::from("/logs"))
            .build();

        assert_eq!(config.quality_for_width(1280), config.quality_sd);
        assert_eq!(config.quality_for_width(1920), config.quality_hd);
        assert_eq!(config.quality_for_width(3840), config.quality_uhd);
    }
}
