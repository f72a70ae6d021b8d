// ============================================================================
// drapto-core/src/classify.rs
// ============================================================================
//
// MEDIA CLASSIFIER (C3)
//
// Buckets a file's primary video stream into a resolution category, decides
// whether it's HDR from its color metadata, and checks for Dolby Vision via
// `mediainfo`. HDR feeds both the crop detector's threshold choice and the
// VMAF target selection.
//
// AI-ASSISTANT-INFO: Resolution bucketing, HDR formula, Dolby Vision probe

use std::path::Path;
use std::process::Command;

use crate::error::CoreResult;
use crate::probe::{Session, StreamType};
use crate::process;

/// Resolution bucket used for quality/CRF selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionCategory {
    Sd,
    Hd,
    Uhd,
}

impl ResolutionCategory {
    pub fn from_width(width: u32) -> Self {
        if width >= 3840 {
            ResolutionCategory::Uhd
        } else if width >= 1920 {
            ResolutionCategory::Hd
        } else {
            ResolutionCategory::Sd
        }
    }
}

const HDR_TRANSFER_CHARACTERISTICS: &[&str] = &[
    "smpte2084",
    "arib-std-b67",
    "smpte428",
    "bt2020-10",
    "bt2020-12",
];

const HDR_COLOR_SPACES: &[&str] = &["bt2020nc", "bt2020c"];

/// Classification of a file's primary video stream.
#[derive(Debug, Clone, Copy)]
pub struct Classification {
    pub resolution: ResolutionCategory,
    pub width: u32,
    pub is_hdr: bool,
    pub is_dolby_vision: bool,
}

/// Classifies the primary video stream (index 0) of the file backing `session`.
pub fn classify(session: &Session, path: &Path) -> CoreResult<Classification> {
    let width = session.get_int("width", StreamType::Video, 0)? as u32;
    let is_hdr = detect_hdr(session)?;
    let is_dolby_vision = detect_dolby_vision(path);

    Ok(Classification {
        resolution: ResolutionCategory::from_width(width),
        width,
        is_hdr,
        is_dolby_vision,
    })
}

/// HDR iff color transfer is one of the known HDR transfer functions, OR
/// color primaries is `bt2020`, OR color space is one of the BT.2020 matrix
/// coefficients.
fn detect_hdr(session: &Session) -> CoreResult<bool> {
    let transfer = session
        .get_string("color_transfer", StreamType::Video, 0)
        .unwrap_or_default();
    if HDR_TRANSFER_CHARACTERISTICS
        .iter()
        .any(|t| t.eq_ignore_ascii_case(&transfer))
    {
        return Ok(true);
    }

    let primaries = session
        .get_string("color_primaries", StreamType::Video, 0)
        .unwrap_or_default();
    if primaries.eq_ignore_ascii_case("bt2020") {
        return Ok(true);
    }

    let color_space = session
        .get_string("color_space", StreamType::Video, 0)
        .unwrap_or_default();
    if HDR_COLOR_SPACES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(&color_space))
    {
        return Ok(true);
    }

    Ok(false)
}

/// Invokes `mediainfo --Output=JSON` and checks for the substring
/// `"Dolby Vision"` anywhere in its output. Failure to invoke mediainfo
/// (missing binary, non-zero exit) classifies the file as non-DV rather than
/// failing the whole classification.
fn detect_dolby_vision(path: &Path) -> bool {
    let mut cmd = Command::new("mediainfo");
    cmd.arg("--Output=JSON").arg(path);

    match process::run(&mut cmd) {
        Ok(output) => String::from_utf8_lossy(&output.stdout).contains("Dolby Vision"),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_bucket_thresholds() {
        assert_eq!(ResolutionCategory::from_width(1280), ResolutionCategory::Sd);
        assert_eq!(ResolutionCategory::from_width(1920), ResolutionCategory::Hd);
        assert_eq!(ResolutionCategory::from_width(3839), ResolutionCategory::Hd);
        assert_eq!(ResolutionCategory::from_width(3840), ResolutionCategory::Uhd);
    }
}
