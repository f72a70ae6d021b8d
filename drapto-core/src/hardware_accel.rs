// ============================================================================
// drapto-core/src/hardware_accel.rs
// ============================================================================
//
// HARDWARE ACCELERATION: decode-side capability probe
//
// Centralizes hardware-decode detection for the ffmpeg-based stages (crop
// detection, segmentation) that build their own `std::process::Command`.
// Currently only VideoToolbox decode on macOS is recognized; encoding itself
// always runs in software (libsvtav1 via ab-av1).
//
// AI-ASSISTANT-INFO: VideoToolbox decode probe and ffmpeg arg helper

use std::env;

use log::info;

/// Hardware acceleration capabilities for the current platform.
#[derive(Debug, Clone, Copy)]
pub struct HardwareAcceleration {
    /// Whether VideoToolbox hardware decoding is available (macOS only).
    pub videotoolbox_decode_available: bool,
}

impl Default for HardwareAcceleration {
    fn default() -> Self {
        Self::detect()
    }
}

impl HardwareAcceleration {
    pub fn detect() -> Self {
        Self {
            videotoolbox_decode_available: is_macos(),
        }
    }

    pub fn log_capabilities(&self) {
        log_hardware_acceleration_status();
    }

    /// `-hwaccel` args to prepend before `-i` on a decode-side ffmpeg command.
    pub fn get_ffmpeg_hwaccel_args(&self) -> Vec<String> {
        if self.videotoolbox_decode_available {
            vec!["-hwaccel".to_string(), "videotoolbox".to_string()]
        } else {
            Vec::new()
        }
    }
}

pub fn is_macos() -> bool {
    env::consts::OS == "macos"
}

pub fn is_hardware_acceleration_available() -> bool {
    is_macos()
}

/// Adds `-hwaccel videotoolbox` to `cmd` if available and requested. Must be
/// called before the command's `-i <input>` argument.
pub fn add_hardware_acceleration_to_command(cmd: &mut std::process::Command, use_hw_decode: bool) -> bool {
    if use_hw_decode && is_hardware_acceleration_available() {
        cmd.arg("-hwaccel").arg("videotoolbox");
        true
    } else {
        false
    }
}

pub fn log_hardware_acceleration_status() {
    if is_hardware_acceleration_available() {
        info!("hardware acceleration: VideoToolbox available");
    } else {
        info!("hardware acceleration: none");
    }
}
