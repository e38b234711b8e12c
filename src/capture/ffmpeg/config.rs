//! FFmpeg backend configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Input device format FFmpeg uses for cameras on this platform
#[cfg(target_os = "linux")]
pub const INPUT_FORMAT: &str = "v4l2";
#[cfg(target_os = "macos")]
pub const INPUT_FORMAT: &str = "avfoundation";
#[cfg(target_os = "windows")]
pub const INPUT_FORMAT: &str = "dshow";
#[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
pub const INPUT_FORMAT: &str = "v4l2";

/// Settings for the FFmpeg backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BackendConfig {
    /// FFmpeg executable
    pub ffmpeg_path: String,

    /// FFprobe executable
    pub ffprobe_path: String,

    /// Device address per logical camera id (index 0 = back, 1 = front)
    pub camera_devices: Vec<String>,

    /// Audio input recorded alongside video, if any
    pub audio_device: Option<String>,

    /// Capture frame rate
    pub framerate: u32,

    /// How long FFmpeg gets to reject its input before a start counts as successful
    pub startup_grace_ms: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            ffprobe_path: "ffprobe".to_string(),
            camera_devices: default_camera_devices(),
            audio_device: default_audio_device(),
            framerate: 30,
            startup_grace_ms: 300,
        }
    }
}

impl BackendConfig {
    /// Defaults overridden by `VIDEO_RECORDER_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("VIDEO_RECORDER_FFMPEG") {
            config.ffmpeg_path = path;
        }
        if let Some(path) = lookup("VIDEO_RECORDER_FFPROBE") {
            config.ffprobe_path = path;
        }
        if let Some(devices) = lookup("VIDEO_RECORDER_CAMERAS") {
            config.camera_devices = devices
                .split(',')
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(audio) = lookup("VIDEO_RECORDER_AUDIO") {
            config.audio_device = match audio.trim() {
                "" | "0" | "false" | "none" => None,
                device => Some(device.to_string()),
            };
        }
        if let Some(fps) = lookup("VIDEO_RECORDER_FPS") {
            match fps.trim().parse::<u32>() {
                Ok(fps) if fps > 0 => config.framerate = fps,
                _ => tracing::warn!("Ignoring invalid VIDEO_RECORDER_FPS={}", fps),
            }
        }

        config
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_millis(self.startup_grace_ms)
    }
}

fn default_camera_devices() -> Vec<String> {
    #[cfg(target_os = "linux")]
    {
        vec!["/dev/video0".to_string(), "/dev/video1".to_string()]
    }

    #[cfg(target_os = "macos")]
    {
        vec!["0".to_string(), "1".to_string()]
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        // dshow devices are addressed by name and must be configured
        Vec::new()
    }
}

fn default_audio_device() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        Some("default".to_string())
    }

    #[cfg(target_os = "macos")]
    {
        Some("0".to_string())
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        None
    }
}
