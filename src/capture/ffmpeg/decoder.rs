//! FFmpeg still-frame decoder
//!
//! Probes a finished recording once with FFprobe, then decodes single RGBA
//! frames on demand.

use super::config::BackendConfig;
use crate::capture::traits::{FrameDecoder, VideoFrame};
use crate::recorder::error::{RecordingError, RecordingResult};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Stream facts needed to decode frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeInfo {
    pub width: u32,
    pub height: u32,
    pub duration_ms: u64,
}

/// Parse `ffprobe -print_format json -show_streams -show_format` output
pub fn parse_probe(json_str: &str) -> RecordingResult<ProbeInfo> {
    let json: serde_json::Value = serde_json::from_str(json_str)
        .map_err(|e| RecordingError::Encoding(format!("Failed to parse ffprobe output: {e}")))?;

    let video_stream = json
        .get("streams")
        .and_then(|s| s.as_array())
        .and_then(|streams| streams.first())
        .ok_or_else(|| RecordingError::Encoding("No video stream found".to_string()))?;

    let width = video_stream
        .get("width")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    let height = video_stream
        .get("height")
        .and_then(|v| v.as_u64())
        .unwrap_or(0) as u32;
    if width == 0 || height == 0 {
        return Err(RecordingError::Encoding(
            "Video stream has no dimensions".to_string(),
        ));
    }

    // Format duration is more reliable than the stream's
    let duration_secs = json
        .get("format")
        .and_then(|f| f.get("duration"))
        .or_else(|| video_stream.get("duration"))
        .and_then(|d| d.as_str())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(ProbeInfo {
        width,
        height,
        duration_ms: (duration_secs * 1000.0) as u64,
    })
}

/// Decoder over one media file
pub struct FfmpegDecoder {
    ffmpeg_path: String,
    path: PathBuf,
    info: ProbeInfo,
    released: bool,
}

impl FfmpegDecoder {
    pub fn open(config: &BackendConfig, path: &Path) -> RecordingResult<Self> {
        if !path.exists() {
            return Err(RecordingError::Io(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{path:?} does not exist"),
            )));
        }

        let output = Command::new(&config.ffprobe_path)
            .args([
                "-v",
                "quiet",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
                "-select_streams",
                "v:0",
            ])
            .arg(path)
            .output()
            .map_err(|e| RecordingError::Encoding(format!("Failed to run ffprobe: {e}")))?;

        if !output.status.success() {
            return Err(RecordingError::Encoding(format!(
                "ffprobe failed: {}",
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        let info = parse_probe(&String::from_utf8_lossy(&output.stdout))?;
        tracing::debug!(
            "Opened decoder for {:?}: {}x{}, {}ms",
            path,
            info.width,
            info.height,
            info.duration_ms
        );

        Ok(Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            path: path.to_path_buf(),
            info,
            released: false,
        })
    }

    pub fn info(&self) -> ProbeInfo {
        self.info
    }
}

impl FrameDecoder for FfmpegDecoder {
    fn duration_ms(&self) -> u64 {
        self.info.duration_ms
    }

    fn frame_at(&mut self, timestamp_ms: u64) -> RecordingResult<VideoFrame> {
        if self.released {
            return Err(RecordingError::Encoding("decoder already released".to_string()));
        }

        let ProbeInfo { width, height, .. } = self.info;
        // -s pins the output size so the buffer length is predictable
        let output = Command::new(&self.ffmpeg_path)
            .args(["-v", "error", "-ss", &format!("{:.3}", timestamp_ms as f64 / 1000.0)])
            .arg("-i")
            .arg(&self.path)
            .args([
                "-frames:v",
                "1",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "-s",
                &format!("{width}x{height}"),
                "-",
            ])
            .stdin(Stdio::null())
            .output()
            .map_err(|e| RecordingError::Encoding(format!("Failed to start FFmpeg decoder: {e}")))?;

        if !output.status.success() {
            return Err(RecordingError::Encoding(format!(
                "FFmpeg could not decode {}ms: {}",
                timestamp_ms,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        let frame = VideoFrame {
            width,
            height,
            data: output.stdout,
        };
        if frame.data.len() != frame.expected_len() {
            return Err(RecordingError::Encoding(format!(
                "Expected {} bytes at {}ms, got {}",
                frame.expected_len(),
                timestamp_ms,
                frame.data.len()
            )));
        }
        Ok(frame)
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            tracing::debug!("Released decoder for {:?}", self.path);
        }
    }
}
