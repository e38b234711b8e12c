//! FFmpeg encoder for camera recordings
//!
//! Spawns one FFmpeg process that reads the camera (and optionally audio)
//! input and writes H.264/AAC into the requested container.

use super::config::{BackendConfig, INPUT_FORMAT};
use crate::capture::traits::{CameraDevice, EncoderConfig, EncoderPipeline};
use crate::recorder::error::{RecordingError, RecordingResult};
use std::collections::VecDeque;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, Command, Stdio};
use std::thread::JoinHandle;
use std::time::Duration;

/// Containers the encoder can mux into
const CONTAINERS: &[&str] = &["mp4", "3gp", "mov"];

/// Stderr lines kept for error reports
const STDERR_TAIL_LINES: usize = 20;

/// Resolved encoder settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodeSettings {
    pub width: u32,
    pub height: u32,
    pub container: String,
    pub output: PathBuf,
}

impl EncodeSettings {
    /// Validate the opaque profile/format values against what FFmpeg can do
    pub fn resolve(config: &EncoderConfig) -> RecordingResult<Self> {
        let (width, height) = parse_profile(&config.profile).ok_or_else(|| {
            RecordingError::ConfigurationRejected(format!(
                "unsupported quality profile {:?}",
                config.profile
            ))
        })?;

        let container = match &config.container_format {
            Some(format) => format.to_ascii_lowercase(),
            None => container_from_extension(&config.output_path),
        };
        if !CONTAINERS.contains(&container.as_str()) {
            return Err(RecordingError::ConfigurationRejected(format!(
                "unsupported container format {container:?}"
            )));
        }

        Ok(Self {
            width,
            height,
            container,
            output: config.output_path.clone(),
        })
    }
}

/// Parse a `WIDTHxHEIGHT` profile value
pub fn parse_profile(profile: &str) -> Option<(u32, u32)> {
    let (width, height) = profile.trim().split_once('x')?;
    let width: u32 = width.parse().ok()?;
    let height: u32 = height.parse().ok()?;
    // yuv420p needs even dimensions
    if width == 0 || height == 0 || width % 2 != 0 || height % 2 != 0 {
        return None;
    }
    Some((width, height))
}

fn container_from_extension(path: &Path) -> String {
    match path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .as_deref()
    {
        Some("3gp") | Some("3gpp") => "3gp".to_string(),
        Some("mov") => "mov".to_string(),
        _ => "mp4".to_string(),
    }
}

/// Build the FFmpeg command line for recording `device`
pub fn build_args(config: &BackendConfig, device: &str, settings: &EncodeSettings) -> Vec<String> {
    let mut args: Vec<String> = ["-hide_banner", "-nostats", "-loglevel", "error", "-y"]
        .iter()
        .map(|s| s.to_string())
        .collect();

    args.extend([
        "-f".to_string(),
        INPUT_FORMAT.to_string(),
        "-framerate".to_string(),
        config.framerate.to_string(),
        "-i".to_string(),
        video_input(device, config.audio_device.as_deref()),
    ]);

    let has_audio = config.audio_device.is_some();
    #[cfg(target_os = "linux")]
    {
        if let Some(audio) = &config.audio_device {
            args.extend(["-f".to_string(), "alsa".to_string(), "-i".to_string(), audio.clone()]);
        }
    }

    args.extend([
        "-s".to_string(),
        format!("{}x{}", settings.width, settings.height),
        "-c:v".to_string(),
        "libx264".to_string(),
        "-preset".to_string(),
        "veryfast".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-g".to_string(),
        (config.framerate * 2).to_string(),
    ]);

    if has_audio {
        args.extend(["-c:a".to_string(), "aac".to_string()]);
    }

    if settings.container != "3gp" {
        args.extend(["-movflags".to_string(), "+faststart".to_string()]);
    }

    args.extend([
        "-f".to_string(),
        settings.container.clone(),
        settings.output.to_string_lossy().to_string(),
    ]);
    args
}

/// Input specifier for the camera, including audio where the platform
/// muxes both through one input
#[allow(unused_variables)]
fn video_input(device: &str, audio: Option<&str>) -> String {
    #[cfg(target_os = "macos")]
    {
        match audio {
            Some(audio) => format!("{device}:{audio}"),
            None => device.to_string(),
        }
    }

    #[cfg(target_os = "windows")]
    {
        match audio {
            Some(audio) => format!("video={device}:audio={audio}"),
            None => format!("video={device}"),
        }
    }

    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    {
        device.to_string()
    }
}

/// Check that the FFmpeg executable can be run
pub fn ensure_available(ffmpeg_path: &str) -> RecordingResult<()> {
    let status = Command::new(ffmpeg_path)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => Ok(()),
        _ => Err(RecordingError::ConfigurationRejected(format!(
            "FFmpeg not found at {ffmpeg_path}. Please install FFmpeg."
        ))),
    }
}

/// Log FFmpeg's stderr as it arrives so the pipe never fills up
///
/// The thread yields the last few lines once FFmpeg closes the pipe.
fn drain_stderr(pipe: ChildStderr) -> JoinHandle<String> {
    std::thread::spawn(move || {
        let mut tail = VecDeque::with_capacity(STDERR_TAIL_LINES);
        for line in BufReader::new(pipe).lines().map_while(Result::ok) {
            tracing::warn!("ffmpeg: {}", line);
            if tail.len() == STDERR_TAIL_LINES {
                tail.pop_front();
            }
            tail.push_back(line);
        }
        Vec::from(tail).join("\n")
    })
}

fn collect_stderr(reader: Option<JoinHandle<String>>) -> String {
    reader
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default()
}

/// One FFmpeg recording process
pub struct FfmpegEncoder {
    ffmpeg_path: String,
    args: Vec<String>,
    output: PathBuf,
    startup_grace: Duration,
    process: Option<Child>,
    stderr: Option<JoinHandle<String>>,
}

impl FfmpegEncoder {
    /// Configure an encoder for the (unlocked) camera
    pub fn configure(
        config: &BackendConfig,
        camera: &dyn CameraDevice,
        encoder: &EncoderConfig,
    ) -> RecordingResult<Self> {
        let settings = EncodeSettings::resolve(encoder)?;
        ensure_available(&config.ffmpeg_path)?;

        if let Some(parent) = settings.output.parent() {
            if !parent.as_os_str().is_empty() && !parent.is_dir() {
                return Err(RecordingError::ConfigurationRejected(format!(
                    "output directory {:?} does not exist",
                    parent
                )));
            }
        }

        let args = build_args(config, camera.device_name(), &settings);
        tracing::info!(
            "Configured FFmpeg encoder: {} camera at {}, {}x{} {} -> {:?}",
            camera.id(),
            camera.device_name(),
            settings.width,
            settings.height,
            settings.container,
            settings.output
        );

        Ok(Self {
            ffmpeg_path: config.ffmpeg_path.clone(),
            args,
            output: settings.output,
            startup_grace: config.startup_grace(),
            process: None,
            stderr: None,
        })
    }
}

impl EncoderPipeline for FfmpegEncoder {
    fn start(&mut self) -> RecordingResult<()> {
        if self.process.is_some() {
            return Err(RecordingError::AlreadyRecording);
        }

        let mut process = Command::new(&self.ffmpeg_path)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| RecordingError::Encoding(format!("Failed to start FFmpeg: {e}")))?;

        let stderr = process.stderr.take().map(drain_stderr);

        // A rejected device or codec makes FFmpeg exit right away
        std::thread::sleep(self.startup_grace);
        if let Some(status) = process.try_wait()? {
            let stderr = collect_stderr(stderr);
            return Err(RecordingError::ConfigurationRejected(format!(
                "FFmpeg exited with {status}: {}",
                stderr.trim()
            )));
        }

        tracing::info!("FFmpeg recording to {:?}", self.output);
        self.process = Some(process);
        self.stderr = stderr;
        Ok(())
    }

    fn pause(&mut self) -> RecordingResult<()> {
        Err(RecordingError::Encoding(
            "pause is not supported by the FFmpeg encoder".to_string(),
        ))
    }

    fn resume(&mut self) -> RecordingResult<()> {
        Err(RecordingError::Encoding(
            "resume is not supported by the FFmpeg encoder".to_string(),
        ))
    }

    fn finish(&mut self) -> RecordingResult<()> {
        let Some(mut process) = self.process.take() else {
            return Ok(());
        };

        // `q` asks FFmpeg to flush and write the trailer
        if let Some(mut stdin) = process.stdin.take() {
            if let Err(e) = stdin.write_all(b"q") {
                tracing::warn!("Could not signal FFmpeg to stop: {}", e);
            }
        }

        let status = process.wait()?;
        let stderr = collect_stderr(self.stderr.take());
        if !status.success() {
            return Err(RecordingError::Encoding(format!(
                "FFmpeg exited with status {}: {}",
                status,
                stderr.trim()
            )));
        }

        if !self.output.exists() {
            return Err(RecordingError::Encoding(format!(
                "FFmpeg produced no output at {:?}",
                self.output
            )));
        }

        tracing::info!("FFmpeg finished writing {:?}", self.output);
        Ok(())
    }

    fn release(&mut self) {
        if let Some(mut process) = self.process.take() {
            tracing::warn!("Killing FFmpeg encoder that was never finished");
            let _ = process.kill();
            let _ = process.wait();
        }
        // Detach; the reader ends once the pipe closes
        self.stderr = None;
    }
}

impl Drop for FfmpegEncoder {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encoder_config(profile: &str, format: Option<&str>, output: &str) -> EncoderConfig {
        EncoderConfig {
            output_path: PathBuf::from(output),
            profile: profile.to_string(),
            container_format: format.map(str::to_string),
        }
    }

    #[test]
    fn test_parse_profile() {
        assert_eq!(parse_profile("1280x720"), Some((1280, 720)));
        assert_eq!(parse_profile(" 320x240 "), Some((320, 240)));
        assert_eq!(parse_profile("720p"), None);
        assert_eq!(parse_profile("0x480"), None);
        assert_eq!(parse_profile("641x480"), None);
    }

    #[test]
    fn test_resolve_container() {
        let settings =
            EncodeSettings::resolve(&encoder_config("640x480", Some("3gp"), "/tmp/a.mp4")).unwrap();
        assert_eq!(settings.container, "3gp");

        let settings =
            EncodeSettings::resolve(&encoder_config("640x480", None, "/tmp/a.mov")).unwrap();
        assert_eq!(settings.container, "mov");

        let settings =
            EncodeSettings::resolve(&encoder_config("640x480", None, "/tmp/a")).unwrap();
        assert_eq!(settings.container, "mp4");
    }

    #[test]
    fn test_resolve_rejects_unknown_values() {
        assert!(matches!(
            EncodeSettings::resolve(&encoder_config("huge", Some("mp4"), "/tmp/a.mp4")),
            Err(RecordingError::ConfigurationRejected(_))
        ));
        assert!(matches!(
            EncodeSettings::resolve(&encoder_config("640x480", Some("avi"), "/tmp/a.avi")),
            Err(RecordingError::ConfigurationRejected(_))
        ));
    }

    #[test]
    fn test_build_args() {
        let config = BackendConfig {
            audio_device: None,
            framerate: 25,
            ..BackendConfig::default()
        };
        let settings = EncodeSettings {
            width: 1280,
            height: 720,
            container: "mp4".to_string(),
            output: PathBuf::from("/videos/vid.mp4"),
        };

        let args = build_args(&config, "/dev/video0", &settings);

        let pos = |flag: &str| args.iter().position(|a| a == flag).unwrap();
        assert_eq!(args[pos("-framerate") + 1], "25");
        assert_eq!(args[pos("-s") + 1], "1280x720");
        assert_eq!(args[pos("-g") + 1], "50");
        assert!(args.contains(&"+faststart".to_string()));
        assert!(!args.contains(&"aac".to_string()));
        assert_eq!(args.last().unwrap(), "/videos/vid.mp4");
        assert_eq!(args[args.len() - 2], "mp4");
        assert!(args.iter().any(|a| a.contains("/dev/video0")));
    }

    #[test]
    fn test_build_args_with_audio() {
        let config = BackendConfig {
            audio_device: Some("default".to_string()),
            ..BackendConfig::default()
        };
        let settings = EncodeSettings {
            width: 640,
            height: 480,
            container: "3gp".to_string(),
            output: PathBuf::from("/videos/vid.3gp"),
        };

        let args = build_args(&config, "0", &settings);

        assert!(args.contains(&"aac".to_string()));
        assert!(!args.contains(&"+faststart".to_string()));
    }

    #[test]
    fn test_missing_ffmpeg_is_rejected() {
        assert!(matches!(
            ensure_available("/nonexistent/ffmpeg-binary"),
            Err(RecordingError::ConfigurationRejected(_))
        ));
    }

    /// Write an executable shell script standing in for FFmpeg
    #[cfg(unix)]
    fn stub_ffmpeg(dir: &Path, body: &str) -> String {
        use std::os::unix::fs::PermissionsExt;

        let path = dir.join("ffmpeg");
        std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path.to_string_lossy().to_string()
    }

    /// Encoder running `ffmpeg_path` with the output path as its only argument
    #[cfg(unix)]
    fn stub_encoder(ffmpeg_path: String, output: PathBuf) -> FfmpegEncoder {
        FfmpegEncoder {
            ffmpeg_path,
            args: vec![output.to_string_lossy().to_string()],
            output,
            startup_grace: Duration::from_millis(200),
            process: None,
            stderr: None,
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_early_exit_rejects_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub_ffmpeg(dir.path(), "echo 'device busy' >&2\nexit 1");
        let mut encoder = stub_encoder(ffmpeg, dir.path().join("vid.mp4"));

        match encoder.start() {
            Err(RecordingError::ConfigurationRejected(message)) => {
                assert!(message.contains("device busy"), "{message}")
            }
            other => panic!("expected ConfigurationRejected, got {other:?}"),
        }
        assert!(encoder.process.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_finish_stops_ffmpeg_and_keeps_output() {
        let dir = tempfile::tempdir().unwrap();
        // Wait for `q` on stdin, then write the file named by the last argument
        let ffmpeg = stub_ffmpeg(
            dir.path(),
            "for last; do :; done\nread -r cmd\nprintf data > \"$last\"",
        );
        let output = dir.path().join("vid.mp4");
        let mut encoder = stub_encoder(ffmpeg, output.clone());

        encoder.start().unwrap();
        assert!(!output.exists());
        encoder.finish().unwrap();

        assert_eq!(std::fs::read(&output).unwrap(), b"data");
        // Finishing again has nothing left to do
        encoder.finish().unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn test_finish_without_output_fails() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub_ffmpeg(dir.path(), "read -r cmd\nexit 0");
        let mut encoder = stub_encoder(ffmpeg, dir.path().join("vid.mp4"));

        encoder.start().unwrap();
        assert!(matches!(encoder.finish(), Err(RecordingError::Encoding(_))));
    }

    #[cfg(unix)]
    #[test]
    fn test_finish_reports_ffmpeg_failure() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub_ffmpeg(dir.path(), "read -r cmd\necho 'muxer failed' >&2\nexit 3");
        let mut encoder = stub_encoder(ffmpeg, dir.path().join("vid.mp4"));

        encoder.start().unwrap();
        match encoder.finish() {
            Err(RecordingError::Encoding(message)) => {
                assert!(message.contains("muxer failed"), "{message}")
            }
            other => panic!("expected Encoding error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_release_kills_unfinished_process() {
        let dir = tempfile::tempdir().unwrap();
        let ffmpeg = stub_ffmpeg(dir.path(), "exec sleep 30");
        let mut encoder = stub_encoder(ffmpeg, dir.path().join("vid.mp4"));

        encoder.start().unwrap();
        let started = std::time::Instant::now();
        encoder.release();

        assert!(started.elapsed() < Duration::from_secs(10));
        assert!(encoder.process.is_none());
        assert!(encoder.finish().is_ok());
    }
}
