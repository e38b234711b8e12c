//! Thumbnail extraction
//!
//! Samples evenly spaced still frames from a finished recording and writes
//! them as PNG files next to it.

use crate::capture::traits::{MediaBackend, VideoFrame};
use crate::recorder::error::{RecordingError, RecordingResult};
use crate::recorder::handles::DecoderHandle;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Derived path for the thumbnail at `index`: `<dir>/<stem>_thumbnail_<index>.png`
pub fn thumbnail_path(source: &Path, index: u32) -> PathBuf {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    source.with_file_name(format!("{stem}_thumbnail_{index}.png"))
}

/// Sample timestamps in milliseconds, `index * (duration / count)`
pub fn sample_timestamps(duration_ms: u64, count: u32) -> Vec<u64> {
    if count == 0 {
        return Vec::new();
    }
    let spacing = duration_ms / count as u64;
    (0..count as u64).map(|index| index * spacing).collect()
}

/// Extract `count` thumbnails from `source`
///
/// Failures are per frame: a frame that cannot be decoded or written is
/// logged and left out. The decoder is released before returning.
pub fn extract_thumbnails(backend: &dyn MediaBackend, source: &Path, count: u32) -> Vec<PathBuf> {
    if count == 0 {
        return Vec::new();
    }

    let mut handle = match backend.open_decoder(source) {
        Ok(decoder) => DecoderHandle::new(decoder),
        Err(e) => {
            tracing::warn!("Cannot open {:?} for thumbnails: {}", source, e);
            return Vec::new();
        }
    };

    let mut thumbnails = Vec::with_capacity(count as usize);
    if let Some(decoder) = handle.decoder_mut() {
        let timestamps = sample_timestamps(decoder.duration_ms(), count);
        tracing::debug!(
            "Extracting {} thumbnails from {:?} ({}ms)",
            count,
            source,
            decoder.duration_ms()
        );

        for (index, timestamp_ms) in (0u32..).zip(timestamps) {
            let output = thumbnail_path(source, index);
            let result = decoder
                .frame_at(timestamp_ms)
                .and_then(|frame| write_png(&frame, &output));

            match result {
                Ok(()) => thumbnails.push(output),
                Err(e) => {
                    let error = RecordingError::ThumbnailExtractionFailed(format!(
                        "index {index} at {timestamp_ms}ms: {e}"
                    ));
                    tracing::warn!("{}", error);
                }
            }
        }
    }
    handle.release();

    tracing::info!("Extracted {}/{} thumbnails", thumbnails.len(), count);
    thumbnails
}

/// Encode an RGBA frame as PNG
pub fn write_png(frame: &VideoFrame, path: &Path) -> RecordingResult<()> {
    if frame.width == 0 || frame.height == 0 || frame.data.len() != frame.expected_len() {
        return Err(RecordingError::ThumbnailExtractionFailed(format!(
            "frame is {}x{} with {} bytes",
            frame.width,
            frame.height,
            frame.data.len()
        )));
    }

    create_or_remove(path, |file| encode_png(frame, file))
}

/// Create `path` and fill it with `write`; a partial file is removed on failure
fn create_or_remove<F>(path: &Path, write: F) -> RecordingResult<()>
where
    F: FnOnce(&mut BufWriter<File>) -> RecordingResult<()>,
{
    let mut out = BufWriter::new(File::create(path)?);
    let result = write(&mut out).and_then(|()| out.flush().map_err(RecordingError::from));
    drop(out);
    if let Err(e) = result {
        if let Err(remove) = std::fs::remove_file(path) {
            tracing::warn!("Failed to remove partial {:?}: {}", path, remove);
        }
        return Err(e);
    }
    Ok(())
}

fn encode_png<W: Write>(frame: &VideoFrame, out: W) -> RecordingResult<()> {
    let mut encoder = png::Encoder::new(out, frame.width, frame.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let mut writer = encoder
        .write_header()
        .map_err(|e| RecordingError::ThumbnailExtractionFailed(e.to_string()))?;
    writer
        .write_image_data(&frame.data)
        .map_err(|e| RecordingError::ThumbnailExtractionFailed(e.to_string()))?;
    writer
        .finish()
        .map_err(|e| RecordingError::ThumbnailExtractionFailed(e.to_string()))?;

    Ok(())
}
