//! Ordered frame sequence written out as an animated GIF.

use crate::app_error::AppError;
use crate::raster::Raster;
use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, Frame, RgbaImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Frames with per-frame delays (milliseconds). All frames must share one
/// width/height; `save` rejects mismatches.
#[derive(Default)]
pub struct RasterSequence {
    frames: Vec<(Raster, u32)>,
}

impl RasterSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, frame: Raster, delay_ms: u32) {
        self.frames.push((frame, delay_ms));
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn frames(&self) -> &[(Raster, u32)] {
        &self.frames
    }

    fn frame_rgba(raster: &Raster) -> RgbaImage {
        let (w, h) = (raster.width(), raster.height());
        let mut rgba = Vec::with_capacity((w * h * 4) as usize);
        for y in 0..h {
            for x in 0..w {
                let [r, g, b] = raster.color_at(x, y);
                rgba.extend_from_slice(&[r, g, b, raster.alpha_at(x, y)]);
            }
        }
        RgbaImage::from_raw(w, h, rgba).expect("frame buffer matches its dimensions")
    }

    /// Encode all frames as a looping GIF.
    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        let (first, _) = self.frames.first().ok_or_else(|| AppError::GifError {
            reason: "no frames to write".to_string(),
        })?;
        let (width, height) = (first.width(), first.height());

        let file = File::create(path).map_err(|e| AppError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        let mut encoder = GifEncoder::new(BufWriter::new(file));
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| AppError::GifError {
                reason: e.to_string(),
            })?;

        for (raster, delay_ms) in &self.frames {
            if raster.width() != width || raster.height() != height {
                return Err(AppError::GifError {
                    reason: format!(
                        "frame size {}x{} differs from first frame {}x{}",
                        raster.width(),
                        raster.height(),
                        width,
                        height
                    ),
                });
            }
            let frame = Frame::from_parts(
                Self::frame_rgba(raster),
                0,
                0,
                Delay::from_numer_denom_ms(*delay_ms, 1),
            );
            encoder.encode_frame(frame).map_err(|e| AppError::GifError {
                reason: e.to_string(),
            })?;
        }

        tracing::info!(path = %path.display(), frames = self.frames.len(), "Saved GIF");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::solid_raster;

    #[test]
    fn test_empty_sequence_fails() {
        let sequence = RasterSequence::new();
        let dir = tempfile::tempdir().unwrap();
        let err = sequence.save(&dir.path().join("out.gif")).unwrap_err();
        assert!(matches!(err, AppError::GifError { .. }));
    }

    #[test]
    fn test_mismatched_frames_fail() {
        let mut sequence = RasterSequence::new();
        sequence.push(solid_raster(4, 4, [1, 2, 3]), 100);
        sequence.push(solid_raster(5, 4, [1, 2, 3]), 100);
        let dir = tempfile::tempdir().unwrap();
        let err = sequence.save(&dir.path().join("out.gif")).unwrap_err();
        assert!(matches!(err, AppError::GifError { .. }));
    }

    #[test]
    fn test_writes_gif_file() {
        let mut sequence = RasterSequence::new();
        sequence.push(solid_raster(8, 8, [255, 0, 0]), 200);
        sequence.push(solid_raster(8, 8, [0, 255, 0]), 200);
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("anim.gif");
        sequence.save(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[0..3], b"GIF");
    }
}
