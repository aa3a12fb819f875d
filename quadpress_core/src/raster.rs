//! Raster buffer and summed-area tables
//!
//! `Raster` owns a contiguous 8-bit interleaved pixel grid (RGB or RGBA)
//! plus two independently optional prefix-sum tables over the color
//! channels. The tables make every rectangular sum / sum-of-squares query
//! O(1), which is what keeps the error metrics and the flatten pass cheap.
//!
//! Tables are immutable once built and recomputed wholesale; they are never
//! patched incrementally.

use crate::app_error::AppError;
use image::{DynamicImage, ImageFormat, RgbImage, RgbaImage};
use std::io::Cursor;
use std::path::Path;

/// Number of color channels covered by the prefix tables. Alpha is never
/// aggregated: no metric reads it and the flatten pass copies it through.
pub const COLOR_CHANNELS: usize = 3;

/// Raster formats accepted on input. Output must stay in the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Bmp,
    Hdr,
    Tga,
}

impl RasterFormat {
    /// Parse a format from a path extension, case-insensitive.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "bmp" => Some(Self::Bmp),
            "hdr" => Some(Self::Hdr),
            "tga" => Some(Self::Tga),
            _ => None,
        }
    }

    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpeg => ImageFormat::Jpeg,
            Self::Bmp => ImageFormat::Bmp,
            Self::Hdr => ImageFormat::Hdr,
            Self::Tga => ImageFormat::Tga,
        }
    }

    /// Canonical extension, used to compare input/output families.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::Bmp => "bmp",
            Self::Hdr => "hdr",
            Self::Tga => "tga",
        }
    }
}

/// Owned pixel grid with optional prefix-sum side tables.
///
/// Invariant: `data.len() == width * height * channels`, with `channels`
/// fixed at 3 or 4 for the buffer's lifetime.
#[derive(Clone, Debug)]
pub struct Raster {
    width: u32,
    height: u32,
    channels: u8,
    data: Vec<u8>,
    /// On-disk byte size of the decoded source, 0 for in-memory rasters.
    file_size: u64,
    summed_area: Option<Vec<i64>>,
    summed_square: Option<Vec<i64>>,
}

impl Raster {
    /// Decode an image file. Fails on unreadable/undecodable input and on
    /// sources with fewer than 3 channels (grayscale is not supported).
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.exists() {
            return Err(AppError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
        let file_size = std::fs::metadata(path)?.len();
        let decoded = image::open(path).map_err(|e| AppError::DecodeError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let channels = decoded.color().channel_count();
        if channels < 3 {
            return Err(AppError::UnsupportedChannelCount {
                path: path.to_path_buf(),
                channels,
            });
        }

        let (width, height) = (decoded.width(), decoded.height());
        let (channels, data) = if decoded.color().has_alpha() {
            (4u8, decoded.to_rgba8().into_raw())
        } else {
            (3u8, decoded.to_rgb8().into_raw())
        };

        tracing::info!(
            path = %path.display(),
            width,
            height,
            channels,
            file_size,
            "Loaded image"
        );

        Ok(Self {
            width,
            height,
            channels,
            data,
            file_size,
            summed_area: None,
            summed_square: None,
        })
    }

    /// Build a raster from raw interleaved bytes (tests, trial encodes).
    ///
    /// Panics if `channels` is not 3 or 4 or the buffer length disagrees
    /// with the dimensions; both are caller bugs, not runtime conditions.
    pub fn from_raw(width: u32, height: u32, channels: u8, data: Vec<u8>) -> Self {
        assert!(channels == 3 || channels == 4, "channels must be 3 or 4");
        assert_eq!(
            data.len(),
            width as usize * height as usize * channels as usize,
            "buffer length must equal width * height * channels"
        );
        Self {
            width,
            height,
            channels,
            data,
            file_size: 0,
            summed_area: None,
            summed_square: None,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn channels(&self) -> u8 {
        self.channels
    }

    /// Byte size of the decoded source file (0 for in-memory rasters).
    #[inline]
    pub fn file_size(&self) -> u64 {
        self.file_size
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    #[inline]
    fn index_of(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * self.channels as usize
    }

    /// RGB triple at (x, y); out-of-range coordinates read as black.
    pub fn color_at(&self, x: u32, y: u32) -> [u8; 3] {
        if x >= self.width || y >= self.height {
            return [0, 0, 0];
        }
        let i = self.index_of(x, y);
        [self.data[i], self.data[i + 1], self.data[i + 2]]
    }

    /// Alpha at (x, y); opaque when the buffer has no alpha channel.
    pub fn alpha_at(&self, x: u32, y: u32) -> u8 {
        if self.channels < 4 || x >= self.width || y >= self.height {
            return 0xFF;
        }
        self.data[self.index_of(x, y) + 3]
    }

    pub fn set_color_at(&mut self, x: u32, y: u32, r: u8, g: u8, b: u8) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = self.index_of(x, y);
        self.data[i] = r;
        self.data[i + 1] = g;
        self.data[i + 2] = b;
    }

    pub fn set_alpha_at(&mut self, x: u32, y: u32, a: u8) {
        if self.channels < 4 || x >= self.width || y >= self.height {
            return;
        }
        let i = self.index_of(x, y);
        self.data[i + 3] = a;
    }

    /// Paint a rectangle with one RGB triple. Alpha is left untouched.
    pub fn set_block_color(&mut self, x: u32, y: u32, w: u32, h: u32, r: u8, g: u8, b: u8) {
        let x_end = (x + w).min(self.width);
        let y_end = (y + h).min(self.height);
        for j in y..y_end {
            for i in x..x_end {
                let idx = self.index_of(i, j);
                self.data[idx] = r;
                self.data[idx + 1] = g;
                self.data[idx + 2] = b;
            }
        }
    }

    /// A copy of the pixels with no side tables and no source file size.
    pub fn pixel_copy(&self) -> Self {
        Self::from_raw(self.width, self.height, self.channels, self.data.clone())
    }

    // ------------------------------------------------------------------
    // Summed-area tables
    // ------------------------------------------------------------------

    #[inline]
    fn table_index(&self, x: u32, y: u32, channel: usize) -> usize {
        (y as usize * self.width as usize + x as usize) * COLOR_CHANNELS + channel
    }

    fn compute_table(&self, square: bool) -> Vec<i64> {
        let mut table = vec![0i64; self.width as usize * self.height as usize * COLOR_CHANNELS];
        for y in 0..self.height {
            for x in 0..self.width {
                let color = self.color_at(x, y);
                for (c, &value) in color.iter().enumerate() {
                    let v = value as i64;
                    let v = if square { v * v } else { v };
                    let left = if x > 0 { table[self.table_index(x - 1, y, c)] } else { 0 };
                    let up = if y > 0 { table[self.table_index(x, y - 1, c)] } else { 0 };
                    let diag = if x > 0 && y > 0 {
                        table[self.table_index(x - 1, y - 1, c)]
                    } else {
                        0
                    };
                    table[self.table_index(x, y, c)] = v + left + up - diag;
                }
            }
        }
        table
    }

    /// Build (or rebuild) the linear prefix-sum table.
    pub fn compute_summed_area_table(&mut self) {
        self.summed_area = Some(self.compute_table(false));
    }

    /// Build (or rebuild) the squared prefix-sum table.
    pub fn compute_summed_square_table(&mut self) {
        self.summed_square = Some(self.compute_table(true));
    }

    pub fn has_summed_area_table(&self) -> bool {
        self.summed_area.is_some()
    }

    pub fn has_summed_square_table(&self) -> bool {
        self.summed_square.is_some()
    }

    #[inline]
    fn table_at(&self, table: &[i64], x: i64, y: i64, channel: usize) -> i64 {
        if x < 0 || y < 0 {
            return 0;
        }
        table[(y as usize * self.width as usize + x as usize) * COLOR_CHANNELS + channel]
    }

    fn block_sum_from(&self, table: &[i64], x: u32, y: u32, w: u32, h: u32, channel: usize) -> i64 {
        let x0 = x as i64 - 1;
        let y0 = y as i64 - 1;
        let x1 = (x + w) as i64 - 1;
        let y1 = (y + h) as i64 - 1;
        let d = self.table_at(table, x1, y1, channel);
        let b = self.table_at(table, x1, y0, channel);
        let c = self.table_at(table, x0, y1, channel);
        let a = self.table_at(table, x0, y0, channel);
        d - b - c + a
    }

    /// Exact sum of one color channel over a rectangle, O(1).
    ///
    /// Contract: `compute_summed_area_table` must have been called first.
    pub fn channel_block_sum(&self, x: u32, y: u32, w: u32, h: u32, channel: usize) -> i64 {
        let table = self
            .summed_area
            .as_ref()
            .expect("summed-area table queried before compute_summed_area_table()");
        self.block_sum_from(table, x, y, w, h, channel)
    }

    /// Exact sum of squared channel values over a rectangle, O(1).
    ///
    /// Contract: `compute_summed_square_table` must have been called first.
    pub fn channel_square_block_sum(&self, x: u32, y: u32, w: u32, h: u32, channel: usize) -> i64 {
        let table = self
            .summed_square
            .as_ref()
            .expect("summed-square table queried before compute_summed_square_table()");
        self.block_sum_from(table, x, y, w, h, channel)
    }

    // ------------------------------------------------------------------
    // Encode
    // ------------------------------------------------------------------

    fn to_dynamic(&self) -> Result<DynamicImage, AppError> {
        let make_err = || AppError::EncodeError {
            reason: "pixel buffer does not match its dimensions".to_string(),
        };
        if self.channels == 4 {
            RgbaImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgba8)
                .ok_or_else(make_err)
        } else {
            RgbImage::from_raw(self.width, self.height, self.data.clone())
                .map(DynamicImage::ImageRgb8)
                .ok_or_else(make_err)
        }
    }

    fn encode(&self, format: RasterFormat) -> Result<Vec<u8>, AppError> {
        let dynamic = self.to_dynamic()?;
        let mut cursor = Cursor::new(Vec::new());
        let result = match format {
            // The HDR encoder only takes Rgb32F; round-trip through it.
            RasterFormat::Hdr => DynamicImage::ImageRgb32F(dynamic.to_rgb32f())
                .write_to(&mut cursor, ImageFormat::Hdr),
            other => dynamic.write_to(&mut cursor, other.image_format()),
        };
        result.map_err(|e| AppError::EncodeError {
            reason: e.to_string(),
        })?;
        Ok(cursor.into_inner())
    }

    /// In-memory trial encode: byte count only, no disk I/O.
    pub fn estimate_encoded_size(&self, format: RasterFormat) -> Result<u64, AppError> {
        Ok(self.encode(format)?.len() as u64)
    }

    /// Encode and write to disk. The format is inferred from the output
    /// extension. Returns the number of bytes written.
    pub fn save(&self, path: &Path) -> Result<u64, AppError> {
        let format = RasterFormat::from_path(path).ok_or_else(|| AppError::UnsupportedExtension {
            path: path.to_path_buf(),
        })?;
        let bytes = self.encode(format)?;
        std::fs::write(path, &bytes).map_err(|e| AppError::FileWriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Saved image");
        Ok(bytes.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(width: u32, height: u32, channels: u8) -> Raster {
        let mut data = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let v = if (x + y) % 2 == 0 { 200 } else { 10 };
                data.extend_from_slice(&[v, v / 2, 255 - v]);
                if channels == 4 {
                    data.push(128);
                }
            }
        }
        Raster::from_raw(width, height, channels, data)
    }

    fn brute_force_sum(raster: &Raster, x: u32, y: u32, w: u32, h: u32, c: usize) -> i64 {
        let mut sum = 0i64;
        for j in y..y + h {
            for i in x..x + w {
                sum += raster.color_at(i, j)[c] as i64;
            }
        }
        sum
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            RasterFormat::from_path(Path::new("a/b.PNG")),
            Some(RasterFormat::Png)
        );
        assert_eq!(
            RasterFormat::from_path(Path::new("x.jpeg")),
            Some(RasterFormat::Jpeg)
        );
        assert_eq!(
            RasterFormat::from_path(Path::new("x.jpg")),
            Some(RasterFormat::Jpeg)
        );
        assert_eq!(RasterFormat::from_path(Path::new("x.webp")), None);
        assert_eq!(RasterFormat::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_color_accessors() {
        let mut raster = checker(4, 3, 3);
        assert_eq!(raster.color_at(0, 0), [200, 100, 55]);
        assert_eq!(raster.color_at(1, 0), [10, 5, 245]);
        // Out of range reads black, writes are ignored.
        assert_eq!(raster.color_at(99, 0), [0, 0, 0]);
        raster.set_color_at(99, 0, 1, 2, 3);

        raster.set_color_at(2, 1, 7, 8, 9);
        assert_eq!(raster.color_at(2, 1), [7, 8, 9]);
    }

    #[test]
    fn test_alpha_passthrough() {
        let mut raster = checker(2, 2, 4);
        assert_eq!(raster.alpha_at(0, 0), 128);
        raster.set_alpha_at(0, 0, 42);
        assert_eq!(raster.alpha_at(0, 0), 42);

        let rgb = checker(2, 2, 3);
        assert_eq!(rgb.alpha_at(0, 0), 0xFF);
    }

    #[test]
    fn test_set_block_color_keeps_alpha() {
        let mut raster = checker(4, 4, 4);
        raster.set_block_color(1, 1, 2, 2, 9, 9, 9);
        assert_eq!(raster.color_at(1, 1), [9, 9, 9]);
        assert_eq!(raster.color_at(2, 2), [9, 9, 9]);
        assert_eq!(raster.alpha_at(1, 1), 128);
        // Outside the block untouched.
        assert_eq!(raster.color_at(0, 0), [200, 100, 55]);
    }

    #[test]
    fn test_prefix_sum_matches_brute_force() {
        for (w, h, ch) in [(1, 1, 3), (5, 3, 3), (7, 7, 4), (8, 2, 4)] {
            let mut raster = checker(w, h, ch);
            raster.compute_summed_area_table();
            for x in 0..w {
                for y in 0..h {
                    for bw in 1..=(w - x) {
                        for bh in 1..=(h - y) {
                            for c in 0..COLOR_CHANNELS {
                                assert_eq!(
                                    raster.channel_block_sum(x, y, bw, bh, c),
                                    brute_force_sum(&raster, x, y, bw, bh, c),
                                    "mismatch at ({x},{y}) {bw}x{bh} c{c} in {w}x{h}"
                                );
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_square_prefix_sum() {
        let mut raster = checker(4, 4, 3);
        raster.compute_summed_square_table();
        let mut expected = 0i64;
        for j in 0..4 {
            for i in 0..4 {
                let v = raster.color_at(i, j)[0] as i64;
                expected += v * v;
            }
        }
        assert_eq!(raster.channel_square_block_sum(0, 0, 4, 4, 0), expected);
    }

    #[test]
    #[should_panic(expected = "summed-area table queried")]
    fn test_block_sum_without_table_panics() {
        let raster = checker(2, 2, 3);
        raster.channel_block_sum(0, 0, 1, 1, 0);
    }

    #[test]
    fn test_estimate_encoded_size_no_disk() {
        let raster = checker(16, 16, 3);
        let size = raster.estimate_encoded_size(RasterFormat::Png).unwrap();
        assert!(size > 0);
        let bmp = raster.estimate_encoded_size(RasterFormat::Bmp).unwrap();
        // BMP is uncompressed: header + rows.
        assert!(bmp as usize >= 16 * 16 * 3);
    }

    #[test]
    fn test_save_and_reload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.png");
        let raster = checker(8, 6, 3);
        let written = raster.save(&path).unwrap();
        assert!(written > 0);

        let reloaded = Raster::load(&path).unwrap();
        assert_eq!(reloaded.width(), 8);
        assert_eq!(reloaded.height(), 6);
        assert_eq!(reloaded.data(), raster.data());
        assert_eq!(reloaded.file_size(), written);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Raster::load(Path::new("/nonexistent/missing.png")).unwrap_err();
        assert!(matches!(err, AppError::FileNotFound { .. }));
    }

    #[test]
    fn test_pixel_copy_drops_tables() {
        let mut raster = checker(3, 3, 3);
        raster.compute_summed_area_table();
        let copy = raster.pixel_copy();
        assert!(!copy.has_summed_area_table());
        assert_eq!(copy.data(), raster.data());
    }
}
