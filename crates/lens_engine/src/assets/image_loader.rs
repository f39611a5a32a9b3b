//! Image decoding for texture uploads
//!
//! Every decoded image is converted to tightly packed RGBA8, the only layout
//! [`ImageTexture`](crate::render::texture::ImageTexture) uploads.

use std::path::Path;

use crate::error::{EngineError, EngineResult};

/// Bytes per RGBA8 pixel
pub const RGBA_CHANNELS: usize = 4;

/// Decoded RGBA8 pixels ready for upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData {
    /// Row-major RGBA8 pixels, first row first
    pub pixels: Vec<u8>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

impl ImageData {
    /// Read and decode an image file
    ///
    /// Unreadable files are reported as [`EngineError::InvalidFilePath`], undecodable content
    /// as [`EngineError::ImageDecode`].
    pub fn from_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        log::debug!("Loading image from {}", path.display());

        let bytes = std::fs::read(path).map_err(|e| EngineError::invalid_path(path, e))?;
        let image = Self::from_bytes(&bytes)?;
        log::info!("Loaded image {}x{} from {}", image.width, image.height, path.display());
        Ok(image)
    }

    /// Decode an encoded image held in memory
    pub fn from_bytes(bytes: &[u8]) -> EngineResult<Self> {
        let rgba = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        let image = Self {
            pixels: rgba.into_raw(),
            width,
            height,
        };
        image.validate_stride()?;
        Ok(image)
    }

    /// Wrap raw RGBA8 pixels, checking the buffer matches the dimensions
    pub fn from_rgba(width: u32, height: u32, pixels: Vec<u8>) -> EngineResult<Self> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidParameter(format!(
                "image size must be non-zero, got {width}x{height}"
            )));
        }
        let image = Self {
            pixels,
            width,
            height,
        };
        image.validate_stride()?;
        Ok(image)
    }

    /// A single-color image
    pub fn solid_color(width: u32, height: u32, color: [u8; 4]) -> Self {
        let count = width as usize * height as usize;
        Self {
            pixels: color.repeat(count),
            width,
            height,
        }
    }

    /// Two-color checkerboard with square cells of `cell` pixels
    pub fn checkerboard(width: u32, height: u32, cell: u32, a: [u8; 4], b: [u8; 4]) -> Self {
        let cell = cell.max(1);
        let mut pixels = Vec::with_capacity(width as usize * height as usize * RGBA_CHANNELS);
        for y in 0..height {
            for x in 0..width {
                let color = if (x / cell + y / cell) % 2 == 0 { a } else { b };
                pixels.extend_from_slice(&color);
            }
        }
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * RGBA_CHANNELS
    }

    /// Check the buffer holds exactly `height` rows of `width * 4` bytes
    pub fn validate_stride(&self) -> EngineResult<()> {
        let expected = self.stride();
        let rows = self.height as usize;
        if rows == 0 || self.pixels.len() == expected * rows {
            return Ok(());
        }
        Err(EngineError::UnsupportedStride {
            expected,
            actual: self.pixels.len() / rows,
        })
    }

    /// Size of the pixel buffer in bytes
    pub fn size_bytes(&self) -> usize {
        self.pixels.len()
    }
}
