//! RGBA textures
//!
//! Textures are uploaded as RGBA8 with linear filtering and clamp-to-edge wrapping. A
//! failed load leaves the previous texture, if any, untouched. The GL texture is deleted on
//! [`Texture::release`] or when the texture drops.

use std::cell::RefCell;
use std::fmt;
use std::path::Path;
use std::rc::Rc;

use crate::assets::ImageData;
use crate::error::{EngineError, EngineResult};
use crate::render::api::{SharedTexture, Texture, Window};
use crate::render::backend::GraphicsDevice;

/// A 2D texture owned by one window's context
pub struct ImageTexture {
    device: Rc<dyn GraphicsDevice>,
    id: u32,
    file_name: String,
    size: (u32, u32),
}

impl fmt::Debug for ImageTexture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageTexture")
            .field("id", &self.id)
            .field("file_name", &self.file_name)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}

impl ImageTexture {
    /// Create an empty texture for `device`
    pub fn new(device: Rc<dyn GraphicsDevice>) -> Self {
        Self {
            device,
            id: 0,
            file_name: String::new(),
            size: (0, 0),
        }
    }

    /// Create an empty texture for `window`'s context
    pub fn for_window(window: &dyn Window) -> EngineResult<Self> {
        window
            .device()
            .map(Self::new)
            .ok_or_else(|| EngineError::NotInitialized(format!("window {:?}", window.name())))
    }

    /// Wrap in a handle that windows and callbacks can share
    pub fn into_shared(self) -> SharedTexture {
        Rc::new(RefCell::new(self))
    }

    /// Upload already decoded pixels
    pub fn load_image(&mut self, image: &ImageData) -> EngineResult<()> {
        image.validate_stride()?;
        self.upload(image.width, image.height, &image.pixels)
    }

    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]) -> EngineResult<()> {
        if width == 0 || height == 0 {
            return Err(EngineError::InvalidParameter(format!(
                "texture size must be non-zero, got {width}x{height}"
            )));
        }
        let id = self
            .device
            .create_texture(width, height, rgba)
            .map_err(EngineError::BackendInit)?;
        self.release();
        self.id = id;
        self.size = (width, height);
        log::debug!("Uploaded texture {} ({}x{})", id, width, height);
        Ok(())
    }
}

impl Texture for ImageTexture {
    fn load(&mut self, path: &Path) -> EngineResult<()> {
        let image = ImageData::from_file(path)?;
        self.load_image(&image)?;
        self.file_name = path.to_string_lossy().into_owned();
        Ok(())
    }

    fn load_memory(&mut self, width: u32, height: u32, rgba: &[u8]) -> EngineResult<()> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(EngineError::InvalidParameter(format!(
                "{width}x{height} RGBA needs {expected} bytes, got {}",
                rgba.len()
            )));
        }
        self.upload(width, height, rgba)?;
        self.file_name.clear();
        Ok(())
    }

    fn id(&self) -> u32 {
        self.id
    }

    fn file_name(&self) -> &str {
        &self.file_name
    }

    fn set_file_name(&mut self, name: &str) {
        self.file_name = name.to_string();
    }

    fn size(&self) -> (u32, u32) {
        self.size
    }

    fn bind(&self, unit: u32) {
        if self.id != 0 {
            self.device.bind_texture(unit, self.id);
        }
    }

    fn release(&mut self) {
        if self.id != 0 {
            self.device.delete_texture(self.id);
            self.id = 0;
            self.size = (0, 0);
        }
    }
}

impl Drop for ImageTexture {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::backend::headless::{DeviceCall, HeadlessDevice};

    #[test]
    fn test_load_png_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("brick.png");
        image::RgbaImage::from_pixel(8, 4, image::Rgba([200, 100, 50, 255]))
            .save(&path)
            .unwrap();

        let device = Rc::new(HeadlessDevice::new());
        let mut texture = ImageTexture::new(device.clone());
        texture.load(&path).unwrap();

        assert_ne!(texture.id(), 0);
        assert_eq!(texture.size(), (8, 4));
        assert!(texture.file_name().ends_with("brick.png"));
        assert_eq!(device.texture_size(texture.id()), Some((8, 4)));
    }

    #[test]
    fn test_missing_file_keeps_id_zero() {
        let device = Rc::new(HeadlessDevice::new());
        let mut texture = ImageTexture::new(device.clone());

        let err = texture.load(Path::new("textures/missing.png")).unwrap_err();
        assert!(matches!(err, EngineError::InvalidFilePath { .. }));
        assert_eq!(texture.id(), 0);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_load_memory_validates_buffer() {
        let mut texture = ImageTexture::new(Rc::new(HeadlessDevice::new()));
        assert!(matches!(
            texture.load_memory(0, 4, &[]),
            Err(EngineError::InvalidParameter(_))
        ));
        assert!(matches!(
            texture.load_memory(2, 2, &[0; 12]),
            Err(EngineError::InvalidParameter(_))
        ));
        texture.load_memory(2, 2, &[255; 16]).unwrap();
        assert_eq!(texture.size(), (2, 2));
        assert!(texture.file_name().is_empty());
    }

    #[test]
    fn test_empty_image_is_not_uploaded() {
        let device = Rc::new(HeadlessDevice::new());
        let mut texture = ImageTexture::new(device.clone());

        let result = texture.load_image(&ImageData::solid_color(0, 0, [0, 0, 0, 255]));
        assert!(matches!(result, Err(EngineError::InvalidParameter(_))));
        assert_eq!(texture.id(), 0);
        assert!(device.calls().is_empty());
    }

    #[test]
    fn test_drop_deletes_texture() {
        let device = Rc::new(HeadlessDevice::new());
        let mut texture = ImageTexture::new(device.clone());
        texture.load_memory(1, 1, &[9; 4]).unwrap();
        let id = texture.id();

        drop(texture);
        assert_eq!(device.texture_size(id), None);
        assert!(device.calls().contains(&DeviceCall::DeleteTexture(id)));
    }

    #[test]
    fn test_reload_releases_previous_upload() {
        let device = Rc::new(HeadlessDevice::new());
        let mut texture = ImageTexture::new(device.clone());
        texture.load_image(&ImageData::solid_color(2, 2, [0, 0, 0, 255])).unwrap();
        let first = texture.id();

        texture.load_image(&ImageData::solid_color(4, 4, [9, 9, 9, 255])).unwrap();
        assert_ne!(texture.id(), first);
        assert!(device.calls().contains(&DeviceCall::DeleteTexture(first)));
        assert_eq!(texture.size(), (4, 4));
    }

    #[test]
    fn test_bind_and_release_twice() {
        let device = Rc::new(HeadlessDevice::new());
        let mut texture = ImageTexture::new(device.clone());
        texture.bind(0);
        assert!(device.calls().is_empty());

        texture.load_memory(1, 1, &[1, 2, 3, 4]).unwrap();
        let id = texture.id();
        texture.bind(3);
        texture.release();
        texture.release();

        let calls = device.calls();
        assert!(calls.contains(&DeviceCall::BindTexture(3, id)));
        let deletes = calls.iter().filter(|c| **c == DeviceCall::DeleteTexture(id)).count();
        assert_eq!(deletes, 1);
        assert_eq!(texture.id(), 0);
    }
}
