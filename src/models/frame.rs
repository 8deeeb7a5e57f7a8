use image::GrayImage;

use crate::utils::grayscale::rgb_to_grayscale;

/// One grayscale camera frame
#[derive(Debug, Clone)]
pub struct Frame {
    image: GrayImage,
}

impl Frame {
    /// Wrap an 8-bit grayscale image
    pub fn new(image: GrayImage) -> Self {
        Self { image }
    }

    /// Build from raw grayscale bytes; `None` if the length does not match
    pub fn from_gray(pixels: Vec<u8>, width: usize, height: usize) -> Option<Self> {
        if pixels.len() != width * height {
            return None;
        }
        GrayImage::from_raw(width as u32, height as u32, pixels).map(Self::new)
    }

    /// Build from packed RGB bytes (3 bytes per pixel)
    pub fn from_rgb(rgb: &[u8], width: usize, height: usize) -> Option<Self> {
        if rgb.len() != width * height * 3 {
            return None;
        }
        Self::from_gray(rgb_to_grayscale(rgb, width, height), width, height)
    }

    /// Width in pixels
    pub fn width(&self) -> usize {
        self.image.width() as usize
    }

    /// Height in pixels
    pub fn height(&self) -> usize {
        self.image.height() as usize
    }

    /// Row-major grayscale bytes
    pub fn pixels(&self) -> &[u8] {
        self.image.as_raw()
    }

    /// Intensity at (x, y); out-of-range reads return white
    pub fn intensity(&self, x: usize, y: usize) -> u8 {
        if x >= self.width() || y >= self.height() {
            return u8::MAX;
        }
        self.pixels()[y * self.width() + x]
    }

    /// Underlying image
    pub fn image(&self) -> &GrayImage {
        &self.image
    }
}
