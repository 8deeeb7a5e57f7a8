//! Convert RGB/RGBA frames to 8-bit luminance
//! Y = 0.299*R + 0.587*G + 0.114*B
//! Uses fast integer arithmetic: Y = (76*R + 150*G + 29*B) >> 8

use rayon::prelude::*;

/// Coefficients for grayscale conversion: Y = (76*R + 150*G + 29*B) >> 8
const COEF_R: u32 = 76;
const COEF_G: u32 = 150;
const COEF_B: u32 = 29;

#[inline]
fn luminance(r: u8, g: u8, b: u8) -> u8 {
    ((COEF_R * r as u32 + COEF_G * g as u32 + COEF_B * b as u32) >> 8).min(255) as u8
}

/// Convert packed RGB to grayscale, rows processed in parallel
pub fn rgb_to_grayscale(rgb: &[u8], width: usize, height: usize) -> Vec<u8> {
    to_grayscale(rgb, width, height, 3)
}

/// Convert packed RGBA to grayscale (ignores alpha channel)
pub fn rgba_to_grayscale(rgba: &[u8], width: usize, height: usize) -> Vec<u8> {
    to_grayscale(rgba, width, height, 4)
}

fn to_grayscale(pixels: &[u8], width: usize, height: usize, channels: usize) -> Vec<u8> {
    let mut gray = vec![0u8; width * height];
    if width == 0 || pixels.len() < width * height * channels {
        return gray;
    }

    gray.par_chunks_mut(width).enumerate().for_each(|(y, row)| {
        let row_start = y * width * channels;
        let src = &pixels[row_start..row_start + width * channels];
        for (out, px) in row.iter_mut().zip(src.chunks_exact(channels)) {
            *out = luminance(px[0], px[1], px[2]);
        }
    });

    gray
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgb_to_grayscale() {
        // Pure white
        let gray = rgb_to_grayscale(&[255, 255, 255], 1, 1);
        assert!(gray[0] >= 254);

        // Pure black
        let gray = rgb_to_grayscale(&[0, 0, 0], 1, 1);
        assert_eq!(gray[0], 0);

        // Green dominates luminance
        let red = rgb_to_grayscale(&[255, 0, 0], 1, 1)[0];
        let green = rgb_to_grayscale(&[0, 255, 0], 1, 1)[0];
        assert!(red > 0 && red < 255);
        assert!(green > red);

        let img = vec![255, 0, 0, 0, 255, 0, 0, 0, 255, 255, 255, 255];
        assert_eq!(rgb_to_grayscale(&img, 2, 2).len(), 4);
    }

    #[test]
    fn test_rgba_ignores_alpha() {
        let opaque = rgba_to_grayscale(&[255, 128, 64, 255], 1, 1);
        let clear = rgba_to_grayscale(&[255, 128, 64, 0], 1, 1);
        assert_eq!(opaque, clear);
    }

    #[test]
    fn test_short_buffer_yields_black() {
        assert_eq!(rgb_to_grayscale(&[255; 4], 2, 1), vec![0, 0]);
    }
}
