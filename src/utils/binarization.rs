//! Thresholding and intensity statistics for frames and slot windows

use crate::models::BitMatrix;

/// Convert grayscale image to binary using Otsu's thresholding method
/// Returns a BitMatrix where true = dark, false = bright
pub fn otsu_binarize(gray: &[u8], width: usize, height: usize) -> BitMatrix {
    threshold_binarize(gray, width, height, otsu_threshold(&histogram(gray)))
}

/// Simple global threshold binarization (`pixel < threshold` is dark)
pub fn threshold_binarize(gray: &[u8], width: usize, height: usize, threshold: u8) -> BitMatrix {
    let mut binary = BitMatrix::new(width, height);

    for (idx, &pixel) in gray.iter().enumerate().take(width * height) {
        if pixel < threshold {
            binary.set(idx % width, idx / width, true);
        }
    }

    binary
}

/// Intensity histogram
pub fn histogram(pixels: &[u8]) -> [u32; 256] {
    let mut histogram = [0u32; 256];
    for &pixel in pixels {
        histogram[pixel as usize] += 1;
    }
    histogram
}

/// Otsu's optimal threshold: pixels below it form the dark class
pub fn otsu_threshold(histogram: &[u32; 256]) -> u8 {
    let total: u64 = histogram.iter().map(|&c| c as u64).sum();
    if total == 0 {
        return 128;
    }
    let total_sum: u64 = histogram
        .iter()
        .enumerate()
        .map(|(i, &c)| i as u64 * c as u64)
        .sum();

    let mut dark_pixels = 0u64;
    let mut dark_sum = 0u64;
    let mut max_variance = 0.0f64;
    let mut optimal_threshold = 128u8;

    // Threshold t puts intensities 0..t in the dark class
    for t in 1..=255usize {
        dark_pixels += histogram[t - 1] as u64;
        dark_sum += (t as u64 - 1) * histogram[t - 1] as u64;
        let bright_pixels = total - dark_pixels;
        if dark_pixels == 0 || bright_pixels == 0 {
            continue;
        }

        let dark_mean = dark_sum as f64 / dark_pixels as f64;
        let bright_mean = (total_sum - dark_sum) as f64 / bright_pixels as f64;
        let w_dark = dark_pixels as f64 / total as f64;
        let w_bright = bright_pixels as f64 / total as f64;
        let variance = w_dark * w_bright * (dark_mean - bright_mean).powi(2);

        if variance > max_variance {
            max_variance = variance;
            optimal_threshold = t as u8;
        }
    }

    optimal_threshold
}

/// Intensity summary of an image window
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WindowStats {
    /// 5th percentile intensity
    pub low: u8,
    /// 95th percentile intensity
    pub high: u8,
    /// Otsu threshold inside the window
    pub threshold: u8,
    /// Pixels sampled
    pub pixels: usize,
}

impl WindowStats {
    /// Robust contrast: spread between the 5th and 95th percentiles
    pub fn contrast(&self) -> u8 {
        self.high.saturating_sub(self.low)
    }
}

/// Statistics for the pixels in `[x0, x1) x [y0, y1)`, clipped to the image
pub fn window_stats(
    gray: &[u8],
    width: usize,
    height: usize,
    (x0, y0): (usize, usize),
    (x1, y1): (usize, usize),
) -> WindowStats {
    let (x1, y1) = (x1.min(width), y1.min(height));
    let mut histogram = [0u32; 256];
    let mut pixels = 0usize;
    for y in y0..y1 {
        let row = &gray[y * width..(y + 1) * width];
        for &pixel in row.iter().take(x1).skip(x0) {
            histogram[pixel as usize] += 1;
            pixels += 1;
        }
    }

    WindowStats {
        low: percentile(&histogram, pixels, 0.05),
        high: percentile(&histogram, pixels, 0.95),
        threshold: otsu_threshold(&histogram),
        pixels,
    }
}

fn percentile(histogram: &[u32; 256], total: usize, fraction: f64) -> u8 {
    if total == 0 {
        return 0;
    }
    let target = ((total as f64 * fraction).ceil() as usize).max(1);
    let mut seen = 0usize;
    for (value, &count) in histogram.iter().enumerate() {
        seen += count as usize;
        if seen >= target {
            return value as u8;
        }
    }
    255
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_binarize() {
        let gray = vec![100, 150, 200, 50]; // 2x2 image
        let binary = threshold_binarize(&gray, 2, 2, 128);

        // Pixels < 128 should be dark (true)
        assert!(binary.get(0, 0)); // 100 < 128
        assert!(!binary.get(1, 0)); // 150 >= 128
        assert!(!binary.get(0, 1)); // 200 >= 128
        assert!(binary.get(1, 1)); // 50 < 128
    }

    #[test]
    fn test_otsu_binarize() {
        let mut gray = vec![50u8; 50]; // Dark class
        gray.extend(vec![200u8; 50]); // Light class

        let binary = otsu_binarize(&gray, 10, 10);

        assert!(binary.get(0, 0));
        assert!(!binary.get(0, 7));
    }

    #[test]
    fn test_otsu_threshold_separates_classes() {
        let mut gray = vec![30u8; 300];
        gray.extend(vec![210u8; 700]);
        let t = otsu_threshold(&histogram(&gray));
        assert!(t > 30 && t <= 210);
    }

    #[test]
    fn test_window_stats() {
        // 4x4: left half 20, right half 220
        let gray: Vec<u8> = (0..16).map(|i| if i % 4 < 2 { 20 } else { 220 }).collect();
        let stats = window_stats(&gray, 4, 4, (0, 0), (4, 4));
        assert_eq!(stats.pixels, 16);
        assert_eq!(stats.low, 20);
        assert_eq!(stats.high, 220);
        assert_eq!(stats.contrast(), 200);
        assert!(stats.threshold > 20 && stats.threshold <= 220);

        let flat = window_stats(&gray, 4, 4, (2, 0), (10, 10));
        assert_eq!(flat.pixels, 8);
        assert_eq!(flat.contrast(), 0);
    }
}
