use crate::error::CaptureError;
use crate::models::Frame;
use crate::pipeline::FrameSource;
use crate::utils::grayscale::{rgb_to_grayscale, rgba_to_grayscale};
use image::GenericImageView;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

fn max_dim_from_env() -> Option<u32> {
    match env::var("PUCK_MAX_DIM") {
        Ok(value) => match value.trim().parse::<u32>() {
            Ok(0) => None,
            Ok(v) => Some(v),
            Err(_) => None,
        },
        Err(_) => None,
    }
}

/// Load an image file as a grayscale frame.
///
/// Images larger than `PUCK_MAX_DIM` on their longer side are scaled down first.
/// Grayscale files are used as is; colour files go through the luma conversion,
/// with alpha ignored.
pub fn load_frame<P: AsRef<Path>>(path: P) -> Result<Frame, image::ImageError> {
    let mut img = image::open(path)?;
    if let Some(max_dim) = max_dim_from_env() {
        let (orig_w, orig_h) = img.dimensions();
        if orig_w.max(orig_h) > max_dim {
            img = img.resize(max_dim, max_dim, image::imageops::FilterType::Triangle);
        }
    }
    if img.color().channel_count() <= 2 {
        return Ok(Frame::new(img.to_luma8()));
    }

    let (width, height) = (img.width() as usize, img.height() as usize);
    let gray = if img.color().has_alpha() {
        rgba_to_grayscale(img.to_rgba8().as_raw(), width, height)
    } else {
        rgb_to_grayscale(img.to_rgb8().as_raw(), width, height)
    };
    Frame::from_gray(gray, width, height).ok_or_else(|| {
        image::ImageError::Parameter(image::error::ParameterError::from_kind(
            image::error::ParameterErrorKind::DimensionMismatch,
        ))
    })
}

/// Summary statistics for a frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// Minimum intensity.
    pub min: u8,
    /// Maximum intensity.
    pub max: u8,
    /// Average intensity.
    pub avg: u8,
}

/// Compute min/max/avg intensity.
pub fn frame_stats(frame: &Frame) -> FrameStats {
    let gray = frame.pixels();
    let mut min = u8::MAX;
    let mut max = u8::MIN;
    let mut sum: u64 = 0;
    for &v in gray {
        min = min.min(v);
        max = max.max(v);
        sum += v as u64;
    }
    let avg = if gray.is_empty() {
        0
    } else {
        (sum / gray.len() as u64) as u8
    };
    FrameStats { min, max, avg }
}

/// Frame limit from `PUCK_LIMIT`; `None` when unset or `0`.
pub fn limit_from_env() -> Option<usize> {
    match env::var("PUCK_LIMIT") {
        Ok(value) => value
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|v| if v == 0 { None } else { Some(v) }),
        Err(_) => None,
    }
}

/// Image files under `root`, recursively, in path order.
pub fn list_images<P: AsRef<Path>>(root: P) -> Vec<PathBuf> {
    let mut stack = vec![root.as_ref().to_path_buf()];
    let mut images = Vec::new();

    while let Some(dir) = stack.pop() {
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
                continue;
            }
            if let Some(ext) = path.extension() {
                let ext = ext.to_string_lossy().to_lowercase();
                if ext == "png" || ext == "jpg" || ext == "jpeg" || ext == "gif" || ext == "bmp" {
                    images.push(path);
                }
            }
        }
    }

    images.sort();
    images
}

/// Frame source that replays the images of a directory in path order.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl DirectorySource {
    /// Source over every image under `root`, honouring `PUCK_LIMIT`.
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self, CaptureError> {
        let root = root.as_ref();
        let mut paths = list_images(root);
        if paths.is_empty() {
            return Err(CaptureError::Unavailable(format!("no images in {}", root.display())));
        }
        if let Some(limit) = limit_from_env() {
            paths.truncate(limit);
        }
        Ok(Self::from_paths(paths))
    }

    /// Source over explicit files.
    pub fn from_paths(paths: Vec<PathBuf>) -> Self {
        Self { paths, next: 0 }
    }

    /// Files still to be read.
    pub fn remaining(&self) -> &[PathBuf] {
        &self.paths[self.next.min(self.paths.len())..]
    }
}

impl FrameSource for DirectorySource {
    fn read_frame(&mut self) -> Result<Frame, CaptureError> {
        let Some(path) = self.paths.get(self.next) else {
            return Err(CaptureError::Exhausted);
        };
        self.next += 1;
        debug!(path = %path.display(), "loading frame");
        Ok(load_frame(path)?)
    }
}
