//! Puck alignment: find the bright holder disc in a frame
//! The largest bright connected region is the candidate; shape checks
//! reject glare, partial views and clutter.

use std::f32::consts::PI;

use tracing::trace;

use crate::config::LocatorConfig;
use crate::models::{BitMatrix, Frame, Point, PuckGeometry};
use crate::utils::binarization::otsu_binarize;

/// Union-Find data structure
pub(crate) struct UnionFind {
    parent: Vec<u32>,
}

impl UnionFind {
    /// `n` singleton sets
    pub fn new(n: usize) -> Self {
        Self {
            parent: (0..n as u32).collect(),
        }
    }

    /// Root of `x`
    pub fn find(&mut self, x: u32) -> u32 {
        let mut root = x;
        while self.parent[root as usize] != root {
            root = self.parent[root as usize];
        }
        // Path compression
        let mut node = x;
        while self.parent[node as usize] != root {
            let next = self.parent[node as usize];
            self.parent[node as usize] = root;
            node = next;
        }
        root
    }

    /// Merge the sets of `x` and `y`
    pub fn union(&mut self, x: u32, y: u32) {
        let root_x = self.find(x);
        let root_y = self.find(y);
        if root_x != root_y {
            self.parent[root_x as usize] = root_y;
        }
    }
}

/// One 4-connected region of equal-valued pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Component {
    /// Leftmost column
    pub min_x: usize,
    /// Top row
    pub min_y: usize,
    /// Rightmost column, inclusive
    pub max_x: usize,
    /// Bottom row, inclusive
    pub max_y: usize,
    /// Pixel count
    pub area: usize,
}

impl Component {
    /// Bounding box width
    pub fn width(&self) -> usize {
        self.max_x - self.min_x + 1
    }

    /// Bounding box height
    pub fn height(&self) -> usize {
        self.max_y - self.min_y + 1
    }

    fn touches_border(&self, width: usize, height: usize) -> bool {
        self.min_x == 0 || self.min_y == 0 || self.max_x + 1 >= width || self.max_y + 1 >= height
    }
}

/// Connected regions whose pixels equal `value` (4-connectivity)
pub fn find_regions(matrix: &BitMatrix, value: bool) -> Vec<Component> {
    let width = matrix.width();
    let height = matrix.height();

    // Label 0 = background; labels start at 1
    let mut labels = vec![0u32; width * height];
    let mut next_label = 1u32;
    let mut uf = UnionFind::new(width * height + 1);

    // First pass: provisional labels
    for y in 0..height {
        for x in 0..width {
            if matrix.get(x, y) != value {
                continue;
            }
            let idx = y * width + x;
            let left = (x > 0 && matrix.get(x - 1, y) == value).then(|| labels[idx - 1]);
            let up = (y > 0 && matrix.get(x, y - 1) == value).then(|| labels[idx - width]);

            labels[idx] = match (left, up) {
                (None, None) => {
                    let label = next_label;
                    next_label += 1;
                    label
                }
                (Some(l), None) | (None, Some(l)) => l,
                (Some(l), Some(u)) => {
                    if l != u {
                        uf.union(l.max(u), l.min(u));
                    }
                    l.min(u)
                }
            };
        }
    }

    // Second pass: bounding boxes and areas per root
    let mut regions: std::collections::HashMap<u32, Component> = std::collections::HashMap::new();
    for y in 0..height {
        for x in 0..width {
            let label = labels[y * width + x];
            if label == 0 {
                continue;
            }
            let root = uf.find(label);
            let entry = regions.entry(root).or_insert(Component {
                min_x: x,
                min_y: y,
                max_x: x,
                max_y: y,
                area: 0,
            });
            entry.min_x = entry.min_x.min(x);
            entry.min_y = entry.min_y.min(y);
            entry.max_x = entry.max_x.max(x);
            entry.max_y = entry.max_y.max(y);
            entry.area += 1;
        }
    }

    regions.into_values().collect()
}

/// Locate the puck; `None` when no candidate passes the shape checks
pub fn locate_puck(frame: &Frame, config: &LocatorConfig) -> Option<PuckGeometry> {
    let binary = otsu_binarize(frame.pixels(), frame.width(), frame.height());
    let candidate = find_regions(&binary, false)
        .into_iter()
        .max_by_key(|c| c.area)?;

    if candidate.touches_border(frame.width(), frame.height()) {
        trace!(?candidate, "puck candidate touches the frame border");
        return None;
    }

    let (w, h) = (candidate.width() as f32, candidate.height() as f32);
    if (w / h - 1.0).abs() > config.puck_aspect_tolerance {
        trace!(w, h, "puck candidate is not round");
        return None;
    }

    let radius = (w + h) / 4.0;
    if radius < config.min_puck_radius {
        trace!(radius, "puck candidate too small");
        return None;
    }

    let fill = candidate.area as f32 / (PI * radius * radius);
    if fill < config.min_puck_fill || fill > 1.2 {
        trace!(fill, "puck candidate fill implausible");
        return None;
    }

    Some(PuckGeometry {
        center: Point::new(
            (candidate.min_x + candidate.max_x + 1) as f32 / 2.0,
            (candidate.min_y + candidate.max_y + 1) as f32 / 2.0,
        ),
        radius,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn disc_frame(size: usize, cx: f32, cy: f32, r: f32) -> Frame {
        let mut pixels = vec![20u8; size * size];
        for y in 0..size {
            for x in 0..size {
                let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
                if dx * dx + dy * dy <= r * r {
                    pixels[y * size + x] = 210;
                }
            }
        }
        Frame::from_gray(pixels, size, size).unwrap()
    }

    #[test]
    fn test_find_regions() {
        let mut matrix = BitMatrix::new(10, 10);
        // 2x2 square at (2,2) and a U shape that needs a label merge
        for (x, y) in [(2, 2), (3, 2), (2, 3), (3, 3)] {
            matrix.set(x, y, true);
        }
        for (x, y) in [(6, 5), (8, 5), (6, 6), (8, 6), (6, 7), (7, 7), (8, 7)] {
            matrix.set(x, y, true);
        }

        let mut regions = find_regions(&matrix, true);
        regions.sort_by_key(|c| c.min_x);
        assert_eq!(regions.len(), 2);
        assert_eq!((regions[0].min_x, regions[0].min_y, regions[0].max_x, regions[0].max_y), (2, 2, 3, 3));
        assert_eq!(regions[0].area, 4);
        assert_eq!((regions[1].min_x, regions[1].max_x, regions[1].max_y), (6, 8, 7));
        assert_eq!(regions[1].area, 7);
    }

    #[test]
    fn test_locate_puck() {
        let frame = disc_frame(200, 100.0, 90.0, 60.0);
        let puck = locate_puck(&frame, &LocatorConfig::default()).unwrap();
        assert!((puck.center.x - 100.0).abs() <= 1.0);
        assert!((puck.center.y - 90.0).abs() <= 1.0);
        assert!((puck.radius - 60.0).abs() <= 1.0);
    }

    #[test]
    fn test_reject_cut_off_puck() {
        let frame = disc_frame(200, 20.0, 100.0, 60.0);
        assert!(locate_puck(&frame, &LocatorConfig::default()).is_none());
    }

    #[test]
    fn test_reject_small_and_blank() {
        let frame = disc_frame(200, 100.0, 100.0, 15.0);
        assert!(locate_puck(&frame, &LocatorConfig::default()).is_none());
        let blank = Frame::from_gray(vec![0; 64 * 64], 64, 64).unwrap();
        assert!(locate_puck(&blank, &LocatorConfig::default()).is_none());
    }
}
