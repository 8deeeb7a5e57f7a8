//! Slot location: puck alignment plus per-slot window classification
//!
//! `align` is cheap (one binarization of the frame) and yields the expected
//! window of every symbol. `examine` does the per-slot work and is only run
//! for slots that still need a read.

use serde::Serialize;
use tracing::trace;

use super::puck::locate_puck;
use super::sampling::{orient, sample_grid, strip_alignment};
use super::template::GeometryTemplate;
use crate::config::LocatorConfig;
use crate::models::{BitMatrix, Bounds, Frame, Point, PuckGeometry};
use crate::utils::binarization::window_stats;

/// Why a window held no readable symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MissReason {
    /// Contrast between vacant and readable
    LowContrast,
    /// Dark region far from the expected symbol size
    SizeMismatch,
    /// No orientation matched the finder pattern
    NoFinder,
    /// Window could not be mapped to a module grid
    Degenerate,
}

/// Outcome of examining one slot window
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotRegion {
    /// No pin in the slot
    Vacant,
    /// Something is there but it cannot be sampled
    Miss(MissReason),
    /// Sampled mapping matrix, ready for decoding
    Symbol(BitMatrix),
}

/// Where one slot's symbol is expected in a frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlotWindow {
    /// Slot index, `None` for the holder barcode
    pub index: Option<usize>,
    /// Expected symbol centre
    pub center: Point,
    /// Expected longer symbol side in pixels
    pub side: f32,
    /// Search window
    pub bounds: Bounds,
}

/// Puck geometry and the windows to examine
#[derive(Debug, Clone, PartialEq)]
pub struct FrameLayout {
    /// Aligned puck disc
    pub geometry: PuckGeometry,
    /// Holder barcode window, if the template has one
    pub holder: Option<SlotWindow>,
    /// One window per slot, in template order
    pub slots: Vec<SlotWindow>,
}

/// A window after examination
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedRegion {
    /// What the window holds
    pub region: SlotRegion,
    /// Symbol bounds when a dark region was found, else the search window
    pub bounds: Bounds,
}

/// Fully examined frame
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedFrame {
    /// Aligned puck disc
    pub geometry: PuckGeometry,
    /// Holder window result
    pub holder: Option<LocatedRegion>,
    /// Slot window results, in template order
    pub slots: Vec<LocatedRegion>,
}

/// Finds slot symbols for one geometry template
#[derive(Debug, Clone)]
pub struct SlotLocator {
    template: GeometryTemplate,
    config: LocatorConfig,
}

impl SlotLocator {
    /// Locator for `template`
    pub fn new(template: GeometryTemplate, config: LocatorConfig) -> Self {
        Self { template, config }
    }

    /// Template the windows are derived from
    pub fn template(&self) -> &GeometryTemplate {
        &self.template
    }

    /// Find the puck and derive every symbol window
    pub fn align(&self, frame: &Frame) -> Option<FrameLayout> {
        let geometry = locate_puck(frame, &self.config)?;
        let side = self.template.symbol_span * geometry.radius;
        let window_side = side * self.config.window_scale;

        let window = |index: Option<usize>, anchor: &Point| {
            let center = geometry
                .center
                .translate(anchor.x * geometry.radius, anchor.y * geometry.radius);
            SlotWindow {
                index,
                center,
                side,
                bounds: Bounds::centered(center, window_side),
            }
        };

        Some(FrameLayout {
            geometry,
            holder: self.template.holder.as_ref().map(|a| window(None, a)),
            slots: self
                .template
                .slots
                .iter()
                .enumerate()
                .map(|(i, a)| window(Some(i), a))
                .collect(),
        })
    }

    /// Align and examine every window
    pub fn locate(&self, frame: &Frame) -> Option<LocatedFrame> {
        let layout = self.align(frame)?;
        Some(LocatedFrame {
            geometry: layout.geometry,
            holder: layout.holder.as_ref().map(|w| self.examine(frame, w)),
            slots: layout.slots.iter().map(|w| self.examine(frame, w)).collect(),
        })
    }

    /// Classify one window and sample its symbol when readable
    pub fn examine(&self, frame: &Frame, window: &SlotWindow) -> LocatedRegion {
        let miss = |reason: MissReason, bounds: Bounds| {
            trace!(slot = ?window.index, ?reason, "slot miss");
            LocatedRegion {
                region: SlotRegion::Miss(reason),
                bounds,
            }
        };

        let (x0, y0) = (
            window.bounds.min_x.max(0.0) as usize,
            window.bounds.min_y.max(0.0) as usize,
        );
        let (x1, y1) = (
            window.bounds.max_x.max(0.0).ceil() as usize,
            window.bounds.max_y.max(0.0).ceil() as usize,
        );
        let stats = window_stats(
            frame.pixels(),
            frame.width(),
            frame.height(),
            (x0, y0),
            (x1, y1),
        );

        if stats.contrast() < self.config.vacant_contrast {
            return LocatedRegion {
                region: SlotRegion::Vacant,
                bounds: window.bounds,
            };
        }
        if stats.contrast() < self.config.min_contrast {
            return miss(MissReason::LowContrast, window.bounds);
        }

        let Some(dark) = dark_bounds(frame, (x0, y0), (x1, y1), stats.threshold) else {
            return miss(MissReason::LowContrast, window.bounds);
        };

        let long_side = dark.width().max(dark.height());
        if (long_side / window.side - 1.0).abs() > self.config.size_tolerance {
            return miss(MissReason::SizeMismatch, dark);
        }

        let size = self.template.symbol;
        let wide = dark.width() >= dark.height();
        let (cols, rows) = if wide == (size.cols() >= size.rows()) {
            (size.cols(), size.rows())
        } else {
            (size.rows(), size.cols())
        };

        let Some(grid) = sample_grid(frame, &dark, cols, rows, stats.threshold) else {
            return miss(MissReason::Degenerate, dark);
        };
        let Some((symbol, score)) = orient(&grid, size, self.config.min_finder_score) else {
            return miss(MissReason::NoFinder, dark);
        };
        trace!(slot = ?window.index, score, "finder matched");

        LocatedRegion {
            region: SlotRegion::Symbol(strip_alignment(&symbol, size)),
            bounds: dark,
        }
    }
}

/// Bounding box (exclusive max) of pixels darker than `threshold`
fn dark_bounds(
    frame: &Frame,
    (x0, y0): (usize, usize),
    (x1, y1): (usize, usize),
    threshold: u8,
) -> Option<Bounds> {
    let (x1, y1) = (x1.min(frame.width()), y1.min(frame.height()));
    let mut found: Option<(usize, usize, usize, usize)> = None;

    for y in y0..y1 {
        for x in x0..x1 {
            if frame.intensity(x, y) >= threshold {
                continue;
            }
            found = Some(match found {
                None => (x, y, x, y),
                Some((a, b, c, d)) => (a.min(x), b.min(y), c.max(x), d.max(y)),
            });
        }
    }

    found.map(|(min_x, min_y, max_x, max_y)| Bounds {
        min_x: min_x as f32,
        min_y: min_y as f32,
        max_x: (max_x + 1) as f32,
        max_y: (max_y + 1) as f32,
    })
}
