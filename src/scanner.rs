//! Multi-frame plate scanning
//!
//! Each frame is aligned against the geometry template; while the puck stays
//! put the same [`Plate`] accumulates reads, and only slots that are not yet
//! Valid are examined again.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, trace};

use crate::config::ScanConfig;
use crate::decoder::DataMatrixDecoder;
use crate::detector::{GeometryTemplate, SlotLocator, SlotRegion, SlotWindow};
use crate::error::ConfigError;
use crate::models::{Bounds, Frame, Plate, SlotState};

/// Per-frame scan summary
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FrameDiagnostic {
    /// Puck geometry was found
    pub is_aligned: bool,
    /// At least one slot (holder or sample) is Valid after this frame
    pub has_barcodes: bool,
    /// Windows that held a symbol this frame
    pub regions_located: usize,
    /// Decode attempts made this frame
    pub decode_attempts: usize,
    /// Slots that became Valid this frame
    pub newly_decoded: usize,
}

/// Slot outcome computed off the plate, merged afterwards
struct SlotRead {
    index: Option<usize>,
    state: SlotState,
    bounds: Bounds,
    attempted: bool,
    located: bool,
}

/// Scans a stream of frames into plates
#[derive(Debug)]
pub struct PlateScanner {
    locator: SlotLocator,
    continuity_tolerance: f32,
    current_plate: Option<Plate>,
    next_plate_id: u64,
}

impl PlateScanner {
    /// Scanner for the template named in `config`
    pub fn new(config: &ScanConfig) -> Result<Self, ConfigError> {
        let template = GeometryTemplate::resolve(&config.template)?;
        Self::with_template(template, config)
    }

    /// Scanner for an explicit template
    pub fn with_template(template: GeometryTemplate, config: &ScanConfig) -> Result<Self, ConfigError> {
        template.validate()?;
        Ok(Self {
            locator: SlotLocator::new(template, config.locator.clone()),
            continuity_tolerance: config.continuity_tolerance,
            current_plate: None,
            next_plate_id: 1,
        })
    }

    /// Geometry template in use
    pub fn template(&self) -> &GeometryTemplate {
        self.locator.template()
    }

    /// Plate currently being accumulated
    pub fn current_plate(&self) -> Option<&Plate> {
        self.current_plate.as_ref()
    }

    /// Forget the current plate
    pub fn reset(&mut self) {
        self.current_plate = None;
    }

    /// Merge one frame into the current plate
    ///
    /// Returns `None` for the plate when the puck could not be aligned; the
    /// current plate is then left untouched.
    pub fn scan_next_frame(&mut self, frame: &Frame) -> (Option<&Plate>, FrameDiagnostic) {
        let mut diagnostic = FrameDiagnostic::default();

        let Some(layout) = self.locator.align(frame) else {
            trace!("no puck in frame");
            return (None, diagnostic);
        };
        diagnostic.is_aligned = true;

        let continuous = self
            .current_plate
            .as_ref()
            .is_some_and(|p| p.geometry().is_continuous_with(&layout.geometry, self.continuity_tolerance));
        if !continuous {
            let id = self.next_plate_id;
            self.next_plate_id += 1;
            debug!(plate = id, center = ?layout.geometry.center, radius = layout.geometry.radius, "new plate");
            self.current_plate = Some(Plate::new(
                id,
                self.locator.template().name.clone(),
                layout.geometry,
                self.locator.template().slot_count(),
            ));
        }
        let Some(plate) = self.current_plate.as_mut() else {
            return (None, diagnostic);
        };
        plate.update_geometry(layout.geometry);

        let pending: Vec<&SlotWindow> = layout
            .holder
            .iter()
            .filter(|_| !plate.holder().state.is_valid())
            .chain(layout.slots.iter().filter(|w| {
                w.index
                    .and_then(|i| plate.slots().get(i))
                    .is_some_and(|s| !s.state.is_valid())
            }))
            .collect();

        let locator = &self.locator;
        let reads: Vec<SlotRead> = pending
            .par_iter()
            .map(|window| read_slot(locator, frame, window))
            .collect();

        for read in reads {
            diagnostic.decode_attempts += read.attempted as usize;
            diagnostic.regions_located += read.located as usize;
            diagnostic.newly_decoded += read.state.is_valid() as usize;

            let slot = match read.index {
                None => Some(plate.holder_mut()),
                Some(i) => plate.slot_mut(i),
            };
            if let Some(slot) = slot {
                slot.record(read.state);
                slot.bounds = Some(read.bounds);
            }
        }

        diagnostic.has_barcodes = plate.has_any_valid();
        debug!(
            plate = plate.id(),
            valid = plate.num_valid_barcodes(),
            slots = plate.num_slots(),
            attempts = diagnostic.decode_attempts,
            "frame merged"
        );

        (self.current_plate.as_ref(), diagnostic)
    }
}

fn read_slot(locator: &SlotLocator, frame: &Frame, window: &SlotWindow) -> SlotRead {
    let located = locator.examine(frame, window);
    let (state, attempted, found) = match located.region {
        SlotRegion::Vacant => (SlotState::Empty, false, false),
        SlotRegion::Miss(_) => (SlotState::NotFound, false, false),
        SlotRegion::Symbol(bits) => match DataMatrixDecoder::decode(&bits) {
            Ok(text) => (SlotState::Valid(text), true, true),
            Err(failure) => {
                trace!(slot = ?window.index, %failure, "decode failed");
                (SlotState::NotFound, true, true)
            }
        },
    };

    SlotRead {
        index: window.index,
        state,
        bounds: located.bounds,
        attempted,
        located: found,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::PuckScene;

    fn scanner() -> PlateScanner {
        PlateScanner::new(&ScanConfig::default()).unwrap()
    }

    #[test]
    fn test_full_plate_in_one_frame() {
        let mut scanner = scanner();
        let frame = PuckScene::unipuck(3).with_all_slots("A").with_holder("H1").render();
        let (plate, diag) = scanner.scan_next_frame(&frame);
        let plate = plate.unwrap();
        assert!(diag.is_aligned && diag.has_barcodes);
        assert_eq!(diag.decode_attempts, 17);
        assert!(plate.is_full_valid());
        assert_eq!(plate.holder().state, SlotState::Valid("H1".into()));
        assert_eq!(plate.barcodes()[15], Some("A15"));
    }

    #[test]
    fn test_unaligned_frame_keeps_plate() {
        let mut scanner = scanner();
        let frame = PuckScene::unipuck(3).with_slot(0, "X").render();
        scanner.scan_next_frame(&frame);
        let blank = Frame::from_gray(vec![0; 64 * 64], 64, 64).unwrap();
        let (plate, diag) = scanner.scan_next_frame(&blank);
        assert!(plate.is_none());
        assert!(!diag.is_aligned && !diag.has_barcodes);
        assert_eq!(scanner.current_plate().unwrap().num_valid_barcodes(), 1);
    }

    #[test]
    fn test_valid_slots_not_reexamined() {
        let mut scanner = scanner();
        let scene = PuckScene::unipuck(3).with_all_slots("A").without_slot(4);
        scanner.scan_next_frame(&scene.render());
        let (plate, diag) = scanner.scan_next_frame(&scene.render());
        let plate = plate.unwrap();
        // Only the empty slot is looked at again; the holder is vacant too
        assert_eq!(diag.decode_attempts, 0);
        assert_eq!(plate.slots()[4].state, SlotState::Empty);
        assert_eq!(plate.holder().state, SlotState::Empty);
        assert_eq!(plate.num_valid_barcodes(), 15);
        assert_eq!(plate.frames_merged(), 2);
    }

    #[test]
    fn test_vacant_slot_needs_reading() {
        let mut scanner = scanner();
        let scene = PuckScene::unipuck(3).with_all_slots("A").without_slot(9);
        let (plate, diag) = scanner.scan_next_frame(&scene.render());
        assert!(diag.has_barcodes);
        assert!(!plate.unwrap().is_full_valid());
    }

    #[test]
    fn test_bad_template_rejected() {
        let config = ScanConfig {
            template: "nonexistent".into(),
            ..ScanConfig::default()
        };
        assert!(matches!(
            PlateScanner::new(&config),
            Err(ConfigError::UnknownTemplate(_))
        ));
    }
}
