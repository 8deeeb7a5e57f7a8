use serde::Serialize;

use super::{Bounds, Point};

/// Read state of one barcode position
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum SlotState {
    /// Never attempted
    Unread,
    /// No pin present in the slot
    Empty,
    /// Attempted and failed; retried on later frames
    NotFound,
    /// Decoded; never overwritten
    Valid(String),
}

impl SlotState {
    /// Whether this is a decoded barcode
    pub fn is_valid(&self) -> bool {
        matches!(self, SlotState::Valid(_))
    }

    /// Decoded text, if any
    pub fn text(&self) -> Option<&str> {
        match self {
            SlotState::Valid(text) => Some(text),
            _ => None,
        }
    }
}

/// One barcode position on a plate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slot {
    /// Position index (0..N-1; the holder uses its own slot)
    pub index: usize,
    /// Current state
    pub state: SlotState,
    /// Image-space bounds where the symbol was last located
    pub bounds: Option<Bounds>,
}

impl Slot {
    pub(crate) fn new(index: usize) -> Self {
        Self {
            index,
            state: SlotState::Unread,
            bounds: None,
        }
    }

    /// Apply this frame's outcome. Valid slots are sticky.
    pub(crate) fn record(&mut self, outcome: SlotState) {
        if self.state.is_valid() {
            return;
        }
        self.state = outcome;
    }
}

/// Puck position in a frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PuckGeometry {
    /// Centre in pixels
    pub center: Point,
    /// Radius in pixels
    pub radius: f32,
}

impl PuckGeometry {
    /// Whether `other` is the same physical puck position within `tolerance`
    /// (fraction of the radius for the centre shift and the size change)
    pub fn is_continuous_with(&self, other: &PuckGeometry, tolerance: f32) -> bool {
        if self.radius <= 0.0 || other.radius <= 0.0 {
            return false;
        }
        let shift = self.center.distance(&other.center) / self.radius;
        let scale = (other.radius / self.radius - 1.0).abs();
        shift <= tolerance && scale <= tolerance
    }
}

/// Scan progress for one physical holder
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Plate {
    id: u64,
    template: String,
    geometry: PuckGeometry,
    holder: Slot,
    slots: Vec<Slot>,
    frames_merged: usize,
}

impl Plate {
    /// Fresh plate with every slot unread
    pub fn new(id: u64, template: impl Into<String>, geometry: PuckGeometry, num_slots: usize) -> Self {
        Self {
            id,
            template: template.into(),
            geometry,
            holder: Slot::new(0),
            slots: (0..num_slots).map(Slot::new).collect(),
            frames_merged: 0,
        }
    }

    /// Identifier, unique per scanner
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Geometry template name
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Latest puck position
    pub fn geometry(&self) -> &PuckGeometry {
        &self.geometry
    }

    /// Holder barcode slot
    pub fn holder(&self) -> &Slot {
        &self.holder
    }

    /// Sample slots in index order
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// N
    pub fn num_slots(&self) -> usize {
        self.slots.len()
    }

    /// Count of Valid sample slots
    pub fn num_valid_barcodes(&self) -> usize {
        self.slots.iter().filter(|s| s.state.is_valid()).count()
    }

    /// Frames merged into this plate
    pub fn frames_merged(&self) -> usize {
        self.frames_merged
    }

    /// All N slots decoded
    pub fn is_full_valid(&self) -> bool {
        self.slots.iter().all(|s| s.state.is_valid())
    }

    /// Whether the holder or any slot is Valid
    pub fn has_any_valid(&self) -> bool {
        self.holder.state.is_valid() || self.slots.iter().any(|s| s.state.is_valid())
    }

    /// Decoded text per slot (`None` where not Valid)
    pub fn barcodes(&self) -> Vec<Option<&str>> {
        self.slots.iter().map(|s| s.state.text()).collect()
    }

    /// Whether both plates describe the same holder: same template and at
    /// least one identically-positioned Valid slot with equal text
    pub fn has_slots_in_common(&self, other: &Plate) -> bool {
        if self.template != other.template || self.slots.len() != other.slots.len() {
            return false;
        }
        self.slots
            .iter()
            .zip(&other.slots)
            .any(|(a, b)| matches!((a.state.text(), b.state.text()), (Some(x), Some(y)) if x == y))
    }

    pub(crate) fn holder_mut(&mut self) -> &mut Slot {
        &mut self.holder
    }

    pub(crate) fn slot_mut(&mut self, index: usize) -> Option<&mut Slot> {
        self.slots.get_mut(index)
    }

    pub(crate) fn update_geometry(&mut self, geometry: PuckGeometry) {
        self.geometry = geometry;
        self.frames_merged += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geometry() -> PuckGeometry {
        PuckGeometry {
            center: Point::new(100.0, 100.0),
            radius: 50.0,
        }
    }

    #[test]
    fn test_valid_slot_is_sticky() {
        let mut slot = Slot::new(0);
        slot.record(SlotState::NotFound);
        assert_eq!(slot.state, SlotState::NotFound);
        slot.record(SlotState::Valid("A1".into()));
        slot.record(SlotState::Valid("B2".into()));
        slot.record(SlotState::NotFound);
        assert_eq!(slot.state, SlotState::Valid("A1".into()));
    }

    #[test]
    fn test_full_valid() {
        let mut plate = Plate::new(1, "test", geometry(), 2);
        assert!(!plate.is_full_valid());
        plate.slot_mut(0).unwrap().record(SlotState::Valid("a".into()));
        assert!(!plate.is_full_valid());
        assert_eq!(plate.num_valid_barcodes(), 1);
        plate.slot_mut(1).unwrap().record(SlotState::Valid("b".into()));
        assert!(plate.is_full_valid());
        assert_eq!(plate.barcodes(), vec![Some("a"), Some("b")]);
    }

    #[test]
    fn test_holder_does_not_count_towards_full() {
        let mut plate = Plate::new(1, "test", geometry(), 1);
        plate.holder_mut().record(SlotState::Valid("H".into()));
        assert!(plate.has_any_valid());
        assert!(!plate.is_full_valid());
    }

    #[test]
    fn test_slots_in_common() {
        let mut a = Plate::new(1, "test", geometry(), 3);
        let mut b = Plate::new(2, "test", geometry(), 3);
        a.slot_mut(1).unwrap().record(SlotState::Valid("X".into()));
        b.slot_mut(2).unwrap().record(SlotState::Valid("X".into()));
        // Same text at different positions is not a match
        assert!(!a.has_slots_in_common(&b));

        b.slot_mut(1).unwrap().record(SlotState::Valid("X".into()));
        assert!(a.has_slots_in_common(&b));

        let c = Plate::new(3, "other", geometry(), 3);
        assert!(!a.has_slots_in_common(&c));
    }

    #[test]
    fn test_geometry_continuity() {
        let g = geometry();
        let moved = PuckGeometry {
            center: Point::new(104.0, 100.0),
            radius: 51.0,
        };
        assert!(g.is_continuous_with(&moved, 0.1));
        let far = PuckGeometry {
            center: Point::new(140.0, 100.0),
            radius: 50.0,
        };
        assert!(!g.is_continuous_with(&far, 0.1));
        let bigger = PuckGeometry {
            center: g.center,
            radius: 70.0,
        };
        assert!(!g.is_continuous_with(&bigger, 0.1));
    }
}
