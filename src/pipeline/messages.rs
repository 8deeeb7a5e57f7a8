use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::models::{Bounds, Frame, Plate};
use crate::scanner::FrameDiagnostic;

/// Fixed overlay messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OverlayTag {
    /// The puck in view was already fully read
    AlreadyScanned,
    /// No puck seen for longer than the no-puck timeout
    NoPuckDetected,
}

impl fmt::Display for OverlayTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverlayTag::AlreadyScanned => "Already Scanned",
            OverlayTag::NoPuckDetected => "No Puck Detected",
        })
    }
}

/// One highlighted slot
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SlotHighlight {
    /// Where the slot was last located
    pub bounds: Option<Bounds>,
    /// Whether it holds a decoded barcode
    pub valid: bool,
}

/// Drawing instructions for the live view
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Overlay {
    /// Progress on a partially read plate
    Highlight {
        /// Plate being read
        plate_id: u64,
        /// Every slot, in template order
        slots: Vec<SlotHighlight>,
        /// Progress beep pitch: higher while more slots are missing
        tone_hz: u32,
    },
    /// Text message
    Message {
        /// What to show
        tag: OverlayTag,
    },
}

impl Overlay {
    /// Highlight overlay for `plate`
    pub fn highlight(plate: &Plate) -> Self {
        Overlay::Highlight {
            plate_id: plate.id(),
            slots: plate
                .slots()
                .iter()
                .map(|s| SlotHighlight {
                    bounds: s.bounds,
                    valid: s.state.is_valid(),
                })
                .collect(),
            tone_hz: progress_tone_hz(plate.num_slots(), plate.num_valid_barcodes()),
        }
    }

    /// Message overlay
    pub fn message(tag: OverlayTag) -> Self {
        Overlay::Message { tag }
    }
}

/// `10000 * (N - valid) / N + 37`
pub fn progress_tone_hz(num_slots: usize, num_valid: usize) -> u32 {
    if num_slots == 0 {
        return 37;
    }
    let missing = num_slots.saturating_sub(num_valid);
    (10_000 * missing / num_slots) as u32 + 37
}

/// A plate worth recording, with the frame it came from
#[derive(Debug, Clone)]
pub struct ScanResult {
    /// Snapshot of the plate after this frame
    pub plate: Plate,
    /// Frame the plate was last updated from
    pub image: Arc<Frame>,
    /// Capture-assigned frame number
    pub frame_number: u64,
}

/// Per-frame timing and diagnostic from the decode unit
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FrameReport {
    /// Capture-assigned frame number
    pub frame_number: u64,
    /// Consecutive frames merged into the current plate
    pub plate_frame_number: u64,
    /// Time spent scanning the frame
    pub duration: Duration,
    /// Scanner outcome for the frame
    pub diagnostic: FrameDiagnostic,
}

/// Work item on the decode queue
#[derive(Debug)]
pub(crate) enum DecodeTask {
    Frame { number: u64, frame: Arc<Frame> },
    Stop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_tone() {
        assert_eq!(progress_tone_hz(16, 0), 10_037);
        assert_eq!(progress_tone_hz(16, 8), 5_037);
        assert_eq!(progress_tone_hz(16, 15), 662);
        assert_eq!(progress_tone_hz(16, 16), 37);
        assert_eq!(progress_tone_hz(0, 0), 37);
    }

    #[test]
    fn test_tag_text() {
        assert_eq!(OverlayTag::AlreadyScanned.to_string(), "Already Scanned");
        assert_eq!(OverlayTag::NoPuckDetected.to_string(), "No Puck Detected");
    }
}
