//! Slot detection modules
//!
//! This module contains all the logic for finding symbols on a puck:
//! - Geometry templates (slot anchors, symbol size)
//! - Puck alignment (largest bright region)
//! - Module grid sampling and orientation
//! - Per-slot window classification

/// Slot window classification
pub mod locator;
/// Puck alignment using connected components
pub mod puck;
/// Module sampling, finder orientation and alignment stripping
pub mod sampling;
/// Built-in and JSON geometry templates
pub mod template;

pub use locator::{
    FrameLayout, LocatedFrame, LocatedRegion, MissReason, SlotLocator, SlotRegion, SlotWindow,
};
pub use puck::locate_puck;
pub use template::{GeometryTemplate, BUILTIN_TEMPLATES};
