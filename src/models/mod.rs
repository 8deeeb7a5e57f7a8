/// Grayscale camera frames
pub mod frame;
/// Packed module grids
pub mod matrix;
/// Plates, slots and puck geometry
pub mod plate;
/// Points and bounding boxes
pub mod point;
/// ECC200 size classes
pub mod symbol;

pub use frame::Frame;
pub use matrix::BitMatrix;
pub use plate::{Plate, PuckGeometry, Slot, SlotState};
pub use point::{Bounds, Point};
pub use symbol::SymbolSize;
