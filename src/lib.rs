//! puck_barcode - Data Matrix reading for sample-holder pucks
//!
//! Decodes ECC200 Data Matrix symbols and accumulates the barcodes of a
//! puck's holder and pin slots across a live stream of frames into one
//! validated plate record.

#![warn(missing_docs)]
#![allow(clippy::missing_docs_in_private_items)]

/// Scanner and pipeline configuration
pub mod config;
/// Data Matrix decoding (placement, Reed-Solomon, message interpretation)
pub mod decoder;
/// Puck and slot location (templates, puck disc, slot windows, grid sampling)
pub mod detector;
/// Error types
pub mod error;
/// Core data structures (BitMatrix, Frame, Plate, SymbolSize, etc.)
pub mod models;
/// Capture and decode threads
pub mod pipeline;
/// Multi-frame plate scanner
pub mod scanner;
/// Side/top camera workflow
pub mod session;
/// Synthetic symbols and frames
pub mod testing;
/// Image loading and directory replay
pub mod tools;
/// Utility functions (grayscale, binarization, geometry)
pub mod utils;

pub use config::{LocatorConfig, ScanConfig};
pub use decoder::{decode, DataMatrixDecoder, DecodedSymbol};
pub use detector::{GeometryTemplate, SlotLocator};
pub use error::{CaptureError, ConfigError, DecodeError, DecodeFailure, PipelineError, UncorrectableError};
pub use models::{BitMatrix, Frame, Plate, Point, PuckGeometry, Slot, SlotState, SymbolSize};
pub use pipeline::{Pipeline, PipelineHandle, PipelineStats, ScanResult};
pub use scanner::{FrameDiagnostic, PlateScanner};
pub use session::{CameraPhase, ScanRecord, ScanSession, SessionEvent};

/// Scan a single frame with a fresh scanner
///
/// Returns `Ok(None)` when no puck could be aligned.
pub fn scan_frame(frame: &Frame, config: &ScanConfig) -> Result<Option<Plate>, ConfigError> {
    let mut scanner = PlateScanner::new(config)?;
    let (plate, _) = scanner.scan_next_frame(frame);
    Ok(plate.cloned())
}
