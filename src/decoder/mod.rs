//! Data Matrix decoding modules
//!
//! This module turns a sampled mapping matrix into text:
//! - Codeword placement (utah zig-zag with corner cases)
//! - Reed-Solomon error correction over GF(256)
//! - ASCII encodation interpretation

/// Full decode chain with stage-tagged failures
pub mod datamatrix;
/// Data codeword interpretation (ASCII encodation)
pub mod interpret;
/// Codeword extraction from the mapping matrix
pub mod placement;
/// Reed-Solomon error correction
pub mod reed_solomon;
/// ECC200 symbol size table
pub mod tables;

pub use datamatrix::{decode, DataMatrixDecoder, DecodedSymbol};
pub use interpret::interpret;
pub use placement::{extract_codewords, extract_codewords_with_mask};
pub use reed_solomon::{correct, CorrectedMessage};
