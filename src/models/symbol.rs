use serde::{Deserialize, Serialize};

use crate::decoder::tables::SYMBOL_SIZES;

/// ECC200 symbol size class
///
/// Fixes the module grid, how it splits into data regions, and the
/// data/redundancy codeword counts of the single Reed-Solomon block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "SymbolDims", into = "SymbolDims")]
pub struct SymbolSize {
    pub(crate) rows: u8,
    pub(crate) cols: u8,
    pub(crate) region_rows: u8,
    pub(crate) region_cols: u8,
    pub(crate) data_codewords: u16,
    pub(crate) ecc_codewords: u16,
}

impl SymbolSize {
    /// Look up a size class by full symbol size (including finder and timing)
    pub fn from_symbol(rows: usize, cols: usize) -> Option<Self> {
        SYMBOL_SIZES
            .iter()
            .find(|s| s.rows as usize == rows && s.cols as usize == cols)
            .copied()
    }

    /// Look up a size class by mapping matrix dimensions
    pub fn from_mapping(rows: usize, cols: usize) -> Option<Self> {
        SYMBOL_SIZES
            .iter()
            .find(|s| s.mapping_rows() == rows && s.mapping_cols() == cols)
            .copied()
    }

    /// All supported size classes
    pub fn all() -> &'static [SymbolSize] {
        &SYMBOL_SIZES
    }

    /// Symbol rows in modules
    pub fn rows(&self) -> usize {
        self.rows as usize
    }

    /// Symbol columns in modules
    pub fn cols(&self) -> usize {
        self.cols as usize
    }

    /// Data rows of one region
    pub fn region_rows(&self) -> usize {
        self.region_rows as usize
    }

    /// Data columns of one region
    pub fn region_cols(&self) -> usize {
        self.region_cols as usize
    }

    /// Regions stacked vertically
    pub fn regions_vertical(&self) -> usize {
        self.rows() / (self.region_rows() + 2)
    }

    /// Regions side by side
    pub fn regions_horizontal(&self) -> usize {
        self.cols() / (self.region_cols() + 2)
    }

    /// Rows of the mapping matrix (all data regions joined)
    pub fn mapping_rows(&self) -> usize {
        self.regions_vertical() * self.region_rows()
    }

    /// Columns of the mapping matrix
    pub fn mapping_cols(&self) -> usize {
        self.regions_horizontal() * self.region_cols()
    }

    /// Data codewords
    pub fn data_codewords(&self) -> usize {
        self.data_codewords as usize
    }

    /// Redundancy (error correction) codewords
    pub fn ecc_codewords(&self) -> usize {
        self.ecc_codewords as usize
    }

    /// Total codewords placed in the symbol
    pub fn total_codewords(&self) -> usize {
        self.data_codewords() + self.ecc_codewords()
    }

    /// Maximum correctable symbol errors
    pub fn error_capacity(&self) -> usize {
        self.ecc_codewords() / 2
    }
}

/// Serialized form of a [`SymbolSize`]: just the symbol dimensions
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SymbolDims {
    /// Symbol rows
    pub rows: usize,
    /// Symbol columns
    pub cols: usize,
}

impl TryFrom<SymbolDims> for SymbolSize {
    type Error = String;

    fn try_from(dims: SymbolDims) -> Result<Self, Self::Error> {
        SymbolSize::from_symbol(dims.rows, dims.cols)
            .ok_or_else(|| format!("unsupported symbol size {}x{}", dims.rows, dims.cols))
    }
}

impl From<SymbolSize> for SymbolDims {
    fn from(size: SymbolSize) -> Self {
        Self {
            rows: size.rows(),
            cols: size.cols(),
        }
    }
}
