use crate::models::SymbolSize;

const fn size(
    rows: u8,
    cols: u8,
    region_rows: u8,
    region_cols: u8,
    data_codewords: u16,
    ecc_codewords: u16,
) -> SymbolSize {
    SymbolSize {
        rows,
        cols,
        region_rows,
        region_cols,
        data_codewords,
        ecc_codewords,
    }
}

/// 14x14, the size printed on sample pins and holders
pub(crate) const SIZE_14X14: SymbolSize = size(14, 14, 12, 12, 8, 10);

// ECC200 single-block symbols (ISO/IEC 16022 Table 7).
// Columns: symbol rows, symbol cols, region rows, region cols, data, ecc.
pub(crate) const SYMBOL_SIZES: [SymbolSize; 18] = [
    size(10, 10, 8, 8, 3, 5),
    size(12, 12, 10, 10, 5, 7),
    SIZE_14X14,
    size(16, 16, 14, 14, 12, 12),
    size(18, 18, 16, 16, 18, 14),
    size(20, 20, 18, 18, 22, 18),
    size(22, 22, 20, 20, 30, 20),
    size(24, 24, 22, 22, 36, 24),
    size(26, 26, 24, 24, 44, 28),
    size(32, 32, 14, 14, 62, 36),
    size(36, 36, 16, 16, 86, 42),
    size(40, 40, 18, 18, 114, 48),
    size(44, 44, 20, 20, 144, 56),
    size(48, 48, 22, 22, 174, 68),
    // Rectangular
    size(12, 26, 10, 24, 16, 14),
    size(12, 36, 10, 16, 22, 18),
    size(16, 36, 14, 16, 32, 24),
    size(16, 48, 14, 22, 49, 28),
];
