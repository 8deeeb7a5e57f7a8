//! Data Matrix ECC200 encoder for synthetic symbols (ASCII encodation only)
use crate::decoder::interpret::{PAD, UPPER_SHIFT};
use crate::decoder::placement::PlacementLayout;
use crate::decoder::reed_solomon::generate_ecc;
use crate::models::{BitMatrix, SymbolSize};

/// Text that cannot be put into a symbol
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
    /// Character outside Latin-1
    #[error("character {0:?} cannot be encoded")]
    Unencodable(char),

    /// Encoded text is longer than the symbol's data capacity
    #[error("needs {needed} data codewords, symbol holds {capacity}")]
    TooLong {
        /// Codewords the text needs
        needed: usize,
        /// Data codewords of the symbol
        capacity: usize,
    },
}

/// ASCII encodation: digit pairs packed, Latin-1 through Upper Shift
pub fn encode_ascii(text: &str) -> Result<Vec<u8>, EncodeError> {
    let chars: Vec<char> = text.chars().collect();
    let mut codewords = Vec::with_capacity(chars.len());
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if let (Some(d1), Some(d2)) = (
            c.to_digit(10),
            chars.get(i + 1).and_then(|n| n.to_digit(10)),
        ) {
            codewords.push(130 + (d1 * 10 + d2) as u8);
            i += 2;
            continue;
        }

        match c as u32 {
            0..=127 => codewords.push(c as u8 + 1),
            128..=255 => {
                codewords.push(UPPER_SHIFT);
                codewords.push((c as u32 - 128 + 1) as u8);
            }
            _ => return Err(EncodeError::Unencodable(c)),
        }
        i += 1;
    }

    Ok(codewords)
}

/// Fill up to `capacity` with the end-of-message pad and randomized pads
pub fn pad(mut codewords: Vec<u8>, capacity: usize) -> Vec<u8> {
    if codewords.len() < capacity {
        codewords.push(PAD);
    }
    while codewords.len() < capacity {
        // 1-based position of this pad in the data stream
        let position = codewords.len() + 1;
        let pseudo_random = (149 * position) % 253 + 1;
        let mut value = PAD as usize + pseudo_random;
        if value > 254 {
            value -= 254;
        }
        codewords.push(value as u8);
    }
    codewords
}

/// Data plus redundancy codewords for `text` in `size`
pub fn encode_codewords(text: &str, size: SymbolSize) -> Result<Vec<u8>, EncodeError> {
    let data = encode_ascii(text)?;
    if data.len() > size.data_codewords() {
        return Err(EncodeError::TooLong {
            needed: data.len(),
            capacity: size.data_codewords(),
        });
    }
    let mut codewords = pad(data, size.data_codewords());
    let ecc = generate_ecc(&codewords, size.ecc_codewords());
    codewords.extend(ecc);
    Ok(codewords)
}

/// Lay codewords into a mapping matrix, with the fixed filler where
/// the placement leaves the bottom-right corner unused
pub fn place_codewords(codewords: &[u8], size: SymbolSize) -> BitMatrix {
    let (nrow, ncol) = (size.mapping_rows(), size.mapping_cols());
    let layout = PlacementLayout::new(nrow, ncol);
    let mut mapping = BitMatrix::new(ncol, nrow);

    for (modules, &value) in layout.codewords.iter().zip(codewords) {
        for (bit, &(row, col)) in modules.iter().enumerate() {
            mapping.set(col, row, (value >> (7 - bit)) & 1 == 1);
        }
    }

    if !layout.mask.is_read(nrow - 1, ncol - 1) {
        mapping.set(ncol - 1, nrow - 1, true);
        mapping.set(ncol - 2, nrow - 2, true);
    }

    mapping
}

/// Wrap a mapping matrix in per-region finder and timing patterns
pub fn add_finder_patterns(mapping: &BitMatrix, size: SymbolSize) -> BitMatrix {
    let (rr, rc) = (size.region_rows(), size.region_cols());
    let (rh, rw) = (rr + 2, rc + 2);
    let mut symbol = BitMatrix::new(size.cols(), size.rows());

    for gy in 0..size.regions_vertical() {
        for gx in 0..size.regions_horizontal() {
            let (ox, oy) = (gx * rw, gy * rh);
            for y in 0..rh {
                symbol.set(ox, oy + y, true);
                symbol.set(ox + rw - 1, oy + y, (rh - 1 - y) % 2 == 0);
            }
            for x in 0..rw {
                symbol.set(ox + x, oy + rh - 1, true);
                symbol.set(ox + x, oy, x % 2 == 0);
            }
            for y in 0..rr {
                for x in 0..rc {
                    let bit = mapping.get(gx * rc + x, gy * rr + y);
                    symbol.set(ox + 1 + x, oy + 1 + y, bit);
                }
            }
        }
    }

    symbol
}

/// Mapping matrix for `text`
pub fn encode_mapping(text: &str, size: SymbolSize) -> Result<BitMatrix, EncodeError> {
    Ok(place_codewords(&encode_codewords(text, size)?, size))
}

/// Complete printable symbol for `text`
pub fn encode_symbol(text: &str, size: SymbolSize) -> Result<BitMatrix, EncodeError> {
    Ok(add_finder_patterns(&encode_mapping(text, size)?, size))
}
