//! Data Matrix decoder - wires placement, correction and interpretation together

use crate::decoder::interpret::interpret;
use crate::decoder::placement::extract_codewords;
use crate::decoder::reed_solomon;
use crate::error::{DecodeFailure, DecodeStage, FailureReason};
use crate::models::{BitMatrix, SymbolSize};

/// Successful decode with the details the scanner logs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedSymbol {
    /// Decoded text
    pub text: String,
    /// Size class the mapping matrix matched
    pub size: SymbolSize,
    /// Symbol errors corrected by Reed-Solomon
    pub corrected_errors: usize,
}

/// Main Data Matrix decoder for a sampled mapping matrix
pub struct DataMatrixDecoder;

impl DataMatrixDecoder {
    /// Decode a mapping matrix into text
    pub fn decode(bits: &BitMatrix) -> Result<String, DecodeFailure> {
        Self::decode_detailed(bits).map(|symbol| symbol.text)
    }

    /// Decode, also reporting the size class and the correction count
    pub fn decode_detailed(bits: &BitMatrix) -> Result<DecodedSymbol, DecodeFailure> {
        let size = SymbolSize::from_mapping(bits.height(), bits.width()).ok_or_else(|| {
            DecodeFailure::new(
                DecodeStage::Placement,
                FailureReason::UnsupportedSize {
                    rows: bits.height(),
                    cols: bits.width(),
                },
            )
        })?;

        let codewords = extract_codewords(bits);

        let message = reed_solomon::correct(&codewords, size)
            .map_err(|e| DecodeFailure::new(DecodeStage::ErrorCorrection, e))?;

        let text = interpret(&message.data)
            .map_err(|e| DecodeFailure::new(DecodeStage::Interpretation, e))?;

        Ok(DecodedSymbol {
            text,
            size,
            corrected_errors: message.corrected_errors,
        })
    }
}

/// Decode a mapping matrix into text
pub fn decode(bits: &BitMatrix) -> Result<String, DecodeFailure> {
    DataMatrixDecoder::decode(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DecodeError, UncorrectableError};

    const TEST_12X12: [&str; 10] = [
        "0110011001",
        "1001010101",
        "1100000010",
        "0010011001",
        "1000110100",
        "0010110010",
        "1001100110",
        "0101100111",
        "0101011010",
        "1100111101",
    ];

    const DF150E0443_14X14: [&str; 12] = [
        "010011101100",
        "000010011000",
        "111000101000",
        "010110010111",
        "100000000101",
        "011000000111",
        "011101111101",
        "010111011000",
        "110100110010",
        "000010010011",
        "011000101001",
        "100011010001",
    ];

    #[test]
    fn test_decode_golden_symbols() {
        let bits = BitMatrix::from_rows(&TEST_12X12).unwrap();
        assert_eq!(decode(&bits).unwrap(), "Test");

        let bits = BitMatrix::from_rows(&DF150E0443_14X14).unwrap();
        let decoded = DataMatrixDecoder::decode_detailed(&bits).unwrap();
        assert_eq!(decoded.text, "DF150E0443");
        assert_eq!(decoded.size.rows(), 14);
        assert_eq!(decoded.corrected_errors, 0);
    }

    #[test]
    fn test_decode_is_pure() {
        let bits = BitMatrix::from_rows(&DF150E0443_14X14).unwrap();
        let first = decode(&bits);
        let second = decode(&bits);
        assert_eq!(first, second);
    }

    #[test]
    fn test_decode_corrects_damaged_modules() {
        let mut bits = BitMatrix::from_rows(&TEST_12X12).unwrap();
        // Three module flips in distinct codewords of a capacity-3 symbol
        bits.toggle(0, 0);
        bits.toggle(5, 4);
        bits.toggle(2, 9);
        let decoded = DataMatrixDecoder::decode_detailed(&bits).unwrap();
        assert_eq!(decoded.text, "Test");
        assert!(decoded.corrected_errors >= 1);
    }

    #[test]
    fn test_unsupported_size_fails_at_placement() {
        let bits = BitMatrix::new(9, 9);
        let failure = decode(&bits).unwrap_err();
        assert_eq!(failure.stage, DecodeStage::Placement);
        assert_eq!(
            failure.reason,
            FailureReason::UnsupportedSize { rows: 9, cols: 9 }
        );
    }

    #[test]
    fn test_blank_matrix_fails_at_interpretation() {
        // All-zero codewords are a valid RS codeword but codeword 0 is invalid
        let bits = BitMatrix::new(10, 10);
        let failure = decode(&bits).unwrap_err();
        assert_eq!(failure.stage, DecodeStage::Interpretation);
        assert_eq!(
            failure.reason,
            FailureReason::Malformed(DecodeError::InvalidCodeword(0))
        );
    }

    #[test]
    fn test_heavy_damage_fails_at_correction() {
        let mut bits = BitMatrix::from_rows(&TEST_12X12).unwrap();
        // Invert the first four rows: far beyond 3 correctable codewords
        for y in 0..4 {
            for x in 0..10 {
                bits.toggle(x, y);
            }
        }
        let failure = decode(&bits).unwrap_err();
        assert_eq!(failure.stage, DecodeStage::ErrorCorrection);
        assert!(matches!(
            failure.reason,
            FailureReason::Uncorrectable(UncorrectableError::CapacityExceeded { .. })
        ));
    }
}
