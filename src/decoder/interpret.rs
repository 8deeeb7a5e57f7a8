//! ASCII encodation interpreter for corrected Data Matrix data codewords

use crate::error::DecodeError;

/// End-of-message pad
pub const PAD: u8 = 129;
/// Upper Shift: next codeword maps to the 128-255 range
pub const UPPER_SHIFT: u8 = 235;

const ASCII_MAX: u8 = 128;
const DIGIT_PAIR_MIN: u8 = 130;
const DIGIT_PAIR_MAX: u8 = 229;

/// Turn data codewords into text
///
/// Decoding stops at the first pad; anything after it is ignored.
pub fn interpret(codewords: &[u8]) -> Result<String, DecodeError> {
    if codewords.is_empty() {
        return Err(DecodeError::PrematureEnd);
    }

    let mut text = String::with_capacity(codewords.len() * 2);
    let mut iter = codewords.iter().copied();

    while let Some(value) = iter.next() {
        match value {
            0 => return Err(DecodeError::InvalidCodeword(value)),
            1..=ASCII_MAX => text.push(char::from(value - 1)),
            PAD => break,
            DIGIT_PAIR_MIN..=DIGIT_PAIR_MAX => {
                let pair = value - DIGIT_PAIR_MIN;
                text.push(char::from(b'0' + pair / 10));
                text.push(char::from(b'0' + pair % 10));
            }
            UPPER_SHIFT => {
                let next = iter.next().ok_or(DecodeError::PrematureEnd)?;
                if !(1..=ASCII_MAX).contains(&next) {
                    return Err(DecodeError::InvalidCodeword(next));
                }
                // Latin-1 maps 1:1 onto U+0080..U+00FF
                text.push(char::from(next - 1 + 128));
            }
            _ => return Err(DecodeError::UnsupportedMode(value)),
        }
    }

    Ok(text)
}
