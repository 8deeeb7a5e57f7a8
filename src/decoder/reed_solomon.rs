//! Reed-Solomon error correction for Data Matrix symbols
//! ECC200 uses RS over GF(256) with primitive polynomial x^8 + x^5 + x^3 + x^2 + 1
//! and generator roots alpha^1 .. alpha^n

use crate::error::UncorrectableError;
use crate::models::SymbolSize;

/// GF(256) field operations using log/exp tables
pub struct Gf256;

static LOG_TABLE: [u8; 256] = [
    0, 0, 1, 240, 2, 225, 241, 53, 3, 38, 226, 133, 242, 43, 54, 210, 4, 195, 39, 114, 227, 106,
    134, 28, 243, 140, 44, 23, 55, 118, 211, 234, 5, 219, 196, 96, 40, 222, 115, 103, 228, 78, 107,
    125, 135, 8, 29, 162, 244, 186, 141, 180, 45, 99, 24, 49, 56, 13, 119, 153, 212, 199, 235, 91,
    6, 76, 220, 217, 197, 11, 97, 184, 41, 36, 223, 253, 116, 138, 104, 193, 229, 86, 79, 171, 108,
    165, 126, 145, 136, 34, 9, 74, 30, 32, 163, 84, 245, 173, 187, 204, 142, 81, 181, 190, 46, 88,
    100, 159, 25, 231, 50, 207, 57, 147, 14, 67, 120, 128, 154, 248, 213, 167, 200, 63, 236, 110,
    92, 176, 7, 161, 77, 124, 221, 102, 218, 95, 198, 90, 12, 152, 98, 48, 185, 179, 42, 209, 37,
    132, 224, 52, 254, 239, 117, 233, 139, 22, 105, 27, 194, 113, 230, 206, 87, 158, 80, 189, 172,
    203, 109, 175, 166, 62, 127, 247, 146, 66, 137, 192, 35, 252, 10, 183, 75, 216, 31, 83, 33, 73,
    164, 144, 85, 170, 246, 65, 174, 61, 188, 202, 205, 157, 143, 169, 82, 72, 182, 215, 191, 251,
    47, 178, 89, 151, 101, 94, 160, 123, 26, 112, 232, 21, 51, 238, 208, 131, 58, 69, 148, 18, 15,
    16, 68, 17, 121, 149, 129, 19, 155, 59, 249, 70, 214, 250, 168, 71, 201, 156, 64, 60, 237, 130,
    111, 20, 93, 122, 177, 150,
];

static EXP_TABLE: [u8; 256] = [
    1, 2, 4, 8, 16, 32, 64, 128, 45, 90, 180, 69, 138, 57, 114, 228, 229, 231, 227, 235, 251, 219,
    155, 27, 54, 108, 216, 157, 23, 46, 92, 184, 93, 186, 89, 178, 73, 146, 9, 18, 36, 72, 144, 13,
    26, 52, 104, 208, 141, 55, 110, 220, 149, 7, 14, 28, 56, 112, 224, 237, 247, 195, 171, 123,
    246, 193, 175, 115, 230, 225, 239, 243, 203, 187, 91, 182, 65, 130, 41, 82, 164, 101, 202, 185,
    95, 190, 81, 162, 105, 210, 137, 63, 126, 252, 213, 135, 35, 70, 140, 53, 106, 212, 133, 39,
    78, 156, 21, 42, 84, 168, 125, 250, 217, 159, 19, 38, 76, 152, 29, 58, 116, 232, 253, 215, 131,
    43, 86, 172, 117, 234, 249, 223, 147, 11, 22, 44, 88, 176, 77, 154, 25, 50, 100, 200, 189, 87,
    174, 113, 226, 233, 255, 211, 139, 59, 118, 236, 245, 199, 163, 107, 214, 129, 47, 94, 188, 85,
    170, 121, 242, 201, 191, 83, 166, 97, 194, 169, 127, 254, 209, 143, 51, 102, 204, 181, 71, 142,
    49, 98, 196, 165, 103, 206, 177, 79, 158, 17, 34, 68, 136, 61, 122, 244, 197, 167, 99, 198,
    161, 111, 222, 145, 15, 30, 60, 120, 240, 205, 183, 67, 134, 33, 66, 132, 37, 74, 148, 5, 10,
    20, 40, 80, 160, 109, 218, 153, 31, 62, 124, 248, 221, 151, 3, 6, 12, 24, 48, 96, 192, 173,
    119, 238, 241, 207, 179, 75, 150, 1,
];

impl Gf256 {
    /// `a * b`
    pub fn mul(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        EXP_TABLE[(log_a + log_b) % 255]
    }

    /// `a / b`; callers guarantee `b != 0` (division by zero yields 0)
    pub fn div(a: u8, b: u8) -> u8 {
        if a == 0 || b == 0 {
            return 0;
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let log_b = LOG_TABLE[b as usize] as usize;
        EXP_TABLE[(log_a + 255 - log_b) % 255]
    }

    /// alpha^n
    pub fn exp(n: usize) -> u8 {
        EXP_TABLE[n % 255]
    }

    /// `a^n`
    pub fn pow_usize(a: u8, n: usize) -> u8 {
        if a == 0 {
            return if n == 0 { 1 } else { 0 };
        }
        let log_a = LOG_TABLE[a as usize] as usize;
        let exp = (log_a * (n % 255)) % 255;
        EXP_TABLE[exp]
    }
}

/// Error-free data codewords recovered from one symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorrectedMessage {
    /// Data codewords, redundancy stripped
    pub data: Vec<u8>,
    /// Symbol errors that were corrected
    pub corrected_errors: usize,
}

/// Correct a full codeword sequence (data then redundancy) for `size`
pub fn correct(
    codewords: &[u8],
    size: SymbolSize,
) -> Result<CorrectedMessage, UncorrectableError> {
    if codewords.len() != size.total_codewords() {
        return Err(UncorrectableError::LengthMismatch {
            expected: size.total_codewords(),
            actual: codewords.len(),
        });
    }

    let mut received = codewords.to_vec();
    let corrected_errors = ReedSolomonDecoder::new(size.ecc_codewords()).decode(&mut received)?;
    received.truncate(size.data_codewords());
    Ok(CorrectedMessage {
        data: received,
        corrected_errors,
    })
}

/// Compute the `num_ecc` redundancy codewords for `data`
pub fn generate_ecc(data: &[u8], num_ecc: usize) -> Vec<u8> {
    if num_ecc == 0 {
        return Vec::new();
    }

    // Generator g(x) = prod (x - alpha^i), i = 1..=num_ecc, ascending coefficients
    let mut gpoly = vec![1u8];
    for i in 1..=num_ecc {
        let root = Gf256::exp(i);
        let mut next = vec![0u8; gpoly.len() + 1];
        for (j, &coeff) in gpoly.iter().enumerate() {
            next[j + 1] ^= coeff;
            next[j] ^= Gf256::mul(coeff, root);
        }
        gpoly = next;
    }
    // Descending order without the leading 1
    let divisor: Vec<u8> = gpoly.iter().rev().skip(1).copied().collect();

    let mut remainder = vec![0u8; num_ecc];
    for &d in data {
        let factor = d ^ remainder[0];
        remainder.rotate_left(1);
        remainder[num_ecc - 1] = 0;
        for (r, &g) in remainder.iter_mut().zip(&divisor) {
            *r ^= Gf256::mul(g, factor);
        }
    }
    remainder
}

/// Reed-Solomon decoder for Data Matrix codeword blocks
pub struct ReedSolomonDecoder {
    num_ecc_codewords: usize,
}

impl ReedSolomonDecoder {
    /// Decoder for blocks carrying `num_ecc_codewords` redundancy codewords
    pub fn new(num_ecc_codewords: usize) -> Self {
        Self { num_ecc_codewords }
    }

    /// Correct `received` in place; returns the number of symbol errors fixed
    pub fn decode(&self, received: &mut [u8]) -> Result<usize, UncorrectableError> {
        let capacity = self.num_ecc_codewords / 2;
        let exceeded = UncorrectableError::CapacityExceeded { capacity };

        if received.len() > 255 || received.len() <= self.num_ecc_codewords {
            return Err(exceeded);
        }

        let syndrome = self.calculate_syndrome(received);
        if syndrome.iter().all(|&s| s == 0) {
            return Ok(0);
        }

        // Berlekamp-Massey
        let sigma = self.find_error_locator(&syndrome);
        let num_errors = sigma.len() - 1;
        if num_errors == 0 || num_errors > capacity {
            return Err(exceeded);
        }

        // Chien search
        let positions = self.find_error_positions(&sigma, received.len());
        if positions.len() != num_errors {
            return Err(exceeded);
        }

        // Forney
        let values = self
            .find_error_values(&sigma, &syndrome, &positions, received.len())
            .ok_or(exceeded.clone())?;

        for (&pos, &value) in positions.iter().zip(&values) {
            received[pos] ^= value;
        }

        // Verify syndrome is now zero
        if self.calculate_syndrome(received).iter().any(|&s| s != 0) {
            return Err(exceeded);
        }

        Ok(num_errors)
    }

    /// S_i = r(alpha^i) for i = 1..=n; r[0] is the coefficient of x^(len-1)
    fn calculate_syndrome(&self, received: &[u8]) -> Vec<u8> {
        let n = received.len();
        (1..=self.num_ecc_codewords)
            .map(|i| {
                received.iter().enumerate().fold(0u8, |sum, (j, &r)| {
                    sum ^ Gf256::mul(r, Gf256::exp(i * (n - 1 - j)))
                })
            })
            .collect()
    }

    /// Error locator polynomial, ascending coefficients, trailing zeros trimmed
    fn find_error_locator(&self, syndrome: &[u8]) -> Vec<u8> {
        let mut sigma = vec![1u8];
        let mut b = vec![1u8];
        let mut delta_b: u8 = 1;
        let mut l = 0usize;
        let mut m = 1usize;

        for i in 0..syndrome.len() {
            let mut delta = syndrome[i];
            for j in 1..=l.min(sigma.len() - 1) {
                delta ^= Gf256::mul(sigma[j], syndrome[i - j]);
            }

            if delta == 0 {
                m += 1;
                continue;
            }

            let previous = sigma.clone();
            let d = Gf256::div(delta, delta_b);
            if sigma.len() < b.len() + m {
                sigma.resize(b.len() + m, 0);
            }
            // sigma = sigma - d * x^m * b
            for (j, &bj) in b.iter().enumerate() {
                sigma[j + m] ^= Gf256::mul(d, bj);
            }

            if 2 * l <= i {
                b = previous;
                delta_b = delta;
                l = i + 1 - l;
                m = 1;
            } else {
                m += 1;
            }
        }

        while sigma.len() > 1 && sigma[sigma.len() - 1] == 0 {
            sigma.pop();
        }
        sigma
    }

    /// Root of sigma for position `pos`: X^-1 with X = alpha^(n-1-pos)
    fn locator_inverse(pos: usize, n: usize) -> u8 {
        let exp = (n - 1 - pos) % 255;
        Gf256::exp(255 - exp)
    }

    fn evaluate(poly: &[u8], x: u8) -> u8 {
        poly.iter()
            .enumerate()
            .fold(0u8, |sum, (i, &c)| sum ^ Gf256::mul(c, Gf256::pow_usize(x, i)))
    }

    fn find_error_positions(&self, sigma: &[u8], n: usize) -> Vec<usize> {
        (0..n)
            .filter(|&pos| Self::evaluate(sigma, Self::locator_inverse(pos, n)) == 0)
            .collect()
    }

    fn find_error_values(
        &self,
        sigma: &[u8],
        syndrome: &[u8],
        error_positions: &[usize],
        n: usize,
    ) -> Option<Vec<u8>> {
        // omega = syndrome * sigma mod x^(2t)
        let mut omega = vec![0u8; syndrome.len()];
        for (i, o) in omega.iter_mut().enumerate() {
            for j in 0..=i.min(sigma.len() - 1) {
                *o ^= Gf256::mul(sigma[j], syndrome[i - j]);
            }
        }

        error_positions
            .iter()
            .map(|&pos| {
                let x_inv = Self::locator_inverse(pos, n);
                let omega_val = Self::evaluate(&omega, x_inv);

                // sigma'(x) = sum_{odd i} sigma[i] * x^(i-1)
                let sigma_prime_val = sigma
                    .iter()
                    .enumerate()
                    .skip(1)
                    .step_by(2)
                    .fold(0u8, |sum, (i, &c)| {
                        sum ^ Gf256::mul(c, Gf256::pow_usize(x_inv, i - 1))
                    });

                if sigma_prime_val == 0 {
                    return None;
                }
                // First consecutive root is alpha^1, so no X_k factor
                Some(Gf256::div(omega_val, sigma_prime_val))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(data: &[u8], num_ecc: usize) -> Vec<u8> {
        let mut codeword = data.to_vec();
        codeword.extend(generate_ecc(data, num_ecc));
        codeword
    }

    #[test]
    fn test_gf256_basic() {
        assert_eq!(Gf256::mul(0, 5), 0);
        assert_eq!(Gf256::div(7, 7), 1);
        assert_eq!(Gf256::div(123, 123), 1);
        // alpha^8 reduces by 0x12D
        assert_eq!(Gf256::exp(8), 45);
        assert_eq!(Gf256::mul(128, 2), 45);
        assert_eq!(Gf256::pow_usize(2, 255), 1);
        assert_eq!(Gf256::pow_usize(2, 260), Gf256::exp(5));
    }

    #[test]
    fn test_ecc_matches_iso_example() {
        // ISO/IEC 16022 Annex O: "123456" in a 10x10 symbol
        assert_eq!(generate_ecc(&[142, 164, 186], 5), vec![114, 25, 5, 88, 102]);
    }

    #[test]
    fn test_clean_symbol_passes() {
        let mut codeword = encode(&[85, 102, 116, 117, 129], 7);
        let decoder = ReedSolomonDecoder::new(7);
        assert_eq!(decoder.decode(&mut codeword), Ok(0));
        assert_eq!(&codeword[..5], &[85, 102, 116, 117, 129]);
    }

    #[test]
    fn test_correct_up_to_capacity() {
        let data = [69, 71, 145, 49, 70, 134, 173, 129];
        let clean = encode(&data, 10);

        let mut received = clean.clone();
        for (pos, flip) in [(0usize, 0xFFu8), (3, 0x42), (8, 0x13), (12, 0x80), (17, 0x01)] {
            received[pos] ^= flip;
        }
        let decoder = ReedSolomonDecoder::new(10);
        assert_eq!(decoder.decode(&mut received), Ok(5));
        assert_eq!(received, clean);
    }

    #[test]
    fn test_fail_one_past_capacity() {
        // Odd redundancy: t + 1 errors can never land within t of another codeword
        let data = [85, 102, 116, 117, 129];
        let clean = encode(&data, 7);
        let decoder = ReedSolomonDecoder::new(7);

        let mut at_capacity = clean.clone();
        for pos in [1usize, 6, 11] {
            at_capacity[pos] ^= 0x5A;
        }
        assert_eq!(decoder.decode(&mut at_capacity), Ok(3));
        assert_eq!(at_capacity, clean);

        let mut over = clean.clone();
        for pos in [1usize, 4, 6, 11] {
            over[pos] ^= 0x5A;
        }
        assert_eq!(
            decoder.decode(&mut over),
            Err(UncorrectableError::CapacityExceeded { capacity: 3 })
        );
    }

    #[test]
    fn test_correct_errors_in_redundancy() {
        let data = [1, 2, 3, 4, 5];
        let clean = encode(&data, 8);
        let total = clean.len();
        let mut received = clean.clone();
        received[total - 1] ^= 0xFF;
        received[total - 2] ^= 0x33;
        assert_eq!(ReedSolomonDecoder::new(8).decode(&mut received), Ok(2));
        assert_eq!(received, clean);
    }

    #[test]
    fn test_correct_strips_redundancy() {
        let size = SymbolSize::from_symbol(12, 12).unwrap();
        let mut codewords = encode(&[85, 102, 116, 117, 129], 7);
        codewords[2] ^= 0x10;
        let message = correct(&codewords, size).unwrap();
        assert_eq!(message.data, vec![85, 102, 116, 117, 129]);
        assert_eq!(message.corrected_errors, 1);
    }

    #[test]
    fn test_correct_rejects_wrong_length() {
        let size = SymbolSize::from_symbol(12, 12).unwrap();
        assert_eq!(
            correct(&[0u8; 11], size),
            Err(UncorrectableError::LengthMismatch {
                expected: 12,
                actual: 11
            })
        );
    }
}
