/// Compact bit matrix for storing binary data
///
/// Used both for binarized images (one bit per pixel) and for sampled
/// Data Matrix module grids (`true` = dark module). Rows are `height`,
/// columns are `width`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitMatrix {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

impl BitMatrix {
    /// Create a new bit matrix with given dimensions
    pub fn new(width: usize, height: usize) -> Self {
        let bytes_needed = (width * height).div_ceil(8);
        Self {
            width,
            height,
            data: vec![0; bytes_needed],
        }
    }

    /// Build a matrix from rows of `'0'`/`'1'` (or `'.'`/`'#'`) characters.
    ///
    /// Returns `None` if the rows are ragged or contain other characters.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Option<Self> {
        let height = rows.len();
        let width = rows.first().map(|r| r.as_ref().len()).unwrap_or(0);
        let mut matrix = Self::new(width, height);
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != width {
                return None;
            }
            for (x, ch) in row.chars().enumerate() {
                match ch {
                    '1' | '#' => matrix.set(x, y, true),
                    '0' | '.' => {}
                    _ => return None,
                }
            }
        }
        Some(matrix)
    }

    /// Get matrix width (columns)
    pub fn width(&self) -> usize {
        self.width
    }

    /// Get matrix height (rows)
    pub fn height(&self) -> usize {
        self.height
    }

    /// Get bit at (x, y)
    pub fn get(&self, x: usize, y: usize) -> bool {
        if x >= self.width || y >= self.height {
            return false;
        }
        let index = y * self.width + x;
        let byte_index = index / 8;
        let bit_index = index % 8;
        (self.data[byte_index] >> bit_index) & 1 == 1
    }

    /// Set bit at (x, y)
    pub fn set(&mut self, x: usize, y: usize, value: bool) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        let byte_index = index / 8;
        let bit_index = index % 8;
        if value {
            self.data[byte_index] |= 1 << bit_index;
        } else {
            self.data[byte_index] &= !(1 << bit_index);
        }
    }

    /// Toggle bit at (x, y)
    pub fn toggle(&mut self, x: usize, y: usize) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = y * self.width + x;
        self.data[index / 8] ^= 1 << (index % 8);
    }

    /// Copy rotated a quarter turn clockwise (width and height swap)
    pub fn rotated_cw(&self) -> Self {
        let mut out = Self::new(self.height, self.width);
        for y in 0..self.height {
            for x in 0..self.width {
                if self.get(x, y) {
                    out.set(self.height - 1 - y, x, true);
                }
            }
        }
        out
    }

    /// Count of set bits
    pub fn count_ones(&self) -> usize {
        (0..self.height)
            .map(|y| (0..self.width).filter(|&x| self.get(x, y)).count())
            .sum()
    }

    /// Render as rows of `'0'`/`'1'`, the inverse of [`BitMatrix::from_rows`]
    pub fn to_rows(&self) -> Vec<String> {
        (0..self.height)
            .map(|y| {
                (0..self.width)
                    .map(|x| if self.get(x, y) { '1' } else { '0' })
                    .collect()
            })
            .collect()
    }
}

impl Default for BitMatrix {
    fn default() -> Self {
        Self::new(0, 0)
    }
}
