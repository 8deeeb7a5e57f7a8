//! Codeword placement for ECC200 mapping matrices
//!
//! Codewords are laid out in diagonal zig-zag sweeps of the 8-module "utah"
//! shape. Sweeps that run off an edge wrap with the alignment-offset rule, and
//! four irregular corner shapes fill the gaps the sweeps cannot reach. The
//! same traversal drives extraction here and placement in the synthetic
//! encoder, so both always agree on module order.

use crate::models::BitMatrix;

/// Module offsets of the utah shape relative to its anchor, MSB first
const UTAH: [(isize, isize); 8] = [
    (-2, -2),
    (-2, -1),
    (-1, -2),
    (-1, -1),
    (-1, 0),
    (0, -2),
    (0, -1),
    (0, 0),
];

/// One irregular corner shape: when the sweep position matches `trigger`,
/// the codeword is read from `modules` instead of a utah shape.
struct CornerCase {
    trigger: fn(row: isize, col: isize, nrow: isize, ncol: isize) -> bool,
    modules: fn(nrow: isize, ncol: isize) -> [(isize, isize); 8],
}

const CORNER_CASES: [CornerCase; 4] = [
    CornerCase {
        trigger: |row, col, nrow, _| row == nrow && col == 0,
        modules: |nrow, ncol| {
            [
                (nrow - 1, 0),
                (nrow - 1, 1),
                (nrow - 1, 2),
                (0, ncol - 2),
                (0, ncol - 1),
                (1, ncol - 1),
                (2, ncol - 1),
                (3, ncol - 1),
            ]
        },
    },
    CornerCase {
        trigger: |row, col, nrow, ncol| row == nrow - 2 && col == 0 && ncol % 4 != 0,
        modules: |nrow, ncol| {
            [
                (nrow - 3, 0),
                (nrow - 2, 0),
                (nrow - 1, 0),
                (0, ncol - 4),
                (0, ncol - 3),
                (0, ncol - 2),
                (0, ncol - 1),
                (1, ncol - 1),
            ]
        },
    },
    CornerCase {
        trigger: |row, col, nrow, ncol| row == nrow - 2 && col == 0 && ncol % 8 == 4,
        modules: |nrow, ncol| {
            [
                (nrow - 3, 0),
                (nrow - 2, 0),
                (nrow - 1, 0),
                (0, ncol - 2),
                (0, ncol - 1),
                (1, ncol - 1),
                (2, ncol - 1),
                (3, ncol - 1),
            ]
        },
    },
    CornerCase {
        trigger: |row, col, nrow, ncol| row == nrow + 4 && col == 2 && ncol % 8 == 0,
        modules: |nrow, ncol| {
            [
                (nrow - 1, 0),
                (nrow - 1, ncol - 1),
                (0, ncol - 3),
                (0, ncol - 2),
                (0, ncol - 1),
                (1, ncol - 3),
                (1, ncol - 2),
                (1, ncol - 1),
            ]
        },
    },
];

/// Per-module read counts for one traversal
#[derive(Debug, Clone)]
pub struct ReadMask {
    rows: usize,
    cols: usize,
    counts: Vec<u8>,
}

impl ReadMask {
    fn new(rows: usize, cols: usize) -> Self {
        Self {
            rows,
            cols,
            counts: vec![0; rows * cols],
        }
    }

    /// Times module (row, col) was read
    pub fn count(&self, row: usize, col: usize) -> u8 {
        if row >= self.rows || col >= self.cols {
            return 0;
        }
        self.counts[row * self.cols + col]
    }

    /// Whether module (row, col) has been read
    pub fn is_read(&self, row: usize, col: usize) -> bool {
        self.count(row, col) > 0
    }

    /// Modules never read, row-major
    pub fn unread(&self) -> Vec<(usize, usize)> {
        (0..self.rows)
            .flat_map(|r| (0..self.cols).map(move |c| (r, c)))
            .filter(|&(r, c)| !self.is_read(r, c))
            .collect()
    }

    fn is_read_signed(&self, row: isize, col: isize) -> bool {
        if row < 0 || col < 0 {
            return true;
        }
        let (row, col) = (row as usize, col as usize);
        row >= self.rows || col >= self.cols || self.is_read(row, col)
    }

    fn mark(&mut self, row: usize, col: usize) {
        if row < self.rows && col < self.cols {
            let idx = row * self.cols + col;
            self.counts[idx] = self.counts[idx].saturating_add(1);
        }
    }
}

/// Module positions of every codeword for one mapping matrix size
#[derive(Debug, Clone)]
pub struct PlacementLayout {
    /// `(row, col)` of each codeword's 8 modules, MSB first
    pub codewords: Vec<[(usize, usize); 8]>,
    /// Read counts after the full traversal
    pub mask: ReadMask,
    /// Corner cases (1-4) in the order they fired
    pub corners_fired: Vec<usize>,
}

impl PlacementLayout {
    /// Walk the placement order for an `nrow` x `ncol` mapping matrix
    pub fn new(nrow: usize, ncol: usize) -> Self {
        let mut layout = Self {
            codewords: Vec::with_capacity(nrow * ncol / 8),
            mask: ReadMask::new(nrow, ncol),
            corners_fired: Vec::new(),
        };
        if nrow == 0 || ncol == 0 {
            return layout;
        }

        let (nr, nc) = (nrow as isize, ncol as isize);
        let mut fired = [false; 4];
        let mut row: isize = 4;
        let mut col: isize = 0;

        loop {
            for (k, corner) in CORNER_CASES.iter().enumerate() {
                if !fired[k] && (corner.trigger)(row, col, nr, nc) {
                    fired[k] = true;
                    layout.corners_fired.push(k + 1);
                    layout.place((corner.modules)(nr, nc), nr, nc);
                }
            }

            // Sweep up and to the right
            loop {
                if row < nr && col >= 0 && !layout.mask.is_read_signed(row, col) {
                    layout.place(UTAH.map(|(dr, dc)| (row + dr, col + dc)), nr, nc);
                }
                row -= 2;
                col += 2;
                if !(row >= 0 && col < nc) {
                    break;
                }
            }
            row += 1;
            col += 3;

            // Sweep down and to the left
            loop {
                if row >= 0 && col < nc && !layout.mask.is_read_signed(row, col) {
                    layout.place(UTAH.map(|(dr, dc)| (row + dr, col + dc)), nr, nc);
                }
                row += 2;
                col -= 2;
                if !(row < nr && col >= 0) {
                    break;
                }
            }
            row += 3;
            col += 1;

            if !(row < nr || col < nc) {
                break;
            }
        }

        layout
    }

    fn place(&mut self, modules: [(isize, isize); 8], nrow: isize, ncol: isize) {
        let positions = modules.map(|(r, c)| wrap(r, c, nrow, ncol));
        for &(r, c) in &positions {
            self.mask.mark(r, c);
        }
        self.codewords.push(positions);
    }
}

/// Bring an out-of-range module back inside the matrix.
///
/// Wrapping shifts the other axis by the distance to the nearest alignment
/// line, so plain modulo is wrong for dimensions that are not multiples of 8.
fn wrap(mut row: isize, mut col: isize, nrow: isize, ncol: isize) -> (usize, usize) {
    if row < 0 {
        row += nrow;
        col += 4 - ((nrow + 4) % 8);
    }
    if col < 0 {
        col += ncol;
        row += 4 - ((ncol + 4) % 8);
    }
    (row.max(0) as usize, col.max(0) as usize)
}

/// Codewords plus the traversal diagnostics
#[derive(Debug, Clone)]
pub struct Extraction {
    /// Codewords in placement order
    pub codewords: Vec<u8>,
    /// Module read counts
    pub mask: ReadMask,
    /// Corner cases that fired
    pub corners_fired: Vec<usize>,
}

/// Read the ordered codeword sequence out of a mapping matrix
pub fn extract_codewords(bits: &BitMatrix) -> Vec<u8> {
    extract_codewords_with_mask(bits).codewords
}

/// Like [`extract_codewords`] but keeps the read mask and corner record
pub fn extract_codewords_with_mask(bits: &BitMatrix) -> Extraction {
    let layout = PlacementLayout::new(bits.height(), bits.width());
    let codewords = layout
        .codewords
        .iter()
        .map(|modules| {
            modules
                .iter()
                .fold(0u8, |byte, &(row, col)| (byte << 1) | bits.get(col, row) as u8)
        })
        .collect();

    Extraction {
        codewords,
        mask: layout.mask,
        corners_fired: layout.corners_fired,
    }
}
