//! Module grid sampling, orientation and alignment-pattern removal

use crate::models::{BitMatrix, Bounds, Frame, SymbolSize};
use crate::utils::geometry::PerspectiveTransform;

/// Sample a `cols` x `rows` module grid from the image quad of `bounds`
///
/// A module is dark when its centre pixel is below `threshold`.
pub fn sample_grid(
    frame: &Frame,
    bounds: &Bounds,
    cols: usize,
    rows: usize,
    threshold: u8,
) -> Option<BitMatrix> {
    let transform = PerspectiveTransform::module_grid(cols, rows, &bounds.corners())?;
    let mut grid = BitMatrix::new(cols, rows);

    for row in 0..rows {
        for col in 0..cols {
            let p = transform.module_center(col, row);
            if p.x < 0.0 || p.y < 0.0 {
                continue;
            }
            let dark = frame.intensity(p.x as usize, p.y as usize) < threshold;
            grid.set(col, row, dark);
        }
    }

    Some(grid)
}

/// Fraction of the outer border that matches the finder and timing patterns:
/// solid left column and bottom row, alternating top row and right column
/// with the dark modules at the finder corner ends.
pub fn finder_score(grid: &BitMatrix) -> f32 {
    let (w, h) = (grid.width(), grid.height());
    if w < 2 || h < 2 {
        return 0.0;
    }

    let mut matched = 0usize;
    let mut total = 0usize;
    let mut check = |x: usize, y: usize, expected: bool| {
        total += 1;
        if grid.get(x, y) == expected {
            matched += 1;
        }
    };

    for y in 0..h {
        check(0, y, true);
    }
    for x in 1..w {
        check(x, h - 1, true);
    }
    for x in 1..w {
        check(x, 0, x % 2 == 0);
    }
    for y in 1..h - 1 {
        check(w - 1, y, (h - 1 - y) % 2 == 0);
    }

    matched as f32 / total as f32
}

/// Rotate a sampled grid until the finder sits bottom-left
///
/// Returns the upright grid and its score, or `None` when no rotation
/// yields a `size`-shaped grid scoring at least `min_score`.
pub fn orient(grid: &BitMatrix, size: SymbolSize, min_score: f32) -> Option<(BitMatrix, f32)> {
    let mut best: Option<(BitMatrix, f32)> = None;
    let mut candidate = grid.clone();

    for _ in 0..4 {
        if candidate.width() == size.cols() && candidate.height() == size.rows() {
            let score = finder_score(&candidate);
            if score >= min_score && best.as_ref().is_none_or(|(_, s)| score > *s) {
                best = Some((candidate.clone(), score));
            }
        }
        candidate = candidate.rotated_cw();
    }

    best
}

/// Drop finder, timing and alignment patterns, joining the data regions
/// into the mapping matrix
pub fn strip_alignment(symbol: &BitMatrix, size: SymbolSize) -> BitMatrix {
    let (rr, rc) = (size.region_rows(), size.region_cols());
    let mut mapping = BitMatrix::new(size.mapping_cols(), size.mapping_rows());

    for row in 0..size.mapping_rows() {
        let sy = (row / rr) * (rr + 2) + 1 + row % rr;
        for col in 0..size.mapping_cols() {
            let sx = (col / rc) * (rc + 2) + 1 + col % rc;
            mapping.set(col, row, symbol.get(sx, sy));
        }
    }

    mapping
}
