//! Perspective mapping between module space and image space

use crate::models::Point;

/// Perspective transformation matrix (3x3, `a33` fixed to 1)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveTransform {
    a11: f32,
    a12: f32,
    a13: f32,
    a21: f32,
    a22: f32,
    a23: f32,
    a31: f32,
    a32: f32,
}

impl PerspectiveTransform {
    /// Create transform from 4 source points to 4 destination points
    pub fn from_points(src: &[Point; 4], dst: &[Point; 4]) -> Option<Self> {
        // Direct linear transform: two equations per correspondence
        let mut a = [[0.0f32; 8]; 8];
        let mut b = [0.0f32; 8];

        for (i, (s, d)) in src.iter().zip(dst).enumerate() {
            let row = i * 2;
            a[row] = [s.x, s.y, 1.0, 0.0, 0.0, 0.0, -d.x * s.x, -d.x * s.y];
            b[row] = d.x;
            a[row + 1] = [0.0, 0.0, 0.0, s.x, s.y, 1.0, -d.y * s.x, -d.y * s.y];
            b[row + 1] = d.y;
        }

        solve_linear_system(a, b).map(|h| Self {
            a11: h[0],
            a12: h[1],
            a13: h[2],
            a21: h[3],
            a22: h[4],
            a23: h[5],
            a31: h[6],
            a32: h[7],
        })
    }

    /// Map a `cols` x `rows` module grid onto an image quadrilateral
    /// (corners clockwise from top-left)
    pub fn module_grid(cols: usize, rows: usize, quad: &[Point; 4]) -> Option<Self> {
        let (w, h) = (cols as f32, rows as f32);
        let src = [
            Point::new(0.0, 0.0),
            Point::new(w, 0.0),
            Point::new(w, h),
            Point::new(0.0, h),
        ];
        Self::from_points(&src, quad)
    }

    /// Transform a point using this perspective matrix
    pub fn transform(&self, p: &Point) -> Point {
        let denominator = self.a31 * p.x + self.a32 * p.y + 1.0;
        if denominator.abs() < 1e-10 {
            return Point::new(0.0, 0.0);
        }

        Point::new(
            (self.a11 * p.x + self.a12 * p.y + self.a13) / denominator,
            (self.a21 * p.x + self.a22 * p.y + self.a23) / denominator,
        )
    }

    /// Image position of the centre of module (col, row)
    pub fn module_center(&self, col: usize, row: usize) -> Point {
        self.transform(&Point::new(col as f32 + 0.5, row as f32 + 0.5))
    }
}

/// Solve 8x8 linear system using Gaussian elimination with partial pivoting
#[allow(clippy::needless_range_loop)]
fn solve_linear_system(mut a: [[f32; 8]; 8], mut b: [f32; 8]) -> Option<[f32; 8]> {
    let n = 8;

    for i in 0..n {
        let mut max_val = a[i][i].abs();
        let mut max_row = i;
        for k in (i + 1)..n {
            if a[k][i].abs() > max_val {
                max_val = a[k][i].abs();
                max_row = k;
            }
        }

        // Singular
        if max_val < 1e-10 {
            return None;
        }

        if max_row != i {
            a.swap(i, max_row);
            b.swap(i, max_row);
        }

        for k in (i + 1)..n {
            let factor = a[k][i] / a[i][i];
            b[k] -= factor * b[i];
            for j in i..n {
                a[k][j] -= factor * a[i][j];
            }
        }
    }

    let mut x = [0.0f32; 8];
    for i in (0..n).rev() {
        let mut sum = b[i];
        for j in (i + 1)..n {
            sum -= a[i][j] * x[j];
        }
        x[i] = sum / a[i][i];
    }

    Some(x)
}
