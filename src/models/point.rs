use serde::{Deserialize, Serialize};

/// 2D point with floating point coordinates
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate
    pub x: f32,
    /// Y coordinate
    pub y: f32,
}

impl Point {
    /// Create a new point
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Calculate distance to another point
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Translate point by (dx, dy)
    pub fn translate(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

/// Axis-aligned rectangle in image coordinates (inclusive min, exclusive max)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    /// Left edge
    pub min_x: f32,
    /// Top edge
    pub min_y: f32,
    /// Right edge
    pub max_x: f32,
    /// Bottom edge
    pub max_y: f32,
}

impl Bounds {
    /// Square of the given side centred on `center`
    pub fn centered(center: Point, side: f32) -> Self {
        let half = side / 2.0;
        Self {
            min_x: center.x - half,
            min_y: center.y - half,
            max_x: center.x + half,
            max_y: center.y + half,
        }
    }

    /// Width in pixels
    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    /// Height in pixels
    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// Centre point
    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    /// Corners in clockwise order starting top-left
    pub fn corners(&self) -> [Point; 4] {
        [
            Point::new(self.min_x, self.min_y),
            Point::new(self.max_x, self.min_y),
            Point::new(self.max_x, self.max_y),
            Point::new(self.min_x, self.max_y),
        ]
    }
}
