//! Geometry templates: where the holder and slot symbols sit on a puck
//!
//! Anchors are offsets from the puck centre in units of the puck radius,
//! with image orientation (x right, y down). A template fixes the slot
//! count N for every plate scanned with it.

use std::f32::consts::PI;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::decoder::tables::SIZE_14X14;
use crate::error::ConfigError;
use crate::models::{Point, SymbolSize};

/// Names of the built-in templates
pub const BUILTIN_TEMPLATES: [&str; 2] = ["unipuck", "holder"];

/// Layout of one kind of sample holder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeometryTemplate {
    /// Template name
    pub name: String,
    /// Size class of every symbol on the holder
    pub symbol: SymbolSize,
    /// Holder barcode anchor, if the holder carries one in this view
    #[serde(default)]
    pub holder: Option<Point>,
    /// Slot anchors in index order
    pub slots: Vec<Point>,
    /// Longer symbol side as a fraction of the puck radius
    pub symbol_span: f32,
    /// How long the top camera may take before the scan is abandoned
    #[serde(default = "default_top_scan_timeout_ms")]
    pub top_scan_timeout_ms: u64,
}

fn default_top_scan_timeout_ms() -> u64 {
    20_000
}

/// `count` anchors evenly spaced on a ring, the first straight up
fn ring(count: usize, radius: f32) -> impl Iterator<Item = Point> {
    (0..count).map(move |k| {
        let theta = -PI / 2.0 + 2.0 * PI * k as f32 / count as f32;
        Point::new(radius * theta.cos(), radius * theta.sin())
    })
}

impl GeometryTemplate {
    /// Look up a built-in template by name
    pub fn builtin(name: &str) -> Result<Self, ConfigError> {
        match name {
            "unipuck" => Ok(Self::unipuck()),
            "holder" => Ok(Self::holder()),
            other => Err(ConfigError::UnknownTemplate(other.to_string())),
        }
    }

    /// 16-pin puck seen from above: 5 inner and 11 outer pins, holder barcode
    /// in the middle
    pub fn unipuck() -> Self {
        Self {
            name: "unipuck".to_string(),
            symbol: SIZE_14X14,
            holder: Some(Point::new(0.0, 0.0)),
            slots: ring(5, 0.30).chain(ring(11, 0.68)).collect(),
            symbol_span: 0.16,
            top_scan_timeout_ms: default_top_scan_timeout_ms(),
        }
    }

    /// Holder seen from the side camera: a single barcode
    pub fn holder() -> Self {
        Self {
            name: "holder".to_string(),
            symbol: SIZE_14X14,
            holder: None,
            slots: vec![Point::new(0.0, 0.0)],
            symbol_span: 0.5,
            top_scan_timeout_ms: default_top_scan_timeout_ms(),
        }
    }

    /// Parse and validate a JSON template
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let template: Self = serde_json::from_str(json)?;
        template.validate()?;
        Ok(template)
    }

    /// Load a JSON template file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Built-in template by name, or a JSON file when `name` ends in `.json`
    pub fn resolve(name: &str) -> Result<Self, ConfigError> {
        if name.ends_with(".json") {
            Self::from_json_file(name)
        } else {
            Self::builtin(name)
        }
    }

    /// N
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Top camera deadline
    pub fn top_scan_timeout(&self) -> Duration {
        Duration::from_millis(self.top_scan_timeout_ms)
    }

    /// Check the template can describe a real holder
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |detail: &str| ConfigError::InvalidTemplate {
            name: self.name.clone(),
            detail: detail.to_string(),
        };

        if self.slots.is_empty() {
            return Err(invalid("at least one slot is required"));
        }
        if !(self.symbol_span > 0.0 && self.symbol_span < 1.0) {
            return Err(invalid("symbol_span must be between 0 and 1"));
        }
        let reach = self.symbol_span / 2.0;
        let outside = self
            .holder
            .iter()
            .chain(&self.slots)
            .any(|a| (a.x * a.x + a.y * a.y).sqrt() + reach > 1.0);
        if outside {
            return Err(invalid("an anchor places its symbol outside the puck"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let puck = GeometryTemplate::builtin("unipuck").unwrap();
        assert_eq!(puck.slot_count(), 16);
        assert!(puck.holder.is_some());
        assert_eq!(puck.symbol.rows(), 14);
        assert!(puck.validate().is_ok());

        let holder = GeometryTemplate::builtin("holder").unwrap();
        assert_eq!(holder.slot_count(), 1);
        assert!(holder.validate().is_ok());

        assert!(matches!(
            GeometryTemplate::builtin("nope"),
            Err(ConfigError::UnknownTemplate(name)) if name == "nope"
        ));
    }

    #[test]
    fn test_first_slot_points_up() {
        let puck = GeometryTemplate::unipuck();
        assert!(puck.slots[0].x.abs() < 1e-4);
        assert!((puck.slots[0].y + 0.30).abs() < 1e-4);
        assert!((puck.slots[5].y + 0.68).abs() < 1e-4);
    }

    #[test]
    fn test_json_round_trip() {
        let json = serde_json::to_string(&GeometryTemplate::unipuck()).unwrap();
        let parsed = GeometryTemplate::from_json_str(&json).unwrap();
        let original = GeometryTemplate::unipuck();
        assert_eq!(parsed.name, original.name);
        assert_eq!(parsed.symbol, original.symbol);
        assert_eq!(parsed.slot_count(), original.slot_count());
        for (a, b) in parsed.slots.iter().zip(&original.slots) {
            assert!(a.distance(b) < 1e-5);
        }
    }

    #[test]
    fn test_json_defaults_and_validation() {
        let json = r#"{
            "name": "pair",
            "symbol": {"rows": 12, "cols": 12},
            "slots": [{"x": -0.4, "y": 0.0}, {"x": 0.4, "y": 0.0}],
            "symbol_span": 0.3
        }"#;
        let template = GeometryTemplate::from_json_str(json).unwrap();
        assert_eq!(template.slot_count(), 2);
        assert_eq!(template.holder, None);
        assert_eq!(template.top_scan_timeout(), Duration::from_secs(20));

        let bad_size = json.replace("\"rows\": 12", "\"rows\": 13");
        assert!(matches!(
            GeometryTemplate::from_json_str(&bad_size),
            Err(ConfigError::Parse(_))
        ));

        let outside = json.replace("-0.4", "-0.95");
        assert!(matches!(
            GeometryTemplate::from_json_str(&outside),
            Err(ConfigError::InvalidTemplate { .. })
        ));
    }
}
