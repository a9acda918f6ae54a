//! Zone classification
//!
//! Maps a bounding box to a named area of the minimap. The table is an
//! ordered list of normalized rectangles; zones overlap, so the first zone
//! (in table order) containing the box center wins. A center outside every
//! zone maps to [`UNZONED`].

use std::path::Path;

use serde::Deserialize;

use super::detection::BoundingBox;
use crate::error::{Error, Result};

/// Label for a point that matches no zone
pub const UNZONED: &str = "JUNGLE";

/// Rectangle in normalized `[0, 1]` frame coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormRect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl NormRect {
    pub const fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Inclusive containment test
    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.x1 <= x && x <= self.x2 && self.y1 <= y && y <= self.y2
    }

    fn validate(&self) -> std::result::Result<(), String> {
        let in_unit = |v: f64| (0.0..=1.0).contains(&v);
        if ![self.x1, self.y1, self.x2, self.y2].into_iter().all(in_unit) {
            return Err("coordinates must lie in [0, 1]".into());
        }
        if self.x1 > self.x2 || self.y1 > self.y2 {
            return Err("corners out of order".into());
        }
        Ok(())
    }
}

/// A named minimap zone
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    pub name: String,
    pub rect: NormRect,
}

/// Zone entry as written in a zone file
#[derive(Debug, Deserialize)]
struct ZoneEntry {
    name: String,
    rect: [f64; 4],
}

const DEFAULT_ZONES: [(&str, NormRect); 8] = [
    ("BARON PIT", NormRect::new(0.0, 0.0, 0.25, 0.25)),
    ("TOP RIVER", NormRect::new(0.15, 0.15, 0.45, 0.45)),
    ("BLUE TOPSIDE", NormRect::new(0.0, 0.25, 0.35, 0.55)),
    ("BLUE BOTSIDE", NormRect::new(0.0, 0.55, 0.35, 0.85)),
    ("RED TOPSIDE", NormRect::new(0.65, 0.15, 1.0, 0.45)),
    ("RED BOTSIDE", NormRect::new(0.65, 0.45, 1.0, 0.75)),
    ("BOT RIVER", NormRect::new(0.55, 0.55, 0.85, 0.85)),
    ("DRAGON PIT", NormRect::new(0.75, 0.75, 1.0, 1.0)),
];

/// Ordered zone table
///
/// Built once at startup and shared read-only.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneTable {
    zones: Vec<Zone>,
}

impl ZoneTable {
    /// Build a table from zones in priority order
    pub fn new(zones: Vec<Zone>) -> Result<Self> {
        for zone in &zones {
            zone.rect
                .validate()
                .map_err(|e| Error::Config(format!("zone {:?}: {}", zone.name, e)))?;
        }
        Ok(Self { zones })
    }

    /// Parse a JSON zone list: `[{"name": "...", "rect": [x1, y1, x2, y2]}]`
    pub fn from_json(json: &str) -> Result<Self> {
        let entries: Vec<ZoneEntry> = serde_json::from_str(json)?;
        let zones = entries
            .into_iter()
            .map(|entry| {
                let [x1, y1, x2, y2] = entry.rect;
                Zone {
                    name: entry.name,
                    rect: NormRect::new(x1, y1, x2, y2),
                }
            })
            .collect();
        Self::new(zones)
    }

    /// Load a JSON zone file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Zones in priority order
    pub fn zones(&self) -> &[Zone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Name of the zone containing the box center, or [`UNZONED`]
    ///
    /// Frame dimensions must be non-zero.
    pub fn classify(&self, bbox: &BoundingBox, frame_width: u32, frame_height: u32) -> &str {
        debug_assert!(frame_width > 0 && frame_height > 0, "empty frame");

        let (cx, cy) = bbox.center();
        let nx = cx / frame_width as f64;
        let ny = cy / frame_height as f64;

        self.zones
            .iter()
            .find(|zone| zone.rect.contains(nx, ny))
            .map(|zone| zone.name.as_str())
            .unwrap_or(UNZONED)
    }
}

impl Default for ZoneTable {
    fn default() -> Self {
        Self {
            zones: DEFAULT_ZONES
                .iter()
                .map(|(name, rect)| Zone {
                    name: (*name).to_string(),
                    rect: *rect,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_top_river_sighting() {
        // center (115, 65) / 278 = (0.414, 0.234): outside BARON PIT on x,
        // inside TOP RIVER
        let table = ZoneTable::default();
        let bbox = BoundingBox::new(100, 50, 130, 80);

        assert_eq!(table.classify(&bbox, 278, 278), "TOP RIVER");
    }

    #[test]
    fn test_first_match_wins() {
        // (0.2, 0.2) lies in both BARON PIT and TOP RIVER
        let table = ZoneTable::default();
        let bbox = BoundingBox::new(18, 18, 22, 22);

        assert_eq!(table.classify(&bbox, 100, 100), "BARON PIT");
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let table = ZoneTable::default();
        // center exactly on BARON PIT's bottom-right corner
        let bbox = BoundingBox::new(25, 25, 25, 25);
        assert_eq!(table.classify(&bbox, 100, 100), "BARON PIT");

        // center exactly on the frame corner
        let bbox = BoundingBox::new(100, 100, 100, 100);
        assert_eq!(table.classify(&bbox, 100, 100), "DRAGON PIT");
    }

    #[test]
    fn test_unzoned() {
        // (0.5, 0.5) is between the river zones
        let table = ZoneTable::default();
        let bbox = BoundingBox::new(48, 48, 52, 52);

        assert_eq!(table.classify(&bbox, 100, 100), UNZONED);
    }

    #[test]
    fn test_box_outside_frame_is_unzoned() {
        let table = ZoneTable::default();
        let bbox = BoundingBox::new(500, 500, 520, 520);

        assert_eq!(table.classify(&bbox, 100, 100), UNZONED);
    }

    #[test]
    fn test_result_always_known() {
        let table = ZoneTable::default();
        let names: Vec<&str> = table.zones().iter().map(|z| z.name.as_str()).collect();

        for (w, h) in [(1, 1), (7, 13), (278, 278), (1000, 10)] {
            for x in (0..300).step_by(17) {
                for y in (0..300).step_by(23) {
                    let bbox = BoundingBox::new(x, y, x + 5, y + 9);
                    let zone = table.classify(&bbox, w, h);
                    assert!(zone == UNZONED || names.contains(&zone), "{}", zone);
                }
            }
        }
    }

    #[test]
    fn test_from_json() {
        let table = ZoneTable::from_json(
            r#"[
                {"name": "NORTH", "rect": [0.0, 0.0, 1.0, 0.5]},
                {"name": "SOUTH", "rect": [0.0, 0.5, 1.0, 1.0]}
            ]"#,
        )
        .unwrap();

        assert_eq!(table.len(), 2);
        let bbox = BoundingBox::new(10, 80, 12, 82);
        assert_eq!(table.classify(&bbox, 100, 100), "SOUTH");
    }

    #[test]
    fn test_from_json_rejects_bad_rect() {
        let out_of_range = r#"[{"name": "X", "rect": [0.0, 0.0, 1.5, 1.0]}]"#;
        assert!(matches!(
            ZoneTable::from_json(out_of_range),
            Err(Error::Config(_))
        ));

        let inverted = r#"[{"name": "X", "rect": [0.6, 0.0, 0.4, 1.0]}]"#;
        assert!(matches!(ZoneTable::from_json(inverted), Err(Error::Config(_))));

        assert!(matches!(ZoneTable::from_json("{}"), Err(Error::Json(_))));
    }

    #[test]
    fn test_empty_table_is_all_unzoned() {
        let table = ZoneTable::new(Vec::new()).unwrap();
        let bbox = BoundingBox::new(0, 0, 1, 1);

        assert!(table.is_empty());
        assert_eq!(table.classify(&bbox, 10, 10), UNZONED);
    }
}
