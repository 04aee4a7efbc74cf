//! Floor plan data file.
//!
//! The controller keeps the map and its points of interest in one JSON file:
//!
//! ```json
//! {"map": {"metadata": {"start_x": 10, "start_y": 0, "start_angle": 90, "grid_unit_cm": 30},
//!          "grid": [[0, 1], [0, 0]]},
//!  "pois": [{"id": "poi_1", "coordinates": {"x": 0, "y": 1}, "name": {"en": "Entrance"}}]}
//! ```

use anyhow::Context;
use protocol::{AgentPose, MapLayout, PoiTable, Point};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Starting pose and physical scale of the map.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Metadata {
    #[serde(default = "default_start_x")]
    pub start_x: f32,
    #[serde(default)]
    pub start_y: f32,
    #[serde(default = "default_start_angle")]
    pub start_angle: f32,
    /// Real-world edge length of one cell.
    #[serde(default = "default_grid_unit_cm")]
    pub grid_unit_cm: f32,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            start_x: default_start_x(),
            start_y: 0.0,
            start_angle: default_start_angle(),
            grid_unit_cm: default_grid_unit_cm(),
        }
    }
}

fn default_start_x() -> f32 {
    10.0
}
fn default_start_angle() -> f32 {
    90.0
}
fn default_grid_unit_cm() -> f32 {
    30.0
}

#[derive(Deserialize)]
struct FloorPlanFile {
    map: MapSection,
    #[serde(default)]
    pois: PoiTable,
}

#[derive(Deserialize)]
struct MapSection {
    #[serde(default)]
    metadata: Metadata,
    grid: Vec<Vec<u8>>,
}

/// A validated floor plan.
#[derive(Debug, Clone, PartialEq)]
pub struct FloorPlan {
    pub layout: MapLayout,
    pub metadata: Metadata,
}

impl FloorPlan {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading floor plan {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing floor plan {}", path.display()))
    }

    pub fn parse(json: &str) -> anyhow::Result<Self> {
        let file: FloorPlanFile = serde_json::from_str(json)?;
        let layout = MapLayout::from_grid(file.map.grid, file.pois);
        layout.validate()?;
        Ok(Self {
            layout,
            metadata: file.map.metadata,
        })
    }

    /// Agent pose before the first position update.
    pub fn start_pose(&self) -> AgentPose {
        AgentPose {
            position: Point::new(self.metadata.start_x, self.metadata.start_y),
            angle: self.metadata.start_angle,
        }
    }
}
