//! Static map layout and agent pose, the bodies of the two bootstrap reads.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{Point, ProtocolError};

/// Contents of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellCode {
    Open,
    Obstacle,
}

impl CellCode {
    /// Decode a wire cell value (0 = open, 1 = obstacle).
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(CellCode::Open),
            1 => Some(CellCode::Obstacle),
            _ => None,
        }
    }
}

/// A named location on the floor plan.
///
/// Everything besides `id` and `coordinates` (names, descriptions, in one or
/// several languages) is carried through untouched in `metadata`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub coordinates: Point,
    #[serde(flatten)]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

/// Points of interest as served: either keyed by id, or a list of entries that
/// carry their own `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PoiTable {
    Keyed(BTreeMap<String, Poi>),
    Listed(Vec<Poi>),
}

impl Default for PoiTable {
    fn default() -> Self {
        PoiTable::Keyed(BTreeMap::new())
    }
}

impl PoiTable {
    /// Normalise to an id-ordered map. Listed entries without an id are named
    /// `poi_<n>` by position (1-based).
    pub fn into_map(self) -> BTreeMap<String, Poi> {
        match self {
            PoiTable::Keyed(map) => map
                .into_iter()
                .map(|(key, mut poi)| {
                    if poi.id.is_none() {
                        poi.id = Some(key.clone());
                    }
                    (key, poi)
                })
                .collect(),
            PoiTable::Listed(list) => list
                .into_iter()
                .enumerate()
                .map(|(i, mut poi)| {
                    let id = poi.id.clone().unwrap_or_else(|| format!("poi_{}", i + 1));
                    poi.id = Some(id.clone());
                    (id, poi)
                })
                .collect(),
        }
    }

    pub fn iter(&self) -> Box<dyn Iterator<Item = (String, &Poi)> + '_> {
        match self {
            PoiTable::Keyed(map) => Box::new(map.iter().map(|(k, p)| (k.clone(), p))),
            PoiTable::Listed(list) => Box::new(list.iter().enumerate().map(|(i, p)| {
                let id = p.id.clone().unwrap_or_else(|| format!("poi_{}", i + 1));
                (id, p)
            })),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            PoiTable::Keyed(map) => map.len(),
            PoiTable::Listed(list) => list.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Response body of the map layout read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapLayout {
    pub width: u32,
    pub height: u32,
    /// Row-major cell codes, `height` rows of `width` cells.
    pub grid: Vec<Vec<u8>>,
    #[serde(default)]
    pub pois: PoiTable,
}

impl MapLayout {
    /// Build a layout whose dimensions are taken from the grid itself.
    pub fn from_grid(grid: Vec<Vec<u8>>, pois: PoiTable) -> Self {
        let height = grid.len() as u32;
        let width = grid.first().map(|row| row.len()).unwrap_or(0) as u32;
        Self {
            width,
            height,
            grid,
            pois,
        }
    }

    /// Parse and validate a layout body.
    pub fn decode(json: &str) -> Result<Self, ProtocolError> {
        let layout: MapLayout = serde_json::from_str(json)?;
        layout.validate()?;
        Ok(layout)
    }

    /// Check that the grid shape matches the declared dimensions, that every
    /// cell code is known and that every point of interest lies on the grid.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.width == 0 || self.height == 0 || self.grid.is_empty() {
            return Err(ProtocolError::EmptyGrid);
        }

        let mismatch = |cols: usize| ProtocolError::ShapeMismatch {
            width: self.width,
            height: self.height,
            rows: self.grid.len(),
            cols,
        };
        if self.grid.len() != self.height as usize {
            return Err(mismatch(self.grid[0].len()));
        }
        for (y, row) in self.grid.iter().enumerate() {
            if row.len() != self.width as usize {
                return Err(mismatch(row.len()));
            }
            if let Some((x, &code)) = row
                .iter()
                .enumerate()
                .find(|(_, code)| CellCode::from_code(**code).is_none())
            {
                return Err(ProtocolError::InvalidCell { x, y, code });
            }
        }

        for (id, poi) in self.pois.iter() {
            let Point { x, y } = poi.coordinates;
            let inside = x >= 0.0 && y >= 0.0 && x < self.width as f32 && y < self.height as f32;
            if !inside {
                return Err(ProtocolError::PoiOutOfBounds { id, x, y });
            }
        }

        Ok(())
    }

    /// Cell at `(x, y)`, `None` when out of bounds.
    pub fn cell(&self, x: usize, y: usize) -> Option<CellCode> {
        self.grid
            .get(y)
            .and_then(|row| row.get(x))
            .and_then(|&code| CellCode::from_code(code))
    }
}

/// Agent position and heading: body of the initial-state read and of
/// `update_position` pushes.
///
/// `angle` is in degrees, 0 pointing along +x and growing towards +y
/// (east = 0, south = 90 with the grid's y axis pointing down).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AgentPose {
    pub position: Point,
    pub angle: f32,
}

impl AgentPose {
    pub fn decode(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }
}
