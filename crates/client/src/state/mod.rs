// Static map model, live agent state, and the render context that owns both
use std::collections::BTreeMap;

use glam::{IVec2, Vec2};
use protocol::{AgentPose, CellCode, MapLayout, ObstacleCell, Point, Poi, ProtocolError};

use crate::transform::CoordinateTransform;

/// Immutable floor plan, built once from the layout read.
#[derive(Debug, Clone, PartialEq)]
pub struct MapModel {
    width: u32,
    height: u32,
    /// Row-major, `width * height` entries.
    cells: Vec<CellCode>,
    pois: BTreeMap<String, Poi>,
}

impl MapModel {
    /// Validate a layout and take ownership of it. Nothing is kept on error.
    pub fn from_layout(layout: MapLayout) -> Result<Self, ProtocolError> {
        layout.validate()?;

        let cells = layout
            .grid
            .iter()
            .flatten()
            .map(|&code| CellCode::from_code(code).unwrap_or(CellCode::Obstacle))
            .collect();

        Ok(Self {
            width: layout.width,
            height: layout.height,
            cells,
            pois: layout.pois.into_map(),
        })
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Cell code at `(x, y)`; `None` outside the grid.
    #[cfg(test)]
    pub fn cell(&self, x: u32, y: u32) -> Option<CellCode> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.cells.get((y * self.width + x) as usize).copied()
    }

    /// All cells in row-major order as `(x, y, code)`.
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32, CellCode)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, &code)| (i as u32 % width, i as u32 / width, code))
    }

    /// Points of interest, ordered by id.
    pub fn pois(&self) -> impl Iterator<Item = (&str, &Poi)> {
        self.pois.iter().map(|(id, poi)| (id.as_str(), poi))
    }

    pub fn poi_count(&self) -> usize {
        self.pois.len()
    }
}

/// Live agent state. Every update replaces whole fields.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DynamicState {
    /// Continuous grid-space position.
    pub position: Vec2,
    /// Heading in degrees (0 = +x, 90 = +y).
    pub angle: f32,
    /// Planned path, grid-space nodes in travel order.
    pub path: Vec<Vec2>,
    /// Transient obstacle cells, unique, in arrival order.
    pub obstacles: Vec<IVec2>,
}

impl DynamicState {
    pub fn from_pose(pose: AgentPose) -> Self {
        let mut state = Self::default();
        state.set_pose(pose);
        state
    }

    pub fn set_pose(&mut self, pose: AgentPose) {
        self.position = pose.position.into();
        self.angle = pose.angle;
    }

    pub fn set_path(&mut self, path: Vec<Point>) {
        self.path = path.into_iter().map(Vec2::from).collect();
    }

    pub fn set_obstacles(&mut self, obstacles: Vec<ObstacleCell>) {
        let mut cells: Vec<IVec2> = Vec::with_capacity(obstacles.len());
        for [x, y] in obstacles {
            let cell = IVec2::new(x, y);
            if !cells.contains(&cell) {
                cells.push(cell);
            }
        }
        self.obstacles = cells;
    }
}

/// Everything the renderers read, in one owned value.
///
/// Renderers borrow it shared; channel handlers and the resize controller are
/// the only code paths that take it mutably.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    map: Option<MapModel>,
    pub dynamic: DynamicState,
    transform: Option<CoordinateTransform>,
    surface: (u32, u32),
}

impl RenderContext {
    pub fn new(map: Option<MapModel>, dynamic: DynamicState) -> Self {
        Self {
            map,
            dynamic,
            transform: None,
            surface: (0, 0),
        }
    }

    #[inline]
    pub fn map(&self) -> Option<&MapModel> {
        self.map.as_ref()
    }

    #[inline]
    pub fn transform(&self) -> Option<&CoordinateTransform> {
        self.transform.as_ref()
    }

    #[inline]
    pub fn surface_size(&self) -> (u32, u32) {
        self.surface
    }

    /// Record the drawing surface size and refit the transform.
    /// Without a map the transform stays empty.
    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.surface = (width, height);
        self.transform = self.map.as_ref().and_then(|map| {
            CoordinateTransform::fit(width, height, map.width(), map.height())
        });
    }
}
