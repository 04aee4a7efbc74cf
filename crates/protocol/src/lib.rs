//! Shared protocol crate for floorview.
//!
//! This crate contains:
//! - The static map layout and the agent pose served by the bootstrap reads
//! - Push message definitions for the live update channel
//! - Shared types (Point, grid cell codes)

mod error;
mod layout;
pub mod packets;

pub use error::ProtocolError;
pub use layout::{AgentPose, CellCode, MapLayout, Poi, PoiTable};
pub use packets::{PushEvent, PushMessage};

use serde::{Deserialize, Serialize};

/// A grid-space coordinate as it appears on the wire: `{"x": .., "y": ..}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for glam::Vec2 {
    fn from(p: Point) -> Self {
        glam::Vec2::new(p.x, p.y)
    }
}

impl From<glam::Vec2> for Point {
    fn from(v: glam::Vec2) -> Self {
        Self { x: v.x, y: v.y }
    }
}

/// A transient obstacle cell, encoded as a two-element array `[x, y]`.
pub type ObstacleCell = [i32; 2];
