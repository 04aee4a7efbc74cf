// Layer rendering: static floor plan (load/resize only) and live overlay (every frame)
use glam::Vec2;

mod canvas;
mod dynamic_layer;
mod static_layer;

#[cfg(test)]
pub(crate) mod recorder;

pub use canvas::CanvasSurface;
pub use dynamic_layer::draw_dynamic_layer;
pub use static_layer::draw_static_layer;

/// Colours shared by both layers.
pub mod palette {
    pub const BACKGROUND: &str = "#f4f4f4";
    pub const OPEN_CELL: &str = "#ffffff";
    pub const WALL: &str = "#333333";
    pub const GRID_LINE: &str = "#dddddd";
    pub const POI: &str = "#00b8c4";
    pub const PATH: &str = "rgba(0, 123, 255, 0.75)";
    pub const TRANSIENT_OBSTACLE: &str = "#ff8c00";
    pub const AGENT: &str = "#e53935";
}

pub const GRID_LINE_WIDTH: f32 = 1.0;
pub const PATH_LINE_WIDTH: f32 = 4.0;

/// A 2D drawing surface with exclusive owner.
///
/// Only the primitives the two layers need; the browser canvas implements it
/// for real pages and an in-memory recorder implements it for tests.
pub trait Surface {
    /// Pixel size `(width, height)`.
    fn size(&self) -> (u32, u32);

    /// Change the pixel size. Contents are lost.
    fn resize(&mut self, width: u32, height: u32);

    /// Wipe the whole surface to transparent.
    fn clear(&mut self);

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: &str);

    fn stroke_rect(&mut self, origin: Vec2, size: Vec2, color: &str, line_width: f32);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str);

    fn fill_polygon(&mut self, points: &[Vec2], color: &str);

    /// Open polyline with round joins and caps.
    fn stroke_polyline(&mut self, points: &[Vec2], color: &str, line_width: f32);
}
