use glam::Vec2;

use super::{palette, Surface, PATH_LINE_WIDTH};
use crate::state::RenderContext;

/// Rotation applied on top of the heading so that the "up" pointing marker
/// template ends up facing the agent's heading.
const HEADING_OFFSET_DEG: f32 = 90.0;

/// Triangle vertices, tip first, of the heading marker for an agent drawn at
/// `center` with marker radius `radius`, heading `angle_deg` (0 = +x, 90 = +y).
///
/// Built in pixel space so non-uniform aspect ratios never skew it.
pub fn heading_indicator(center: Vec2, radius: f32, angle_deg: f32) -> [Vec2; 3] {
    let rotation = Vec2::from_angle((angle_deg + HEADING_OFFSET_DEG).to_radians());
    let template = [
        Vec2::new(0.0, -0.7 * radius),
        Vec2::new(-0.45 * radius, 0.35 * radius),
        Vec2::new(0.45 * radius, 0.35 * radius),
    ];
    template.map(|v| center + rotation.rotate(v))
}

/// Repaint the live overlay: path, transient obstacles, then the agent on top.
///
/// Runs every animation frame. A no-op (beyond clearing) until a map and a
/// transform exist.
pub fn draw_dynamic_layer<S: Surface>(surface: &mut S, ctx: &RenderContext) {
    surface.clear();

    let (Some(_), Some(transform)) = (ctx.map(), ctx.transform()) else {
        return;
    };
    let state = &ctx.dynamic;

    if !state.path.is_empty() {
        let points: Vec<Vec2> = state
            .path
            .iter()
            .map(|&node| transform.cell_center(node))
            .collect();
        surface.stroke_polyline(&points, palette::PATH, PATH_LINE_WIDTH);
    }

    let extent = transform.cell_extent();
    for cell in &state.obstacles {
        let corner = transform.cell_corner(cell.as_vec2());
        surface.fill_rect(corner, extent, palette::TRANSIENT_OBSTACLE);
    }

    let center = transform.cell_center(state.position);
    let radius = transform.cell_size / 2.0;
    surface.fill_circle(center, radius, palette::AGENT);
    surface.fill_polygon(
        &heading_indicator(center, radius, state.angle),
        palette::BACKGROUND,
    );
}
