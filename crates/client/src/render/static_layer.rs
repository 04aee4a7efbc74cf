use glam::Vec2;
use protocol::CellCode;

use super::{palette, Surface, GRID_LINE_WIDTH};
use crate::state::RenderContext;

/// Paint background, grid cells and point-of-interest markers.
///
/// Cost is O(map cells); run once after load and once per resize, never per
/// frame. Output depends only on the map and the transform, so repeated calls
/// produce identical pixels.
pub fn draw_static_layer<S: Surface>(surface: &mut S, ctx: &RenderContext) {
    surface.clear();

    let (width, height) = surface.size();
    surface.fill_rect(
        Vec2::ZERO,
        Vec2::new(width as f32, height as f32),
        palette::BACKGROUND,
    );

    let (Some(map), Some(transform)) = (ctx.map(), ctx.transform()) else {
        return;
    };

    let extent = transform.cell_extent();
    for (x, y, code) in map.cells() {
        let corner = transform.cell_corner(Vec2::new(x as f32, y as f32));
        let fill = match code {
            CellCode::Open => palette::OPEN_CELL,
            CellCode::Obstacle => palette::WALL,
        };
        surface.fill_rect(corner, extent, fill);
        surface.stroke_rect(corner, extent, palette::GRID_LINE, GRID_LINE_WIDTH);
    }

    // One marker per point of interest; labels stay in the metadata.
    let radius = transform.cell_size / 3.0;
    for (_, poi) in map.pois() {
        let center = transform.cell_center(poi.coordinates.into());
        surface.fill_circle(center, radius, palette::POI);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recorder::{Command, Recorder};
    use crate::state::{DynamicState, MapModel};
    use protocol::{MapLayout, Poi, PoiTable, Point};
    use std::collections::BTreeMap;

    fn context(surface: (u32, u32)) -> RenderContext {
        let mut pois = BTreeMap::new();
        pois.insert(
            "exit".to_string(),
            Poi {
                id: None,
                coordinates: Point::new(1.0, 1.0),
                metadata: serde_json::Map::from_iter([(
                    "name".to_string(),
                    serde_json::Value::from("Exit"),
                )]),
            },
        );
        let layout = MapLayout::from_grid(vec![vec![0, 1], vec![0, 0]], PoiTable::Keyed(pois));
        let map = MapModel::from_layout(layout).unwrap();
        let mut ctx = RenderContext::new(Some(map), DynamicState::default());
        ctx.set_surface_size(surface.0, surface.1);
        ctx
    }

    #[test]
    fn test_cells_row_major_then_single_poi_marker() {
        let ctx = context((40, 20));
        let mut surface = Recorder::new(40, 20);
        draw_static_layer(&mut surface, &ctx);

        let cmds = &surface.commands;
        assert_eq!(cmds[0], Command::Clear);
        assert!(matches!(&cmds[1], Command::FillRect { color, .. } if color == palette::BACKGROUND));

        // cell 10px, map centred horizontally: offset (10, 0)
        let fills: Vec<(Vec2, String)> = cmds[2..]
            .iter()
            .filter_map(|c| match c {
                Command::FillRect { origin, color, .. } => Some((*origin, color.clone())),
                _ => None,
            })
            .collect();
        assert_eq!(
            fills,
            vec![
                (Vec2::new(10.0, 0.0), palette::OPEN_CELL.to_string()),
                (Vec2::new(20.0, 0.0), palette::WALL.to_string()),
                (Vec2::new(10.0, 10.0), palette::OPEN_CELL.to_string()),
                (Vec2::new(20.0, 10.0), palette::OPEN_CELL.to_string()),
            ]
        );
        assert_eq!(surface.count(|c| matches!(c, Command::StrokeRect { .. })), 4);

        let markers: Vec<_> = cmds
            .iter()
            .filter(|c| matches!(c, Command::FillCircle { .. }))
            .collect();
        assert_eq!(
            markers,
            vec![&Command::FillCircle {
                center: Vec2::new(25.0, 15.0),
                radius: 10.0 / 3.0,
                color: palette::POI.to_string(),
            }]
        );
    }

    #[test]
    fn test_redraw_is_identical() {
        let ctx = context((300, 200));
        let mut surface = Recorder::new(300, 200);
        draw_static_layer(&mut surface, &ctx);
        let first = surface.take();
        draw_static_layer(&mut surface, &ctx);
        let second = surface.take();
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[test]
    fn test_background_only_without_map() {
        let mut ctx = RenderContext::new(None, DynamicState::default());
        ctx.set_surface_size(30, 20);
        let mut surface = Recorder::new(30, 20);
        draw_static_layer(&mut surface, &ctx);
        assert_eq!(surface.commands.len(), 2);
    }
}
