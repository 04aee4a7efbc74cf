// Grid space -> pixel space mapping shared by both layers.
//
//   cell_size = min(W / map_w, H / map_h)          (uniform fit-inside scale)
//   offset    = ((W - map_w * cell) / 2, (H - map_h * cell) / 2)
//
// Both renderers must draw with the same snapshot; RenderContext owns it.
use glam::Vec2;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateTransform {
    pub cell_size: f32,
    pub offset: Vec2,
}

impl CoordinateTransform {
    /// Fit a `map_w x map_h` grid inside a `surface_w x surface_h` pixel surface,
    /// centred. Returns `None` for a degenerate map or surface.
    pub fn fit(surface_w: u32, surface_h: u32, map_w: u32, map_h: u32) -> Option<Self> {
        if surface_w == 0 || surface_h == 0 || map_w == 0 || map_h == 0 {
            return None;
        }

        let (sw, sh) = (surface_w as f32, surface_h as f32);
        let (mw, mh) = (map_w as f32, map_h as f32);
        let cell_size = (sw / mw).min(sh / mh);
        let offset = Vec2::new((sw - mw * cell_size) / 2.0, (sh - mh * cell_size) / 2.0);

        Some(Self { cell_size, offset })
    }

    /// Top-left pixel corner of a grid cell; used for rectangles.
    #[inline]
    pub fn cell_corner(&self, grid: Vec2) -> Vec2 {
        self.offset + grid * self.cell_size
    }

    /// Pixel centre of a grid cell; used for markers and path vertices.
    #[inline]
    pub fn cell_center(&self, grid: Vec2) -> Vec2 {
        self.cell_corner(grid) + Vec2::splat(self.cell_size / 2.0)
    }

    /// Pixel extent of one cell.
    #[inline]
    pub fn cell_extent(&self) -> Vec2 {
        Vec2::splat(self.cell_size)
    }
}
