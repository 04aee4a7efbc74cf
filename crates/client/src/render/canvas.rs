// Browser canvas backend for the Surface trait
use glam::Vec2;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use super::Surface;

pub struct CanvasSurface {
    canvas: HtmlCanvasElement,
    ctx: CanvasRenderingContext2d,
}

impl CanvasSurface {
    pub fn new(canvas: HtmlCanvasElement) -> Result<Self, JsValue> {
        let ctx = canvas
            .get_context("2d")?
            .ok_or("Failed to get 2d context")?
            .dyn_into::<CanvasRenderingContext2d>()?;

        Ok(Self { canvas, ctx })
    }

    /// Look up a `<canvas>` element by id.
    pub fn from_id(id: &str) -> Result<Self, JsValue> {
        let canvas = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id(id))
            .ok_or_else(|| JsValue::from_str(&format!("No canvas with id '{id}'")))?
            .dyn_into::<HtmlCanvasElement>()?;
        Self::new(canvas)
    }

    #[inline]
    fn trace(&self, points: &[Vec2]) {
        self.ctx.begin_path();
        if let Some((first, rest)) = points.split_first() {
            self.ctx.move_to(first.x as f64, first.y as f64);
            for p in rest {
                self.ctx.line_to(p.x as f64, p.y as f64);
            }
        }
    }
}

impl Surface for CanvasSurface {
    #[inline(always)]
    fn size(&self) -> (u32, u32) {
        (self.canvas.width(), self.canvas.height())
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.canvas.set_width(width);
        self.canvas.set_height(height);
    }

    #[inline]
    fn clear(&mut self) {
        let (w, h) = self.size();
        self.ctx.clear_rect(0.0, 0.0, w as f64, h as f64);
    }

    #[inline]
    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: &str) {
        self.ctx.set_fill_style_str(color);
        self.ctx
            .fill_rect(origin.x as f64, origin.y as f64, size.x as f64, size.y as f64);
    }

    #[inline]
    fn stroke_rect(&mut self, origin: Vec2, size: Vec2, color: &str, line_width: f32) {
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(line_width as f64);
        self.ctx
            .stroke_rect(origin.x as f64, origin.y as f64, size.x as f64, size.y as f64);
    }

    #[inline]
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str) {
        self.ctx.begin_path();
        self.ctx
            .arc(
                center.x as f64,
                center.y as f64,
                radius as f64,
                0.0,
                std::f64::consts::TAU,
            )
            .ok();
        self.ctx.set_fill_style_str(color);
        self.ctx.fill();
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: &str) {
        if points.len() < 3 {
            return;
        }
        self.trace(points);
        self.ctx.close_path();
        self.ctx.set_fill_style_str(color);
        self.ctx.fill();
    }

    fn stroke_polyline(&mut self, points: &[Vec2], color: &str, line_width: f32) {
        if points.len() < 2 {
            return;
        }
        self.trace(points);
        self.ctx.set_stroke_style_str(color);
        self.ctx.set_line_width(line_width as f64);
        self.ctx.set_line_join("round");
        self.ctx.set_line_cap("round");
        self.ctx.stroke();
    }
}
