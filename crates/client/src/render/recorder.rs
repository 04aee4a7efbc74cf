// In-memory surface that records draw calls, for renderer tests.
use glam::Vec2;

use super::Surface;

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Clear,
    Resize(u32, u32),
    FillRect { origin: Vec2, size: Vec2, color: String },
    StrokeRect { origin: Vec2, size: Vec2, color: String, width: f32 },
    FillCircle { center: Vec2, radius: f32, color: String },
    FillPolygon { points: Vec<Vec2>, color: String },
    StrokePolyline { points: Vec<Vec2>, color: String, width: f32 },
}

impl Command {
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Clear => "clear",
            Command::Resize(..) => "resize",
            Command::FillRect { .. } => "fill_rect",
            Command::StrokeRect { .. } => "stroke_rect",
            Command::FillCircle { .. } => "fill_circle",
            Command::FillPolygon { .. } => "fill_polygon",
            Command::StrokePolyline { .. } => "stroke_polyline",
        }
    }
}

#[derive(Debug, Default)]
pub struct Recorder {
    width: u32,
    height: u32,
    pub commands: Vec<Command>,
}

impl Recorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn take(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }

    pub fn count(&self, pred: impl Fn(&Command) -> bool) -> usize {
        self.commands.iter().filter(|c| pred(c)).count()
    }
}

impl Surface for Recorder {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
        self.commands.push(Command::Resize(width, height));
    }

    fn clear(&mut self) {
        self.commands.push(Command::Clear);
    }

    fn fill_rect(&mut self, origin: Vec2, size: Vec2, color: &str) {
        self.commands.push(Command::FillRect {
            origin,
            size,
            color: color.to_string(),
        });
    }

    fn stroke_rect(&mut self, origin: Vec2, size: Vec2, color: &str, line_width: f32) {
        self.commands.push(Command::StrokeRect {
            origin,
            size,
            color: color.to_string(),
            width: line_width,
        });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str) {
        self.commands.push(Command::FillCircle {
            center,
            radius,
            color: color.to_string(),
        });
    }

    fn fill_polygon(&mut self, points: &[Vec2], color: &str) {
        self.commands.push(Command::FillPolygon {
            points: points.to_vec(),
            color: color.to_string(),
        });
    }

    fn stroke_polyline(&mut self, points: &[Vec2], color: &str, line_width: f32) {
        self.commands.push(Command::StrokePolyline {
            points: points.to_vec(),
            color: color.to_string(),
            width: line_width,
        });
    }
}
