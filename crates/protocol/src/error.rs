//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding or validating wire payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Map grid is empty")]
    EmptyGrid,

    #[error("Map grid is {rows}x{cols} but layout declares {height}x{width}")]
    ShapeMismatch {
        width: u32,
        height: u32,
        rows: usize,
        cols: usize,
    },

    #[error("Invalid cell code {code} at ({x}, {y})")]
    InvalidCell { x: usize, y: usize, code: u8 },

    #[error("Point of interest {id:?} at ({x}, {y}) lies outside the grid")]
    PoiOutOfBounds { id: String, x: f32, y: f32 },
}
