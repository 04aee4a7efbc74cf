// Surface sizing from the container width
use crate::state::RenderContext;

/// Surface height as a fraction of its width.
pub const ASPECT_RATIO: f64 = 2.0 / 3.0;

/// Pixel size of both surfaces for a container `width` pixels wide.
pub fn surface_size(width: u32) -> (u32, u32) {
    (width, (width as f64 * ASPECT_RATIO).round() as u32)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResizeOutcome {
    /// Map loaded: transform refitted, static layer must be repainted.
    Repaint,
    /// No map yet: surfaces resized, nothing to paint.
    SurfacesOnly,
}

/// Record the new surface size in the context and refit the transform.
/// The live state is untouched.
pub fn apply(ctx: &mut RenderContext, container_width: u32) -> ((u32, u32), ResizeOutcome) {
    let (width, height) = surface_size(container_width);
    ctx.set_surface_size(width, height);

    let outcome = if ctx.map().is_some() {
        ResizeOutcome::Repaint
    } else {
        ResizeOutcome::SurfacesOnly
    };
    ((width, height), outcome)
}
