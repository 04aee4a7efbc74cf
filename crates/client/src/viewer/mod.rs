// Two-layer viewer: owns the render context and both drawing surfaces
use protocol::{AgentPose, MapLayout, PushMessage, ProtocolError};

use crate::channel::{self, Dispatch};
use crate::render::{draw_dynamic_layer, draw_static_layer, Surface};
use crate::resize::{self, ResizeOutcome};
use crate::state::{DynamicState, MapModel, RenderContext};

/// Static layer below, live overlay above, same size, same transform.
pub struct Viewer<S: Surface> {
    ctx: RenderContext,
    static_layer: S,
    dynamic_layer: S,
    static_passes: u64,
}

impl<S: Surface> Viewer<S> {
    /// An empty viewer: surfaces can be sized, nothing is painted until
    /// [`Viewer::bootstrap`] succeeds.
    pub fn new(static_layer: S, dynamic_layer: S) -> Self {
        Self {
            ctx: RenderContext::new(None, DynamicState::default()),
            static_layer,
            dynamic_layer,
            static_passes: 0,
        }
    }

    /// Commit the bootstrap reads, size the surfaces and paint the static
    /// layer once. On error nothing is committed.
    pub fn bootstrap(
        &mut self,
        layout: MapLayout,
        pose: AgentPose,
        container_width: u32,
    ) -> Result<(), ProtocolError> {
        let map = MapModel::from_layout(layout)?;
        self.ctx = RenderContext::new(Some(map), DynamicState::from_pose(pose));
        self.resize(container_width);
        Ok(())
    }

    pub fn is_loaded(&self) -> bool {
        self.ctx.map().is_some()
    }

    /// Resize both surfaces for a new container width. Repaints the static
    /// layer exactly once when a map is loaded.
    pub fn resize(&mut self, container_width: u32) -> ResizeOutcome {
        let ((width, height), outcome) = resize::apply(&mut self.ctx, container_width);
        self.static_layer.resize(width, height);
        self.dynamic_layer.resize(width, height);

        if outcome == ResizeOutcome::Repaint {
            self.repaint_static();
        }
        outcome
    }

    /// Apply one push message to the live state.
    pub fn apply(&mut self, message: PushMessage) -> Dispatch {
        channel::dispatch(&mut self.ctx.dynamic, message)
    }

    /// Per-frame repaint of the live overlay.
    pub fn draw_frame(&mut self) {
        draw_dynamic_layer(&mut self.dynamic_layer, &self.ctx);
    }

    fn repaint_static(&mut self) {
        draw_static_layer(&mut self.static_layer, &self.ctx);
        self.static_passes += 1;
    }

    pub fn context(&self) -> &RenderContext {
        &self.ctx
    }

    /// Number of static layer paints so far.
    pub fn static_passes(&self) -> u64 {
        self.static_passes
    }

    #[cfg(test)]
    pub(crate) fn layers(&self) -> (&S, &S) {
        (&self.static_layer, &self.dynamic_layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::recorder::{Command, Recorder};
    use glam::Vec2;
    use protocol::{PoiTable, Point};

    fn layout() -> MapLayout {
        MapLayout::from_grid(vec![vec![0; 20]; 10], PoiTable::default())
    }

    fn pose() -> AgentPose {
        AgentPose {
            position: Point::new(10.0, 0.0),
            angle: 90.0,
        }
    }

    fn viewer() -> Viewer<Recorder> {
        Viewer::new(Recorder::new(0, 0), Recorder::new(0, 0))
    }

    #[test]
    fn test_load_paints_static_once() {
        let mut viewer = viewer();
        viewer.bootstrap(layout(), pose(), 600).unwrap();
        assert!(viewer.is_loaded());
        assert_eq!(viewer.static_passes(), 1);

        let (static_layer, dynamic_layer) = viewer.layers();
        assert_eq!(static_layer.size(), (600, 400));
        assert_eq!(dynamic_layer.size(), (600, 400));
    }

    #[test]
    fn test_failed_load_commits_nothing() {
        let mut viewer = viewer();
        let mut bad = layout();
        bad.height = 11;
        assert!(viewer.bootstrap(bad, pose(), 600).is_err());
        assert!(!viewer.is_loaded());
        assert_eq!(viewer.static_passes(), 0);
        assert_eq!(viewer.context().dynamic, DynamicState::default());
    }

    #[test]
    fn test_resize_repaints_static_once_and_keeps_pose() {
        let mut viewer = viewer();
        viewer.bootstrap(layout(), pose(), 600).unwrap();
        let before = viewer.context().dynamic.clone();

        assert_eq!(viewer.resize(900), ResizeOutcome::Repaint);
        assert_eq!(viewer.static_passes(), 2);
        assert_eq!(viewer.context().dynamic, before);
        assert_eq!(viewer.context().transform().unwrap().cell_size, 45.0);
        assert_eq!(viewer.layers().0.size(), (900, 600));
    }

    #[test]
    fn test_resize_before_load_only_sizes_surfaces() {
        let mut viewer = viewer();
        assert_eq!(viewer.resize(300), ResizeOutcome::SurfacesOnly);
        assert_eq!(viewer.static_passes(), 0);
        assert_eq!(viewer.layers().0.commands, vec![Command::Resize(300, 200)]);
    }

    #[test]
    fn test_frame_reflects_latest_push() {
        let mut viewer = viewer();
        viewer.bootstrap(layout(), pose(), 600).unwrap();

        let message = PushMessage::decode(
            r#"{"event":"update_position","data":{"position":{"x":2,"y":3},"angle":0}}"#,
        )
        .unwrap();
        assert!(matches!(viewer.apply(message), Dispatch::Applied(_)));
        viewer.draw_frame();

        // cell 30px, centred vertically in 600x400: offset (0, 50)
        let center = Vec2::new(2.0 * 30.0 + 15.0, 50.0 + 3.0 * 30.0 + 15.0);
        let (_, dynamic_layer) = viewer.layers();
        assert!(dynamic_layer
            .commands
            .iter()
            .any(|c| matches!(c, Command::FillCircle { center: got, .. } if *got == center)));
        assert_eq!(viewer.static_passes(), 1);
    }
}
