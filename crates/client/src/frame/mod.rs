// Animation loop scheduling and its cancellation token
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use wasm_bindgen::prelude::*;

use crate::render::CanvasSurface;
use crate::viewer::Viewer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameState {
    Running,
    Paused,
    Stopped,
}

impl FrameState {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameState::Running => "running",
            FrameState::Paused => "paused",
            FrameState::Stopped => "stopped",
        }
    }
}

#[derive(Debug)]
struct Flags {
    state: Cell<FrameState>,
    hidden: Cell<bool>,
}

/// Shared handle that pauses, resumes or stops the frame loop.
///
/// Page visibility is tracked separately so that a page coming back into view
/// never overrides an explicit pause. `Stopped` is terminal.
#[derive(Debug, Clone)]
pub struct FrameToken(Rc<Flags>);

impl Default for FrameToken {
    fn default() -> Self {
        Self(Rc::new(Flags {
            state: Cell::new(FrameState::Running),
            hidden: Cell::new(false),
        }))
    }
}

impl FrameToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> FrameState {
        self.0.state.get()
    }

    pub fn pause(&self) {
        if self.state() == FrameState::Running {
            self.0.state.set(FrameState::Paused);
        }
    }

    pub fn resume(&self) {
        if self.state() == FrameState::Paused {
            self.0.state.set(FrameState::Running);
        }
    }

    pub fn stop(&self) {
        self.0.state.set(FrameState::Stopped);
    }

    pub fn set_hidden(&self, hidden: bool) {
        self.0.hidden.set(hidden);
    }

    /// Paint this frame?
    pub fn should_draw(&self) -> bool {
        self.state() == FrameState::Running && !self.0.hidden.get()
    }

    /// Schedule another frame?
    pub fn should_reschedule(&self) -> bool {
        self.state() != FrameState::Stopped
    }
}

type FrameCallback = Rc<RefCell<Option<Closure<dyn FnMut()>>>>;

/// A running `requestAnimationFrame` loop over a viewer.
pub struct FrameLoop {
    token: FrameToken,
    callback: FrameCallback,
    pending: Rc<Cell<Option<i32>>>,
}

impl FrameLoop {
    pub fn start(viewer: Rc<RefCell<Viewer<CanvasSurface>>>) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or("No window")?;
        let token = FrameToken::new();
        let pending: Rc<Cell<Option<i32>>> = Rc::new(Cell::new(None));

        let f: FrameCallback = Rc::new(RefCell::new(None));
        let g = f.clone();

        let tick_token = token.clone();
        let tick_pending = pending.clone();
        *g.borrow_mut() = Some(Closure::wrap(Box::new(move || {
            tick_pending.set(None);
            if !tick_token.should_reschedule() {
                return;
            }
            if tick_token.should_draw() {
                // A push handler holding the viewer just skips this frame.
                if let Ok(mut viewer) = viewer.try_borrow_mut() {
                    viewer.draw_frame();
                }
            }

            if let (Some(win), Some(cb)) = (web_sys::window(), f.borrow().as_ref()) {
                if let Ok(id) = win.request_animation_frame(cb.as_ref().unchecked_ref()) {
                    tick_pending.set(Some(id));
                }
            }
        }) as Box<dyn FnMut()>));

        if let Some(cb) = g.borrow().as_ref() {
            let id = window.request_animation_frame(cb.as_ref().unchecked_ref())?;
            pending.set(Some(id));
        }

        Ok(Self {
            token,
            callback: g,
            pending,
        })
    }

    pub fn token(&self) -> &FrameToken {
        &self.token
    }

    /// Cancel the pending frame and release the loop closure.
    pub fn stop(&self) {
        self.token.stop();
        if let (Some(id), Some(win)) = (self.pending.take(), web_sys::window()) {
            win.cancel_animation_frame(id).ok();
        }
        self.callback.borrow_mut().take();
    }
}
