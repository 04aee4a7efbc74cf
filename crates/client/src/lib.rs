// WASM viewer entry point for floorview
// Two stacked canvases: a static floor plan painted on load/resize and a live
// overlay (path, transient obstacles, agent) repainted every animation frame.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use wasm_bindgen::prelude::*;
use web_sys::{window, CloseEvent, MessageEvent, WebSocket};

#[macro_use]
mod utils;     // Console logging

mod bootstrap; // Concurrent map layout + pose reads
mod channel;   // Push message dispatch
mod config;    // Viewer options
mod frame;     // Animation loop, pause/resume/stop token
mod network;   // WebSocket connection, reconnect backoff
mod render;    // Surface trait, static + dynamic layers
mod resize;    // Container width -> surface size
mod state;     // Map model, live state, render context
mod transform; // Grid -> pixel mapping
mod ui;        // DOM notices and alerts
mod viewer;    // Two-layer viewer over any Surface

use channel::Dispatch;
use config::ViewerOptions;
use frame::FrameLoop;
use network::{Backoff, Connection, RetryDecision};
use render::CanvasSurface;
use ui::UI;
use viewer::Viewer;

type SharedViewer = Rc<RefCell<Viewer<CanvasSurface>>>;

/// Initialize panic hook for better error messages in the browser console
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Handle returned to the embedding page.
#[wasm_bindgen]
pub struct ViewerHandle {
    viewer: SharedViewer,
    frame_loop: FrameLoop,
    connection: Rc<RefCell<Connection>>,
}

#[wasm_bindgen]
impl ViewerHandle {
    pub fn pause(&self) {
        self.frame_loop.token().pause();
    }

    pub fn resume(&self) {
        self.frame_loop.token().resume();
    }

    /// Stop rendering and close the push channel for good.
    pub fn stop(&self) {
        self.frame_loop.stop();
        if let Ok(mut connection) = self.connection.try_borrow_mut() {
            connection.close();
        }
        console_log!("Viewer stopped");
    }

    /// `"running"`, `"paused"` or `"stopped"`.
    pub fn state(&self) -> String {
        self.frame_loop.token().state().as_str().to_string()
    }

    /// Whether the map layout and initial pose have been committed.
    #[wasm_bindgen(js_name = isLoaded)]
    pub fn is_loaded(&self) -> bool {
        self.viewer.borrow().is_loaded()
    }

    #[wasm_bindgen(js_name = staticPasses)]
    pub fn static_passes(&self) -> f64 {
        self.viewer.borrow().static_passes() as f64
    }
}

/// Bootstrap the viewer: read map + pose, paint the static layer, open the
/// push channel and start the frame loop.
///
/// On a failed read the container shows a load error and the promise rejects.
#[wasm_bindgen]
pub async fn launch(options: JsValue) -> Result<ViewerHandle, JsValue> {
    let options = ViewerOptions::from_js(options)?;
    let ui = UI::current().ok_or("No document")?;

    let static_layer = CanvasSurface::from_id(&options.static_canvas_id)?;
    let dynamic_layer = CanvasSurface::from_id(&options.dynamic_canvas_id)?;
    let viewer: SharedViewer = Rc::new(RefCell::new(Viewer::new(static_layer, dynamic_layer)));

    if let Some(width) = ui.container_width(&options.container_id) {
        viewer.borrow_mut().resize(width);
    }
    setup_resize_handler(viewer.clone(), &options.container_id)?;

    let loaded = match bootstrap::fetch_initial(&options).await {
        Ok((layout, pose)) => {
            let width = ui.container_width(&options.container_id).unwrap_or(0);
            viewer
                .borrow_mut()
                .bootstrap(layout, pose, width)
                .map_err(|e| e.to_string())
        }
        Err(e) => Err(e.to_string()),
    };
    if let Err(reason) = loaded {
        console_error!("Failed to load map: {}", reason);
        ui.show_load_error(&options.container_id, &reason);
        return Err(JsValue::from_str(&reason));
    }
    {
        let viewer = viewer.borrow();
        let ctx = viewer.context();
        if let Some(map) = ctx.map() {
            let (width, height) = ctx.surface_size();
            console_log!(
                "Map loaded: {}x{} cells, {} points of interest, {}x{} px",
                map.width(),
                map.height(),
                map.poi_count(),
                width,
                height
            );
        }
    }

    let connection = Rc::new(RefCell::new(Connection::new(&options.channel_url)?));
    let backoff = Rc::new(RefCell::new(Backoff::new(options.reconnect.clone())));
    let ws = connection.borrow().websocket().clone();
    attach_channel_handlers(viewer.clone(), Rc::downgrade(&connection), ws, backoff)?;

    let frame_loop = FrameLoop::start(viewer.clone())?;
    setup_visibility_handler(frame_loop.token().clone())?;

    Ok(ViewerHandle {
        viewer,
        frame_loop,
        connection,
    })
}

fn attach_channel_handlers(
    viewer: SharedViewer,
    connection: Weak<RefCell<Connection>>,
    ws: WebSocket,
    backoff: Rc<RefCell<Backoff>>,
) -> Result<(), JsValue> {
    let message_viewer = viewer.clone();
    let onmessage = Closure::wrap(Box::new(move |event: MessageEvent| {
        let Some(text) = event.data().as_string() else {
            console_warn!("Dropping non-text push frame");
            return;
        };
        let message = match channel::decode_frame(&text) {
            Ok(message) => message,
            Err(e) => {
                console_warn!("Dropping malformed push frame: {}", e);
                return;
            }
        };

        let dispatch = match message_viewer.try_borrow_mut() {
            Ok(mut viewer) => viewer.apply(message),
            Err(_) => {
                console_warn!("Viewer busy, dropping {} push", message.event().name());
                return;
            }
        };
        // Borrow released before the blocking alert.
        if let Dispatch::Escalate(reason) = dispatch {
            console_error!("Navigation error: {}", reason);
            ui::alert(&reason).ok();
        }
    }) as Box<dyn FnMut(MessageEvent)>);
    ws.set_onmessage(Some(onmessage.as_ref().unchecked_ref()));
    onmessage.forget();

    let onopen_backoff = backoff.clone();
    let onopen = Closure::wrap(Box::new(move |_event: JsValue| {
        console_log!("Push channel connected");
        if let Ok(mut backoff) = onopen_backoff.try_borrow_mut() {
            backoff.reset();
        }
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onopen(Some(onopen.as_ref().unchecked_ref()));
    onopen.forget();

    let onerror = Closure::wrap(Box::new(move |e: JsValue| {
        console_error!("Push channel error: {:?}", e);
    }) as Box<dyn FnMut(JsValue)>);
    ws.set_onerror(Some(onerror.as_ref().unchecked_ref()));
    onerror.forget();

    let onclose_backoff = backoff;
    let onclose = Closure::wrap(Box::new(move |event: CloseEvent| {
        console_log!("Push channel closed: {}", event.code());

        let decision = match onclose_backoff.try_borrow_mut() {
            Ok(mut backoff) => backoff.on_close(),
            Err(_) => return,
        };
        schedule_reconnect(viewer.clone(), connection.clone(), onclose_backoff.clone(), decision);
    }) as Box<dyn FnMut(CloseEvent)>);
    ws.set_onclose(Some(onclose.as_ref().unchecked_ref()));
    onclose.forget();

    Ok(())
}

/// Act on a retry decision: arm a timer for the next reconnect, or give up.
/// A reconnect whose socket cannot even be created gets no close event, so
/// its failure feeds straight back in here.
fn schedule_reconnect(
    viewer: SharedViewer,
    connection: Weak<RefCell<Connection>>,
    backoff: Rc<RefCell<Backoff>>,
    decision: Option<RetryDecision>,
) {
    let delay = match decision {
        Some(RetryDecision::RetryAfter(delay)) => delay,
        Some(RetryDecision::GiveUp) => {
            let attempts = backoff.try_borrow().map(|b| b.attempts()).unwrap_or(0);
            console_error!("Push channel lost, giving up after {} reconnect attempts", attempts);
            return;
        }
        None => return,
    };

    let Some(window) = window() else {
        return;
    };
    let callback = Closure::once_into_js(move || {
        if let Ok(mut backoff) = backoff.try_borrow_mut() {
            backoff.on_attempt();
        }
        // Viewer stopped and handle dropped: nothing to reconnect.
        let Some(shared) = connection.upgrade() else {
            return;
        };
        if shared.borrow().is_closed() {
            return;
        }
        let reconnected = shared.borrow_mut().reconnect();
        match reconnected {
            Ok(new_ws) => {
                if let Err(e) = attach_channel_handlers(viewer, connection, new_ws, backoff) {
                    console_error!("Failed to attach handlers: {:?}", e);
                }
            }
            Err(e) => {
                console_error!("Reconnect failed: {:?}", e);
                let next = backoff.try_borrow_mut().ok().and_then(|mut b| b.on_attempt_failed());
                schedule_reconnect(viewer, connection, backoff, next);
            }
        }
    });
    if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        callback.unchecked_ref(),
        delay as i32,
    ) {
        console_error!("Failed to schedule reconnect: {:?}", e);
    }
}

/// Refit both layers when the window is resized.
fn setup_resize_handler(viewer: SharedViewer, container_id: &str) -> Result<(), JsValue> {
    let win = window().ok_or("No window")?;
    let id = container_id.to_string();

    let closure = Closure::wrap(Box::new(move || {
        let Some(width) = UI::current().and_then(|ui| ui.container_width(&id)) else {
            return;
        };
        if let Ok(mut viewer) = viewer.try_borrow_mut() {
            viewer.resize(width);
        }
    }) as Box<dyn FnMut()>);

    win.add_event_listener_with_callback("resize", closure.as_ref().unchecked_ref())?;
    closure.forget();

    Ok(())
}

/// Skip painting while the page is hidden.
fn setup_visibility_handler(token: frame::FrameToken) -> Result<(), JsValue> {
    let document = window()
        .and_then(|w| w.document())
        .ok_or("No document")?;

    let doc = document.clone();
    let closure = Closure::wrap(Box::new(move || {
        token.set_hidden(doc.hidden());
    }) as Box<dyn FnMut()>);

    document.add_event_listener_with_callback("visibilitychange", closure.as_ref().unchecked_ref())?;
    closure.forget();

    Ok(())
}
