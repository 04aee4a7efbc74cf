// Push channel: WebSocket connection, endpoint resolution, reconnect backoff
use wasm_bindgen::prelude::*;
use web_sys::WebSocket;

use crate::config::ReconnectPolicy;

pub struct Connection {
    ws: WebSocket,
    url: String,
    closed: bool,
}

impl Connection {
    /// Open the push channel. Relative endpoints are resolved against the
    /// page location, picking `wss` on https pages.
    pub fn new(url: &str) -> Result<Self, JsValue> {
        let location = web_sys::window().map(|w| w.location());
        let protocol = location
            .as_ref()
            .and_then(|l| l.protocol().ok())
            .unwrap_or_default();
        let host = location
            .as_ref()
            .and_then(|l| l.host().ok())
            .unwrap_or_default();

        let ws_url = resolve_ws_url(url, &protocol, &host);
        console_log!("Connecting to: {}", ws_url);
        let ws = WebSocket::new(&ws_url)?;

        Ok(Self {
            ws,
            url: ws_url,
            closed: false,
        })
    }

    pub fn websocket(&self) -> &WebSocket {
        &self.ws
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Detach handlers from the current socket and open a fresh one.
    pub fn reconnect(&mut self) -> Result<WebSocket, JsValue> {
        if self.closed {
            return Err(JsValue::from_str("Connection closed"));
        }
        self.detach();
        let _ = self.ws.close();

        console_log!("Reconnecting to: {}", self.url);
        self.ws = WebSocket::new(&self.url)?;
        Ok(self.ws.clone())
    }

    /// Close for good; no close handler runs so no reconnect is scheduled.
    pub fn close(&mut self) {
        self.closed = true;
        self.detach();
        let _ = self.ws.close();
    }

    fn detach(&self) {
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
    }
}

/// Turn a configured endpoint into an absolute `ws://` / `wss://` URL.
///
/// `page_protocol` is the page's `location.protocol` (e.g. `"https:"`) and
/// `page_host` its `location.host`.
pub fn resolve_ws_url(url: &str, page_protocol: &str, page_host: &str) -> String {
    if url.starts_with("ws://") || url.starts_with("wss://") {
        return url.to_string();
    }
    if let Some(rest) = url.strip_prefix("https://") {
        return format!("wss://{rest}");
    }
    if let Some(rest) = url.strip_prefix("http://") {
        return format!("ws://{rest}");
    }

    let scheme = if page_protocol == "https:" { "wss" } else { "ws" };
    if url.starts_with('/') {
        format!("{scheme}://{page_host}{url}")
    } else {
        format!("{scheme}://{url}")
    }
}

/// What to do after the channel closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Reconnect after this many milliseconds.
    RetryAfter(u32),
    /// Attempt budget exhausted.
    GiveUp,
}

/// Reconnect schedule: grows by `factor` up to `max_delay_ms`, reset on a
/// successful open. At most one reconnect is pending at a time.
#[derive(Debug, Clone)]
pub struct Backoff {
    policy: ReconnectPolicy,
    delay_ms: u32,
    attempts: u32,
    scheduled: bool,
}

impl Backoff {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            delay_ms: policy.initial_delay_ms,
            policy,
            attempts: 0,
            scheduled: false,
        }
    }

    /// Called on close. Returns `None` when a reconnect is already pending.
    pub fn on_close(&mut self) -> Option<RetryDecision> {
        if self.scheduled {
            return None;
        }
        if self.policy.max_attempts != 0 && self.attempts >= self.policy.max_attempts {
            return Some(RetryDecision::GiveUp);
        }

        self.scheduled = true;
        self.attempts += 1;
        let current = self.delay_ms;
        let next = (self.delay_ms as f64 * self.policy.factor).min(self.policy.max_delay_ms as f64);
        self.delay_ms = next as u32;
        Some(RetryDecision::RetryAfter(current))
    }

    /// The pending reconnect has fired (successfully or not); the next close
    /// may schedule another.
    pub fn on_attempt(&mut self) {
        self.scheduled = false;
    }

    /// The reconnect fired but no socket could be created, so no close event
    /// will follow. Counts as a close of that attempt.
    pub fn on_attempt_failed(&mut self) -> Option<RetryDecision> {
        self.scheduled = false;
        self.on_close()
    }

    /// Called on a successful open.
    pub fn reset(&mut self) {
        self.delay_ms = self.policy.initial_delay_ms;
        self.attempts = 0;
        self.scheduled = false;
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}
