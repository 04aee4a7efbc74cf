//! floorview - HTTP API, push channel and embedded viewer in one binary.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        ConnectInfo, State,
    },
    http::{header, HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::{SinkExt, StreamExt};
use protocol::{AgentPose, MapLayout, PushMessage};
use rust_embed::RustEmbed;
use server::{ConnectionLimiter, FloorPlan, Hub};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast::error::RecvError;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

// Embedded static assets from client/web
#[derive(RustEmbed)]
#[folder = "../client/web"]
struct Assets;

/// Marker in `index.html` replaced with the push channel URL.
const CHANNEL_INJECT_POINT: &str = "// FLOORVIEW_CHANNEL_INJECT_POINT";

#[derive(Clone)]
struct AppState {
    hub: Arc<Hub>,
    layout: Arc<MapLayout>,
    limiter: Arc<Mutex<ConnectionLimiter>>,
    max_connections: usize,
}

/// Releases a push channel slot when the connection (or a failed upgrade) ends.
struct ConnectionSlot(Arc<Mutex<ConnectionLimiter>>);

impl ConnectionSlot {
    fn acquire(limiter: &Arc<Mutex<ConnectionLimiter>>, max_connections: usize) -> Option<Self> {
        let mut guard = limiter.lock().ok()?;
        guard
            .try_add(max_connections)
            .then(|| Self(Arc::clone(limiter)))
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        if let Ok(mut limiter) = self.0.lock() {
            limiter.remove();
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,server=debug")),
        )
        .init();

    info!("floorview v{}", env!("CARGO_PKG_VERSION"));

    let config = server::Config::load()?;
    info!("Loaded configuration");
    info!("  Listen: {}:{}", config.server.bind, config.server.port);
    info!("  Floor plan: {}", config.floorplan.path.display());

    let plan = FloorPlan::load(&config.floorplan.path)?;
    info!(
        "Floor plan {}x{}, {} points of interest, {} cm per cell",
        plan.layout.width,
        plan.layout.height,
        plan.layout.pois.len(),
        plan.metadata.grid_unit_cm
    );

    let state = AppState {
        hub: Arc::new(Hub::new(plan.start_pose(), config.server.channel_capacity)),
        layout: Arc::new(plan.layout),
        limiter: Arc::new(Mutex::new(ConnectionLimiter::default())),
        max_connections: config.server.max_connections,
    };

    let listener = tokio::net::TcpListener::bind(config.addr()?).await?;
    let addr = listener.local_addr()?;
    info!("Server running on http://{}", addr);
    info!("Push channel endpoint: ws://{}/ws", addr);

    axum::serve(listener, router(state).into_make_service_with_connect_info::<SocketAddr>())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        // Bootstrap reads
        .route("/api/map_data", get(map_data))
        .route("/api/robot_position", get(robot_position))
        // Controller ingest
        .route("/api/events", post(publish_event))
        // Push channel
        .route("/ws", get(websocket_handler))
        // Static file serving (index.html, WASM, etc.)
        .route("/", get(serve_index))
        .route("/index.html", get(serve_index))
        .fallback(static_handler)
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

async fn map_data(State(state): State<AppState>) -> Json<MapLayout> {
    Json(state.layout.as_ref().clone())
}

async fn robot_position(State(state): State<AppState>) -> Json<AgentPose> {
    Json(state.hub.pose().await)
}

/// Accept one push message from the controller and fan it out.
async fn publish_event(State(state): State<AppState>, Json(message): Json<PushMessage>) -> Response {
    let event = message.event().name();
    match state.hub.publish(message).await {
        Ok(viewers) => {
            debug!("Ingested {} for {} viewers", event, viewers);
            StatusCode::ACCEPTED.into_response()
        }
        Err(e) => {
            error!("Failed to publish {}: {}", event, e);
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// Handle WebSocket connections for the push channel
async fn websocket_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<AppState>,
) -> Response {
    let Some(slot) = ConnectionSlot::acquire(&state.limiter, state.max_connections) else {
        warn!("Connection rejected (limit reached): {}", addr);
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };
    info!("WebSocket connection from {}", addr);

    ws.on_upgrade(move |socket| async move {
        let _slot = slot;
        if let Err(e) = handle_websocket(socket, addr, state.hub).await {
            error!("Connection error from {}: {}", addr, e);
        }
    })
}

/// Replay, then relay broadcasts out and controller frames in.
async fn handle_websocket(socket: WebSocket, addr: SocketAddr, hub: Arc<Hub>) -> anyhow::Result<()> {
    let (mut write, mut read) = socket.split();

    let mut rx = hub.subscribe();
    for message in hub.replay().await {
        write.send(Message::Text(message.encode()?.into())).await?;
    }

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match PushMessage::decode(text.as_str()) {
                            Ok(message) => {
                                if let Err(e) = hub.publish(message).await {
                                    warn!("Failed to publish from {}: {}", addr, e);
                                }
                            }
                            Err(e) => warn!("Undecodable push from {}: {}", addr, e),
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("Client {} disconnected", addr);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error from {}: {}", addr, e);
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
            broadcast = rx.recv() => {
                match broadcast {
                    Ok(text) => {
                        if let Err(e) = write.send(Message::Text(text.into())).await {
                            warn!("Failed to send to {}: {}", addr, e);
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!("Viewer {} lagged, skipped {} messages", addr, skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }

    Ok(())
}

async fn serve_index(headers: HeaderMap) -> Response {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string());

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .map(|proto| if proto.eq_ignore_ascii_case("https") { "wss" } else { "ws" })
        .unwrap_or("ws");

    serve_static_file("index.html", host.as_deref(), scheme)
}

/// Handle static file requests
async fn static_handler(uri: Uri) -> Response {
    let path = uri.path().trim_start_matches('/');
    let path = if path.is_empty() { "index.html" } else { path };
    serve_static_file(path, None, "ws")
}

/// Serve a file from embedded assets; `index.html` gets the channel URL injected.
fn serve_static_file(path: &str, host: Option<&str>, ws_scheme: &str) -> Response {
    let Some(content) = Assets::get(path) else {
        warn!("Static file not found: {}", path);
        return (StatusCode::NOT_FOUND, "404 Not Found").into_response();
    };
    let mime = mime_guess::from_path(path).first_or_octet_stream();

    let body = if path == "index.html" {
        match std::str::from_utf8(&content.data) {
            Ok(html) => inject_channel_url(html, host, ws_scheme).into_bytes(),
            Err(_) => content.data.to_vec(),
        }
    } else {
        content.data.to_vec()
    };

    ([(header::CONTENT_TYPE, mime.as_ref().to_string())], body).into_response()
}

fn inject_channel_url(html: &str, host: Option<&str>, ws_scheme: &str) -> String {
    let channel_url = match host {
        Some(host) => format!("{}://{}/ws", ws_scheme, host.trim_end_matches('/')),
        None => "/ws".to_string(),
    };
    html.replace(
        CHANNEL_INJECT_POINT,
        &format!("window.FLOORVIEW_CHANNEL = '{}';", js_string_escape(&channel_url)),
    )
}

/// Escape for a single-quoted JS string inside an inline `<script>`.
fn js_string_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '<' => out.push_str("\\u003c"),
            '>' => out.push_str("\\u003e"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            _ => out.push(c),
        }
    }
    out
}
