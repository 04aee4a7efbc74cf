//! WebSocket push relay.
//!
//! Every connection first receives the hub's replay, then every broadcast.
//! Text frames a connection sends (the controller uses the same socket) are
//! decoded and published to everyone.

use crate::config::Config;
use crate::floorplan::FloorPlan;
use crate::hub::Hub;
use futures_util::{SinkExt, StreamExt};
use protocol::PushMessage;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};

/// Connection tracking state (shared across connection handlers).
#[derive(Debug, Default)]
pub struct ConnectionLimiter {
    total_connections: usize,
}

impl ConnectionLimiter {
    /// Try to add a connection, returns true if allowed.
    pub fn try_add(&mut self, max_total: usize) -> bool {
        if self.total_connections >= max_total {
            return false;
        }
        self.total_connections += 1;
        true
    }

    pub fn remove(&mut self) {
        self.total_connections = self.total_connections.saturating_sub(1);
    }

    pub fn count(&self) -> usize {
        self.total_connections
    }
}

/// Load the floor plan and run the relay until the listener fails.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let plan = FloorPlan::load(&config.floorplan.path)?;
    info!(
        "Floor plan {}: {}x{}, {} points of interest",
        config.floorplan.path.display(),
        plan.layout.width,
        plan.layout.height,
        plan.layout.pois.len()
    );

    let hub = Arc::new(Hub::new(plan.start_pose(), config.server.channel_capacity));
    let listener = TcpListener::bind(config.addr()?).await?;
    info!("Listening on ws://{}", listener.local_addr()?);

    serve(listener, hub, config.server.max_connections).await
}

/// Accept push channel connections on an already bound listener.
pub async fn serve(listener: TcpListener, hub: Arc<Hub>, max_connections: usize) -> anyhow::Result<()> {
    let limiter = Arc::new(RwLock::new(ConnectionLimiter::default()));

    loop {
        let (stream, addr) = listener.accept().await?;

        if !limiter.write().await.try_add(max_connections) {
            warn!("Connection rejected (limit reached): {}", addr);
            continue;
        }

        let hub = Arc::clone(&hub);
        let limiter = Arc::clone(&limiter);
        tokio::spawn(async move {
            let result = handle_connection(stream, addr, hub).await;

            // Always remove from connection tracking when done
            limiter.write().await.remove();

            if let Err(e) = result {
                error!("Connection error from {}: {}", addr, e);
            }
        });
    }
}

/// Handle a single WebSocket connection.
async fn handle_connection(stream: TcpStream, addr: SocketAddr, hub: Arc<Hub>) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New connection from {}", addr);

    let (mut write, mut read) = ws_stream.split();

    // Subscribe before the replay so nothing published in between is lost.
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
