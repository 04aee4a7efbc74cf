//! Latest agent snapshot plus fan-out to every connected viewer.

use protocol::{AgentPose, ObstacleCell, Point, ProtocolError, PushMessage};
use tokio::sync::{broadcast, RwLock};
use tracing::debug;

/// Latest state as a late-joining viewer should see it.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub pose: AgentPose,
    pub path: Vec<Point>,
    pub obstacles: Vec<ObstacleCell>,
}

impl Snapshot {
    pub fn new(pose: AgentPose) -> Self {
        Self {
            pose,
            path: Vec::new(),
            obstacles: Vec::new(),
        }
    }

    /// Whole-field replacement, same rules as the viewer. Navigation errors
    /// are transient and leave the snapshot alone.
    fn apply(&mut self, message: &PushMessage) {
        match message {
            PushMessage::PositionUpdate(pose) => self.pose = *pose,
            PushMessage::PathUpdate { path } => self.path = path.clone(),
            PushMessage::ObstaclesUpdate { obstacles } => {
                let mut unique: Vec<ObstacleCell> = Vec::with_capacity(obstacles.len());
                for cell in obstacles {
                    if !unique.contains(cell) {
                        unique.push(*cell);
                    }
                }
                self.obstacles = unique;
            }
            PushMessage::NavigationError { .. } => {}
        }
    }
}

pub struct Hub {
    snapshot: RwLock<Snapshot>,
    tx: broadcast::Sender<String>,
}

impl Hub {
    pub fn new(start: AgentPose, capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self {
            snapshot: RwLock::new(Snapshot::new(start)),
            tx,
        }
    }

    /// Update the snapshot and broadcast the encoded message. Returns the
    /// number of viewers it was queued for.
    pub async fn publish(&self, message: PushMessage) -> Result<usize, ProtocolError> {
        let text = message.encode()?;
        let mut snapshot = self.snapshot.write().await;
        snapshot.apply(&message);

        // Sent under the write lock: broadcast order matches snapshot order.
        // No subscribers is not an error.
        let receivers = self.tx.send(text).unwrap_or(0);
        drop(snapshot);
        debug!("Published {} to {} viewers", message.event().name(), receivers);
        Ok(receivers)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.tx.subscribe()
    }

    pub async fn snapshot(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }

    pub async fn pose(&self) -> AgentPose {
        self.snapshot.read().await.pose
    }

    /// Messages that bring a fresh viewer up to date: the pose, then the
    /// path and obstacles when they are non-empty.
    pub async fn replay(&self) -> Vec<PushMessage> {
        let snapshot = self.snapshot.read().await;
        let mut messages = vec![PushMessage::PositionUpdate(snapshot.pose)];
        if !snapshot.path.is_empty() {
            messages.push(PushMessage::PathUpdate {
                path: snapshot.path.clone(),
            });
        }
        if !snapshot.obstacles.is_empty() {
            messages.push(PushMessage::ObstaclesUpdate {
                obstacles: snapshot.obstacles.clone(),
            });
        }
        messages
    }

    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protocol::packets::build_new_path;
    use std::sync::Arc;

    fn start() -> AgentPose {
        AgentPose {
            position: Point::new(10.0, 0.0),
            angle: 90.0,
        }
    }

    #[tokio::test]
    async fn test_publish_replaces_fields() {
        let hub = Hub::new(start(), 8);
        hub.publish(build_new_path(&[(0, 0), (1, 0)])).await.unwrap();
        hub.publish(build_new_path(&[(4, 4)])).await.unwrap();
        hub.publish(PushMessage::ObstaclesUpdate {
            obstacles: vec![[1, 1], [1, 1], [2, 3]],
        })
        .await
        .unwrap();

        let snapshot = hub.snapshot().await;
        assert_eq!(snapshot.path, vec![Point::new(4.0, 4.0)]);
        assert_eq!(snapshot.obstacles, vec![[1, 1], [2, 3]]);
        assert_eq!(snapshot.pose, start());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_publishes_end_on_snapshot() {
        let hub = Arc::new(Hub::new(start(), 256));
        let mut rx = hub.subscribe();

        let tasks: Vec<_> = (0..64)
            .map(|i| {
                let hub = hub.clone();
                tokio::spawn(async move {
                    let pose = AgentPose {
                        position: Point::new(i as f32, 0.0),
                        angle: 0.0,
                    };
                    hub.publish(PushMessage::PositionUpdate(pose)).await.unwrap();
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap();
        }

        let mut last = None;
        while let Ok(text) = rx.try_recv() {
            last = Some(PushMessage::decode(&text).unwrap());
        }
        let snapshot = hub.snapshot().await;
        assert_eq!(last, Some(PushMessage::PositionUpdate(snapshot.pose)));
    }

    #[tokio::test]
    async fn test_navigation_error_broadcast_only() {
        let hub = Hub::new(start(), 8);
        let mut rx = hub.subscribe();
        let before = hub.snapshot().await;

        let sent = hub
            .publish(PushMessage::NavigationError {
                message: "Blocked".to_string(),
            })
            .await
            .unwrap();
        assert_eq!(sent, 1);
        assert_eq!(hub.snapshot().await, before);

        let text = rx.recv().await.unwrap();
        assert!(matches!(
            PushMessage::decode(&text).unwrap(),
            PushMessage::NavigationError { .. }
        ));
    }

    #[tokio::test]
    async fn test_replay_skips_empty_fields() {
        let hub = Hub::new(start(), 8);
        assert_eq!(hub.replay().await, vec![PushMessage::PositionUpdate(start())]);

        hub.publish(PushMessage::ObstaclesUpdate {
            obstacles: vec![[0, 1]],
        })
        .await
        .unwrap();
        let replay = hub.replay().await;
        assert_eq!(replay.len(), 2);
        assert!(matches!(replay[1], PushMessage::ObstaclesUpdate { .. }));

        // An empty path clears it and drops it from the replay again.
        hub.publish(build_new_path(&[(1, 1)])).await.unwrap();
        assert_eq!(hub.replay().await.len(), 3);
        hub.publish(build_new_path(&[])).await.unwrap();
        assert_eq!(hub.replay().await.len(), 2);
    }

    #[tokio::test]
    async fn test_publish_without_viewers() {
        let hub = Hub::new(start(), 1);
        let pose = AgentPose {
            position: Point::new(2.5, 3.0),
            angle: 270.0,
        };
        assert_eq!(hub.publish(PushMessage::PositionUpdate(pose)).await.unwrap(), 0);
        assert_eq!(hub.pose().await, pose);
        assert_eq!(hub.viewer_count(), 0);
    }
}
