//! Server -> viewer push messages.

use serde::{Deserialize, Serialize};

use super::PushEvent;
use crate::{AgentPose, ObstacleCell, Point, ProtocolError};

/// One inbound push update.
///
/// Each variant replaces whole fields of the viewer's live state; nothing is
/// merged with what was there before.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PushMessage {
    #[serde(rename = "update_position")]
    PositionUpdate(AgentPose),
    #[serde(rename = "new_path")]
    PathUpdate { path: Vec<Point> },
    #[serde(rename = "update_obstacles")]
    ObstaclesUpdate { obstacles: Vec<ObstacleCell> },
    #[serde(rename = "navigation_error")]
    NavigationError { message: String },
}

impl PushMessage {
    /// Parse one text frame.
    pub fn decode(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Serialize to one text frame.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn event(&self) -> PushEvent {
        match self {
            PushMessage::PositionUpdate(_) => PushEvent::UpdatePosition,
            PushMessage::PathUpdate { .. } => PushEvent::NewPath,
            PushMessage::ObstaclesUpdate { .. } => PushEvent::UpdateObstacles,
            PushMessage::NavigationError { .. } => PushEvent::NavigationError,
        }
    }
}

/// Build a `new_path` message from grid nodes.
pub fn build_new_path(nodes: &[(i32, i32)]) -> PushMessage {
    PushMessage::PathUpdate {
        path: nodes
            .iter()
            .map(|&(x, y)| Point::new(x as f32, y as f32))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_position_update() {
        let msg = PushMessage::decode(
            r#"{"event": "update_position", "data": {"position": {"x": 3, "y": 4.5}, "angle": 270}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            PushMessage::PositionUpdate(AgentPose {
                position: Point::new(3.0, 4.5),
                angle: 270.0,
            })
        );
        assert_eq!(msg.event().name(), "update_position");
    }

    #[test]
    fn test_decode_obstacles_and_path() {
        let msg = PushMessage::decode(
            r#"{"event": "update_obstacles", "data": {"obstacles": [[1, 2], [3, 4]]}}"#,
        )
        .unwrap();
        assert_eq!(
            msg,
            PushMessage::ObstaclesUpdate {
                obstacles: vec![[1, 2], [3, 4]]
            }
        );

        let msg = PushMessage::decode(r#"{"event": "new_path", "data": {"path": []}}"#).unwrap();
        assert_eq!(msg, PushMessage::PathUpdate { path: vec![] });
    }

    #[test]
    fn test_decode_navigation_error() {
        let msg = PushMessage::decode(
            r#"{"event": "navigation_error", "data": {"message": "Cannot find a path to the destination."}}"#,
        )
        .unwrap();
        assert_eq!(msg.event(), PushEvent::NavigationError);
    }

    #[test]
    fn test_unknown_event_rejected() {
        assert!(PushMessage::decode(r#"{"event": "speak", "data": {"text": "hi"}}"#).is_err());
        assert!(PushMessage::decode(r#"{"event": "new_path"}"#).is_err());
    }

    #[test]
    fn test_encode_uses_wire_names() {
        let text = build_new_path(&[(0, 0), (1, 0)]).encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["event"], "new_path");
        assert_eq!(value["data"]["path"][1]["x"], 1.0);
        assert_eq!(PushMessage::decode(&text).unwrap(), build_new_path(&[(0, 0), (1, 0)]));
    }
}
