// Push message dispatch onto the live state
use protocol::{PushEvent, PushMessage, ProtocolError};

use crate::state::DynamicState;

/// Outcome of applying one push message.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// State was replaced; the next frame shows it.
    Applied(PushEvent),
    /// Nothing changed; the message must be surfaced to the user.
    Escalate(String),
}

/// Apply a decoded push message. Each event replaces whole fields; nothing is
/// merged with earlier values.
pub fn dispatch(state: &mut DynamicState, message: PushMessage) -> Dispatch {
    let event = message.event();
    match message {
        PushMessage::PositionUpdate(pose) => state.set_pose(pose),
        PushMessage::PathUpdate { path } => state.set_path(path),
        PushMessage::ObstaclesUpdate { obstacles } => state.set_obstacles(obstacles),
        PushMessage::NavigationError { message } => return Dispatch::Escalate(message),
    }
    Dispatch::Applied(event)
}

/// Decode a text frame. Malformed frames are reported to the caller, which
/// logs and drops them.
pub fn decode_frame(text: &str) -> Result<PushMessage, ProtocolError> {
    PushMessage::decode(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{IVec2, Vec2};

    fn apply(state: &mut DynamicState, json: &str) -> Dispatch {
        dispatch(state, decode_frame(json).unwrap())
    }

    #[test]
    fn test_position_replaces_pose() {
        let mut state = DynamicState::default();
        let outcome = apply(
            &mut state,
            r#"{"event":"update_position","data":{"position":{"x":3.5,"y":2},"angle":180}}"#,
        );
        assert_eq!(outcome, Dispatch::Applied(PushEvent::UpdatePosition));
        assert_eq!(state.position, Vec2::new(3.5, 2.0));
        assert_eq!(state.angle, 180.0);
    }

    #[test]
    fn test_path_replaced_not_merged() {
        let mut state = DynamicState::default();
        apply(
            &mut state,
            r#"{"event":"new_path","data":{"path":[{"x":0,"y":0},{"x":1,"y":0},{"x":2,"y":0}]}}"#,
        );
        apply(&mut state, r#"{"event":"new_path","data":{"path":[{"x":5,"y":5}]}}"#);
        assert_eq!(state.path, vec![Vec2::new(5.0, 5.0)]);

        apply(&mut state, r#"{"event":"new_path","data":{"path":[]}}"#);
        assert!(state.path.is_empty());
    }

    #[test]
    fn test_obstacles_replaced() {
        let mut state = DynamicState::default();
        apply(&mut state, r#"{"event":"update_obstacles","data":{"obstacles":[[1,1],[2,2]]}}"#);
        let outcome = apply(&mut state, r#"{"event":"update_obstacles","data":{"obstacles":[[4,0]]}}"#);
        assert_eq!(outcome, Dispatch::Applied(PushEvent::UpdateObstacles));
        assert_eq!(state.obstacles, vec![IVec2::new(4, 0)]);
    }

    #[test]
    fn test_navigation_error_leaves_state() {
        let mut state = DynamicState::default();
        apply(&mut state, r#"{"event":"new_path","data":{"path":[{"x":1,"y":1}]}}"#);
        let before = state.clone();

        let outcome = apply(
            &mut state,
            r#"{"event":"navigation_error","data":{"message":"No path found"}}"#,
        );
        assert_eq!(outcome, Dispatch::Escalate("No path found".to_string()));
        assert_eq!(state, before);
    }

    #[test]
    fn test_malformed_frame_rejected() {
        assert!(decode_frame("not json").is_err());
        assert!(decode_frame(r#"{"event":"teleport","data":{}}"#).is_err());
        assert!(decode_frame(r#"{"event":"update_position","data":{"angle":1}}"#).is_err());
    }
}
