//! Push message definitions for the live update channel.
//!
//! Every frame on the channel is a JSON text message `{"event": .., "data": ..}`.

mod server;

pub use server::*;

/// Event names carried in the `event` field of server -> viewer messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushEvent {
    /// Agent position and heading.
    UpdatePosition,
    /// Freshly planned path (possibly empty).
    NewPath,
    /// Full set of transient obstacles.
    UpdateObstacles,
    /// Navigation fault that must be acknowledged by the user.
    NavigationError,
}

impl PushEvent {
    pub const fn name(self) -> &'static str {
        match self {
            PushEvent::UpdatePosition => "update_position",
            PushEvent::NewPath => "new_path",
            PushEvent::UpdateObstacles => "update_obstacles",
            PushEvent::NavigationError => "navigation_error",
        }
    }
}
