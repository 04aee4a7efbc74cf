//! floorview push relay library.

pub mod config;
pub mod floorplan;
pub mod hub;
pub mod relay;

// Re-export commonly used types
pub use config::Config;
pub use floorplan::{FloorPlan, Metadata};
pub use hub::{Hub, Snapshot};
pub use relay::{run, serve, ConnectionLimiter};
