//! Relay configuration.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub floorplan: FloorplanConfig,
}

impl Config {
    /// Default configuration file name, looked up in the working directory.
    pub const FILE: &'static str = "floorview.toml";

    /// Load configuration from `floorview.toml` or use defaults.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new(Self::FILE))
    }

    /// Load from `path`, writing a default file there when it is missing.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::parse(&contents)
        } else {
            info!("No {} found, creating default config", path.display());
            let default_config = Self::default();
            std::fs::write(path, toml::to_string_pretty(&default_config)?)?;
            Ok(default_config)
        }
    }

    pub fn parse(contents: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Listen address from `bind` and `port`.
    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(format!("{}:{}", self.server.bind, self.server.port).parse()?)
    }
}

/// Networking settings.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Bind address.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum concurrent push channel connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// Broadcast buffer per viewer; slower viewers skip ahead.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            bind: default_bind(),
            max_connections: default_max_connections(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

fn default_port() -> u16 {
    5001
}
fn default_bind() -> String {
    "0.0.0.0".to_string()
}
fn default_max_connections() -> usize {
    100
}
fn default_channel_capacity() -> usize {
    64
}

/// Floor plan data source.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FloorplanConfig {
    #[serde(default = "default_floorplan_path")]
    pub path: PathBuf,
}

impl Default for FloorplanConfig {
    fn default() -> Self {
        Self {
            path: default_floorplan_path(),
        }
    }
}

fn default_floorplan_path() -> PathBuf {
    PathBuf::from("data/floorplan.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.server.port, 5001);
        assert_eq!(config.floorplan.path, PathBuf::from("data/floorplan.json"));
    }

    #[test]
    fn test_partial_sections() {
        let config = Config::parse(
            r#"
            [server]
            port = 8080
            bind = "127.0.0.1"

            [floorplan]
            path = "/srv/museum.json"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.max_connections, 100);
        assert_eq!(config.addr().unwrap(), "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.floorplan.path, PathBuf::from("/srv/museum.json"));
    }

    #[test]
    fn test_invalid_toml() {
        assert!(Config::parse("[server\nport = 1").is_err());
        assert!(Config::parse("[server]\nport = \"x\"").is_err());
    }

    #[test]
    fn test_default_round_trips_through_toml() {
        let text = toml::to_string_pretty(&Config::default()).unwrap();
        assert_eq!(Config::parse(&text).unwrap(), Config::default());
    }
}
