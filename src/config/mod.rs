//! Configuration module for Sockrelay
//!
//! This module provides configuration types and parsing for the proxy.
//! Every field has a default, so an empty file is a valid configuration.

mod relay;
mod server;
mod tcp;

pub use relay::RelayConfig;
pub use server::{HandshakeConfig, ServerConfig};
pub use tcp::TcpConfig;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    /// Listener configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Relay configuration
    #[serde(default)]
    pub relay: RelayConfig,

    /// TCP socket options
    #[serde(default)]
    pub tcp: TcpConfig,
}

impl Config {
    /// Check values that would make the proxy unusable
    pub fn validate(&self) -> Result<(), String> {
        if self.server.port == 0 {
            return Err("server.port must be non-zero".to_string());
        }
        if self.server.max_sessions == 0 {
            return Err("server.max_sessions must be at least 1".to_string());
        }
        if self.server.dispatch_backlog == 0 {
            return Err("server.dispatch_backlog must be at least 1".to_string());
        }
        if self.server.handshake.read_timeout == 0
            || self.server.handshake.write_timeout == 0
            || self.server.handshake.connect_timeout == 0
        {
            return Err("server.handshake timeouts must be non-zero".to_string());
        }
        if self.relay.buffer_size == 0 {
            return Err("relay.buffer_size must be non-zero".to_string());
        }
        if self.relay.read_timeout == 0 || self.relay.write_timeout == 0 {
            return Err("relay timeouts must be non-zero".to_string());
        }
        Ok(())
    }
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path.as_ref())
        .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

    parse_config(&content)
}

/// Parse configuration from a TOML string
pub fn parse_config(content: &str) -> Result<Config> {
    toml::from_str(content).with_context(|| "Failed to parse configuration")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config.server.port, 1080);
        assert_eq!(config.server.max_sessions, 2);
        assert_eq!(config.relay.buffer_size, 1024);
        assert!(config.tcp.nodelay);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_full_config() {
        let config_str = r#"
[server]
listen_addr = "127.0.0.1"
port = 9050
max_sessions = 16
dispatch_backlog = 8
shutdown_grace = 2

[server.handshake]
read_timeout = 3
write_timeout = 4
connect_timeout = 6

[relay]
buffer_size = 4096
read_timeout = 30
write_timeout = 15

[tcp]
nodelay = false
keepalive_secs = 60
keepalive_interval = 10
"#;

        let config = parse_config(config_str).unwrap();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:9050");
        assert_eq!(config.server.max_sessions, 16);
        assert_eq!(config.server.dispatch_backlog, 8);
        assert_eq!(config.server.shutdown_grace, 2);
        assert_eq!(config.server.handshake.read_timeout, 3);
        assert_eq!(config.server.handshake.connect_timeout, 6);
        assert_eq!(config.relay.buffer_size, 4096);
        assert_eq!(config.relay.write_timeout, 15);
        assert!(!config.tcp.nodelay);
        assert_eq!(config.tcp.keepalive_secs, 60);
    }

    #[test]
    fn test_parse_partial_section() {
        let config = parse_config("[server]\nport = 1081\n").unwrap();
        assert_eq!(config.server.port, 1081);
        assert_eq!(config.server.listen_addr, "0.0.0.0");
        assert_eq!(config.server.handshake.read_timeout, 10);
    }

    #[test]
    fn test_parse_invalid_config() {
        assert!(parse_config("[server]\nport = \"abc\"\n").is_err());
        assert!(parse_config("[server]\nport = 70000\n").is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.server.port = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.max_sessions = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.relay.buffer_size = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.relay.read_timeout = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.server.handshake.write_timeout = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 2080\nmax_sessions = 4").unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.server.port, 2080);
        assert_eq!(config.server.max_sessions, 4);
    }

    #[test]
    fn test_load_config_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_config(dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
