//! Listener configuration types
//!
//! Defines where the proxy listens, how many sessions it admits and the
//! coarse deadlines applied to the handshake.

use serde::{Deserialize, Serialize};

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    1080
}

fn default_max_sessions() -> usize {
    2
}

fn default_dispatch_backlog() -> usize {
    64
}

fn default_shutdown_grace() -> u64 {
    5
}

fn default_handshake_read_timeout() -> u64 {
    10
}

fn default_handshake_write_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

/// Listener configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Address to bind the listening socket to
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Maximum number of concurrently running sessions
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,

    /// Accepted connections that may queue for a session slot
    #[serde(default = "default_dispatch_backlog")]
    pub dispatch_backlog: usize,

    /// Seconds to wait for in-flight sessions on shutdown
    #[serde(default = "default_shutdown_grace")]
    pub shutdown_grace: u64,

    /// Handshake deadlines
    #[serde(default)]
    pub handshake: HandshakeConfig,
}

impl ServerConfig {
    /// `host:port` string for binding
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            listen_addr: default_listen_addr(),
            port: default_port(),
            max_sessions: default_max_sessions(),
            dispatch_backlog: default_dispatch_backlog(),
            shutdown_grace: default_shutdown_grace(),
            handshake: HandshakeConfig::default(),
        }
    }
}

/// Deadlines for the negotiation and connect phases, in seconds.
///
/// Read and write deadlines are stamped once when the connection is
/// accepted and cover the whole handshake.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct HandshakeConfig {
    /// Deadline for all handshake reads
    #[serde(default = "default_handshake_read_timeout")]
    pub read_timeout: u64,

    /// Deadline for all handshake writes
    #[serde(default = "default_handshake_write_timeout")]
    pub write_timeout: u64,

    /// Timeout for resolving and dialing the destination
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64,
}

impl Default for HandshakeConfig {
    fn default() -> Self {
        HandshakeConfig {
            read_timeout: default_handshake_read_timeout(),
            write_timeout: default_handshake_write_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}
