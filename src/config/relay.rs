//! Relay configuration types

use serde::{Deserialize, Serialize};

fn default_buffer_size() -> usize {
    1024
}

fn default_relay_read_timeout() -> u64 {
    5
}

fn default_relay_write_timeout() -> u64 {
    5
}

/// Byte relay configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RelayConfig {
    /// Chunk size for each read
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Seconds a direction may stay idle before it is torn down
    #[serde(default = "default_relay_read_timeout")]
    pub read_timeout: u64,

    /// Seconds allowed to flush one chunk to the peer
    #[serde(default = "default_relay_write_timeout")]
    pub write_timeout: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        RelayConfig {
            buffer_size: default_buffer_size(),
            read_timeout: default_relay_read_timeout(),
            write_timeout: default_relay_write_timeout(),
        }
    }
}
