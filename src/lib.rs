//! # Sockrelay - SOCKS5 Proxy Server
//!
//! Sockrelay accepts SOCKS5 clients over TCP, negotiates the handshake,
//! dials the requested destination and relays bytes in both directions
//! until either side closes.
//!
//! ## Features
//!
//! - **Strict Codec**: Exact-length framing checks for every SOCKS5 message
//! - **Explicit State Machine**: Init, Connecting, Proxying, Terminating
//! - **Bounded Admission**: A fixed number of concurrent sessions; extra
//!   connections wait for a slot without blocking `accept`
//! - **Deadline-Driven Relay**: Idle or stuck directions are torn down and
//!   always take the opposite direction with them
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sockrelay::config::load_config;
//! use sockrelay::logging::TracingLogger;
//! use sockrelay::server::Server;
//! use std::sync::Arc;
//! use tokio::sync::broadcast;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config("config.toml")?;
//!     let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
//!
//!     let server = Server::bind(config, Arc::new(TracingLogger)).await?;
//!     server.run(shutdown_rx).await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! Listener -> (bounded dispatch) -> Session -> Relay -> teardown -> slot released
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod helper;
pub mod logging;
pub mod net;
pub mod server;
pub mod socks;

// Re-export commonly used items
pub use config::{load_config, Config};
pub use error::{ReplyCode, SessionError, Socks5Error, SockrelayError};
pub use logging::{Logger, NullLogger, RecordingLogger, TracingLogger};
pub use server::Server;

/// Version of the Sockrelay library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Name of the application
pub const NAME: &str = env!("CARGO_PKG_NAME");
