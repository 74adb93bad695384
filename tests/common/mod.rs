//! Test utilities for Sockrelay
//!
//! This module provides common test utilities used across integration tests.

#![allow(dead_code)]

use sockrelay::config::Config;
use sockrelay::logging::RecordingLogger;
use sockrelay::server::{Admission, Server};
use sockrelay::SockrelayError;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Create a test TCP listener on an available port
pub async fn create_test_listener() -> (TcpListener, SocketAddr) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    (listener, addr)
}

/// A port on 127.0.0.1 with nothing listening
pub async fn closed_port() -> u16 {
    let (listener, addr) = create_test_listener().await;
    drop(listener);
    addr.port()
}

/// Accept connections forever and echo every byte back
pub async fn spawn_echo_target() -> SocketAddr {
    let (listener, addr) = create_test_listener().await;
    tokio::spawn(async move {
        while let Ok((mut conn, _)) = listener.accept().await {
            tokio::spawn(async move {
                let (mut r, mut w) = conn.split();
                let _ = tokio::io::copy(&mut r, &mut w).await;
            });
        }
    });
    addr
}

/// A proxy running on an ephemeral port
pub struct TestProxy {
    /// Address clients connect to
    pub addr: SocketAddr,
    /// Slot handle for occupancy checks
    pub admission: Admission,
    /// Captured log lines
    pub logger: RecordingLogger,
    shutdown_tx: broadcast::Sender<bool>,
    handle: JoinHandle<Result<(), SockrelayError>>,
}

impl TestProxy {
    /// Start a proxy with `config`
    pub async fn start(config: Config) -> Self {
        let (listener, _) = create_test_listener().await;
        let logger = RecordingLogger::new();
        let server = Server::with_listener(listener, config, Arc::new(logger.clone())).unwrap();
        let addr = server.local_addr().unwrap();
        let admission = server.admission();

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let handle = tokio::spawn(server.run(shutdown_rx));

        TestProxy {
            addr,
            admission,
            logger,
            shutdown_tx,
            handle,
        }
    }

    /// Signal shutdown and wait for `run` to return
    pub async fn stop(self) -> Result<(), SockrelayError> {
        let _ = self.shutdown_tx.send(true);
        tokio::time::timeout(Duration::from_secs(5), self.handle)
            .await
            .expect("proxy did not stop in time")
            .expect("proxy task panicked")
    }
}

/// Test configuration builder
pub struct TestConfigBuilder {
    max_sessions: usize,
    shutdown_grace: u64,
    relay_read_timeout: u64,
}

impl Default for TestConfigBuilder {
    fn default() -> Self {
        TestConfigBuilder {
            max_sessions: 2,
            shutdown_grace: 2,
            relay_read_timeout: 5,
        }
    }
}

impl TestConfigBuilder {
    /// Create a new test config builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of session slots
    pub fn max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    /// Set the shutdown grace period
    pub fn shutdown_grace(mut self, secs: u64) -> Self {
        self.shutdown_grace = secs;
        self
    }

    /// Set the relay idle timeout
    pub fn relay_read_timeout(mut self, secs: u64) -> Self {
        self.relay_read_timeout = secs;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Config {
        let mut config = Config::default();
        config.server.listen_addr = "127.0.0.1".to_string();
        config.server.max_sessions = self.max_sessions;
        config.server.shutdown_grace = self.shutdown_grace;
        config.relay.read_timeout = self.relay_read_timeout;
        config
    }
}

/// Mock SOCKS5 handshake data
pub mod socks5_mock {
    use sockrelay::socks::*;

    /// Create a no-auth method selection request
    pub fn create_auth_request_no_auth() -> Vec<u8> {
        vec![SOCKS5_VERSION, 1, SOCKS5_AUTH_METHOD_NONE]
    }

    /// Create a connect command to IPv4 address
    pub fn create_connect_ipv4(ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_IPV4,
        ];
        cmd.extend_from_slice(&ip);
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Create a connect command to domain
    pub fn create_connect_domain(domain: &str, port: u16) -> Vec<u8> {
        let mut cmd = vec![
            SOCKS5_VERSION,
            SOCKS5_CMD_TCP_CONNECT,
            SOCKS5_RESERVED,
            SOCKS5_ADDR_TYPE_DOMAIN,
            domain.len() as u8,
        ];
        cmd.extend_from_slice(domain.as_bytes());
        cmd.extend_from_slice(&port.to_be_bytes());
        cmd
    }

    /// Expected success reply echoing an IPv4 destination
    pub fn expected_reply_ipv4(status: u8, ip: [u8; 4], port: u16) -> Vec<u8> {
        let mut reply = vec![SOCKS5_VERSION, status, SOCKS5_RESERVED, SOCKS5_ADDR_TYPE_IPV4];
        reply.extend_from_slice(&ip);
        reply.extend_from_slice(&port.to_be_bytes());
        reply
    }
}

/// Run the no-auth negotiation on `stream` and check the server's choice
pub async fn negotiate_no_auth(stream: &mut TcpStream) {
    stream
        .write_all(&socks5_mock::create_auth_request_no_auth())
        .await
        .unwrap();
    let mut reply = [0u8; 2];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(reply, [0x05, 0x00]);
}

/// Connect to the proxy and open a tunnel to `target` (IPv4 loopback)
pub async fn open_tunnel(proxy: SocketAddr, target: SocketAddr) -> TcpStream {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    negotiate_no_auth(&mut stream).await;

    let request = socks5_mock::create_connect_ipv4([127, 0, 0, 1], target.port());
    stream.write_all(&request).await.unwrap();

    let mut reply = [0u8; 10];
    stream.read_exact(&mut reply).await.unwrap();
    assert_eq!(
        reply.to_vec(),
        socks5_mock::expected_reply_ipv4(0x00, [127, 0, 0, 1], target.port())
    );
    stream
}

/// Read whatever arrives within `limit`; `None` if nothing did
pub async fn read_within(stream: &mut TcpStream, limit: Duration) -> Option<Vec<u8>> {
    let mut buf = [0u8; 64];
    match tokio::time::timeout(limit, stream.read(&mut buf)).await {
        Ok(Ok(n)) => Some(buf[..n].to_vec()),
        Ok(Err(_)) => Some(Vec::new()),
        Err(_) => None,
    }
}
