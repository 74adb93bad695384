//! Bidirectional byte relay
//!
//! Once a session reaches Proxying, two copy loops run concurrently, one per
//! direction. They share a cancellation token: the first loop to stop for
//! its own reason (EOF, error, deadline) cancels it, and the other loop
//! stops at its next read. A write already in progress is allowed to finish
//! or hit its own deadline.

use crate::config::RelayConfig;
use crate::helper::duration_from_secs;
use crate::socks::consts::DEFAULT_RELAY_BUFFER_SIZE;
use std::fmt;
use std::io;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// Chunk size and deadlines for the copy loops
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelaySettings {
    /// Bytes read per iteration
    pub buffer_size: usize,
    /// Idle limit for a single read
    pub read_timeout: Duration,
    /// Limit for writing one chunk to the peer
    pub write_timeout: Duration,
}

impl Default for RelaySettings {
    fn default() -> Self {
        RelaySettings {
            buffer_size: DEFAULT_RELAY_BUFFER_SIZE,
            read_timeout: Duration::from_secs(5),
            write_timeout: Duration::from_secs(5),
        }
    }
}

impl From<&RelayConfig> for RelaySettings {
    fn from(config: &RelayConfig) -> Self {
        RelaySettings {
            buffer_size: config.buffer_size,
            read_timeout: duration_from_secs(config.read_timeout),
            write_timeout: duration_from_secs(config.write_timeout),
        }
    }
}

/// One of the two copy loops
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Client to destination
    ClientToTarget,
    /// Destination to client
    TargetToClient,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ClientToTarget => write!(f, "client->target"),
            Direction::TargetToClient => write!(f, "target->client"),
        }
    }
}

/// Why a copy loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The source reached end of stream
    Eof,
    /// Reading from the source failed
    ReadError(io::ErrorKind),
    /// Writing to the peer failed
    WriteError(io::ErrorKind),
    /// No data arrived within the read deadline
    ReadTimeout,
    /// The peer did not accept a chunk within the write deadline
    WriteTimeout,
    /// The shared token was cancelled by the other loop or the listener
    Cancelled,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Eof => write!(f, "eof"),
            StopReason::ReadError(kind) => write!(f, "read error ({:?})", kind),
            StopReason::WriteError(kind) => write!(f, "write error ({:?})", kind),
            StopReason::ReadTimeout => write!(f, "read timeout"),
            StopReason::WriteTimeout => write!(f, "write timeout"),
            StopReason::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Result of one copy loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectionOutcome {
    /// Bytes fully written to the peer
    pub bytes: u64,
    /// Why the loop stopped
    pub reason: StopReason,
}

/// Result of a finished relay
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayOutcome {
    /// Client to destination loop
    pub client_to_target: DirectionOutcome,
    /// Destination to client loop
    pub target_to_client: DirectionOutcome,
    /// Loop that stopped first on its own, `None` when both were cancelled
    pub first_finished: Option<Direction>,
}

impl RelayOutcome {
    /// Stop reason of the loop that ended the relay
    pub fn termination_reason(&self) -> StopReason {
        match self.first_finished {
            Some(Direction::ClientToTarget) => self.client_to_target.reason,
            Some(Direction::TargetToClient) => self.target_to_client.reason,
            None => StopReason::Cancelled,
        }
    }
}

/// Relay bytes between `client` and `target` until either side stops.
///
/// Cancelling `token` from outside stops both loops. Returns after both
/// loops have stopped; neither socket is shut down here.
pub async fn relay<A, B>(
    client: A,
    target: B,
    settings: &RelaySettings,
    token: CancellationToken,
) -> RelayOutcome
where
    A: AsyncRead + AsyncWrite + Unpin,
    B: AsyncRead + AsyncWrite + Unpin,
{
    let (mut client_read, mut client_write) = tokio::io::split(client);
    let (mut target_read, mut target_write) = tokio::io::split(target);
    let first = OnceLock::new();

    let (client_to_target, target_to_client) = tokio::join!(
        pump(
            &mut client_read,
            &mut target_write,
            Direction::ClientToTarget,
            settings,
            &token,
            &first,
        ),
        pump(
            &mut target_read,
            &mut client_write,
            Direction::TargetToClient,
            settings,
            &token,
            &first,
        ),
    );

    RelayOutcome {
        client_to_target,
        target_to_client,
        first_finished: first.get().copied(),
    }
}

async fn pump<R, W>(
    reader: &mut R,
    writer: &mut W,
    direction: Direction,
    settings: &RelaySettings,
    token: &CancellationToken,
    first: &OnceLock<Direction>,
) -> DirectionOutcome
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut buf = vec![0u8; settings.buffer_size.max(1)];
    let mut bytes = 0u64;

    let reason = loop {
        let read = tokio::select! {
            biased;
            _ = token.cancelled() => break StopReason::Cancelled,
            res = tokio::time::timeout(settings.read_timeout, reader.read(&mut buf)) => res,
        };

        let n = match read {
            Err(_) => break StopReason::ReadTimeout,
            Ok(Err(e)) => break StopReason::ReadError(e.kind()),
            Ok(Ok(0)) => break StopReason::Eof,
            Ok(Ok(n)) => n,
        };

        let write = async {
            writer.write_all(&buf[..n]).await?;
            writer.flush().await
        };
        match tokio::time::timeout(settings.write_timeout, write).await {
            Err(_) => break StopReason::WriteTimeout,
            Ok(Err(e)) => break StopReason::WriteError(e.kind()),
            Ok(Ok(())) => bytes += n as u64,
        }
    };

    if reason != StopReason::Cancelled {
        let _ = first.set(direction);
        token.cancel();
    }

    DirectionOutcome { bytes, reason }
}
