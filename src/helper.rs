//! Helper utilities for Sockrelay
//!
//! Deadline-bounded socket operations shared by the session and the relay.
//! Deadline expiry is reported as an ordinary `io::ErrorKind::TimedOut`.

use std::io;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Parse duration from seconds
pub fn duration_from_secs(secs: u64) -> Duration {
    Duration::from_secs(secs)
}

fn timed_out(what: &str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("{} deadline exceeded", what))
}

/// Single read that fails once `deadline` passes or `cancel` fires.
///
/// Cancellation surfaces as `io::ErrorKind::Interrupted`.
pub async fn read_until_deadline<S>(
    stream: &mut S,
    buf: &mut [u8],
    deadline: Instant,
    cancel: &CancellationToken,
) -> io::Result<usize>
where
    S: AsyncRead + Unpin,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            Err(io::Error::new(io::ErrorKind::Interrupted, "cancelled"))
        }
        res = tokio::time::timeout_at(deadline, stream.read(buf)) => match res {
            Ok(read) => read,
            Err(_) => Err(timed_out("read")),
        },
    }
}

/// Write and flush all of `buf` before `deadline`
pub async fn write_all_until_deadline<S>(
    stream: &mut S,
    buf: &[u8],
    deadline: Instant,
) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let write = async {
        stream.write_all(buf).await?;
        stream.flush().await
    };

    match tokio::time::timeout_at(deadline, write).await {
        Ok(res) => res,
        Err(_) => Err(timed_out("write")),
    }
}

/// Shut down the write half, ignoring errors and giving up after `limit`
pub async fn shutdown_quietly<S>(stream: &mut S, limit: Duration)
where
    S: AsyncWrite + Unpin,
{
    let _ = tokio::time::timeout(limit, stream.shutdown()).await;
}
