//! Outbound connection to the requested destination

use super::types::TargetAddr;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;

/// Resolve `target` and open a TCP connection to it.
///
/// Domain names are resolved with the system resolver and the first address
/// is dialed. Resolution and connect share one `connect_timeout`; expiry is
/// reported as `io::ErrorKind::TimedOut`.
pub async fn connect(target: &TargetAddr, connect_timeout: Duration) -> io::Result<TcpStream> {
    let dial = async {
        let resolved = target.resolve().await?;
        TcpStream::connect(resolved).await
    };

    tokio::time::timeout(connect_timeout, dial)
        .await
        .map_err(|_| {
            io::Error::new(
                io::ErrorKind::TimedOut,
                format!("connection to {} timed out", target),
            )
        })?
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ReplyCode;
    use std::net::Ipv4Addr;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connect_ip_target() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let stream = connect(&TargetAddr::Ip(addr), Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(stream.peer_addr().unwrap(), addr);
    }

    #[tokio::test]
    async fn test_connect_numeric_domain() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let target = TargetAddr::domain("127.0.0.1".to_string(), port);
        let stream = connect(&target, Duration::from_secs(2)).await.unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let target = TargetAddr::ipv4(Ipv4Addr::LOCALHOST, port);
        let err = connect(&target, Duration::from_secs(2)).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionRefused);
        assert_eq!(ReplyCode::from(&err), ReplyCode::ConnectionRefused);
    }

    #[tokio::test]
    async fn test_connect_unresolvable_domain() {
        let target = TargetAddr::domain("no-such-host.invalid".to_string(), 80);
        let err = connect(&target, Duration::from_secs(3)).await.unwrap_err();
        assert_eq!(ReplyCode::from(&err), ReplyCode::HostUnreachable);
    }
}
