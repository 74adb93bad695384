//! Error types for Sockrelay
//!
//! This module defines the error taxonomy used by the packet codec, the
//! per-connection session and the listener, plus the SOCKS5 reply codes
//! those errors are reported to clients with.

use std::io;
use thiserror::Error;

/// Main error type for Sockrelay operations
#[derive(Error, Debug)]
pub enum SockrelayError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Errors produced by the SOCKS5 packet codec
///
/// The codec is pure, so every variant describes the bytes it was given
/// rather than any I/O condition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Socks5Error {
    /// Structurally invalid bytes (wrong version, wrong declared length, ...)
    #[error("Malformed packet: {0}")]
    MalformedPacket(String),

    /// Fewer bytes than the declared framing requires
    #[error("Truncated packet: need {needed} bytes, got {actual}")]
    TruncatedPacket {
        /// Bytes required by the framing
        needed: usize,
        /// Bytes actually available
        actual: usize,
    },

    /// Address type byte outside of IPv4/domain/IPv6
    #[error("Address type not supported: {0}")]
    UnsupportedAddressType(u8),

    /// Address bytes do not fit the declared address type
    #[error("Address length mismatch: expected {expected} bytes, got {actual}")]
    AddressLengthMismatch {
        /// Canonical (or maximum, for domains) address length
        expected: usize,
        /// Length of the address that was supplied
        actual: usize,
    },
}

/// Errors that end a single proxy session
#[derive(Error, Debug)]
pub enum SessionError {
    /// The client sent bytes the codec rejected
    #[error("Protocol error: {0}")]
    Protocol(#[from] Socks5Error),

    /// The client requested a command other than CONNECT
    #[error("Command not supported: {0:#04x}")]
    CommandNotSupported(u8),

    /// DNS resolution or TCP connect to the destination failed
    #[error("Failed to connect to {target}: {source}")]
    Dial {
        /// Destination as requested by the client
        target: String,
        /// Underlying resolve/connect error
        #[source]
        source: io::Error,
    },

    /// Read/write/deadline failure on an established socket
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    /// Reply code sent to the client when this error ends the request
    pub fn reply_code(&self) -> ReplyCode {
        match self {
            SessionError::Protocol(err) => ReplyCode::from(err),
            SessionError::CommandNotSupported(_) => ReplyCode::CommandNotSupported,
            SessionError::Dial { source, .. } => ReplyCode::from(source),
            SessionError::Io(_) => ReplyCode::GeneralFailure,
        }
    }
}

/// Reply codes for SOCKS5 protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ReplyCode {
    /// Command succeeded
    Succeeded = 0x00,
    /// General SOCKS server failure
    GeneralFailure = 0x01,
    /// Connection not allowed by ruleset
    ConnectionNotAllowed = 0x02,
    /// Network unreachable
    NetworkUnreachable = 0x03,
    /// Host unreachable
    HostUnreachable = 0x04,
    /// Connection refused
    ConnectionRefused = 0x05,
    /// TTL expired
    TtlExpired = 0x06,
    /// Command not supported
    CommandNotSupported = 0x07,
    /// Address type not supported
    AddressTypeNotSupported = 0x08,
}

impl From<ReplyCode> for u8 {
    fn from(code: ReplyCode) -> Self {
        code as u8
    }
}

impl TryFrom<u8> for ReplyCode {
    type Error = Socks5Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x00 => Ok(ReplyCode::Succeeded),
            0x01 => Ok(ReplyCode::GeneralFailure),
            0x02 => Ok(ReplyCode::ConnectionNotAllowed),
            0x03 => Ok(ReplyCode::NetworkUnreachable),
            0x04 => Ok(ReplyCode::HostUnreachable),
            0x05 => Ok(ReplyCode::ConnectionRefused),
            0x06 => Ok(ReplyCode::TtlExpired),
            0x07 => Ok(ReplyCode::CommandNotSupported),
            0x08 => Ok(ReplyCode::AddressTypeNotSupported),
            _ => Err(Socks5Error::MalformedPacket(format!(
                "unknown reply code {:#04x}",
                value
            ))),
        }
    }
}

/// Maps a dial failure onto the most specific reply code available.
impl From<&io::Error> for ReplyCode {
    fn from(err: &io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::ConnectionRefused => ReplyCode::ConnectionRefused,
            io::ErrorKind::TimedOut => ReplyCode::HostUnreachable,
            io::ErrorKind::NotFound => ReplyCode::HostUnreachable,
            io::ErrorKind::AddrNotAvailable => ReplyCode::HostUnreachable,
            io::ErrorKind::PermissionDenied => ReplyCode::ConnectionNotAllowed,
            _ => ReplyCode::NetworkUnreachable,
        }
    }
}

impl From<&Socks5Error> for ReplyCode {
    fn from(err: &Socks5Error) -> Self {
        match err {
            Socks5Error::UnsupportedAddressType(_) => ReplyCode::AddressTypeNotSupported,
            _ => ReplyCode::GeneralFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reply_code_from_u8_valid() {
        for value in 0x00..=0x08u8 {
            let code = ReplyCode::try_from(value).unwrap();
            assert_eq!(u8::from(code), value);
        }
    }

    #[test]
    fn test_reply_code_from_u8_invalid() {
        assert!(ReplyCode::try_from(0x09).is_err());
        assert!(ReplyCode::try_from(0xFF).is_err());
    }

    #[test]
    fn test_reply_code_from_io_error() {
        let cases = [
            (io::ErrorKind::ConnectionRefused, ReplyCode::ConnectionRefused),
            (io::ErrorKind::TimedOut, ReplyCode::HostUnreachable),
            (io::ErrorKind::NotFound, ReplyCode::HostUnreachable),
            (io::ErrorKind::AddrNotAvailable, ReplyCode::HostUnreachable),
            (io::ErrorKind::PermissionDenied, ReplyCode::ConnectionNotAllowed),
            (io::ErrorKind::Other, ReplyCode::NetworkUnreachable),
        ];

        for (kind, expected) in cases {
            let err = io::Error::new(kind, "test error");
            assert_eq!(ReplyCode::from(&err), expected, "kind {:?}", kind);
        }
    }

    #[test]
    fn test_reply_code_from_codec_error() {
        assert_eq!(
            ReplyCode::from(&Socks5Error::UnsupportedAddressType(0x02)),
            ReplyCode::AddressTypeNotSupported
        );
        assert_eq!(
            ReplyCode::from(&Socks5Error::MalformedPacket("bad".into())),
            ReplyCode::GeneralFailure
        );
        assert_eq!(
            ReplyCode::from(&Socks5Error::TruncatedPacket {
                needed: 10,
                actual: 6
            }),
            ReplyCode::GeneralFailure
        );
    }

    #[test]
    fn test_session_error_reply_code() {
        let err = SessionError::Dial {
            target: "127.0.0.1:9".to_string(),
            source: io::Error::from(io::ErrorKind::ConnectionRefused),
        };
        assert_eq!(err.reply_code(), ReplyCode::ConnectionRefused);

        let err = SessionError::CommandNotSupported(0x02);
        assert_eq!(err.reply_code(), ReplyCode::CommandNotSupported);

        let err = SessionError::from(Socks5Error::UnsupportedAddressType(0x05));
        assert_eq!(err.reply_code(), ReplyCode::AddressTypeNotSupported);

        let err = SessionError::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(err.reply_code(), ReplyCode::GeneralFailure);
    }

    #[test]
    fn test_socks5_error_display() {
        let err = Socks5Error::TruncatedPacket {
            needed: 10,
            actual: 7,
        };
        assert_eq!(format!("{}", err), "Truncated packet: need 10 bytes, got 7");

        let err = Socks5Error::UnsupportedAddressType(0x99);
        assert_eq!(format!("{}", err), "Address type not supported: 153");

        let err = Socks5Error::AddressLengthMismatch {
            expected: 4,
            actual: 3,
        };
        assert_eq!(
            format!("{}", err),
            "Address length mismatch: expected 4 bytes, got 3"
        );
    }

    #[test]
    fn test_session_error_display() {
        let err = SessionError::CommandNotSupported(0x02);
        assert_eq!(format!("{}", err), "Command not supported: 0x02");

        let err = SessionError::Dial {
            target: "example.com:80".to_string(),
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert_eq!(
            format!("{}", err),
            "Failed to connect to example.com:80: refused"
        );
    }

    #[test]
    fn test_sockrelay_error_from() {
        let err: SockrelayError = io::Error::new(io::ErrorKind::Other, "io error").into();
        assert!(matches!(err, SockrelayError::Io(_)));
        assert_eq!(format!("{}", err), "IO error: io error");

        let err = SockrelayError::Config("max_sessions must be positive".to_string());
        assert_eq!(
            format!("{}", err),
            "Configuration error: max_sessions must be positive"
        );
    }
}
