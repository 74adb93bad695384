//! Connect request decoding
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | CMD |  RSV  | ATYP | DST.ADDR | DST.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//! ```

use super::read_wire_addr;
use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::socks::types::{SocksCommand, TargetAddr, WireAddr};

/// A decoded client request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectRequest {
    /// Requested command, unknown values retained
    pub command: SocksCommand,
    /// Destination exactly as framed by the client
    pub dest: WireAddr,
}

impl ConnectRequest {
    /// Destination as a dialable address
    pub fn target(&self) -> Result<TargetAddr, Socks5Error> {
        self.dest.to_target()
    }
}

/// Decode a connect request.
///
/// Short input is `TruncatedPacket`; bytes past the port are
/// `MalformedPacket`. The reserved byte is not checked.
pub fn decode_connect_request(buf: &[u8]) -> Result<ConnectRequest, Socks5Error> {
    if buf.len() < MIN_REQUEST_LEN {
        return Err(Socks5Error::TruncatedPacket {
            needed: MIN_REQUEST_LEN,
            actual: buf.len(),
        });
    }

    if buf[0] != SOCKS5_VERSION {
        return Err(Socks5Error::MalformedPacket(format!(
            "unsupported SOCKS version in request: {}",
            buf[0]
        )));
    }

    let command = SocksCommand::from_byte(buf[1]);
    let (dest, end) = read_wire_addr(buf, 3)?;

    if buf.len() > end {
        return Err(Socks5Error::MalformedPacket(format!(
            "{} trailing bytes after request",
            buf.len() - end
        )));
    }

    Ok(ConnectRequest { command, dest })
}
