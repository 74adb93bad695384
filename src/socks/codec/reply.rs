//! Connect reply encoding
//!
//! ```text
//! +----+-----+-------+------+----------+----------+
//! |VER | REP |  RSV  | ATYP | BND.ADDR | BND.PORT |
//! +----+-----+-------+------+----------+----------+
//! | 1  |  1  | X'00' |  1   | Variable |    2     |
//! +----+-----+-------+------+----------+----------+
//! ```

use super::put_wire_addr;
use crate::error::{ReplyCode, Socks5Error};
use crate::socks::consts::*;
use crate::socks::types::WireAddr;
use bytes::{BufMut, Bytes, BytesMut};

/// Reply to a connect request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectReply {
    /// Outcome of the request
    pub status: ReplyCode,
    /// Bound address reported to the client
    pub bind: WireAddr,
}

impl ConnectReply {
    /// Reply that echoes the requested destination
    pub fn mirror(status: ReplyCode, dest: &WireAddr) -> Self {
        ConnectReply {
            status,
            bind: dest.clone(),
        }
    }

    /// Reply carrying `0.0.0.0:0`, used when no destination was parsed
    pub fn failure(status: ReplyCode) -> Self {
        ConnectReply {
            status,
            bind: WireAddr::unspecified(),
        }
    }
}

/// Encode a connect reply
pub fn encode_connect_reply(reply: &ConnectReply) -> Result<Bytes, Socks5Error> {
    let mut buf = BytesMut::with_capacity(6 + reply.bind.addr.len() + 1);
    buf.put_u8(SOCKS5_VERSION);
    buf.put_u8(reply.status.into());
    buf.put_u8(SOCKS5_RESERVED);
    put_wire_addr(&mut buf, &reply.bind)?;
    Ok(buf.freeze())
}
