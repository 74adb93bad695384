//! UDP relay datagram framing
//!
//! ```text
//! +----+------+------+----------+----------+----------+
//! |RSV | FRAG | ATYP | DST.ADDR | DST.PORT |   DATA   |
//! +----+------+------+----------+----------+----------+
//! | 2  |  1   |  1   | Variable |    2     | Variable |
//! +----+------+------+----------+----------+----------+
//! ```
//!
//! Only the framing is provided; the server does not relay UDP.

use super::{put_wire_addr, read_wire_addr};
use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::socks::types::WireAddr;
use bytes::{BufMut, Bytes, BytesMut};

/// A UDP datagram wrapped in the SOCKS5 header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UdpPacket {
    /// Fragment number (0 for standalone datagrams)
    pub frag: u8,
    /// Destination of the datagram
    pub dest: WireAddr,
    /// Datagram payload
    pub payload: Bytes,
}

/// Decode a UDP datagram. The payload may be empty.
pub fn decode_udp_packet(buf: &[u8]) -> Result<UdpPacket, Socks5Error> {
    if buf.len() < UDP_HEADER_LEN {
        return Err(Socks5Error::TruncatedPacket {
            needed: UDP_HEADER_LEN,
            actual: buf.len(),
        });
    }

    if buf[0] != 0 || buf[1] != 0 {
        return Err(Socks5Error::MalformedPacket(
            "non-zero reserved field in UDP header".to_string(),
        ));
    }

    let frag = buf[2];
    let (dest, end) = read_wire_addr(buf, 3)?;

    Ok(UdpPacket {
        frag,
        dest,
        payload: Bytes::copy_from_slice(&buf[end..]),
    })
}

/// Encode a UDP datagram. An empty payload is rejected.
pub fn encode_udp_packet(packet: &UdpPacket) -> Result<Bytes, Socks5Error> {
    if packet.payload.is_empty() {
        return Err(Socks5Error::MalformedPacket(
            "UDP packet has no payload".to_string(),
        ));
    }

    let mut buf = BytesMut::with_capacity(
        UDP_HEADER_LEN + 1 + packet.dest.addr.len() + PORT_LEN + packet.payload.len(),
    );
    buf.put_u16(0);
    buf.put_u8(packet.frag);
    put_wire_addr(&mut buf, &packet.dest)?;
    buf.put_slice(&packet.payload);
    Ok(buf.freeze())
}
