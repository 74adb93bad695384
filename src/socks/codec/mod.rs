//! SOCKS5 packet codec
//!
//! Pure conversions between wire bytes and typed SOCKS5 messages. Nothing in
//! here performs I/O; the session reads a buffer and hands it over whole.
//!
//! Every decoder validates the total length against the declared framing
//! before indexing into the buffer.

mod method;
mod reply;
mod request;
mod udp;

pub use method::{
    decode_method_selection, encode_method_selection_response, MethodSelectionRequest,
};
pub use reply::{encode_connect_reply, ConnectReply};
pub use request::{decode_connect_request, ConnectRequest};
pub use udp::{decode_udp_packet, encode_udp_packet, UdpPacket};

use super::consts::*;
use super::types::{AddressType, WireAddr};
use crate::error::Socks5Error;
use bytes::{BufMut, BytesMut};

/// Read `ATYP ADDR PORT` starting at `atyp_at`.
///
/// The caller guarantees `buf.len() > atyp_at`. Returns the address and the
/// offset just past the port.
fn read_wire_addr(buf: &[u8], atyp_at: usize) -> Result<(WireAddr, usize), Socks5Error> {
    let addr_type = AddressType::try_from(buf[atyp_at])?;

    let (addr_start, addr_len) = match addr_type.canonical_len() {
        Some(len) => (atyp_at + 1, len),
        None => {
            let len_at = atyp_at + 1;
            if buf.len() <= len_at {
                return Err(Socks5Error::TruncatedPacket {
                    needed: len_at + 1,
                    actual: buf.len(),
                });
            }
            let len = buf[len_at] as usize;
            if len == 0 {
                return Err(Socks5Error::MalformedPacket(
                    "empty domain name".to_string(),
                ));
            }
            (len_at + 1, len)
        }
    };

    let end = addr_start + addr_len + PORT_LEN;
    if buf.len() < end {
        return Err(Socks5Error::TruncatedPacket {
            needed: end,
            actual: buf.len(),
        });
    }

    let addr = &buf[addr_start..addr_start + addr_len];
    if addr_type == AddressType::Domain && std::str::from_utf8(addr).is_err() {
        return Err(Socks5Error::MalformedPacket(
            "domain name is not valid UTF-8".to_string(),
        ));
    }

    let port = u16::from_be_bytes([buf[end - 2], buf[end - 1]]);
    Ok((WireAddr::new(addr_type, addr.to_vec(), port), end))
}

/// Append `ATYP ADDR PORT`, rejecting addresses that do not fit their type.
fn put_wire_addr(buf: &mut BytesMut, addr: &WireAddr) -> Result<(), Socks5Error> {
    match addr.addr_type.canonical_len() {
        Some(expected) if addr.addr.len() != expected => {
            return Err(Socks5Error::AddressLengthMismatch {
                expected,
                actual: addr.addr.len(),
            });
        }
        Some(_) => {
            buf.put_u8(addr.addr_type.to_byte());
        }
        None => {
            if addr.addr.len() > MAX_DOMAIN_LEN {
                return Err(Socks5Error::AddressLengthMismatch {
                    expected: MAX_DOMAIN_LEN,
                    actual: addr.addr.len(),
                });
            }
            buf.put_u8(addr.addr_type.to_byte());
            buf.put_u8(addr.addr.len() as u8);
        }
    }

    buf.put_slice(&addr.addr);
    buf.put_u16(addr.port);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_wire_addr_ipv4() {
        let buf = [0xAA, SOCKS5_ADDR_TYPE_IPV4, 10, 0, 0, 1, 0x00, 0x50];
        let (addr, end) = read_wire_addr(&buf, 1).unwrap();
        assert_eq!(addr, WireAddr::new(AddressType::Ipv4, vec![10, 0, 0, 1], 80));
        assert_eq!(end, buf.len());
    }

    #[test]
    fn test_read_wire_addr_domain_missing_length() {
        let buf = [SOCKS5_ADDR_TYPE_DOMAIN];
        assert_eq!(
            read_wire_addr(&buf, 0),
            Err(Socks5Error::TruncatedPacket {
                needed: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_read_wire_addr_empty_domain() {
        let buf = [SOCKS5_ADDR_TYPE_DOMAIN, 0, 0x00, 0x50];
        assert!(matches!(
            read_wire_addr(&buf, 0),
            Err(Socks5Error::MalformedPacket(_))
        ));
    }

    #[test]
    fn test_put_wire_addr_domain_prefix() {
        let mut buf = BytesMut::new();
        let addr = WireAddr::new(AddressType::Domain, b"a.io".to_vec(), 443);
        put_wire_addr(&mut buf, &addr).unwrap();
        assert_eq!(
            &buf[..],
            &[SOCKS5_ADDR_TYPE_DOMAIN, 4, b'a', b'.', b'i', b'o', 0x01, 0xBB]
        );
    }

    #[test]
    fn test_put_wire_addr_rejects_long_domain() {
        let mut buf = BytesMut::new();
        let addr = WireAddr::new(AddressType::Domain, vec![b'x'; 256], 80);
        assert_eq!(
            put_wire_addr(&mut buf, &addr),
            Err(Socks5Error::AddressLengthMismatch {
                expected: 255,
                actual: 256
            })
        );
        assert!(buf.is_empty());
    }
}
