//! SOCKS5 protocol constants
//!
//! Defines the wire constants and framing sizes used by the codec and the
//! session state machine.

/// SOCKS5 protocol version
pub const SOCKS5_VERSION: u8 = 0x05;

// Authentication methods
/// No authentication required
pub const SOCKS5_AUTH_METHOD_NONE: u8 = 0x00;
/// GSSAPI authentication (not implemented)
pub const SOCKS5_AUTH_METHOD_GSSAPI: u8 = 0x01;
/// Username/password authentication (not implemented)
pub const SOCKS5_AUTH_METHOD_PASSWORD: u8 = 0x02;
/// No acceptable methods
pub const SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE: u8 = 0xFF;

// Commands
/// TCP CONNECT command
pub const SOCKS5_CMD_TCP_CONNECT: u8 = 0x01;
/// TCP BIND command (answered with "command not supported")
pub const SOCKS5_CMD_TCP_BIND: u8 = 0x02;
/// UDP ASSOCIATE command (framing only)
pub const SOCKS5_CMD_UDP_ASSOCIATE: u8 = 0x03;

// Address types
/// IPv4 address
pub const SOCKS5_ADDR_TYPE_IPV4: u8 = 0x01;
/// Domain name
pub const SOCKS5_ADDR_TYPE_DOMAIN: u8 = 0x03;
/// IPv6 address
pub const SOCKS5_ADDR_TYPE_IPV6: u8 = 0x04;

// Reserved byte
/// Reserved byte value (always 0x00)
pub const SOCKS5_RESERVED: u8 = 0x00;

// Framing sizes
/// IPv4 address length on the wire
pub const IPV4_ADDR_LEN: usize = 4;
/// IPv6 address length on the wire
pub const IPV6_ADDR_LEN: usize = 16;
/// Maximum domain name length (1-byte length prefix)
pub const MAX_DOMAIN_LEN: usize = 255;
/// Port length on the wire
pub const PORT_LEN: usize = 2;
/// Largest method selection message accepted
pub const MAX_METHOD_SELECTION_LEN: usize = 0xFF;
/// Smallest possible connect request: VER CMD RSV ATYP + one address byte
pub const MIN_REQUEST_LEN: usize = 5;
/// UDP header before the address: RSV(2) FRAG ATYP
pub const UDP_HEADER_LEN: usize = 4;

// Read sizes used by the session
/// Bytes read from the client during method negotiation
pub const METHOD_SELECTION_READ_SIZE: usize = 260;
/// Bytes read from the client for the connect request
pub const CONNECT_REQUEST_READ_SIZE: usize = 512;
/// Default chunk size for relaying
pub const DEFAULT_RELAY_BUFFER_SIZE: usize = 1024;
