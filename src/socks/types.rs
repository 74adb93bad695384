//! SOCKS5 type definitions
//!
//! Defines the core types used in SOCKS5 protocol handling.

use super::consts::*;
use crate::error::Socks5Error;
use std::fmt;
use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Address type tag (ATYP)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum AddressType {
    /// 4-byte IPv4 address
    Ipv4 = SOCKS5_ADDR_TYPE_IPV4,
    /// Length-prefixed domain name
    Domain = SOCKS5_ADDR_TYPE_DOMAIN,
    /// 16-byte IPv6 address
    Ipv6 = SOCKS5_ADDR_TYPE_IPV6,
}

impl AddressType {
    /// Fixed address length, `None` for length-prefixed domains
    pub fn canonical_len(self) -> Option<usize> {
        match self {
            AddressType::Ipv4 => Some(IPV4_ADDR_LEN),
            AddressType::Ipv6 => Some(IPV6_ADDR_LEN),
            AddressType::Domain => None,
        }
    }

    /// Convert to the ATYP byte
    pub fn to_byte(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for AddressType {
    type Error = Socks5Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            SOCKS5_ADDR_TYPE_IPV4 => Ok(AddressType::Ipv4),
            SOCKS5_ADDR_TYPE_DOMAIN => Ok(AddressType::Domain),
            SOCKS5_ADDR_TYPE_IPV6 => Ok(AddressType::Ipv6),
            other => Err(Socks5Error::UnsupportedAddressType(other)),
        }
    }
}

/// SOCKS5 command types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocksCommand {
    /// TCP CONNECT - establish a TCP connection to target
    Connect,
    /// TCP BIND - wait for incoming connection (not implemented)
    Bind,
    /// UDP ASSOCIATE - establish UDP relay (not implemented)
    UdpAssociate,
    /// Any other command byte, kept so it can be rejected with a reply
    Unknown(u8),
}

impl SocksCommand {
    /// Parse a command byte into SocksCommand
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            SOCKS5_CMD_TCP_CONNECT => SocksCommand::Connect,
            SOCKS5_CMD_TCP_BIND => SocksCommand::Bind,
            SOCKS5_CMD_UDP_ASSOCIATE => SocksCommand::UdpAssociate,
            other => SocksCommand::Unknown(other),
        }
    }

    /// Convert SocksCommand to byte
    pub fn to_byte(self) -> u8 {
        match self {
            SocksCommand::Connect => SOCKS5_CMD_TCP_CONNECT,
            SocksCommand::Bind => SOCKS5_CMD_TCP_BIND,
            SocksCommand::UdpAssociate => SOCKS5_CMD_UDP_ASSOCIATE,
            SocksCommand::Unknown(byte) => byte,
        }
    }
}

impl fmt::Display for SocksCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SocksCommand::Connect => write!(f, "CONNECT"),
            SocksCommand::Bind => write!(f, "BIND"),
            SocksCommand::UdpAssociate => write!(f, "UDP ASSOCIATE"),
            SocksCommand::Unknown(byte) => write!(f, "UNKNOWN({:#04x})", byte),
        }
    }
}

/// Authentication method identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// No authentication required
    NoAuth,
    /// GSSAPI
    Gssapi,
    /// Username/password
    UsernamePassword,
    /// IANA-assigned or private method
    Other(u8),
    /// "No acceptable methods" sentinel (0xFF)
    NoAcceptable,
}

impl AuthMethod {
    /// Parse from SOCKS5 method byte
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            SOCKS5_AUTH_METHOD_NONE => AuthMethod::NoAuth,
            SOCKS5_AUTH_METHOD_GSSAPI => AuthMethod::Gssapi,
            SOCKS5_AUTH_METHOD_PASSWORD => AuthMethod::UsernamePassword,
            SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE => AuthMethod::NoAcceptable,
            other => AuthMethod::Other(other),
        }
    }

    /// Convert to SOCKS5 method byte
    pub fn to_byte(self) -> u8 {
        match self {
            AuthMethod::NoAuth => SOCKS5_AUTH_METHOD_NONE,
            AuthMethod::Gssapi => SOCKS5_AUTH_METHOD_GSSAPI,
            AuthMethod::UsernamePassword => SOCKS5_AUTH_METHOD_PASSWORD,
            AuthMethod::Other(byte) => byte,
            AuthMethod::NoAcceptable => SOCKS5_AUTH_METHOD_NOT_ACCEPTABLE,
        }
    }
}

/// An address exactly as framed on the wire: ATYP, raw address bytes, port.
///
/// Kept separate from [`TargetAddr`] so encoders can reject addresses whose
/// length disagrees with their declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireAddr {
    /// Declared address type
    pub addr_type: AddressType,
    /// Raw address bytes (without the domain length prefix)
    pub addr: Vec<u8>,
    /// Port in host order
    pub port: u16,
}

impl WireAddr {
    /// Create a wire address from its parts
    pub fn new(addr_type: AddressType, addr: Vec<u8>, port: u16) -> Self {
        WireAddr {
            addr_type,
            addr,
            port,
        }
    }

    /// The unspecified IPv4 address `0.0.0.0:0`
    pub fn unspecified() -> Self {
        WireAddr::new(AddressType::Ipv4, vec![0; IPV4_ADDR_LEN], 0)
    }

    /// Interpret the raw bytes as a typed target address
    pub fn to_target(&self) -> Result<TargetAddr, Socks5Error> {
        let mismatch = |expected| Socks5Error::AddressLengthMismatch {
            expected,
            actual: self.addr.len(),
        };

        match self.addr_type {
            AddressType::Ipv4 => {
                let octets: [u8; IPV4_ADDR_LEN] = self
                    .addr
                    .as_slice()
                    .try_into()
                    .map_err(|_| mismatch(IPV4_ADDR_LEN))?;
                Ok(TargetAddr::ipv4(Ipv4Addr::from(octets), self.port))
            }
            AddressType::Ipv6 => {
                let octets: [u8; IPV6_ADDR_LEN] = self
                    .addr
                    .as_slice()
                    .try_into()
                    .map_err(|_| mismatch(IPV6_ADDR_LEN))?;
                Ok(TargetAddr::ipv6(Ipv6Addr::from(octets), self.port))
            }
            AddressType::Domain => {
                if self.addr.is_empty() {
                    return Err(Socks5Error::MalformedPacket(
                        "empty domain name".to_string(),
                    ));
                }
                let domain = String::from_utf8(self.addr.clone()).map_err(|_| {
                    Socks5Error::MalformedPacket("domain name is not valid UTF-8".to_string())
                })?;
                Ok(TargetAddr::domain(domain, self.port))
            }
        }
    }
}

impl From<&TargetAddr> for WireAddr {
    fn from(target: &TargetAddr) -> Self {
        match target {
            TargetAddr::Ip(SocketAddr::V4(addr)) => {
                WireAddr::new(AddressType::Ipv4, addr.ip().octets().to_vec(), addr.port())
            }
            TargetAddr::Ip(SocketAddr::V6(addr)) => {
                WireAddr::new(AddressType::Ipv6, addr.ip().octets().to_vec(), addr.port())
            }
            TargetAddr::Domain(domain, port) => {
                WireAddr::new(AddressType::Domain, domain.as_bytes().to_vec(), *port)
            }
        }
    }
}

/// Target address for SOCKS5 requests
///
/// Represents the destination address in a SOCKS5 request.
/// Can be an IP address (v4 or v6) or a domain name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetAddr {
    /// IP address with port
    Ip(SocketAddr),
    /// Domain name with port
    Domain(String, u16),
}

impl TargetAddr {
    /// Create a new TargetAddr from an IPv4 address and port
    pub fn ipv4(ip: Ipv4Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V4(ip), port))
    }

    /// Create a new TargetAddr from an IPv6 address and port
    pub fn ipv6(ip: Ipv6Addr, port: u16) -> Self {
        TargetAddr::Ip(SocketAddr::new(IpAddr::V6(ip), port))
    }

    /// Create a new TargetAddr from a domain name and port
    pub fn domain(domain: String, port: u16) -> Self {
        TargetAddr::Domain(domain, port)
    }

    /// Get the port number
    pub fn port(&self) -> u16 {
        match self {
            TargetAddr::Ip(addr) => addr.port(),
            TargetAddr::Domain(_, port) => *port,
        }
    }

    /// Resolve the address to a SocketAddr
    ///
    /// For IP addresses, this returns immediately.
    /// For domain names, this performs forward DNS resolution and picks the
    /// first address returned. An empty answer is reported as `NotFound`.
    pub async fn resolve(&self) -> io::Result<SocketAddr> {
        match self {
            TargetAddr::Ip(addr) => Ok(*addr),
            TargetAddr::Domain(domain, port) => {
                let mut addrs = tokio::net::lookup_host((domain.as_str(), *port))
                    .await
                    .map_err(|e| {
                        io::Error::new(
                            io::ErrorKind::NotFound,
                            format!("failed to resolve {}: {}", domain, e),
                        )
                    })?;
                addrs.next().ok_or_else(|| {
                    io::Error::new(
                        io::ErrorKind::NotFound,
                        format!("no addresses found for {}", domain),
                    )
                })
            }
        }
    }
}

impl fmt::Display for TargetAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetAddr::Ip(addr) => write!(f, "{}", addr),
            TargetAddr::Domain(domain, port) => write!(f, "{}:{}", domain, port),
        }
    }
}
