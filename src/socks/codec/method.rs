//! Method negotiation messages
//!
//! ```text
//! +----+----------+----------+        +----+--------+
//! |VER | NMETHODS | METHODS  |        |VER | METHOD |
//! +----+----------+----------+        +----+--------+
//! | 1  |    1     | 1 to 255 |        | 1  |   1    |
//! +----+----------+----------+        +----+--------+
//! ```

use crate::error::Socks5Error;
use crate::socks::consts::*;
use crate::socks::types::AuthMethod;

/// Methods offered by the client, in the order they were sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodSelectionRequest {
    /// Offered authentication methods
    pub methods: Vec<AuthMethod>,
}

/// Decode a method selection message.
///
/// The declared method count must account for exactly the remaining bytes.
pub fn decode_method_selection(buf: &[u8]) -> Result<MethodSelectionRequest, Socks5Error> {
    if buf.len() < 2 {
        return Err(Socks5Error::MalformedPacket(format!(
            "method selection too short: {} bytes",
            buf.len()
        )));
    }

    if buf[0] != SOCKS5_VERSION {
        return Err(Socks5Error::MalformedPacket(format!(
            "unsupported SOCKS version: {}",
            buf[0]
        )));
    }

    if buf.len() > MAX_METHOD_SELECTION_LEN {
        return Err(Socks5Error::MalformedPacket(format!(
            "method selection too large: {} bytes",
            buf.len()
        )));
    }

    let declared = buf[1] as usize;
    if buf.len() != 2 + declared {
        return Err(Socks5Error::MalformedPacket(format!(
            "declared {} methods but {} bytes follow",
            declared,
            buf.len() - 2
        )));
    }

    let methods = buf[2..].iter().copied().map(AuthMethod::from_byte).collect();
    Ok(MethodSelectionRequest { methods })
}

/// Encode the server's method choice
pub fn encode_method_selection_response(method: AuthMethod) -> [u8; 2] {
    [SOCKS5_VERSION, method.to_byte()]
}
