//! SOCKS5 module for Sockrelay
//!
//! This module implements the SOCKS5 protocol engine: the packet codec, the
//! per-connection session state machine, the outbound dial and the
//! bidirectional relay.

pub mod codec;
mod consts;
pub mod dial;
pub mod relay;
pub mod session;
mod types;

pub use codec::{
    decode_connect_request, decode_method_selection, decode_udp_packet, encode_connect_reply,
    encode_method_selection_response, encode_udp_packet, ConnectReply, ConnectRequest,
    MethodSelectionRequest, UdpPacket,
};
pub use consts::*;
pub use relay::{relay, Direction, DirectionOutcome, RelayOutcome, RelaySettings, StopReason};
pub use session::{
    HandshakeDeadlines, RequestState, Session, SessionContext, SessionReport, SessionSettings,
};
pub use types::{AddressType, AuthMethod, SocksCommand, TargetAddr, WireAddr};
