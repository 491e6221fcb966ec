//! Peer wire protocol (BEP-3).
//!
//! The framed binary protocol spoken with each peer: the fixed handshake,
//! length-prefixed messages, the piece-availability bitfield, and the
//! per-connection session state machine.

mod bitfield;
mod error;
mod message;
mod peer_id;
mod session;
mod transport;

pub use bitfield::Bitfield;
pub use error::PeerError;
pub use message::{Handshake, Message, MessageId, HANDSHAKE_LEN, PROTOCOL};
pub use peer_id::PeerId;
pub use session::PeerSession;
pub use transport::PeerTransport;
