use thiserror::Error;

/// Errors that can occur while talking to a peer.
#[derive(Debug, Error)]
pub enum PeerError {
    /// Network I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A setup or per-piece deadline expired.
    #[error("timeout")]
    Timeout,

    /// The connection was closed by the peer.
    #[error("connection closed")]
    ConnectionClosed,

    /// The peer sent an unparseable handshake (zero-length protocol string
    /// or a short frame).
    #[error("invalid handshake")]
    InvalidHandshake,

    /// The handshake's info hash doesn't match the swarm we joined.
    #[error("info hash mismatch")]
    InfoHashMismatch,

    /// The first message after the handshake was not a bitfield.
    #[error("expected bitfield, got {0}")]
    ExpectedBitfield(String),

    /// Received a message that violates the protocol framing or a parse
    /// contract.
    #[error("malformed message: {0}")]
    MalformedMessage(String),
}
