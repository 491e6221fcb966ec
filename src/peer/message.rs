use super::error::PeerError;
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// The BitTorrent protocol identifier sent in every outbound handshake.
pub const PROTOCOL: &[u8] = b"BitTorrent protocol";

/// Length of a handshake carrying the standard 19-byte protocol string.
pub const HANDSHAKE_LEN: usize = 68;

/// The handshake message.
///
/// The handshake is the first thing sent in each direction on a new
/// connection:
///
/// ```text
/// <pstrlen><pstr><reserved: 8 bytes><info_hash: 20 bytes><peer_id: 20 bytes>
/// ```
///
/// We always send the standard protocol string and all-zero reserved bytes.
/// On receive, `pstr` may be any non-empty string and the reserved bytes are
/// ignored; only `pstrlen == 0` is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handshake {
    /// The swarm's info hash.
    pub info_hash: [u8; 20],
    /// The sender's 20-byte client id.
    pub peer_id: [u8; 20],
}

impl Handshake {
    /// Creates a handshake for the given swarm and client id.
    pub fn new(info_hash: [u8; 20], peer_id: [u8; 20]) -> Self {
        Self { info_hash, peer_id }
    }

    /// Encodes the handshake for transmission. Always [`HANDSHAKE_LEN`]
    /// bytes.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(HANDSHAKE_LEN);
        buf.put_u8(PROTOCOL.len() as u8);
        buf.put_slice(PROTOCOL);
        buf.put_slice(&[0u8; 8]);
        buf.put_slice(&self.info_hash);
        buf.put_slice(&self.peer_id);
        buf.freeze()
    }

    /// Decodes a received handshake.
    ///
    /// `data` must hold the complete frame: `49 + pstrlen` bytes starting at
    /// the `pstrlen` byte. A zero `pstrlen` is a protocol error.
    pub fn decode(data: &[u8]) -> Result<Self, PeerError> {
        let pstrlen = *data.first().ok_or(PeerError::InvalidHandshake)? as usize;
        if pstrlen == 0 {
            return Err(PeerError::InvalidHandshake);
        }
        if data.len() < 49 + pstrlen {
            return Err(PeerError::InvalidHandshake);
        }

        // pstr and reserved bytes are tolerated as-is.
        let mut info_hash = [0u8; 20];
        info_hash.copy_from_slice(&data[1 + pstrlen + 8..1 + pstrlen + 28]);

        let mut peer_id = [0u8; 20];
        peer_id.copy_from_slice(&data[1 + pstrlen + 28..1 + pstrlen + 48]);

        Ok(Self { info_hash, peer_id })
    }
}

/// Message type identifiers in the peer wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageId {
    /// Stop sending data to the peer.
    Choke = 0,
    /// Ready to send data to the peer.
    Unchoke = 1,
    /// Want data from the peer.
    Interested = 2,
    /// Don't want data from the peer.
    NotInterested = 3,
    /// Announce a newly-acquired piece.
    Have = 4,
    /// Announce all available pieces.
    Bitfield = 5,
    /// Request a data block.
    Request = 6,
    /// Send block data.
    Piece = 7,
    /// Cancel a pending request.
    Cancel = 8,
}

/// A peer wire protocol message.
///
/// Every message after the handshake is framed as a 4-byte big-endian length
/// followed by `length` payload bytes; byte 0 of the payload is the message
/// id. A zero length is a keep-alive with no id at all.
///
/// Ids outside the core set decode to [`Message::Unknown`] and are carried
/// verbatim; the download loop ignores them.
///
/// # Examples
///
/// ```
/// use remora::peer::Message;
///
/// let request = Message::Request { index: 0, begin: 0, length: 16384 };
/// let bytes = request.encode();
/// assert_eq!(bytes.len(), 17); // 4-byte length + 1-byte id + 12-byte payload
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    /// Empty frame that only resets the peer's idle timer.
    KeepAlive,
    /// The peer will not fulfil our requests.
    Choke,
    /// The peer will fulfil our requests.
    Unchoke,
    /// We want data from the peer.
    Interested,
    /// We don't want data from the peer.
    NotInterested,
    /// The peer acquired the piece at `index`.
    Have { index: u32 },
    /// The peer's complete piece availability, sent once after the handshake.
    Bitfield(Bytes),
    /// Ask for `length` bytes of piece `index` starting at `begin`.
    Request { index: u32, begin: u32, length: u32 },
    /// A block of piece `index` starting at `begin`.
    Piece { index: u32, begin: u32, data: Bytes },
    /// Withdraw a pending request.
    Cancel { index: u32, begin: u32, length: u32 },
    /// Any id outside the core set, payload untouched.
    Unknown { id: u8, payload: Bytes },
}

impl Message {
    /// Encodes the message to a complete frame, length prefix included.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::new();

        match self {
            Message::KeepAlive => {
                buf.put_u32(0);
            }
            Message::Choke => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Choke as u8);
            }
            Message::Unchoke => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Unchoke as u8);
            }
            Message::Interested => {
                buf.put_u32(1);
                buf.put_u8(MessageId::Interested as u8);
            }
            Message::NotInterested => {
                buf.put_u32(1);
                buf.put_u8(MessageId::NotInterested as u8);
            }
            Message::Have { index } => {
                buf.put_u32(5);
                buf.put_u8(MessageId::Have as u8);
                buf.put_u32(*index);
            }
            Message::Bitfield(bits) => {
                buf.put_u32(1 + bits.len() as u32);
                buf.put_u8(MessageId::Bitfield as u8);
                buf.put_slice(bits);
            }
            Message::Request {
                index,
                begin,
                length,
            } => {
                buf.put_u32(13);
                buf.put_u8(MessageId::Request as u8);
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_u32(*length);
            }
            Message::Piece { index, begin, data } => {
                buf.put_u32(9 + data.len() as u32);
                buf.put_u8(MessageId::Piece as u8);
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_slice(data);
            }
            Message::Cancel {
                index,
                begin,
                length,
            } => {
                buf.put_u32(13);
                buf.put_u8(MessageId::Cancel as u8);
                buf.put_u32(*index);
                buf.put_u32(*begin);
                buf.put_u32(*length);
            }
            Message::Unknown { id, payload } => {
                buf.put_u32(1 + payload.len() as u32);
                buf.put_u8(*id);
                buf.put_slice(payload);
            }
        }

        buf.freeze()
    }

    /// Decodes a complete frame, length prefix included.
    ///
    /// `Have` must carry exactly 4 payload bytes, `Request` and `Cancel`
    /// exactly 12, `Piece` at least 8; anything else of those ids is
    /// malformed.
    pub fn decode(mut frame: Bytes) -> Result<Self, PeerError> {
        if frame.len() < 4 {
            return Err(PeerError::MalformedMessage("truncated frame".into()));
        }

        let length = frame.get_u32() as usize;

        if length == 0 {
            return Ok(Message::KeepAlive);
        }

        if frame.remaining() < length {
            return Err(PeerError::MalformedMessage("incomplete frame".into()));
        }

        let id = frame.get_u8();
        let payload_len = length - 1;

        match id {
            0 => Ok(Message::Choke),
            1 => Ok(Message::Unchoke),
            2 => Ok(Message::Interested),
            3 => Ok(Message::NotInterested),
            4 => {
                if payload_len != 4 {
                    return Err(PeerError::MalformedMessage(format!(
                        "have payload must be 4 bytes, got {payload_len}"
                    )));
                }
                Ok(Message::Have {
                    index: frame.get_u32(),
                })
            }
            5 => Ok(Message::Bitfield(frame.copy_to_bytes(payload_len))),
            6 => {
                if payload_len != 12 {
                    return Err(PeerError::MalformedMessage(format!(
                        "request payload must be 12 bytes, got {payload_len}"
                    )));
                }
                Ok(Message::Request {
                    index: frame.get_u32(),
                    begin: frame.get_u32(),
                    length: frame.get_u32(),
                })
            }
            7 => {
                if payload_len < 8 {
                    return Err(PeerError::MalformedMessage(format!(
                        "piece payload must be at least 8 bytes, got {payload_len}"
                    )));
                }
                let index = frame.get_u32();
                let begin = frame.get_u32();
                Ok(Message::Piece {
                    index,
                    begin,
                    data: frame.copy_to_bytes(payload_len - 8),
                })
            }
            8 => {
                if payload_len != 12 {
                    return Err(PeerError::MalformedMessage(format!(
                        "cancel payload must be 12 bytes, got {payload_len}"
                    )));
                }
                Ok(Message::Cancel {
                    index: frame.get_u32(),
                    begin: frame.get_u32(),
                    length: frame.get_u32(),
                })
            }
            id => Ok(Message::Unknown {
                id,
                payload: frame.copy_to_bytes(payload_len),
            }),
        }
    }
}
