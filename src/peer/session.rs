use super::bitfield::Bitfield;
use super::error::PeerError;
use super::message::{Handshake, Message};
use super::transport::PeerTransport;
use crate::constants::{BITFIELD_TIMEOUT, CONNECT_TIMEOUT, HANDSHAKE_TIMEOUT};
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// An established session with one peer.
///
/// Setup runs connect, handshake, and the initial bitfield exchange under
/// their respective deadlines; afterwards no deadline is in force and the
/// piece download loop applies its own. The session is owned by exactly one
/// worker, which updates [`choked`](Self::choked) and
/// [`bitfield`](Self::bitfield) from inbound Choke/Unchoke/Have messages.
/// Dropping the session closes the connection.
#[derive(Debug)]
pub struct PeerSession {
    transport: PeerTransport,
    addr: SocketAddr,
    /// Whether the remote peer is currently choking us. Starts true; while
    /// set, no Requests may be sent.
    pub choked: bool,
    /// The peer's advertised pieces, updated on inbound Have.
    pub bitfield: Bitfield,
}

impl PeerSession {
    /// Connects to a peer and negotiates the session.
    ///
    /// Fails with [`PeerError::InfoHashMismatch`] if the peer answers for a
    /// different swarm, and with [`PeerError::ExpectedBitfield`] if the first
    /// message after the handshake is anything but a bitfield (a keep-alive
    /// included).
    pub async fn connect(
        addr: SocketAddr,
        info_hash: [u8; 20],
        peer_id: [u8; 20],
    ) -> Result<Self, PeerError> {
        let stream = timeout(CONNECT_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| PeerError::Timeout)??;
        let mut transport = PeerTransport::new(stream);

        let theirs = timeout(HANDSHAKE_TIMEOUT, async {
            transport
                .send_handshake(&Handshake::new(info_hash, peer_id))
                .await?;
            transport.receive_handshake().await
        })
        .await
        .map_err(|_| PeerError::Timeout)??;

        if theirs.info_hash != info_hash {
            return Err(PeerError::InfoHashMismatch);
        }

        let bitfield = match timeout(BITFIELD_TIMEOUT, transport.receive_message())
            .await
            .map_err(|_| PeerError::Timeout)??
        {
            Message::Bitfield(bits) => Bitfield::from_bytes(bits),
            other => return Err(PeerError::ExpectedBitfield(format!("{other:?}"))),
        };

        debug!(%addr, pieces = bitfield.count(), "peer session established");

        Ok(Self {
            transport,
            addr,
            choked: true,
            bitfield,
        })
    }

    /// Reads the next message. Keep-alives pass through as
    /// [`Message::KeepAlive`].
    pub async fn read(&mut self) -> Result<Message, PeerError> {
        self.transport.receive_message().await
    }

    /// Returns true if the peer advertises the piece.
    pub fn has_piece(&self, index: u32) -> bool {
        self.bitfield.has_piece(index as usize)
    }

    pub async fn send_request(
        &mut self,
        index: u32,
        begin: u32,
        length: u32,
    ) -> Result<(), PeerError> {
        self.transport
            .send_message(&Message::Request {
                index,
                begin,
                length,
            })
            .await
    }

    pub async fn send_have(&mut self, index: u32) -> Result<(), PeerError> {
        self.transport.send_message(&Message::Have { index }).await
    }

    pub async fn send_interested(&mut self) -> Result<(), PeerError> {
        self.transport.send_message(&Message::Interested).await
    }

    pub async fn send_not_interested(&mut self) -> Result<(), PeerError> {
        self.transport.send_message(&Message::NotInterested).await
    }

    pub async fn send_unchoke(&mut self) -> Result<(), PeerError> {
        self.transport.send_message(&Message::Unchoke).await
    }

    /// The peer's address, for log records.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }
}
