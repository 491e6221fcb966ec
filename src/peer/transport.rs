use super::error::PeerError;
use super::message::{Handshake, Message};
use crate::constants::MAX_MESSAGE_SIZE;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Framed I/O over a peer connection.
///
/// Owns the stream and a read buffer; knows the two framings (the one-shot
/// handshake and length-prefixed messages) but nothing about deadlines.
/// Callers wrap each operation in the timeout the protocol phase calls for.
#[derive(Debug)]
pub struct PeerTransport {
    stream: TcpStream,
    read_buf: BytesMut,
}

impl PeerTransport {
    pub fn new(stream: TcpStream) -> Self {
        Self {
            stream,
            read_buf: BytesMut::with_capacity(32 * 1024),
        }
    }

    pub async fn send_handshake(&mut self, handshake: &Handshake) -> Result<(), PeerError> {
        self.stream.write_all(&handshake.encode()).await?;
        Ok(())
    }

    /// Reads one handshake frame.
    ///
    /// The frame length depends on the peer's `pstrlen` byte, so this reads
    /// that first and then the remaining `48 + pstrlen` bytes.
    pub async fn receive_handshake(&mut self) -> Result<Handshake, PeerError> {
        self.fill_buf(1).await?;
        let pstrlen = self.read_buf[0] as usize;
        if pstrlen == 0 {
            return Err(PeerError::InvalidHandshake);
        }

        let frame_len = 49 + pstrlen;
        self.fill_buf(frame_len).await?;

        let frame = self.read_buf.split_to(frame_len);
        Handshake::decode(&frame)
    }

    pub async fn send_message(&mut self, message: &Message) -> Result<(), PeerError> {
        self.stream.write_all(&message.encode()).await?;
        Ok(())
    }

    /// Reads one message frame. Blocks until a complete frame is buffered.
    pub async fn receive_message(&mut self) -> Result<Message, PeerError> {
        self.fill_buf(4).await?;

        let length = u32::from_be_bytes([
            self.read_buf[0],
            self.read_buf[1],
            self.read_buf[2],
            self.read_buf[3],
        ]) as usize;

        if length > MAX_MESSAGE_SIZE {
            return Err(PeerError::MalformedMessage(format!(
                "frame too large: {length}"
            )));
        }

        self.fill_buf(4 + length).await?;

        let frame = self.read_buf.split_to(4 + length);
        Message::decode(frame.freeze())
    }

    // Reads from the stream until at least `needed` bytes are buffered.
    async fn fill_buf(&mut self, needed: usize) -> Result<(), PeerError> {
        while self.read_buf.len() < needed {
            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(PeerError::ConnectionClosed);
            }
        }
        Ok(())
    }
}
