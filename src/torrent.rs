//! The download manifest.
//!
//! Everything the engine needs to join a swarm, already materialized by the
//! external collaborators: metainfo parsing supplies the hashes and lengths,
//! a tracker client supplies the peer list. Nothing here touches the
//! network.

use crate::peer::PeerId;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use thiserror::Error;

/// Errors in manifest data.
#[derive(Debug, Error)]
pub enum TorrentError {
    /// A compact peer list must be a whole number of 6-byte entries.
    #[error("malformed compact peer list: {0} bytes is not a multiple of 6")]
    MalformedPeerList(usize),

    /// The manifest carries no piece hashes.
    #[error("torrent has no pieces")]
    NoPieces,

    /// The piece count, piece length, and total length don't agree.
    #[error("{pieces} pieces of {piece_length} bytes cannot cover {total_length} bytes")]
    LengthMismatch {
        pieces: usize,
        piece_length: u32,
        total_length: u64,
    },
}

/// An immutable manifest for one swarm download.
#[derive(Debug, Clone)]
pub struct Torrent {
    /// 20-byte digest identifying the swarm.
    pub info_hash: [u8; 20],
    /// Our own 20-byte endpoint identifier.
    pub peer_id: PeerId,
    /// One SHA-1 digest per piece, in piece order.
    pub piece_hashes: Vec<[u8; 20]>,
    /// Nominal piece size in bytes; every piece but the last has exactly
    /// this size.
    pub piece_length: u32,
    /// Exact size of the complete file in bytes.
    pub total_length: u64,
    /// Display name, only used in log records.
    pub name: String,
    /// Endpoints to download from.
    pub peers: Vec<SocketAddr>,
}

impl Torrent {
    /// Number of pieces.
    pub fn piece_count(&self) -> usize {
        self.piece_hashes.len()
    }

    /// Byte range `[begin, end)` that piece `index` occupies in the file.
    pub fn piece_bounds(&self, index: u32) -> (u64, u64) {
        let begin = u64::from(index) * u64::from(self.piece_length);
        let end = (begin + u64::from(self.piece_length)).min(self.total_length);
        (begin, end)
    }

    /// Exact size of piece `index`; the last piece is usually shorter.
    pub fn piece_size(&self, index: u32) -> u32 {
        let (begin, end) = self.piece_bounds(index);
        (end - begin) as u32
    }

    /// Checks that the lengths and the piece count agree: the last piece
    /// must land in `(0, piece_length]` bytes.
    pub fn validate(&self) -> Result<(), TorrentError> {
        let pieces = self.piece_count() as u64;
        if pieces == 0 {
            return Err(TorrentError::NoPieces);
        }

        let piece_length = u64::from(self.piece_length);
        let full = (pieces - 1) * piece_length;
        if self.total_length <= full || self.total_length > pieces * piece_length {
            return Err(TorrentError::LengthMismatch {
                pieces: self.piece_count(),
                piece_length: self.piece_length,
                total_length: self.total_length,
            });
        }

        Ok(())
    }
}

/// Parses a compact peer list: consecutive 6-byte entries of 4 IPv4 octets
/// followed by a big-endian port.
pub fn peers_from_compact(buf: &[u8]) -> Result<Vec<SocketAddr>, TorrentError> {
    const ENTRY_LEN: usize = 6;

    if buf.len() % ENTRY_LEN != 0 {
        return Err(TorrentError::MalformedPeerList(buf.len()));
    }

    Ok(buf
        .chunks_exact(ENTRY_LEN)
        .map(|entry| {
            let ip = Ipv4Addr::new(entry[0], entry[1], entry[2], entry[3]);
            let port = u16::from_be_bytes([entry[4], entry[5]]);
            SocketAddr::new(IpAddr::V4(ip), port)
        })
        .collect())
}
