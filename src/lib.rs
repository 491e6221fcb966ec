//! remora - a file-swarm leecher core
//!
//! Given an immutable manifest of a file (piece hashes, lengths, a client
//! id, and peer endpoints), this library joins the swarm over the
//! BitTorrent v1 peer wire protocol, downloads every piece concurrently,
//! verifies each against its SHA-1 digest, and returns the reconstructed
//! file as one in-memory buffer.
//!
//! # Modules
//!
//! - [`torrent`] - The download manifest and peer-list helpers
//! - [`peer`] - Peer wire protocol: handshake, messages, bitfield, sessions
//! - [`download`] - The swarm scheduler and per-peer download workers
//! - [`constants`] - Timeouts and tuning parameters
//!
//! Peer discovery, metainfo parsing, and disk I/O are deliberately not
//! here; the manifest arrives materialized and the finished buffer leaves
//! the same way.

pub mod constants;
pub mod download;
pub mod peer;
pub mod torrent;

pub use download::{download, DownloadError, PieceResult, PieceWork};
pub use peer::{Bitfield, Handshake, Message, MessageId, PeerError, PeerId, PeerSession};
pub use torrent::{peers_from_compact, Torrent, TorrentError};
