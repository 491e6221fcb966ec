//! Protocol constants and tuning parameters.
//!
//! Timeouts follow the values that have proven enough in practice: a few
//! seconds to tell a dead endpoint from a slow one during setup, and half a
//! minute for a whole piece, which covers a 256 KiB piece on even a slow
//! link.

use std::time::Duration;

// ============================================================================
// Timeouts
// ============================================================================

/// TCP connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);

/// Read/write timeout for the handshake exchange.
pub const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(3);

/// Read timeout for the initial bitfield message.
pub const BITFIELD_TIMEOUT: Duration = Duration::from_secs(5);

/// Deadline for downloading one complete piece. Gets unresponsive peers
/// unstuck; reset for every piece and not in force between pieces.
pub const PIECE_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// Pipelining
// ============================================================================

/// Largest number of bytes a single Request may ask for (16 KiB).
pub const MAX_BLOCK_SIZE: u32 = 16384;

/// Number of unfulfilled Requests a worker keeps in its pipeline.
pub const MAX_BACKLOG: u32 = 5;

// ============================================================================
// Framing limits
// ============================================================================

/// Upper sanity bound on a single message frame (16 MiB). Anything larger
/// is a protocol violation rather than a legitimate bitfield or block.
pub const MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;
