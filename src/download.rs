//! The swarm download engine.
//!
//! One worker task per peer pulls pieces off a shared queue, drives the
//! pipelined block-request state machine against its session, and publishes
//! hash-verified pieces to the scheduler, which assembles them in memory.

mod engine;
mod error;
mod piece;
mod queue;

pub use engine::download;
pub use error::DownloadError;
pub use piece::{PieceResult, PieceWork};
