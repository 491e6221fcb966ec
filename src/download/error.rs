use crate::torrent::TorrentError;
use thiserror::Error;

/// Errors that can end a download.
///
/// Worker-local failures (transport errors, malformed messages, hash
/// mismatches) are not in here: they are logged, the piece goes back on the
/// work queue, and the swarm carries on.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// The manifest doesn't describe a downloadable file.
    #[error(transparent)]
    Manifest(#[from] TorrentError),

    /// Every peer worker exited while pieces were still outstanding; no
    /// progress is possible anymore.
    #[error("all peer workers exited with {remaining} pieces outstanding")]
    SwarmExhausted { remaining: usize },
}
