use super::error::DownloadError;
use super::piece::{attempt_download, PieceResult, PieceWork};
use super::queue::WorkQueue;
use crate::peer::PeerSession;
use crate::torrent::Torrent;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Downloads the complete file described by the manifest.
///
/// Spawns one worker task per peer, distributes the pieces over a shared
/// work queue, and assembles verified pieces into a single buffer of exactly
/// `total_length` bytes. Pieces complete in whatever order the swarm
/// delivers them; the buffer is ordered by piece index alone.
///
/// Progress depends on at least one live peer advertising each remaining
/// piece; a caller that cannot trust its swarm should wrap this future in a
/// timeout. If every worker dies first, the download fails with
/// [`DownloadError::SwarmExhausted`] rather than waiting forever.
pub async fn download(torrent: &Torrent) -> Result<Vec<u8>, DownloadError> {
    torrent.validate()?;

    let piece_count = torrent.piece_count();
    info!(
        name = %torrent.name,
        pieces = piece_count,
        peers = torrent.peers.len(),
        "starting download"
    );

    // Sized to hold every piece up front, so this loop never waits.
    let queue = Arc::new(WorkQueue::with_capacity(piece_count));
    for (index, hash) in torrent.piece_hashes.iter().enumerate() {
        let index = index as u32;
        queue.push(PieceWork {
            index,
            hash: *hash,
            length: torrent.piece_size(index),
        });
    }

    let (results_tx, mut results_rx) = mpsc::channel(piece_count);
    let live_workers = Arc::new(AtomicUsize::new(torrent.peers.len()));

    for &addr in &torrent.peers {
        let queue = Arc::clone(&queue);
        let results = results_tx.clone();
        let live = Arc::clone(&live_workers);
        let info_hash = torrent.info_hash;
        let peer_id = *torrent.peer_id.as_bytes();

        tokio::spawn(async move {
            run_worker(addr, info_hash, peer_id, queue, results).await;
            live.fetch_sub(1, Ordering::Relaxed);
        });
    }

    // The workers hold the only senders now; the channel closes exactly when
    // the last worker exits.
    drop(results_tx);

    let mut buf = vec![0u8; torrent.total_length as usize];
    let mut assembled = 0usize;

    while assembled < piece_count {
        let Some(result) = results_rx.recv().await else {
            queue.close();
            return Err(DownloadError::SwarmExhausted {
                remaining: piece_count - assembled,
            });
        };

        let (begin, end) = torrent.piece_bounds(result.index);
        buf[begin as usize..end as usize].copy_from_slice(&result.data);
        assembled += 1;

        info!(
            percent = (assembled * 100) as f64 / piece_count as f64,
            piece = result.index,
            workers = live_workers.load(Ordering::Relaxed),
            "downloaded piece"
        );
    }

    queue.close();
    Ok(buf)
}

/// One peer's download loop.
///
/// Failure policy: setup and transport errors end the worker, re-enqueueing
/// whatever piece it held. A hash mismatch only re-enqueues the piece, since
/// the peer may still be good for others. A piece the peer doesn't advertise
/// goes straight back for someone else.
pub(crate) async fn run_worker(
    addr: SocketAddr,
    info_hash: [u8; 20],
    peer_id: [u8; 20],
    queue: Arc<WorkQueue<PieceWork>>,
    results: mpsc::Sender<PieceResult>,
) {
    let mut session = match PeerSession::connect(addr, info_hash, peer_id).await {
        Ok(session) => session,
        Err(err) => {
            warn!(%addr, %err, "could not handshake with peer, disconnecting");
            return;
        }
    };

    if session.send_unchoke().await.is_err() || session.send_interested().await.is_err() {
        return;
    }

    while let Some(work) = queue.pop().await {
        if !session.has_piece(work.index) {
            queue.push(work);
            // The queue may hold nothing but pieces this peer lacks; the
            // pop/push cycle must not starve the runtime while it spins.
            tokio::task::yield_now().await;
            continue;
        }

        let data = match attempt_download(&mut session, &work).await {
            Ok(data) => data,
            Err(err) => {
                debug!(%addr, piece = work.index, %err, "piece download failed, dropping peer");
                queue.push(work);
                return;
            }
        };

        if !work.verify(&data) {
            warn!(%addr, piece = work.index, "piece failed hash verification");
            queue.push(work);
            continue;
        }

        if session.send_have(work.index).await.is_err() {
            queue.push(work);
            return;
        }

        if results
            .send(PieceResult {
                index: work.index,
                data,
            })
            .await
            .is_err()
        {
            // Scheduler already returned; nothing to publish to.
            return;
        }
    }
}
