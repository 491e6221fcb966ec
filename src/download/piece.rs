use crate::constants::{MAX_BACKLOG, MAX_BLOCK_SIZE, PIECE_DOWNLOAD_TIMEOUT};
use crate::peer::{Message, PeerError, PeerSession};
use sha1::{Digest, Sha1};
use tokio::time::timeout;

/// One piece to fetch. Moves between the work queue and workers; a failed
/// attempt puts it back on the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PieceWork {
    /// Piece index in `[0, piece_count)`.
    pub index: u32,
    /// Expected SHA-1 digest of the piece bytes.
    pub hash: [u8; 20],
    /// Exact size of this piece in bytes.
    pub length: u32,
}

impl PieceWork {
    /// Returns true if `data` hashes to the expected digest.
    pub fn verify(&self, data: &[u8]) -> bool {
        Sha1::digest(data).as_slice() == self.hash.as_slice()
    }
}

/// A downloaded and verified piece on its way to the assembler. The worker
/// hands the buffer over whole and keeps no reference to it.
#[derive(Debug, PartialEq, Eq)]
pub struct PieceResult {
    /// Piece index.
    pub index: u32,
    /// The piece bytes, exactly `piece_size(index)` of them.
    pub data: Vec<u8>,
}

// Transfer state for the one piece currently in flight on a session.
struct PieceProgress {
    index: u32,
    buf: Vec<u8>,
    downloaded: u32,
    requested: u32,
    backlog: u32,
}

impl PieceProgress {
    fn new(work: &PieceWork) -> Self {
        Self {
            index: work.index,
            buf: vec![0; work.length as usize],
            downloaded: 0,
            requested: 0,
            backlog: 0,
        }
    }

    /// Copies one Piece payload into the buffer.
    ///
    /// The block must belong to this piece and land entirely inside the
    /// buffer; anything else fails the whole attempt as a malformed message.
    fn ingest(&mut self, index: u32, begin: u32, data: &[u8]) -> Result<(), PeerError> {
        if index != self.index {
            return Err(PeerError::MalformedMessage(format!(
                "expected piece index {}, got {index}",
                self.index
            )));
        }
        let begin = begin as usize;
        if begin >= self.buf.len() {
            return Err(PeerError::MalformedMessage(format!(
                "begin offset too high: {begin} >= {}",
                self.buf.len()
            )));
        }
        if begin + data.len() > self.buf.len() {
            return Err(PeerError::MalformedMessage(format!(
                "block of {} bytes at offset {begin} overruns piece of {}",
                data.len(),
                self.buf.len()
            )));
        }

        self.buf[begin..begin + data.len()].copy_from_slice(data);
        self.downloaded += data.len() as u32;
        self.backlog = self.backlog.saturating_sub(1);
        Ok(())
    }
}

/// Downloads one complete piece over an established session.
///
/// Keeps up to [`MAX_BACKLOG`] Requests in flight while unchoked, each for
/// at most [`MAX_BLOCK_SIZE`] bytes, and absorbs inbound messages until the
/// buffer is full. The whole attempt runs under the 30-second piece
/// deadline; the deadline dies with this call, so an idle session carries
/// nothing over to the next piece.
pub(crate) async fn attempt_download(
    session: &mut PeerSession,
    work: &PieceWork,
) -> Result<Vec<u8>, PeerError> {
    let mut state = PieceProgress::new(work);

    timeout(PIECE_DOWNLOAD_TIMEOUT, drive(session, work, &mut state))
        .await
        .map_err(|_| PeerError::Timeout)??;

    Ok(state.buf)
}

async fn drive(
    session: &mut PeerSession,
    work: &PieceWork,
    state: &mut PieceProgress,
) -> Result<(), PeerError> {
    while state.downloaded < work.length {
        // While unchoked, keep the request pipeline full.
        if !session.choked {
            while state.backlog < MAX_BACKLOG && state.requested < work.length {
                let block_size = MAX_BLOCK_SIZE.min(work.length - state.requested);
                session
                    .send_request(work.index, state.requested, block_size)
                    .await?;
                state.backlog += 1;
                state.requested += block_size;
            }
        }

        match session.read().await? {
            Message::KeepAlive => {}
            Message::Choke => session.choked = true,
            Message::Unchoke => session.choked = false,
            Message::Have { index } => session.bitfield.set_piece(index as usize),
            Message::Piece { index, begin, data } => state.ingest(index, begin, &data)?,
            // Anything else a peer might send mid-download is none of our
            // business as a pure leecher.
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress() -> PieceProgress {
        PieceProgress::new(&PieceWork {
            index: 3,
            hash: [0; 20],
            length: 64,
        })
    }

    #[test]
    fn test_ingest_copies_block_and_updates_counters() {
        let mut state = progress();
        state.backlog = 2;

        state.ingest(3, 16, &[0xaa; 16]).unwrap();
        assert_eq!(state.downloaded, 16);
        assert_eq!(state.backlog, 1);
        assert_eq!(&state.buf[16..32], &[0xaa; 16]);
        assert_eq!(&state.buf[..16], &[0u8; 16]);
    }

    #[test]
    fn test_ingest_rejects_wrong_piece_index() {
        assert!(progress().ingest(4, 0, &[0; 8]).is_err());
    }

    #[test]
    fn test_ingest_rejects_begin_at_or_past_buffer_end() {
        assert!(progress().ingest(3, 64, &[]).is_err());
        assert!(progress().ingest(3, 65, &[0]).is_err());
    }

    #[test]
    fn test_ingest_rejects_overrunning_block() {
        assert!(progress().ingest(3, 56, &[0; 9]).is_err());
        assert!(progress().ingest(3, 56, &[0; 8]).is_ok());
    }

    #[test]
    fn test_verify_compares_sha1() {
        let data = b"piece payload";
        let work = PieceWork {
            index: 0,
            hash: Sha1::digest(data).into(),
            length: data.len() as u32,
        };
        assert!(work.verify(data));
        assert!(!work.verify(b"other payload"));
    }
}
