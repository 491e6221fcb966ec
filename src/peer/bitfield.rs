use bytes::Bytes;

/// A peer's piece availability.
///
/// One bit per piece, numbered from the high bit of the first byte. The
/// capacity is whatever the underlying bytes hold: peers commonly send a
/// bitfield padded to a whole number of bytes, so indices past the piece
/// count are tolerated on receive. Out-of-range reads are `false` and
/// out-of-range writes are no-ops; the wire is lax here and so are we.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitfield {
    bits: Vec<u8>,
}

impl Bitfield {
    /// Creates an empty bitfield with room for `piece_count` pieces.
    ///
    /// All bits start cleared, including the spare bits of the last byte,
    /// which must stay zero on the wire.
    pub fn for_pieces(piece_count: usize) -> Self {
        Self {
            bits: vec![0; piece_count.div_ceil(8)],
        }
    }

    /// Wraps the raw bytes of a received Bitfield message.
    pub fn from_bytes(bytes: Bytes) -> Self {
        Self {
            bits: bytes.to_vec(),
        }
    }

    /// Returns true if the bit for `index` is set. False for any index past
    /// the capacity.
    pub fn has_piece(&self, index: usize) -> bool {
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);
        match self.bits.get(byte_index) {
            Some(byte) => (byte >> bit_index) & 1 == 1,
            None => false,
        }
    }

    /// Sets the bit for `index`. Ignores any index past the capacity.
    pub fn set_piece(&mut self, index: usize) {
        let byte_index = index / 8;
        let bit_index = 7 - (index % 8);
        if let Some(byte) = self.bits.get_mut(byte_index) {
            *byte |= 1 << bit_index;
        }
    }

    /// Number of set bits.
    pub fn count(&self) -> usize {
        self.bits.iter().map(|b| b.count_ones() as usize).sum()
    }

    /// The raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bits
    }
}
