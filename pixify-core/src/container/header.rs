use crate::util::bits::{BitWriter, Bits};
use crate::util::stream_id::StreamId;

pub const HEADER_BITS: usize = 96;
pub const HEADER_LEN: usize = HEADER_BITS / 8;

/// Per-image header: 64-bit stream id then 32-bit sequence number, both
/// big-endian, occupying the first 96 bits of the raster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    pub stream_id: StreamId,
    /// 1-based position of the image in its stream
    pub sequence: u32,
}

impl ChunkHeader {
    pub fn write_to(&self, w: &mut BitWriter) {
        w.write_uint(self.stream_id.0, 64);
        w.write_uint(u64::from(self.sequence), 32);
    }

    /// `None` if fewer than 96 bits are available.
    pub fn read_from(bits: Bits<'_>) -> Option<Self> {
        let stream_id = StreamId(bits.read_uint(0, 64)?);
        let sequence = u32::try_from(bits.read_uint(64, 32)?).ok()?;
        Some(Self {
            stream_id,
            sequence,
        })
    }
}
