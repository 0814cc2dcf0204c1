use crate::container::header::ChunkHeader;
use crate::error::{PixError, Result};
use crate::layout::{Geometry, Protocol};
use crate::util::bits::{BitWriter, Bits, bytes_to_bits};
use crate::util::stream_id::StreamId;

/// Splits a framed byte stream into per-image sample grids.
///
/// Image `i` (1-based) carries bits `[(i-1)*bpi, i*bpi)` of the stream, after
/// the header when the protocol has one. The last image is zero-padded.
pub struct Chunker<'a> {
    bits: Bits<'a>,
    geometry: Geometry,
    stream_id: StreamId,
    total: u32,
}

impl<'a> Chunker<'a> {
    pub fn new(framed: &'a [u8], geometry: Geometry, stream_id: StreamId) -> Result<Self> {
        let bits = bytes_to_bits(framed);
        let total = geometry.total_images(bits.len());
        let total = u32::try_from(total).map_err(|_| {
            PixError::Config(format!("{total} images exceed the 32-bit sequence space"))
        })?;
        Ok(Self {
            bits,
            geometry,
            stream_id,
            total,
        })
    }

    pub fn total_images(&self) -> u32 {
        self.total
    }

    pub fn stream_id(&self) -> StreamId {
        self.stream_id
    }

    /// Row-major samples of image `sequence`, exactly `side * side` long.
    pub fn render(&self, sequence: u32) -> Result<Vec<u8>> {
        if sequence == 0 || sequence > self.total {
            return Err(PixError::SequenceIntegrity(format!(
                "sequence {sequence} outside 1..={}",
                self.total
            )));
        }
        let capacity = self.geometry.capacity_bits();
        let bpi = self.geometry.bits_per_image();
        let mut w = BitWriter::with_capacity_bits(capacity);
        if self.geometry.protocol() == Protocol::Headered {
            ChunkHeader {
                stream_id: self.stream_id,
                sequence,
            }
            .write_to(&mut w);
        }
        let start = (sequence as usize - 1) * bpi;
        w.extend_bits(self.bits.slice(start, bpi));
        w.pad_to(capacity);
        Ok(w.finish())
    }
}
