//! Order-independent reassembly of image chunks into the original file.
//!
//! Chunks are placed into write-once slots addressed by sequence number. A
//! set is accepted only when its sequence numbers are exactly `1..=N`.

use crate::container::frame::{SIZE_PREFIX_LEN, truncate, unframe};
use crate::container::header::ChunkHeader;
use crate::error::{PixError, Result};
use crate::layout::{Geometry, Protocol, sequence_from_file_name};
use crate::util::bits::{BitWriter, Bits, bytes_to_bits};
use crate::util::stream_id::StreamId;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::warn;

/// Samples of one image plus the ordering data extracted from it.
#[derive(Debug, Clone)]
pub struct Chunk {
    pub origin: PathBuf,
    pub sequence: u32,
    /// `None` for header-less images
    pub stream_id: Option<StreamId>,
    samples: Vec<u8>,
}

impl Chunk {
    /// Interpret a full sample grid according to `geometry`'s protocol.
    /// Header-less images take their sequence from `origin`'s file name.
    pub fn from_samples(origin: PathBuf, samples: Vec<u8>, geometry: &Geometry) -> Result<Self> {
        if samples.len() != geometry.samples() {
            return Err(PixError::Format(format!(
                "{}: {} samples, expected {}",
                origin.display(),
                samples.len(),
                geometry.samples()
            )));
        }
        match geometry.protocol() {
            Protocol::Headered => {
                let header = ChunkHeader::read_from(bytes_to_bits(&samples)).ok_or_else(|| {
                    PixError::Format(format!("{}: no room for a header", origin.display()))
                })?;
                Ok(Self {
                    origin,
                    sequence: header.sequence,
                    stream_id: Some(header.stream_id),
                    samples,
                })
            }
            Protocol::Headerless => {
                let sequence = sequence_from_file_name(&origin)
                    .ok_or_else(|| PixError::ImageName(origin.clone()))?;
                Ok(Self {
                    origin,
                    sequence,
                    stream_id: None,
                    samples,
                })
            }
        }
    }

    fn payload(&self, geometry: &Geometry) -> Bits<'_> {
        bytes_to_bits(&self.samples).slice(geometry.header_bits(), geometry.bits_per_image())
    }
}

/// What the reassembler should enforce beyond sequence density.
#[derive(Clone, Debug, Default)]
pub struct StreamCheck {
    /// Id every headered chunk must carry; the most frequent id when `None`.
    pub expected: Option<StreamId>,
    /// Warn instead of failing on stream id disagreements.
    pub lenient: bool,
    /// Exact image count recorded by the encoder, if known.
    pub images: Option<u32>,
}

#[derive(Debug)]
pub struct Assembled {
    pub bytes: Vec<u8>,
    pub stream_id: Option<StreamId>,
    pub images: u32,
}

pub fn reassemble(chunks: Vec<Chunk>, geometry: &Geometry, check: &StreamCheck) -> Result<Assembled> {
    if chunks.is_empty() {
        return Err(PixError::EmptySequence);
    }
    let n = chunks.len();
    if let Some(recorded) = check.images {
        if recorded as usize != n {
            return Err(PixError::SequenceIntegrity(format!(
                "found {n} images, encoder wrote {recorded}"
            )));
        }
    }
    let stream_id = resolve_stream(&chunks, check)?;

    let mut slots: Vec<Option<Chunk>> = Vec::new();
    slots.resize_with(n, || None);
    for chunk in chunks {
        let idx = (chunk.sequence as usize)
            .checked_sub(1)
            .filter(|&i| i < n)
            .ok_or_else(|| {
                PixError::SequenceIntegrity(format!(
                    "{}: sequence {} outside 1..={n}",
                    chunk.origin.display(),
                    chunk.sequence
                ))
            })?;
        if let Some(prev) = &slots[idx] {
            return Err(PixError::SequenceIntegrity(format!(
                "sequence {} claimed by both {} and {}",
                chunk.sequence,
                prev.origin.display(),
                chunk.origin.display()
            )));
        }
        slots[idx] = Some(chunk);
    }

    // n chunks, each in 1..=n, no repeats: every slot is filled.
    let mut w = BitWriter::with_capacity_bits(n * geometry.bits_per_image());
    for chunk in slots.iter().flatten() {
        w.extend_bits(chunk.payload(geometry));
    }
    let mut bytes = w.finish();

    let file_len = {
        let (declared, payload) = unframe(&bytes)?;
        truncate(payload, declared)?.len()
    };
    bytes.drain(..SIZE_PREFIX_LEN);
    bytes.truncate(file_len);

    Ok(Assembled {
        bytes,
        stream_id,
        images: n as u32,
    })
}

fn resolve_stream(chunks: &[Chunk], check: &StreamCheck) -> Result<Option<StreamId>> {
    let mut counts: HashMap<StreamId, usize> = HashMap::new();
    for id in chunks.iter().filter_map(|c| c.stream_id) {
        *counts.entry(id).or_default() += 1;
    }
    // ties go to the smaller id so the choice does not depend on discovery order
    let majority = counts
        .iter()
        .max_by(|a, b| a.1.cmp(b.1).then(b.0.cmp(a.0)))
        .map(|(id, _)| *id);
    let Some(expected) = check.expected.or(majority) else {
        return Ok(None);
    };

    for chunk in chunks {
        let Some(found) = chunk.stream_id else {
            continue;
        };
        if found == expected {
            continue;
        }
        if check.lenient {
            warn!(path = %chunk.origin.display(), %found, %expected, "foreign stream id");
        } else {
            return Err(PixError::StreamIdentifierMismatch {
                path: chunk.origin.clone(),
                expected,
                found,
            });
        }
    }
    Ok(Some(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::frame::frame;
    use crate::pack::chunker::Chunker;

    fn geometry() -> Geometry {
        Geometry::new(8, Protocol::Headered).unwrap()
    }

    fn chunks_for(data: &[u8], id: StreamId) -> Vec<Chunk> {
        let framed = frame(data);
        let c = Chunker::new(&framed, geometry(), id).unwrap();
        (1..=c.total_images())
            .map(|seq| {
                let origin = PathBuf::from(format!("img{seq}"));
                Chunk::from_samples(origin, c.render(seq).unwrap(), &geometry()).unwrap()
            })
            .collect()
    }

    #[test]
    fn any_order_gives_the_same_bytes() {
        let data: Vec<u8> = (0..200u8).collect();
        let mut chunks = chunks_for(&data, StreamId(5));
        assert_eq!(chunks.len(), 4);
        chunks.swap(0, 3);
        chunks.swap(1, 2);
        let out = reassemble(chunks, &geometry(), &StreamCheck::default()).unwrap();
        assert_eq!(out.bytes, data);
        assert_eq!(out.stream_id, Some(StreamId(5)));
        assert_eq!(out.images, 4);
    }

    #[test]
    fn duplicate_sequence_is_rejected() {
        let mut chunks = chunks_for(&[1u8; 100], StreamId(5));
        let dup = chunks[0].clone();
        chunks[1] = dup;
        assert!(matches!(
            reassemble(chunks, &geometry(), &StreamCheck::default()),
            Err(PixError::SequenceIntegrity(_))
        ));
    }

    #[test]
    fn foreign_stream_is_rejected_unless_lenient() {
        let mut chunks = chunks_for(&[1u8; 100], StreamId(5));
        chunks[2].stream_id = Some(StreamId(6));

        let strict = reassemble(chunks.clone(), &geometry(), &StreamCheck::default());
        assert!(matches!(
            strict,
            Err(PixError::StreamIdentifierMismatch {
                expected: StreamId(5),
                found: StreamId(6),
                ..
            })
        ));

        let lenient = StreamCheck {
            lenient: true,
            ..Default::default()
        };
        let out = reassemble(chunks, &geometry(), &lenient).unwrap();
        assert_eq!(out.bytes, vec![1u8; 100]);
    }

    #[test]
    fn expected_id_overrides_the_majority() {
        let mut chunks = chunks_for(&[1u8; 100], StreamId(5));
        chunks[0].stream_id = Some(StreamId(7));
        let check = StreamCheck {
            expected: Some(StreamId(7)),
            ..Default::default()
        };
        assert!(matches!(
            reassemble(chunks, &geometry(), &check),
            Err(PixError::StreamIdentifierMismatch {
                expected: StreamId(7),
                found: StreamId(5),
                ..
            })
        ));
    }

    #[test]
    fn recorded_image_count_catches_a_missing_tail() {
        let mut chunks = chunks_for(&[9u8; 100], StreamId(5));
        chunks.pop();
        let check = StreamCheck {
            images: Some(3),
            ..Default::default()
        };
        assert!(matches!(
            reassemble(chunks, &geometry(), &check),
            Err(PixError::SequenceIntegrity(_))
        ));
    }

    #[test]
    fn nothing_to_assemble() {
        assert!(matches!(
            reassemble(Vec::new(), &geometry(), &StreamCheck::default()),
            Err(PixError::EmptySequence)
        ));
    }

    #[test]
    fn headerless_chunks_order_by_file_name() {
        let g = Geometry::new(4, Protocol::Headerless).unwrap();
        let framed = frame(b"header-less stream");
        let c = Chunker::new(&framed, g, StreamId(0)).unwrap();
        assert_eq!(c.total_images(), 2);
        let chunks = vec![
            Chunk::from_samples("out/f2.png".into(), c.render(2).unwrap(), &g).unwrap(),
            Chunk::from_samples("out/f1.png".into(), c.render(1).unwrap(), &g).unwrap(),
        ];
        let out = reassemble(chunks, &g, &StreamCheck::default()).unwrap();
        assert_eq!(out.bytes, b"header-less stream");
        assert_eq!(out.stream_id, None);
    }
}
