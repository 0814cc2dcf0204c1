use crate::codec::read_raster;
use crate::container::header::ChunkHeader;
use crate::domain::ImageRow;
use crate::error::Result;
use crate::layout::{Protocol, sequence_from_file_name};
use crate::read::extract::{DecodeOptions, image_paths, resolve};
use crate::util::bits::bytes_to_bits;
use rayon::prelude::*;
use std::path::Path;

/// Describe every image in `dir`, ordered by sequence number.
///
/// Unlike `decode`, odd images (wrong size, unreadable header) are listed
/// rather than rejected; only unreadable files fail.
pub fn list(dir: &Path, opts: Option<&DecodeOptions>) -> Result<Vec<ImageRow>> {
    let defaults = DecodeOptions::default();
    let r = resolve(dir, opts.unwrap_or(&defaults))?;
    let paths = image_paths(dir, &r)?;

    let mut rows = paths
        .par_iter()
        .map(|p| -> Result<ImageRow> {
            let raster = read_raster(r.codec, p)?;
            let (sequence, stream_id) = match r.geometry.protocol() {
                Protocol::Headered => match ChunkHeader::read_from(bytes_to_bits(&raster.samples)) {
                    Some(h) => (Some(h.sequence), Some(h.stream_id)),
                    None => (None, None),
                },
                Protocol::Headerless => (sequence_from_file_name(p), None),
            };
            Ok(ImageRow {
                path: p.clone(),
                width: raster.width,
                height: raster.height,
                sequence,
                stream_id,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // unnumbered rows last
    rows.sort_by(|a, b| {
        (a.sequence.is_none(), a.sequence, &a.path)
            .cmp(&(b.sequence.is_none(), b.sequence, &b.path))
    });
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RasterFormat;
    use crate::pack::writer::{EncodeOptions, encode_bytes};

    #[test]
    fn unnumbered_images_sort_last() {
        let dir = tempfile::tempdir().unwrap();
        let enc = EncodeOptions {
            side: 8,
            format: RasterFormat::Pgm,
            protocol: Protocol::Headerless,
            ..Default::default()
        };
        encode_bytes(&[7u8; 150], dir.path(), Some(&enc)).unwrap();
        std::fs::copy(dir.path().join("f1.pgm"), dir.path().join("aaa.pgm")).unwrap();

        let rows = list(dir.path(), None).unwrap();
        let seqs: Vec<_> = rows.iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![Some(1), Some(2), Some(3), None]);
        assert!(rows[3].path.ends_with("aaa.pgm"));
    }
}
