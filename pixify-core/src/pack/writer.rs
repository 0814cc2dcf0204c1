use crate::codec::{Raster, RasterCodec, RasterFormat, codec_for, write_raster};
use crate::container::frame::frame;
use crate::container::manifest::{self, MANIFEST_VERSION, Meta, StreamManifest};
use crate::error::{PixError, Result};
use crate::layout::{DEFAULT_SIDE, Geometry, Protocol, image_file_name};
use crate::pack::chunker::Chunker;
use crate::read::scan::discover;
use crate::util::stream_id::StreamId;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;
use tracing::{debug, info};

#[derive(Clone, Default)]
pub struct EncodeOptions {
    /// Raster side in samples; 0 means `DEFAULT_SIDE`.
    pub side: u32,
    pub format: RasterFormat,
    pub protocol: Protocol,
    /// Fixed stream id. A random one is drawn when `None`.
    pub stream_id: Option<StreamId>,
    /// When true, zero the manifest timestamp for deterministic output.
    pub deterministic: bool,
}

#[derive(Clone, Debug)]
pub struct EncodeReport {
    pub out_dir: PathBuf,
    pub stream_id: StreamId,
    pub images: u32,
    pub file_size: u64,
}

fn effective_side(opts: &EncodeOptions) -> u32 {
    if opts.side == 0 {
        DEFAULT_SIDE
    } else {
        opts.side
    }
}

/// Encode the file at `input` into images under `out_dir`.
pub fn encode(input: &Path, out_dir: &Path, opts: Option<&EncodeOptions>) -> Result<EncodeReport> {
    let data = fs::read(input)?;
    let source_name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());
    encode_inner(&data, source_name, out_dir, opts)
}

/// Encode an in-memory buffer into images under `out_dir`.
pub fn encode_bytes(
    data: &[u8],
    out_dir: &Path,
    opts: Option<&EncodeOptions>,
) -> Result<EncodeReport> {
    encode_inner(data, None, out_dir, opts)
}

fn encode_inner(
    data: &[u8],
    source_name: Option<String>,
    out_dir: &Path,
    opts: Option<&EncodeOptions>,
) -> Result<EncodeReport> {
    let defaults = EncodeOptions::default();
    let opts = opts.unwrap_or(&defaults);
    let geometry = Geometry::new(effective_side(opts), opts.protocol)?;
    let codec = codec_for(opts.format);

    prepare_destination(out_dir, codec)?;

    let stream_id = match opts.stream_id {
        Some(id) => id,
        None => StreamId::random()?,
    };
    let framed = frame(data);
    let chunker = Chunker::new(&framed, geometry, stream_id)?;
    let total = chunker.total_images();
    let side = geometry.side();
    info!(
        stream = %stream_id,
        bytes = data.len(),
        images = total,
        side,
        protocol = ?opts.protocol,
        "encoding"
    );

    // Each image depends only on the shared, read-only framed buffer.
    (1..=total).into_par_iter().try_for_each(|sequence| -> Result<()> {
        let raster = Raster::new(side, side, chunker.render(sequence)?)?;
        let path = out_dir.join(image_file_name(sequence, codec.extension()));
        write_raster(codec, &path, &raster)?;
        debug!(sequence, total, path = %path.display(), "wrote image");
        Ok(())
    })?;

    let created = if opts.deterministic {
        0
    } else {
        OffsetDateTime::now_utc().unix_timestamp()
    };
    let m = StreamManifest {
        version: MANIFEST_VERSION,
        protocol: opts.protocol,
        format: codec.format(),
        stream_id,
        side,
        images: total,
        file_size: data.len() as u64,
        blake3: *blake3::hash(data).as_bytes(),
        meta: Meta {
            created,
            tool: concat!("pixify-core/", env!("CARGO_PKG_VERSION")).to_string(),
            source_name,
        },
    };
    manifest::store(out_dir, &m)?;

    Ok(EncodeReport {
        out_dir: out_dir.to_path_buf(),
        stream_id,
        images: total,
        file_size: data.len() as u64,
    })
}

/// Create `out_dir` if needed and refuse one that already holds a stream,
/// so images of two encodings never share a directory.
fn prepare_destination(out_dir: &Path, codec: &dyn RasterCodec) -> Result<()> {
    fs::create_dir_all(out_dir)?;
    let occupied = manifest::manifest_path(out_dir).exists()
        || !discover(out_dir, codec.extension())?.is_empty();
    if occupied {
        return Err(PixError::DestinationOccupied(out_dir.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_side_means_default() {
        assert_eq!(effective_side(&EncodeOptions::default()), DEFAULT_SIDE);
        let opts = EncodeOptions {
            side: 16,
            ..Default::default()
        };
        assert_eq!(effective_side(&opts), 16);
    }

    #[test]
    fn occupied_destination_is_refused() {
        let dir = tempfile::tempdir().unwrap();
        let opts = EncodeOptions {
            side: 8,
            ..Default::default()
        };
        encode_bytes(b"first", dir.path(), Some(&opts)).unwrap();
        assert!(matches!(
            encode_bytes(b"second", dir.path(), Some(&opts)),
            Err(PixError::DestinationOccupied(_))
        ));
    }

    #[test]
    fn manifest_records_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let opts = EncodeOptions {
            side: 8,
            format: RasterFormat::Pgm,
            stream_id: Some(StreamId(0xfeed)),
            deterministic: true,
            ..Default::default()
        };
        let report = encode_bytes(&[3u8; 100], dir.path(), Some(&opts)).unwrap();
        assert_eq!(report.images, 3);

        let m = manifest::load(dir.path()).unwrap().unwrap();
        assert_eq!(m.stream_id, StreamId(0xfeed));
        assert_eq!(m.images, 3);
        assert_eq!(m.file_size, 100);
        assert_eq!(m.format, RasterFormat::Pgm);
        assert_eq!(m.meta.created, 0);
        assert_eq!(m.blake3, *blake3::hash(&[3u8; 100]).as_bytes());
    }
}
