use crate::codec::{RasterCodec, RasterFormat, codec_for, read_raster};
use crate::container::manifest::{self, StreamManifest, manifest_path};
use crate::error::{PixError, Result};
use crate::layout::{DEFAULT_SIDE, Geometry, Protocol};
use crate::read::assemble::{Chunk, StreamCheck, reassemble};
use crate::read::scan::discover;
use crate::util::stream_id::StreamId;
use rayon::prelude::*;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Clone, Default)]
pub struct DecodeOptions {
    /// Expected raster side. `None` or 0 takes it from the manifest, else
    /// `DEFAULT_SIDE`.
    pub side: Option<u32>,
    pub format: Option<RasterFormat>,
    pub protocol: Option<Protocol>,
    /// Accept images whose stream id disagrees with the rest.
    pub lenient: bool,
    /// Do not compare the result against the manifest digest.
    pub skip_digest: bool,
}

#[derive(Clone, Debug)]
pub struct DecodeReport {
    pub images: u32,
    pub file_size: u64,
    pub stream_id: Option<StreamId>,
    /// BLAKE3 of the reconstructed file, hex
    pub digest: String,
    /// True when the digest was checked against a manifest.
    pub verified: bool,
}

/// Settings for one directory after merging caller options with the manifest.
pub(crate) struct Resolved {
    pub geometry: Geometry,
    pub codec: &'static dyn RasterCodec,
    pub manifest: Option<StreamManifest>,
}

pub(crate) fn resolve(dir: &Path, opts: &DecodeOptions) -> Result<Resolved> {
    let manifest = manifest::load(dir)?;
    let recorded = manifest.as_ref();

    let protocol = match (opts.protocol, recorded) {
        (Some(requested), Some(m)) if requested != m.protocol => {
            return Err(PixError::ProtocolMismatch {
                requested,
                recorded: m.protocol,
            });
        }
        (Some(p), _) => p,
        (None, Some(m)) => m.protocol,
        (None, None) => Protocol::default(),
    };
    let side = match (opts.side.filter(|&s| s != 0), recorded) {
        (Some(expected), Some(m)) if expected != m.side => {
            return Err(PixError::DimensionMismatch {
                path: manifest_path(dir),
                expected,
                width: m.side,
                height: m.side,
            });
        }
        (Some(s), _) => s,
        (None, Some(m)) => m.side,
        (None, None) => DEFAULT_SIDE,
    };
    let format = match (opts.format, recorded) {
        (Some(requested), Some(m)) if requested != m.format => {
            return Err(PixError::Config(format!(
                "requested {requested:?} images, manifest records {:?}",
                m.format
            )));
        }
        (Some(f), _) => f,
        (None, Some(m)) => m.format,
        (None, None) => RasterFormat::default(),
    };

    Ok(Resolved {
        geometry: Geometry::new(side, protocol)?,
        codec: codec_for(format),
        manifest,
    })
}

fn read_chunk(path: &Path, r: &Resolved) -> Result<Chunk> {
    let raster = read_raster(r.codec, path)?;
    let side = r.geometry.side();
    if raster.width != side || raster.height != side {
        return Err(PixError::DimensionMismatch {
            path: path.to_path_buf(),
            expected: side,
            width: raster.width,
            height: raster.height,
        });
    }
    let chunk = Chunk::from_samples(path.to_path_buf(), raster.samples, &r.geometry)?;
    debug!(path = %path.display(), sequence = chunk.sequence, "read image");
    Ok(chunk)
}

pub(crate) fn image_paths(dir: &Path, r: &Resolved) -> Result<Vec<PathBuf>> {
    let paths = discover(dir, r.codec.extension())?;
    if paths.is_empty() {
        info!(dir = %dir.display(), ext = r.codec.extension(), "no images");
        return Err(PixError::EmptySequence);
    }
    Ok(paths)
}

fn reconstruct(dir: &Path, opts: &DecodeOptions) -> Result<(Vec<u8>, DecodeReport)> {
    let r = resolve(dir, opts)?;
    let paths = image_paths(dir, &r)?;

    // Every image is read and parsed independently.
    let chunks = paths
        .par_iter()
        .map(|p| read_chunk(p, &r))
        .collect::<Result<Vec<_>>>()?;

    let check = StreamCheck {
        expected: r.manifest.as_ref().map(|m| m.stream_id),
        lenient: opts.lenient,
        images: r.manifest.as_ref().map(|m| m.images),
    };
    let assembled = reassemble(chunks, &r.geometry, &check)?;
    let hash = blake3::hash(&assembled.bytes);

    let verified = match &r.manifest {
        Some(m) if !opts.skip_digest => {
            if m.file_size != assembled.bytes.len() as u64 || m.blake3 != *hash.as_bytes() {
                return Err(PixError::DigestMismatch);
            }
            true
        }
        _ => false,
    };

    let report = DecodeReport {
        images: assembled.images,
        file_size: assembled.bytes.len() as u64,
        stream_id: assembled.stream_id,
        digest: hash.to_hex().to_string(),
        verified,
    };
    Ok((assembled.bytes, report))
}

/// Rebuild the file encoded in `in_dir` and write it to `out`.
///
/// Nothing is written unless the whole file was reassembled; the output goes
/// through a temp file in the same directory and is renamed into place.
pub fn decode(in_dir: &Path, out: &Path, opts: Option<&DecodeOptions>) -> Result<DecodeReport> {
    let defaults = DecodeOptions::default();
    let opts = opts.unwrap_or(&defaults);
    let (bytes, report) = reconstruct(in_dir, opts)?;
    write_atomically(out, &bytes)?;
    info!(
        out = %out.display(),
        bytes = report.file_size,
        images = report.images,
        verified = report.verified,
        "decoded"
    );
    Ok(report)
}

/// Decode `in_dir` in memory and check it against its manifest, writing nothing.
pub fn verify(in_dir: &Path, opts: Option<&DecodeOptions>) -> Result<DecodeReport> {
    let defaults = DecodeOptions::default();
    let (_, report) = reconstruct(in_dir, opts.unwrap_or(&defaults))?;
    Ok(report)
}

fn write_atomically(out: &Path, bytes: &[u8]) -> Result<()> {
    let parent = match out.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)?;
    let mut tmp = tempfile::NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(out).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pack::writer::{EncodeOptions, encode_bytes};

    fn small(format: RasterFormat, protocol: Protocol) -> EncodeOptions {
        EncodeOptions {
            side: 8,
            format,
            protocol,
            ..Default::default()
        }
    }

    #[test]
    fn manifest_fills_in_unset_options() {
        let dir = tempfile::tempdir().unwrap();
        let enc = small(RasterFormat::Pgm, Protocol::Headerless);
        encode_bytes(b"abc", dir.path(), Some(&enc)).unwrap();

        let r = resolve(dir.path(), &DecodeOptions::default()).unwrap();
        assert_eq!(r.geometry.side(), 8);
        assert_eq!(r.geometry.protocol(), Protocol::Headerless);
        assert_eq!(r.codec.format(), RasterFormat::Pgm);
    }

    #[test]
    fn zero_side_means_unset() {
        let dir = tempfile::tempdir().unwrap();
        encode_bytes(b"abc", dir.path(), Some(&small(RasterFormat::Png, Protocol::Headered)))
            .unwrap();
        let zero = DecodeOptions {
            side: Some(0),
            ..Default::default()
        };
        assert_eq!(resolve(dir.path(), &zero).unwrap().geometry.side(), 8);

        let empty = tempfile::tempdir().unwrap();
        assert_eq!(
            resolve(empty.path(), &zero).unwrap().geometry.side(),
            DEFAULT_SIDE
        );
    }

    #[test]
    fn contradicting_the_manifest_fails() {
        let dir = tempfile::tempdir().unwrap();
        encode_bytes(b"abc", dir.path(), Some(&small(RasterFormat::Png, Protocol::Headered)))
            .unwrap();

        let wrong_protocol = DecodeOptions {
            protocol: Some(Protocol::Headerless),
            ..Default::default()
        };
        assert!(matches!(
            resolve(dir.path(), &wrong_protocol),
            Err(PixError::ProtocolMismatch { .. })
        ));

        let wrong_side = DecodeOptions {
            side: Some(16),
            ..Default::default()
        };
        assert!(matches!(
            resolve(dir.path(), &wrong_side),
            Err(PixError::DimensionMismatch { expected: 16, .. })
        ));

        let wrong_format = DecodeOptions {
            format: Some(RasterFormat::Pgm),
            ..Default::default()
        };
        assert!(matches!(
            resolve(dir.path(), &wrong_format),
            Err(PixError::Config(_))
        ));
    }

    #[test]
    fn failed_decode_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("restored.bin");
        assert!(matches!(
            decode(dir.path(), &out, None),
            Err(PixError::EmptySequence)
        ));
        assert!(!out.exists());
    }
}
