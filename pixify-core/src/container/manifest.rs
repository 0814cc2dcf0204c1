use crate::codec::RasterFormat;
use crate::error::{PixError, Result};
use crate::layout::Protocol;
use crate::util::stream_id::StreamId;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const MANIFEST_NAME: &str = "stream.cbor";
pub const MANIFEST_VERSION: u16 = 1;

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub created: i64,
    pub tool: String,
    pub source_name: Option<String>,
}

/// Sidecar written next to the images of one stream.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct StreamManifest {
    pub version: u16,
    pub protocol: Protocol,
    pub format: RasterFormat,
    pub stream_id: StreamId,
    pub side: u32,
    pub images: u32,
    pub file_size: u64,
    /// BLAKE3 of the original file
    pub blake3: [u8; 32],
    pub meta: Meta,
}

impl StreamManifest {
    pub fn write_to(&self, w: impl Write) -> Result<()> {
        ciborium::ser::into_writer(self, w).map_err(|e| PixError::Manifest(e.to_string()))
    }

    pub fn read_from(r: impl Read) -> Result<Self> {
        let m: Self =
            ciborium::de::from_reader(r).map_err(|e| PixError::Manifest(e.to_string()))?;
        if m.version != MANIFEST_VERSION {
            return Err(PixError::Manifest(format!(
                "unsupported manifest version {}",
                m.version
            )));
        }
        Ok(m)
    }
}

pub fn manifest_path(dir: &Path) -> PathBuf {
    dir.join(MANIFEST_NAME)
}

/// Read the manifest of `dir`, if the encoder left one.
pub fn load(dir: &Path) -> Result<Option<StreamManifest>> {
    match File::open(manifest_path(dir)) {
        Ok(f) => StreamManifest::read_from(BufReader::new(f)).map(Some),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn store(dir: &Path, manifest: &StreamManifest) -> Result<()> {
    let mut w = BufWriter::new(File::create(manifest_path(dir))?);
    manifest.write_to(&mut w)?;
    w.flush()?;
    Ok(())
}
