use crate::error::{PixError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[repr(u8)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RasterFormat {
    #[default]
    Png = 0,
    Pgm = 1,
}

/// Single-channel 8-bit sample grid, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raster {
    pub width: u32,
    pub height: u32,
    pub samples: Vec<u8>,
}

impl Raster {
    pub fn new(width: u32, height: u32, samples: Vec<u8>) -> Result<Self> {
        if samples.len() != width as usize * height as usize {
            return Err(PixError::Format(format!(
                "{} samples do not fill a {width}x{height} raster",
                samples.len()
            )));
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }
}

/// Lossless grayscale image format.
pub trait RasterCodec: Send + Sync {
    fn format(&self) -> RasterFormat;
    /// File extension without the dot, lower case.
    fn extension(&self) -> &'static str;
    fn encode(&self, raster: &Raster, dst: &mut dyn Write) -> Result<()>;
    fn decode(&self, src: &mut dyn Read) -> Result<Raster>;
}

pub fn codec_for(format: RasterFormat) -> &'static dyn RasterCodec {
    match format {
        RasterFormat::Png => &self::png::PngCodec,
        RasterFormat::Pgm => &self::pgm::PgmCodec,
    }
}

pub fn write_raster(codec: &dyn RasterCodec, path: &Path, raster: &Raster) -> Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    codec.encode(raster, &mut w)?;
    w.flush()?;
    Ok(())
}

pub fn read_raster(codec: &dyn RasterCodec, path: &Path) -> Result<Raster> {
    let mut r = BufReader::new(File::open(path)?);
    codec.decode(&mut r)
}

pub mod pgm;
pub mod png;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_codecs_preserve_every_sample_value() {
        let samples: Vec<u8> = (0..=255u8).collect();
        let raster = Raster::new(16, 16, samples).unwrap();
        for format in [RasterFormat::Png, RasterFormat::Pgm] {
            let codec = codec_for(format);
            let mut buf = Vec::new();
            codec.encode(&raster, &mut buf).unwrap();
            let back = codec.decode(&mut &buf[..]).unwrap();
            assert_eq!(back, raster, "{format:?}");
        }
    }

    #[test]
    fn raster_rejects_short_sample_buffers() {
        assert!(Raster::new(4, 4, vec![0; 15]).is_err());
    }
}
