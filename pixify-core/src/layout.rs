use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::container::header::HEADER_BITS;
use crate::error::{PixError, Result};

/// Default raster side (images are `DEFAULT_SIDE` x `DEFAULT_SIDE` samples).
pub const DEFAULT_SIDE: u32 = 2048;
pub const MAX_SIDE: u32 = 16384;

/// How images of one stream are ordered on decode.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Every image starts with a 96-bit stream id + sequence header.
    #[default]
    Headered,
    /// No in-image header; the sequence number lives in the `f{n}` file name.
    Headerless,
}

impl Protocol {
    pub fn header_bits(self) -> usize {
        match self {
            Protocol::Headered => HEADER_BITS,
            Protocol::Headerless => 0,
        }
    }
}

/// Capacity accounting for one image size and protocol.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Geometry {
    side: u32,
    protocol: Protocol,
}

impl Geometry {
    pub fn new(side: u32, protocol: Protocol) -> Result<Self> {
        if side == 0 || side > MAX_SIDE {
            return Err(PixError::Config(format!(
                "image side {side} outside 1..={MAX_SIDE}"
            )));
        }
        let g = Self { side, protocol };
        if g.capacity_bits() <= g.header_bits() {
            return Err(PixError::Config(format!(
                "{side}x{side} image leaves no room for payload after the header"
            )));
        }
        Ok(g)
    }

    pub fn side(&self) -> u32 {
        self.side
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// Samples (bytes) per image.
    pub fn samples(&self) -> usize {
        self.side as usize * self.side as usize
    }

    pub fn capacity_bits(&self) -> usize {
        self.samples() * 8
    }

    pub fn header_bits(&self) -> usize {
        self.protocol.header_bits()
    }

    pub fn bits_per_image(&self) -> usize {
        self.capacity_bits() - self.header_bits()
    }

    /// Images needed for `payload_bits`; a stream always has at least one.
    pub fn total_images(&self, payload_bits: usize) -> usize {
        payload_bits.div_ceil(self.bits_per_image()).max(1)
    }
}

/// File name of image `sequence`: `f{sequence}.{extension}`.
pub fn image_file_name(sequence: u32, extension: &str) -> String {
    format!("f{sequence}.{extension}")
}

/// Inverse of [`image_file_name`]; `None` unless the stem is `f` + digits.
pub fn sequence_from_file_name(path: &Path) -> Option<u32> {
    let digits = path.file_stem()?.to_str()?.strip_prefix('f')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}
