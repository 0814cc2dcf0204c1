use super::{Raster, RasterCodec, RasterFormat};
use crate::error::{PixError, Result};
use crate::layout::MAX_SIDE;
use std::io::{Read, Write};

pub struct PngCodec;

impl RasterCodec for PngCodec {
    fn format(&self) -> RasterFormat {
        RasterFormat::Png
    }

    fn extension(&self) -> &'static str {
        "png"
    }

    fn encode(&self, raster: &Raster, dst: &mut dyn Write) -> Result<()> {
        let mut enc = ::png::Encoder::new(dst, raster.width, raster.height);
        enc.set_color(::png::ColorType::Grayscale);
        enc.set_depth(::png::BitDepth::Eight);
        let mut w = enc.write_header()?;
        w.write_image_data(&raster.samples)?;
        w.finish()?;
        Ok(())
    }

    fn decode(&self, src: &mut dyn Read) -> Result<Raster> {
        // Largest accepted raster plus headroom for the decoder's own buffers.
        let mut limits = ::png::Limits::default();
        limits.bytes = (MAX_SIDE as usize).pow(2) * 2;
        let mut dec = ::png::Decoder::new_with_limits(src, limits);
        dec.set_transformations(::png::Transformations::IDENTITY);
        let mut reader = dec.read_info()?;
        let mut buf = vec![0u8; reader.output_buffer_size()];
        let info = reader.next_frame(&mut buf)?;
        if info.color_type != ::png::ColorType::Grayscale || info.bit_depth != ::png::BitDepth::Eight
        {
            return Err(PixError::Format(format!(
                "expected 8-bit grayscale PNG, got {:?} at {:?}",
                info.color_type, info.bit_depth
            )));
        }
        buf.truncate(info.buffer_size());
        Raster::new(info.width, info.height, buf)
    }
}
