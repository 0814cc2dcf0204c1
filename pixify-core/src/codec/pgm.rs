//! Binary netpbm graymap (`P5`) with maxval 255.

use super::{Raster, RasterCodec, RasterFormat};
use crate::error::{PixError, Result};
use std::io::{Read, Write};

pub struct PgmCodec;

impl RasterCodec for PgmCodec {
    fn format(&self) -> RasterFormat {
        RasterFormat::Pgm
    }

    fn extension(&self) -> &'static str {
        "pgm"
    }

    fn encode(&self, raster: &Raster, dst: &mut dyn Write) -> Result<()> {
        write!(dst, "P5\n{} {}\n255\n", raster.width, raster.height)?;
        dst.write_all(&raster.samples)?;
        Ok(())
    }

    fn decode(&self, src: &mut dyn Read) -> Result<Raster> {
        let mut data = Vec::new();
        src.read_to_end(&mut data)?;

        let mut pos = 0usize;
        if next_token(&data, &mut pos)? != b"P5" {
            return Err(PixError::Format("not a binary PGM (P5)".into()));
        }
        let width = number(&data, &mut pos, "width")?;
        let height = number(&data, &mut pos, "height")?;
        let maxval = number(&data, &mut pos, "maxval")?;
        if maxval != 255 {
            return Err(PixError::Format(format!(
                "PGM maxval {maxval} unsupported, need 255"
            )));
        }
        // exactly one whitespace byte separates the header from the raster
        pos += 1;

        let need = width as usize * height as usize;
        let body = data
            .get(pos..pos + need)
            .ok_or_else(|| PixError::Format(format!("PGM raster short: need {need} samples")))?;
        Raster::new(width, height, body.to_vec())
    }
}

fn next_token<'a>(data: &'a [u8], pos: &mut usize) -> Result<&'a [u8]> {
    loop {
        while *pos < data.len() && data[*pos].is_ascii_whitespace() {
            *pos += 1;
        }
        if *pos < data.len() && data[*pos] == b'#' {
            while *pos < data.len() && data[*pos] != b'\n' {
                *pos += 1;
            }
        } else {
            break;
        }
    }
    let start = *pos;
    while *pos < data.len() && !data[*pos].is_ascii_whitespace() {
        *pos += 1;
    }
    if start == *pos {
        return Err(PixError::Format("PGM header ended early".into()));
    }
    Ok(&data[start..*pos])
}

fn number(data: &[u8], pos: &mut usize, field: &str) -> Result<u32> {
    let tok = next_token(data, pos)?;
    std::str::from_utf8(tok)
        .ok()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| PixError::Format(format!("PGM {field} is not a number")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_comments_are_skipped() {
        let mut data = b"P5\n# made by hand\n2 1\n255\n".to_vec();
        data.extend_from_slice(&[7, 9]);
        let r = PgmCodec.decode(&mut &data[..]).unwrap();
        assert_eq!((r.width, r.height), (2, 1));
        assert_eq!(r.samples, vec![7, 9]);
    }

    #[test]
    fn truncated_body_is_rejected() {
        let data = b"P5 4 4 255\n\x00\x01".to_vec();
        assert!(PgmCodec.decode(&mut &data[..]).is_err());
    }
}
