//! Size-prefixed framing.
//!
//! The framed stream is `len(file)` as an 8-byte big-endian integer followed
//! by the file bytes. The prefix lets the decoder drop raster padding.

use crate::error::{PixError, Result};

pub const SIZE_PREFIX_LEN: usize = 8;

pub fn frame(file: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(SIZE_PREFIX_LEN + file.len());
    out.extend_from_slice(&(file.len() as u64).to_be_bytes());
    out.extend_from_slice(file);
    out
}

/// Split a framed stream into its declared size and the bytes after the prefix.
pub fn unframe(framed: &[u8]) -> Result<(u64, &[u8])> {
    let Some((prefix, payload)) = framed.split_first_chunk::<SIZE_PREFIX_LEN>() else {
        return Err(PixError::MalformedStream { len: framed.len() });
    };
    Ok((u64::from_be_bytes(*prefix), payload))
}

pub fn truncate(payload: &[u8], declared: u64) -> Result<&[u8]> {
    match usize::try_from(declared) {
        Ok(n) if n <= payload.len() => Ok(&payload[..n]),
        _ => Err(PixError::Truncation {
            declared,
            available: payload.len() as u64,
        }),
    }
}
