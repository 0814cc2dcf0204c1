use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{PixError, Result};

/// 64-bit tag shared by every image of one encoded file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StreamId(pub u64);

impl StreamId {
    /// Fresh identifier from the OS entropy source.
    pub fn random() -> Result<Self> {
        let mut buf = [0u8; 8];
        getrandom::getrandom(&mut buf)?;
        Ok(Self(u64::from_be_bytes(buf)))
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0.to_be_bytes()))
    }
}

impl FromStr for StreamId {
    type Err = PixError;

    fn from_str(s: &str) -> Result<Self> {
        let bytes =
            hex::decode(s.trim()).map_err(|e| PixError::Config(format!("invalid stream id: {e}")))?;
        let bytes: [u8; 8] = bytes.try_into().map_err(|b: Vec<u8>| {
            PixError::Config(format!(
                "stream id is 8 bytes (16 hex chars), got {}",
                b.len()
            ))
        })?;
        Ok(Self(u64::from_be_bytes(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_sixteen_hex_chars() {
        let id = StreamId(0x00ab_cdef_0123_4567);
        assert_eq!(id.to_string(), "00abcdef01234567");
        assert_eq!("00abcdef01234567".parse::<StreamId>().unwrap(), id);
    }

    #[test]
    fn rejects_wrong_width_and_garbage() {
        assert_eq!(" 0000000000000001\n".parse::<StreamId>().unwrap(), StreamId(1));
        assert!("beef".parse::<StreamId>().is_err());
        assert!("00000000000000000000".parse::<StreamId>().is_err());
        assert!("zzzzzzzzzzzzzzzz".parse::<StreamId>().is_err());
    }

    #[test]
    fn random_ids_differ() {
        let a = StreamId::random().unwrap();
        let b = StreamId::random().unwrap();
        assert_ne!(a, b);
    }
}
