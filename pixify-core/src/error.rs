use std::path::PathBuf;

use thiserror::Error;

use crate::layout::Protocol;
use crate::util::stream_id::StreamId;

#[derive(Error, Debug)]
pub enum PixError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Configuration error: {0}")]
    Config(String),

    /// Fewer than 8 bytes were left for the size prefix.
    #[error("malformed stream: {len} bytes, size prefix needs 8")]
    MalformedStream { len: usize },

    /// The size prefix claims more bytes than the images carry.
    #[error("truncated stream: declared {declared} bytes, only {available} available")]
    Truncation { declared: u64, available: u64 },

    #[error("no images found")]
    EmptySequence,

    #[error("sequence integrity: {0}")]
    SequenceIntegrity(String),

    #[error("{}: raster is {width}x{height}, expected {expected}x{expected}", path.display())]
    DimensionMismatch {
        path: PathBuf,
        expected: u32,
        width: u32,
        height: u32,
    },

    #[error("{}: stream id {found} does not match {expected}", path.display())]
    StreamIdentifierMismatch {
        path: PathBuf,
        expected: StreamId,
        found: StreamId,
    },

    #[error("protocol mismatch: requested {requested:?}, manifest records {recorded:?}")]
    ProtocolMismatch {
        requested: Protocol,
        recorded: Protocol,
    },

    #[error("digest mismatch: reconstructed file does not match the manifest")]
    DigestMismatch,

    #[error("destination {} already holds an encoded stream", .0.display())]
    DestinationOccupied(PathBuf),

    #[error("{}: cannot read sequence number from file name", .0.display())]
    ImageName(PathBuf),

    #[error("manifest error: {0}")]
    Manifest(String),

    #[error("directory walk: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("PNG encode: {0}")]
    PngEncode(#[from] png::EncodingError),

    #[error("PNG decode: {0}")]
    PngDecode(#[from] png::DecodingError),

    #[error("entropy source: {0}")]
    Entropy(#[from] getrandom::Error),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, PixError>;
