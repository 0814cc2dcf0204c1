#![forbid(unsafe_code)]

pub mod domain;
pub mod error;
pub mod layout;

pub mod util {
    pub mod bits;
    pub mod stream_id;
}

pub mod codec;

pub mod container {
    pub mod frame;
    pub mod header;
    pub mod manifest;
}

pub mod pack {
    pub mod chunker;
    pub mod writer;
}

pub mod read {
    pub mod assemble;
    pub mod extract;
    pub mod scan;
}

pub mod list;

// Re-exports: stable API surface
pub use list::list;
pub use pack::writer::{EncodeOptions, EncodeReport, encode, encode_bytes};
pub use read::extract::{DecodeOptions, DecodeReport, decode, verify};
