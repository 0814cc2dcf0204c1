use clap::{Args, Parser, Subcommand, ValueEnum};
use pixify_core::codec::RasterFormat;
use pixify_core::layout::{DEFAULT_SIDE, Protocol};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "pixify: files as grayscale image sequences", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Png,
    Pgm,
}

impl From<FormatArg> for RasterFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Png => RasterFormat::Png,
            FormatArg::Pgm => RasterFormat::Pgm,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ProtocolArg {
    /// 96-bit stream id + sequence header inside every image
    Headered,
    /// sequence taken from the f<N> file name
    Headerless,
}

impl From<ProtocolArg> for Protocol {
    fn from(p: ProtocolArg) -> Self {
        match p {
            ProtocolArg::Headered => Protocol::Headered,
            ProtocolArg::Headerless => Protocol::Headerless,
        }
    }
}

/// How to read an image directory. Unset values come from its manifest.
#[derive(Args, Clone, Debug)]
pub struct SourceArgs {
    /// image side in pixels
    #[arg(long)]
    pub side: Option<u32>,
    #[arg(long, value_enum)]
    pub format: Option<FormatArg>,
    #[arg(long, value_enum)]
    pub protocol: Option<ProtocolArg>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Encode a file into a directory of grayscale images
    Encode {
        input: PathBuf,
        out_dir: PathBuf,

        /// image side in pixels (images are side x side)
        #[arg(long, default_value_t = DEFAULT_SIDE)]
        side: u32,

        #[arg(long, value_enum, default_value_t = FormatArg::Png)]
        format: FormatArg,

        #[arg(long, value_enum, default_value_t = ProtocolArg::Headered)]
        protocol: ProtocolArg,

        /// 8-byte hex stream id (random when omitted)
        #[arg(long = "stream-id")]
        stream_id_hex: Option<String>,

        /// zero the manifest timestamp
        #[arg(long)]
        deterministic: bool,
    },

    /// Rebuild the original file from a directory of images
    Decode {
        in_dir: PathBuf,
        out: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        /// accept images carrying a different stream id
        #[arg(long)]
        lenient: bool,

        /// skip the manifest digest check
        #[arg(long)]
        skip_digest: bool,
    },

    /// List images with their sequence numbers and stream ids
    List {
        in_dir: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },

    /// Decode in memory and compare against the manifest digest
    Verify {
        in_dir: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        #[arg(long)]
        lenient: bool,
    },
}
