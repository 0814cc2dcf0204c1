pub mod handlers;

use crate::presentation::cli::{Cli, Commands};
use clap::Parser;
use pixify_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Encode {
            input,
            out_dir,
            side,
            format,
            protocol,
            stream_id_hex,
            deterministic,
        } => handlers::handle_encode(
            input,
            out_dir,
            side,
            format,
            protocol,
            stream_id_hex,
            deterministic,
        ),
        Commands::Decode {
            in_dir,
            out,
            source,
            lenient,
            skip_digest,
        } => handlers::handle_decode(in_dir, out, source, lenient, skip_digest),
        Commands::List { in_dir, source } => handlers::handle_list(in_dir, source),
        Commands::Verify {
            in_dir,
            source,
            lenient,
        } => handlers::handle_verify(in_dir, source, lenient),
    }
}
