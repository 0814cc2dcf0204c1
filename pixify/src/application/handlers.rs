use std::path::PathBuf;

use pixify_core::error::Result;
use pixify_core::util::stream_id::StreamId;
use pixify_core::{DecodeOptions, EncodeOptions, decode, encode, list, verify};

use crate::presentation::cli::{FormatArg, ProtocolArg, SourceArgs};

fn decode_options(source: SourceArgs, lenient: bool, skip_digest: bool) -> DecodeOptions {
    DecodeOptions {
        side: source.side,
        format: source.format.map(Into::into),
        protocol: source.protocol.map(Into::into),
        lenient,
        skip_digest,
    }
}

pub fn handle_encode(
    input: PathBuf,
    out_dir: PathBuf,
    side: u32,
    format: FormatArg,
    protocol: ProtocolArg,
    stream_id_hex: Option<String>,
    deterministic: bool,
) -> Result<()> {
    let stream_id = stream_id_hex
        .map(|hex| hex.parse::<StreamId>())
        .transpose()?;
    let opts = EncodeOptions {
        side,
        format: format.into(),
        protocol: protocol.into(),
        stream_id,
        deterministic,
    };
    let report = encode(&input, &out_dir, Some(&opts))?;
    eprintln!(
        "encode: {} bytes -> {} images in {} (stream {})",
        report.file_size,
        report.images,
        report.out_dir.display(),
        report.stream_id
    );
    Ok(())
}

pub fn handle_decode(
    in_dir: PathBuf,
    out: PathBuf,
    source: SourceArgs,
    lenient: bool,
    skip_digest: bool,
) -> Result<()> {
    let opts = decode_options(source, lenient, skip_digest);
    let report = decode(&in_dir, &out, Some(&opts))?;
    eprintln!(
        "decode: {} images -> {} bytes in {}{}",
        report.images,
        report.file_size,
        out.display(),
        if report.verified { " (digest OK)" } else { "" }
    );
    Ok(())
}

pub fn handle_list(in_dir: PathBuf, source: SourceArgs) -> Result<()> {
    let rows = list(&in_dir, Some(&decode_options(source, true, true)))?;
    for r in rows {
        let seq = r.sequence.map_or_else(|| "-".to_string(), |s| s.to_string());
        let stream = r
            .stream_id
            .map_or_else(|| "-".to_string(), |id| id.to_string());
        println!(
            "#{:<6} stream={:<16} {}x{}  {}",
            seq,
            stream,
            r.width,
            r.height,
            r.path.display()
        );
    }
    Ok(())
}

pub fn handle_verify(in_dir: PathBuf, source: SourceArgs, lenient: bool) -> Result<()> {
    let report = verify(&in_dir, Some(&decode_options(source, lenient, false)))?;
    if report.verified {
        eprintln!("verify: OK ({} images, blake3 {})", report.images, report.digest);
    } else {
        eprintln!(
            "verify: structure OK ({} images), no manifest digest to compare",
            report.images
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(side: u32) -> SourceArgs {
        SourceArgs {
            side: Some(side),
            format: None,
            protocol: None,
        }
    }

    #[test]
    fn encode_then_decode_through_handlers() {
        let work = tempfile::tempdir().unwrap();
        let input = work.path().join("input.txt");
        std::fs::write(&input, b"through the command handlers").unwrap();
        let images = work.path().join("images");

        handle_encode(
            input.clone(),
            images.clone(),
            8,
            FormatArg::Pgm,
            ProtocolArg::Headered,
            Some("0011223344556677".into()),
            true,
        )
        .unwrap();
        handle_verify(images.clone(), source(8), false).unwrap();
        handle_list(images.clone(), source(8)).unwrap();

        let out = work.path().join("restored.txt");
        handle_decode(images, out.clone(), source(8), false, false).unwrap();
        assert_eq!(std::fs::read(out).unwrap(), std::fs::read(input).unwrap());
    }

    #[test]
    fn bad_stream_id_is_rejected_before_writing() {
        let work = tempfile::tempdir().unwrap();
        let input = work.path().join("input");
        std::fs::write(&input, b"x").unwrap();
        let images = work.path().join("images");
        let err = handle_encode(
            input,
            images.clone(),
            8,
            FormatArg::Png,
            ProtocolArg::Headered,
            Some("not-hex".into()),
            false,
        );
        assert!(err.is_err());
        assert!(!images.exists());
    }
}
