use anyhow::Context;
use clap::Parser;
use fmap_codec::input_kv_pair::parse_number;
use fmap_codec::{Fmap, Search};
use log::info;
use std::path::PathBuf;

/// Decode the FMAP embedded in a firmware image and print it.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Firmware image to read
    file: PathBuf,

    /// Read the header at this offset instead of searching for it
    #[arg(long, value_parser = parse_offset)]
    offset: Option<usize>,

    /// Only accept an FMAP with this name
    #[arg(long)]
    name: Option<String>,

    /// Take the first valid signature instead of searching by alignment
    #[arg(long)]
    linear: bool,
}

fn parse_offset(s: &str) -> Result<usize, String> {
    let offset = parse_number("offset", s).map_err(|e| e.to_string())?;
    usize::try_from(offset).map_err(|e| e.to_string())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    info!("decoding FMAP from: {}", args.file.display());
    let blob = std::fs::read(&args.file)
        .with_context(|| format!("unable to read file \"{}\"", args.file.display()))?;

    let search = if args.linear {
        Search::Linear
    } else {
        Search::Aligned
    };
    let fmap = Fmap::decode_with(&blob, args.offset, args.name.as_deref(), search)
        .with_context(|| format!("no usable FMAP in \"{}\"", args.file.display()))?;

    print!("{fmap}");

    Ok(())
}
