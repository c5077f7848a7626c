use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

/// Print the SHA256 checksum of the static areas of a firmware image.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Firmware image to read
    file: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let image = std::fs::read(&args.file)
        .with_context(|| format!("unable to read file \"{}\"", args.file.display()))?;
    let digest = fmap_codec::get_csum(&image)?;

    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    println!("{hex}");

    Ok(())
}
