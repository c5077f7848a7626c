use anyhow::{bail, Context};
use clap::Parser;
use fmap_codec::{encode, Fmap};
use log::info;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Generate an FMAP binary from its key/value description, or from answers
/// typed at the prompt.
#[derive(Parser)]
#[command(version, about)]
struct Args {
    /// Prompt for every field and write the FMAP to OUTPUT
    #[arg(short, long, value_name = "OUTPUT", conflicts_with_all = ["input", "output"])]
    interactive: Option<PathBuf>,

    /// Key/value text, as printed by fmap_decode
    #[arg(required_unless_present = "interactive")]
    input: Option<PathBuf>,

    /// Where to write the encoded FMAP
    #[arg(required_unless_present = "interactive")]
    output: Option<PathBuf>,
}

/// One line of stdin in answer to `question`.
fn prompt(question: &str) -> anyhow::Result<String> {
    print!("{question}: ");
    io::stdout().flush()?;

    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        bail!("unable to obtain input");
    }

    Ok(line)
}

fn write_fmap(fmap: &Fmap, output: &Path) -> anyhow::Result<()> {
    let blob = encode(fmap)?;
    std::fs::write(output, &blob)
        .with_context(|| format!("unable to write \"{}\"", output.display()))?;

    info!(
        "wrote {} bytes ({} areas) to {}",
        blob.len(),
        fmap.area_count(),
        output.display()
    );

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    if let Some(output) = &args.interactive {
        let fmap = Fmap::from_prompts(prompt)?;
        print!("{fmap}");
        return write_fmap(&fmap, output);
    }

    let (Some(input), Some(output)) = (&args.input, &args.output) else {
        bail!("both an input and an output file are required");
    };

    let text = std::fs::read_to_string(input)
        .with_context(|| format!("unable to read \"{}\"", input.display()))?;
    let fmap = Fmap::from_kv_str(&text)
        .with_context(|| format!("unable to parse \"{}\"", input.display()))?;

    write_fmap(&fmap, output)
}
