//! Simulator: generate verified nonce/authenticator pairs for a known key.
//!
//! Output is the exact file format `ht2crack -n` reads, so a full
//! generate-then-crack round trip needs nothing else.

use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

use anyhow::{ensure, Context, Result};
use clap::Parser;

use ht2crack::{encoding, sim, verify, Key, ObservationSet};

#[derive(Parser)]
#[command(
    name = "ht2sim",
    version,
    about = "HiTag2 nonce/keystream pair generator for attack testing"
)]
struct Cli {
    /// 48-bit key, 12 hex chars in display format (default: the MIKRON
    /// test key)
    #[arg(short, long, default_value = "4F4E4D494B52")]
    key: String,

    /// 32-bit UID as 8 hex chars
    #[arg(short, long, default_value = "AABBCCDD")]
    uid: String,

    /// Number of nonce pairs to generate
    #[arg(short = 'n', long = "num-nonces", default_value_t = 16)]
    num_nonces: usize,

    /// RNG seed, for reproducible datasets
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Output file
    #[arg(short, long, default_value = "nonces.txt")]
    output: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let key: Key = cli.key.to_uppercase().parse()?;
    let uid = encoding::hex32_to_internal(&cli.uid).context("parsing --uid")?;

    let pairs = sim::generate_observations(key, uid, cli.num_nonces, cli.seed);

    // Same self-check the reference simulator runs before writing anything.
    let set = ObservationSet::new(pairs.clone(), 32)?;
    ensure!(
        verify::matches_all(key, uid, &set),
        "generated pairs failed keystream self-check"
    );

    let file = File::create(&cli.output)
        .with_context(|| format!("creating {}", cli.output.display()))?;
    sim::write_nonce_file(BufWriter::new(file), &pairs)?;

    println!(
        "[ht2sim] key={} uid={} seed={}: wrote {} pairs to {}",
        key,
        cli.uid.to_uppercase(),
        cli.seed,
        pairs.len(),
        cli.output.display()
    );
    println!(
        "[ht2sim] crack with: ht2crack -u {} -n {} -N {} -t 2000000",
        cli.uid.to_uppercase(),
        cli.output.display(),
        pairs.len()
    );
    Ok(())
}
