//! CLI driver: read a nonce file, run the correlation attack, print the key.
//!
//! Exit codes: 0 = key recovered, 2 = search exhausted without a verified
//! key (grow `-t` or capture more nonces), 1 = bad input or I/O.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ht2crack::{encoding, recover_key, AttackParams, Error, Key, ObservationSet};

#[derive(Parser)]
#[command(
    name = "ht2crack",
    version,
    about = "HiTag2 fast correlation attack (Garcia et al., USENIX Security 2016)"
)]
struct Cli {
    /// Tag UID, 8 hex chars (same byte order as the reference tools)
    #[arg(short = 'u', value_name = "UID_HEX")]
    uid: String,

    /// Nonce file: one "<IV_HEX> <AUTH_HEX>" pair per line
    #[arg(short = 'n', value_name = "FILE")]
    nonces: PathBuf,

    /// Only use the first COUNT observations from the file
    #[arg(short = 'N', value_name = "COUNT")]
    count: Option<usize>,

    /// Candidate table size; the main time/success trade-off (2000000
    /// recommended for 16-nonce captures)
    #[arg(short = 't', long = "table-size", default_value_t = 800_000)]
    table_size: u32,

    /// Worker threads (0 = one per hardware thread)
    #[arg(short = 'w', long, default_value_t = 0)]
    workers: u32,

    /// Assumed keystream error rate for the log-likelihood weights
    #[arg(short = 'e', long, default_value_t = 0.25)]
    epsilon: f64,
}

fn run(cli: &Cli) -> Result<Key> {
    let uid = encoding::hex32_to_internal(&cli.uid).context("parsing -u")?;
    let file = File::open(&cli.nonces)
        .with_context(|| format!("opening {}", cli.nonces.display()))?;
    let obs = ObservationSet::from_reader(BufReader::new(file), cli.count)
        .with_context(|| format!("reading {}", cli.nonces.display()))?;

    println!(
        "[ht2crack] uid={} nonces={} T={} workers={} epsilon={}",
        cli.uid.to_uppercase(),
        obs.len(),
        cli.table_size,
        cli.workers,
        cli.epsilon
    );

    let params = AttackParams {
        table_size: cli.table_size,
        workers: cli.workers,
        epsilon: cli.epsilon,
    };
    Ok(recover_key(uid, &obs, &params)?)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(key) => {
            println!("[ht2crack] WIN!!! key = {key}");
            ExitCode::SUCCESS
        }
        Err(e) if matches!(e.downcast_ref::<Error>(), Some(Error::NoKeyFound)) => {
            eprintln!("[ht2crack] {e}");
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("[ht2crack] error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
