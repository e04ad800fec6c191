//! tkvs console
//!
//! Reads commands from stdin, one per line, and prints each normalized
//! input followed by its result:
//!
//! ```text
//! $ printf 'SET foo bar\nGET   foo\n' | tkvs
//! SET foo bar:	ok
//! GET foo:	bar
//! ```
//!
//! All lines of one run share a single execution context.

use clap::{Parser, ValueEnum};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use tkvs::interpreter::{echo_line, normalize_line};
use tkvs::{Backend, Tkvs, TkvsConfig};

/// Nested-transaction key-value store console.
#[derive(Parser)]
#[command(name = "tkvs")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Base store implementation (overrides the configuration file)
    #[arg(short, long, value_enum)]
    backend: Option<BackendArg>,

    /// Shard count for the concurrent backend (overrides the configuration file)
    #[arg(short, long)]
    shards: Option<usize>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Synchronized,
    Concurrent,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Synchronized => Backend::Synchronized,
            BackendArg::Concurrent => Backend::Concurrent,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => TkvsConfig::load(path)?,
        None => TkvsConfig::default(),
    };
    if let Some(backend) = cli.backend {
        config.backend = backend.into();
    }
    if let Some(shards) = cli.shards {
        config.shards = shards;
    }

    let store = Tkvs::from_config(&config)?;
    let mut interpreter = store.cli();

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    for line in stdin.lock().lines() {
        let line = line?;
        let Some(input) = normalize_line(&line) else {
            continue;
        };
        if let Some(result) = interpreter.exec_line(&input) {
            writeln!(out, "{}", echo_line(&input, &result))?;
        }
    }
    out.flush()?;

    Ok(())
}
