//! split-midi - split a MIDI (or midicsv CSV) file into one file per channel
//!
//! Output lands in `split_channels/` next to the input:
//! `channel_<N>.mid` for every channel found, plus `channel_<N>.csv` when
//! CSVs are kept.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use midisplit::{ExternalTools, SplitOptions, Splitter};
use splitconf::SplitConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Split a multi-channel MIDI file into one MIDI file per channel
#[derive(Parser, Debug)]
#[command(name = "split-midi", version, about, long_about = None)]
struct Args {
    /// Input file: .mid/.midi, or CSV as produced by midicsv
    input: Option<PathBuf>,

    /// Config file (replaces ./midisplit.toml)
    #[arg(long, env = "MIDISPLIT_CONFIG")]
    config: Option<PathBuf>,

    /// Keep the intermediate CSV files (default for CSV input)
    #[arg(long, conflicts_with = "remove_csv")]
    keep_csv: bool,

    /// Remove the intermediate CSV files (default for MIDI input)
    #[arg(long)]
    remove_csv: bool,

    /// Write and convert channels concurrently
    #[arg(long)]
    parallel: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    show_config: bool,
}

impl Args {
    fn keep_csv_override(&self) -> Option<bool> {
        match (self.keep_csv, self.remove_csv) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        }
    }
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            return ExitCode::FAILURE;
        }
        // --help / --version
        Err(e) => e.exit(),
    };

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<()> {
    let (mut config, sources) = SplitConfig::load_with_sources_from(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(keep) = args.keep_csv_override() {
        config.output.keep_csv = Some(keep);
    }
    if args.parallel {
        config.output.parallel = true;
    }

    if args.show_config {
        print!("{}{}", sources.to_comment(), config.to_toml());
        return Ok(());
    }

    init_tracing(&config.telemetry.log_level);

    let Some(input) = args.input else {
        anyhow::bail!("Usage: split-midi <input_file>");
    };

    let splitter = Splitter::new(
        ExternalTools::from_config(&config.tools),
        SplitOptions::from_config(&config),
    );
    let report = splitter.split_file(&input)?;

    info!(
        "Split {} into {} channel file(s) in {}",
        report.input.display(),
        report.channels.len(),
        report.output_dir.display()
    );
    Ok(())
}

fn init_tracing(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
