use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use reward_distributor::config::RunConfig;
use reward_distributor::logging::{logging, LogOutput};
use reward_distributor::{run, RunOptions};
use tracing::{info, Level};

#[derive(Parser, Debug)]
#[command(name = "reward-distributor")]
#[command(about = "Computes reward grants and commits them to merkle roots")]
struct Args {
    /// Path to the TOML run configuration
    #[arg(long, env = "REWARD_CONFIG")]
    config: PathBuf,

    /// Directory holding `<category>.json` record files.
    /// Defaults to `sources.records_dir` from the config, relative to the config file.
    #[arg(long)]
    records_dir: Option<PathBuf>,

    /// Directory the artifacts are written to
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also write the per-grant debug ledger
    #[arg(long, default_value = "false")]
    debug_ledger: bool,

    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    log_level: Level,

    #[arg(long, value_enum, default_value = "console")]
    log_output: LogOutput,

    /// Production run; test grants are refused
    #[arg(long, default_value = "false")]
    production: bool,
}

/// Resolves `path` against the directory of the config file.
fn relative_to_config(config: &Path, path: &Path) -> PathBuf {
    match config.parent() {
        Some(dir) if path.is_relative() => dir.join(path),
        _ => path.to_path_buf(),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging()
        .with_output(args.log_output)
        .with_level(args.log_level)
        .init()?;

    let config = RunConfig::load(&args.config)?;
    let records_dir = args
        .records_dir
        .or_else(|| {
            config
                .sources
                .records_dir
                .as_deref()
                .map(|dir| relative_to_config(&args.config, dir))
        })
        .context("No records directory: pass --records-dir or set sources.records_dir")?;
    let output_dir = args
        .output_dir
        .or_else(|| {
            config
                .output
                .dir
                .as_deref()
                .map(|dir| relative_to_config(&args.config, dir))
        })
        .context("No output directory: pass --output-dir or set output.dir")?;

    let summary = run(
        &config,
        &RunOptions {
            records_dir,
            output_dir,
            debug_ledger: args.debug_ledger || config.output.debug_ledger,
            production: args.production,
        },
    )?;

    for (partition, commitment) in [
        ("vesting", &summary.vesting),
        ("non-vesting", &summary.non_vesting),
    ] {
        match commitment {
            Some(commitment) => println!(
                "{partition}: root {} total {} ({} grants)",
                commitment.merkle_root,
                commitment.amount_total,
                commitment.entries.len()
            ),
            None => println!("{partition}: no grants"),
        }
    }
    if let Some(totals) = &summary.community_totals {
        println!(
            "community: capped {} ({}) uncapped {} ({})",
            totals.gfi_for_capped,
            totals.pct_for_capped,
            totals.gfi_for_uncapped,
            totals.pct_for_uncapped
        );
    }
    info!(skipped_rows = summary.skipped_rows, "Distribution complete");
    Ok(())
}
