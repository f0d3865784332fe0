pub mod config;
pub mod logging;
pub mod source;

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use reward_allocation::{debug_ledger, plan_distribution, DistributionPlan, PoolTotals};
use reward_core::Grant;
use reward_merkle::{build_commitment, Commitment, CommitmentError};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::RunConfig;
use crate::source::JsonRecordSource;

pub const VESTING_ARTIFACT: &str = "vesting.json";
pub const NON_VESTING_ARTIFACT: &str = "non_vesting.json";
pub const SKIPPED_ROWS_REPORT: &str = "skipped_rows.json";
pub const DEBUG_LEDGER: &str = "debug_ledger.json";

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub records_dir: PathBuf,
    pub output_dir: PathBuf,
    pub debug_ledger: bool,
    pub production: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub vesting: Option<Commitment>,
    pub community_totals: Option<PoolTotals>,
    pub non_vesting: Option<Commitment>,
    pub skipped_rows: usize,
    pub written: Vec<PathBuf>,
}

/// Commits one partition and re-verifies every proof. An empty partition has no commitment.
fn commit_partition(partition: &str, grants: &[Grant]) -> Result<Option<Commitment>> {
    let commitment = match build_commitment(grants) {
        Ok(commitment) => commitment,
        Err(CommitmentError::EmptyGrantList) => {
            warn!(partition, "No grants in partition, skipping its commitment");
            return Ok(None);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Failed to commit {partition} grants"))
        }
    };
    commitment
        .verify()
        .with_context(|| format!("Self-check of {partition} commitment failed"))?;
    info!(
        partition,
        merkle_root = %commitment.merkle_root,
        entries = commitment.entries.len(),
        amount_total = commitment.amount_total,
        "Committed partition"
    );
    Ok(Some(commitment))
}

/// An output file written next to its destination but not yet in place.
struct StagedFile {
    file: NamedTempFile,
    path: PathBuf,
}

fn stage_json<T: Serialize>(dir: &Path, name: &str, value: &T) -> Result<StagedFile> {
    let path = dir.join(name);
    let mut file = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file for {}", path.display()))?;
    serde_json::to_writer_pretty(&mut file, value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    file.flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(StagedFile { file, path })
}

/// Moves every staged file into place and clears artifacts of partitions that have no
/// commitment this run. Only called once all outputs have been staged.
fn publish(staged: Vec<StagedFile>, stale: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(staged.len());
    for StagedFile { file, path } in staged {
        file.persist(&path)
            .with_context(|| format!("Failed to move {} into place", path.display()))?;
        info!(path = %path.display(), "Wrote output");
        written.push(path);
    }
    for path in stale.iter().filter(|path| path.exists()) {
        std::fs::remove_file(path)
            .with_context(|| format!("Failed to remove stale {}", path.display()))?;
        info!(path = %path.display(), "Removed stale artifact");
    }
    Ok(written)
}

/// Runs one batch end to end. Every output is staged in the output directory first, so a
/// failure before publishing leaves the previous run's files untouched.
pub fn run(config: &RunConfig, options: &RunOptions) -> Result<RunSummary> {
    let params = config
        .to_params(options.production)
        .context("Invalid run configuration")?;
    let source = JsonRecordSource::new(&options.records_dir);
    info!(
        records_dir = %source.dir().display(),
        categories = ?params.categories,
        production = params.production,
        "Planning distribution"
    );
    let DistributionPlan {
        partition,
        skipped,
        community,
        records,
    } = plan_distribution(&params, &source).context("Distribution failed")?;

    let vesting = commit_partition("vesting", &partition.vesting)?;
    let non_vesting = commit_partition("non-vesting", &partition.immediate)?;
    let ledger = if options.debug_ledger {
        Some(
            debug_ledger(
                &partition,
                &records.holders,
                community.as_ref().map(|report| report.holders.as_slice()).unwrap_or_default(),
                params.community.share_price,
            )
            .context("Failed to build debug ledger")?,
        )
    } else {
        None
    };

    std::fs::create_dir_all(&options.output_dir).with_context(|| {
        format!(
            "Failed to create output directory: {}",
            options.output_dir.display()
        )
    })?;
    let dir = options.output_dir.as_path();
    let mut staged = vec![];
    let mut stale = vec![];
    for (name, commitment) in [
        (VESTING_ARTIFACT, vesting.as_ref()),
        (NON_VESTING_ARTIFACT, non_vesting.as_ref()),
    ] {
        match commitment {
            Some(commitment) => staged.push(stage_json(dir, name, &commitment.to_artifact())?),
            None => stale.push(dir.join(name)),
        }
    }
    staged.push(stage_json(dir, SKIPPED_ROWS_REPORT, &skipped)?);
    if let Some(ledger) = ledger {
        staged.push(stage_json(dir, DEBUG_LEDGER, &ledger)?);
    }
    let written = publish(staged, &stale)?;

    Ok(RunSummary {
        vesting,
        community_totals: community.map(|report| report.totals),
        non_vesting,
        skipped_rows: skipped.len(),
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn file_names(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn failed_staging_leaves_previous_outputs_in_place() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(VESTING_ARTIFACT), "previous").unwrap();
        std::fs::write(dir.path().join(NON_VESTING_ARTIFACT), "previous").unwrap();

        let vesting = stage_json(dir.path(), VESTING_ARTIFACT, &["new"]).unwrap();
        assert!(stage_json(&dir.path().join("missing"), NON_VESTING_ARTIFACT, &["new"]).is_err());
        drop(vesting);

        assert_eq!(
            std::fs::read_to_string(dir.path().join(VESTING_ARTIFACT)).unwrap(),
            "previous"
        );
        assert_eq!(
            file_names(dir.path()),
            vec![NON_VESTING_ARTIFACT.to_string(), VESTING_ARTIFACT.to_string()]
        );
    }

    #[test]
    fn publishing_moves_staged_files_and_clears_stale_ones() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(NON_VESTING_ARTIFACT), "previous").unwrap();

        let staged = vec![
            stage_json(dir.path(), VESTING_ARTIFACT, &["new"]).unwrap(),
            stage_json(dir.path(), SKIPPED_ROWS_REPORT, &Vec::<String>::new()).unwrap(),
        ];
        let written = publish(staged, &[dir.path().join(NON_VESTING_ARTIFACT)]).unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(
            file_names(dir.path()),
            vec![SKIPPED_ROWS_REPORT.to_string(), VESTING_ARTIFACT.to_string()]
        );
        let vesting: Vec<String> = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(VESTING_ARTIFACT)).unwrap(),
        )
        .unwrap();
        assert_eq!(vesting, vec!["new".to_string()]);
    }
}
