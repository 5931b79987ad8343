use anyhow::{Context, Result};
use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use crate::builder::build_master;
use crate::constants::{DEFAULT_MASTER_CSV, DEFAULT_SUMMARY_CSV};
use crate::output::write_outputs;
use crate::overlap::{find_overlaps, write_overlap_report};
use crate::parquet_writer::write_master_parquet;
use crate::quality::write_quality_report;
use crate::record::DataType;
use crate::sources::{SourcePaths, SourceStats};
use crate::summary::summarize;

/// Fully resolved inputs and outputs of one build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub sources: SourcePaths,
    pub master_csv: PathBuf,
    pub summary_csv: PathBuf,
    pub parquet_output: Option<PathBuf>,
    pub quality_report: Option<PathBuf>,
    pub overlap_report: Option<PathBuf>,
}

impl RunConfig {
    /// Default layout under `data_dir` with no optional outputs.
    pub fn under(data_dir: &Path) -> Self {
        Self {
            sources: SourcePaths::under(data_dir),
            master_csv: data_dir.join(DEFAULT_MASTER_CSV),
            summary_csv: data_dir.join(DEFAULT_SUMMARY_CSV),
            parquet_output: None,
            quality_report: None,
            overlap_report: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub sources: Vec<SourceStats>,
    pub counts_by_type: BTreeMap<DataType, usize>,
    pub rows_written: usize,
    pub alias_patterns: usize,
    pub master_csv: PathBuf,
    pub summary_csv: PathBuf,
    pub parquet_output: Option<PathBuf>,
    pub quality_report: Option<PathBuf>,
    pub overlap_report: Option<PathBuf>,
    pub overlap_pairs: Option<usize>,
}

/// Builds the unified table and writes every configured output.
///
/// The two CSVs are committed together; the optional outputs are written
/// afterwards and a failure there leaves the committed CSVs in place.
pub fn run(config: &RunConfig) -> Result<RunOutcome> {
    let table = build_master(&config.sources)?;
    let summary = summarize(&table.records);

    let rows_written = write_outputs(
        &config.master_csv,
        &config.summary_csv,
        table.rows(),
        &summary,
    )?;
    tracing::info!(
        rows = rows_written,
        summary_rows = summary.len(),
        path = %config.master_csv.display(),
        "Wrote unified CSV"
    );

    let skipped = table.rows_skipped();
    if skipped > 0 {
        tracing::warn!(rows_skipped = skipped, "Some source rows were skipped");
    }

    if let Some(path) = &config.parquet_output {
        let written = write_master_parquet(path, table.rows())
            .with_context(|| format!("Failed writing Parquet output {}", path.display()))?;
        tracing::info!(rows = written, path = %path.display(), "Wrote Parquet output");
    }

    if let Some(path) = &config.quality_report {
        write_quality_report(&config.master_csv, path)?;
    }

    let mut overlap_pairs = None;
    if let Some(path) = &config.overlap_report {
        let pairs = find_overlaps(&table.records);
        write_overlap_report(path, &pairs)?;
        tracing::info!(pairs = pairs.len(), path = %path.display(), "Wrote overlap report");
        overlap_pairs = Some(pairs.len());
    }

    Ok(RunOutcome {
        counts_by_type: table.counts_by_type(),
        sources: table.stats,
        rows_written,
        alias_patterns: table.alias_patterns,
        master_csv: config.master_csv.clone(),
        summary_csv: config.summary_csv.clone(),
        parquet_output: config.parquet_output.clone(),
        quality_report: config.quality_report.clone(),
        overlap_report: config.overlap_report.clone(),
        overlap_pairs,
    })
}
