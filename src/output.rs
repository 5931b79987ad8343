use anyhow::{Context, Result};
use serde::Serialize;
use std::{fs::File, path::Path};

use crate::common::{commit_tmp, discard_tmp, ensure_parent_dir, tmp_path_for};
use crate::record::{MASTER_COLUMNS, MasterRow};
use crate::summary::{SUMMARY_COLUMNS, SummaryRow};

/// Writes `columns` as the header row even when `rows` is empty.
fn write_csv<T: Serialize>(
    path: &Path,
    columns: &[&str],
    rows: impl IntoIterator<Item = T>,
) -> Result<usize> {
    ensure_parent_dir(path)?;
    let file = File::create(path).with_context(|| format!("Failed creating {}", path.display()))?;
    let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
    writer
        .write_record(columns)
        .with_context(|| format!("Failed writing header to {}", path.display()))?;

    let mut written = 0usize;
    for row in rows {
        writer
            .serialize(row)
            .with_context(|| format!("Failed writing row to {}", path.display()))?;
        written += 1;
    }
    writer
        .flush()
        .with_context(|| format!("Failed flushing {}", path.display()))?;
    Ok(written)
}

pub fn write_master_csv(path: &Path, rows: impl IntoIterator<Item = MasterRow>) -> Result<usize> {
    write_csv(path, &MASTER_COLUMNS, rows)
}

pub fn write_summary_csv(path: &Path, rows: &[SummaryRow]) -> Result<usize> {
    write_csv(path, &SUMMARY_COLUMNS, rows)
}

/// Writes both CSVs to `.tmp` siblings and renames them into place only after
/// both are complete. If a write fails the tmp files are removed and any
/// previous outputs are left as they were.
///
/// The two renames are not atomic as a pair. The summary goes first, so a new
/// unified CSV is never paired with a stale summary; if the second rename
/// fails, the new summary sits beside the previous unified CSV and the error
/// is returned.
pub fn write_outputs(
    master_path: &Path,
    summary_path: &Path,
    master_rows: impl IntoIterator<Item = MasterRow>,
    summary_rows: &[SummaryRow],
) -> Result<usize> {
    let master_tmp = tmp_path_for(master_path);
    let summary_tmp = tmp_path_for(summary_path);

    let written = write_master_csv(&master_tmp, master_rows)
        .and_then(|written| write_summary_csv(&summary_tmp, summary_rows).map(|_| written));
    let written = match written {
        Ok(written) => written,
        Err(err) => {
            discard_tmp(&master_tmp);
            discard_tmp(&summary_tmp);
            return Err(err);
        }
    };

    if let Err(err) = commit_tmp(&summary_tmp, summary_path) {
        discard_tmp(&summary_tmp);
        discard_tmp(&master_tmp);
        return Err(err);
    }
    commit_tmp(&master_tmp, master_path).inspect_err(|_| discard_tmp(&master_tmp))?;
    Ok(written)
}
