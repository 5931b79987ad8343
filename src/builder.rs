use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::{collections::BTreeMap, io::IsTerminal, time::Duration};

use crate::district::{DistrictMatcher, default_aliases, read_alias_table};
use crate::kpme::read_establishments;
use crate::osm::{OsmFormat, read_facilities};
use crate::record::{DataType, MasterRecord, MasterRow};
use crate::reference::{ReferenceList, read_districts, read_reference_list};
use crate::sources::{SourceBatch, SourceKind, SourcePaths, SourceStats, load_source};

/// The unified table plus the per-source accounting that produced it.
#[derive(Debug, Clone)]
pub struct MasterTable {
    pub records: Vec<MasterRecord>,
    /// One entry per required source, in output order.
    pub stats: Vec<SourceStats>,
    pub alias_patterns: usize,
}

impl MasterTable {
    pub fn rows(&self) -> impl Iterator<Item = MasterRow> + '_ {
        self.records.iter().map(MasterRecord::to_row)
    }

    pub fn counts_by_type(&self) -> BTreeMap<DataType, usize> {
        let mut counts = BTreeMap::new();
        for record in &self.records {
            *counts.entry(record.data_type()).or_insert(0) += 1;
        }
        counts
    }

    pub fn rows_skipped(&self) -> usize {
        self.stats.iter().map(|s| s.rows_skipped).sum()
    }

    pub fn stats_for(&self, kind: SourceKind) -> Option<&SourceStats> {
        self.stats.iter().find(|s| s.kind == kind)
    }
}

fn apply_source_progress_style(progress: &ProgressBar) {
    if let Ok(style) = ProgressStyle::with_template(
        "{spinner:.green} {prefix:.bold} [{elapsed_precise}] [{bar:32.cyan/blue}] {pos}/{len} {msg}",
    ) {
        progress.set_style(style.progress_chars("=> "));
    }
}

fn source_progress() -> ProgressBar {
    let steps = SourceKind::REQUIRED.len() as u64;
    if !std::io::stderr().is_terminal() {
        return ProgressBar::hidden();
    }
    let progress = ProgressBar::new(steps);
    progress.set_prefix("sources");
    apply_source_progress_style(&progress);
    progress.enable_steady_tick(Duration::from_millis(250));
    progress
}

fn log_batch(batch: &SourceBatch) {
    let stats = &batch.stats;
    tracing::info!(
        source = %stats.kind,
        rows_read = stats.rows_read,
        rows_kept = stats.rows_kept(),
        "Loaded source"
    );
    if stats.rows_skipped > 0 {
        tracing::warn!(
            source = %stats.kind,
            rows_skipped = stats.rows_skipped,
            reasons = ?stats.skip_reasons,
            "Skipped malformed rows"
        );
    }
}

/// Loads every source and assembles the unified table.
///
/// All inputs are checked before any is parsed, so a missing file aborts the
/// run with a [`crate::error::SourceError`] naming it and nothing is built.
pub fn build_master(paths: &SourcePaths) -> Result<MasterTable> {
    paths.check_all()?;

    let aliases = match &paths.district_aliases {
        Some(path) => {
            let aliases = load_source(SourceKind::DistrictAliases, path, read_alias_table)?;
            tracing::info!(
                path = %path.display(),
                aliases = aliases.len(),
                "Loaded district alias table"
            );
            aliases
        }
        None => default_aliases(),
    };

    let progress = source_progress();

    progress.set_message("districts");
    let (districts_batch, districts) =
        load_source(SourceKind::Districts, &paths.districts, read_districts)?;
    log_batch(&districts_batch);
    progress.inc(1);

    let matcher = DistrictMatcher::new(districts, &aliases);
    tracing::debug!(
        districts = matcher.districts().len(),
        patterns = matcher.pattern_count(),
        "Built district matcher"
    );

    progress.set_message("kpme");
    let kpme_batch = load_source(SourceKind::Kpme, &paths.kpme, |reader| {
        read_establishments(reader, &matcher)
    })?;
    log_batch(&kpme_batch);
    progress.inc(1);

    progress.set_message("osm");
    let osm_format = OsmFormat::from_path(&paths.osm);
    let osm_batch = load_source(SourceKind::Osm, &paths.osm, |reader| {
        read_facilities(reader, osm_format, &matcher)
    })?;
    log_batch(&osm_batch);
    progress.inc(1);

    let mut list_batches = Vec::with_capacity(3);
    for list in [
        ReferenceList::Specializations,
        ReferenceList::Degrees,
        ReferenceList::Councils,
    ] {
        let kind = list.source_kind();
        progress.set_message(kind.as_str());
        let Some(path) = paths.path(kind) else {
            continue;
        };
        let batch = load_source(kind, path, |reader| read_reference_list(reader, list))?;
        log_batch(&batch);
        list_batches.push(batch);
        progress.inc(1);
    }
    progress.finish_and_clear();

    let mut records = Vec::new();
    let mut stats = Vec::with_capacity(SourceKind::REQUIRED.len());
    let ordered = [kpme_batch, osm_batch, districts_batch]
        .into_iter()
        .chain(list_batches);
    for batch in ordered {
        records.extend(batch.records);
        stats.push(batch.stats);
    }

    tracing::info!(rows = records.len(), "Assembled unified table");
    Ok(MasterTable {
        records,
        stats,
        alias_patterns: matcher.pattern_count(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use std::fs;
    use std::path::Path;

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn seed(dir: &Path) -> SourcePaths {
        let paths = SourcePaths::under(dir);
        write(
            &paths.kpme,
            "establishment_name,category,system_of_medicine,address\nA,Clinic,Allopathy,Udupi\n,Clinic,Allopathy,Udupi\n",
        );
        write(&paths.osm, "name,amenity\nB,hospital\n");
        write(&paths.districts, "district_id,district_name,district_iso_code\n1,Udupi,KA-UD\n");
        write(&paths.specializations, "system_of_medicine,specialization\nAllopathy,Cardiology\n");
        write(&paths.degrees, "system_of_medicine,degree\nAllopathy,MBBS\n");
        write(&paths.councils, "system_of_medicine,council\nAllopathy,KMC\n");
        paths
    }

    #[test]
    fn records_follow_source_order() {
        let dir = tempfile::tempdir().unwrap();
        let table = build_master(&seed(dir.path())).unwrap();
        let types: Vec<DataType> = table.records.iter().map(|r| r.data_type()).collect();
        assert_eq!(types, DataType::ALL);
        let kinds: Vec<SourceKind> = table.stats.iter().map(|s| s.kind).collect();
        assert_eq!(kinds, SourceKind::REQUIRED);
        assert_eq!(table.rows_skipped(), 1);
        assert_eq!(table.records[0].to_row().district_name, "UDUPI");
    }

    #[test]
    fn missing_source_is_a_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = seed(dir.path());
        fs::remove_file(&paths.councils).unwrap();
        let err = build_master(&paths).unwrap_err();
        let source_err = err.downcast_ref::<SourceError>().unwrap();
        assert_eq!(source_err.kind(), SourceKind::Councils);
    }

    #[test]
    fn unusable_source_is_a_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let paths = seed(dir.path());
        write(&paths.degrees, "something_else\nMBBS\n");
        let err = build_master(&paths).unwrap_err();
        let source_err = err.downcast_ref::<SourceError>().unwrap();
        assert!(matches!(source_err, SourceError::Unreadable { .. }));
        assert_eq!(source_err.kind(), SourceKind::Degrees);
    }
}
