use csv::StringRecord;
use std::{
    collections::BTreeMap,
    fmt,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
};

use crate::constants::{
    DEFAULT_COUNCILS_CSV, DEFAULT_DEGREES_CSV, DEFAULT_DISTRICTS_CSV, DEFAULT_KPME_CSV,
    DEFAULT_OSM_PATH, DEFAULT_SPECIALIZATIONS_CSV,
};
use crate::error::{RowError, SourceError};
use crate::record::MasterRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Kpme,
    Osm,
    Districts,
    Specializations,
    Degrees,
    Councils,
    DistrictAliases,
}

impl SourceKind {
    /// Required inputs, in the order their rows appear in the unified table.
    pub const REQUIRED: [SourceKind; 6] = [
        SourceKind::Kpme,
        SourceKind::Osm,
        SourceKind::Districts,
        SourceKind::Specializations,
        SourceKind::Degrees,
        SourceKind::Councils,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Kpme => "kpme",
            SourceKind::Osm => "osm",
            SourceKind::Districts => "districts",
            SourceKind::Specializations => "specializations",
            SourceKind::Degrees => "degrees",
            SourceKind::Councils => "councils",
            SourceKind::DistrictAliases => "district_aliases",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourcePaths {
    pub kpme: PathBuf,
    pub osm: PathBuf,
    pub districts: PathBuf,
    pub specializations: PathBuf,
    pub degrees: PathBuf,
    pub councils: PathBuf,
    /// Replaces the built-in alias table when set.
    pub district_aliases: Option<PathBuf>,
}

impl SourcePaths {
    pub fn under(data_dir: &Path) -> Self {
        Self {
            kpme: data_dir.join(DEFAULT_KPME_CSV),
            osm: data_dir.join(DEFAULT_OSM_PATH),
            districts: data_dir.join(DEFAULT_DISTRICTS_CSV),
            specializations: data_dir.join(DEFAULT_SPECIALIZATIONS_CSV),
            degrees: data_dir.join(DEFAULT_DEGREES_CSV),
            councils: data_dir.join(DEFAULT_COUNCILS_CSV),
            district_aliases: None,
        }
    }

    pub fn path(&self, kind: SourceKind) -> Option<&Path> {
        match kind {
            SourceKind::Kpme => Some(&self.kpme),
            SourceKind::Osm => Some(&self.osm),
            SourceKind::Districts => Some(&self.districts),
            SourceKind::Specializations => Some(&self.specializations),
            SourceKind::Degrees => Some(&self.degrees),
            SourceKind::Councils => Some(&self.councils),
            SourceKind::DistrictAliases => self.district_aliases.as_deref(),
        }
    }

    /// Fails on the first required (or configured optional) input that is not a
    /// readable file, before any source is parsed.
    pub fn check_all(&self) -> Result<(), SourceError> {
        for kind in SourceKind::REQUIRED {
            if let Some(path) = self.path(kind) {
                check_source(kind, path)?;
            }
        }
        if let Some(path) = self.path(SourceKind::DistrictAliases) {
            check_source(SourceKind::DistrictAliases, path)?;
        }
        Ok(())
    }
}

fn check_source(kind: SourceKind, path: &Path) -> Result<(), SourceError> {
    if !path.exists() {
        return Err(SourceError::Missing {
            kind,
            path: path.to_path_buf(),
        });
    }
    if !path.is_file() {
        return Err(SourceError::Unreadable {
            kind,
            path: path.to_path_buf(),
            reason: "not a regular file".to_string(),
        });
    }
    Ok(())
}

pub fn open_source(kind: SourceKind, path: &Path) -> Result<BufReader<File>, SourceError> {
    check_source(kind, path)?;
    let file = File::open(path).map_err(|err| SourceError::Unreadable {
        kind,
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    Ok(BufReader::new(file))
}

/// Opens `path` and hands it to `read`; any error from `read` means the file as
/// a whole could not be used and is reported as [`SourceError::Unreadable`].
pub fn load_source<T>(
    kind: SourceKind,
    path: &Path,
    read: impl FnOnce(BufReader<File>) -> anyhow::Result<T>,
) -> Result<T, SourceError> {
    let reader = open_source(kind, path)?;
    read(reader).map_err(|err| SourceError::Unreadable {
        kind,
        path: path.to_path_buf(),
        reason: format!("{err:#}"),
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceStats {
    pub kind: SourceKind,
    pub rows_read: usize,
    pub rows_skipped: usize,
    pub skip_reasons: BTreeMap<String, usize>,
}

impl SourceStats {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            rows_read: 0,
            rows_skipped: 0,
            skip_reasons: BTreeMap::new(),
        }
    }

    pub fn rows_kept(&self) -> usize {
        self.rows_read - self.rows_skipped
    }

    fn record_skip(&mut self, err: &RowError) {
        self.rows_skipped += 1;
        *self.skip_reasons.entry(err.reason()).or_insert(0) += 1;
    }
}

/// Records mapped from one source plus its read/skip accounting.
#[derive(Debug, Clone)]
pub struct SourceBatch {
    pub records: Vec<MasterRecord>,
    pub stats: SourceStats,
}

impl SourceBatch {
    pub fn new(kind: SourceKind) -> Self {
        Self {
            records: Vec::new(),
            stats: SourceStats::new(kind),
        }
    }

    pub fn push(&mut self, outcome: Result<MasterRecord, RowError>) {
        self.stats.rows_read += 1;
        match outcome {
            Ok(record) => self.records.push(record),
            Err(err) => {
                tracing::debug!(
                    source = %self.stats.kind,
                    row = self.stats.rows_read,
                    "skipping row: {err}"
                );
                self.stats.record_skip(&err);
            }
        }
    }

    /// Counts a bad record as a skipped row. An I/O error means the rest of the
    /// file cannot be read, so it is returned and fails the whole source.
    pub fn push_csv_error(&mut self, err: csv::Error) -> anyhow::Result<()> {
        if err.is_io_error() {
            return Err(anyhow::Error::new(err).context(format!(
                "Failed reading {} after row {}",
                self.stats.kind, self.stats.rows_read
            )));
        }
        self.push(Err(RowError::Malformed(err.to_string())));
        Ok(())
    }
}

/// Short rows are padded with empty fields by `field_at`; only overlong rows,
/// whose columns can no longer be trusted, are rejected.
pub fn check_width(row: &StringRecord, header_width: usize) -> Result<(), RowError> {
    if row.len() > header_width {
        return Err(RowError::Malformed(format!(
            "{} fields, header has {header_width}",
            row.len()
        )));
    }
    Ok(())
}

pub fn csv_reader<R: std::io::Read>(reader: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new().flexible(true).from_reader(reader)
}
