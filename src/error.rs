use std::path::PathBuf;

use thiserror::Error;

use crate::sources::SourceKind;

/// Fatal: a required input could not be used at all. The run stops before any
/// output file is touched.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("missing source {kind}: {} does not exist", path.display())]
    Missing { kind: SourceKind, path: PathBuf },

    #[error("unreadable source {kind}: {}: {reason}", path.display())]
    Unreadable {
        kind: SourceKind,
        path: PathBuf,
        reason: String,
    },
}

impl SourceError {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceError::Missing { kind, .. } | SourceError::Unreadable { kind, .. } => *kind,
        }
    }

    pub fn path(&self) -> &PathBuf {
        match self {
            SourceError::Missing { path, .. } | SourceError::Unreadable { path, .. } => path,
        }
    }
}

/// Row-scoped: the record is skipped and counted, the run continues.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RowError {
    #[error("required field `{0}` is empty")]
    MissingField(&'static str),

    #[error("malformed record: {0}")]
    Malformed(String),
}

impl RowError {
    /// Short label used to bucket skip counts in the run report.
    pub fn reason(&self) -> String {
        match self {
            RowError::MissingField(field) => format!("empty {field}"),
            RowError::Malformed(_) => "malformed".to_string(),
        }
    }
}
