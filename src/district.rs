use anyhow::{Context, Result};
use std::{collections::HashSet, io::Read};

use crate::common::{field_at, find_header_index};
use crate::constants::DEFAULT_DISTRICT_ALIASES;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct District {
    pub id: String,
    pub name: String,
    pub iso_code: String,
}

/// A recognized text variant for a reference district, e.g. `BELGAUM` for `BELAGAVI`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DistrictAlias {
    pub district_name: String,
    pub alias: String,
}

pub fn default_aliases() -> Vec<DistrictAlias> {
    DEFAULT_DISTRICT_ALIASES
        .iter()
        .map(|(district_name, alias)| DistrictAlias {
            district_name: (*district_name).to_string(),
            alias: (*alias).to_string(),
        })
        .collect()
}

/// Reads an alias table with columns `district_name, alias`. Rows with either
/// side blank, too many fields or bad encoding are skipped with a warning; an
/// I/O error fails the table.
pub fn read_alias_table<R: Read>(reader: R) -> Result<Vec<DistrictAlias>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader
        .headers()
        .context("Failed reading district alias headers")?
        .clone();
    let district_idx = find_header_index(&headers, &["district_name", "district", "canonical"])
        .context("District alias table is missing a district_name column")?;
    let alias_idx = find_header_index(&headers, &["alias", "variant", "text_variant"])
        .context("District alias table is missing an alias column")?;

    let mut aliases = Vec::new();
    let mut skipped = 0usize;
    for (row_idx, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) if row.len() <= headers.len() => row,
            Ok(_) => {
                skipped += 1;
                continue;
            }
            Err(err) if err.is_io_error() => {
                return Err(anyhow::Error::new(err))
                    .with_context(|| format!("Failed reading district alias row {}", row_idx + 1));
            }
            Err(err) => {
                tracing::debug!(row = row_idx + 1, "skipping district alias row: {err}");
                skipped += 1;
                continue;
            }
        };
        let district_name = field_at(&row, Some(district_idx));
        let alias = field_at(&row, Some(alias_idx));
        if district_name.is_empty() || alias.is_empty() {
            skipped += 1;
            continue;
        }
        aliases.push(DistrictAlias {
            district_name,
            alias,
        });
    }
    if skipped > 0 {
        tracing::warn!(skipped, "Skipped malformed district alias rows");
    }
    Ok(aliases)
}

/// Uppercases, turns punctuation into spaces and collapses whitespace, so
/// `"No 12, M.G. Road,Bangalore-560001"` becomes `"NO 12 M G ROAD BANGALORE 560001"`.
pub fn normalize_match_text(text: &str) -> String {
    let mapped: String = text
        .chars()
        .map(|c| {
            if c.is_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                ' '
            }
        })
        .collect();
    mapped.split_whitespace().collect::<Vec<_>>().join(" ")
}

struct Pattern {
    /// Normalized text padded with one space on each side for whole-word search.
    needle: String,
    district_idx: usize,
}

/// Longest whole-word match of district names and aliases inside free text.
pub struct DistrictMatcher {
    districts: Vec<District>,
    patterns: Vec<Pattern>,
}

impl DistrictMatcher {
    pub fn new(districts: Vec<District>, aliases: &[DistrictAlias]) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut patterns = Vec::new();

        for (idx, district) in districts.iter().enumerate() {
            let norm = normalize_match_text(&district.name);
            if !norm.is_empty() && seen.insert(norm.clone()) {
                patterns.push(Pattern {
                    needle: format!(" {norm} "),
                    district_idx: idx,
                });
            }
        }

        for alias in aliases {
            let target = normalize_match_text(&alias.district_name);
            let Some(idx) = districts
                .iter()
                .position(|d| normalize_match_text(&d.name) == target)
            else {
                continue;
            };
            let norm = normalize_match_text(&alias.alias);
            if !norm.is_empty() && seen.insert(norm.clone()) {
                patterns.push(Pattern {
                    needle: format!(" {norm} "),
                    district_idx: idx,
                });
            }
        }

        // Stable: equal lengths keep reference-then-alias order.
        patterns.sort_by(|a, b| b.needle.len().cmp(&a.needle.len()));

        Self {
            districts,
            patterns,
        }
    }

    pub fn districts(&self) -> &[District] {
        &self.districts
    }

    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    pub fn match_text(&self, text: &str) -> Option<&District> {
        let norm = normalize_match_text(text);
        if norm.is_empty() {
            return None;
        }
        let haystack = format!(" {norm} ");
        self.patterns
            .iter()
            .find(|p| haystack.contains(&p.needle))
            .map(|p| &self.districts[p.district_idx])
    }

    /// Tries the explicit district field first, then the free-text address.
    pub fn resolve(&self, explicit: &str, address: &str) -> Option<District> {
        self.match_text(explicit)
            .or_else(|| self.match_text(address))
            .cloned()
    }
}
