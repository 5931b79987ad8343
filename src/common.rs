use anyhow::{Context, Result};
use csv::StringRecord;
use std::{
    fs,
    path::{Path, PathBuf},
};

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed creating {}", parent.display()))?;
        }
    }
    Ok(())
}

/// Sibling path used while an output is being written; renamed into place once complete.
pub fn tmp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|x| x.to_str())
        .unwrap_or("output");
    path.with_file_name(format!("{file_name}.tmp"))
}

pub fn commit_tmp(tmp_path: &Path, path: &Path) -> Result<()> {
    fs::rename(tmp_path, path)
        .with_context(|| format!("Failed moving {} -> {}", tmp_path.display(), path.display()))
}

pub fn discard_tmp(tmp_path: &Path) {
    let _ = fs::remove_file(tmp_path);
}

pub fn normalize_header_name(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

pub fn find_header_index(headers: &StringRecord, aliases: &[&str]) -> Option<usize> {
    let header_norm: Vec<String> = headers.iter().map(normalize_header_name).collect();
    for alias in aliases {
        let target = normalize_header_name(alias);
        if let Some((idx, _)) = header_norm.iter().enumerate().find(|(_, h)| **h == target) {
            return Some(idx);
        }
    }
    None
}

pub fn field_at(record: &StringRecord, idx: Option<usize>) -> String {
    idx.and_then(|i| record.get(i))
        .map(str::trim)
        .unwrap_or("")
        .to_string()
}

pub fn format_count(value: usize) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().rev().enumerate() {
        if idx > 0 && idx % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.chars().rev().collect()
}

/// One-decimal percentage without the `%` sign, `0.0` for an empty denominator.
pub fn fmt_pct(numer: usize, denom: usize) -> String {
    if denom == 0 {
        return "0.0".to_string();
    }
    format!("{:.1}", (numer as f64) * 100.0 / (denom as f64))
}

/// Count descending, then key ascending.
pub fn sorted_counts(mut counts: Vec<(String, usize)>) -> Vec<(String, usize)> {
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_aliases_ignore_case_and_punctuation() {
        let headers = StringRecord::from(vec!["Establishment Name", "System-of-Medicine"]);
        assert_eq!(
            find_header_index(&headers, &["establishment_name", "name"]),
            Some(0)
        );
        assert_eq!(find_header_index(&headers, &["system_of_medicine"]), Some(1));
        assert_eq!(find_header_index(&headers, &["category"]), None);
    }

    #[test]
    fn field_at_trims_and_defaults_to_empty() {
        let record = StringRecord::from(vec!["  Apollo  ", ""]);
        assert_eq!(field_at(&record, Some(0)), "Apollo");
        assert_eq!(field_at(&record, Some(5)), "");
        assert_eq!(field_at(&record, None), "");
    }

    #[test]
    fn percentages_use_one_decimal() {
        assert_eq!(fmt_pct(7, 10), "70.0");
        assert_eq!(fmt_pct(1, 3), "33.3");
        assert_eq!(fmt_pct(3, 0), "0.0");
    }

    #[test]
    fn counts_sort_by_count_then_key() {
        let sorted = sorted_counts(vec![
            ("B".to_string(), 2),
            ("A".to_string(), 2),
            ("C".to_string(), 5),
        ]);
        let keys: Vec<&str> = sorted.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["C", "A", "B"]);
    }

    #[test]
    fn format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(4219), "4,219");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn tmp_path_is_a_sibling() {
        let tmp = tmp_path_for(Path::new("out/master.csv"));
        assert_eq!(tmp, PathBuf::from("out/master.csv.tmp"));
    }
}
