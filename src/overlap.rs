use anyhow::{Context, Result};
use serde::Serialize;
use std::{collections::HashMap, fs::File, path::Path};

use crate::common::{commit_tmp, discard_tmp, ensure_parent_dir, tmp_path_for};
use crate::district::normalize_match_text;
use crate::record::MasterRecord;

/// A KPME establishment and an OSM facility that look like the same place.
/// Row numbers are 1-based positions among the unified table's data rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlapPair {
    pub kpme_row: usize,
    pub osm_row: usize,
    pub district_name: String,
    pub match_key: String,
    pub kpme_facility_name: String,
    pub osm_facility_name: String,
    pub kpme_facility_type: String,
    pub osm_facility_type: String,
}

/// Pairs KPME and OSM rows that share a normalized facility name and a matched
/// district. Rows without a district never pair. The table is not modified.
pub fn find_overlaps(records: &[MasterRecord]) -> Vec<OverlapPair> {
    let mut osm_index: HashMap<(String, String), Vec<usize>> = HashMap::new();
    for (idx, record) in records.iter().enumerate() {
        let MasterRecord::HealthcareFacility(facility) = record else {
            continue;
        };
        let Some(district) = &facility.district else {
            continue;
        };
        let key = normalize_match_text(&facility.facility_name);
        if key.is_empty() {
            continue;
        }
        osm_index
            .entry((key, district.id.clone()))
            .or_default()
            .push(idx);
    }

    let mut pairs = Vec::new();
    for (kpme_idx, record) in records.iter().enumerate() {
        let MasterRecord::KpmeEstablishment(establishment) = record else {
            continue;
        };
        let Some(district) = &establishment.district else {
            continue;
        };
        let key = normalize_match_text(&establishment.facility_name);
        let Some(osm_rows) = osm_index.get(&(key.clone(), district.id.clone())) else {
            continue;
        };
        for &osm_idx in osm_rows {
            let MasterRecord::HealthcareFacility(facility) = &records[osm_idx] else {
                continue;
            };
            pairs.push(OverlapPair {
                kpme_row: kpme_idx + 1,
                osm_row: osm_idx + 1,
                district_name: district.name.clone(),
                match_key: key.clone(),
                kpme_facility_name: establishment.facility_name.clone(),
                osm_facility_name: facility.facility_name.clone(),
                kpme_facility_type: establishment.facility_type.clone(),
                osm_facility_type: facility.facility_type.clone(),
            });
        }
    }
    pairs
}

pub fn write_overlap_report(path: &Path, pairs: &[OverlapPair]) -> Result<()> {
    ensure_parent_dir(path)?;
    let tmp_path = tmp_path_for(path);
    let written = (|| -> Result<()> {
        let file = File::create(&tmp_path)
            .with_context(|| format!("Failed creating {}", tmp_path.display()))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record([
            "kpme_row",
            "osm_row",
            "district_name",
            "match_key",
            "kpme_facility_name",
            "osm_facility_name",
            "kpme_facility_type",
            "osm_facility_type",
        ])?;
        for pair in pairs {
            writer.serialize(pair)?;
        }
        writer.flush()?;
        Ok(())
    })();
    if let Err(err) = written {
        discard_tmp(&tmp_path);
        return Err(err)
            .with_context(|| format!("Failed writing overlap report {}", path.display()));
    }
    commit_tmp(&tmp_path, path)
}
