use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::common::{fmt_pct, sorted_counts};
use crate::record::{DataType, MasterRecord};

pub const SUMMARY_COLUMNS: [&str; 5] = ["data_type", "dimension", "value", "count", "percentage"];

/// Value used when a breakdown dimension is blank on a row.
pub const UNSPECIFIED: &str = "UNSPECIFIED";

/// Total rows leave `dimension` and `value` empty; breakdown rows take their
/// percentage from the data type's subtotal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryRow {
    pub data_type: String,
    pub dimension: String,
    pub value: String,
    pub count: usize,
    pub percentage: String,
}

type Dimension = (&'static str, fn(&MasterRecord) -> Option<String>);

fn system_of_medicine(record: &MasterRecord) -> Option<String> {
    match record {
        MasterRecord::KpmeEstablishment(e) => Some(e.system_of_medicine.clone()),
        _ => None,
    }
}

fn facility_type(record: &MasterRecord) -> Option<String> {
    match record {
        MasterRecord::HealthcareFacility(f) => Some(f.facility_type.clone()),
        _ => None,
    }
}

fn district_match(record: &MasterRecord) -> Option<String> {
    let label = if record.district().is_some() {
        "MATCHED"
    } else {
        "UNMATCHED"
    };
    Some(label.to_string())
}

fn coordinates(record: &MasterRecord) -> Option<String> {
    match record {
        MasterRecord::HealthcareFacility(f) => Some(
            if f.coordinates.is_some() {
                "PRESENT"
            } else {
                "ABSENT"
            }
            .to_string(),
        ),
        _ => None,
    }
}

const KPME_DIMENSIONS: &[Dimension] = &[
    ("system_of_medicine", system_of_medicine),
    ("district_match", district_match),
];

const FACILITY_DIMENSIONS: &[Dimension] = &[
    ("facility_type", facility_type),
    ("district_match", district_match),
    ("coordinates", coordinates),
];

fn dimensions(data_type: DataType) -> &'static [Dimension] {
    match data_type {
        DataType::KpmeEstablishment => KPME_DIMENSIONS,
        DataType::HealthcareFacility => FACILITY_DIMENSIONS,
        _ => &[],
    }
}

/// Builds the summary table: per data type a total row, then each of its
/// breakdowns sorted by count descending and value ascending.
pub fn summarize(records: &[MasterRecord]) -> Vec<SummaryRow> {
    let total = records.len();
    let mut by_type: BTreeMap<DataType, Vec<&MasterRecord>> = BTreeMap::new();
    for record in records {
        by_type.entry(record.data_type()).or_default().push(record);
    }

    let mut out = Vec::new();
    for data_type in DataType::ALL {
        let Some(group) = by_type.get(&data_type) else {
            continue;
        };
        let subtotal = group.len();
        out.push(SummaryRow {
            data_type: data_type.as_str().to_string(),
            dimension: String::new(),
            value: String::new(),
            count: subtotal,
            percentage: fmt_pct(subtotal, total),
        });

        for &(dimension, value_of) in dimensions(data_type) {
            let mut counts: HashMap<String, usize> = HashMap::new();
            for record in group.iter().copied() {
                let Some(value) = value_of(record) else {
                    continue;
                };
                let value = if value.is_empty() {
                    UNSPECIFIED.to_string()
                } else {
                    value
                };
                *counts.entry(value).or_insert(0) += 1;
            }
            for (value, count) in sorted_counts(counts.into_iter().collect()) {
                out.push(SummaryRow {
                    data_type: data_type.as_str().to_string(),
                    dimension: dimension.to_string(),
                    value,
                    count,
                    percentage: fmt_pct(count, subtotal),
                });
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::district::District;
    use crate::record::{Coordinates, Establishment, Facility, ReferenceEntry};

    fn establishment(system: &str, matched: bool) -> MasterRecord {
        MasterRecord::KpmeEstablishment(Establishment {
            district: matched.then(|| District {
                id: "1".to_string(),
                name: "UDUPI".to_string(),
                iso_code: "KA-UD".to_string(),
            }),
            facility_type: "CLINIC".to_string(),
            facility_name: "X".to_string(),
            address: String::new(),
            system_of_medicine: system.to_string(),
            certificate_number: String::new(),
            certificate_validity: String::new(),
        })
    }

    fn facility(kind: &str, located: bool) -> MasterRecord {
        MasterRecord::HealthcareFacility(Facility {
            district: None,
            facility_type: kind.to_string(),
            facility_name: "Y".to_string(),
            coordinates: located.then(|| Coordinates {
                latitude: "12.0".to_string(),
                longitude: "77.0".to_string(),
            }),
            phone: String::new(),
            address: String::new(),
            specialization: String::new(),
            osm_id: String::new(),
            osm_type: String::new(),
        })
    }

    fn find<'a>(
        rows: &'a [SummaryRow],
        data_type: &str,
        dimension: &str,
        value: &str,
    ) -> &'a SummaryRow {
        rows.iter()
            .find(|r| r.data_type == data_type && r.dimension == dimension && r.value == value)
            .unwrap_or_else(|| panic!("no row {data_type}/{dimension}/{value}"))
    }

    #[test]
    fn system_breakdown_uses_type_subtotal() {
        let mut records = Vec::new();
        records.extend((0..7).map(|i| establishment("Allopathy", i % 2 == 0)));
        records.extend((0..3).map(|_| establishment("Ayurveda", false)));
        records.extend((0..5).map(|i| facility("HOSPITAL", i < 2)));

        let rows = summarize(&records);
        let allopathy = find(&rows, "KPME_ESTABLISHMENT", "system_of_medicine", "Allopathy");
        assert_eq!((allopathy.count, allopathy.percentage.as_str()), (7, "70.0"));
        let ayurveda = find(&rows, "KPME_ESTABLISHMENT", "system_of_medicine", "Ayurveda");
        assert_eq!((ayurveda.count, ayurveda.percentage.as_str()), (3, "30.0"));

        let facilities = find(&rows, "HEALTHCARE_FACILITY", "", "");
        assert_eq!(facilities.count, 5);
        assert_eq!(facilities.percentage, "33.3");

        let present = find(&rows, "HEALTHCARE_FACILITY", "coordinates", "PRESENT");
        assert_eq!((present.count, present.percentage.as_str()), (2, "40.0"));
        let matched = find(&rows, "KPME_ESTABLISHMENT", "district_match", "MATCHED");
        assert_eq!(matched.count, 4);
    }

    #[test]
    fn rows_group_by_type_in_fixed_order() {
        let records = vec![
            MasterRecord::DegreeReference(ReferenceEntry {
                system_of_medicine: "Allopathy".to_string(),
                value: "MBBS".to_string(),
                position: 1,
            }),
            facility("PHARMACY", false),
            facility("CLINIC", false),
            facility("PHARMACY", true),
        ];
        let rows = summarize(&records);
        let labels: Vec<(&str, &str, &str)> = rows
            .iter()
            .map(|r| (r.data_type.as_str(), r.dimension.as_str(), r.value.as_str()))
            .collect();
        assert_eq!(
            labels,
            [
                ("HEALTHCARE_FACILITY", "", ""),
                ("HEALTHCARE_FACILITY", "facility_type", "PHARMACY"),
                ("HEALTHCARE_FACILITY", "facility_type", "CLINIC"),
                ("HEALTHCARE_FACILITY", "district_match", "UNMATCHED"),
                ("HEALTHCARE_FACILITY", "coordinates", "ABSENT"),
                ("HEALTHCARE_FACILITY", "coordinates", "PRESENT"),
                ("DEGREE_REFERENCE", "", ""),
            ]
        );
    }

    #[test]
    fn blank_system_is_reported_as_unspecified() {
        let rows = summarize(&[establishment("", false)]);
        let row = find(&rows, "KPME_ESTABLISHMENT", "system_of_medicine", UNSPECIFIED);
        assert_eq!(row.percentage, "100.0");
    }

    #[test]
    fn empty_input_has_no_rows() {
        assert!(summarize(&[]).is_empty());
    }
}
