use anyhow::{Context, Result};
use csv::StringRecord;
use std::{collections::HashMap, io::Read};

use crate::common::{field_at, find_header_index};
use crate::district::District;
use crate::error::RowError;
use crate::record::{MasterRecord, ReferenceEntry};
use crate::sources::{SourceBatch, SourceKind, check_width, csv_reader};

/// Which per-system reference list a file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceList {
    Specializations,
    Degrees,
    Councils,
}

impl ReferenceList {
    pub fn source_kind(&self) -> SourceKind {
        match self {
            ReferenceList::Specializations => SourceKind::Specializations,
            ReferenceList::Degrees => SourceKind::Degrees,
            ReferenceList::Councils => SourceKind::Councils,
        }
    }

    fn value_column(&self) -> &'static str {
        match self {
            ReferenceList::Specializations => "specialization",
            ReferenceList::Degrees => "degree",
            ReferenceList::Councils => "council",
        }
    }

    fn value_aliases(&self) -> &'static [&'static str] {
        match self {
            ReferenceList::Specializations => {
                &["specialization", "speciality", "specialization_name", "name"]
            }
            ReferenceList::Degrees => &["degree", "degree_name", "qualification", "name"],
            ReferenceList::Councils => &["council", "council_name", "medical_council", "name"],
        }
    }

    fn wrap(&self, entry: ReferenceEntry) -> MasterRecord {
        match self {
            ReferenceList::Specializations => MasterRecord::SpecializationReference(entry),
            ReferenceList::Degrees => MasterRecord::DegreeReference(entry),
            ReferenceList::Councils => MasterRecord::CouncilReference(entry),
        }
    }
}

fn district_row(
    row: &StringRecord,
    id_idx: usize,
    name_idx: usize,
    iso_idx: Option<usize>,
) -> Result<District, RowError> {
    let id = field_at(row, Some(id_idx));
    if id.is_empty() {
        return Err(RowError::MissingField("district_id"));
    }
    let name = field_at(row, Some(name_idx)).to_uppercase();
    if name.is_empty() {
        return Err(RowError::MissingField("district_name"));
    }
    Ok(District {
        id,
        name,
        iso_code: field_at(row, iso_idx),
    })
}

/// Reads the district table. The returned districts are the kept rows in file
/// order and seed the [`crate::district::DistrictMatcher`].
pub fn read_districts<R: Read>(reader: R) -> Result<(SourceBatch, Vec<District>)> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .context("Failed reading district headers")?
        .clone();
    let id_idx = find_header_index(&headers, &["district_id", "id", "identifier"])
        .context("District table is missing a district_id column")?;
    let name_idx = find_header_index(&headers, &["district_name", "name", "district"])
        .context("District table is missing a district_name column")?;
    let iso_idx = find_header_index(&headers, &["district_iso_code", "iso_code", "district_iso"]);

    let mut batch = SourceBatch::new(SourceKind::Districts);
    let mut districts = Vec::new();
    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                batch.push_csv_error(err)?;
                continue;
            }
        };
        let outcome = check_width(&row, headers.len())
            .and_then(|()| district_row(&row, id_idx, name_idx, iso_idx));
        if let Ok(district) = &outcome {
            districts.push(district.clone());
        }
        batch.push(outcome.map(MasterRecord::DistrictReference));
    }
    Ok((batch, districts))
}

/// Reads a `system_of_medicine, <value>` list. Entries are numbered from 1
/// within each system of medicine, in file order.
pub fn read_reference_list<R: Read>(reader: R, list: ReferenceList) -> Result<SourceBatch> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .with_context(|| format!("Failed reading {} headers", list.source_kind()))?
        .clone();
    let system_idx = find_header_index(
        &headers,
        &["system_of_medicine", "system", "medicine_system"],
    )
    .with_context(|| {
        format!(
            "{} table is missing a system_of_medicine column",
            list.source_kind()
        )
    })?;
    let value_idx = find_header_index(&headers, list.value_aliases()).with_context(|| {
        format!(
            "{} table is missing a {} column",
            list.source_kind(),
            list.value_column()
        )
    })?;

    let mut batch = SourceBatch::new(list.source_kind());
    let mut positions: HashMap<String, usize> = HashMap::new();
    for row in reader.records() {
        let row = match row {
            Ok(row) => row,
            Err(err) => {
                batch.push_csv_error(err)?;
                continue;
            }
        };
        if let Err(err) = check_width(&row, headers.len()) {
            batch.push(Err(err));
            continue;
        }
        let system_of_medicine = field_at(&row, Some(system_idx));
        if system_of_medicine.is_empty() {
            batch.push(Err(RowError::MissingField("system_of_medicine")));
            continue;
        }
        let value = field_at(&row, Some(value_idx));
        if value.is_empty() {
            batch.push(Err(RowError::MissingField(list.value_column())));
            continue;
        }

        let position = positions.entry(system_of_medicine.clone()).or_insert(0);
        *position += 1;
        batch.push(Ok(list.wrap(ReferenceEntry {
            system_of_medicine,
            value,
            position: *position,
        })));
    }
    Ok(batch)
}
