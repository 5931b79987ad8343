use anyhow::{Context, Result};
use csv::StringRecord;
use std::io::Read;

use crate::common::{field_at, find_header_index};
use crate::district::DistrictMatcher;
use crate::error::RowError;
use crate::record::{Establishment, MasterRecord};
use crate::sources::{SourceBatch, SourceKind, check_width, csv_reader};

struct KpmeColumns {
    name: usize,
    category: usize,
    system_of_medicine: Option<usize>,
    address: Option<usize>,
    certificate_number: Option<usize>,
    certificate_validity: Option<usize>,
    district: Option<usize>,
}

impl KpmeColumns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let name = find_header_index(
            headers,
            &["establishment_name", "name_of_establishment", "name", "establishment"],
        )
        .context("KPME CSV is missing an establishment_name column")?;
        let category = find_header_index(
            headers,
            &["category", "establishment_category", "establishment_type", "type"],
        )
        .context("KPME CSV is missing a category column")?;

        Ok(Self {
            name,
            category,
            system_of_medicine: find_header_index(
                headers,
                &["system_of_medicine", "system", "medicine_system"],
            ),
            address: find_header_index(headers, &["address", "establishment_address"]),
            certificate_number: find_header_index(
                headers,
                &["certificate_number", "certificate_no", "registration_number", "cert_no"],
            ),
            certificate_validity: find_header_index(
                headers,
                &["certificate_validity", "validity", "valid_upto", "valid_till"],
            ),
            district: find_header_index(headers, &["district", "district_name"]),
        })
    }
}

fn map_row(
    cols: &KpmeColumns,
    row: &StringRecord,
    matcher: &DistrictMatcher,
) -> Result<MasterRecord, RowError> {
    let facility_name = field_at(row, Some(cols.name));
    if facility_name.is_empty() {
        return Err(RowError::MissingField("establishment_name"));
    }
    let category = field_at(row, Some(cols.category));
    if category.is_empty() {
        return Err(RowError::MissingField("category"));
    }

    let address = field_at(row, cols.address);
    let district = matcher.resolve(&field_at(row, cols.district), &address);

    Ok(MasterRecord::KpmeEstablishment(Establishment {
        district,
        facility_type: category.to_uppercase(),
        facility_name,
        address,
        system_of_medicine: field_at(row, cols.system_of_medicine),
        certificate_number: field_at(row, cols.certificate_number),
        certificate_validity: field_at(row, cols.certificate_validity),
    }))
}

/// Maps the scraper's KPME export onto establishment records.
pub fn read_establishments<R: Read>(reader: R, matcher: &DistrictMatcher) -> Result<SourceBatch> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .context("Failed reading KPME CSV headers")?
        .clone();
    let cols = KpmeColumns::resolve(&headers)?;

    let mut batch = SourceBatch::new(SourceKind::Kpme);
    for row in reader.records() {
        match row {
            Ok(row) => batch.push(
                check_width(&row, headers.len()).and_then(|()| map_row(&cols, &row, matcher)),
            ),
            Err(err) => batch.push_csv_error(err)?,
        }
    }
    Ok(batch)
}
