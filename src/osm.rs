use anyhow::{Context, Result, bail};
use csv::StringRecord;
use serde::Deserialize;
use serde_json::Value;
use std::{io::Read, path::Path};

use crate::common::{field_at, find_header_index};
use crate::district::DistrictMatcher;
use crate::error::RowError;
use crate::record::{Coordinates, Facility, MasterRecord};
use crate::sources::{SourceBatch, SourceKind, check_width, csv_reader};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsmFormat {
    Csv,
    /// The Overpass fetcher's extract: `{"facilities": [...]}` or a bare array.
    Json,
}

impl OsmFormat {
    pub fn from_path(path: &Path) -> Self {
        let is_json = path
            .extension()
            .and_then(|x| x.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json { OsmFormat::Json } else { OsmFormat::Csv }
    }
}

/// Source-neutral view of one OSM facility before validation.
#[derive(Debug, Default)]
struct RawFacility {
    name: String,
    amenity: String,
    latitude: String,
    longitude: String,
    address: String,
    street: String,
    city: String,
    postcode: String,
    phone: String,
    osm_id: String,
    osm_type: String,
    speciality: String,
    /// District the Overpass query was run for; empty for state-wide queries.
    queried_district: String,
    /// `addr:district` tag of the element itself.
    address_district: String,
}

impl RawFacility {
    fn into_record(self, matcher: &DistrictMatcher) -> Result<MasterRecord, RowError> {
        if self.name.is_empty() {
            return Err(RowError::MissingField("name"));
        }

        let address = if self.address.is_empty() {
            [self.street.as_str(), self.city.as_str(), self.postcode.as_str()]
                .into_iter()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(", ")
        } else {
            self.address
        };
        let district = matcher
            .match_text(&self.queried_district)
            .or_else(|| matcher.match_text(&self.address_district))
            .or_else(|| matcher.match_text(&address))
            .cloned();
        let facility_type = if self.amenity.is_empty() {
            "UNKNOWN".to_string()
        } else {
            self.amenity.to_uppercase()
        };

        Ok(MasterRecord::HealthcareFacility(Facility {
            district,
            facility_type,
            facility_name: self.name,
            coordinates: parse_coordinates(&self.latitude, &self.longitude),
            phone: self.phone,
            address,
            specialization: self.speciality,
            osm_id: self.osm_id,
            osm_type: self.osm_type,
        }))
    }
}

/// Both halves must parse as finite numbers in range, otherwise the pair is
/// treated as absent.
pub fn parse_coordinates(latitude: &str, longitude: &str) -> Option<Coordinates> {
    let lat_text = latitude.trim();
    let lon_text = longitude.trim();
    let lat: f64 = lat_text.parse().ok()?;
    let lon: f64 = lon_text.parse().ok()?;
    if !lat.is_finite() || !lon.is_finite() {
        return None;
    }
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lon) {
        return None;
    }
    Some(Coordinates {
        latitude: lat_text.to_string(),
        longitude: lon_text.to_string(),
    })
}

struct OsmColumns {
    name: usize,
    amenity: Option<usize>,
    latitude: Option<usize>,
    longitude: Option<usize>,
    address: Option<usize>,
    street: Option<usize>,
    city: Option<usize>,
    postcode: Option<usize>,
    phone: Option<usize>,
    osm_id: Option<usize>,
    osm_type: Option<usize>,
    speciality: Option<usize>,
    queried_district: Option<usize>,
    address_district: Option<usize>,
}

impl OsmColumns {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let name = find_header_index(headers, &["name", "facility_name"])
            .context("OSM CSV is missing a name column")?;
        Ok(Self {
            name,
            amenity: find_header_index(headers, &["amenity", "facility_type", "type"]),
            latitude: find_header_index(headers, &["latitude", "lat"]),
            longitude: find_header_index(headers, &["longitude", "lon", "lng"]),
            address: find_header_index(headers, &["address", "full_address"]),
            street: find_header_index(headers, &["street", "addr:street", "address_street"]),
            city: find_header_index(headers, &["city", "addr:city", "address_city"]),
            postcode: find_header_index(
                headers,
                &["postcode", "pincode", "addr:postcode", "address_postcode"],
            ),
            phone: find_header_index(headers, &["phone", "contact_phone", "contact:phone"]),
            osm_id: find_header_index(headers, &["osm_id", "id"]),
            osm_type: find_header_index(headers, &["osm_type", "element_type"]),
            speciality: find_header_index(
                headers,
                &["healthcare_speciality", "healthcare:speciality", "speciality", "specialization"],
            ),
            queried_district: find_header_index(headers, &["queried_district"]),
            address_district: find_header_index(
                headers,
                &["district", "addr:district", "address_district"],
            ),
        })
    }

    fn raw(&self, row: &StringRecord) -> RawFacility {
        RawFacility {
            name: field_at(row, Some(self.name)),
            amenity: field_at(row, self.amenity),
            latitude: field_at(row, self.latitude),
            longitude: field_at(row, self.longitude),
            address: field_at(row, self.address),
            street: field_at(row, self.street),
            city: field_at(row, self.city),
            postcode: field_at(row, self.postcode),
            phone: field_at(row, self.phone),
            osm_id: field_at(row, self.osm_id),
            osm_type: field_at(row, self.osm_type),
            speciality: field_at(row, self.speciality),
            queried_district: field_at(row, self.queried_district),
            address_district: field_at(row, self.address_district),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonFacility {
    osm_id: Option<Value>,
    osm_type: Option<Value>,
    name: Option<Value>,
    amenity: Option<Value>,
    healthcare_speciality: Option<Value>,
    location: Option<JsonLocation>,
    contact: Option<JsonContact>,
    address: Option<JsonAddress>,
    queried_district: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonLocation {
    latitude: Option<Value>,
    longitude: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonContact {
    phone: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct JsonAddress {
    street: Option<Value>,
    city: Option<Value>,
    postcode: Option<Value>,
    district: Option<Value>,
}

fn value_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

impl JsonFacility {
    fn raw(self) -> RawFacility {
        let location = self.location.unwrap_or_default();
        let contact = self.contact.unwrap_or_default();
        let address = self.address.unwrap_or_default();
        RawFacility {
            name: value_text(self.name.as_ref()),
            amenity: value_text(self.amenity.as_ref()),
            latitude: value_text(location.latitude.as_ref()),
            longitude: value_text(location.longitude.as_ref()),
            address: String::new(),
            street: value_text(address.street.as_ref()),
            city: value_text(address.city.as_ref()),
            postcode: value_text(address.postcode.as_ref()),
            phone: value_text(contact.phone.as_ref()),
            osm_id: value_text(self.osm_id.as_ref()),
            osm_type: value_text(self.osm_type.as_ref()),
            speciality: value_text(self.healthcare_speciality.as_ref()),
            queried_district: value_text(self.queried_district.as_ref()),
            address_district: value_text(address.district.as_ref()),
        }
    }
}

fn read_csv_facilities<R: Read>(reader: R, matcher: &DistrictMatcher) -> Result<SourceBatch> {
    let mut reader = csv_reader(reader);
    let headers = reader
        .headers()
        .context("Failed reading OSM CSV headers")?
        .clone();
    let cols = OsmColumns::resolve(&headers)?;

    let mut batch = SourceBatch::new(SourceKind::Osm);
    for row in reader.records() {
        match row {
            Ok(row) => batch.push(
                check_width(&row, headers.len())
                    .and_then(|()| cols.raw(&row).into_record(matcher)),
            ),
            Err(err) => batch.push_csv_error(err)?,
        }
    }
    Ok(batch)
}

fn read_json_facilities<R: Read>(reader: R, matcher: &DistrictMatcher) -> Result<SourceBatch> {
    let document: Value =
        serde_json::from_reader(reader).context("Failed parsing OSM JSON extract")?;
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(mut map) => match map.remove("facilities") {
            Some(Value::Array(entries)) => entries,
            _ => bail!("OSM JSON extract has no `facilities` array"),
        },
        _ => bail!("OSM JSON extract must be an object or an array"),
    };

    let mut batch = SourceBatch::new(SourceKind::Osm);
    for entry in entries {
        if !entry.is_object() {
            batch.push(Err(RowError::Malformed(
                "facility entry is not an object".to_string(),
            )));
            continue;
        }
        let outcome = serde_json::from_value::<JsonFacility>(entry)
            .map_err(|err| RowError::Malformed(err.to_string()))
            .and_then(|facility| facility.raw().into_record(matcher));
        batch.push(outcome);
    }
    Ok(batch)
}

pub fn read_facilities<R: Read>(
    reader: R,
    format: OsmFormat,
    matcher: &DistrictMatcher,
) -> Result<SourceBatch> {
    match format {
        OsmFormat::Csv => read_csv_facilities(reader, matcher),
        OsmFormat::Json => read_json_facilities(reader, matcher),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::district::District;

    fn matcher() -> DistrictMatcher {
        DistrictMatcher::new(
            vec![
                District {
                    id: "1".to_string(),
                    name: "BANGALORE".to_string(),
                    iso_code: "KA-BN".to_string(),
                },
                District {
                    id: "2".to_string(),
                    name: "MYSURU".to_string(),
                    iso_code: "KA-MY".to_string(),
                },
                District {
                    id: "3".to_string(),
                    name: "UDUPI".to_string(),
                    iso_code: "KA-UD".to_string(),
                },
            ],
            &[],
        )
    }

    fn facility(record: &MasterRecord) -> &Facility {
        match record {
            MasterRecord::HealthcareFacility(f) => f,
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn coordinates_need_both_numeric_halves_in_range() {
        assert!(parse_coordinates("12.97", "77.59").is_some());
        assert!(parse_coordinates(" 12.97 ", "77.59").is_some());
        assert!(parse_coordinates("", "77.59").is_none());
        assert!(parse_coordinates("12.97", "").is_none());
        assert!(parse_coordinates("abc", "77.59").is_none());
        assert!(parse_coordinates("NaN", "77.59").is_none());
        assert!(parse_coordinates("inf", "77.59").is_none());
        assert!(parse_coordinates("95.0", "77.59").is_none());
        assert!(parse_coordinates("12.97", "-181").is_none());
    }

    #[test]
    fn csv_rows_with_bad_coordinates_are_kept_without_them() {
        let csv = "\
name,amenity,latitude,longitude,street,city,postcode,phone,osm_id,osm_type
City Hospital,hospital,12.97,77.59,MG Road,Bangalore,560001,080-1,11,node
Corner Clinic,clinic,north,77.1,,Mysuru,,,12,way
";
        let batch = read_facilities(csv.as_bytes(), OsmFormat::Csv, &matcher()).unwrap();
        assert_eq!(batch.stats.rows_skipped, 0);
        assert_eq!(batch.records.len(), 2);

        let first = facility(&batch.records[0]);
        assert_eq!(first.facility_type, "HOSPITAL");
        assert_eq!(first.address, "MG Road, Bangalore, 560001");
        assert_eq!(first.district.as_ref().map(|d| d.name.as_str()), Some("BANGALORE"));
        assert_eq!(first.coordinates.as_ref().map(|c| c.latitude.as_str()), Some("12.97"));

        let second = batch.records[1].to_row();
        assert_eq!(second.latitude, "");
        assert_eq!(second.longitude, "");
        assert_eq!(second.district_name, "MYSURU");
        assert_eq!(second.description, "OSM ID: 12, Type: way");
    }

    #[test]
    fn district_column_backs_up_an_empty_queried_district() {
        let csv = "\
osm_id,osm_type,name,amenity,district,postcode,phone,queried_district
21,node,Car Street Clinic,clinic,Udupi,576101,,
22,node,Palace Clinic,clinic,Udupi,,,Mysuru
23,node,Plain Clinic,clinic,,,,
";
        let batch = read_facilities(csv.as_bytes(), OsmFormat::Csv, &matcher()).unwrap();
        let districts: Vec<String> = batch
            .records
            .iter()
            .map(|r| r.to_row().district_name)
            .collect();
        assert_eq!(districts, ["UDUPI", "MYSURU", ""]);
    }

    #[test]
    fn overlong_csv_row_is_skipped() {
        let csv = "name,amenity,street,city\nA,clinic,MG Road, 2nd Cross,Udupi\nB,clinic,,Udupi\n";
        let batch = read_facilities(csv.as_bytes(), OsmFormat::Csv, &matcher()).unwrap();
        assert_eq!(batch.stats.rows_skipped, 1);
        assert_eq!(batch.records.len(), 1);
        assert_eq!(facility(&batch.records[0]).facility_name, "B");
    }

    #[test]
    fn missing_amenity_becomes_unknown_and_missing_name_is_skipped() {
        let csv = "name,amenity\nWellness Point,\n,pharmacy\n";
        let batch = read_facilities(csv.as_bytes(), OsmFormat::Csv, &matcher()).unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(facility(&batch.records[0]).facility_type, "UNKNOWN");
        assert_eq!(batch.stats.skip_reasons.get("empty name"), Some(&1));
    }

    #[test]
    fn json_extract_matches_fetcher_layout() {
        let json = r#"{
            "facilities": [
                {
                    "osm_id": 123456,
                    "osm_type": "node",
                    "name": "Jayadeva Hospital",
                    "amenity": "hospital",
                    "healthcare_speciality": "cardiology",
                    "location": {"latitude": 12.9178, "longitude": 77.5996},
                    "contact": {"phone": "+91 80 2297 7400"},
                    "address": {"street": "Bannerghatta Road", "city": "Bengaluru", "postcode": "560069"},
                    "queried_district": "Bangalore"
                },
                {
                    "osm_id": 2,
                    "name": "No Location Pharmacy",
                    "amenity": "pharmacy",
                    "location": {"latitude": "unknown"}
                },
                "not an object",
                {"osm_id": 3, "name": ["not", "text"], "amenity": "clinic"}
            ]
        }"#;
        let batch = read_facilities(json.as_bytes(), OsmFormat::Json, &matcher()).unwrap();
        assert_eq!(batch.stats.rows_read, 4);
        assert_eq!(batch.stats.rows_skipped, 2);

        let row = batch.records[0].to_row();
        assert_eq!(row.facility_type, "HOSPITAL");
        assert_eq!(row.latitude, "12.9178");
        assert_eq!(row.longitude, "77.5996");
        assert_eq!(row.phone, "+91 80 2297 7400");
        assert_eq!(row.specialization, "cardiology");
        assert_eq!(row.district_name, "BANGALORE");
        assert_eq!(row.address, "Bannerghatta Road, Bengaluru, 560069");
        assert_eq!(row.description, "OSM ID: 123456, Type: node");

        let row = batch.records[1].to_row();
        assert_eq!(row.latitude, "");
        assert_eq!(row.district_name, "");
    }

    #[test]
    fn json_extract_accepts_bare_array() {
        let json = r#"[{"name": "A", "amenity": "doctors"}]"#;
        let batch = read_facilities(json.as_bytes(), OsmFormat::Json, &matcher()).unwrap();
        assert_eq!(batch.records.len(), 1);
    }

    #[test]
    fn json_without_facilities_fails_the_source() {
        let err = read_facilities(r#"{"elements": []}"#.as_bytes(), OsmFormat::Json, &matcher())
            .unwrap_err();
        assert!(err.to_string().contains("facilities"));
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(OsmFormat::from_path(Path::new("osm.JSON")), OsmFormat::Json);
        assert_eq!(OsmFormat::from_path(Path::new("osm.csv")), OsmFormat::Csv);
        assert_eq!(OsmFormat::from_path(Path::new("osm")), OsmFormat::Csv);
    }
}
