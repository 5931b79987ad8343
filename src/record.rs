use serde::Serialize;
use std::fmt;

use crate::constants::{STATE_ISO_CODE, STATE_NAME};
use crate::district::District;

pub const MASTER_COLUMNS: [&str; 17] = [
    "data_type",
    "district_id",
    "district_name",
    "district_iso_code",
    "state",
    "state_iso_code",
    "facility_type",
    "facility_name",
    "latitude",
    "longitude",
    "phone",
    "address",
    "specialization",
    "degree",
    "council",
    "system_of_medicine",
    "description",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataType {
    KpmeEstablishment,
    HealthcareFacility,
    DistrictReference,
    SpecializationReference,
    DegreeReference,
    CouncilReference,
}

impl DataType {
    pub const ALL: [DataType; 6] = [
        DataType::KpmeEstablishment,
        DataType::HealthcareFacility,
        DataType::DistrictReference,
        DataType::SpecializationReference,
        DataType::DegreeReference,
        DataType::CouncilReference,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DataType::KpmeEstablishment => "KPME_ESTABLISHMENT",
            DataType::HealthcareFacility => "HEALTHCARE_FACILITY",
            DataType::DistrictReference => "DISTRICT_REFERENCE",
            DataType::SpecializationReference => "SPECIALIZATION_REFERENCE",
            DataType::DegreeReference => "DEGREE_REFERENCE",
            DataType::CouncilReference => "COUNCIL_REFERENCE",
        }
    }

    pub fn from_label(label: &str) -> Option<DataType> {
        DataType::ALL.into_iter().find(|t| t.as_str() == label)
    }

    /// Columns that may hold a non-empty value for this row kind. Every other
    /// column is always the empty string.
    pub fn permitted_columns(&self) -> &'static [&'static str] {
        match self {
            DataType::KpmeEstablishment => &[
                "data_type",
                "district_id",
                "district_name",
                "district_iso_code",
                "state",
                "state_iso_code",
                "facility_type",
                "facility_name",
                "address",
                "system_of_medicine",
                "description",
            ],
            DataType::HealthcareFacility => &[
                "data_type",
                "district_id",
                "district_name",
                "district_iso_code",
                "state",
                "state_iso_code",
                "facility_type",
                "facility_name",
                "latitude",
                "longitude",
                "phone",
                "address",
                "specialization",
                "description",
            ],
            DataType::DistrictReference => &[
                "data_type",
                "district_id",
                "district_name",
                "district_iso_code",
                "state",
                "state_iso_code",
                "description",
            ],
            DataType::SpecializationReference => &[
                "data_type",
                "state",
                "state_iso_code",
                "specialization",
                "system_of_medicine",
                "description",
            ],
            DataType::DegreeReference => &[
                "data_type",
                "state",
                "state_iso_code",
                "degree",
                "system_of_medicine",
                "description",
            ],
            DataType::CouncilReference => &[
                "data_type",
                "state",
                "state_iso_code",
                "council",
                "system_of_medicine",
                "description",
            ],
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coordinate pair kept as the source text once both halves validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinates {
    pub latitude: String,
    pub longitude: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Establishment {
    pub district: Option<District>,
    pub facility_type: String,
    pub facility_name: String,
    pub address: String,
    pub system_of_medicine: String,
    pub certificate_number: String,
    pub certificate_validity: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Facility {
    pub district: Option<District>,
    pub facility_type: String,
    pub facility_name: String,
    pub coordinates: Option<Coordinates>,
    pub phone: String,
    pub address: String,
    pub specialization: String,
    pub osm_id: String,
    pub osm_type: String,
}

/// One entry of a per-system reference list (specialization, degree or council).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub system_of_medicine: String,
    pub value: String,
    /// 1-based position within its system of medicine.
    pub position: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MasterRecord {
    KpmeEstablishment(Establishment),
    HealthcareFacility(Facility),
    DistrictReference(District),
    SpecializationReference(ReferenceEntry),
    DegreeReference(ReferenceEntry),
    CouncilReference(ReferenceEntry),
}

impl MasterRecord {
    pub fn data_type(&self) -> DataType {
        match self {
            MasterRecord::KpmeEstablishment(_) => DataType::KpmeEstablishment,
            MasterRecord::HealthcareFacility(_) => DataType::HealthcareFacility,
            MasterRecord::DistrictReference(_) => DataType::DistrictReference,
            MasterRecord::SpecializationReference(_) => DataType::SpecializationReference,
            MasterRecord::DegreeReference(_) => DataType::DegreeReference,
            MasterRecord::CouncilReference(_) => DataType::CouncilReference,
        }
    }

    pub fn district(&self) -> Option<&District> {
        match self {
            MasterRecord::KpmeEstablishment(e) => e.district.as_ref(),
            MasterRecord::HealthcareFacility(f) => f.district.as_ref(),
            MasterRecord::DistrictReference(d) => Some(d),
            _ => None,
        }
    }

    pub fn to_row(&self) -> MasterRow {
        let mut row = MasterRow {
            data_type: self.data_type().as_str().to_string(),
            state: STATE_NAME.to_string(),
            state_iso_code: STATE_ISO_CODE.to_string(),
            ..MasterRow::default()
        };
        if let Some(district) = self.district() {
            row.district_id = district.id.clone();
            row.district_name = district.name.clone();
            row.district_iso_code = district.iso_code.clone();
        }

        match self {
            MasterRecord::KpmeEstablishment(e) => {
                row.facility_type = e.facility_type.clone();
                row.facility_name = e.facility_name.clone();
                row.address = e.address.clone();
                row.system_of_medicine = e.system_of_medicine.clone();
                row.description = format!(
                    "KPME Cert: {}, Valid: {}",
                    e.certificate_number, e.certificate_validity
                );
            }
            MasterRecord::HealthcareFacility(f) => {
                row.facility_type = f.facility_type.clone();
                row.facility_name = f.facility_name.clone();
                if let Some(coords) = &f.coordinates {
                    row.latitude = coords.latitude.clone();
                    row.longitude = coords.longitude.clone();
                }
                row.phone = f.phone.clone();
                row.address = f.address.clone();
                row.specialization = f.specialization.clone();
                row.description = format!("OSM ID: {}, Type: {}", f.osm_id, f.osm_type);
            }
            MasterRecord::DistrictReference(d) => {
                row.description = format!("Official Karnataka District Reference - ID {}", d.id);
            }
            MasterRecord::SpecializationReference(entry) => {
                row.specialization = entry.value.clone();
                row.system_of_medicine = entry.system_of_medicine.clone();
                row.description = format!(
                    "{} specialization #{}",
                    entry.system_of_medicine, entry.position
                );
            }
            MasterRecord::DegreeReference(entry) => {
                row.degree = entry.value.clone();
                row.system_of_medicine = entry.system_of_medicine.clone();
                row.description =
                    format!("{} degree #{}", entry.system_of_medicine, entry.position);
            }
            MasterRecord::CouncilReference(entry) => {
                row.council = entry.value.clone();
                row.system_of_medicine = entry.system_of_medicine.clone();
                row.description = format!(
                    "{} medical council #{}",
                    entry.system_of_medicine, entry.position
                );
            }
        }
        row
    }
}

/// Flat serialization form of a [`MasterRecord`]; field order is the CSV column order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MasterRow {
    pub data_type: String,
    pub district_id: String,
    pub district_name: String,
    pub district_iso_code: String,
    pub state: String,
    pub state_iso_code: String,
    pub facility_type: String,
    pub facility_name: String,
    pub latitude: String,
    pub longitude: String,
    pub phone: String,
    pub address: String,
    pub specialization: String,
    pub degree: String,
    pub council: String,
    pub system_of_medicine: String,
    pub description: String,
}

impl MasterRow {
    pub fn values(&self) -> [&str; 17] {
        [
            self.data_type.as_str(),
            self.district_id.as_str(),
            self.district_name.as_str(),
            self.district_iso_code.as_str(),
            self.state.as_str(),
            self.state_iso_code.as_str(),
            self.facility_type.as_str(),
            self.facility_name.as_str(),
            self.latitude.as_str(),
            self.longitude.as_str(),
            self.phone.as_str(),
            self.address.as_str(),
            self.specialization.as_str(),
            self.degree.as_str(),
            self.council.as_str(),
            self.system_of_medicine.as_str(),
            self.description.as_str(),
        ]
    }

    pub fn populated_columns(&self) -> Vec<&'static str> {
        MASTER_COLUMNS
            .iter()
            .zip(self.values())
            .filter(|(_, value)| !value.is_empty())
            .map(|(column, _)| *column)
            .collect()
    }

    /// Columns that are non-empty but not permitted for this row's data type.
    pub fn illegal_columns(&self) -> Vec<&'static str> {
        let Some(data_type) = DataType::from_label(&self.data_type) else {
            return self.populated_columns();
        };
        let permitted = data_type.permitted_columns();
        self.populated_columns()
            .into_iter()
            .filter(|column| !permitted.contains(column))
            .collect()
    }
}
