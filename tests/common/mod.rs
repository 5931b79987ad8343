#![allow(dead_code)]

use std::{fs, path::Path};

use karnataka_master::pipeline::RunConfig;

pub const KPME_CSV: &str = "\
establishment_name,category,system_of_medicine,address,certificate_number,certificate_validity,source,scraped_at
City Care Hospital,Hospital,Allopathy,\"No 12, MG Road, Bangalore\",KPME/001,2027-03-31,kpme,2025-01-01
Sri Clinic,Clinic,Allopathy,\"Car Street, Udupi\",KPME/002,2026-12-31,kpme,2025-01-01
Hill Clinic,Clinic,Allopathy,\"Ooty Road, Nilgiris\",KPME/003,2026-06-30,kpme,2025-01-01
Camp Nursing Home,Nursing Home,Allopathy,\"Camp, Belgaum\",KPME/004,2028-01-31,kpme,2025-01-01
Apex Diagnostics,Diagnostic Lab,Allopathy,\"Jayanagar, Bangalore\",KPME/005,2027-05-31,kpme,2025-01-01
Coastal Hospital,Hospital,Allopathy,\"Manipal, Udupi District\",KPME/006,2029-02-28,kpme,2025-01-01
Metro Clinic,Clinic,Allopathy,\"Indiranagar, Bengaluru\",KPME/007,2026-09-30,kpme,2025-01-01
Ayush Kendra,Clinic,Ayurveda,\"Basavanagudi, Bangalore\",KPME/008,2027-08-31,kpme,2025-01-01
Dhanvantari Vaidyashala,Hospital,Ayurveda,Udupi,KPME/009,2027-10-31,kpme,2025-01-01
Prakriti Ayurveda,Clinic,Ayurveda,\"Tilakwadi, Belagavi\",KPME/010,2026-11-30,kpme,2025-01-01
,Clinic,Allopathy,Bangalore,KPME/011,2026-11-30,kpme,2025-01-01
";

pub const OSM_CSV: &str = "\
name,amenity,latitude,longitude,street,city,postcode,phone,osm_id,osm_type,healthcare_speciality,queried_district
City Care Hospital,hospital,12.9716,77.5946,MG Road,Bangalore,560001,080-2222,1001,node,general,Bangalore
Udupi Pharmacy,pharmacy,13.3409,74.7421,Car Street,Udupi,576101,,1002,node,,Udupi
Nowhere Clinic,clinic,north,77.1,,,,,1003,way,,
Edge Clinic,clinic,95.0,77.1,,Bangalore,,,1004,node,,
Lakeside Doctors,doctors,,,,,,,1005,node,,Belgaum
";

pub const DISTRICTS_CSV: &str = "\
district_id,district_name,district_iso_code
1,Bangalore,KA-BN
2,Udupi,KA-UD
3,Belagavi,KA-BG
";

pub const SPECIALIZATIONS_CSV: &str = "\
system_of_medicine,specialization
Allopathy,Cardiology
Allopathy,Dermatology
Ayurveda,Panchakarma
";

pub const DEGREES_CSV: &str = "\
system_of_medicine,degree
Allopathy,MBBS
Ayurveda,BAMS
";

pub const COUNCILS_CSV: &str = "\
system_of_medicine,council
Allopathy,Karnataka Medical Council
";

/// Rows the fixture produces: 10 KPME, 5 OSM, 3 districts, 3 + 2 + 1 reference entries.
pub const FIXTURE_ROWS: usize = 24;

pub fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

/// Seeds the default data layout under `data_dir` and returns its config.
pub fn seed_fixture(data_dir: &Path) -> RunConfig {
    let config = RunConfig::under(data_dir);
    let sources = &config.sources;
    write(&sources.kpme, KPME_CSV);
    write(&sources.osm, OSM_CSV);
    write(&sources.districts, DISTRICTS_CSV);
    write(&sources.specializations, SPECIALIZATIONS_CSV);
    write(&sources.degrees, DEGREES_CSV);
    write(&sources.councils, COUNCILS_CSV);
    config
}

pub fn read_csv(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
    let mut reader = csv::Reader::from_path(path).unwrap();
    let headers = reader.headers().unwrap().iter().map(str::to_string).collect();
    let rows = reader
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    (headers, rows)
}

pub fn column(headers: &[String], name: &str) -> usize {
    headers.iter().position(|h| h == name).unwrap()
}

/// The unified row whose facility_name equals `name`.
pub fn row_named<'a>(headers: &[String], rows: &'a [Vec<String>], name: &str) -> &'a [String] {
    let idx = column(headers, "facility_name");
    rows.iter()
        .find(|r| r[idx] == name)
        .unwrap_or_else(|| panic!("no row named {name}"))
}
