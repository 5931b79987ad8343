pub const STATE_NAME: &str = "KARNATAKA";
pub const STATE_ISO_CODE: &str = "29";

pub const DEFAULT_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

pub const DEFAULT_KPME_CSV: &str = "raw/kpme/KPME_DATA.csv";
pub const DEFAULT_OSM_PATH: &str = "raw/osm/karnataka_health_osm.csv";
pub const DEFAULT_DISTRICTS_CSV: &str = "reference/karnataka_districts.csv";
pub const DEFAULT_SPECIALIZATIONS_CSV: &str = "reference/medical_specializations.csv";
pub const DEFAULT_DEGREES_CSV: &str = "reference/medical_degrees.csv";
pub const DEFAULT_COUNCILS_CSV: &str = "reference/medical_councils.csv";

pub const DEFAULT_MASTER_CSV: &str = "output/karnataka_healthcare_master.csv";
pub const DEFAULT_SUMMARY_CSV: &str = "output/karnataka_healthcare_summary.csv";

/// Built-in district aliases as `(reference district name, text variant)`.
///
/// An alias only takes effect when its target exists in the loaded district
/// table, so one list serves both the official spellings (`BENGALURU URBAN`)
/// and older exports that still use `BENGALURU`.
pub const DEFAULT_DISTRICT_ALIASES: &[(&str, &str)] = &[
    ("BENGALURU", "BANGALORE"),
    ("BENGALURU URBAN", "BANGALORE"),
    ("BENGALURU URBAN", "BENGALURU"),
    ("BENGALURU RURAL", "BANGALORE RURAL"),
    ("MYSURU", "MYSORE"),
    ("BALLARI", "BELLARY"),
    ("KALABURAGI", "GULBARGA"),
    ("SHIVAMOGGA", "SHIMOGA"),
    ("BELAGAVI", "BELGAUM"),
    ("VIJAYAPURA", "BIJAPUR"),
    ("TUMAKURU", "TUMKUR"),
    ("DAKSHINA KANNADA", "MANGALORE"),
    ("DAKSHINA KANNADA", "MANGALURU"),
    ("DHARWAD", "HUBLI"),
    ("DHARWAD", "HUBBALLI"),
    ("BAGALKOT", "BAGALKOTE"),
    ("BAGALKOTE", "BAGALKOT"),
    ("CHAMARAJANAGAR", "CHAMARAJANAGARA"),
    ("CHAMARAJANAGARA", "CHAMARAJANAGAR"),
    ("CHIKKABALLAPUR", "CHIKKABALLAPURA"),
    ("CHIKKABALLAPURA", "CHIKKABALLAPUR"),
    ("CHIKKABALLAPUR", "CHIKBALLAPUR"),
    ("CHIKKAMAGALURU", "CHIKMAGALUR"),
    ("DAVANAGERE", "DAVANGERE"),
    ("UTTARA KANNADA", "KARWAR"),
    ("YADGIR", "YADAGIRI"),
    ("KODAGU", "COORG"),
    ("RAMANAGARA", "RAMANAGARAM"),
];
