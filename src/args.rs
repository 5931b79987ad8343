use clap::Parser;
use std::path::PathBuf;

use crate::constants::DEFAULT_DATA_DIR;
use crate::pipeline::RunConfig;

#[derive(Debug, Parser)]
#[command(name = "karnataka_master")]
#[command(about = "Merge KPME, OSM and reference tables into the Karnataka healthcare master CSV")]
pub struct Args {
    /// Root of the data layout: inputs under raw/ and reference/, outputs under output/.
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: PathBuf,

    /// KPME establishments CSV. Defaults to <data-dir>/raw/kpme/KPME_DATA.csv.
    #[arg(long)]
    pub kpme_csv: Option<PathBuf>,

    /// OSM facilities extract (.csv, or .json from the Overpass fetcher).
    #[arg(long)]
    pub osm_path: Option<PathBuf>,

    #[arg(long)]
    pub districts_csv: Option<PathBuf>,

    #[arg(long)]
    pub specializations_csv: Option<PathBuf>,

    #[arg(long)]
    pub degrees_csv: Option<PathBuf>,

    #[arg(long)]
    pub councils_csv: Option<PathBuf>,

    /// District alias table with columns district_name, alias.
    ///
    /// Replaces the built-in aliases (BANGALORE -> BENGALURU and friends).
    #[arg(long)]
    pub district_aliases_csv: Option<PathBuf>,

    /// Unified CSV output path.
    #[arg(long)]
    pub output_csv: Option<PathBuf>,

    /// Summary CSV output path.
    #[arg(long)]
    pub summary_csv: Option<PathBuf>,

    /// Also write the unified table as Parquet.
    #[arg(long)]
    pub parquet_output: Option<PathBuf>,

    /// Markdown fill-rate audit of the unified CSV, per data type (DuckDB).
    #[arg(long)]
    pub quality_report: Option<PathBuf>,

    /// CSV of KPME/OSM rows that share a facility name and district.
    #[arg(long)]
    pub overlap_report: Option<PathBuf>,
}

impl Args {
    pub fn into_config(self) -> RunConfig {
        let mut config = RunConfig::under(&self.data_dir);
        let sources = &mut config.sources;
        if let Some(path) = self.kpme_csv {
            sources.kpme = path;
        }
        if let Some(path) = self.osm_path {
            sources.osm = path;
        }
        if let Some(path) = self.districts_csv {
            sources.districts = path;
        }
        if let Some(path) = self.specializations_csv {
            sources.specializations = path;
        }
        if let Some(path) = self.degrees_csv {
            sources.degrees = path;
        }
        if let Some(path) = self.councils_csv {
            sources.councils = path;
        }
        sources.district_aliases = self.district_aliases_csv;

        if let Some(path) = self.output_csv {
            config.master_csv = path;
        }
        if let Some(path) = self.summary_csv {
            config.summary_csv = path;
        }
        config.parquet_output = self.parquet_output;
        config.quality_report = self.quality_report;
        config.overlap_report = self.overlap_report;
        config
    }
}
