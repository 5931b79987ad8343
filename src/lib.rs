pub mod args;
pub mod builder;
pub mod common;
pub mod constants;
pub mod district;
pub mod error;
pub mod kpme;
pub mod osm;
pub mod output;
pub mod overlap;
pub mod parquet_writer;
pub mod pipeline;
pub mod quality;
pub mod record;
pub mod reference;
pub mod report;
pub mod sources;
pub mod summary;
