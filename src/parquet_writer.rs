use anyhow::{Context, Result};
use arrow::{
    array::{ArrayRef, StringBuilder},
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
};
use parquet::arrow::arrow_writer::ArrowWriter;
use parquet::{basic::Compression, file::properties::WriterProperties};
use std::{
    fs::File,
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::common::{commit_tmp, discard_tmp, ensure_parent_dir, tmp_path_for};
use crate::record::{MASTER_COLUMNS, MasterRow};

const BATCH_SIZE: usize = 8_192;

/// Parquet mirror of the unified CSV: the same 17 columns, all non-null Utf8,
/// with absent values kept as empty strings.
pub struct MasterParquetWriter {
    output_path: PathBuf,
    tmp_path: PathBuf,
    schema: Arc<Schema>,
    writer: ArrowWriter<File>,
    builders: Vec<StringBuilder>,
    rows_in_batch: usize,
    rows_written: usize,
}

impl MasterParquetWriter {
    pub fn try_new(output_path: &Path) -> Result<Self> {
        ensure_parent_dir(output_path)?;
        let tmp_path = tmp_path_for(output_path);

        let fields: Vec<Field> = MASTER_COLUMNS
            .iter()
            .map(|name| Field::new(*name, DataType::Utf8, false))
            .collect();
        let schema = Arc::new(Schema::new(fields));

        let props = WriterProperties::builder()
            .set_compression(Compression::SNAPPY)
            .build();

        let file = File::create(&tmp_path)
            .with_context(|| format!("Failed creating {}", tmp_path.display()))?;
        let writer = ArrowWriter::try_new(file, Arc::clone(&schema), Some(props))
            .context("Failed creating Parquet ArrowWriter")?;

        Ok(Self {
            output_path: output_path.to_path_buf(),
            tmp_path,
            schema,
            writer,
            builders: MASTER_COLUMNS.iter().map(|_| StringBuilder::new()).collect(),
            rows_in_batch: 0,
            rows_written: 0,
        })
    }

    pub fn push_row(&mut self, row: &MasterRow) -> Result<()> {
        for (builder, value) in self.builders.iter_mut().zip(row.values()) {
            builder.append_value(value);
        }
        self.rows_in_batch += 1;
        if self.rows_in_batch >= BATCH_SIZE {
            self.flush_batch()?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<usize> {
        self.flush_batch()?;
        self.writer
            .close()
            .context("Failed closing Parquet writer")?;
        commit_tmp(&self.tmp_path, &self.output_path)?;
        Ok(self.rows_written)
    }

    pub fn abort(self) {
        let _ = self.writer.close();
        discard_tmp(&self.tmp_path);
    }

    fn flush_batch(&mut self) -> Result<()> {
        if self.rows_in_batch == 0 {
            return Ok(());
        }

        let arrays: Vec<ArrayRef> = self
            .builders
            .iter_mut()
            .map(|b| Arc::new(b.finish()) as ArrayRef)
            .collect();
        let batch = RecordBatch::try_new(Arc::clone(&self.schema), arrays)
            .context("Failed creating RecordBatch for Parquet write")?;
        self.writer
            .write(&batch)
            .context("Failed writing Parquet RecordBatch")?;
        self.rows_written += self.rows_in_batch;
        self.rows_in_batch = 0;
        Ok(())
    }
}

pub fn write_master_parquet(
    path: &Path,
    rows: impl IntoIterator<Item = MasterRow>,
) -> Result<usize> {
    let mut writer = MasterParquetWriter::try_new(path)?;
    for row in rows {
        if let Err(err) = writer.push_row(&row) {
            writer.abort();
            return Err(err);
        }
    }
    writer.finish()
}
