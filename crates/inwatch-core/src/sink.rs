//! CSV output table of processed invoices.

use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::Result;
use crate::models::invoice::InvoiceRecord;

/// Append-only CSV table, one row per processed file.
///
/// The header is written once, when the file does not exist yet. Rows are
/// never rewritten or deduplicated here.
#[derive(Debug, Clone)]
pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record, writing the header first on a fresh file.
    pub fn append(&self, record: &InvoiceRecord) -> Result<()> {
        let file_exists = self.path.exists();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);

        if !file_exists {
            wtr.write_record(InvoiceRecord::HEADER)?;
        }
        wtr.serialize(record)?;
        wtr.flush()?;

        debug!(file_id = %record.file_id, "Appended row to {}", self.path.display());
        Ok(())
    }

    /// Read back all rows. A missing file yields no rows.
    pub fn records(&self) -> Result<Vec<InvoiceRecord>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let mut rdr = csv::Reader::from_path(&self.path)?;
        let mut records = Vec::new();
        for row in rdr.deserialize() {
            records.push(row?);
        }
        Ok(records)
    }
}
