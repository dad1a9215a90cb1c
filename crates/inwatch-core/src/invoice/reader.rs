//! Reading invoice fields from downloaded files.

use std::fs;
use std::path::Path;

use tracing::{debug, error, warn};

use crate::error::PdfError;
use crate::models::invoice::InvoiceFields;
use crate::pdf::{PdfExtractor, PdfProcessor};

use super::extract_invoice_fields;

/// Turns a local file into extracted invoice fields.
///
/// Implementations never fail: an unreadable file or a missing match
/// yields fields that are all absent.
pub trait InvoiceReader {
    fn read(&self, path: &Path) -> InvoiceFields;
}

/// Reads PDF invoices through [`PdfExtractor`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfInvoiceReader;

impl PdfInvoiceReader {
    pub fn new() -> Self {
        Self
    }

    fn read_text(&self, path: &Path) -> Result<String, PdfError> {
        let data = fs::read(path).map_err(|e| PdfError::Parse(e.to_string()))?;
        let mut extractor = PdfExtractor::new();
        extractor.load(&data)?;
        extractor.extract_text()
    }
}

impl InvoiceReader for PdfInvoiceReader {
    fn read(&self, path: &Path) -> InvoiceFields {
        let text = match self.read_text(path) {
            Ok(text) => text,
            Err(e) => {
                error!(path = %path.display(), "Failed to read PDF: {}", e);
                return InvoiceFields::default();
            }
        };

        debug!(path = %path.display(), chars = text.len(), "Extracted PDF text");

        let fields = extract_invoice_fields(&text);
        if fields.amount_to_pay.is_none() {
            warn!(path = %path.display(), "Amount to pay not found in invoice text");
        }
        fields
    }
}
