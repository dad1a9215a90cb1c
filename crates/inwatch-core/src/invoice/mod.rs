//! Invoice field extraction module.

mod reader;
pub mod rules;

pub use reader::{InvoiceReader, PdfInvoiceReader};

use crate::models::invoice::InvoiceFields;

/// Extract all supported invoice fields from plain text.
pub fn extract_invoice_fields(text: &str) -> InvoiceFields {
    InvoiceFields {
        amount_to_pay: rules::extract_amount_to_pay(text),
    }
}
