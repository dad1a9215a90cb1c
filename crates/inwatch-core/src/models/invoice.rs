//! Invoice records written to the output table.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::remote::RemoteFile;

/// Fields extracted from the text of an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFields {
    /// Amount still to pay ("Pozostało do zapłaty"), as printed on the invoice.
    pub amount_to_pay: Option<String>,
}

/// One row of the output table.
///
/// Created once per newly seen file and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceRecord {
    /// Display name of the Drive file.
    #[serde(rename = "File Name")]
    pub file_name: String,

    /// Drive file ID.
    #[serde(rename = "File ID")]
    pub file_id: String,

    /// When the file was processed (ISO-8601 with offset).
    #[serde(rename = "Processed Date")]
    pub processed_date: DateTime<FixedOffset>,

    /// Extracted amount still to pay, empty when not found.
    #[serde(rename = "Amount To Pay")]
    pub amount_to_pay: Option<String>,
}

impl InvoiceRecord {
    /// Column names, in the order they are written.
    pub const HEADER: [&'static str; 4] = ["File Name", "File ID", "Processed Date", "Amount To Pay"];

    /// Build a record for `file` processed at `processed_date`.
    pub fn new(file: &RemoteFile, fields: InvoiceFields, processed_date: DateTime<FixedOffset>) -> Self {
        Self {
            file_name: file.name.clone(),
            file_id: file.id.clone(),
            processed_date,
            amount_to_pay: fields.amount_to_pay,
        }
    }
}
