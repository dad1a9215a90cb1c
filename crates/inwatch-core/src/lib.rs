//! Core library for watching a Google Drive folder for Polish PDF invoices.
//!
//! This crate provides:
//! - Google Drive listing and streaming downloads, with service account or
//!   installed-app OAuth credentials
//! - PDF text extraction
//! - Extraction of the amount still to pay ("Pozostało do zapłaty")
//! - An append-only ledger of processed files and a CSV output table
//! - The poll loop tying them together

pub mod auth;
pub mod drive;
pub mod error;
pub mod invoice;
pub mod ledger;
pub mod models;
pub mod pdf;
pub mod sink;
pub mod watcher;

pub use auth::{token_source, TokenSource};
pub use drive::{fetch_to_path, list_new_pdfs, DriveClient, RemoteStore};
pub use error::{InwatchError, Result};
pub use invoice::{extract_invoice_fields, InvoiceReader, PdfInvoiceReader};
pub use invoice::rules::extract_amount_to_pay;
pub use ledger::KnownFiles;
pub use models::config::WatchConfig;
pub use models::invoice::{InvoiceFields, InvoiceRecord};
pub use models::remote::RemoteFile;
pub use pdf::{PdfExtractor, PdfProcessor};
pub use sink::CsvSink;
pub use watcher::{CandidateOutcome, CycleReport, WatchState, Watcher};
