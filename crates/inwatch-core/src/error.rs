//! Error types for the inwatch-core library.

use thiserror::Error;

/// Main error type for the inwatch library.
#[derive(Error, Debug)]
pub enum InwatchError {
    /// CSV output error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

/// Errors related to PDF processing.
#[derive(Error, Debug)]
pub enum PdfError {
    /// Failed to open/parse the PDF file.
    #[error("failed to parse PDF: {0}")]
    Parse(String),

    /// Failed to extract text from PDF.
    #[error("failed to extract text: {0}")]
    TextExtraction(String),

    /// The PDF is encrypted and cannot be processed.
    #[error("PDF is encrypted")]
    Encrypted,

    /// The PDF is empty or has no pages.
    #[error("PDF has no pages")]
    NoPages,
}

/// Errors returned by the Drive client.
#[derive(Error, Debug)]
pub enum DriveError {
    /// The provider rejected access to a file (HTTP 403).
    #[error("access denied to file {0}")]
    PermissionDenied(String),

    /// Any other non-success HTTP status.
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Transport-level failure.
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to obtain an access token.
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    /// Failed to write downloaded bytes.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to obtaining OAuth credentials.
#[derive(Error, Debug)]
pub enum AuthError {
    /// A credential, key, or token file could not be read or written.
    #[error("credential file {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// A credential file had unexpected content.
    #[error("malformed credentials in {path}: {reason}")]
    Malformed { path: String, reason: String },

    /// Signing the service account assertion failed.
    #[error("failed to sign assertion: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    /// The token endpoint rejected the request.
    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    /// Transport-level failure talking to the token endpoint.
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The interactive authorization flow did not complete.
    #[error("authorization flow failed: {0}")]
    Flow(String),
}

/// Result type for the inwatch library.
pub type Result<T> = std::result::Result<T, InwatchError>;
