//! Error types for the unit redaction library.
//!
//! Every failure ends the current batch only. Variants are grouped by the
//! stage that produced them so callers can turn them into user-facing
//! messages without inspecting strings.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for redaction operations.
pub type RedactorResult<T> = Result<T, RedactorError>;

/// Error type for all batch, document and storage operations.
#[derive(Debug, Error)]
pub enum RedactorError {
    /// Error occurred while reading or writing files
    #[error("IO error for path '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Error occurred during PDF processing
    #[error(
        "PDF processing error{}: {message}",
        .page.map(|p| format!(" on page {p}")).unwrap_or_default()
    )]
    PdfProcessing {
        message: String,
        page: Option<usize>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Roster spreadsheet is unreadable or lacks the required columns
    #[error("Invalid roster: {reason}")]
    InvalidRoster { reason: String },

    /// Two uploads share a file name or identical content
    #[error("Duplicate upload '{name}': {reason}")]
    DuplicateUpload { name: String, reason: String },

    /// No unit produced a single matched identifier
    #[error(
        "Mismatch: PDF and roster data do not match ({documents} document(s), {units} unit(s))"
    )]
    NoMatch { documents: usize, units: usize },

    /// Invalid configuration or parameters
    #[error("Invalid input for '{parameter}': {reason}")]
    InvalidInput { parameter: String, reason: String },

    /// Object storage request failed
    #[error("Storage error for '{key}': {message}")]
    Storage { key: String, message: String },

    /// Zip packaging failed
    #[error("Archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Spreadsheet export failed
    #[error("Spreadsheet export error: {0}")]
    Spreadsheet(#[from] rust_xlsxwriter::XlsxError),
}

impl RedactorError {
    /// Wraps a backend failure that is tied to a specific page.
    pub fn on_page<E>(message: impl Into<String>, page: usize, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::PdfProcessing {
            message: message.into(),
            page: Some(page),
            source: Some(Box::new(source)),
        }
    }

    /// Wraps a backend failure that concerns the document as a whole.
    pub fn pdf<E>(message: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::PdfProcessing {
            message: message.into(),
            page: None,
            source: Some(Box::new(source)),
        }
    }

    pub fn invalid_input(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }
}

impl From<lopdf::Error> for RedactorError {
    fn from(err: lopdf::Error) -> Self {
        Self::pdf("lopdf operation failed", err)
    }
}

impl From<mupdf::Error> for RedactorError {
    fn from(err: mupdf::Error) -> Self {
        Self::pdf("MuPDF operation failed", err)
    }
}

impl From<calamine::Error> for RedactorError {
    fn from(err: calamine::Error) -> Self {
        Self::InvalidRoster {
            reason: err.to_string(),
        }
    }
}
