//! Error types for travelreport.
//!
//! Every fallible operation in the crate returns [`Error`]. Validation and
//! empty-export failures are the user-facing "blocking message" cases; the
//! rest wrap storage, configuration, signature decoding and file output.

use std::path::PathBuf;
use thiserror::Error;

/// The main error type for travelreport operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Report Errors ===
    /// A required draft field is empty.
    #[error("{field} is required")]
    MissingField {
        /// Display name of the missing field.
        field: &'static str,
    },

    /// No report with the given id exists in the store.
    #[error("no report with id {id}")]
    ReportNotFound {
        /// The requested report id.
        id: i64,
    },

    /// A CSV export was requested while the store holds no reports.
    #[error("there are no saved reports to export")]
    NothingToExport,

    // === Signature Errors ===
    /// A signature image could not be read or decoded.
    #[error("invalid {pad} signature: {message}")]
    Signature {
        /// Which pad the image was meant for.
        pad: &'static str,
        /// Description of what went wrong.
        message: String,
    },

    // === Export Errors ===
    /// PDF rendering failed.
    #[error("PDF rendering failed: {0}")]
    Pdf(String),

    /// CSV encoding failed.
    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    // === I/O Errors ===
    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to read an input file.
    #[error("failed to read {path}: {source}")]
    FileRead {
        /// Source path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to write an exported file.
    #[error("failed to write {path}: {source}")]
    FileWrite {
        /// Destination path.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for travelreport operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Create a new PDF rendering error.
    #[must_use]
    pub fn pdf(message: impl Into<String>) -> Self {
        Self::Pdf(message.into())
    }

    /// Create a signature error for the named pad.
    #[must_use]
    pub fn signature(pad: &'static str, message: impl Into<String>) -> Self {
        Self::Signature {
            pad,
            message: message.into(),
        }
    }

    /// Check if this error is a draft validation failure.
    #[must_use]
    pub fn is_validation_error(&self) -> bool {
        matches!(self, Self::MissingField { .. })
    }

    /// Check if this error is an export of an empty store.
    #[must_use]
    pub fn is_empty_export(&self) -> bool {
        matches!(self, Self::NothingToExport)
    }
}
