//! Error types for docfill library.

use std::io;
use thiserror::Error;

/// Result type alias for docfill operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur while loading, filling or saving documents.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The template could not be read as a Word document.
    #[error("Template could not be loaded: {0}")]
    Template(String),

    /// Error while packaging the output document.
    #[error("DOCX generation failed: {0}")]
    Docx(String),

    /// The template catalog is malformed.
    #[error("Invalid template catalog: {0}")]
    Catalog(String),

    /// No catalog entry with the requested name.
    #[error("Unknown template: {0}")]
    UnknownTemplate(String),

    /// A field value could not be formatted.
    #[error("Invalid field value: {0}")]
    InvalidValue(String),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message.
    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::UnknownTemplate("Offer Letter".to_string());
        assert_eq!(err.to_string(), "Unknown template: Offer Letter");

        let err = Error::Template("not a zip archive".to_string());
        assert_eq!(
            err.to_string(),
            "Template could not be loaded: not a zip archive"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = json_err.into();
        assert!(matches!(err, Error::Json(_)));
    }
}
