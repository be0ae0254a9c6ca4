//! Word (`.docx`) template loading and saving.
//!
//! Templates are read straight from their WordprocessingML into the
//! [`crate::model`] types, and filled documents are written back into the
//! same package ([`Template`]), so everything the model does not carry
//! survives untouched. [`write_docx`] builds a fresh document from a model
//! with docx-rs.

mod package;
mod reader;
mod template;
mod writer;

pub use template::Template;
pub use writer::{write_docx, write_docx_file};

use crate::error::Result;
use crate::model::Document;
use std::path::Path;

/// ZIP local file header magic; every `.docx` package starts with it.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

/// Check whether bytes look like a ZIP-based Office document.
pub fn is_docx(data: &[u8]) -> bool {
    data.starts_with(ZIP_MAGIC)
}

/// Read the content of a `.docx` package into a [`Document`].
///
/// # Errors
///
/// Returns [`crate::Error::Template`] if the bytes are not a readable Word
/// document.
pub fn read_docx(data: &[u8]) -> Result<Document> {
    Template::from_bytes(data).map(Template::into_document)
}

/// Read the content of a `.docx` file.
///
/// A missing file surfaces as [`crate::Error::Io`].
pub fn read_docx_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    Template::open(path).map(Template::into_document)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_is_docx() {
        assert!(is_docx(b"PK\x03\x04rest-of-archive"));
        assert!(!is_docx(b"%PDF-1.7"));
        assert!(!is_docx(b""));
    }

    #[test]
    fn test_read_rejects_non_zip_input() {
        let result = read_docx(b"<!DOCTYPE html><html></html>");
        assert!(matches!(result, Err(Error::Template(_))));
    }

    #[test]
    fn test_read_rejects_corrupt_zip() {
        assert!(read_docx(b"PK\x03\x04garbage").is_err());
    }

    #[test]
    fn test_read_missing_file_is_io_error() {
        let result = read_docx_file("/nonexistent/template.docx");
        assert!(matches!(result, Err(Error::Io(_))));
    }
}
