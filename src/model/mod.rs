//! Document model types for template content representation.
//!
//! This module defines the intermediate representation (IR) that sits
//! between template loading and document export. Placeholder substitution
//! operates exclusively on these types, independent of the file format the
//! template was read from.

mod document;
mod paragraph;
mod table;

pub use document::{Block, Document};
pub use paragraph::{Alignment, Paragraph, ParagraphStyle, TextRun, TextStyle};
pub use table::{CellContent, Table, TableCell, TableRow, VerticalAlignment};
