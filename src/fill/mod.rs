//! Placeholder substitution over a whole document.
//!
//! [`fill_document`] walks every top-level paragraph and every cell of every
//! table, descending into nested tables at any depth, and rewrites each
//! paragraph that contains a mapped token. Run formatting is carried over by
//! re-segmenting the new text across the original run lengths (see
//! [`resegment`]).
//!
//! # Example
//!
//! ```
//! use docfill::fill::{fill_document, FillOptions, PlaceholderMap};
//! use docfill::model::{Document, Paragraph};
//!
//! let mut doc = Document::new();
//! doc.add_paragraph(Paragraph::with_text("Offer for <<E-Name>>"));
//!
//! let mut map = PlaceholderMap::new();
//! map.insert("<<E-Name>>", "Priya Shah");
//!
//! let report = fill_document(&mut doc, &map, &FillOptions::default());
//! assert_eq!(doc.plain_text(), "Offer for Priya Shah");
//! assert_eq!(report.substitutions, 1);
//! ```

mod placeholders;
mod segment;

pub use placeholders::{Delimiters, PlaceholderMap};
pub use segment::{replace_in_paragraph, resegment};

use crate::model::{Block, CellContent, Document, Paragraph, Table, VerticalAlignment};
use crate::scan::TokenScanner;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// Options controlling a fill pass.
#[derive(Debug, Clone)]
pub struct FillOptions {
    /// Set every visited table cell to vertically centered content
    pub center_table_cells: bool,

    /// Scan the filled document for tokens that are still present
    pub report_unresolved: bool,

    /// Markers used to recognise leftover tokens
    pub delimiters: Delimiters,
}

impl FillOptions {
    /// Create new fill options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable vertical centering of table cells.
    pub fn with_cell_centering(mut self, center: bool) -> Self {
        self.center_table_cells = center;
        self
    }

    /// Enable or disable the unresolved-token scan.
    pub fn with_unresolved_report(mut self, report: bool) -> Self {
        self.report_unresolved = report;
        self
    }

    /// Set the token delimiters.
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.delimiters = delimiters;
        self
    }
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            center_table_cells: true,
            report_unresolved: true,
            delimiters: Delimiters::default(),
        }
    }
}

/// Summary of a fill pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FillReport {
    /// Paragraphs examined, at any depth
    pub paragraphs_visited: usize,

    /// Paragraphs whose runs were rewritten
    pub paragraphs_rewritten: usize,

    /// Total token replacements
    pub substitutions: usize,

    /// Table cells visited (and centered, when enabled)
    pub cells_visited: usize,

    /// Replacements per token
    pub hits: BTreeMap<String, usize>,

    /// Delimited tokens still present after the pass
    pub unresolved: BTreeSet<String>,
}

impl FillReport {
    /// Mapped tokens that never occurred in the document.
    pub fn unused_tokens<'m>(&self, placeholders: &'m PlaceholderMap) -> Vec<&'m str> {
        placeholders
            .tokens()
            .filter(|token| !self.hits.contains_key(*token))
            .collect()
    }

    /// Check whether no delimited tokens remain.
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// Replace every mapped token throughout `document`, in place.
///
/// Traverses top-level paragraphs, table cells and nested table cells
/// recursively. Paragraphs without a mapped token are not modified. When
/// [`FillOptions::center_table_cells`] is set, every visited cell ends up
/// vertically centered, whether or not anything in it matched.
pub fn fill_document(
    document: &mut Document,
    placeholders: &PlaceholderMap,
    options: &FillOptions,
) -> FillReport {
    let mut filler = Filler {
        placeholders,
        options,
        report: FillReport::default(),
    };

    for block in document.blocks.iter_mut() {
        match block {
            Block::Paragraph(p) => filler.paragraph(p),
            Block::Table(t) => filler.table(t),
        }
    }

    let mut report = filler.report;
    if options.report_unresolved {
        match TokenScanner::new(&options.delimiters) {
            Ok(scanner) => report.unresolved = scanner.scan_document(document),
            Err(e) => log::warn!("Skipping unresolved-token scan: {}", e),
        }
    }

    log::info!(
        "Filled {} of {} paragraphs ({} substitutions, {} cells)",
        report.paragraphs_rewritten,
        report.paragraphs_visited,
        report.substitutions,
        report.cells_visited
    );
    if !report.unresolved.is_empty() {
        log::warn!(
            "Unresolved placeholders remain: {}",
            report
                .unresolved
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );
    }

    report
}

struct Filler<'a> {
    placeholders: &'a PlaceholderMap,
    options: &'a FillOptions,
    report: FillReport,
}

impl Filler<'_> {
    fn paragraph(&mut self, paragraph: &mut Paragraph) {
        self.report.paragraphs_visited += 1;
        let Some(substitution) = segment::rewrite_paragraph(paragraph, self.placeholders) else {
            return;
        };

        let count = substitution.count();
        log::debug!(
            "Rewrote paragraph with {} substitution(s) across {} run(s)",
            count,
            paragraph.runs.len()
        );
        self.report.paragraphs_rewritten += 1;
        self.report.substitutions += count;
        for (token, n) in substitution.hits {
            *self.report.hits.entry(token.to_string()).or_insert(0) += n;
        }
    }

    fn table(&mut self, table: &mut Table) {
        for row in table.rows.iter_mut() {
            for cell in row.cells.iter_mut() {
                for content in cell.content.iter_mut() {
                    match content {
                        CellContent::Paragraph(p) => self.paragraph(p),
                        CellContent::Table(nested) => self.table(nested),
                    }
                }
                if self.options.center_table_cells {
                    cell.vertical_alignment = VerticalAlignment::Center;
                }
                self.report.cells_visited += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TableCell, TableRow, TextRun};

    fn sample_map() -> PlaceholderMap {
        [("<<Client Name>>", "Acme Ltd"), ("<<Date>>", "01 March, 2025")]
            .into_iter()
            .collect()
    }

    #[test]
    fn test_fill_options_defaults() {
        let options = FillOptions::default();
        assert!(options.center_table_cells);
        assert!(options.report_unresolved);
        assert_eq!(options.delimiters, Delimiters::default());
    }

    #[test]
    fn test_fill_options_builder() {
        let options = FillOptions::new()
            .with_cell_centering(false)
            .with_unresolved_report(false)
            .with_delimiters(Delimiters::new("{{", "}}"));
        assert!(!options.center_table_cells);
        assert!(!options.report_unresolved);
        assert_eq!(options.delimiters.open, "{{");
    }

    #[test]
    fn test_fill_counts() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("<<Client Name>> on <<Date>>"));
        doc.add_paragraph(Paragraph::with_text("Plain"));
        doc.add_table(Table::with_rows(vec![TableRow::from_strings([
            "<<Date>>", "x",
        ])]));

        let map = sample_map();
        let report = fill_document(&mut doc, &map, &FillOptions::default());

        assert_eq!(report.paragraphs_visited, 4);
        assert_eq!(report.paragraphs_rewritten, 2);
        assert_eq!(report.substitutions, 3);
        assert_eq!(report.cells_visited, 2);
        assert_eq!(report.hits.get("<<Date>>"), Some(&2));
        assert!(report.unused_tokens(&map).is_empty());
        assert!(report.is_complete());
    }

    #[test]
    fn test_unresolved_and_unused() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_runs(vec![
            TextRun::new("Phone: <<Client Number>>"),
        ]));

        let map = sample_map();
        let report = fill_document(&mut doc, &map, &FillOptions::default());

        assert_eq!(report.substitutions, 0);
        assert!(!report.is_complete());
        assert!(report.unresolved.contains("<<Client Number>>"));
        assert_eq!(report.unused_tokens(&map), vec!["<<Client Name>>", "<<Date>>"]);
    }

    #[test]
    fn test_centering_can_be_disabled() {
        let mut doc = Document::new();
        doc.add_table(Table::with_rows(vec![TableRow::new(vec![TableCell::text(
            "a",
        )])]));

        let options = FillOptions::new().with_cell_centering(false);
        fill_document(&mut doc, &PlaceholderMap::new(), &options);

        let Block::Table(table) = &doc.blocks[0] else {
            panic!("expected table");
        };
        assert_eq!(
            table.rows[0].cells[0].vertical_alignment,
            VerticalAlignment::Top
        );
    }
}
