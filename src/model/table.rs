//! Table types.

use super::Paragraph;
use serde::{Deserialize, Serialize};

/// A table structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    /// Rows in the table
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Create a new empty table.
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    /// Create a table from rows.
    pub fn with_rows(rows: Vec<TableRow>) -> Self {
        Self { rows }
    }

    /// Add a row to the table.
    pub fn add_row(&mut self, row: TableRow) {
        self.rows.push(row);
    }

    /// Get the number of rows.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Iterate over every cell, row by row.
    pub fn cells(&self) -> impl Iterator<Item = &TableCell> {
        self.rows.iter().flat_map(|r| r.cells.iter())
    }

    /// Get plain text representation of the table.
    pub fn plain_text(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.plain_text())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A table row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    /// Cells in the row
    pub cells: Vec<TableCell>,
}

impl TableRow {
    /// Create a new row with cells.
    pub fn new(cells: Vec<TableCell>) -> Self {
        Self { cells }
    }

    /// Create a row from text values.
    pub fn from_strings<S: Into<String>>(values: impl IntoIterator<Item = S>) -> Self {
        Self::new(values.into_iter().map(TableCell::text).collect())
    }

    /// Get plain text representation.
    pub fn plain_text(&self) -> String {
        self.cells
            .iter()
            .map(|c| c.plain_text())
            .collect::<Vec<_>>()
            .join("\t")
    }
}

/// Content stored inside a table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum CellContent {
    /// A paragraph
    Paragraph(Paragraph),

    /// A nested table
    Table(Table),
}

/// A table cell.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    /// Cell content (paragraphs and nested tables) in order
    pub content: Vec<CellContent>,

    /// Number of grid columns this cell spans
    pub colspan: u8,

    /// Vertical alignment
    pub vertical_alignment: VerticalAlignment,
}

impl TableCell {
    /// Create a new cell with text content.
    pub fn text(text: impl Into<String>) -> Self {
        Self::with_paragraphs(vec![Paragraph::with_text(text)])
    }

    /// Create an empty cell.
    pub fn empty() -> Self {
        Self::with_content(Vec::new())
    }

    /// Create a cell with multiple paragraphs.
    pub fn with_paragraphs(paragraphs: Vec<Paragraph>) -> Self {
        Self::with_content(paragraphs.into_iter().map(CellContent::Paragraph).collect())
    }

    /// Create a cell with mixed content.
    pub fn with_content(content: Vec<CellContent>) -> Self {
        Self {
            content,
            colspan: 1,
            vertical_alignment: VerticalAlignment::Top,
        }
    }

    /// Append a paragraph.
    pub fn add_paragraph(&mut self, paragraph: Paragraph) {
        self.content.push(CellContent::Paragraph(paragraph));
    }

    /// Append a nested table.
    pub fn add_table(&mut self, table: Table) {
        self.content.push(CellContent::Table(table));
    }

    /// Set colspan and return self.
    pub fn colspan(mut self, span: u8) -> Self {
        self.colspan = span.max(1);
        self
    }

    /// Set vertical alignment and return self.
    pub fn valign(mut self, alignment: VerticalAlignment) -> Self {
        self.vertical_alignment = alignment;
        self
    }

    /// Paragraphs directly inside this cell.
    pub fn paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.content.iter().filter_map(|c| match c {
            CellContent::Paragraph(p) => Some(p),
            CellContent::Table(_) => None,
        })
    }

    /// Tables directly inside this cell.
    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.content.iter().filter_map(|c| match c {
            CellContent::Table(t) => Some(t),
            CellContent::Paragraph(_) => None,
        })
    }

    /// Get plain text content.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                CellContent::Paragraph(p) => p.plain_text(),
                CellContent::Table(t) => t.plain_text(),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Check if the cell is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() || self.plain_text().trim().is_empty()
    }
}

impl Default for TableCell {
    fn default() -> Self {
        Self::empty()
    }
}

/// Vertical alignment for table cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VerticalAlignment {
    /// Top alignment
    #[default]
    Top,
    /// Center alignment
    Center,
    /// Bottom alignment
    Bottom,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_new() {
        let table = Table::new();
        assert!(table.is_empty());
        assert_eq!(table.row_count(), 0);
    }

    #[test]
    fn test_table_with_data() {
        let mut table = Table::new();
        table.add_row(TableRow::from_strings(["Role", "Count"]));
        table.add_row(TableRow::from_strings(["Project Manager", "<<P1>>"]));

        assert_eq!(table.row_count(), 2);
        assert_eq!(table.cells().count(), 4);
        assert_eq!(table.plain_text(), "Role\tCount\nProject Manager\t<<P1>>");
    }

    #[test]
    fn test_nested_depth() {
        let inner = Table::with_rows(vec![TableRow::from_strings(["deep"])]);
        let mut cell = TableCell::text("outer");
        cell.add_table(inner);
        let outer = Table::with_rows(vec![TableRow::new(vec![cell])]);

        let nested = outer.rows[0].cells[0].tables().next().unwrap();
        assert_eq!(nested.plain_text(), "deep");
        assert_eq!(outer.plain_text(), "outer deep");
    }

    #[test]
    fn test_cell_builders() {
        let cell = TableCell::text("Hello")
            .colspan(0)
            .valign(VerticalAlignment::Bottom);
        assert_eq!(cell.colspan, 1);
        assert_eq!(cell.vertical_alignment, VerticalAlignment::Bottom);
        assert!(!cell.is_empty());
        assert!(TableCell::empty().is_empty());
    }
}
