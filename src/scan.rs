//! Placeholder discovery.
//!
//! Finds delimited tokens such as `<<Client Name>>` in a document, either to
//! list what a template expects or to report what a fill left behind.

use crate::error::{Error, Result};
use crate::fill::Delimiters;
use crate::model::{Block, CellContent, Document, Paragraph, Table};
use regex::Regex;
use std::collections::BTreeSet;

/// Compiled matcher for one pair of delimiters.
#[derive(Debug, Clone)]
pub struct TokenScanner {
    pattern: Regex,
    open: String,
}

impl TokenScanner {
    /// Build a scanner for the given delimiters.
    ///
    /// Fails if either marker is empty.
    pub fn new(delimiters: &Delimiters) -> Result<Self> {
        if delimiters.open.is_empty() || delimiters.close.is_empty() {
            return Err(Error::InvalidValue(
                "placeholder delimiters must not be empty".to_string(),
            ));
        }
        let pattern = format!(
            "{}([^\\r\\n]+?){}",
            regex::escape(&delimiters.open),
            regex::escape(&delimiters.close)
        );
        let pattern = Regex::new(&pattern).map_err(|e| Error::Other(e.to_string()))?;
        Ok(Self {
            pattern,
            open: delimiters.open.clone(),
        })
    }

    /// Tokens found in a piece of text, delimiters included.
    ///
    /// When a match contains another opening marker, only the innermost
    /// token is kept (`<<a <<B>>` yields `<<B>>`). Blank names are skipped.
    pub fn scan_text(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for caps in self.pattern.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let start = match name.as_str().rfind(&self.open) {
                Some(idx) => name.start() + idx,
                None => whole.start(),
            };
            let token = &text[start..whole.end()];
            let inner = &text[start + self.open.len()..name.end()];
            if inner.trim().is_empty() {
                continue;
            }
            tokens.push(token.to_string());
        }
        tokens
    }

    /// Every distinct token present in the document, at any depth.
    pub fn scan_document(&self, document: &Document) -> BTreeSet<String> {
        paragraphs(document)
            .flat_map(|p| self.scan_text(&p.plain_text()))
            .collect()
    }
}

/// Distinct tokens present anywhere in `document`.
///
/// # Example
///
/// ```
/// use docfill::fill::Delimiters;
/// use docfill::model::{Document, Paragraph};
/// use docfill::scan::find_tokens;
///
/// let mut doc = Document::new();
/// doc.add_paragraph(Paragraph::with_text("Valid until <<VDate>>"));
///
/// let tokens = find_tokens(&doc, &Delimiters::default()).unwrap();
/// assert!(tokens.contains("<<VDate>>"));
/// ```
pub fn find_tokens(document: &Document, delimiters: &Delimiters) -> Result<BTreeSet<String>> {
    Ok(TokenScanner::new(delimiters)?.scan_document(document))
}

/// Depth-first iterator over every paragraph in the document, including
/// paragraphs inside tables and nested tables.
pub fn paragraphs(document: &Document) -> impl Iterator<Item = &Paragraph> {
    let mut out = Vec::new();
    for block in &document.blocks {
        match block {
            Block::Paragraph(p) => out.push(p),
            Block::Table(t) => collect_table(t, &mut out),
        }
    }
    out.into_iter()
}

fn collect_table<'a>(table: &'a Table, out: &mut Vec<&'a Paragraph>) {
    for cell in table.cells() {
        for content in &cell.content {
            match content {
                CellContent::Paragraph(p) => out.push(p),
                CellContent::Table(nested) => collect_table(nested, out),
            }
        }
    }
}
