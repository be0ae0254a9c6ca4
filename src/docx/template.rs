//! A loaded template that writes filled text back into its own package.

use super::package::Package;
use super::reader::{read_document_xml, CellLayout, Layout, ParagraphLayout};
use crate::error::{Error, Result};
use crate::model::{Block, CellContent, Document, Paragraph, Table, TableCell, VerticalAlignment};
use crate::scan::paragraphs;
use quick_xml::escape::escape;
use std::fs;
use std::ops::Range;
use std::path::Path;

/// A Word template together with its model.
///
/// Fill the model through [`Template::document_mut`], then save. Only run
/// text and table cell vertical alignment are written back; every other
/// part of the package (headers, footers, images, styles, section and
/// paragraph properties, run formatting) is kept exactly as the template
/// has it.
///
/// Runs appended to a paragraph are cloned from the paragraph's last run,
/// formatting included. Removing runs or changing the block structure of
/// the model is not supported and makes saving fail.
///
/// # Example
///
/// ```no_run
/// use docfill::docx::Template;
/// use docfill::{fill_document, FillOptions, PlaceholderMap};
///
/// let mut template = Template::open("Offer Letter.docx")?;
/// let map: PlaceholderMap = [("<<Job>>", "Sales")].into_iter().collect();
/// fill_document(template.document_mut(), &map, &FillOptions::default());
/// template.save("Offer Letter - Sales.docx")?;
/// # Ok::<(), docfill::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Template {
    package: Package,
    xml: String,
    layout: Layout,
    document: Document,
}

impl Template {
    /// Load a template from `.docx` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Template`] if the bytes are not a readable Word document.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let package = Package::from_bytes(data)?;
        let xml = package.main_xml()?;
        let (document, layout) = read_document_xml(&xml)?;
        log::debug!("Read template with {} body block(s)", document.block_count());
        Ok(Self {
            package,
            xml,
            layout,
            document,
        })
    }

    /// Load a template from a `.docx` file.
    ///
    /// A missing file surfaces as [`Error::Io`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = fs::read(path.as_ref())?;
        Self::from_bytes(&data)
    }

    /// The template content.
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// The template content, for filling in place.
    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    /// Drop the package and keep only the content.
    pub fn into_document(self) -> Document {
        self.document
    }

    /// Package the current content as `.docx` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Docx`] if the model no longer lines up with the
    /// template structure, or if packaging fails.
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        let xml = render(&self.xml, &self.layout, &self.document)?;
        self.package.with_main_xml(&xml)
    }

    /// Write the current content to a `.docx` file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_docx()?;
        fs::write(path.as_ref(), bytes)?;
        log::info!("Wrote {}", path.as_ref().display());
        Ok(())
    }
}

/// A byte-range replacement in the source XML; an empty range inserts.
#[derive(Debug)]
struct Edit {
    range: Range<usize>,
    text: String,
}

impl Edit {
    fn replace(range: Range<usize>, text: String) -> Self {
        Self { range, text }
    }

    fn insert(at: usize, text: String) -> Self {
        Self {
            range: at..at,
            text,
        }
    }
}

/// Apply the model's text and cell alignment to the source XML.
fn render(xml: &str, layout: &Layout, document: &Document) -> Result<String> {
    let mut edits = Vec::new();
    let prefix = layout.prefix.as_str();

    let paragraphs: Vec<&Paragraph> = paragraphs(document).collect();
    if paragraphs.len() != layout.paragraphs.len() {
        return Err(structure_changed("paragraph count"));
    }
    for (paragraph, slot) in paragraphs.into_iter().zip(&layout.paragraphs) {
        paragraph_edits(xml, prefix, paragraph, slot, &mut edits)?;
    }

    let cells = cells(document);
    if cells.len() != layout.cells.len() {
        return Err(structure_changed("table cell count"));
    }
    for (cell, slot) in cells.into_iter().zip(&layout.cells) {
        if let Some(edit) = cell_edit(xml, prefix, cell, slot) {
            edits.push(edit);
        }
    }

    log::debug!("Writing {} edit(s) to document XML", edits.len());
    apply(xml, edits)
}

fn paragraph_edits(
    xml: &str,
    prefix: &str,
    paragraph: &Paragraph,
    slot: &ParagraphLayout,
    edits: &mut Vec<Edit>,
) -> Result<()> {
    let runs = &paragraph.runs;
    if runs.len() < slot.runs.len() {
        return Err(structure_changed("run count"));
    }

    for (run, original) in runs.iter().zip(&slot.runs) {
        if run.text == original.text {
            continue;
        }
        if let Some((first, rest)) = original.content.split_first() {
            edits.push(Edit::replace(first.clone(), text_xml(prefix, &run.text)));
            for range in rest {
                edits.push(Edit::replace(range.clone(), String::new()));
            }
        }
    }

    let extra = &runs[slot.runs.len()..];
    if extra.is_empty() {
        return Ok(());
    }

    let mut inserted = String::new();
    for run in extra {
        match slot.runs.last() {
            Some(last) => {
                inserted.push_str(&xml[last.open.clone()]);
                if let Some(props) = &last.props {
                    inserted.push_str(&xml[props.clone()]);
                }
            }
            None => inserted.push_str(&format!("<{}r>", prefix)),
        }
        inserted.push_str(&text_xml(prefix, &run.text));
        inserted.push_str(&format!("</{}r>", prefix));
    }

    match (slot.runs.last(), slot.close) {
        (Some(last), _) => edits.push(Edit::insert(last.element.end, inserted)),
        (None, Some(close)) => edits.push(Edit::insert(close, inserted)),
        (None, None) => {
            let open = expand_empty(&xml[slot.open.clone()]);
            edits.push(Edit::replace(
                slot.open.clone(),
                format!("{}{}</{}p>", open, inserted, prefix),
            ));
        }
    }
    Ok(())
}

fn cell_edit(xml: &str, prefix: &str, cell: &TableCell, slot: &CellLayout) -> Option<Edit> {
    if cell.vertical_alignment == slot.vertical_alignment {
        return None;
    }

    let v_align = format!(
        r#"<{p}vAlign {p}val="{}"/>"#,
        vertical_alignment_value(cell.vertical_alignment),
        p = prefix
    );
    let props = format!("<{p}tcPr>{}</{p}tcPr>", v_align, p = prefix);

    let edit = match &slot.props {
        Some(existing) => match &existing.v_align {
            Some(range) => Edit::replace(range.clone(), v_align),
            None if existing.self_closing => Edit::replace(existing.element.clone(), props),
            None => Edit::insert(existing.insert_at, v_align),
        },
        None if slot.self_closing => {
            let open = expand_empty(&xml[slot.open.clone()]);
            Edit::replace(
                slot.open.clone(),
                format!("{}{}<{p}p/></{p}tc>", open, props, p = prefix),
            )
        }
        None => Edit::insert(slot.open.end, props),
    };
    Some(edit)
}

/// Run content for `text`: text elements split by tab and line break elements.
fn text_xml(prefix: &str, text: &str) -> String {
    fn flush(out: &mut String, prefix: &str, chunk: &mut String) {
        if !chunk.is_empty() {
            out.push_str(&format!(
                r#"<{p}t xml:space="preserve">{}</{p}t>"#,
                escape(chunk.as_str()),
                p = prefix
            ));
            chunk.clear();
        }
    }

    let mut out = String::new();
    let mut chunk = String::new();
    for c in text.chars() {
        match c {
            '\t' => {
                flush(&mut out, prefix, &mut chunk);
                out.push_str(&format!("<{}tab/>", prefix));
            }
            '\n' => {
                flush(&mut out, prefix, &mut chunk);
                out.push_str(&format!("<{}br/>", prefix));
            }
            c => chunk.push(c),
        }
    }
    flush(&mut out, prefix, &mut chunk);
    out
}

/// `<w:p a="1"/>` → `<w:p a="1">`
fn expand_empty(tag: &str) -> String {
    format!("{}>", tag.trim_end_matches("/>").trim_end())
}

fn vertical_alignment_value(alignment: VerticalAlignment) -> &'static str {
    match alignment {
        VerticalAlignment::Top => "top",
        VerticalAlignment::Center => "center",
        VerticalAlignment::Bottom => "bottom",
    }
}

/// Every table cell in document order, nested cells after their parent.
fn cells(document: &Document) -> Vec<&TableCell> {
    fn collect<'a>(table: &'a Table, out: &mut Vec<&'a TableCell>) {
        for cell in table.cells() {
            out.push(cell);
            for content in &cell.content {
                if let CellContent::Table(nested) = content {
                    collect(nested, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    for block in &document.blocks {
        if let Block::Table(table) = block {
            collect(table, &mut out);
        }
    }
    out
}

fn apply(xml: &str, mut edits: Vec<Edit>) -> Result<String> {
    edits.sort_by_key(|edit| (edit.range.start, edit.range.end));

    let mut out = String::with_capacity(xml.len());
    let mut cursor = 0;
    for edit in edits {
        if edit.range.start < cursor {
            return Err(Error::Docx("overlapping document edits".to_string()));
        }
        out.push_str(&xml[cursor..edit.range.start]);
        out.push_str(&edit.text);
        cursor = edit.range.end;
    }
    out.push_str(&xml[cursor..]);
    Ok(out)
}

fn structure_changed(what: &str) -> Error {
    Error::Docx(format!("{} no longer matches the template", what))
}
