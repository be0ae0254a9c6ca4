//! Model → new DOCX package, for documents built from scratch.

use crate::error::{Error, Result};
use crate::model::{
    Alignment, Block, CellContent, Document, Paragraph, Table, TableCell, TextRun,
    VerticalAlignment,
};
use docx_rs::{AlignmentType, BreakType, Docx, Run, RunFonts, VAlignType};
use std::fs;
use std::io::Cursor;
use std::path::Path;

/// Package a [`Document`] as `.docx` bytes.
///
/// # Errors
///
/// Returns [`Error::Docx`] if the package cannot be written.
pub fn write_docx(document: &Document) -> Result<Vec<u8>> {
    let mut docx = Docx::new();
    for block in &document.blocks {
        docx = match block {
            Block::Paragraph(p) => docx.add_paragraph(build_paragraph(p)),
            Block::Table(t) => docx.add_table(build_table(t)),
        };
    }

    let mut buf = Cursor::new(Vec::new());
    docx.build()
        .pack(&mut buf)
        .map_err(|e| Error::Docx(e.to_string()))?;

    Ok(buf.into_inner())
}

/// Package a [`Document`] and write it to `path`.
pub fn write_docx_file<P: AsRef<Path>>(document: &Document, path: P) -> Result<()> {
    let bytes = write_docx(document)?;
    fs::write(path, bytes)?;
    Ok(())
}

fn build_paragraph(paragraph: &Paragraph) -> docx_rs::Paragraph {
    let mut out = docx_rs::Paragraph::new();
    for run in &paragraph.runs {
        out = out.add_run(build_run(run));
    }
    if let Some(alignment) = paragraph.style.alignment {
        out = out.align(alignment_type(alignment));
    }
    if let Some(ref style_id) = paragraph.style.style_id {
        out = out.style(style_id);
    }
    out
}

fn build_run(run: &TextRun) -> Run {
    let mut out = Run::new();
    for (i, line) in run.text.split('\n').enumerate() {
        if i > 0 {
            out = out.add_break(BreakType::TextWrapping);
        }
        for (j, part) in line.split('\t').enumerate() {
            if j > 0 {
                out = out.add_tab();
            }
            if !part.is_empty() {
                out = out.add_text(part);
            }
        }
    }

    let style = &run.style;
    if style.bold {
        out = out.bold();
    }
    if style.italic {
        out = out.italic();
    }
    if style.underline {
        out = out.underline("single");
    }
    if let Some(points) = style.font_size {
        // OOXML uses half-points
        out = out.size((points * 2.0).round() as usize);
    }
    if let Some(ref color) = style.color {
        out = out.color(color.as_str());
    }
    if let Some(ref font) = style.font_name {
        out = out.fonts(
            RunFonts::new()
                .ascii(font.as_str())
                .hi_ansi(font.as_str())
                .east_asia(font.as_str()),
        );
    }
    out
}

fn build_table(table: &Table) -> docx_rs::Table {
    let rows = table
        .rows
        .iter()
        .map(|row| docx_rs::TableRow::new(row.cells.iter().map(build_cell).collect()))
        .collect();
    docx_rs::Table::new(rows)
}

fn build_cell(cell: &TableCell) -> docx_rs::TableCell {
    let mut out = docx_rs::TableCell::new();
    for content in &cell.content {
        out = match content {
            CellContent::Paragraph(p) => out.add_paragraph(build_paragraph(p)),
            CellContent::Table(t) => out.add_table(build_table(t)),
        };
    }
    // A cell must end with a paragraph
    if !matches!(cell.content.last(), Some(CellContent::Paragraph(_))) {
        out = out.add_paragraph(docx_rs::Paragraph::new());
    }

    match cell.vertical_alignment {
        VerticalAlignment::Top => {}
        VerticalAlignment::Center => out = out.vertical_align(VAlignType::Center),
        VerticalAlignment::Bottom => out = out.vertical_align(VAlignType::Bottom),
    }
    if cell.colspan > 1 {
        out = out.grid_span(usize::from(cell.colspan));
    }
    out
}

fn alignment_type(alignment: Alignment) -> AlignmentType {
    match alignment {
        Alignment::Left => AlignmentType::Left,
        Alignment::Center => AlignmentType::Center,
        Alignment::Right => AlignmentType::Right,
        Alignment::Justify => AlignmentType::Both,
    }
}
