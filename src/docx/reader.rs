//! Main document XML → model, plus the byte layout that lets a filled model
//! be written back into the same XML.
//!
//! Body paragraphs, tables, rows, cells and runs become model nodes. Runs
//! inside hyperlinks, insertions, content controls and smart tags count as
//! ordinary paragraph runs. Deleted and moved-from content, alternate-content
//! fallbacks and anything nested inside a run (drawings, text boxes) are
//! left uninterpreted.

use crate::error::{Error, Result};
use crate::model::{
    Alignment, Block, Document, Paragraph, Table, TableCell, TableRow, TextRun, VerticalAlignment,
};
use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, XmlVersion};
use std::fmt;
use std::ops::Range;

/// `w:tcPr` children that must come after `w:vAlign`.
const AFTER_V_ALIGN: &[&[u8]] = &[
    b"hideMark",
    b"headers",
    b"cellIns",
    b"cellDel",
    b"cellMerge",
    b"tcPrChange",
];

/// Where every model paragraph, run and cell sits in the source XML.
///
/// Paragraphs and cells are listed in document order, which is the same
/// depth-first order the model is walked in.
#[derive(Debug, Clone, Default)]
pub(super) struct Layout {
    /// WordprocessingML prefix including the colon, e.g. `w:`
    pub prefix: String,
    pub paragraphs: Vec<ParagraphLayout>,
    pub cells: Vec<CellLayout>,
}

#[derive(Debug, Clone)]
pub(super) struct ParagraphLayout {
    /// The start tag, or the whole element when self-closing
    pub open: Range<usize>,
    /// Start of the end tag; `None` for `<w:p/>`
    pub close: Option<usize>,
    pub runs: Vec<RunLayout>,
}

#[derive(Debug, Clone)]
pub(super) struct RunLayout {
    pub element: Range<usize>,
    pub open: Range<usize>,
    pub props: Option<Range<usize>>,
    /// Text, tab and line break children, in order
    pub content: Vec<Range<usize>>,
    /// Run text as read
    pub text: String,
}

#[derive(Debug, Clone)]
pub(super) struct CellLayout {
    /// The start tag, or the whole element when self-closing
    pub open: Range<usize>,
    pub self_closing: bool,
    pub props: Option<CellPropsLayout>,
    /// Vertical alignment as read
    pub vertical_alignment: VerticalAlignment,
}

#[derive(Debug, Clone)]
pub(super) struct CellPropsLayout {
    pub element: Range<usize>,
    pub self_closing: bool,
    pub v_align: Option<Range<usize>>,
    /// Where a new `w:vAlign` goes
    pub insert_at: usize,
    anchor: Option<usize>,
}

/// What an open element means to the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Role {
    Other,
    Ignore,
    Table,
    Row,
    Cell,
    Paragraph,
    Run,
    RunProps,
    RunText,
    RunBreak(char),
    ParagraphProps,
    CellProps,
    VAlign,
}

enum Frame {
    Table(Table),
    Row(TableRow),
    Cell { cell: TableCell, index: usize },
    Paragraph { paragraph: Paragraph, index: usize },
    Run { run: TextRun, layout: RunLayout },
}

struct Open {
    role: Role,
    start: usize,
}

/// Parse the main document XML.
pub(super) fn read_document_xml(xml: &str) -> Result<(Document, Layout)> {
    let mut reader = Reader::from_str(xml);
    let mut builder = Builder::default();

    loop {
        let start = offset(&reader);
        let event = reader.read_event().map_err(xml_error)?;
        let end = offset(&reader);
        match event {
            Event::Start(e) => {
                let role = builder.open(&e, start..end)?;
                builder.elements.push(Open { role, start });
            }
            Event::Empty(e) => {
                let role = builder.open(&e, start..end)?;
                builder.close(role, start..end, None);
            }
            Event::End(_) => {
                let open = builder
                    .elements
                    .pop()
                    .ok_or_else(|| Error::Template("unbalanced document XML".to_string()))?;
                builder.close(open.role, open.start..end, Some(start));
            }
            Event::Text(t) => {
                let text = t.xml10_content().map_err(xml_error)?;
                builder.push_text(&text);
            }
            Event::CData(c) => {
                let text = c.decode().map_err(xml_error)?;
                builder.push_text(&text);
            }
            Event::GeneralRef(r) => {
                if builder.in_text() {
                    let text = match r.resolve_char_ref().map_err(xml_error)? {
                        Some(c) => c.to_string(),
                        None => {
                            let name = r.decode().map_err(xml_error)?;
                            resolve_predefined_entity(&name)
                                .map(str::to_string)
                                .unwrap_or_else(|| format!("&{};", name))
                        }
                    };
                    builder.push_text(&text);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    if !builder.elements.is_empty() {
        return Err(Error::Template("document XML ends inside an element".to_string()));
    }

    log::debug!(
        "Read {} paragraph(s) and {} cell(s) from document XML",
        builder.layout.paragraphs.len(),
        builder.layout.cells.len()
    );
    Ok((builder.document, builder.layout))
}

#[derive(Default)]
struct Builder {
    document: Document,
    layout: Layout,
    frames: Vec<Frame>,
    elements: Vec<Open>,
    root_seen: bool,
}

impl Builder {
    fn parent_role(&self) -> Role {
        self.elements.last().map_or(Role::Other, |open| open.role)
    }

    fn in_text(&self) -> bool {
        self.parent_role() == Role::RunText
    }

    fn push_text(&mut self, text: &str) {
        if !self.in_text() {
            return;
        }
        if let Some(Frame::Run { run, .. }) = self.frames.last_mut() {
            run.text.push_str(text);
        }
    }

    /// Local name of a WordprocessingML element or attribute.
    fn local<'n>(&self, name: &'n [u8]) -> Option<&'n [u8]> {
        name.strip_prefix(self.layout.prefix.as_bytes())
            .filter(|rest| !rest.contains(&b':'))
    }

    fn attr(&self, e: &BytesStart<'_>, local: &str) -> Result<Option<String>> {
        for attr in e.attributes() {
            let attr = attr.map_err(xml_error)?;
            if self.local(attr.key.as_ref()) == Some(local.as_bytes()) {
                let value = attr
                    .normalized_value(XmlVersion::Implicit1_0)
                    .map_err(xml_error)?;
                return Ok(Some(value.into_owned()));
            }
        }
        Ok(None)
    }

    fn val(&self, e: &BytesStart<'_>) -> Result<Option<String>> {
        self.attr(e, "val")
    }

    /// An on/off property: present means on unless `w:val` turns it off.
    fn flag(&self, e: &BytesStart<'_>) -> Result<bool> {
        Ok(!matches!(
            self.val(e)?.as_deref(),
            Some("0" | "false" | "off")
        ))
    }

    fn open(&mut self, e: &BytesStart<'_>, tag: Range<usize>) -> Result<Role> {
        let name = e.name();
        if !self.root_seen {
            self.root_seen = true;
            if let Some(colon) = name.as_ref().iter().position(|&b| b == b':') {
                self.layout.prefix = String::from_utf8_lossy(&name.as_ref()[..=colon]).into_owned();
            }
        }

        let parent = self.parent_role();
        let local = self.local(name.as_ref());
        let role = match parent {
            Role::Ignore | Role::RunText | Role::RunBreak(_) | Role::VAlign => Role::Ignore,
            Role::Run => self.open_run_child(e, local)?,
            Role::RunProps => {
                self.read_run_property(e, local)?;
                Role::Ignore
            }
            Role::ParagraphProps => {
                self.read_paragraph_property(e, local)?;
                Role::Ignore
            }
            Role::CellProps => self.open_cell_property(e, local, tag)?,
            _ => self.open_structure(name.as_ref(), local, parent, tag),
        };
        Ok(role)
    }

    fn open_structure(
        &mut self,
        name: &[u8],
        local: Option<&[u8]>,
        parent: Role,
        tag: Range<usize>,
    ) -> Role {
        let Some(local) = local else {
            let is_fallback = name.ends_with(b":Fallback") || name == b"Fallback";
            return if is_fallback { Role::Ignore } else { Role::Other };
        };

        let in_body_or_cell = matches!(self.frames.last(), None | Some(Frame::Cell { .. }));
        match local {
            b"del" | b"moveFrom" => Role::Ignore,
            b"p" if in_body_or_cell => {
                let index = self.layout.paragraphs.len();
                self.layout.paragraphs.push(ParagraphLayout {
                    open: tag,
                    close: None,
                    runs: Vec::new(),
                });
                self.frames.push(Frame::Paragraph {
                    paragraph: Paragraph::new(),
                    index,
                });
                Role::Paragraph
            }
            b"tbl" if in_body_or_cell => {
                self.frames.push(Frame::Table(Table::new()));
                Role::Table
            }
            b"tr" if matches!(self.frames.last(), Some(Frame::Table(_))) => {
                self.frames.push(Frame::Row(TableRow::default()));
                Role::Row
            }
            b"tc" if matches!(self.frames.last(), Some(Frame::Row(_))) => {
                let index = self.layout.cells.len();
                self.layout.cells.push(CellLayout {
                    open: tag,
                    self_closing: false,
                    props: None,
                    vertical_alignment: VerticalAlignment::default(),
                });
                self.frames.push(Frame::Cell {
                    cell: TableCell::empty(),
                    index,
                });
                Role::Cell
            }
            b"r" if matches!(self.frames.last(), Some(Frame::Paragraph { .. })) => {
                self.frames.push(Frame::Run {
                    run: TextRun::new(""),
                    layout: RunLayout {
                        element: tag.clone(),
                        open: tag,
                        props: None,
                        content: Vec::new(),
                        text: String::new(),
                    },
                });
                Role::Run
            }
            b"pPr" if parent == Role::Paragraph => Role::ParagraphProps,
            b"tcPr" if parent == Role::Cell => {
                if let Some(Frame::Cell { index, .. }) = self.frames.last() {
                    self.layout.cells[*index].props = Some(CellPropsLayout {
                        element: tag.clone(),
                        self_closing: false,
                        v_align: None,
                        insert_at: tag.end,
                        anchor: None,
                    });
                }
                Role::CellProps
            }
            _ => Role::Other,
        }
    }

    fn open_run_child(&mut self, e: &BytesStart<'_>, local: Option<&[u8]>) -> Result<Role> {
        let role = match local {
            Some(b"rPr") => Role::RunProps,
            Some(b"t") => Role::RunText,
            Some(b"tab") => Role::RunBreak('\t'),
            Some(b"cr") => Role::RunBreak('\n'),
            Some(b"br") => match self.attr(e, "type")?.as_deref() {
                None | Some("textWrapping") => Role::RunBreak('\n'),
                Some(_) => Role::Ignore,
            },
            _ => Role::Ignore,
        };
        if let (Role::RunBreak(c), Some(Frame::Run { run, .. })) = (role, self.frames.last_mut()) {
            run.text.push(c);
        }
        Ok(role)
    }

    fn read_run_property(&mut self, e: &BytesStart<'_>, local: Option<&[u8]>) -> Result<()> {
        let Some(local) = local else {
            return Ok(());
        };
        let value = match local {
            b"b" | b"i" => None,
            b"rFonts" => {
                let mut font = None;
                for key in ["ascii", "hAnsi", "eastAsia", "cs"] {
                    if let Some(name) = self.attr(e, key)? {
                        font = Some(name);
                        break;
                    }
                }
                font
            }
            b"u" | b"sz" | b"color" => self.val(e)?,
            _ => None,
        };
        let on = matches!(local, b"b" | b"i") && self.flag(e)?;

        let Some(Frame::Run { run, .. }) = self.frames.last_mut() else {
            return Ok(());
        };
        let style = &mut run.style;
        match local {
            b"b" => style.bold = on,
            b"i" => style.italic = on,
            b"u" => style.underline = value.as_deref() != Some("none"),
            b"rFonts" => style.font_name = value,
            b"sz" => {
                style.font_size = value
                    .and_then(|v| v.parse::<u32>().ok())
                    .map(|half_points| half_points as f32 / 2.0)
            }
            b"color" => {
                style.color = value
                    .filter(|c| !c.eq_ignore_ascii_case("auto"))
                    .map(|c| c.to_uppercase())
            }
            _ => {}
        }
        Ok(())
    }

    fn read_paragraph_property(&mut self, e: &BytesStart<'_>, local: Option<&[u8]>) -> Result<()> {
        let (alignment, style_id) = match local {
            Some(b"jc") => (self.val(e)?.as_deref().and_then(parse_alignment), None),
            Some(b"pStyle") => (None, self.val(e)?),
            _ => return Ok(()),
        };
        if let Some(Frame::Paragraph { paragraph, .. }) = self.frames.last_mut() {
            if alignment.is_some() {
                paragraph.style.alignment = alignment;
            }
            if style_id.is_some() {
                paragraph.style.style_id = style_id;
            }
        }
        Ok(())
    }

    fn open_cell_property(
        &mut self,
        e: &BytesStart<'_>,
        local: Option<&[u8]>,
        tag: Range<usize>,
    ) -> Result<Role> {
        let Some(local) = local else {
            return Ok(Role::Ignore);
        };
        let value = match local {
            b"vAlign" | b"gridSpan" => self.val(e)?,
            _ => None,
        };

        let Some(Frame::Cell { cell, index }) = self.frames.last_mut() else {
            return Ok(Role::Ignore);
        };
        let props = self.layout.cells[*index].props.as_mut();
        match local {
            b"vAlign" => {
                if let Some(valign) = value.as_deref().and_then(parse_vertical_alignment) {
                    cell.vertical_alignment = valign;
                }
                return Ok(Role::VAlign);
            }
            b"gridSpan" => {
                if let Some(span) = value.and_then(|v| v.parse::<u32>().ok()) {
                    cell.colspan = u8::try_from(span).unwrap_or(u8::MAX).max(1);
                }
            }
            _ if AFTER_V_ALIGN.iter().any(|name| *name == local) => {
                if let Some(props) = props {
                    props.anchor.get_or_insert(tag.start);
                }
            }
            _ => {}
        }
        Ok(Role::Ignore)
    }

    /// Finish an element. `close` is the start of its end tag.
    fn close(&mut self, role: Role, element: Range<usize>, close: Option<usize>) {
        match role {
            Role::Table => {
                if let Some(Frame::Table(table)) = self.frames.pop() {
                    self.attach(Block::Table(table));
                }
            }
            Role::Row => {
                if let Some(Frame::Row(row)) = self.frames.pop() {
                    if let Some(Frame::Table(table)) = self.frames.last_mut() {
                        table.add_row(row);
                    }
                }
            }
            Role::Cell => {
                if let Some(Frame::Cell { cell, index }) = self.frames.pop() {
                    let layout = &mut self.layout.cells[index];
                    layout.vertical_alignment = cell.vertical_alignment;
                    if close.is_none() {
                        layout.self_closing = true;
                    }
                    if let Some(Frame::Row(row)) = self.frames.last_mut() {
                        row.cells.push(cell);
                    }
                }
            }
            Role::Paragraph => {
                if let Some(Frame::Paragraph { paragraph, index }) = self.frames.pop() {
                    self.layout.paragraphs[index].close = close;
                    self.attach(Block::Paragraph(paragraph));
                }
            }
            Role::Run => {
                if let Some(Frame::Run { run, mut layout }) = self.frames.pop() {
                    if layout.content.is_empty() {
                        return;
                    }
                    layout.element = element;
                    layout.text = run.text.clone();
                    if let Some(Frame::Paragraph { paragraph, index }) = self.frames.last_mut() {
                        paragraph.add_run(run);
                        self.layout.paragraphs[*index].runs.push(layout);
                    }
                }
            }
            Role::RunProps => {
                if let Some(Frame::Run { layout, .. }) = self.frames.last_mut() {
                    layout.props = Some(element);
                }
            }
            Role::RunText | Role::RunBreak(_) => {
                if let Some(Frame::Run { layout, .. }) = self.frames.last_mut() {
                    layout.content.push(element);
                }
            }
            Role::VAlign | Role::CellProps => {
                if let Some(Frame::Cell { index, .. }) = self.frames.last() {
                    if let Some(props) = self.layout.cells[*index].props.as_mut() {
                        if role == Role::VAlign {
                            props.v_align = Some(element);
                        } else {
                            props.self_closing = close.is_none();
                            props.insert_at = props.anchor.or(close).unwrap_or(element.end);
                            props.element = element;
                        }
                    }
                }
            }
            Role::Other | Role::Ignore | Role::ParagraphProps => {}
        }
    }

    fn attach(&mut self, block: Block) {
        match self.frames.last_mut() {
            Some(Frame::Cell { cell, .. }) => match block {
                Block::Paragraph(p) => cell.add_paragraph(p),
                Block::Table(t) => cell.add_table(t),
            },
            _ => self.document.add_block(block),
        }
    }
}

fn offset(reader: &Reader<&[u8]>) -> usize {
    reader.buffer_position() as usize
}

fn xml_error(err: impl fmt::Display) -> Error {
    Error::Template(format!("malformed document XML: {}", err))
}

fn parse_alignment(value: &str) -> Option<Alignment> {
    match value.to_ascii_lowercase().as_str() {
        "left" | "start" => Some(Alignment::Left),
        "center" => Some(Alignment::Center),
        "right" | "end" => Some(Alignment::Right),
        "both" | "justified" | "distribute" => Some(Alignment::Justify),
        _ => None,
    }
}

fn parse_vertical_alignment(value: &str) -> Option<VerticalAlignment> {
    match value.to_ascii_lowercase().as_str() {
        "top" => Some(VerticalAlignment::Top),
        "center" => Some(VerticalAlignment::Center),
        "bottom" => Some(VerticalAlignment::Bottom),
        _ => None,
    }
}
