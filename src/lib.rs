//! # docfill
//!
//! Fill placeholder tokens in Word templates while keeping the template's
//! character formatting.
//!
//! A template is an ordinary `.docx` file containing tokens such as
//! `<<Client Name>>`. docfill loads it, replaces every token in every
//! paragraph (including table cells and nested tables) with the caller's
//! values, and writes the new text back into a copy of the template
//! package. Headers, footers, images, hyperlinks and every property the
//! template sets are kept.
//!
//! ## Quick Start
//!
//! ```no_run
//! use docfill::{generate_file, FillOptions, PlaceholderMap};
//!
//! fn main() -> docfill::Result<()> {
//!     let mut placeholders = PlaceholderMap::new();
//!     placeholders.insert("<<Client Name>>", "Acme Ltd");
//!     placeholders.insert("<<Date>>", "01 March, 2025");
//!
//!     let generated = generate_file("Proposal.docx", &placeholders, &FillOptions::default())?;
//!     generated.save("Proposal - Acme Ltd.docx")?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Formatting preservation**: new text is re-segmented across the
//!   original runs, so fonts, sizes, colors and emphasis stay in place
//! - **Tokens across runs**: a token split over several runs still matches
//! - **Deep traversal**: paragraphs, table cells and nested tables,
//!   including runs inside hyperlinks and tracked insertions
//! - **Typed values**: amounts, counts and dates are formatted before
//!   substitution ([`values`])
//! - **Template catalog**: named document kinds in a JSON file ([`catalog`])

pub mod catalog;
pub mod docx;
pub mod error;
pub mod fill;
pub mod model;
pub mod scan;
pub mod values;

// Re-export commonly used types
pub use catalog::{TemplateCatalog, TemplateEntry};
pub use docx::Template;
pub use error::{Error, Result};
pub use fill::{
    fill_document, replace_in_paragraph, Delimiters, FillOptions, FillReport, PlaceholderMap,
};
pub use model::{
    Alignment, Block, CellContent, Document, Paragraph, Table, TableCell, TableRow, TextRun,
    TextStyle, VerticalAlignment,
};
pub use values::{DateStyle, FieldSet, FieldValue};

use std::path::Path;

/// The outcome of one generation request.
///
/// Holds the filled template and the fill report. Nothing is cached between
/// requests; callers that need to keep the output around (for example to
/// serve a download) hold on to this value or its bytes.
#[derive(Debug, Clone)]
pub struct Generated {
    /// The filled template
    pub template: Template,

    /// What the fill pass did
    pub report: FillReport,
}

impl Generated {
    /// The filled content.
    pub fn document(&self) -> &Document {
        self.template.document()
    }

    /// Package the filled document as `.docx` bytes.
    pub fn to_docx(&self) -> Result<Vec<u8>> {
        self.template.to_docx()
    }

    /// Write the filled document to a `.docx` file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        self.template.save(path)
    }

    /// Plain text of the filled document.
    pub fn plain_text(&self) -> String {
        self.document().plain_text()
    }
}

fn fill_template(
    mut template: Template,
    placeholders: &PlaceholderMap,
    options: &FillOptions,
) -> Generated {
    let report = fill_document(template.document_mut(), placeholders, options);
    Generated { template, report }
}

/// Fill a template given as `.docx` bytes.
///
/// Everything outside run text and cell alignment (headers, footers,
/// images, section and run properties) is carried over from the template.
///
/// # Errors
///
/// Returns [`Error::Template`] if the template cannot be read. Tokens that
/// do not occur and formatting that is absent are not errors.
pub fn generate(
    template: &[u8],
    placeholders: &PlaceholderMap,
    options: &FillOptions,
) -> Result<Generated> {
    let template = Template::from_bytes(template)?;
    Ok(fill_template(template, placeholders, options))
}

/// Fill a template read from a `.docx` file.
///
/// # Example
///
/// ```no_run
/// use docfill::{generate_file, FillOptions, PlaceholderMap};
///
/// let map: PlaceholderMap = [("<<E-Name>>", "Priya Shah")].into_iter().collect();
/// let generated = generate_file("Offer Letter.docx", &map, &FillOptions::default()).unwrap();
/// println!("{} substitutions", generated.report.substitutions);
/// ```
pub fn generate_file<P: AsRef<Path>>(
    path: P,
    placeholders: &PlaceholderMap,
    options: &FillOptions,
) -> Result<Generated> {
    let path = path.as_ref();
    log::debug!("Loading template {}", path.display());
    let template = Template::open(path)?;
    Ok(fill_template(template, placeholders, options))
}

/// Fill a template file, reading it asynchronously.
#[cfg(feature = "async")]
pub async fn generate_file_async<P: AsRef<Path>>(
    path: P,
    placeholders: &PlaceholderMap,
    options: &FillOptions,
) -> Result<Generated> {
    let data = tokio::fs::read(path.as_ref()).await?;
    generate(&data, placeholders, options)
}

/// Builder for a generation request.
///
/// # Example
///
/// ```no_run
/// use docfill::{DocFill, FieldValue};
///
/// let generated = DocFill::new()
///     .field("Client Name", "Acme Ltd")
///     .field("P01", FieldValue::amount(1200))
///     .field("P02", FieldValue::amount(800))
///     .total("T-Price", ["P01", "P02"])
///     .generate("Proposal - Custom Price.docx")?;
/// generated.save("out.docx")?;
/// # Ok::<(), docfill::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct DocFill {
    options: FillOptions,
    fields: FieldSet,
    placeholders: PlaceholderMap,
}

impl DocFill {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use custom token delimiters.
    pub fn with_delimiters(mut self, delimiters: Delimiters) -> Self {
        self.options = self.options.with_delimiters(delimiters);
        self
    }

    /// Leave table cell vertical alignment as the template has it.
    pub fn keep_cell_alignment(mut self) -> Self {
        self.options = self.options.with_cell_centering(false);
        self
    }

    /// Skip the scan for leftover tokens.
    pub fn without_unresolved_report(mut self) -> Self {
        self.options = self.options.with_unresolved_report(false);
        self
    }

    /// Set a named field; the name is wrapped with the delimiters.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name, value);
        self
    }

    /// Add a whole set of fields.
    pub fn fields(mut self, fields: FieldSet) -> Self {
        self.fields.merge(fields);
        self
    }

    /// Declare a derived total over other fields.
    pub fn total<S: Into<String>>(
        mut self,
        name: impl Into<String>,
        sources: impl IntoIterator<Item = S>,
    ) -> Self {
        self.fields.add_total(name, sources);
        self
    }

    /// Map a literal token directly, bypassing field formatting.
    pub fn placeholder(mut self, token: impl Into<String>, value: impl Into<String>) -> Self {
        self.placeholders.insert(token, value);
        self
    }

    /// The placeholder map this request will apply.
    ///
    /// Literal placeholders win over fields that wrap to the same token.
    pub fn placeholders(&self) -> Result<PlaceholderMap> {
        let mut map = self.fields.to_placeholders(&self.options.delimiters)?;
        map.extend(self.placeholders.iter());
        Ok(map)
    }

    /// Fill a template file.
    pub fn generate<P: AsRef<Path>>(&self, path: P) -> Result<Generated> {
        generate_file(path, &self.placeholders()?, &self.options)
    }

    /// Fill a template given as bytes.
    pub fn generate_bytes(&self, template: &[u8]) -> Result<Generated> {
        generate(template, &self.placeholders()?, &self.options)
    }

    /// Fill an already loaded document in place.
    pub fn fill(&self, document: &mut Document) -> Result<FillReport> {
        Ok(fill_document(document, &self.placeholders()?, &self.options))
    }
}
