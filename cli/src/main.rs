//! docfill CLI - Word template filling tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use docfill::docx::read_docx_file;
use docfill::scan::find_tokens;
use docfill::{DocFill, Delimiters, FieldSet, FillReport, TemplateCatalog};

#[derive(Parser)]
#[command(name = "docfill")]
#[command(author = "iyulab")]
#[command(version)]
#[command(about = "Fill placeholder tokens in Word templates", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fill a template with values from a JSON file
    Fill {
        /// Template .docx file (omit when using --catalog/--document)
        #[arg(value_name = "TEMPLATE", required_unless_present = "document")]
        template: Option<PathBuf>,

        /// JSON file with "fields" and optional "totals"
        #[arg(short, long, value_name = "JSON")]
        values: PathBuf,

        /// Output file (default: <stem>_filled.docx)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Template catalog file
        #[arg(long, value_name = "FILE", requires = "document")]
        catalog: Option<PathBuf>,

        /// Document name in the catalog
        #[arg(long, value_name = "NAME", requires = "catalog")]
        document: Option<String>,

        #[command(flatten)]
        delimiters: DelimiterArgs,

        /// Keep table cell vertical alignment as in the template
        #[arg(long)]
        keep_alignment: bool,

        /// Fail if any placeholder remains unfilled
        #[arg(long)]
        strict: bool,
    },

    /// List the placeholder tokens a template contains
    #[command(alias = "ls")]
    Placeholders {
        /// Template .docx file
        #[arg(value_name = "TEMPLATE")]
        template: PathBuf,

        #[command(flatten)]
        delimiters: DelimiterArgs,
    },

    /// List the templates in a catalog
    Catalog {
        /// Catalog JSON file
        #[arg(value_name = "FILE", env = "DOCFILL_CATALOG")]
        file: PathBuf,
    },

    /// Show version information
    Version,
}

#[derive(clap::Args)]
struct DelimiterArgs {
    /// Opening token delimiter
    #[arg(long, default_value = "<<")]
    open: String,

    /// Closing token delimiter
    #[arg(long, default_value = ">>")]
    close: String,
}

impl From<DelimiterArgs> for Delimiters {
    fn from(args: DelimiterArgs) -> Self {
        Delimiters::new(args.open, args.close)
    }
}

struct FillArgs {
    template: Option<PathBuf>,
    values: PathBuf,
    output: Option<PathBuf>,
    catalog: Option<PathBuf>,
    document: Option<String>,
    delimiters: Delimiters,
    keep_alignment: bool,
    strict: bool,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Fill {
            template,
            values,
            output,
            catalog,
            document,
            delimiters,
            keep_alignment,
            strict,
        } => cmd_fill(FillArgs {
            template,
            values,
            output,
            catalog,
            document,
            delimiters: delimiters.into(),
            keep_alignment,
            strict,
        })
        .map(|_| ()),
        Commands::Placeholders {
            template,
            delimiters,
        } => cmd_placeholders(&template, &delimiters.into()),
        Commands::Catalog { file } => cmd_catalog(&file),
        Commands::Version => {
            cmd_version();
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn default_output(template: &Path) -> PathBuf {
    let stem = template.file_stem().unwrap_or_default().to_string_lossy();
    PathBuf::from(format!("{}_filled.docx", stem))
}

fn cmd_fill(args: FillArgs) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let json = fs::read_to_string(&args.values)?;
    let mut fields = FieldSet::from_json(&json)?;

    let template = match (&args.catalog, &args.document) {
        (Some(catalog_path), Some(name)) => {
            let catalog = TemplateCatalog::load(catalog_path)?;
            let entry = catalog.get(name)?;
            entry.apply_totals(&mut fields);
            catalog.template_path(entry)
        }
        _ => args.template.clone().ok_or("no template given")?,
    };
    let output = args.output.unwrap_or_else(|| default_output(&template));

    let pb = ProgressBar::new(2);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Filling template...");
    let mut request = DocFill::new()
        .with_delimiters(args.delimiters)
        .fields(fields);
    if args.keep_alignment {
        request = request.keep_cell_alignment();
    }
    let generated = request.generate(&template)?;
    pb.inc(1);

    if args.strict && !generated.report.is_complete() {
        pb.abandon_with_message("Unfilled placeholders");
        print_report(&generated.report, &request.placeholders()?);
        return Err(format!(
            "{} placeholder(s) left unfilled in {}",
            generated.report.unresolved.len(),
            template.display()
        )
        .into());
    }

    pb.set_message("Saving document...");
    generated.save(&output)?;
    pb.inc(1);
    pb.finish_with_message("Done!");

    print_report(&generated.report, &request.placeholders()?);
    println!("\n{} {}", "Saved to".green(), output.display());

    Ok(output)
}

fn print_report(report: &FillReport, placeholders: &docfill::PlaceholderMap) {
    println!("\n{}", "Fill Report".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    println!("{}: {}", "Substitutions".bold(), report.substitutions);
    println!(
        "{}: {} of {}",
        "Paragraphs rewritten".bold(),
        report.paragraphs_rewritten,
        report.paragraphs_visited
    );
    println!("{}: {}", "Table cells".bold(), report.cells_visited);

    let unused = report.unused_tokens(placeholders);
    if !unused.is_empty() {
        println!("\n{}", "Not found in template:".dimmed());
        for token in unused {
            println!("  {} {}", "-".dimmed(), token.dimmed());
        }
    }

    if !report.unresolved.is_empty() {
        println!("\n{}", "Unfilled placeholders:".yellow().bold());
        for token in &report.unresolved {
            println!("  {} {}", "!".yellow(), token);
        }
    }
}

fn cmd_placeholders(
    template: &Path,
    delimiters: &Delimiters,
) -> Result<(), Box<dyn std::error::Error>> {
    let doc = read_docx_file(template)?;
    let tokens = find_tokens(&doc, delimiters)?;

    if tokens.is_empty() {
        println!("{}", "No placeholders found".yellow());
        return Ok(());
    }

    println!("{}", "Placeholders".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for token in &tokens {
        println!("  {}", token);
    }
    println!("\n{} {}", tokens.len(), "found".dimmed());

    Ok(())
}

fn cmd_catalog(file: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let catalog = TemplateCatalog::load(file)?;

    println!("{}", "Templates".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    for entry in &catalog.templates {
        let path = catalog.template_path(entry);
        let status = if path.exists() {
            "ok".green()
        } else {
            "missing".red()
        };
        println!("{} [{}]", entry.name.bold(), status);
        println!("  {} {}", "template:".dimmed(), path.display());
        if let Some(ref description) = entry.description {
            println!("  {} {}", "about:".dimmed(), description);
        }
        if !entry.totals.is_empty() {
            let totals: Vec<String> = entry
                .totals
                .iter()
                .map(|(name, sources)| format!("{} = {}", name, sources.join(" + ")))
                .collect();
            println!("  {} {}", "totals:".dimmed(), totals.join(", "));
        }
    }

    Ok(())
}

fn cmd_version() {
    println!("{} {}", "docfill".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("Word template filling tool");
    println!();
    println!("Repository: {}", "https://github.com/iyulab/docfill".dimmed());
    println!("License: MIT");
}

#[cfg(test)]
mod tests {
    use super::*;
    use docfill::docx::{read_docx_file, write_docx_file};
    use docfill::{Document, Paragraph};

    fn fill_args(dir: &Path, template: PathBuf) -> FillArgs {
        FillArgs {
            template: Some(template),
            values: dir.join("values.json"),
            output: Some(dir.join("out.docx")),
            catalog: None,
            document: None,
            delimiters: Delimiters::default(),
            keep_alignment: false,
            strict: false,
        }
    }

    fn write_template(dir: &Path) -> PathBuf {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::with_text("Dear <<Name>>,"));
        doc.add_paragraph(Paragraph::with_text("Total: <<Total>> USD"));
        let path = dir.join("Offer Letter.docx");
        write_docx_file(&doc, &path).unwrap();
        path
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output(Path::new("templates/Offer Letter.docx")),
            PathBuf::from("Offer Letter_filled.docx")
        );
    }

    #[test]
    fn test_cmd_fill_writes_document() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path());
        fs::write(
            dir.path().join("values.json"),
            r#"{"fields": {"Name": "Priya", "A": {"amount": 1500}, "B": {"amount": 500}},
                "totals": {"Total": ["A", "B"]}}"#,
        )
        .unwrap();

        let output = cmd_fill(fill_args(dir.path(), template)).unwrap();

        let text = read_docx_file(output).unwrap().plain_text();
        assert!(text.contains("Dear Priya,"));
        assert!(text.contains("Total: 2,000 USD"));
    }

    #[test]
    fn test_cmd_fill_strict_rejects_unfilled() {
        let dir = tempfile::tempdir().unwrap();
        let template = write_template(dir.path());
        fs::write(
            dir.path().join("values.json"),
            r#"{"fields": {"Name": "Priya"}}"#,
        )
        .unwrap();

        let mut args = fill_args(dir.path(), template);
        args.strict = true;
        assert!(cmd_fill(args).is_err());
        assert!(!dir.path().join("out.docx").exists());
    }

    #[test]
    fn test_cmd_fill_from_catalog() {
        let dir = tempfile::tempdir().unwrap();
        write_template(dir.path());
        fs::write(
            dir.path().join("catalog.json"),
            r#"{"templates": [{"name": "Offer Letter", "template": "Offer Letter.docx",
                "totals": {"Total": ["A"]}}]}"#,
        )
        .unwrap();
        fs::write(
            dir.path().join("values.json"),
            r#"{"fields": {"Name": "Priya", "A": {"amount": 12000}}}"#,
        )
        .unwrap();

        let mut args = fill_args(dir.path(), PathBuf::new());
        args.template = None;
        args.catalog = Some(dir.path().join("catalog.json"));
        args.document = Some("offer letter".to_string());

        let output = cmd_fill(args).unwrap();
        let text = read_docx_file(output).unwrap().plain_text();
        assert!(text.contains("Total: 12,000 USD"));
    }
}
