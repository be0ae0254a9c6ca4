//! Benchmarks for docfill substitution performance.
//!
//! Run with: cargo bench
//!
//! These benchmarks fill synthetic documents built in memory.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use docfill::model::{Document, Paragraph, Table, TableCell, TableRow, TextRun, TextStyle};
use docfill::{fill_document, FillOptions, PlaceholderMap};

/// Creates a document with `count` paragraphs and a nested pricing table.
fn create_test_document(count: usize) -> Document {
    let mut doc = Document::new();
    for i in 0..count {
        doc.add_paragraph(Paragraph::with_runs(vec![
            TextRun::bold(format!("Clause {}: ", i + 1)),
            TextRun::new("This agreement between <<Client"),
            TextRun::styled(
                " Name>> and the provider is valid until <<VDate>>.",
                TextStyle::default().with_font("Georgia"),
            ),
        ]));
    }

    let mut table = Table::new();
    for i in 0..count / 10 {
        let mut cell = TableCell::text(format!("Item {}", i));
        cell.add_table(Table::with_rows(vec![TableRow::from_strings([
            "Price", "<<P01>> USD",
        ])]));
        table.add_row(TableRow::new(vec![cell, TableCell::text("<<T-Price>>")]));
    }
    doc.add_table(table);
    doc
}

fn create_placeholders() -> PlaceholderMap {
    [
        ("<<Client Name>>", "Northwind Traders"),
        ("<<VDate>>", "31 March, 2025"),
        ("<<P01>>", "1,200"),
        ("<<T-Price>>", "2,000"),
    ]
    .into_iter()
    .collect()
}

/// Benchmark filling documents of increasing size.
fn bench_fill_document(c: &mut Criterion) {
    let placeholders = create_placeholders();
    let options = FillOptions::default();
    let mut group = c.benchmark_group("fill_document");

    for count in [10, 100, 1000] {
        let doc = create_test_document(count);
        group.bench_with_input(BenchmarkId::from_parameter(count), &doc, |b, doc| {
            b.iter(|| {
                let mut doc = doc.clone();
                fill_document(black_box(&mut doc), black_box(&placeholders), &options)
            });
        });
    }

    group.finish();
}

/// Benchmark a pass with nothing to replace.
fn bench_fill_no_matches(c: &mut Criterion) {
    let doc = create_test_document(100);
    let placeholders: PlaceholderMap = [("<<Unused>>", "x")].into_iter().collect();
    let options = FillOptions::new().with_unresolved_report(false);

    c.bench_function("fill_no_matches", |b| {
        b.iter(|| {
            let mut doc = doc.clone();
            fill_document(black_box(&mut doc), black_box(&placeholders), &options)
        });
    });
}

/// Benchmark packaging a filled document.
fn bench_write_docx(c: &mut Criterion) {
    let mut doc = create_test_document(100);
    fill_document(&mut doc, &create_placeholders(), &FillOptions::default());

    c.bench_function("write_docx", |b| {
        b.iter(|| docfill::docx::write_docx(black_box(&doc)).unwrap());
    });
}

criterion_group!(
    benches,
    bench_fill_document,
    bench_fill_no_matches,
    bench_write_docx
);
criterion_main!(benches);
