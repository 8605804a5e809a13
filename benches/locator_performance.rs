//! Locator Performance Benchmarks
//!
//! Accumulating, matching and resolving quotations across a synthetic book.
//!
//! Run with: `cargo bench --bench locator_performance`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use std::time::Duration;

use boox_import::cfi::format_anchor;
use boox_import::locator::{accumulate, find_best, locate_sequence};

const WORDS: &[&str] = &[
    "the", "traveller", "machine", "time", "river", "light", "garden", "morlocks", "eloi",
    "sphinx", "bronze", "candle", "darkness", "future", "spring",
];

/// Build one chapter of XHTML with `paragraphs` paragraphs
fn create_chapter(chapter: usize, paragraphs: usize) -> String {
    let mut xhtml = String::from("<html><head><title>Chapter</title></head><body>\n");
    xhtml.push_str(&format!("<h2>Chapter {}</h2>\n", chapter + 1));
    for p in 0..paragraphs {
        xhtml.push_str("<p>");
        for w in 0..40 {
            let word = WORDS[(chapter * 7 + p * 13 + w) % WORDS.len()];
            if w % 11 == 5 {
                xhtml.push_str(&format!("<i>{}</i> ", word));
            } else {
                xhtml.push_str(word);
                xhtml.push_str("\n    ");
            }
        }
        xhtml.push_str(&format!("marker{}x{}.</p>\n", chapter, p));
    }
    xhtml.push_str("</body></html>");
    xhtml
}

/// Benchmark flattening one chapter
fn bench_accumulate(c: &mut Criterion) {
    let mut group = c.benchmark_group("accumulate");
    group.measurement_time(Duration::from_secs(5));

    for paragraphs in [50, 500] {
        let source = create_chapter(0, paragraphs);
        let doc = roxmltree::Document::parse(&source).unwrap();

        group.bench_with_input(BenchmarkId::from_parameter(paragraphs), &doc, |b, doc| {
            b.iter(|| black_box(accumulate(black_box(doc.root_element()))))
        });
    }

    group.finish();
}

/// Benchmark exact vs whitespace-insensitive matching
fn bench_find(c: &mut Criterion) {
    let source = create_chapter(3, 500);
    let doc = roxmltree::Document::parse(&source).unwrap();
    let flat = accumulate(doc.root_element());

    let mut group = c.benchmark_group("find");
    group.measurement_time(Duration::from_secs(5));

    group.bench_function("exact_near_end", |b| {
        b.iter(|| black_box(find_best(&flat.text, black_box("marker3x498."), 0)))
    });
    group.bench_function("fuzzy_near_end", |b| {
        b.iter(|| black_box(find_best(&flat.text, black_box("marker3x 498."), 0)))
    });
    group.bench_function("missing", |b| {
        b.iter(|| black_box(find_best(&flat.text, black_box("not in this chapter"), 0)))
    });

    group.finish();
}

/// Benchmark a full batch over a multi-chapter book, CFI formatting included
fn bench_locate_sequence(c: &mut Criterion) {
    let sources: Vec<String> = (0..20).map(|i| create_chapter(i, 100)).collect();
    let docs: Vec<roxmltree::Document> = sources
        .iter()
        .map(|s| roxmltree::Document::parse(s).unwrap())
        .collect();
    let flats: Vec<_> = docs
        .iter()
        .enumerate()
        .map(|(i, doc)| (i, accumulate(doc.root_element())))
        .collect();
    let queries: Vec<String> = (0..20)
        .flat_map(|ch| (0..100).step_by(10).map(move |p| format!("marker{}x{}.", ch, p)))
        .collect();

    let mut group = c.benchmark_group("locate_sequence");
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(20);

    group.bench_function("200_quotes_20_chapters", |b| {
        b.iter(|| {
            let outcomes = locate_sequence(&flats, black_box(&queries));
            let cfis: Vec<_> = outcomes
                .iter()
                .filter_map(|o| o.located)
                .filter_map(|hit| format_anchor(hit.document, &hit.anchor))
                .collect();
            black_box(cfis)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_accumulate, bench_find, bench_locate_sequence);
criterion_main!(benches);
