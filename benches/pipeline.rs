//! Benchmarks for the scripture and gloss pipelines.
//!
//! Run with: cargo bench

use criterion::{Criterion, criterion_group, criterion_main};

use lectio::index::ChapterIndex;
use lectio::render::{HtmlConfig, MarkdownConfig, render_html, render_markdown, render_segments};
use lectio::unihan::{PaginationPolicy, paginate_fields, parse_field_major};
use lectio::usx::{ParseOptions, parse_usx};

const USX_BYTES: &[u8] = include_bytes!("../tests/fixtures/genesis.usx");
const UNIHAN_BYTES: &[u8] = include_bytes!("../tests/fixtures/unihan_sample.txt");

/// Repeat the sample chapters so the book is large enough to measure.
fn large_usx(copies: usize) -> Vec<u8> {
    let text = String::from_utf8_lossy(USX_BYTES);
    let start = text.find("<chapter").unwrap();
    let end = text.rfind("</usx>").unwrap();
    let body = &text[start..end];

    let mut out = String::with_capacity(text.len() * copies);
    out.push_str(&text[..start]);
    for _ in 0..copies {
        out.push_str(body);
    }
    out.push_str("</usx>\n");
    out.into_bytes()
}

// ============================================================================
// Scripture Benchmarks
// ============================================================================

fn bench_parse_usx(c: &mut Criterion) {
    let bytes = large_usx(50);
    let options = ParseOptions::default();
    c.bench_function("parse_usx", |b| {
        b.iter(|| parse_usx(&bytes, &options).unwrap());
    });
}

fn bench_render(c: &mut Criterion) {
    let book = parse_usx(&large_usx(50), &ParseOptions::default()).unwrap();
    let markdown = MarkdownConfig::default();
    let html = HtmlConfig::default();

    c.bench_function("render_markdown", |b| {
        b.iter(|| render_markdown(&book, &markdown));
    });
    c.bench_function("render_html", |b| {
        b.iter(|| render_html(&book, &html).unwrap());
    });
    c.bench_function("render_segments_and_index", |b| {
        b.iter(|| {
            let segments = render_segments(&book).output;
            ChapterIndex::build(&segments)
        });
    });
}

// ============================================================================
// Gloss Benchmarks
// ============================================================================

fn bench_unihan(c: &mut Criterion) {
    let text = String::from_utf8_lossy(UNIHAN_BYTES).repeat(200);
    c.bench_function("parse_field_major", |b| {
        b.iter(|| parse_field_major(text.as_bytes()).unwrap());
    });

    let dict = parse_field_major(text.as_bytes()).unwrap().lookup;
    c.bench_function("paginate_fields", |b| {
        b.iter(|| paginate_fields(&dict, 1000, PaginationPolicy::ByKey).unwrap());
    });
}

criterion_group!(benches, bench_parse_usx, bench_render, bench_unihan);
criterion_main!(benches);
