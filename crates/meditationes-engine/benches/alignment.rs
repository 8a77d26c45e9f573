use std::collections::BTreeMap;

use criterion::{Criterion, criterion_group, criterion_main};
use meditationes_engine::models::{Language, Page, Paragraph, TextData};
use meditationes_engine::resolver::{Resolution, resolve_line};
use meditationes_engine::segments::{align_segments, flatten_page};

fn generate_page(page_number: u32, segments: u32, cyrillic: bool) -> Page {
    let suffix = if cyrillic { 'а' } else { 'a' };
    let lines: Vec<String> = (1..=segments)
        .flat_map(|n| {
            [
                format!("({n}) Cogito ergo sum, et dubito"),
                format!("de omnibus ({n}{suffix}) quae sunt"),
            ]
        })
        .collect();
    Page::new(page_number, vec![Paragraph::body(lines)])
}

fn bench_alignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("alignment");
    group.sample_size(10);

    let latin = generate_page(1, 200, false);
    let ukrainian = generate_page(1, 200, true);
    let mut texts = BTreeMap::new();
    texts.insert(Language::La, flatten_page(&latin, true));
    texts.insert(Language::LaUa, flatten_page(&ukrainian, false));
    texts.insert(Language::Fr, flatten_page(&latin, false));

    group.bench_function("align_segments", |b| {
        b.iter(|| {
            let segments = align_segments(std::hint::black_box(&texts));
            std::hint::black_box(segments);
        });
    });

    let data = TextData { pages: vec![latin] };
    group.bench_function("resolve_last_line", |b| {
        b.iter(|| {
            let ids = resolve_line(&data, 1, std::hint::black_box(400), Resolution::Multi);
            std::hint::black_box(ids);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_alignment);
criterion_main!(benches);
