use criterion::{black_box, criterion_group, criterion_main, Criterion};
use gardener::drip::{self, DependencyItem};
use gardener::parse::{parse_source, ImportExtractor, LanguageHandler};
use gardener::resolve::{IndexSettings, RepoIndex};
use gardener::walk::Language;
use rust_decimal::Decimal;
use std::path::Path;

fn python_source_snippet() -> &'static [u8] {
    b"import os\nimport sys\nfrom collections import OrderedDict\nfrom .utils import helper\nfrom ..config import settings\n\nclass App:\n    def run(self):\n        import json\n        return json.dumps({})\n"
}

fn typescript_source_snippet() -> &'static [u8] {
    b"import React, { useState } from 'react';\nimport type { Props } from './types';\nexport * from './hooks';\nconst lazy = () => import('./lazy');\nconst fs = require('node:fs');\n"
}

fn index() -> RepoIndex {
    RepoIndex::from_paths(
        [
            "pkg/utils.py",
            "config/__init__.py",
            "src/types.ts",
            "src/hooks/index.ts",
            "src/lazy.tsx",
        ],
        IndexSettings::default(),
    )
}

fn bench_python_extract(c: &mut Criterion) {
    let source = python_source_snippet();
    let index = index();
    let resolver = index.for_language(Language::Python);
    let handler = LanguageHandler::for_language(Language::Python);
    let file = Path::new("pkg/app.py");
    c.bench_function("python_parse_and_extract", |b| {
        b.iter(|| {
            let record = handler
                .extract_source(black_box(source), file, &resolver)
                .unwrap();
            black_box(record.external_imports.len())
        })
    });
}

fn bench_typescript_extract_only(c: &mut Criterion) {
    let source = typescript_source_snippet();
    let index = index();
    let resolver = index.for_language(Language::TypeScript);
    let handler = LanguageHandler::for_language(Language::TypeScript);
    let file = Path::new("src/app.ts");
    let tree = parse_source(Language::TypeScript, file, source).unwrap();
    c.bench_function("typescript_extract_prebuilt_tree", |b| {
        b.iter(|| {
            let record = handler.extract_imports(tree.root_node(), black_box(source), file, &resolver);
            black_box(record.components.len())
        })
    });
}

fn bench_drip_list(c: &mut Criterion) {
    let items: Vec<DependencyItem> = (0..2_000)
        .map(|i| {
            DependencyItem::new(
                format!("pkg{i}"),
                format!("https://github.com/org/repo{}", i % 400),
                Decimal::new(i as i64 * 37 % 1000 + 1, 2),
            )
        })
        .collect();
    c.bench_function("drip_list_2000_items", |b| {
        b.iter(|| {
            let entries = drip::build(black_box(&items), drip::MAX_DRIP_LIST_LENGTH, Some("https://github.com/org/repo7"));
            black_box(entries.len())
        })
    });
}

criterion_group!(
    benches,
    bench_python_extract,
    bench_typescript_extract_only,
    bench_drip_list
);
criterion_main!(benches);
