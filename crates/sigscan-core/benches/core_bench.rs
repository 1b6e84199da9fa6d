//! Criterion benchmarks for sigscan-core.
//!
//! ## Benchmark groups
//!
//! 1. **canonical**: type normalization, canonical signatures, Keccak selectors.
//! 2. **extraction**: declaration extraction from source text of growing size.
//! 3. **scanning**: full and incremental scans of a synthetic Foundry project.
//! 4. **rendering**: every export format over a scanned snapshot.
//!
//! ## Running
//!
//! ```sh
//! cargo bench --manifest-path crates/sigscan-core/Cargo.toml
//! # Run only the rendering group:
//! cargo bench --manifest-path crates/sigscan-core/Cargo.toml -- rendering
//! ```

use std::fs;
use std::path::Path;

use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use tempfile::TempDir;

use sigscan_core::export::{render, ExportFormat, ExportOptions, ExportView};
use sigscan_core::indexer::canonical::{
    canonicalize, event_topic, function_selector, normalize_type,
};
use sigscan_core::indexer::symbols::{extract_contract, strip_comments};
use sigscan_core::{Category, Parameter, Scanner};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A contract with `n` functions, `n / 4` events, and `n / 4` errors.
fn synthetic_contract(name: &str, n: usize) -> String {
    let mut src = format!(
        "// SPDX-License-Identifier: MIT\npragma solidity ^0.8.20;\n\nimport \"../lib/oz/Ownable.sol\";\n\ncontract {name} is Ownable {{\n"
    );
    for i in 0..n / 4 {
        src.push_str(&format!(
            "    event Moved{i}(address indexed from, address indexed to, uint256 amount);\n"
        ));
        src.push_str(&format!("    error Rejected{i}(uint256 code, string reason);\n"));
    }
    for i in 0..n {
        src.push_str(&format!(
            "    /// moves tokens\n    function move{i}(address to, uint256[] calldata ids, bytes memory data) external payable returns (bool ok) {{\n        return true;\n    }}\n"
        ));
    }
    src.push_str("}\n");
    src
}

/// A Foundry project with `files` contracts under `src/` and one library.
fn synthetic_project(files: usize) -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    fs::write(root.join("foundry.toml"), "[profile.default]\n").unwrap();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join("lib/oz")).unwrap();
    fs::write(
        root.join("lib/oz/Ownable.sol"),
        "contract Ownable {\n    function owner() public view returns (address) {}\n}\n",
    )
    .unwrap();
    for i in 0..files {
        let name = format!("Token{i}");
        fs::write(
            root.join(format!("src/{name}.sol")),
            synthetic_contract(&name, 20),
        )
        .unwrap();
    }
    dir
}

// ---------------------------------------------------------------------------
// Canonical
// ---------------------------------------------------------------------------

fn bench_canonical(c: &mut Criterion) {
    let mut group = c.benchmark_group("canonical");

    group.bench_function("normalize_type_spaced_array", |b| {
        b.iter(|| normalize_type(black_box("uint256 [ ] [ 3 ]")));
    });

    let params = vec![
        Parameter::new("address", "to"),
        Parameter::new("uint256 [ ]", "ids"),
        Parameter::new("bytes", "data"),
    ];
    group.bench_function("canonicalize_three_params", |b| {
        b.iter(|| canonicalize(black_box("safeBatchTransfer"), black_box(&params)));
    });

    group.bench_function("function_selector", |b| {
        b.iter(|| function_selector(black_box("transfer(address,uint256)")));
    });

    group.bench_function("event_topic", |b| {
        b.iter(|| event_topic(black_box("Transfer(address,address,uint256)")));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let path = Path::new("/bench/src/Token.sol");

    for &functions in &[4usize, 40, 400] {
        let source = synthetic_contract("Token", functions);
        group.bench_with_input(
            BenchmarkId::new("extract_contract", functions),
            &source,
            |b, src| {
                b.iter(|| extract_contract(black_box(src), path, Utc::now()));
            },
        );
    }

    let source = synthetic_contract("Token", 40);
    group.bench_function("strip_comments_40_functions", |b| {
        b.iter(|| strip_comments(black_box(&source)));
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Scanning
// ---------------------------------------------------------------------------

fn bench_scanning(c: &mut Criterion) {
    let mut group = c.benchmark_group("scanning");
    let scanner = Scanner::new();

    for &files in &[10usize, 100] {
        let project = synthetic_project(files);
        group.bench_with_input(
            BenchmarkId::new("scan_project", files),
            project.path(),
            |b, root| {
                b.iter(|| black_box(scanner.scan_project(root)));
            },
        );
    }

    let project = synthetic_project(100);
    group.bench_function("incremental_update_nothing_changed_100", |b| {
        b.iter_with_setup(
            || (scanner.scan_project(project.path()), Utc::now()),
            |(mut snapshot, since)| {
                black_box(scanner.apply_incremental_update(&mut snapshot, since));
            },
        );
    });

    group.finish();
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn bench_rendering(c: &mut Criterion) {
    let mut group = c.benchmark_group("rendering");
    let project = synthetic_project(50);
    let snapshot = Scanner::new().scan_project(project.path());
    let now = Utc::now();

    for (label, deduplicate) in [("dedup", true), ("full", false)] {
        let options = ExportOptions {
            deduplicate,
            ..ExportOptions::default()
        };
        let view = ExportView::build(
            &snapshot,
            Category::Contracts,
            snapshot.contracts_in(Category::Contracts),
            &options,
            now,
        );
        for format in [
            ExportFormat::Text,
            ExportFormat::Json,
            ExportFormat::Csv,
            ExportFormat::Markdown,
        ] {
            group.bench_with_input(
                BenchmarkId::new(format!("{format}_{label}"), 50),
                &view,
                |b, view| {
                    b.iter(|| render(format, black_box(view)).unwrap());
                },
            );
        }
    }

    group.finish();
}

// ---------------------------------------------------------------------------
// Register all benchmark groups
// ---------------------------------------------------------------------------

criterion_group!(
    benches,
    bench_canonical,
    bench_extraction,
    bench_scanning,
    bench_rendering,
);
criterion_main!(benches);
