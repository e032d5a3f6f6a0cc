use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde::{Deserialize, Serialize};
use serde_fstorage::{from_node, from_str, to_node, to_string, Depth, Document, Matrix, Node, NodeMap};

#[derive(Serialize, Deserialize, Clone)]
struct Intrinsics {
    fx: f64,
    fy: f64,
    cx: f64,
    cy: f64,
    model: String,
    distortion: Vec<f64>,
}

fn intrinsics() -> Intrinsics {
    Intrinsics {
        fx: 525.0,
        fy: 525.0,
        cx: 319.5,
        cy: 239.5,
        model: "pinhole".to_string(),
        distortion: vec![0.1, -0.25, 0.0, 0.0, 0.001],
    }
}

fn sample_document(size: usize) -> Document {
    let mut doc = Document::new();
    doc.push("num1", 1).unwrap();
    doc.push("seq_node", Node::from((0..size as i64).collect::<Vec<i64>>()))
        .unwrap();
    let mut map = NodeMap::new();
    for i in 0..size {
        map.push(format!("node_{}", i), i).unwrap();
    }
    doc.push("map_node", map).unwrap();
    doc
}

fn benchmark_emit_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("emit_document");

    for size in [10, 100, 1000].iter() {
        let doc = sample_document(*size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &doc, |b, doc| {
            b.iter(|| to_string(black_box(doc)))
        });
    }

    group.finish();
}

fn benchmark_parse_document(c: &mut Criterion) {
    let mut group = c.benchmark_group("parse_document");

    for size in [10, 100, 1000].iter() {
        let text = to_string(&sample_document(*size)).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(size), &text, |b, text| {
            b.iter(|| from_str(black_box(text)))
        });
    }

    group.finish();
}

fn benchmark_matrix(c: &mut Criterion) {
    let mut group = c.benchmark_group("matrix");

    for side in [4, 64, 256].iter() {
        let mut doc = Document::new();
        doc.push("A", Matrix::filled(*side, *side, Depth::F32, 10.0))
            .unwrap();
        let text = to_string(&doc).unwrap();

        group.bench_with_input(BenchmarkId::new("emit", side), &doc, |b, doc| {
            b.iter(|| to_string(black_box(doc)))
        });
        group.bench_with_input(BenchmarkId::new("parse", side), &text, |b, text| {
            b.iter(|| from_str(black_box(text)))
        });
    }

    group.finish();
}

fn benchmark_serde_bridge(c: &mut Criterion) {
    let value = intrinsics();
    let node = to_node(&value).unwrap();

    c.bench_function("to_node_struct", |b| b.iter(|| to_node(black_box(&value))));
    c.bench_function("from_node_struct", |b| {
        b.iter(|| from_node::<Intrinsics>(black_box(&node)))
    });
}

criterion_group!(
    benches,
    benchmark_emit_document,
    benchmark_parse_document,
    benchmark_matrix,
    benchmark_serde_bridge
);
criterion_main!(benches);
