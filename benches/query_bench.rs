#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stratalog::{Database, Literal, Rule};

fn setup_large_graph() -> Database {
    let mut db = Database::new();

    // A graph with 1000 nodes, 5 outgoing edges each
    for i in 0..1000 {
        for j in 0..5 {
            let next = (i + j + 1) % 1000;
            db.fact(Literal::new(
                "edge",
                [format!("node_{i}"), format!("node_{next}")],
            ))
            .unwrap();
        }
    }

    db.rule(Rule::new(
        Literal::new("path", ["X", "Y"]),
        vec![Literal::new("edge", ["X", "Y"])],
    ))
    .unwrap();
    db.rule(Rule::new(
        Literal::new("path", ["X", "Z"]),
        vec![
            Literal::new("path", ["X", "Y"]),
            Literal::new("edge", ["Y", "Z"]),
        ],
    ))
    .unwrap();

    db
}

fn query_direct_edges(c: &mut Criterion) {
    let mut db = setup_large_graph();

    c.bench_function("query_direct_edges", |b| {
        b.iter(|| {
            black_box(
                db.query(vec![Literal::new("edge", ["node_0", "X"])])
                    .unwrap(),
            )
        });
    });
}

fn query_existence_check(c: &mut Criterion) {
    let mut db = setup_large_graph();

    c.bench_function("query_existence_check", |b| {
        b.iter(|| {
            black_box(
                db.ask(vec![Literal::new("path", ["node_0", "node_100"])])
                    .unwrap(),
            )
        });
    });
}

fn query_with_comparison(c: &mut Criterion) {
    let mut db = Database::new();
    for i in 0..1000 {
        db.fact(Literal::new("score", [format!("item_{i}"), format!("{i}")]))
            .unwrap();
    }

    c.bench_function("query_with_comparison", |b| {
        b.iter(|| {
            black_box(
                db.query(vec![
                    Literal::new("score", ["X", "N"]),
                    Literal::new(">=", ["N", "990"]),
                ])
                .unwrap(),
            )
        });
    });
}

fn query_with_negation(c: &mut Criterion) {
    let mut db = Database::new();
    for i in 0..500 {
        db.fact(Literal::new("item", [format!("i{i}")])).unwrap();
        if i % 2 == 0 {
            db.fact(Literal::new("flagged", [format!("i{i}")])).unwrap();
        }
    }

    c.bench_function("query_with_negation", |b| {
        b.iter(|| {
            black_box(
                db.query(vec![
                    Literal::new("item", ["X"]),
                    Literal::negated("flagged", ["X"]),
                ])
                .unwrap(),
            )
        });
    });
}

criterion_group!(
    benches,
    query_direct_edges,
    query_existence_check,
    query_with_comparison,
    query_with_negation
);
criterion_main!(benches);
