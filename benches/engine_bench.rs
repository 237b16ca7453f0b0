#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use stratalog::{Database, Literal, Rule};

/// Benchmark for loading facts into the database
fn bench_add_facts(c: &mut Criterion) {
    c.bench_function("add_facts", |b| {
        b.iter(|| {
            let mut db = Database::new();

            // Add multiple facts to measure insertion performance
            for i in 0..1000 {
                db.fact(black_box(Literal::new(
                    "edge",
                    [format!("node_{i}"), format!("node_{}", i + 1)],
                )))
                .unwrap();
            }

            black_box(db)
        });
    });
}

/// Benchmark for a single non-recursive rule
fn bench_simple_rule_evaluation(c: &mut Criterion) {
    c.bench_function("simple_rule_evaluation", |b| {
        b.iter(|| {
            let mut db = Database::new();

            for i in 0..100 {
                db.fact(Literal::new(
                    "edge",
                    [format!("n{i}"), format!("n{}", i + 1)],
                ))
                .unwrap();
            }

            db.rule(Rule::new(
                Literal::new("path", ["X", "Y"]),
                vec![Literal::new("edge", ["X", "Y"])],
            ))
            .unwrap();

            black_box(db.query(vec![Literal::new("path", ["X", "Y"])]).unwrap())
        });
    });
}

/// Benchmark for transitive closure over a linear chain
fn bench_transitive_closure(c: &mut Criterion) {
    c.bench_function("transitive_closure", |b| {
        b.iter(|| {
            let mut db = Database::new();

            // A linear chain is the worst case for the closure
            for i in 0..50 {
                db.fact(Literal::new(
                    "edge",
                    [format!("n{i}"), format!("n{}", i + 1)],
                ))
                .unwrap();
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

            black_box(db.query(vec![Literal::new("path", ["X", "Y"])]).unwrap())
        });
    });
}

/// Benchmark for a program mixing closure, joins and a comparison built-in
fn bench_program_execution(c: &mut Criterion) {
    let mut program = String::new();
    for i in 0..30 {
        for j in 0..3 {
            program.push_str(&format!("edge(n{i}, n{}).\n", (i + j + 1) % 30));
        }
    }
    for i in 0..30 {
        let parity = if i % 2 == 0 { "even" } else { "odd" };
        program.push_str(&format!("node_type(n{i}, {parity}).\n"));
    }
    program.push_str(
        "path(X, Y) :- edge(X, Y).
         path(X, Z) :- path(X, Y), edge(Y, Z).
         same_kind(X, Y) :- path(X, Y), node_type(X, T), node_type(Y, T), X <> Y.
         same_kind(X, Y)?",
    );

    c.bench_function("program_execution", |b| {
        b.iter(|| {
            let mut db = Database::new();
            black_box(db.execute_all(&program).unwrap())
        });
    });
}

/// Benchmark for retrieving facts of one predicate from a large store
fn bench_fact_retrieval(c: &mut Criterion) {
    let mut db = Database::new();
    for i in 0..10000 {
        db.fact(Literal::new(
            "large_relation",
            [format!("item_{i}"), format!("value_{}", i % 100)],
        ))
        .unwrap();
    }

    c.bench_function("fact_retrieval", |b| {
        b.iter(|| black_box(db.edb().facts_for("large_relation").count()));
    });
}

criterion_group!(
    benches,
    bench_add_facts,
    bench_simple_rule_evaluation,
    bench_transitive_closure,
    bench_program_execution,
    bench_fact_retrieval
);
criterion_main!(benches);
