use std::hint::black_box;

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use irisml::dataset::{load_builtin, split};
use irisml::ml::{ForestOptions, TreeOptions, train_forest, train_tree};

fn bench_forest_fit(c: &mut Criterion) {
    let set = load_builtin().expect("builtin iris");
    let (train, _) = split(&set, 0.2, 42, false).expect("split");
    for n_trees in [10usize, 100] {
        let options = ForestOptions {
            n_trees,
            ..ForestOptions::default()
        };
        c.bench_with_input(
            BenchmarkId::new("forest_fit", n_trees),
            &options,
            |b, options| {
                b.iter(|| train_forest(black_box(&train), options).expect("fit forest"));
            },
        );
    }
}

fn bench_tree_fit(c: &mut Criterion) {
    let set = load_builtin().expect("builtin iris");
    let (train, _) = split(&set, 0.4, 42, true).expect("split");
    let options = TreeOptions {
        max_depth: Some(3),
        seed: 1,
        ..TreeOptions::default()
    };
    c.bench_function("tree_fit_depth3", |b| {
        b.iter(|| train_tree(black_box(&train), &options).expect("fit tree"));
    });
}

criterion_group!(benches, bench_forest_fit, bench_tree_fit);
criterion_main!(benches);
