//! Benchmarks for profile training and scoring
//!
//! Run with: cargo bench --package predictor
//!
//! Feature rows are random sparse one-hot style vectors of catalog width.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use features::l2_norm;
use predictor::{ProfileTrainer, ScoringMode, Scorer};
use rand::Rng;

const WIDTH: usize = 60;

fn random_rows(n: usize) -> Vec<Vec<f64>> {
    let mut rng = rand::rng();
    (0..n)
        .map(|_| {
            let mut row: Vec<f64> = (0..WIDTH)
                .map(|_| if rng.random_bool(0.1) { 1.0 } else { 0.0 })
                .collect();
            row[rng.random_range(0..WIDTH)] = 1.0;
            let norm = l2_norm(&row);
            row.iter_mut().for_each(|v| *v /= norm);
            row
        })
        .collect()
}

fn bench_train_profile(c: &mut Criterion) {
    let mut rng = rand::rng();
    let rows = random_rows(200);
    let samples: Vec<(&[f64], f64)> = rows
        .iter()
        .map(|row| (row.as_slice(), rng.random_range(1..=10u32) as f64 / 10.0))
        .collect();
    let trainer = ProfileTrainer::default();

    c.bench_function("train_profile_200_ratings", |b| {
        b.iter(|| {
            let weights = trainer.fit(black_box(&samples));
            black_box(weights)
        })
    });
}

fn bench_score_modes(c: &mut Criterion) {
    let rows = random_rows(1_000);
    let profile = random_rows(1).remove(0);

    for mode in ScoringMode::VARIANTS {
        let scorer = Scorer::new(mode, 5.0);
        c.bench_function(&format!("score_1000_movies_{}", mode), |b| {
            b.iter(|| {
                for row in &rows {
                    black_box(scorer.score(black_box(row), &profile));
                }
            })
        });
    }
}

criterion_group!(benches, bench_train_profile, bench_score_modes);
criterion_main!(benches);
