//! Score k = 1..=8 on three well-separated 2D blobs.
//!
//! Run with `cargo run --example complexity [config.yaml]`; set `RUST_LOG=debug`
//! to see per-candidate progress.

use mdlk::{ComplexityEstimator, EstimatorConfig, Matrix};
use rand::prelude::*;

const SEED: u64 = 42;

fn blobs(centers: &[[f64; 2]], per_blob: usize, spread: f64, seed: u64) -> Matrix {
    let mut rng = StdRng::seed_from_u64(seed);
    let rows = centers
        .iter()
        .flat_map(|c| std::iter::repeat(c).take(per_blob))
        .map(|c| {
            vec![
                c[0] + rng.random_range(-spread..spread),
                c[1] + rng.random_range(-spread..spread),
            ]
        })
        .collect();
    Matrix::from_rows(rows).expect("blob rows share one dimension")
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match std::env::args().nth(1) {
        Some(path) => EstimatorConfig::from_file(&path).expect("failed to load configuration"),
        None => EstimatorConfig::default(),
    };
    print!("{config}");

    // Three blobs: near the origin, near (5, 5), near (10, 0).
    let data = blobs(&[[0.0, 0.0], [5.0, 5.0], [10.0, 0.0]], 30, 0.5, SEED);
    let ks: Vec<usize> = (1..=8).collect();

    let estimator = ComplexityEstimator::from_config(&config).expect("invalid configuration");
    let table = match estimator.estimate(&data, &ks, SEED) {
        Ok(table) => table,
        Err(e) => {
            eprintln!("estimation failed: {e}");
            std::process::exit(1);
        }
    };

    println!("\n{table}");
    match table.best_k() {
        Some(k) => println!("best k = {k}"),
        None => println!("no candidate could be scored"),
    }
}
