use fhe_kernels::{
    engine::{EngineParams, HeEngine, SecurityLevel, SimulatedEngine},
    matvec::{MatVecVariant, encrypt_replicated, matvec_mult, required_rotation_shifts},
    sampler::{cell_rng, random_matrix, random_vector},
};
use std::{hint::black_box, time::Instant};
use tracing::info;

fn bench_matvec(n: usize) {
    let params = EngineParams::new(8192, 2, 50, SecurityLevel::Classic128);
    let mut engine = SimulatedEngine::new(params, Some(0)).unwrap();
    engine.gen_mult_key().unwrap();
    engine.gen_rotate_keys(&required_rotation_shifts(MatVecVariant::Parallel, n)).unwrap();
    let mut rng = cell_rng(Some(0), n as u64);
    let matrix = random_matrix(&mut rng, n, 10.0);
    let vector = random_vector(&mut rng, n, 10.0);
    let ct = encrypt_replicated(&engine, &vector).unwrap();

    for variant in [MatVecVariant::Sequential, MatVecVariant::Parallel] {
        let start = Instant::now();
        let result = matvec_mult(&engine, variant, &matrix, &ct).unwrap();
        let elapsed = start.elapsed();
        black_box(result);
        info!("matvec {} n={}: {:?}", variant, n, elapsed);
    }
}

fn main() {
    let _ = tracing_subscriber::fmt::try_init();
    for n in [16, 64, 256] {
        bench_matvec(n);
    }
}
