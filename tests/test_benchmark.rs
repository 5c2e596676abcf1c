use fhe_kernels::{
    bench::{run_matvec_benchmark, run_polyeval_benchmark},
    config::BenchConfig,
    engine::{HeEngine, SimulatedEngine, create_engine},
    report::{CSV_HEADER, write_csv},
    storage::{load_keys, save_keys},
};
use std::fs;
use tempfile::tempdir;
use tracing::info;

fn init_tracing() {
    // Install a global tracing subscriber once; ignore if already set by another test.
    let _ = tracing_subscriber::fmt::try_init();
}

const CONFIG: &str = r#"
[fhe]
scheme = "ckks"
scale_mod_size = 50
seed = 3

[matvec]
ring_dims = [128]
depth = 2
matrix_sizes = [4, 8]
function_variants = ["bogus", "sequential", "parallel"]

[polyeval]
ring_dims = [128]
depth = 6
vector_sizes = [16]
chebyshev_coeffs = [0.0, 1.0, 0.0, -0.1667, 0.0, 0.0083]
function_variants = ["custom", "chebyshev", "nonsense", "engine-native"]
"#;

#[test]
fn test_unknown_variant_skips_only_its_cell() {
    init_tracing();
    let tmp_dir = tempdir().unwrap();
    let config_path = tmp_dir.path().join("config.toml");
    fs::write(&config_path, CONFIG).unwrap();
    let config = BenchConfig::load_validated(&config_path).unwrap();

    let records = run_matvec_benchmark(&config).unwrap();
    let cells: Vec<(usize, &str)> =
        records.iter().map(|r| (r.size, r.variant.as_str())).collect();
    assert_eq!(
        cells,
        vec![(4, "sequential"), (4, "parallel"), (8, "sequential"), (8, "parallel")]
    );
    assert!(records.iter().all(|r| r.passed && r.ring_dim == 128));

    let records = run_polyeval_benchmark(&config).unwrap();
    let variants: Vec<&str> = records.iter().map(|r| r.variant.as_str()).collect();
    assert_eq!(variants, vec!["custom", "custom", "engine-native"]);
    assert!(records.iter().all(|r| r.passed));
}

#[test]
fn test_benchmark_csv() {
    init_tracing();
    let tmp_dir = tempdir().unwrap();
    let mut config = BenchConfig::from_toml(CONFIG).unwrap();
    config.matvec.output_csv = tmp_dir.path().join("matvec.csv");
    config.matvec.function_variants = vec!["sequential".to_string(), "parallel".to_string()];

    let records = run_matvec_benchmark(&config).unwrap();
    write_csv(&config.matvec.output_csv, &records).unwrap();
    let text = fs::read_to_string(&config.matvec.output_csv).unwrap();
    info!("csv:\n{text}");
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some(CSV_HEADER));
    let rows: Vec<Vec<&str>> = lines.map(|l| l.split(',').collect()).collect();
    assert_eq!(rows.len(), 4);
    for row in &rows {
        assert_eq!(row.len(), 5);
        assert_eq!(row[0], "128");
        assert!(row[3].parse::<f64>().unwrap() >= 0.0);
        assert_eq!(row[4], "true");
    }
}

#[test]
fn test_seeded_runs_sample_identical_inputs() {
    init_tracing();
    let config = BenchConfig::from_toml(CONFIG).unwrap();
    let a = run_polyeval_benchmark(&config).unwrap();
    let b = run_polyeval_benchmark(&config).unwrap();
    let strip = |records: &[fhe_kernels::bench::BenchRecord]| {
        records.iter().map(|r| (r.size, r.variant.clone(), r.passed)).collect::<Vec<_>>()
    };
    assert_eq!(strip(&a), strip(&b));
}

#[test]
fn test_keygen_round_trip() {
    init_tracing();
    let tmp_dir = tempdir().unwrap();
    let mut config = BenchConfig::from_toml(CONFIG).unwrap();
    config.fhe.key_dir = tmp_dir.path().join("keys");

    let mut engine = create_engine(&config.fhe, 4, 256, config.fhe.seed).unwrap();
    engine.gen_mult_key().unwrap();
    engine.gen_rotate_keys(&[1, 2, 3]).unwrap();
    let path = save_keys(&config.fhe.key_dir, &config.fhe.key_file, &engine.key_bundle()).unwrap();
    assert!(path.ends_with("keys/keys.json"));

    let restored = SimulatedEngine::from_key_bundle(&load_keys(&path).unwrap()).unwrap();
    assert_eq!(restored.params(), engine.params());
    assert_eq!(restored.rotation_shifts(), vec![1, 2, 3]);

    // restored keys are enough for a rotation
    let ct = restored.encrypt(&restored.pack(&[1.0, 2.0, 3.0, 4.0]).unwrap()).unwrap();
    let rotated = restored.eval_rotate(&ct, 3).unwrap();
    let first = restored.unpack(&restored.decrypt(&rotated).unwrap(), 1)[0];
    assert!((first - 4.0).abs() < 1e-3);
}
