use clap::{Parser, Subcommand};
use fhe_kernels::{
    bench::{BenchRecord, run_matvec_benchmark, run_polyeval_benchmark},
    config::{BenchConfig, ConfigError},
    engine::{HeEngine, create_engine},
    report::write_csv,
    storage::save_keys,
};
use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "fhe-kernels", about = "Benchmarks for homomorphic matrix-vector and polynomial kernels")]
struct Cli {
    /// Benchmark configuration file
    #[arg(long, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the matrix-vector benchmark grid
    Matvec,
    /// Run the polynomial evaluation benchmark grid
    Polyeval,
    /// Generate key material and write it to the configured key directory
    Keygen {
        #[arg(long)]
        ring_dim: u32,
        #[arg(long)]
        depth: u32,
        /// Rotation shifts to generate keys for (defaults to matvec.rotation_indices)
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        shifts: Vec<i32>,
    },
    /// Interactive menu
    Menu,
}

fn run_and_report(
    kernel: &str,
    records: Result<Vec<BenchRecord>, ConfigError>,
    output: &Path,
) -> anyhow::Result<()> {
    let records = records?;
    let failed = records.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        warn!("{kernel}: {failed} of {} cells failed the correctness check", records.len());
    }
    write_csv(output, &records)?;
    Ok(())
}

fn run_matvec(config: &BenchConfig) -> anyhow::Result<()> {
    run_and_report("matvec", run_matvec_benchmark(config), &config.matvec.output_csv)
}

fn run_polyeval(config: &BenchConfig) -> anyhow::Result<()> {
    run_and_report("polyeval", run_polyeval_benchmark(config), &config.polyeval.output_csv)
}

fn keygen(config: &BenchConfig, ring_dim: u32, depth: u32, shifts: Vec<i32>) -> anyhow::Result<()> {
    let shifts = if shifts.is_empty() { config.matvec.rotation_indices.clone() } else { shifts };
    let mut engine = create_engine(&config.fhe, depth, ring_dim, config.fhe.seed)?;
    engine.gen_mult_key()?;
    engine.gen_rotate_keys(&shifts)?;
    let path = save_keys(&config.fhe.key_dir, &config.fhe.key_file, &engine.key_bundle())?;
    info!("keys for ring_dim={} depth={} saved to {:?}", ring_dim, depth, path);
    Ok(())
}

fn menu(config: &BenchConfig) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n[1] matrix-vector multiplication\n[2] polynomial evaluation\n[0] exit\n> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else {
            return Ok(());
        };
        let outcome = match line?.trim() {
            "1" => run_matvec(config),
            "2" => run_polyeval(config),
            "0" => return Ok(()),
            other => {
                warn!("invalid choice {other:?}");
                continue;
            }
        };
        // a failed benchmark does not end the session
        if let Err(err) = outcome {
            error!("{err:#}");
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = match BenchConfig::load_validated(&cli.config) {
        Ok(config) => config,
        Err(err) => {
            error!("invalid configuration {:?}: {err}", cli.config);
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Matvec => run_matvec(&config),
        Command::Polyeval => run_polyeval(&config),
        Command::Keygen { ring_dim, depth, shifts } => keygen(&config, ring_dim, depth, shifts),
        Command::Menu => menu(&config),
    }
}
