use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use billwatch_forest::AnomalyLabel;
use billwatch_io::{AnomalyWriter, DEFAULT_AMOUNT_COLUMN, TransactionReader};
use billwatch_pipeline::{Trainer, detect_anomalies};

#[derive(Parser)]
#[command(name = "billwatch")]
#[command(about = "Bill-shock detection for transaction data via isolation forests")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// RNG seed for reproducibility
    #[arg(long, default_value_t = 42, global = true)]
    seed: u64,

    /// Enable verbose (debug-level) logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Suppress all output except errors
    #[arg(long, global = true)]
    quiet: bool,

    /// Number of threads for parallel computation (defaults to all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Train an anomaly model on historical transactions and persist it
    Train {
        /// Path to the transaction CSV file
        #[arg(long)]
        data: PathBuf,

        /// Path to write the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Expected proportion of anomalies (0.01-0.5; invalid values fall
        /// back to 0.05)
        #[arg(long, default_value_t = 0.05)]
        contamination: f64,

        /// Name of the amount column (matched case-insensitively)
        #[arg(long, default_value = DEFAULT_AMOUNT_COLUMN)]
        amount_column: String,

        /// Number of trees in the ensemble
        #[arg(long, default_value_t = 100)]
        n_trees: usize,

        /// Per-tree subsample size (clamped to the dataset size)
        #[arg(long, default_value_t = 256)]
        subsample_size: usize,
    },

    /// Detect bill shocks in a transaction batch using a stored model
    Detect {
        /// Path to the transaction CSV file
        #[arg(long)]
        data: PathBuf,

        /// Path to the trained model binary
        #[arg(long)]
        model: PathBuf,

        /// Optional CSV output path for the flagged rows
        #[arg(long)]
        output: Option<PathBuf>,

        /// Name of the amount column (matched case-insensitively)
        #[arg(long, default_value = DEFAULT_AMOUNT_COLUMN)]
        amount_column: String,
    },
}

// --- JSON stdout output structs ---

#[derive(Serialize)]
struct TrainOutput {
    n_records: usize,
    n_trained: usize,
    contamination: f64,
    threshold: f64,
    model: String,
}

#[derive(Serialize)]
struct DetectOutput {
    n_records: usize,
    n_anomalies: usize,
    anomaly_fraction: f64,
    output: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match (cli.verbose, cli.quiet) {
        (true, _) => "debug",
        (_, true) => "error",
        _ => "info",
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    // Configure Rayon thread pool
    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("failed to configure thread pool")?;
        info!(threads, "thread pool configured");
    }

    match cli.command {
        Command::Train {
            data,
            model,
            contamination,
            amount_column,
            n_trees,
            subsample_size,
        } => {
            let summary = Trainer::new()
                .with_n_trees(n_trees)
                .with_subsample_size(subsample_size)
                .with_seed(cli.seed)
                .train_file(&data, &model, contamination, &amount_column)
                .context("training failed")?;

            let output = TrainOutput {
                n_records: summary.n_records,
                n_trained: summary.n_trained,
                contamination: summary.contamination,
                threshold: summary.threshold,
                model: summary.model_path.display().to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }

        Command::Detect {
            data,
            model,
            output,
            amount_column,
        } => {
            let table = TransactionReader::new(&data)
                .read()
                .context("failed to read input CSV")?;

            let report = detect_anomalies(&table, &model, &amount_column)
                .context("detection failed")?;

            if let Some(output_path) = &output {
                let rows: Vec<_> = report
                    .anomalies()
                    .iter()
                    .map(|a| (&a.record, AnomalyLabel::BillShock))
                    .collect();
                AnomalyWriter::new(output_path)
                    .write(report.headers(), &rows)
                    .context("failed to write anomaly CSV")?;
            }

            let summary = DetectOutput {
                n_records: report.n_records(),
                n_anomalies: report.n_anomalies(),
                anomaly_fraction: report.anomaly_fraction(),
                output: output.map(|p| p.display().to_string()),
            };
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }

    Ok(())
}
