// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// This is the entry point for all user interaction.
// It uses the `clap` crate to parse command line arguments.
// All business logic is delegated to Layer 2 (application).
//
//   1. `train`    — fits encoders, schema and forest; writes a bundle
//   2. `predict`  — loads the bundle and scores one record
//   3. `serve`    — loads the bundle and answers JSON-lines requests
//   4. `health`   — liveness probe
//   5. `generate` — writes a synthetic customer table
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use commands::{Commands, GenerateArgs, PredictArgs, ServeArgs, TrainArgs};

#[derive(Parser, Debug)]
#[command(
    name = "churn-predict",
    version = "0.1.0",
    about = "Train a customer churn classifier on tabular data, then serve predictions."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Match on the subcommand and dispatch to the correct use case.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)    => run_train(args),
            Commands::Predict(args)  => run_predict(args),
            Commands::Serve(args)    => run_serve(args),
            Commands::Health         => run_health(),
            Commands::Generate(args) => run_generate(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    use crate::application::train_use_case::TrainUseCase;

    match &args.data {
        Some(path) => tracing::info!("Starting training on: {path}"),
        None => tracing::info!("Starting training on {} synthetic customers", args.synthetic_rows),
    }

    let summary = TrainUseCase::new(args.into()).execute()?;

    println!("{}", summary.report);
    println!("Model Accuracy: {:.2}%", summary.accuracy * 100.0);
    println!("Run {} saved to {}", summary.run_id, summary.bundle_dir.display());
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    use crate::application::predict_use_case::InferenceService;
    use crate::domain::prediction::RiskPolicy;
    use crate::infra::artifact_store::ArtifactStore;

    let text = match (&args.record, &args.input) {
        (Some(record), _) => record.clone(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read record file: {path}"))?,
        (None, None) => anyhow::bail!("either --record or --input is required"),
    };
    let payload: serde_json::Value =
        serde_json::from_str(&text).context("Record is not valid JSON")?;

    let config  = args.serve_config();
    let store   = ArtifactStore::new(&config.artifact_dir);
    let service = InferenceService::from_store(&store, RiskPolicy::new(config.risk_threshold)?)
        .with_context(|| format!("No usable bundle under '{}'", config.artifact_dir))?;

    let prediction = service.predict_json(&payload)?;
    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    use crate::application::serve_use_case::{ServeConfig, ServeUseCase};

    let config: ServeConfig = args.into();
    let server = ServeUseCase::start(&config)?;
    let stdin  = std::io::stdin();
    let stdout = std::io::stdout();
    server.run(stdin.lock(), stdout.lock())?;
    Ok(())
}

fn run_health() -> Result<()> {
    use crate::application::predict_use_case::InferenceService;
    use crate::domain::prediction::RiskPolicy;

    let health = InferenceService::unready(RiskPolicy::default()).health();
    println!("{}", serde_json::to_string(&health)?);
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    use crate::data::{loader::save_jsonl, synthetic::SyntheticCustomers};

    let output = Path::new(&args.output);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    let table = SyntheticCustomers::new(args.rows, args.seed).generate();
    save_jsonl(&table, output)?;

    tracing::info!("Wrote {} synthetic customers to {}", table.len(), output.display());
    println!("Sample data generated: {}", output.display());
    Ok(())
}
