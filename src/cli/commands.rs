// ============================================================
// Layer 1 — CLI Commands and Arguments
// ============================================================
// Defines the subcommands and all their configurable flags:
//   train, predict, serve, health, generate
//
// clap's derive macros automatically generate:
//   - help text (--help)
//   - error messages for missing args
//   - type conversion (string → usize, f64, etc.)
//
// Reference: Rust Book §12 (Building a CLI Program)

use clap::{Args, Subcommand};

use crate::application::serve_use_case::ServeConfig;
use crate::application::train_use_case::TrainConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Train the churn classifier and write a new artifact bundle
    Train(TrainArgs),

    /// Predict churn for a single customer record
    Predict(PredictArgs),

    /// Answer JSON-lines requests on stdin until EOF
    Serve(ServeArgs),

    /// Liveness probe; never touches the artifact bundle
    Health,

    /// Write a synthetic customer table as JSON lines
    Generate(GenerateArgs),
}

/// All arguments for the `train` command.
#[derive(Args, Debug)]
pub struct TrainArgs {
    /// JSON array or JSON-lines file of customer records.
    /// Without it, a synthetic table is generated.
    #[arg(long)]
    pub data: Option<String>,

    /// Rows to generate when no --data is given
    #[arg(long, default_value_t = 1000)]
    pub synthetic_rows: usize,

    /// Where the bundle and metrics.csv are written
    #[arg(long, default_value = "models")]
    pub artifact_dir: String,

    /// Identifier column, excluded from the features
    #[arg(long, default_value = "customer_id")]
    pub id_column: String,

    /// Binary target column (0 = retained, 1 = churned)
    #[arg(long, default_value = "churn")]
    pub target_column: String,

    /// Comma-separated categorical columns.
    /// Default: every column holding text values.
    #[arg(long, value_delimiter = ',')]
    pub categorical: Option<Vec<String>>,

    /// Fraction of rows held out for evaluation
    #[arg(long, default_value_t = 0.2)]
    pub test_fraction: f64,

    /// Seed for the split and the forest
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Number of trees in the forest
    #[arg(long, default_value_t = 100)]
    pub n_estimators: usize,

    /// Maximum depth of each tree
    #[arg(long, default_value_t = 10)]
    pub max_depth: usize,

    /// Minimum rows a node needs before it may split
    #[arg(long, default_value_t = 2)]
    pub min_samples_split: usize,
}

/// Convert CLI TrainArgs into the application-layer TrainConfig.
/// The application layer never sees clap types.
impl From<TrainArgs> for TrainConfig {
    fn from(a: TrainArgs) -> Self {
        TrainConfig {
            data_path:           a.data,
            synthetic_rows:      a.synthetic_rows,
            artifact_dir:        a.artifact_dir,
            id_column:           a.id_column,
            target_column:       a.target_column,
            categorical_columns: a.categorical,
            test_fraction:       a.test_fraction,
            seed:                a.seed,
            n_estimators:        a.n_estimators,
            max_depth:           a.max_depth,
            min_samples_split:   a.min_samples_split,
        }
    }
}

/// All arguments for the `predict` command.
#[derive(Args, Debug)]
pub struct PredictArgs {
    /// One customer as a flat JSON object
    #[arg(long, conflicts_with = "input", required_unless_present = "input")]
    pub record: Option<String>,

    /// File holding one customer as a flat JSON object
    #[arg(long)]
    pub input: Option<String>,

    /// Directory holding the trained bundle
    #[arg(long, default_value = "models")]
    pub artifact_dir: String,

    /// Probability above which a customer is "High" risk
    #[arg(long, default_value_t = 0.5)]
    pub risk_threshold: f64,
}

impl PredictArgs {
    pub fn serve_config(&self) -> ServeConfig {
        ServeConfig {
            artifact_dir:   self.artifact_dir.clone(),
            risk_threshold: self.risk_threshold,
        }
    }
}

/// All arguments for the `serve` command.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Directory holding the trained bundle
    #[arg(long, default_value = "models")]
    pub artifact_dir: String,

    /// Probability above which a customer is "High" risk
    #[arg(long, default_value_t = 0.5)]
    pub risk_threshold: f64,
}

impl From<ServeArgs> for ServeConfig {
    fn from(a: ServeArgs) -> Self {
        ServeConfig {
            artifact_dir:   a.artifact_dir,
            risk_threshold: a.risk_threshold,
        }
    }
}

/// All arguments for the `generate` command.
#[derive(Args, Debug)]
pub struct GenerateArgs {
    #[arg(long, default_value_t = 1000)]
    pub rows: usize,

    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Output JSON-lines file
    #[arg(long, default_value = "data/customers.jsonl")]
    pub output: String,
}
