//! Player availability pipeline CLI
//!
//! Ingests season records into the store, trains the baseline classifiers,
//! and persists the winning model artifact.

use clap::{Parser, Subcommand};
use litmanen::{Config, Result};

#[derive(Parser)]
#[command(name = "litmanen")]
#[command(about = "Player availability modeling pipeline", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Data management commands
    Data {
        #[command(subcommand)]
        action: DataCommands,
    },
    /// Train the baseline models and persist the best one
    Train,
    /// Model management commands
    Model {
        #[command(subcommand)]
        action: ModelCommands,
    },
    /// Initialize a new project with default config
    Init,
}

#[derive(Subcommand)]
enum DataCommands {
    /// Load a season CSV into the store, replacing existing rows
    Load {
        /// Path to the season CSV file
        csv: String,
    },
    /// Show store status
    Status,
}

#[derive(Subcommand)]
enum ModelCommands {
    /// Show persisted model information
    Info,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let mut config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    // Environment override for the store location
    if let Ok(path) = std::env::var("LITMANEN_DATABASE") {
        config.data.database_path = path;
    }

    let result = match cli.command {
        Commands::Data { action } => match action {
            DataCommands::Load { csv } => commands::data_load(&config, &csv),
            DataCommands::Status => commands::data_status(&config),
        },
        Commands::Train => commands::train(&config),
        Commands::Model { action } => match action {
            ModelCommands::Info => commands::model_info(&config),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use litmanen::data::{ingest, stratified_split, Store};
    use litmanen::features::{self, LabelSummary, FEATURE_COLUMNS};
    use litmanen::model::{artifact, ModelArtifact};
    use litmanen::training::Trainer;
    use litmanen::PipelineError;
    use std::path::Path;

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        std::fs::create_dir_all("data")?;
        std::fs::create_dir_all("model")?;
        println!("Created data/ and model/ directories");

        println!("\nNext steps:");
        println!("  1. Edit {} to customize settings", config_path);
        println!("  2. Run 'litmanen data load <csv>' to ingest season records");
        println!("  3. Run 'litmanen train' to train and persist the model");

        Ok(())
    }

    pub fn data_load(config: &Config, csv_path: &str) -> Result<()> {
        let mut store = Store::open(&config.data.database_path)?;

        println!("Loading {} into the season table...", csv_path);
        let count = ingest::load_csv(&mut store, csv_path)?;
        println!("Successfully loaded {} rows from {}", count, csv_path);

        Ok(())
    }

    pub fn data_status(config: &Config) -> Result<()> {
        let store = Store::open(&config.data.database_path)?;
        let stats = store.stats()?;

        println!("Store Status");
        println!("───────────────────────────────");
        println!("  Path:     {}", config.data.database_path);
        println!("  Seasons:  {}", stats.season_count);
        if let (Some(earliest), Some(latest)) = (&stats.earliest_season, &stats.latest_season) {
            println!("  Range:    {} to {}", earliest, latest);
        }

        Ok(())
    }

    pub fn train(config: &Config) -> Result<()> {
        let store = Store::open(&config.data.database_path)?;

        println!("Pulling features from the store...");
        let records = store.fetch_features()?;
        if records.is_empty() {
            return Err(PipelineError::Insufficient(
                "no records in the feature view. Run 'litmanen data load' first.".to_string(),
            ));
        }
        println!("Pulled {} records", records.len());

        // Derive the low-availability target
        let labels = features::label_low_availability(&records);
        let summary = LabelSummary::from_labels(&labels);
        println!("\nTarget distribution:");
        println!("  low availability:  {}", summary.positive);
        println!("  available:         {}", summary.negative);
        println!(
            "  positive rate:     {:.1}%",
            summary.positive_rate() * 100.0
        );

        // Prepare the feature matrix and split
        let (x, y) = features::prepare(&records, &labels);
        let split = stratified_split(
            &x,
            &y,
            config.training.test_fraction,
            config.training.seed,
        )?;
        println!("\nTrain set: {} samples", split.train_len());
        println!("Test set:  {} samples", split.test_len());

        // Train both baselines and select by holdout accuracy
        println!("\nTraining baseline models...");
        let outcome = Trainer::new(config.training.clone()).train(&split)?;
        for candidate in &outcome.candidates {
            println!("\n{} accuracy: {:.3}", candidate.name, candidate.accuracy);
            println!("{}", candidate.report);
        }

        let best = outcome.best();
        println!("Best model: {} (accuracy: {:.3})", best.name, best.accuracy);

        // Persist the winning model with its feature column order
        let feature_columns = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
        let model_artifact = ModelArtifact::new(best.model.clone(), feature_columns);
        let model_dir = Path::new(&config.data.model_dir);
        let (artifact_path, report_path) = artifact::persist(&model_artifact, model_dir)?;
        println!("\nModel saved to: {}", artifact_path.display());

        if let Some(report_path) = report_path {
            println!("Feature importance saved to: {}", report_path.display());
            if let Some(ranked) = model_artifact.ranked_importances() {
                println!("\nFeature importance:");
                for (feature, importance) in ranked {
                    println!("  {:<20} {:.4}", feature, importance);
                }
            }
        }

        println!("\nTraining completed successfully!");

        Ok(())
    }

    pub fn model_info(config: &Config) -> Result<()> {
        let model_dir = Path::new(&config.data.model_dir);

        // Either variant may have won the last run; report the latest one
        let artifact_path = ["RandomForest", "LogisticRegression"]
            .iter()
            .map(|name| ModelArtifact::path_for(model_dir, name))
            .filter(|path| path.exists())
            .max_by_key(|path| {
                std::fs::metadata(path)
                    .and_then(|m| m.modified())
                    .unwrap_or(std::time::SystemTime::UNIX_EPOCH)
            })
            .ok_or(PipelineError::NoModel)?;

        let model_artifact = ModelArtifact::load(&artifact_path)?;

        println!("Model Information");
        println!("───────────────────────────────");
        println!("  Path:     {}", artifact_path.display());
        println!("  Model:    {}", model_artifact.model_name);
        println!("  Features: {}", model_artifact.feature_columns.join(", "));

        if let Some(ranked) = model_artifact.ranked_importances() {
            println!("\nFeature importance:");
            for (feature, importance) in ranked {
                println!("  {:<20} {:.4}", feature, importance);
            }
        }

        Ok(())
    }
}
