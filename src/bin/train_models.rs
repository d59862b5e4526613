//! Train (or retrain) the recommendation models
//!
//! Populates the model store so the API server starts without training.
//!
//! Usage:
//!   cargo run --release --bin train_models -- --data-dir data --model-dir models --force

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crop_advisor::config::{CROP_DATASET_FILE, FERTILIZER_DATASET_FILE};
use crop_advisor::crop::CROP_MODEL_KEY;
use crop_advisor::fertilizer::FERTILIZER_MODEL_KEY;
use crop_advisor::ml::{ForestParams, MaxFeatures};
use crop_advisor::{CropRecommender, FertilizerRecommender, ModelStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Model {
    Crop,
    Fertilizer,
}

/// Train the crop and fertilizer classifiers and persist them
#[derive(Parser, Debug)]
#[command(name = "train_models")]
#[command(about = "Train recommendation models and write them to the model store")]
struct Args {
    /// Directory holding the training CSVs
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Model store directory
    #[arg(long, env = "MODEL_DIR", default_value = "models")]
    model_dir: PathBuf,

    /// Retrain even when artifacts already exist
    #[arg(long)]
    force: bool,

    /// Train a single model
    #[arg(long, value_enum)]
    only: Option<Model>,

    /// Trees per forest
    #[arg(long, default_value_t = 100)]
    trees: usize,

    /// Seed for bootstrap resampling and feature subsets
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Fit every tree on all feature columns (plain bagging)
    #[arg(long)]
    all_features: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "crop_advisor=info,train_models=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let store = ModelStore::new(&args.model_dir)?;
    let params = ForestParams {
        n_trees: args.trees,
        seed: args.seed,
        max_features: if args.all_features {
            MaxFeatures::All
        } else {
            MaxFeatures::Sqrt
        },
    };

    let wants = |model: Model| args.only.map_or(true, |only| only == model);

    if wants(Model::Crop) {
        if store.exists(CROP_MODEL_KEY) && !args.force {
            tracing::info!(
                "Crop model already present in {:?} (use --force to retrain)",
                store.root()
            );
        } else {
            let start = Instant::now();
            let data_path = args.data_dir.join(CROP_DATASET_FILE);
            let recommender = CropRecommender::train(&data_path, &params)?;
            recommender.persist(&store)?;
            tracing::info!(
                "Crop model trained in {:.2}s ({} crops)",
                start.elapsed().as_secs_f64(),
                recommender.crops().len()
            );
        }
    }

    if wants(Model::Fertilizer) {
        if store.exists(FERTILIZER_MODEL_KEY) && !args.force {
            tracing::info!(
                "Fertilizer model already present in {:?} (use --force to retrain)",
                store.root()
            );
        } else {
            let start = Instant::now();
            let data_path = args.data_dir.join(FERTILIZER_DATASET_FILE);
            let recommender = FertilizerRecommender::train(&data_path, &params)?;
            recommender.persist(&store)?;
            tracing::info!(
                "Fertilizer model trained in {:.2}s ({} fertilizers)",
                start.elapsed().as_secs_f64(),
                recommender.fertilizers().len()
            );
        }
    }

    Ok(())
}
