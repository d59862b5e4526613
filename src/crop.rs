//! Crop Recommender
//!
//! Suggests crops for soil and weather readings
//! (N, P, K, temperature, humidity, pH, rainfall).
//!
//! The classifier is loaded from the model store when a persisted artifact
//! exists; otherwise it is trained from the crop dataset and persisted.

use crate::data::{load_crop_dataset, CropTrainingSet};
use crate::error::RecommendError;
use crate::ml::{
    evaluate, train_test_split, CategoricalEncoder, ForestParams, LabelledSet, RandomForest,
    SPLIT_SEED, TEST_RATIO,
};
use crate::model_store::ModelStore;
use anyhow::{Context, Result};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CROP_MODEL_KEY: &str = "crop_model";

/// Number of ranked crops returned per recommendation
pub const TOP_K: usize = 3;

/// One crop feature vector, in classifier column order
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropFeatures {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub ph: f64,
    pub rainfall: f64,
}

impl CropFeatures {
    fn to_record(self) -> Array2<f64> {
        let values = [
            self.nitrogen,
            self.phosphorus,
            self.potassium,
            self.temperature,
            self.humidity,
            self.ph,
            self.rainfall,
        ];
        Array2::from_shape_fn((1, values.len()), |(_, col)| values[col])
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropScore {
    pub crop: String,
    pub probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub top_recommendation: String,
    pub recommendations: Vec<CropScore>,
}

/// Persisted artifact: forest plus the crop label vocabulary
#[derive(Debug, Serialize, Deserialize)]
struct CropModel {
    forest: RandomForest,
    labels: CategoricalEncoder,
}

#[derive(Debug)]
pub struct CropRecommender {
    model: CropModel,
}

impl CropRecommender {
    /// Load the persisted model, or train from `data_path` and persist it
    pub fn open(store: &ModelStore, data_path: &Path) -> Result<Self> {
        if store.exists(CROP_MODEL_KEY) {
            return Self::load(store);
        }

        tracing::info!("No crop model in {:?}; training from {:?}", store.root(), data_path);
        let recommender = Self::train(data_path, &ForestParams::default())?;
        recommender.persist(store)?;
        Ok(recommender)
    }

    pub fn load(store: &ModelStore) -> Result<Self> {
        let model: CropModel = store
            .load(CROP_MODEL_KEY)
            .context("Failed to load crop model")?;
        anyhow::ensure!(
            model.forest.n_classes() == model.labels.len(),
            "Crop model has {} classes but {} labels",
            model.forest.n_classes(),
            model.labels.len()
        );

        tracing::info!(
            "Loaded crop model from {:?} ({} crops, {} trees)",
            store.path_for(CROP_MODEL_KEY),
            model.labels.len(),
            model.forest.n_trees()
        );
        Ok(Self { model })
    }

    pub fn train(data_path: &Path, params: &ForestParams) -> Result<Self> {
        let set = load_crop_dataset(data_path)?;
        Self::fit(set, params)
    }

    /// Fit on an in-memory training set (80/20 split, accuracy logged)
    pub fn fit(set: CropTrainingSet, params: &ForestParams) -> Result<Self> {
        let labels = CategoricalEncoder::fit("crop", &set.labels);
        let targets = labels.encode_all(&set.labels)?;
        let dataset = LabelledSet::new(set.records, Array1::from(targets));

        let (train, test) = train_test_split(dataset, TEST_RATIO, SPLIT_SEED);
        tracing::info!(
            "Training crop model: {} train rows, {} test rows, {} crops",
            train.records.nrows(),
            test.records.nrows(),
            labels.len()
        );

        let forest = RandomForest::fit(&train, labels.len(), params)
            .context("Failed to train crop model")?;

        if let Some(report) = evaluate(&forest, &test)? {
            tracing::info!(
                "Crop model accuracy: {:.4} (precision {:.4}, recall {:.4}, {} held-out rows)",
                report.accuracy,
                report.precision,
                report.recall,
                report.test_samples
            );
        }

        Ok(Self {
            model: CropModel { forest, labels },
        })
    }

    pub fn persist(&self, store: &ModelStore) -> Result<()> {
        store.save(CROP_MODEL_KEY, &self.model)
    }

    /// Known crop labels, sorted
    pub fn crops(&self) -> &[String] {
        self.model.labels.classes()
    }

    pub fn recommend(&self, features: &CropFeatures) -> Result<CropRecommendation, RecommendError> {
        let record = features.to_record();
        let predicted = self.model.forest.predict(&record)?;
        let proba = self.model.forest.predict_proba(&record)?;
        let probabilities: Vec<f64> = proba.row(0).to_vec();

        let top_recommendation = self.model.labels.decode(predicted[0])?.to_string();

        let recommendations = rank_top(&probabilities, TOP_K)
            .into_iter()
            .map(|idx| {
                Ok(CropScore {
                    crop: self.model.labels.decode(idx)?.to_string(),
                    probability: probabilities[idx],
                })
            })
            .collect::<Result<Vec<_>, RecommendError>>()?;

        Ok(CropRecommendation {
            top_recommendation,
            recommendations,
        })
    }
}

/// Indices of the `k` largest probabilities, descending
///
/// Equal probabilities keep class-code order (stable sort).
pub fn rank_top(probabilities: &[f64], k: usize) -> Vec<usize> {
    let mut order: Vec<usize> = (0..probabilities.len()).collect();
    order.sort_by(|&a, &b| probabilities[b].total_cmp(&probabilities[a]));
    order.truncate(k);
    order
}
