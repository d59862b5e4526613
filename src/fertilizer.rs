//! Fertilizer Recommender
//!
//! Predicts a fertilizer from environment, soil/crop type and nutrient readings,
//! and flags nutrient deficiencies against fixed thresholds.
//!
//! Persisted artifacts form a set: the forest plus three encoders
//! (soil type, crop type, fertilizer name). All four must be present to reuse it.

use crate::data::{load_fertilizer_dataset, FertilizerTrainingSet};
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

pub const FERTILIZER_MODEL_KEY: &str = "fertilizer_model";
pub const SOIL_ENCODER_KEY: &str = "le_soil";
pub const CROP_ENCODER_KEY: &str = "le_crop";
pub const FERTILIZER_ENCODER_KEY: &str = "le_fertilizer";

/// Deficient when strictly below
pub const NITROGEN_THRESHOLD: f64 = 20.0;
pub const PHOSPHORUS_THRESHOLD: f64 = 10.0;
pub const POTASSIUM_THRESHOLD: f64 = 15.0;

pub const NITROGEN_DEFICIENCY: &str = "Nitrogen (N)";
pub const PHOSPHORUS_DEFICIENCY: &str = "Phosphorus (P)";
pub const POTASSIUM_DEFICIENCY: &str = "Potassium (K)";

const N_FEATURES: usize = 8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerFeatures {
    pub temperature: f64,
    pub humidity: f64,
    pub moisture: f64,
    pub soil_type: String,
    pub crop_type: String,
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoilStatus {
    Good,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilHealth {
    #[serde(rename = "N")]
    pub nitrogen: f64,
    #[serde(rename = "P")]
    pub phosphorus: f64,
    #[serde(rename = "K")]
    pub potassium: f64,
    pub status: SoilStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FertilizerRecommendation {
    pub fertilizer: String,
    pub deficiencies: Vec<String>,
    pub soil_health: SoilHealth,
}

/// Deficient nutrients, always in N, P, K order
pub fn nutrient_deficiencies(nitrogen: f64, phosphorus: f64, potassium: f64) -> Vec<String> {
    [
        (nitrogen < NITROGEN_THRESHOLD, NITROGEN_DEFICIENCY),
        (phosphorus < PHOSPHORUS_THRESHOLD, PHOSPHORUS_DEFICIENCY),
        (potassium < POTASSIUM_THRESHOLD, POTASSIUM_DEFICIENCY),
    ]
    .into_iter()
    .filter(|(deficient, _)| *deficient)
    .map(|(_, label)| label.to_string())
    .collect()
}

pub fn soil_health(
    nitrogen: f64,
    phosphorus: f64,
    potassium: f64,
    deficiencies: &[String],
) -> SoilHealth {
    SoilHealth {
        nitrogen,
        phosphorus,
        potassium,
        status: if deficiencies.is_empty() {
            SoilStatus::Good
        } else {
            SoilStatus::NeedsImprovement
        },
    }
}

#[derive(Debug)]
pub struct FertilizerRecommender {
    forest: RandomForest,
    soil_encoder: CategoricalEncoder,
    crop_encoder: CategoricalEncoder,
    fertilizer_encoder: CategoricalEncoder,
}

impl FertilizerRecommender {
    /// Load the persisted artifact set, or train from `data_path` and persist it
    pub fn open(store: &ModelStore, data_path: &Path) -> Result<Self> {
        if store.exists(FERTILIZER_MODEL_KEY) {
            return Self::load(store);
        }

        tracing::info!("No fertilizer model in {:?}; training from {:?}", store.root(), data_path);
        let recommender = Self::train(data_path, &ForestParams::default())?;
        recommender.persist(store)?;
        Ok(recommender)
    }

    pub fn load(store: &ModelStore) -> Result<Self> {
        for key in [SOIL_ENCODER_KEY, CROP_ENCODER_KEY, FERTILIZER_ENCODER_KEY] {
            anyhow::ensure!(
                store.exists(key),
                "Fertilizer model exists but artifact '{}' is missing ({:?})",
                key,
                store.path_for(key)
            );
        }

        let forest: RandomForest = store
            .load(FERTILIZER_MODEL_KEY)
            .context("Failed to load fertilizer model")?;
        let soil_encoder: CategoricalEncoder = store.load(SOIL_ENCODER_KEY)?;
        let crop_encoder: CategoricalEncoder = store.load(CROP_ENCODER_KEY)?;
        let fertilizer_encoder: CategoricalEncoder = store.load(FERTILIZER_ENCODER_KEY)?;

        anyhow::ensure!(
            forest.n_features() == N_FEATURES,
            "Fertilizer model expects {} features, not {}",
            forest.n_features(),
            N_FEATURES
        );
        anyhow::ensure!(
            forest.n_classes() == fertilizer_encoder.len(),
            "Fertilizer model has {} classes but {} fertilizer names",
            forest.n_classes(),
            fertilizer_encoder.len()
        );

        tracing::info!(
            "Loaded fertilizer model from {:?} ({} fertilizers, {} soil types, {} crop types)",
            store.path_for(FERTILIZER_MODEL_KEY),
            fertilizer_encoder.len(),
            soil_encoder.len(),
            crop_encoder.len()
        );

        Ok(Self {
            forest,
            soil_encoder,
            crop_encoder,
            fertilizer_encoder,
        })
    }

    pub fn train(data_path: &Path, params: &ForestParams) -> Result<Self> {
        let set = load_fertilizer_dataset(data_path)?;
        Self::fit(set, params)
    }

    /// Fit encoders and forest on an in-memory training set
    pub fn fit(set: FertilizerTrainingSet, params: &ForestParams) -> Result<Self> {
        let soil_encoder = CategoricalEncoder::fit("soil_type", &set.soil_type);
        let crop_encoder = CategoricalEncoder::fit("crop_type", &set.crop_type);
        let fertilizer_encoder = CategoricalEncoder::fit("fertilizer", &set.fertilizer);

        let soil_codes = soil_encoder.encode_all(&set.soil_type)?;
        let crop_codes = crop_encoder.encode_all(&set.crop_type)?;
        let targets = fertilizer_encoder.encode_all(&set.fertilizer)?;

        // Same column order as inference
        let columns: [Vec<f64>; N_FEATURES] = [
            set.temperature,
            set.humidity,
            set.moisture,
            soil_codes.iter().map(|&c| c as f64).collect(),
            crop_codes.iter().map(|&c| c as f64).collect(),
            set.nitrogen,
            set.phosphorus,
            set.potassium,
        ];
        let n_rows = targets.len();
        for (idx, column) in columns.iter().enumerate() {
            anyhow::ensure!(
                column.len() == n_rows,
                "Fertilizer column {} has {} rows, expected {}",
                idx,
                column.len(),
                n_rows
            );
        }

        let records = Array2::from_shape_fn((n_rows, N_FEATURES), |(row, col)| columns[col][row]);
        let dataset = LabelledSet::new(records, Array1::from(targets));

        let (train, test) = train_test_split(dataset, TEST_RATIO, SPLIT_SEED);
        tracing::info!(
            "Training fertilizer model: {} train rows, {} test rows, {} fertilizers",
            train.records.nrows(),
            test.records.nrows(),
            fertilizer_encoder.len()
        );

        let forest = RandomForest::fit(&train, fertilizer_encoder.len(), params)
            .context("Failed to train fertilizer model")?;

        if let Some(report) = evaluate(&forest, &test)? {
            tracing::info!(
                "Fertilizer model accuracy: {:.4} (precision {:.4}, recall {:.4}, {} held-out rows)",
                report.accuracy,
                report.precision,
                report.recall,
                report.test_samples
            );
        }

        Ok(Self {
            forest,
            soil_encoder,
            crop_encoder,
            fertilizer_encoder,
        })
    }

    pub fn persist(&self, store: &ModelStore) -> Result<()> {
        // Encoders first: the model file marks the set as complete
        store.save(SOIL_ENCODER_KEY, &self.soil_encoder)?;
        store.save(CROP_ENCODER_KEY, &self.crop_encoder)?;
        store.save(FERTILIZER_ENCODER_KEY, &self.fertilizer_encoder)?;
        store.save(FERTILIZER_MODEL_KEY, &self.forest)
    }

    pub fn soil_types(&self) -> &[String] {
        self.soil_encoder.classes()
    }

    pub fn crop_types(&self) -> &[String] {
        self.crop_encoder.classes()
    }

    pub fn fertilizers(&self) -> &[String] {
        self.fertilizer_encoder.classes()
    }

    pub fn recommend(
        &self,
        features: &FertilizerFeatures,
    ) -> Result<FertilizerRecommendation, RecommendError> {
        let soil_code = self.soil_encoder.encode(&features.soil_type)?;
        let crop_code = self.crop_encoder.encode(&features.crop_type)?;

        let values = [
            features.temperature,
            features.humidity,
            features.moisture,
            soil_code as f64,
            crop_code as f64,
            features.nitrogen,
            features.phosphorus,
            features.potassium,
        ];
        let record = Array2::from_shape_fn((1, N_FEATURES), |(_, col)| values[col]);

        let predicted = self.forest.predict(&record)?;
        let fertilizer = self.fertilizer_encoder.decode(predicted[0])?.to_string();

        let (n, p, k) = (features.nitrogen, features.phosphorus, features.potassium);
        let deficiencies = nutrient_deficiencies(n, p, k);
        let soil_health = soil_health(n, p, k, &deficiencies);

        Ok(FertilizerRecommendation {
            fertilizer,
            deficiencies,
            soil_health,
        })
    }
}
