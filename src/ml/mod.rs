//! Classification building blocks
//!
//! - `encoder`: string category <-> integer code mapping
//! - `forest`: bagged ensemble of linfa decision trees over random feature
//!   subsets, with class probabilities
//! - `evaluation`: seeded train/test split and held-out accuracy

pub mod encoder;
pub mod evaluation;
pub mod forest;

pub use encoder::CategoricalEncoder;
pub use evaluation::{evaluate, train_test_split, EvaluationReport, SPLIT_SEED, TEST_RATIO};
pub use forest::{ForestParams, LabelledSet, MaxFeatures, RandomForest};
