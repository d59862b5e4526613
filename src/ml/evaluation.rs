//! Held-out evaluation
//!
//! Training holds back 20% of the rows (seeded shuffle) and reports accuracy on
//! them. The report is logged only; it never reaches HTTP callers.

use super::forest::{LabelledSet, RandomForest};
use anyhow::Result;
use linfa::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const TEST_RATIO: f32 = 0.2;
pub const SPLIT_SEED: u64 = 42;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EvaluationReport {
    pub test_samples: usize,
    pub accuracy: f32,
    pub precision: f32,
    pub recall: f32,
}

/// Shuffle with a seeded RNG, then split into (train, test)
pub fn train_test_split(
    dataset: LabelledSet,
    test_ratio: f32,
    seed: u64,
) -> (LabelledSet, LabelledSet) {
    let mut rng = StdRng::seed_from_u64(seed);
    dataset.shuffle(&mut rng).split_with_ratio(1.0 - test_ratio)
}

/// Accuracy, precision and recall of `forest` on `test`; `None` when `test` is empty
pub fn evaluate(forest: &RandomForest, test: &LabelledSet) -> Result<Option<EvaluationReport>> {
    if test.nsamples() == 0 {
        return Ok(None);
    }

    let predicted = forest.predict(&test.records)?;
    let cm = predicted.confusion_matrix(test)?;

    let report = EvaluationReport {
        test_samples: test.nsamples(),
        accuracy: cm.accuracy(),
        precision: cm.precision(),
        recall: cm.recall(),
    };
    tracing::debug!("Confusion matrix:\n{:?}", cm);

    Ok(Some(report))
}
