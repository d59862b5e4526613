//! Random Forest - bagged ensemble of linfa decision trees
//!
//! Each tree is a stock `linfa_trees::DecisionTree` fitted on a bootstrap
//! resample of the training set, restricted to a random subset of the feature
//! columns (`MaxFeatures`). Row resamples and column subsets come from a
//! `StdRng` seeded with `ForestParams::seed`, so identical inputs always
//! produce the identical forest.
//!
//! Column subsets are drawn once per tree, not once per split: linfa's trees
//! have no per-split feature sampling.
//!
//! Class probabilities are the share of trees voting for each class; every row
//! of `predict_proba` sums to 1.

use crate::error::RecommendError;
use anyhow::{Context, Result};
use linfa::prelude::*;
use linfa::DatasetBase;
use linfa_trees::DecisionTree;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Feature matrix with one class code per row
pub type LabelledSet = DatasetBase<Array2<f64>, Array1<usize>>;

/// How many feature columns each tree sees
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxFeatures {
    /// ceil(sqrt(n_features))
    Sqrt,
    All,
}

impl MaxFeatures {
    pub fn subset_size(self, n_features: usize) -> usize {
        match self {
            MaxFeatures::Sqrt => {
                ((n_features as f64).sqrt().ceil() as usize).clamp(1, n_features.max(1))
            }
            MaxFeatures::All => n_features,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForestParams {
    pub n_trees: usize,
    pub seed: u64,
    pub max_features: MaxFeatures,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            seed: 42,
            max_features: MaxFeatures::Sqrt,
        }
    }
}

/// One tree and the (sorted) feature columns it was fitted on
#[derive(Debug, Serialize, Deserialize)]
struct Member {
    features: Vec<usize>,
    tree: DecisionTree<f64, usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RandomForest {
    members: Vec<Member>,
    n_classes: usize,
    n_features: usize,
}

impl RandomForest {
    /// Fit `params.n_trees` trees on bootstrap resamples of `dataset`
    ///
    /// Targets must be class codes in `0..n_classes`.
    pub fn fit(dataset: &LabelledSet, n_classes: usize, params: &ForestParams) -> Result<Self> {
        let n_samples = dataset.nsamples();
        let n_features = dataset.nfeatures();

        anyhow::ensure!(params.n_trees > 0, "Forest needs at least one tree");
        anyhow::ensure!(n_samples > 0, "Cannot fit a forest on an empty training set");
        anyhow::ensure!(n_features > 0, "Cannot fit a forest without feature columns");
        anyhow::ensure!(n_classes > 0, "Cannot fit a forest without classes");
        if let Some(&bad) = dataset.targets.iter().find(|&&t| t >= n_classes) {
            anyhow::bail!("Target code {} out of range for {} classes", bad, n_classes);
        }

        let subset_size = params.max_features.subset_size(n_features);
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut members = Vec::with_capacity(params.n_trees);

        for tree_idx in 0..params.n_trees {
            let features: Vec<usize> = if subset_size < n_features {
                let mut sampled =
                    rand::seq::index::sample(&mut rng, n_features, subset_size).into_vec();
                sampled.sort_unstable();
                sampled
            } else {
                (0..n_features).collect()
            };
            let indices: Vec<usize> = (0..n_samples).map(|_| rng.gen_range(0..n_samples)).collect();
            let resample = LabelledSet::new(
                dataset
                    .records
                    .select(Axis(0), &indices)
                    .select(Axis(1), &features),
                dataset.targets.select(Axis(0), &indices),
            );

            let tree = DecisionTree::<f64, usize>::params()
                .fit(&resample)
                .map_err(|e| anyhow::anyhow!("{}", e))
                .with_context(|| format!("Failed to fit tree {}", tree_idx))?;
            members.push(Member { features, tree });
        }

        tracing::debug!(
            "Fitted forest: {} trees, {} samples, {} of {} features per tree, {} classes",
            members.len(),
            n_samples,
            subset_size,
            n_features,
            n_classes
        );

        Ok(Self {
            members,
            n_classes,
            n_features,
        })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.members.len()
    }

    /// Per-row class distribution (rows x n_classes)
    pub fn predict_proba(&self, records: &Array2<f64>) -> Result<Array2<f64>, RecommendError> {
        self.check_records(records)?;

        let mut votes = Array2::<f64>::zeros((records.nrows(), self.n_classes));
        for member in &self.members {
            let columns = records.select(Axis(1), &member.features);
            let predicted: Array1<usize> = member.tree.predict(&columns);
            for (row, &class) in predicted.iter().enumerate() {
                if class < self.n_classes {
                    votes[[row, class]] += 1.0;
                }
            }
        }

        let n_trees = self.members.len() as f64;
        votes.mapv_inplace(|v| v / n_trees);
        Ok(votes)
    }

    /// Most probable class per row; ties resolve to the lowest class code
    pub fn predict(&self, records: &Array2<f64>) -> Result<Array1<usize>, RecommendError> {
        let proba = self.predict_proba(records)?;
        Ok(proba.rows().into_iter().map(argmax).collect())
    }

    fn check_records(&self, records: &Array2<f64>) -> Result<(), RecommendError> {
        if self.members.is_empty() {
            return Err(anyhow::anyhow!("Forest has no trees").into());
        }
        if let Some(member) = self
            .members
            .iter()
            .find(|m| m.features.iter().any(|&col| col >= self.n_features))
        {
            return Err(anyhow::anyhow!(
                "Tree feature columns {:?} exceed {} features",
                member.features,
                self.n_features
            )
            .into());
        }
        if records.ncols() != self.n_features {
            return Err(anyhow::anyhow!(
                "Expected {} features per row, got {}",
                self.n_features,
                records.ncols()
            )
            .into());
        }
        if records.iter().any(|v| !v.is_finite()) {
            return Err(RecommendError::invalid_input("feature values must be finite numbers"));
        }
        Ok(())
    }
}

/// Index of the first maximum
pub fn argmax(row: ArrayView1<f64>) -> usize {
    let mut best = 0;
    for (idx, &value) in row.iter().enumerate() {
        if value > row[best] {
            best = idx;
        }
    }
    best
}
