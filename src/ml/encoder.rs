//! Categorical Encoder
//!
//! Maps the distinct string values of a column to integer codes. Classes are
//! stored sorted, so a value's code is its position in the sorted vocabulary.
//! The vocabulary is fixed at fit time; unseen values are rejected.

use crate::error::RecommendError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoricalEncoder {
    field: String,
    classes: Vec<String>,
}

impl CategoricalEncoder {
    /// Learn the vocabulary of `field` from `values`
    pub fn fit<I, S>(field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let classes: BTreeSet<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();

        Self {
            field: field.to_string(),
            classes: classes.into_iter().collect(),
        }
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn encode(&self, value: &str) -> Result<usize, RecommendError> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(value))
            .map_err(|_| RecommendError::UnknownCategory {
                field: self.field.clone(),
                value: value.to_string(),
                known: self.classes.clone(),
            })
    }

    /// Encode a whole column, failing on the first unseen value
    pub fn encode_all<I, S>(&self, values: I) -> Result<Vec<usize>, RecommendError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        values.into_iter().map(|v| self.encode(v.as_ref())).collect()
    }

    pub fn decode(&self, code: usize) -> Result<&str, RecommendError> {
        self.classes.get(code).map(|s| s.as_str()).ok_or_else(|| {
            RecommendError::Internal(anyhow::anyhow!(
                "code {} out of range for {} encoder ({} classes)",
                code,
                self.field,
                self.classes.len()
            ))
        })
    }
}
