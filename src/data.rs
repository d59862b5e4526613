//! Training Data Loading
//!
//! Reads the two labelled CSV datasets with Polars.
//!
//! Headers are matched after trimming whitespace and ignoring case, so the
//! public fertilizer dataset's `Humidity ` and `Temparature` spellings resolve.

use anyhow::{Context, Result};
use ndarray::Array2;
use polars::prelude::*;
use std::path::Path;

/// Crop dataset: 7 numeric features + crop label
pub const CROP_FEATURE_COLUMNS: [&str; 7] =
    ["N", "P", "K", "temperature", "humidity", "ph", "rainfall"];
pub const CROP_LABEL_COLUMN: &str = "label";

pub struct CropTrainingSet {
    /// Rows in `CROP_FEATURE_COLUMNS` order
    pub records: Array2<f64>,
    pub labels: Vec<String>,
}

impl CropTrainingSet {
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Fertilizer dataset, one vector per column
#[derive(Debug, Default)]
pub struct FertilizerTrainingSet {
    pub temperature: Vec<f64>,
    pub humidity: Vec<f64>,
    pub moisture: Vec<f64>,
    pub soil_type: Vec<String>,
    pub crop_type: Vec<String>,
    pub nitrogen: Vec<f64>,
    pub phosphorus: Vec<f64>,
    pub potassium: Vec<f64>,
    pub fertilizer: Vec<String>,
}

impl FertilizerTrainingSet {
    pub fn len(&self) -> usize {
        self.fertilizer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fertilizer.is_empty()
    }
}

pub fn load_crop_dataset(path: &Path) -> Result<CropTrainingSet> {
    let df = read_csv(path)?;

    let columns = CROP_FEATURE_COLUMNS
        .iter()
        .map(|name| numeric_column(&df, &[name]))
        .collect::<Result<Vec<_>>>()?;
    let labels = string_column(&df, &[CROP_LABEL_COLUMN])?;

    anyhow::ensure!(!labels.is_empty(), "Crop dataset {:?} has no rows", path);

    let records =
        Array2::from_shape_fn((labels.len(), columns.len()), |(row, col)| columns[col][row]);

    tracing::info!("Loaded crop dataset {:?}: {} rows", path, labels.len());
    Ok(CropTrainingSet { records, labels })
}

pub fn load_fertilizer_dataset(path: &Path) -> Result<FertilizerTrainingSet> {
    let df = read_csv(path)?;

    let set = FertilizerTrainingSet {
        temperature: numeric_column(&df, &["Temparature", "Temperature"])?,
        humidity: numeric_column(&df, &["Humidity"])?,
        moisture: numeric_column(&df, &["Moisture"])?,
        soil_type: string_column(&df, &["Soil Type"])?,
        crop_type: string_column(&df, &["Crop Type"])?,
        nitrogen: numeric_column(&df, &["Nitrogen"])?,
        phosphorus: numeric_column(&df, &["Phosphorous", "Phosphorus"])?,
        potassium: numeric_column(&df, &["Potassium"])?,
        fertilizer: string_column(&df, &["Fertilizer Name"])?,
    };

    anyhow::ensure!(!set.is_empty(), "Fertilizer dataset {:?} has no rows", path);

    tracing::info!("Loaded fertilizer dataset {:?}: {} rows", path, set.len());
    Ok(set)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .with_context(|| format!("Failed to create CSV reader: {:?}", path))?
        .finish()
        .with_context(|| format!("Failed to load CSV: {:?}", path))
}

/// Resolve the first alias present in `df` (trimmed, case-insensitive)
fn resolve_column(df: &DataFrame, aliases: &[&str]) -> Result<String> {
    let names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    aliases
        .iter()
        .find_map(|alias| {
            names
                .iter()
                .find(|name| name.trim().eq_ignore_ascii_case(alias))
                .cloned()
        })
        .ok_or_else(|| {
            anyhow::anyhow!(
                "Column '{}' not found (available: {})",
                aliases[0],
                names.join(", ")
            )
        })
}

fn numeric_column(df: &DataFrame, aliases: &[&str]) -> Result<Vec<f64>> {
    let name = resolve_column(df, aliases)?;
    let column = df
        .column(&name)?
        .cast(&DataType::Float64)
        .with_context(|| format!("Column '{}' is not numeric", name))?;
    let values = column
        .f64()
        .with_context(|| format!("Column '{}' is not numeric", name))?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if v.is_finite() => Ok(v),
            _ => anyhow::bail!("Column '{}' row {}: missing or non-numeric value", name, row + 1),
        })
        .collect()
}

fn string_column(df: &DataFrame, aliases: &[&str]) -> Result<Vec<String>> {
    let name = resolve_column(df, aliases)?;
    let column = df
        .column(&name)?
        .cast(&DataType::String)
        .with_context(|| format!("Column '{}' is not text", name))?;
    let values = column
        .str()
        .with_context(|| format!("Column '{}' is not text", name))?;

    values
        .into_iter()
        .enumerate()
        .map(|(row, value)| match value {
            Some(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
            _ => anyhow::bail!("Column '{}' row {}: missing value", name, row + 1),
        })
        .collect()
}
