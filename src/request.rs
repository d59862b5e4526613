//! Request Parsing
//!
//! Turns raw JSON request bodies into feature vectors. Numeric fields accept
//! JSON numbers or strings holding a number (browser forms post strings).
//! Any missing field, malformed body or non-numeric value is `InvalidInput`.

use crate::crop::CropFeatures;
use crate::error::RecommendError;
use crate::fertilizer::FertilizerFeatures;
use serde_json::{Map, Value};

type Object = Map<String, Value>;

pub fn parse_crop_request(body: &[u8]) -> Result<CropFeatures, RecommendError> {
    let object = parse_object(body)?;
    Ok(CropFeatures {
        nitrogen: number_field(&object, "N")?,
        phosphorus: number_field(&object, "P")?,
        potassium: number_field(&object, "K")?,
        temperature: number_field(&object, "temperature")?,
        humidity: number_field(&object, "humidity")?,
        ph: number_field(&object, "ph")?,
        rainfall: number_field(&object, "rainfall")?,
    })
}

pub fn parse_fertilizer_request(body: &[u8]) -> Result<FertilizerFeatures, RecommendError> {
    let object = parse_object(body)?;
    Ok(FertilizerFeatures {
        temperature: number_field(&object, "temperature")?,
        humidity: number_field(&object, "humidity")?,
        moisture: number_field(&object, "moisture")?,
        soil_type: text_field(&object, "soil_type")?,
        crop_type: text_field(&object, "crop_type")?,
        nitrogen: number_field(&object, "N")?,
        phosphorus: number_field(&object, "P")?,
        potassium: number_field(&object, "K")?,
    })
}

fn parse_object(body: &[u8]) -> Result<Object, RecommendError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| RecommendError::invalid_input(format!("invalid JSON body: {}", e)))?;
    match value {
        Value::Object(object) => Ok(object),
        _ => Err(RecommendError::invalid_input("request body must be a JSON object")),
    }
}

fn field<'a>(object: &'a Object, name: &str) -> Result<&'a Value, RecommendError> {
    match object.get(name) {
        Some(Value::Null) | None => Err(RecommendError::invalid_input(format!(
            "missing required field '{}'",
            name
        ))),
        Some(value) => Ok(value),
    }
}

fn number_field(object: &Object, name: &str) -> Result<f64, RecommendError> {
    let parsed = match field(object, name)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(v) if v.is_finite() => Ok(v),
        _ => Err(RecommendError::invalid_input(format!(
            "field '{}' must be a finite number",
            name
        ))),
    }
}

fn text_field(object: &Object, name: &str) -> Result<String, RecommendError> {
    match field(object, name)? {
        Value::String(s) => Ok(s.clone()),
        _ => Err(RecommendError::invalid_input(format!(
            "field '{}' must be a string",
            name
        ))),
    }
}
