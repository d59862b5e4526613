//! Crop & Fertilizer Advisor
//!
//! Recommendation service over two stock classifiers:
//! - `crop`: soil + weather readings -> ranked crop suggestions
//! - `fertilizer`: environment, soil/crop type, nutrients -> fertilizer + deficiency report
//!
//! Module layout:
//! - `ml/`: categorical encoder, bagged decision-tree forest, held-out evaluation
//! - `data`: CSV training sets loaded with Polars
//! - `model_store`: persisted artifacts (train once, reuse across restarts)
//! - `api_server` / `web/`: Axum endpoints and the HTML front page (feature `api`)

pub mod config;
pub mod crop;
pub mod data;
pub mod error;
pub mod fertilizer;
pub mod ml;
pub mod model_store;
pub mod request;

#[cfg(feature = "api")]
pub mod api_server;
#[cfg(feature = "api")]
pub mod web;

// Re-export commonly used types
pub use config::{ErrorMode, ServerConfig};
pub use crop::{CropFeatures, CropRecommendation, CropRecommender, CropScore};
pub use error::RecommendError;
pub use fertilizer::{
    FertilizerFeatures, FertilizerRecommendation, FertilizerRecommender, SoilHealth, SoilStatus,
};
pub use model_store::ModelStore;

#[cfg(feature = "api")]
pub use api_server::{create_router, AppState};
