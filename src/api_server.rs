// Axum API Server Module
//
// Purpose: JSON endpoints over the crop and fertilizer recommenders.
// Both recommenders are opened once at startup and shared read-only.

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::ServeDir,
    trace::TraceLayer,
};

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ErrorMode, ServerConfig};
use crate::crop::{CropRecommendation, CropRecommender};
use crate::error::RecommendError;
use crate::fertilizer::{FertilizerRecommendation, FertilizerRecommender};
use crate::model_store::ModelStore;
use crate::request::{parse_crop_request, parse_fertilizer_request};
use crate::web::handlers::pages::home_page;

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub crop: Arc<CropRecommender>,
    pub fertilizer: Arc<FertilizerRecommender>,
    pub error_mode: ErrorMode,
    pub static_dir: PathBuf,
}

impl AppState {
    /// Open (load or train) both recommenders
    ///
    /// Blocking: training may take seconds. Call from `spawn_blocking`.
    pub fn new(config: &ServerConfig) -> anyhow::Result<Self> {
        tracing::info!("Opening model store {:?}...", config.model_dir);
        let store = ModelStore::new(&config.model_dir)?;

        tracing::info!("Initializing crop recommender...");
        let crop = CropRecommender::open(&store, &config.crop_dataset())?;

        tracing::info!("Initializing fertilizer recommender...");
        let fertilizer = FertilizerRecommender::open(&store, &config.fertilizer_dataset())?;

        Ok(Self::from_parts(crop, fertilizer, config.error_mode, config.static_dir.clone()))
    }

    pub fn from_parts(
        crop: CropRecommender,
        fertilizer: FertilizerRecommender,
        error_mode: ErrorMode,
        static_dir: PathBuf,
    ) -> Self {
        Self {
            crop: Arc::new(crop),
            fertilizer: Arc::new(fertilizer),
            error_mode,
            static_dir,
        }
    }

    fn error(&self, err: RecommendError) -> AppError {
        AppError::from_recommend(err, self.error_mode)
    }

    /// Body extractor failures (e.g. over the size limit) get the same JSON error shape
    fn body(&self, body: Result<Bytes, BytesRejection>) -> Result<Bytes, AppError> {
        body.map_err(|rejection| {
            self.error(RecommendError::invalid_input(format!(
                "unreadable request body: {}",
                rejection.body_text()
            )))
        })
    }
}

// ============================================================================
// Router
// ============================================================================

pub fn create_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.static_dir);

    Router::new()
        // Home page (HTML)
        .route("/", get(home_page))

        // Health check
        .route("/health", get(health_check))

        // Recommendation endpoints (JSON)
        .route("/recommend_crop", post(recommend_crop))
        .route("/recommend_fertilizer", post(recommend_fertilizer))

        // Known categories for form building
        .route("/api/vocabulary", get(get_vocabulary))

        .nest_service("/static", static_files)

        // Middleware (applied in reverse order)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Endpoint Handlers
// ============================================================================

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn recommend_crop(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<CropRecommendation>, AppError> {
    let body = state.body(body)?;
    let features = parse_crop_request(&body).map_err(|e| state.error(e))?;
    tracing::debug!("Crop request: {:?}", features);

    // CPU-bound work: run in blocking thread pool
    let recommender = state.crop.clone();
    let result = tokio::task::spawn_blocking(move || recommender.recommend(&features))
        .await
        .map_err(|e| state.error(anyhow::anyhow!("Task join error: {}", e).into()))?
        .map_err(|e| state.error(e))?;

    tracing::info!("Recommended crop '{}'", result.top_recommendation);
    Ok(Json(result))
}

async fn recommend_fertilizer(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<FertilizerRecommendation>, AppError> {
    let body = state.body(body)?;
    let features = parse_fertilizer_request(&body).map_err(|e| state.error(e))?;
    tracing::debug!("Fertilizer request: {:?}", features);

    let recommender = state.fertilizer.clone();
    let result = tokio::task::spawn_blocking(move || recommender.recommend(&features))
        .await
        .map_err(|e| state.error(anyhow::anyhow!("Task join error: {}", e).into()))?
        .map_err(|e| state.error(e))?;

    tracing::info!(
        "Recommended fertilizer '{}' ({} deficiencies)",
        result.fertilizer,
        result.deficiencies.len()
    );
    Ok(Json(result))
}

async fn get_vocabulary(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "crops": state.crop.crops(),
        "soil_types": state.fertilizer.soil_types(),
        "crop_types": state.fertilizer.crop_types(),
        "fertilizers": state.fertilizer.fertilizers(),
    }))
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Internal(String),
}

impl AppError {
    /// Input errors are always 400; internal failures follow `mode`
    pub fn from_recommend(err: RecommendError, mode: ErrorMode) -> Self {
        let client = err.is_client_error();
        let message = err.to_string();

        if client {
            tracing::warn!("Rejected request: {}", message);
            return AppError::BadRequest(message);
        }

        tracing::error!("Recommendation failed: {:#}", err);
        match mode {
            ErrorMode::Compat => AppError::BadRequest(message),
            ErrorMode::Strict => AppError::Internal(message),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        let body = Json(serde_json::json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
