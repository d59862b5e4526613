// Page handlers for HTML rendering with Askama

use askama::Template;
use axum::extract::State;
use axum::response::{Html, IntoResponse};

use crate::api_server::AppState;

// ============================================================================
// Home Page
// ============================================================================

#[derive(Template)]
#[template(path = "index.html")]
pub struct HomeTemplate {
    pub title: String,
    pub crops: Vec<String>,
    pub soil_types: Vec<String>,
    pub crop_types: Vec<String>,
}

pub async fn home_page(State(state): State<AppState>) -> impl IntoResponse {
    let template = HomeTemplate {
        title: "Crop & Fertilizer Advisor".to_string(),
        crops: state.crop.crops().to_vec(),
        soil_types: state.fertilizer.soil_types().to_vec(),
        crop_types: state.fertilizer.crop_types().to_vec(),
    };
    Html(template.render().unwrap_or_else(|e| {
        format!("Template error: {}", e)
    }))
}
