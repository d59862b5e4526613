// API Integration Tests
//
// Purpose: Drive every endpoint through the router with models trained on
// small synthetic datasets.
// Run with: cargo test --test api_integration_tests

#[cfg(feature = "api")]
mod api_tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use crop_advisor::{create_router, AppState, ErrorMode, ServerConfig};
    use serde_json::{json, Value};
    use std::fs;
    use tempfile::TempDir;
    use tower::ServiceExt; // for oneshot

    // =========================================================================
    // Fixtures
    // =========================================================================

    fn crop_csv() -> String {
        let profiles = [
            ("rice", [80.0, 45.0, 40.0, 24.0, 82.0, 6.4, 230.0]),
            ("chickpea", [40.0, 67.0, 80.0, 18.0, 16.0, 7.3, 80.0]),
            ("coffee", [100.0, 28.0, 30.0, 25.0, 58.0, 6.8, 158.0]),
            ("mango", [20.0, 27.0, 30.0, 31.0, 50.0, 5.8, 95.0]),
        ];

        let mut csv = String::from("N,P,K,temperature,humidity,ph,rainfall,label\n");
        for i in 0..20 {
            let jitter = ((i % 7) as f64 - 3.0) * 0.5;
            for (label, profile) in &profiles {
                let values: Vec<String> = profile
                    .iter()
                    .map(|v| format!("{:.2}", v + jitter))
                    .collect();
                csv.push_str(&format!("{},{}\n", values.join(","), label));
            }
        }
        csv
    }

    fn fertilizer_csv() -> String {
        let soils = ["Sandy", "Loamy", "Clayey"];
        let crops = ["Maize", "Wheat", "Paddy"];

        let mut csv = String::from(
            "Temparature,Humidity ,Moisture,Soil Type,Crop Type,Nitrogen,Potassium,Phosphorous,Fertilizer Name\n",
        );
        for i in 0..30 {
            let (n, p, k, fertilizer) = match i % 3 {
                0 => (8 + i % 5, 30, 20, "Urea"),
                1 => (35, 4 + i % 4, 20, "DAP"),
                _ => (35, 35, 14 + i % 3, "14-35-14"),
            };
            csv.push_str(&format!(
                "{},{},{},{},{},{},{},{},{}\n",
                26 + i % 4,
                52 + i % 6,
                38 + i % 7,
                soils[(i / 2) % 3],
                crops[(i / 3) % 3],
                n,
                k,
                p,
                fertilizer
            ));
        }
        csv
    }

    struct TestEnv {
        dir: TempDir,
        config: ServerConfig,
    }

    fn test_env(error_mode: ErrorMode) -> TestEnv {
        let dir = TempDir::new().expect("temp dir");
        let data_dir = dir.path().join("data");
        let static_dir = dir.path().join("static");
        fs::create_dir_all(&data_dir).unwrap();
        fs::create_dir_all(static_dir.join("js")).unwrap();
        fs::write(data_dir.join("crop_recommendation.csv"), crop_csv()).unwrap();
        fs::write(data_dir.join("fertilizer_recommendation.csv"), fertilizer_csv()).unwrap();
        fs::write(static_dir.join("js").join("app.js"), "console.log('ok');").unwrap();

        let config = ServerConfig {
            data_dir,
            model_dir: dir.path().join("models"),
            static_dir,
            error_mode,
            ..ServerConfig::default()
        };
        TestEnv { dir, config }
    }

    // Helper: Create test app (trains both models into a fresh store)
    fn create_test_app() -> (TestEnv, axum::Router) {
        let env = test_env(ErrorMode::Compat);
        let state = AppState::new(&env.config).expect("app state");
        let app = create_router(state);
        (env, app)
    }

    // Helper: Parse JSON response
    async fn json_response(response: axum::response::Response) -> Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        serde_json::from_slice(&body).expect("Failed to parse JSON")
    }

    async fn post(app: &axum::Router, uri: &str, body: String) -> axum::response::Response {
        app.clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    async fn get(app: &axum::Router, uri: &str) -> axum::response::Response {
        app.clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    fn rice_request() -> Value {
        json!({
            "N": 81, "P": 44, "K": 41,
            "temperature": 24.5, "humidity": 81, "ph": 6.5, "rainfall": 228
        })
    }

    fn fertilizer_request(soil: &str, n: f64, p: f64, k: f64) -> Value {
        json!({
            "temperature": 27, "humidity": 54, "moisture": 40,
            "soil_type": soil, "crop_type": "Maize",
            "N": n, "P": p, "K": k
        })
    }

    // =========================================================================
    // Section 1: Health Check
    // =========================================================================

    #[tokio::test]
    async fn test_health_check() {
        let (_env, app) = create_test_app();

        let response = get(&app, "/health").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        assert_eq!(body["status"], "healthy");
        assert!(body["timestamp"].is_string());
    }

    // =========================================================================
    // Section 2: Crop Recommendation
    // =========================================================================

    #[tokio::test]
    async fn test_recommend_crop_ranked_top_three() {
        let (_env, app) = create_test_app();

        let response = post(&app, "/recommend_crop", rice_request().to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        let recommendations = body["recommendations"].as_array().unwrap();
        assert_eq!(recommendations.len(), 3);
        assert_eq!(body["top_recommendation"], "rice");
        assert_eq!(recommendations[0]["crop"], body["top_recommendation"]);

        let probabilities: Vec<f64> = recommendations
            .iter()
            .map(|r| r["probability"].as_f64().unwrap())
            .collect();
        assert!(probabilities.iter().all(|&p| (0.0..=1.0).contains(&p)));
        assert!(
            probabilities.windows(2).all(|w| w[0] >= w[1]),
            "Results should be sorted by probability"
        );
        assert!(probabilities.iter().sum::<f64>() <= 1.0 + 1e-9);
    }

    #[tokio::test]
    async fn test_recommend_crop_accepts_numeric_strings() {
        let (_env, app) = create_test_app();

        // Shape posted by the browser form
        let body = json!({
            "N": "81", "P": "44", "K": "41",
            "temperature": "24.5", "humidity": "81", "ph": "6.5", "rainfall": "228"
        });
        let response = post(&app, "/recommend_crop", body.to_string()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        assert_eq!(body["top_recommendation"], "rice");
    }

    #[tokio::test]
    async fn test_recommend_crop_is_idempotent() {
        let (_env, app) = create_test_app();

        let first = post(&app, "/recommend_crop", rice_request().to_string()).await;
        let first = axum::body::to_bytes(first.into_body(), usize::MAX).await.unwrap();
        let second = post(&app, "/recommend_crop", rice_request().to_string()).await;
        let second = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_recommend_crop_missing_field_is_400() {
        let (_env, app) = create_test_app();

        let mut request = rice_request();
        request.as_object_mut().unwrap().remove("N");

        let response = post(&app, "/recommend_crop", request.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = json_response(response).await;
        assert!(body["error"].as_str().unwrap().contains("'N'"));
    }

    #[tokio::test]
    async fn test_recommend_crop_non_numeric_is_400() {
        let (_env, app) = create_test_app();

        let mut request = rice_request();
        request["ph"] = json!("acidic");

        let response = post(&app, "/recommend_crop", request.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = json_response(response).await;
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recommend_crop_malformed_json_is_400() {
        let (_env, app) = create_test_app();

        let response = post(&app, "/recommend_crop", "{\"N\": 12,".to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = json_response(response).await;
        assert!(body["error"].is_string());
    }

    // =========================================================================
    // Section 3: Fertilizer Recommendation
    // =========================================================================

    #[tokio::test]
    async fn test_recommend_fertilizer_nitrogen_deficiency() {
        let (_env, app) = create_test_app();

        let response = post(
            &app,
            "/recommend_fertilizer",
            fertilizer_request("Sandy", 15.0, 20.0, 20.0).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        assert_eq!(body["deficiencies"], json!(["Nitrogen (N)"]));
        assert_eq!(body["soil_health"]["status"], "Needs Improvement");
        assert_eq!(body["soil_health"]["N"], 15.0);
        assert_eq!(body["soil_health"]["P"], 20.0);
        assert_eq!(body["soil_health"]["K"], 20.0);

        let fertilizer = body["fertilizer"].as_str().unwrap();
        assert!(["Urea", "DAP", "14-35-14"].contains(&fertilizer));
    }

    #[tokio::test]
    async fn test_recommend_fertilizer_good_soil() {
        let (_env, app) = create_test_app();

        let response = post(
            &app,
            "/recommend_fertilizer",
            fertilizer_request("Loamy", 25.0, 15.0, 20.0).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        assert_eq!(body["deficiencies"], json!([]));
        assert_eq!(body["soil_health"]["status"], "Good");
    }

    #[tokio::test]
    async fn test_recommend_fertilizer_unknown_soil_is_400() {
        let (_env, app) = create_test_app();

        let response = post(
            &app,
            "/recommend_fertilizer",
            fertilizer_request("Volcanic", 25.0, 15.0, 20.0).to_string(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = json_response(response).await;
        let error = body["error"].as_str().unwrap();
        assert!(error.contains("Volcanic"));
        assert!(body.get("fertilizer").is_none());
    }

    #[tokio::test]
    async fn test_recommend_fertilizer_missing_field_is_400() {
        let (_env, app) = create_test_app();

        let mut request = fertilizer_request("Sandy", 25.0, 15.0, 20.0);
        request.as_object_mut().unwrap().remove("N");

        let response = post(&app, "/recommend_fertilizer", request.to_string()).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body: Value = json_response(response).await;
        assert!(!body["error"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_recommend_fertilizer_is_idempotent() {
        let (_env, app) = create_test_app();
        let request = fertilizer_request("Clayey", 12.0, 30.0, 20.0).to_string();

        let first = post(&app, "/recommend_fertilizer", request.clone()).await;
        assert_eq!(first.status(), StatusCode::OK);
        let first = axum::body::to_bytes(first.into_body(), usize::MAX).await.unwrap();
        let second = post(&app, "/recommend_fertilizer", request).await;
        let second = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_oversized_body_is_json_400() {
        let (_env, app) = create_test_app();

        // Over the 2 MB default body limit
        let padding = "x".repeat(3 * 1024 * 1024);
        let body = json!({ "padding": padding }).to_string();

        for uri in ["/recommend_crop", "/recommend_fertilizer"] {
            let response = post(&app, uri, body.clone()).await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);

            let body: Value = json_response(response).await;
            let error = body["error"].as_str().unwrap();
            assert!(error.starts_with("unreadable request body"), "{}", error);
        }
    }

    // =========================================================================
    // Section 4: Vocabulary, Home Page, Static Files
    // =========================================================================

    #[tokio::test]
    async fn test_vocabulary() {
        let (_env, app) = create_test_app();

        let response = get(&app, "/api/vocabulary").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: Value = json_response(response).await;
        assert_eq!(body["crops"], json!(["chickpea", "coffee", "mango", "rice"]));
        assert_eq!(body["soil_types"], json!(["Clayey", "Loamy", "Sandy"]));
        assert_eq!(body["crop_types"], json!(["Maize", "Paddy", "Wheat"]));
        assert_eq!(body["fertilizers"], json!(["14-35-14", "DAP", "Urea"]));
    }

    #[tokio::test]
    async fn test_home_page_lists_soil_types() {
        let (_env, app) = create_test_app();

        let response = get(&app, "/").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let html = String::from_utf8(body.to_vec()).unwrap();
        assert!(html.contains("<option value=\"Clayey\">"));
        assert!(html.contains("recommend_crop") || html.contains("cropForm"));
    }

    #[tokio::test]
    async fn test_static_files_served() {
        let (_env, app) = create_test_app();

        let response = get(&app, "/static/js/app.js").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    // =========================================================================
    // Section 5: Model Store Lifecycle
    // =========================================================================

    #[test]
    fn test_startup_persists_then_reuses_artifacts() {
        let env = test_env(ErrorMode::Compat);
        AppState::new(&env.config).expect("first start trains");

        let models = env.dir.path().join("models");
        for artifact in ["crop_model", "fertilizer_model", "le_soil", "le_crop", "le_fertilizer"] {
            assert!(models.join(format!("{}.json", artifact)).is_file(), "{} missing", artifact);
        }

        // Without datasets, a second start can only succeed by loading
        fs::remove_dir_all(&env.config.data_dir).unwrap();
        let state = AppState::new(&env.config).expect("second start loads");
        assert_eq!(state.crop.crops().len(), 4);
    }

    #[test]
    fn test_corrupt_artifact_fails_startup() {
        let env = test_env(ErrorMode::Strict);
        fs::create_dir_all(&env.config.model_dir).unwrap();
        fs::write(env.config.model_dir.join("crop_model.json"), "not a model").unwrap();

        assert!(AppState::new(&env.config).is_err());
    }

    #[test]
    fn test_missing_dataset_fails_startup() {
        let env = test_env(ErrorMode::Compat);
        fs::remove_file(env.config.data_dir.join("fertilizer_recommendation.csv")).unwrap();

        assert!(AppState::new(&env.config).is_err());
    }
}
