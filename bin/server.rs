// Campus Compass - Web Server
// REST API over the college catalog with Axum

use anyhow::Context;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use campus_compass::compare::ComparisonTable;
use campus_compass::config;
use campus_compass::discovery::{validate_answers, Answers, QuizStep, Recommendation};
use campus_compass::{
    CatalogFilter, College, ComparisonSet, Config, FixedRecommendations, QueryOutcome,
    QueryService, RecommendationEngine, QUIZ,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Shared application state
#[derive(Clone)]
struct AppState {
    service: Arc<QueryService>,
    engine: Arc<dyn RecommendationEngine>,
    compare_max: usize,
}

/// API Response wrapper
#[derive(Serialize)]
struct ApiResponse<T> {
    success: bool,
    data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl ApiResponse<()> {
    fn failed(message: String) -> Self {
        Self {
            success: false,
            data: (),
            error: Some(message),
        }
    }
}

#[derive(Error, Debug)]
enum AppError {
    #[error("College not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
        };
        warn!(%status, error = %self, "Request rejected");

        (status, Json(ApiResponse::failed(self.to_string()))).into_response()
    }
}

/// College list response
#[derive(Serialize)]
struct CollegeListResponse {
    count: usize,
    fallback: bool,
    colleges: Vec<College>,
}

impl From<QueryOutcome> for CollegeListResponse {
    fn from(outcome: QueryOutcome) -> Self {
        Self {
            count: outcome.colleges.len(),
            fallback: outcome.is_fallback(),
            colleges: outcome.colleges,
        }
    }
}

#[derive(Serialize)]
struct ComparisonResponse {
    colleges: Vec<College>,
    table: ComparisonTable,
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    q: String,
}

#[derive(Deserialize)]
struct CompareParams {
    ids: String,
}

// ============================================================================
// API Handlers
// ============================================================================

/// GET /api/health - Health check
async fn health_check() -> impl IntoResponse {
    Json(ApiResponse::ok("OK"))
}

/// GET /api/colleges?type=&location=&rating= - Filtered catalog
async fn list_colleges(
    State(state): State<AppState>,
    Query(filter): Query<CatalogFilter>,
) -> impl IntoResponse {
    let outcome = state.service.fetch_catalog(&filter).await;
    Json(ApiResponse::ok(CollegeListResponse::from(outcome)))
}

/// GET /api/colleges/search?q= - Free-text search
async fn search_colleges(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let outcome = state.service.search_catalog(&params.q).await;
    Json(ApiResponse::ok(CollegeListResponse::from(outcome)))
}

/// GET /api/colleges/:id - One college
async fn get_college(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<College>>, AppError> {
    let (catalog, _) = state.service.load_catalog().await;
    let college = catalog
        .find_by_id(&id)
        .cloned()
        .ok_or(AppError::NotFound(id))?;
    Ok(Json(ApiResponse::ok(college)))
}

/// GET /api/types - Distinct college types
async fn get_types(State(state): State<AppState>) -> impl IntoResponse {
    let (catalog, _) = state.service.load_catalog().await;
    let types: Vec<String> = catalog.types().into_iter().map(String::from).collect();
    Json(ApiResponse::ok(types))
}

/// GET /api/compare?ids=1,2,3 - Comparison table with highlights
async fn compare_colleges(
    State(state): State<AppState>,
    Query(params): Query<CompareParams>,
) -> Result<Json<ApiResponse<ComparisonResponse>>, AppError> {
    let (catalog, _) = state.service.load_catalog().await;
    let mut set = ComparisonSet::new(state.compare_max);

    for id in params.ids.split(',').map(str::trim).filter(|id| !id.is_empty()) {
        let college = catalog
            .find_by_id(id)
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        set.add(college)
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
    }

    Ok(Json(ApiResponse::ok(ComparisonResponse {
        table: set.table(),
        colleges: set.selected().to_vec(),
    })))
}

/// GET /api/discovery/quiz - Quiz definition
async fn get_quiz() -> Json<ApiResponse<&'static [QuizStep]>> {
    Json(ApiResponse::ok(&QUIZ[..]))
}

/// POST /api/discovery/recommendations - Recommendations for quiz answers
async fn recommend(
    State(state): State<AppState>,
    Json(answers): Json<Answers>,
) -> Result<Json<ApiResponse<Vec<Recommendation>>>, AppError> {
    validate_answers(&answers).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let (catalog, _) = state.service.load_catalog().await;
    let recommendations = state.engine.recommend(&answers, &catalog);
    info!(
        engine = state.engine.name(),
        count = recommendations.len(),
        "Recommendations served"
    );
    Ok(Json(ApiResponse::ok(recommendations)))
}

// ============================================================================
// Main Server
// ============================================================================

fn router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/health", get(health_check))
        .route("/colleges", get(list_colleges))
        .route("/colleges/search", get(search_colleges))
        .route("/colleges/:id", get(get_college))
        .route("/types", get(get_types))
        .route("/compare", get(compare_colleges))
        .route("/discovery/quiz", get(get_quiz))
        .route("/discovery/recommendations", post(recommend))
        .with_state(state);

    Router::new()
        .nest("/api", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(config::log_filter()))
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load();

    let service = QueryService::embedded(&config).context("Failed to load embedded catalog")?;
    let state = AppState {
        service: Arc::new(service),
        engine: Arc::new(FixedRecommendations),
        compare_max: config.compare_max,
    };

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, "Campus Compass API listening");

    axum::serve(listener, router(state))
        .await
        .context("Server stopped unexpectedly")?;

    Ok(())
}
