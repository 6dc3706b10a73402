use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cartwise_core::domain::demand::DemandForecastRecord;
use cartwise_core::domain::pricing::PriceRecord;
use cartwise_core::domain::recommendation::RecommendationRecord;
use cartwise_core::llm::cohere::CohereClient;
use cartwise_core::llm::error::GatewayError;
use cartwise_core::llm::TextGenerator;
use cartwise_core::storage::demand::DemandDataset;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = cartwise_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let llm: Option<Arc<dyn TextGenerator>> = match CohereClient::from_settings(&settings) {
        Ok(client) => Some(Arc::new(client)),
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "Cohere client unavailable; starting API in degraded mode");
            None
        }
    };

    let demand = match DemandDataset::load_from_path(settings.demand_data_path()) {
        Ok(dataset) => dataset,
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "demand dataset load failed; forecasts will answer zero");
            DemandDataset::default()
        }
    };

    let state = AppState {
        llm,
        demand: Arc::new(demand),
    };

    let app = router(state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));

    tracing::info!(%addr, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/recommend", post(recommend))
        .route("/api/optimize_price", post(optimize_price))
        .route("/api/demand_forecasting", post(demand_forecasting))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Clone)]
struct AppState {
    llm: Option<Arc<dyn TextGenerator>>,
    demand: Arc<DemandDataset>,
}

impl AppState {
    fn require_llm(&self) -> Result<&dyn TextGenerator, ApiError> {
        self.llm.as_deref().ok_or_else(|| {
            ApiError::new(
                StatusCode::SERVICE_UNAVAILABLE,
                "Text generation is not configured",
            )
        })
    }
}

struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    fn bad_request(message: &str) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn from_generation_failure(err: anyhow::Error) -> Self {
        sentry_anyhow::capture_anyhow(&err);
        if err.downcast_ref::<GatewayError>().is_some() {
            tracing::error!(error = %err, "text generation upstream failed");
            Self::new(
                StatusCode::BAD_GATEWAY,
                "Text generation upstream is unavailable",
            )
        } else {
            tracing::error!(error = %err, "request failed");
            Self::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({ "error": self.message })),
        )
            .into_response()
    }
}

#[derive(Debug, Deserialize)]
struct RecommendRequest {
    #[serde(default)]
    search_history: Vec<String>,
}

async fn recommend(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> Result<Json<Vec<RecommendationRecord>>, ApiError> {
    if req.search_history.is_empty() {
        return Err(ApiError::bad_request("Search history is required"));
    }

    let llm = state.require_llm()?;
    let records = cartwise_core::recommend::recommend(llm, &req.search_history)
        .await
        .map_err(ApiError::from_generation_failure)?;

    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
struct OptimizePriceRequest {
    #[serde(default)]
    prices: Vec<f64>,
    #[serde(default)]
    actual_prices: Vec<f64>,
}

async fn optimize_price(
    State(state): State<AppState>,
    Json(req): Json<OptimizePriceRequest>,
) -> Result<Json<Vec<PriceRecord>>, ApiError> {
    if req.prices.is_empty() || req.actual_prices.is_empty() {
        return Err(ApiError::bad_request("Prices and actual prices are required"));
    }

    let llm = state.require_llm()?;
    let records = cartwise_core::pricing::optimize(llm, &req.prices, &req.actual_prices)
        .await
        .map_err(ApiError::from_generation_failure)?;

    Ok(Json(records))
}

#[derive(Debug, Deserialize)]
struct DemandForecastRequest {
    #[serde(default)]
    city: String,
    #[serde(default)]
    age: String,
    #[serde(default)]
    gender: String,
}

async fn demand_forecasting(
    State(state): State<AppState>,
    Json(req): Json<DemandForecastRequest>,
) -> Result<Json<Vec<DemandForecastRecord>>, ApiError> {
    if req.city.is_empty() || req.age.is_empty() || req.gender.is_empty() {
        return Err(ApiError::bad_request("City, age, and gender are required"));
    }

    Ok(Json(state.demand.forecast(&req.city, &req.age, &req.gender)))
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &cartwise_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
