// src/api.rs

//! Query API.
//!
//! ## Endpoints
//!
//! - `GET /status`: liveness, always `{"info":"ok"}`
//! - `GET /weather/{location}?date=YYYYMMDD`: one forecast record, where
//!   `location` may carry a state suffix such as `Richmond, vic`
//!
//! Errors are JSON objects with an `error` field. Internal failures also
//! carry a `code` that appears in the matching log line.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderName, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{AppError, Result};
use crate::models::ForecastRecord;
use crate::services::QueryResolver;
use crate::utils::new_token;

/// Shared state for request handlers.
pub struct ApiState {
    pub resolver: QueryResolver,
}

impl ApiState {
    pub fn new(resolver: QueryResolver) -> Arc<Self> {
        Arc::new(Self { resolver })
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct WeatherParams {
    pub date: Option<String>,
}

/// Routes without middleware.
pub fn router() -> Router<Arc<ApiState>> {
    Router::new()
        .route("/status", get(status))
        .route("/weather/{location}", get(weather))
}

/// Full application: routes, CORS and request tracing.
pub fn app(state: Arc<ApiState>) -> Router {
    router()
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::HEAD,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::ACCEPT_ENCODING,
            HeaderName::from_static("x-csrf-token"),
            header::AUTHORIZATION,
        ])
}

/// Bind and serve until the process is stopped.
pub async fn serve(bind: &str, state: Arc<ApiState>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Query API listening on {}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}

async fn status() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "info": "ok" }))
}

async fn weather(
    State(state): State<Arc<ApiState>>,
    Path(location): Path<String>,
    Query(params): Query<WeatherParams>,
) -> Result<Json<ForecastRecord>> {
    let record = state
        .resolver
        .resolve(&location, params.date.as_deref())
        .await?;
    Ok(Json(record))
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            AppError::NotFound => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": self.to_string() }),
            ),
            e if e.is_client_error() => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": e.to_string() }),
            ),
            e => {
                let code = new_token();
                log::error!("ErrorID: {}, {}", code, e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": "Internal server error", "code": code }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}
