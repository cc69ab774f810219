//! CargoTrack API Library
//!
//! Shipment tracking service: tracking items with an append-only status
//! history, a customer portal, and an administrative audit trail.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{
    extract::State,
    response::Json,
    routing::{get, put},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub auth: Arc<auth::AuthService>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let auth = Arc::new(auth::AuthService::new(auth::AuthConfig::new(
            config.jwt_secret.clone(),
            Duration::from_secs(config.jwt_expiration),
        )));
        let services = handlers::AppServices::new(db.clone(), event_sender.clone());

        Self {
            db,
            config,
            event_sender,
            auth,
            services,
        }
    }

    pub fn tracking_service(&self) -> Arc<services::tracking::TrackingService> {
        self.services.tracking.clone()
    }

    pub fn customer_service(&self) -> Arc<services::customers::CustomerService> {
        self.services.customers.clone()
    }

    pub fn activity_log_service(&self) -> Arc<services::activity_log::ActivityLogService> {
        self.services.activity_logs.clone()
    }
}

// Common response wrapper
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            message: Some(message),
            errors: None,
        }
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Back-office tracking management
        .route(
            "/tracking",
            get(handlers::tracking::list_tracking_items)
                .post(handlers::tracking::create_tracking_item),
        )
        .route("/tracking/search", get(handlers::tracking::search_tracking_item))
        .route(
            "/tracking/:id",
            put(handlers::tracking::update_tracking_item)
                .delete(handlers::tracking::delete_tracking_item),
        )
        // Customer portal
        .route("/customer/tracking", get(handlers::tracking::my_tracking_items))
        .route(
            "/customer/tracking/:id/location",
            put(handlers::tracking::update_my_tracking_location),
        )
        // Directory and audit
        .route("/customers", get(handlers::customers::list_customers))
        .route("/activity-logs", get(handlers::activity_logs::list_activity_logs))
}

/// Full application router: versioned API, Swagger UI, and request telemetry.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "cargotrack-api up" }))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .layer(TraceLayer::new_for_http())
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .with_state(state)
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let status_data = json!({
        "status": "ok",
        "service": "cargotrack-api",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

// Request logging middleware
async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    let response = next.run(request).await;

    tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}
