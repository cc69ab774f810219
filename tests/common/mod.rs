use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, Set};
use tokio::sync::mpsc;
use tower::util::ServiceExt;

use cargotrack_api::{
    auth::Role,
    config::AppConfig,
    db,
    entities::customer,
    events::{Event, EventSender},
    services::tracking::{AuditContext, NewTrackingItem},
    AppState,
};

pub struct TestApp {
    pub state: AppState,
    // Kept alive so best-effort event sends do not hit a closed channel.
    _event_rx: mpsc::Receiver<Event>,
}

pub async fn spawn_app() -> TestApp {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "integration_test_secret_0123456789abcdef".to_string(),
        "127.0.0.1".to_string(),
        0,
    );
    // More than one pooled connection would give each query its own empty
    // in-memory database.
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .expect("failed to open in-memory database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations");

    let (event_tx, event_rx) = mpsc::channel(64);
    let state = AppState::new(Arc::new(pool), cfg, EventSender::new(event_tx));

    TestApp {
        state,
        _event_rx: event_rx,
    }
}

impl TestApp {
    pub fn router(&self) -> Router {
        cargotrack_api::app(self.state.clone())
    }

    pub fn admin_token(&self) -> String {
        self.state
            .auth
            .generate_token(1, Role::Admin)
            .expect("failed to mint admin token")
    }

    pub fn customer_token(&self, customer_id: i64) -> String {
        self.state
            .auth
            .generate_token(customer_id, Role::Customer)
            .expect("failed to mint customer token")
    }

    pub async fn seed_customer(&self, user_id: &str, name: &str, email: &str) -> customer::Model {
        customer::ActiveModel {
            user_id: Set(user_id.to_string()),
            name: Set(name.to_string()),
            email: Set(email.to_string()),
            phone: Set(None),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(self.state.db.as_ref())
        .await
        .expect("failed to seed customer")
    }

    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {}", token));
        }
        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .expect("failed to build request"),
            None => builder.body(Body::empty()).expect("failed to build request"),
        };

        let response = self
            .router()
            .oneshot(request)
            .await
            .expect("router never errors");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read response body");
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body was not JSON")
        };
        (status, json)
    }
}

/// Minimal creation input; tests override individual fields as needed.
pub fn new_item(tracking_number: &str, customer_id: i64) -> NewTrackingItem {
    NewTrackingItem {
        tracking_number: tracking_number.to_string(),
        customer_id,
        product_name: None,
        product_quantity: None,
        status_title: None,
        status: None,
        current_location: None,
        expected_date: None,
        description: None,
    }
}

pub fn audit() -> AuditContext {
    AuditContext {
        actor_id: 1,
        source_ip: Some("203.0.113.1".to_string()),
    }
}
