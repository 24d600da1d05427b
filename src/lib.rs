//! MRP Event Bridge Library
//!
//! Resolves the main order behind a manufacturing sub-assembly, builds
//! work-operation event payloads, and delivers them to a configurable
//! HTTP endpoint with duplicate suppression and an order-note audit trail.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod services;

use std::sync::Arc;

use axum::{
    extract::State,
    response::Json,
    routing::{get, post},
    Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use services::audit::{AuditSink, NoteAuditSink};
use services::dedup::DispatchGuard;
use services::dispatcher::EventDispatcher;
use services::payload::PayloadBuilder;
use services::production_orders::ProductionOrderService;
use services::resolver::MainOrderResolver;
use services::settings::SettingsService;
use services::transport::BridgeTransport;
use services::work_orders::WorkOrderService;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub settings_service: SettingsService,
    pub production_order_service: ProductionOrderService,
    pub work_order_service: WorkOrderService,
}

impl AppState {
    /// Wires the delivery pipeline (resolver, payload builder, transport,
    /// audit sink, dispatcher) behind the order services.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let settings_service = SettingsService::new(db.clone());
        let resolver = MainOrderResolver::new(db.clone());
        let builder = PayloadBuilder::new(db.clone(), resolver.clone());
        let transport = BridgeTransport::new(settings_service.clone());
        let audit: Arc<dyn AuditSink> = Arc::new(NoteAuditSink::new(db.clone()));
        let dispatcher = EventDispatcher::new(
            settings_service.clone(),
            builder,
            Arc::new(DispatchGuard::default()),
            transport,
            audit,
            Some(event_sender.clone()),
        );
        let work_order_service = WorkOrderService::new(
            db.clone(),
            resolver,
            dispatcher,
            Some(event_sender.clone()),
        );
        let production_order_service = ProductionOrderService::new(db.clone());

        Self {
            db,
            config,
            event_sender,
            settings_service,
            production_order_service,
            work_order_service,
        }
    }
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

fn default_page() -> u64 {
    1
}
fn default_limit() -> u64 {
    20
}

// Common response wrappers
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
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

/// Versioned API routes
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        // Status and health endpoints
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Production orders API
        .route(
            "/production-orders",
            get(handlers::production_orders::list_production_orders),
        )
        .route(
            "/production-orders/:id",
            get(handlers::production_orders::get_production_order),
        )
        .route(
            "/production-orders/:id/notes",
            get(handlers::production_orders::list_order_notes),
        )
        // Work orders API
        .route("/work-orders/:id", get(handlers::work_orders::get_work_order))
        .route(
            "/work-orders/:id/start",
            post(handlers::work_orders::start_work_order),
        )
        .route(
            "/work-orders/:id/finish",
            post(handlers::work_orders::finish_work_order),
        )
        // Bridge settings API
        .route(
            "/settings/bridge",
            get(handlers::settings::get_bridge_settings)
                .put(handlers::settings::update_bridge_settings),
        )
}

async fn api_status() -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    let version = env!("CARGO_PKG_VERSION");
    let git = option_env!("GIT_HASH").unwrap_or("unknown");
    let build_time = option_env!("BUILD_TIME").unwrap_or("unknown");
    let status_data = json!({
        "status": "ok",
        "version": version,
        "git": git,
        "build_time": build_time,
        "service": "mrp-event-bridge",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Value>>, errors::ServiceError> {
    // Check database connectivity
    let db_status = match db::check_connection(&state.db).await {
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
