#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Method, Request},
    Router,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, ActiveValue::Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

use mrp_event_bridge::{
    config::AppConfig,
    db,
    entities::{order_note, product, production_order, stock_move, stock_move_dest, work_order},
    events::{self, EventSender},
    AppState,
};

/// Helper harness for spinning up an application state backed by a
/// file-based SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
    _db_dir: tempfile::TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let db_dir = tempfile::tempdir().expect("create temp dir for test database");
        let db_path = db_dir.path().join("bridge_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_path.display()),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let db_arc = Arc::new(pool);
        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = EventSender::new(event_tx);
        let event_task = tokio::spawn(events::process_events(event_rx));

        let state = AppState::new(db_arc, cfg, event_sender);

        let router = Router::new()
            .nest("/api/v1", mrp_event_bridge::api_v1_routes())
            .with_state(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
            _db_dir: db_dir,
        }
    }

    /// Send a JSON request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_product(&self, name: &str, default_code: Option<&str>) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            default_code: Set(default_code.map(str::to_string)),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed product for tests")
    }

    pub async fn seed_order(&self, seed: OrderSeed<'_>) -> production_order::Model {
        let mut row = production_order::ActiveModel {
            name: Set(seed.name.to_string()),
            origin: Set(seed.origin.map(str::to_string)),
            procurement_group_id: Set(seed.procurement_group_id),
            product_id: Set(seed.product_id),
            state: Set(seed.state.to_string()),
            ..Default::default()
        };
        if let Some(created_at) = seed.created_at {
            row.created_at = Set(created_at);
        }
        row.insert(&*self.state.db)
            .await
            .expect("seed production order for tests")
    }

    pub async fn seed_work_order(
        &self,
        production_order_id: i64,
        name: &str,
        state: &str,
    ) -> work_order::Model {
        work_order::ActiveModel {
            production_order_id: Set(production_order_id),
            name: Set(name.to_string()),
            state: Set(state.to_string()),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed work order for tests")
    }

    /// Wire the finished-goods move of `sub_order_id` to a move belonging to
    /// `dest_order_id`, the way component demand links orders in stock flow.
    pub async fn link_finished_move(&self, sub_order_id: i64, dest_order_id: i64) {
        let finished = stock_move::ActiveModel {
            production_order_id: Set(Some(sub_order_id)),
            finished: Set(true),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed finished move for tests");

        let dest = stock_move::ActiveModel {
            production_order_id: Set(Some(dest_order_id)),
            finished: Set(false),
            ..Default::default()
        }
        .insert(&*self.state.db)
        .await
        .expect("seed destination move for tests");

        stock_move_dest::ActiveModel {
            move_id: Set(finished.id),
            dest_move_id: Set(dest.id),
        }
        .insert(&*self.state.db)
        .await
        .expect("seed move destination link for tests");
    }

    pub async fn order_notes(&self, order_id: i64) -> Vec<order_note::Model> {
        use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};

        order_note::Entity::find()
            .filter(order_note::Column::ProductionOrderId.eq(order_id))
            .order_by_asc(order_note::Column::Id)
            .all(&*self.state.db)
            .await
            .expect("query order notes")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Inputs for seeding a production order; unset fields take entity defaults.
pub struct OrderSeed<'a> {
    pub name: &'a str,
    pub origin: Option<&'a str>,
    pub procurement_group_id: Option<i64>,
    pub product_id: Option<i64>,
    pub state: &'a str,
    pub created_at: Option<DateTime<Utc>>,
}

impl Default for OrderSeed<'_> {
    fn default() -> Self {
        Self {
            name: "",
            origin: None,
            procurement_group_id: None,
            product_id: None,
            state: "confirmed",
            created_at: None,
        }
    }
}

/// Sleep until a fresh second starts when close to the boundary, so
/// timestamps formatted at second resolution stay stable across a test.
pub async fn align_to_fresh_second() {
    let millis = Utc::now().timestamp_subsec_millis() as u64;
    if millis > 700 {
        tokio::time::sleep(std::time::Duration::from_millis(1_050 - millis)).await;
    }
}
