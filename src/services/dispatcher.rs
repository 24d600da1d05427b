use std::sync::Arc;

use metrics::counter;
use serde_json::{json, Value};
use tracing::{debug, error, instrument, warn};
use uuid::Uuid;

use crate::entities::production_order;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::audit::{ack_log_id, AuditSink};
use crate::services::dedup::{dispatch_signature, DispatchGuard};
use crate::services::payload::{OperationEventKind, PayloadBuilder};
use crate::services::settings::SettingsService;
use crate::services::transport::BridgeTransport;

/// Orchestrates one operation-event dispatch: enabled gate, payload build,
/// duplicate suppression, transport, audit. Never fails the caller; every
/// problem ends here as a log line plus an audit note.
#[derive(Clone)]
pub struct EventDispatcher {
    settings: SettingsService,
    builder: PayloadBuilder,
    guard: Arc<DispatchGuard>,
    transport: BridgeTransport,
    audit: Arc<dyn AuditSink>,
    event_sender: Option<EventSender>,
}

impl EventDispatcher {
    pub fn new(
        settings: SettingsService,
        builder: PayloadBuilder,
        guard: Arc<DispatchGuard>,
        transport: BridgeTransport,
        audit: Arc<dyn AuditSink>,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            settings,
            builder,
            guard,
            transport,
            audit,
            event_sender,
        }
    }

    #[instrument(
        skip(self, sub_order),
        fields(
            order_id = sub_order.id,
            order_name = %sub_order.name,
            kind = %kind,
            dispatch_id = %Uuid::new_v4(),
        )
    )]
    pub async fn dispatch(&self, sub_order: &production_order::Model, kind: OperationEventKind) {
        // A read failure on the flag must not halt the integration.
        match self.settings.is_enabled().await {
            Ok(true) => {}
            Ok(false) => {
                debug!("Bridge disabled, skipping operation event");
                return;
            }
            Err(e) => {
                warn!("Could not read bridge enabled flag, assuming enabled: {}", e);
            }
        }

        let payload = match self.builder.build(sub_order, kind).await {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to build operation event payload: {}", e);
                self.record_failure(
                    sub_order.id,
                    kind,
                    json!({ "status": kind, "station_name": "Unknown" }),
                    Some(e.to_string()),
                )
                .await;
                return;
            }
        };

        let signature = dispatch_signature(&payload);
        if self.guard.check_and_record(&signature) {
            debug!(
                %signature,
                "Duplicate operation event within {:?}, suppressed",
                self.guard.window()
            );
            counter!("bridge_events_suppressed_total", 1);
            return;
        }

        let (delivered, ack) = self.transport.send(&payload).await;
        if delivered {
            let log_id = ack_log_id(ack.as_ref());
            if let Err(e) = self.audit.record_success(sub_order.id, payload, ack).await {
                warn!("Failed to record success audit note: {}", e);
            }
            counter!("bridge_events_delivered_total", 1);
            self.publish(Event::OperationEventDelivered {
                production_order_id: sub_order.id,
                kind: kind.to_string(),
                log_id,
            })
            .await;
        } else {
            let payload_json = serde_json::to_value(&payload).unwrap_or(Value::Null);
            self.record_failure(sub_order.id, kind, payload_json, None).await;
        }
    }

    async fn record_failure(
        &self,
        order_id: i64,
        kind: OperationEventKind,
        payload: Value,
        error: Option<String>,
    ) {
        if let Err(e) = self.audit.record_failure(order_id, kind, payload, error).await {
            warn!("Failed to record failure audit note: {}", e);
        }
        counter!("bridge_events_failed_total", 1);
        self.publish(Event::OperationEventFailed {
            production_order_id: order_id,
            kind: kind.to_string(),
        })
        .await;
    }

    async fn publish(&self, event: Event) {
        if let Some(sender) = &self.event_sender {
            sender.send_or_log(event).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::production_order;
    use crate::migrator::Migrator;
    use crate::services::payload::EventPayload;
    use crate::services::resolver::MainOrderResolver;
    use crate::services::settings::PARAM_ENDPOINT_URL;
    use chrono::Utc;
    use mockall::mock;
    use rust_decimal::Decimal;
    use sea_orm::{Database, DatabaseConnection};
    use sea_orm_migration::MigratorTrait;
    use std::time::Duration;

    mock! {
        Sink {}

        #[async_trait::async_trait]
        impl AuditSink for Sink {
            async fn record_success(
                &self,
                order_id: i64,
                payload: EventPayload,
                ack: Option<Value>,
            ) -> Result<(), ServiceError>;

            async fn record_failure(
                &self,
                order_id: i64,
                kind: OperationEventKind,
                payload: Value,
                error: Option<String>,
            ) -> Result<(), ServiceError>;
        }
    }

    async fn migrated_db(dir: &tempfile::TempDir) -> Arc<DatabaseConnection> {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("bridge.db").display());
        let db = Database::connect(&url).await.unwrap();
        Migrator::up(&db, None).await.unwrap();
        Arc::new(db)
    }

    async fn bare_db(dir: &tempfile::TempDir) -> Arc<DatabaseConnection> {
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("bare.db").display());
        Arc::new(Database::connect(&url).await.unwrap())
    }

    fn order_model(id: i64, name: &str) -> production_order::Model {
        production_order::Model {
            id,
            name: name.to_string(),
            origin: None,
            procurement_group_id: None,
            product_id: None,
            state: "confirmed".to_string(),
            quantity: Decimal::ONE,
            date_start: None,
            date_finished: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn dispatcher(
        db: Arc<DatabaseConnection>,
        sink: MockSink,
        window: Duration,
    ) -> EventDispatcher {
        let settings = SettingsService::new(db.clone());
        let builder = PayloadBuilder::new(db.clone(), MainOrderResolver::new(db.clone()));
        let transport = BridgeTransport::new(settings.clone());
        EventDispatcher::new(
            settings,
            builder,
            Arc::new(DispatchGuard::new(window)),
            transport,
            Arc::new(sink),
            None,
        )
    }

    // Timestamps format to whole seconds; dispatches that must share a
    // signature have to land in the same wall-clock second.
    async fn align_to_fresh_second() {
        let ms = Utc::now().timestamp_subsec_millis();
        if ms > 700 {
            tokio::time::sleep(Duration::from_millis(u64::from(1000 - ms) + 10)).await;
        }
    }

    #[tokio::test]
    async fn failed_delivery_records_failure_note() {
        let dir = tempfile::tempdir().unwrap();
        let db = migrated_db(&dir).await;
        SettingsService::new(db.clone())
            .set_param(PARAM_ENDPOINT_URL, "")
            .await
            .unwrap();

        let mut sink = MockSink::new();
        sink.expect_record_failure()
            .withf(|order_id, kind, _, error| {
                *order_id == 9 && *kind == OperationEventKind::Started && error.is_none()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        dispatcher(db, sink, Duration::from_secs(5))
            .dispatch(&order_model(9, "MO/00009"), OperationEventKind::Started)
            .await;
    }

    #[tokio::test]
    async fn build_errors_record_failure_with_unknown_station() {
        let dir = tempfile::tempdir().unwrap();
        let db = bare_db(&dir).await;

        let mut sink = MockSink::new();
        sink.expect_record_failure()
            .withf(|_, kind, payload, error| {
                *kind == OperationEventKind::Completed
                    && payload["station_name"] == "Unknown"
                    && error.is_some()
            })
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        dispatcher(db, sink, Duration::from_secs(5))
            .dispatch(&order_model(3, "MO/00003"), OperationEventKind::Completed)
            .await;
    }

    #[tokio::test]
    async fn audit_errors_are_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let db = migrated_db(&dir).await;
        SettingsService::new(db.clone())
            .set_param(PARAM_ENDPOINT_URL, "")
            .await
            .unwrap();

        let mut sink = MockSink::new();
        sink.expect_record_failure()
            .times(1)
            .returning(|_, _, _, _| Err(ServiceError::InternalError("sink down".to_string())));

        dispatcher(db, sink, Duration::from_secs(5))
            .dispatch(&order_model(4, "MO/00004"), OperationEventKind::Started)
            .await;
    }

    #[tokio::test]
    async fn duplicate_dispatch_is_suppressed() {
        let dir = tempfile::tempdir().unwrap();
        let db = migrated_db(&dir).await;
        SettingsService::new(db.clone())
            .set_param(PARAM_ENDPOINT_URL, "")
            .await
            .unwrap();

        let mut sink = MockSink::new();
        sink.expect_record_failure()
            .times(1)
            .returning(|_, _, _, _| Ok(()));

        let dispatcher = dispatcher(db, sink, Duration::from_secs(5));
        let order = order_model(5, "MO/00005");

        align_to_fresh_second().await;
        dispatcher.dispatch(&order, OperationEventKind::Started).await;
        dispatcher.dispatch(&order, OperationEventKind::Started).await;
    }

    #[tokio::test]
    async fn disabled_bridge_skips_everything() {
        let dir = tempfile::tempdir().unwrap();
        let db = migrated_db(&dir).await;
        SettingsService::new(db.clone())
            .set_param(crate::services::settings::PARAM_ENABLED, "false")
            .await
            .unwrap();

        let sink = MockSink::new();

        dispatcher(db, sink, Duration::from_secs(5))
            .dispatch(&order_model(6, "MO/00006"), OperationEventKind::Started)
            .await;
    }
}
