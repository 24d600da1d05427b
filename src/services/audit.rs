use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};
use serde_json::Value;
use tracing::instrument;

use crate::entities::order_note;
use crate::errors::ServiceError;
use crate::services::payload::{EventPayload, OperationEventKind};

/// Rule line separating the summary from the raw payload in audit notes.
const NOTE_RULE: &str = "========================================";

/// Port for recording dispatch outcomes on the order's audit trail. The
/// dispatcher logs and swallows errors from both methods.
#[async_trait]
pub trait AuditSink: Send + Sync {
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

/// Production sink: appends notes to the order's `order_notes` trail.
pub struct NoteAuditSink {
    db: Arc<DatabaseConnection>,
}

impl NoteAuditSink {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn append_note(&self, order_id: i64, body: String) -> Result<(), ServiceError> {
        let note = order_note::ActiveModel {
            production_order_id: Set(order_id),
            body: Set(body),
            note_type: Set("comment".to_string()),
            ..Default::default()
        };
        note.insert(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?;
        Ok(())
    }
}

#[async_trait]
impl AuditSink for NoteAuditSink {
    #[instrument(skip(self, payload, ack))]
    async fn record_success(
        &self,
        order_id: i64,
        payload: EventPayload,
        ack: Option<Value>,
    ) -> Result<(), ServiceError> {
        self.append_note(order_id, success_body(&payload, ack.as_ref()))
            .await
    }

    #[instrument(skip(self, payload, error))]
    async fn record_failure(
        &self,
        order_id: i64,
        kind: OperationEventKind,
        payload: Value,
        error: Option<String>,
    ) -> Result<(), ServiceError> {
        self.append_note(order_id, failure_body(kind, &payload, error.as_deref()))
            .await
    }
}

/// Bilingual status labels shown to operators.
fn status_label(kind: OperationEventKind) -> &'static str {
    match kind {
        OperationEventKind::Started => "เริ่มงาน (started)",
        OperationEventKind::Completed => "เสร็จงาน (completed)",
    }
}

/// Acknowledgement identifier surfaced by the receiving system, if any.
pub(crate) fn ack_log_id(ack: Option<&Value>) -> Option<String> {
    ack.and_then(|body| body.get("log_id")).map(|value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    })
}

/// Note body for a delivered event.
fn success_body(payload: &EventPayload, ack: Option<&Value>) -> String {
    let mut lines = vec![
        "✅ Operation event delivered".to_string(),
        NOTE_RULE.to_string(),
        format!("Station: {}", payload.station_name),
        format!("Knockdown No: {}", payload.knockdown_no),
        format!("Status: {}", status_label(payload.status)),
        format!("Start: {}", payload.start_time.time.as_deref().unwrap_or("-")),
        format!("End: {}", payload.end_time.time.as_deref().unwrap_or("-")),
    ];
    if let Some(log_id) = ack_log_id(ack) {
        lines.push(format!("Log ID: {}", log_id));
    }
    lines.push(NOTE_RULE.to_string());
    lines.push(
        serde_json::to_string_pretty(payload).unwrap_or_else(|_| "{}".to_string()),
    );
    lines.join("\n")
}

/// Note body for a failed build or delivery.
fn failure_body(kind: OperationEventKind, payload: &Value, error: Option<&str>) -> String {
    let pretty_payload =
        serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
    [
        "❌ Operation event delivery failed".to_string(),
        NOTE_RULE.to_string(),
        format!("Status: {}", status_label(kind)),
        format!("Reason: {}", error.unwrap_or("unknown")),
        NOTE_RULE.to_string(),
        pretty_payload,
    ]
    .join("\n")
}
