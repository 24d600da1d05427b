use std::sync::Arc;

use chrono::{DateTime, Utc};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::entities::product::Entity as ProductEntity;
use crate::entities::production_order;
use crate::errors::ServiceError;
use crate::services::resolver::MainOrderResolver;

/// Wall-clock format expected by the receiving system.
const WIRE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Station label when the sub-order has no product reference.
const UNKNOWN_STATION: &str = "Unknown Product";

/// The two work-operation transitions reported to the external system.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum OperationEventKind {
    Started,
    Completed,
}

/// Wire timestamp: `status` marks presence, `time` the formatted instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeStamp {
    pub time: Option<String>,
    pub status: bool,
}

impl TimeStamp {
    pub fn present(at: DateTime<Utc>) -> Self {
        Self {
            time: Some(at.format(WIRE_TIME_FORMAT).to_string()),
            status: true,
        }
    }

    pub fn absent() -> Self {
        Self {
            time: None,
            status: false,
        }
    }
}

/// Outbound payload for one work-operation transition. `knockdown_no` is the
/// resolved main order's name, the correlation key on the receiving side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPayload {
    pub knockdown_no: String,
    pub station_name: String,
    pub start_time: TimeStamp,
    pub end_time: TimeStamp,
    pub status: OperationEventKind,
    pub mo_id: i64,
    pub sub_mo_id: i64,
    pub sub_mo_name: String,
}

/// Assembles event payloads. Read-only: resolves the main order, looks up
/// the sub-order's product, and computes the timestamp pair for the kind.
#[derive(Clone)]
pub struct PayloadBuilder {
    db: Arc<DatabaseConnection>,
    resolver: MainOrderResolver,
}

impl PayloadBuilder {
    pub fn new(db: Arc<DatabaseConnection>, resolver: MainOrderResolver) -> Self {
        Self { db, resolver }
    }

    #[instrument(skip(self, sub_order), fields(order_id = sub_order.id, kind = %kind))]
    pub async fn build(
        &self,
        sub_order: &production_order::Model,
        kind: OperationEventKind,
    ) -> Result<EventPayload, ServiceError> {
        let main_order = self.resolver.resolve(sub_order).await?;
        let station_name = self.station_name(sub_order).await?;
        let (start_time, end_time) = timestamp_pair(kind, sub_order.date_start, Utc::now());

        Ok(EventPayload {
            knockdown_no: main_order.name.trim().to_string(),
            station_name,
            start_time,
            end_time,
            status: kind,
            mo_id: main_order.id,
            sub_mo_id: sub_order.id,
            sub_mo_name: sub_order.name.clone(),
        })
    }

    async fn station_name(
        &self,
        sub_order: &production_order::Model,
    ) -> Result<String, ServiceError> {
        let Some(product_id) = sub_order.product_id else {
            return Ok(UNKNOWN_STATION.to_string());
        };

        let product = ProductEntity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Product {} referenced by order {} not found",
                    product_id, sub_order.name
                ))
            })?;

        match product.default_code {
            Some(code) if !code.trim().is_empty() => Ok(code),
            _ => Ok(product.name),
        }
    }
}

/// Timestamp pair rules: a start event carries only a start time; a finish
/// event carries the stored start (when one was recorded) and the finish
/// time.
fn timestamp_pair(
    kind: OperationEventKind,
    recorded_start: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> (TimeStamp, TimeStamp) {
    match kind {
        OperationEventKind::Started => (TimeStamp::present(now), TimeStamp::absent()),
        OperationEventKind::Completed => (
            recorded_start
                .map(TimeStamp::present)
                .unwrap_or_else(TimeStamp::absent),
            TimeStamp::present(now),
        ),
    }
}
