use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    TransactionTrait,
};
use tracing::{debug, info, instrument, warn};

use crate::entities::production_order::{self, Entity as ProductionOrderEntity};
use crate::entities::work_order::{self, Entity as WorkOrderEntity};
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::services::dispatcher::EventDispatcher;
use crate::services::payload::OperationEventKind;
use crate::services::resolver::MainOrderResolver;

/// Work-order lifecycle transitions. Start and finish are the trigger points
/// for outbound operation events; dispatch outcome never affects the
/// transition result.
#[derive(Clone)]
pub struct WorkOrderService {
    db: Arc<DatabaseConnection>,
    resolver: MainOrderResolver,
    dispatcher: EventDispatcher,
    event_sender: Option<EventSender>,
}

impl WorkOrderService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        resolver: MainOrderResolver,
        dispatcher: EventDispatcher,
        event_sender: Option<EventSender>,
    ) -> Self {
        Self {
            db,
            resolver,
            dispatcher,
            event_sender,
        }
    }

    pub async fn get_work_order(&self, id: i64) -> Result<work_order::Model, ServiceError> {
        WorkOrderEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?
            .ok_or_else(|| ServiceError::NotFound(format!("Work order {} not found", id)))
    }

    /// Starts a work order. The first start on a confirmed order reports the
    /// operation to the bridge and moves the order itself to `in_progress`.
    #[instrument(skip(self))]
    pub async fn start_work_order(&self, id: i64) -> Result<work_order::Model, ServiceError> {
        let work_order = self.get_work_order(id).await?;
        if work_order.state != "pending" && work_order.state != "ready" {
            return Err(ServiceError::InvalidOperation(format!(
                "Work order {} cannot start from state {}",
                id, work_order.state
            )));
        }

        let order = ProductionOrderEntity::find_by_id(work_order.production_order_id)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Production order {} not found",
                    work_order.production_order_id
                ))
            })?;

        // The event reports the pre-transition order, so it fires first.
        if order.state == "confirmed" {
            self.notify(&order, OperationEventKind::Started).await;
        }

        let now = Utc::now();
        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| ServiceError::db_error(e))?;

        let mut active: work_order::ActiveModel = work_order.into();
        active.state = Set("in_progress".to_string());
        active.date_start = Set(Some(now));
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db_error(e))?;

        let mut order_started = false;
        if order.state == "confirmed" {
            let mut order_active: production_order::ActiveModel = order.clone().into();
            order_active.state = Set("in_progress".to_string());
            if order.date_start.is_none() {
                order_active.date_start = Set(Some(now));
            }
            order_active
                .update(&txn)
                .await
                .map_err(|e| ServiceError::db_error(e))?;
            order_started = true;
        }

        txn.commit().await.map_err(|e| ServiceError::db_error(e))?;

        counter!("mrp_bridge.work_orders.started", 1);
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::WorkOrderStarted {
                    work_order_id: updated.id,
                    production_order_id: updated.production_order_id,
                })
                .await;
            if order_started {
                sender
                    .send_or_log(Event::ProductionOrderStateChanged {
                        production_order_id: order.id,
                        old_state: "confirmed".to_string(),
                        new_state: "in_progress".to_string(),
                    })
                    .await;
            }
        }

        info!("Work order {} started on order {}", updated.id, order.name);
        Ok(updated)
    }

    /// Finishes a work order. When the last open work order on the order
    /// terminates, the order moves to `to_close` and the completed operation
    /// is reported to the bridge.
    #[instrument(skip(self))]
    pub async fn finish_work_order(&self, id: i64) -> Result<work_order::Model, ServiceError> {
        let work_order = self.get_work_order(id).await?;
        if work_order.state != "ready" && work_order.state != "in_progress" {
            return Err(ServiceError::InvalidOperation(format!(
                "Work order {} cannot finish from state {}",
                id, work_order.state
            )));
        }

        let order = ProductionOrderEntity::find_by_id(work_order.production_order_id)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?
            .ok_or_else(|| {
                ServiceError::NotFound(format!(
                    "Production order {} not found",
                    work_order.production_order_id
                ))
            })?;

        let now = Utc::now();
        let db = &*self.db;
        let txn = db.begin().await.map_err(|e| ServiceError::db_error(e))?;

        let mut active: work_order::ActiveModel = work_order.into();
        active.state = Set("done".to_string());
        active.date_finished = Set(Some(now));
        let updated = active
            .update(&txn)
            .await
            .map_err(|e| ServiceError::db_error(e))?;

        let siblings = WorkOrderEntity::find()
            .filter(work_order::Column::ProductionOrderId.eq(order.id))
            .all(&txn)
            .await
            .map_err(|e| ServiceError::db_error(e))?;
        let all_terminal = siblings.iter().all(|wo| wo.is_terminal());

        let mut order_after = order.clone();
        if all_terminal && matches!(order.state.as_str(), "confirmed" | "in_progress") {
            let mut order_active: production_order::ActiveModel = order.clone().into();
            order_active.state = Set("to_close".to_string());
            order_after = order_active
                .update(&txn)
                .await
                .map_err(|e| ServiceError::db_error(e))?;
        }

        txn.commit().await.map_err(|e| ServiceError::db_error(e))?;

        counter!("mrp_bridge.work_orders.finished", 1);
        if let Some(sender) = &self.event_sender {
            sender
                .send_or_log(Event::WorkOrderFinished {
                    work_order_id: updated.id,
                    production_order_id: updated.production_order_id,
                })
                .await;
            if order_after.state != order.state {
                sender
                    .send_or_log(Event::ProductionOrderStateChanged {
                        production_order_id: order.id,
                        old_state: order.state.clone(),
                        new_state: order_after.state.clone(),
                    })
                    .await;
            }
        }

        // The completed report reads post-transition state: every work order
        // terminal and the order itself closing out.
        if all_terminal && matches!(order_after.state.as_str(), "done" | "to_close") {
            self.notify(&order_after, OperationEventKind::Completed).await;
        }

        info!("Work order {} finished on order {}", updated.id, order.name);
        Ok(updated)
    }

    /// Reports an operation event for sub-orders. Resolution or dispatch
    /// problems must not block the transition.
    async fn notify(&self, order: &production_order::Model, kind: OperationEventKind) {
        match self.resolver.is_sub_order(order).await {
            Ok(true) => self.dispatcher.dispatch(order, kind).await,
            Ok(false) => debug!(
                "Order {} is its own main order, no {} event",
                order.name, kind
            ),
            Err(e) => warn!("Main order resolution failed for {}: {}", order.name, e),
        }
    }
}
