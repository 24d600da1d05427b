use std::sync::Arc;

use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use tracing::instrument;

use crate::entities::order_note::{self, Entity as OrderNoteEntity};
use crate::entities::production_order::{self, Entity as ProductionOrderEntity};
use crate::errors::ServiceError;

/// Paginated listing response for production orders.
#[derive(Debug, Serialize)]
pub struct ProductionOrderList {
    pub orders: Vec<production_order::Model>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Read surface over production orders and their audit trail.
#[derive(Clone)]
pub struct ProductionOrderService {
    db: Arc<DatabaseConnection>,
}

impl ProductionOrderService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn get_order(&self, id: i64) -> Result<production_order::Model, ServiceError> {
        ProductionOrderEntity::find_by_id(id)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?
            .ok_or_else(|| ServiceError::NotFound(format!("Production order {} not found", id)))
    }

    /// Lists orders newest first.
    #[instrument(skip(self))]
    pub async fn list_orders(
        &self,
        page: u64,
        per_page: u64,
    ) -> Result<ProductionOrderList, ServiceError> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);

        let paginator = ProductionOrderEntity::find()
            .order_by_desc(production_order::Column::CreatedAt)
            .paginate(&*self.db, per_page);

        let total = paginator
            .num_items()
            .await
            .map_err(|e| ServiceError::db_error(e))?;
        let orders = paginator
            .fetch_page(page - 1)
            .await
            .map_err(|e| ServiceError::db_error(e))?;

        Ok(ProductionOrderList {
            orders,
            total,
            page,
            per_page,
        })
    }

    /// Audit trail for one order, oldest first.
    pub async fn list_notes(&self, order_id: i64) -> Result<Vec<order_note::Model>, ServiceError> {
        self.get_order(order_id).await?;

        OrderNoteEntity::find()
            .filter(order_note::Column::ProductionOrderId.eq(order_id))
            .order_by_asc(order_note::Column::Id)
            .all(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))
    }
}
