use std::collections::HashSet;
use std::sync::Arc;

use async_recursion::async_recursion;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use tracing::{debug, instrument};

use crate::entities::production_order::{self, Entity as ProductionOrderEntity};
use crate::entities::stock_move::{self, Entity as StockMoveEntity};
use crate::entities::stock_move_dest::{self, Entity as StockMoveDestEntity};
use crate::errors::ServiceError;

/// Origin values starting with this prefix reference another manufacturing
/// order rather than an originating sales document.
const ORDER_REF_PREFIX: &str = "MO/";

/// Minimum hyphen-separated name segments before decomposition applies.
const MIN_NAME_SEGMENTS: usize = 3;

/// Infers the top-level ("main") order a sub-order feeds into, walking
/// several independent, imperfect signals in a fixed precedence order. The
/// first matching signal wins; when none match, the order is its own main
/// order. Candidate queries iterate in ascending id order so results are
/// stable across runs.
#[derive(Clone)]
pub struct MainOrderResolver {
    db: Arc<DatabaseConnection>,
}

impl MainOrderResolver {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Walks the parent signals for `order` and returns its main order, or
    /// `order` itself when no signal resolves.
    #[instrument(skip(self, order), fields(order_id = order.id, order_name = %order.name))]
    pub async fn resolve(
        &self,
        order: &production_order::Model,
    ) -> Result<production_order::Model, ServiceError> {
        let mut visited = HashSet::from([order.id]);
        self.resolve_guarded(order, &mut visited).await
    }

    /// True when `order` feeds a different main order.
    pub async fn is_sub_order(
        &self,
        order: &production_order::Model,
    ) -> Result<bool, ServiceError> {
        Ok(self.resolve(order).await?.id != order.id)
    }

    /// One resolution pass. The visited set bounds the origin chase in
    /// signal 1: revisiting an order ends the chase at the current candidate.
    #[async_recursion]
    async fn resolve_guarded(
        &self,
        order: &production_order::Model,
        visited: &mut HashSet<i64>,
    ) -> Result<production_order::Model, ServiceError> {
        // Signal 1: origin naming another order, chased transitively while
        // the candidate's own origin points somewhere else.
        if let Some(origin) = trimmed(&order.origin) {
            if let Some(candidate) = self.find_by_name(origin).await? {
                let chained = trimmed(&candidate.origin)
                    .map(|candidate_origin| candidate_origin != origin)
                    .unwrap_or(false);
                if chained && visited.insert(candidate.id) {
                    debug!(
                        "Origin of {} chains through {}, chasing",
                        order.name, candidate.name
                    );
                    return self.resolve_guarded(&candidate, visited).await;
                }
                return Ok(candidate);
            }
        }

        if let Some(found) = self.by_procurement_group(order).await? {
            return Ok(found);
        }
        if let Some(found) = self.by_move_destinations(order).await? {
            return Ok(found);
        }
        if let Some(found) = self.by_name_pattern(order).await? {
            return Ok(found);
        }
        if let Some(found) = self.by_shared_origin(order).await? {
            return Ok(found);
        }

        debug!("No parent signal for {}, it is its own main order", order.name);
        Ok(order.clone())
    }

    async fn find_by_name(
        &self,
        name: &str,
    ) -> Result<Option<production_order::Model>, ServiceError> {
        ProductionOrderEntity::find()
            .filter(production_order::Column::Name.eq(name))
            .order_by_asc(production_order::Column::Id)
            .one(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))
    }

    /// Signal 2: another order in the same procurement group whose origin is
    /// absent or does not reference an order.
    async fn by_procurement_group(
        &self,
        order: &production_order::Model,
    ) -> Result<Option<production_order::Model>, ServiceError> {
        let Some(group_id) = order.procurement_group_id else {
            return Ok(None);
        };

        let siblings = ProductionOrderEntity::find()
            .filter(production_order::Column::ProcurementGroupId.eq(group_id))
            .filter(production_order::Column::Id.ne(order.id))
            .order_by_asc(production_order::Column::Id)
            .all(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?;

        for sibling in siblings {
            match trimmed(&sibling.origin) {
                None => return Ok(Some(sibling)),
                Some(origin) if !origin.starts_with(ORDER_REF_PREFIX) => {
                    return Ok(Some(sibling))
                }
                Some(_) => {}
            }
        }

        Ok(None)
    }

    /// Signal 3: follow finished-goods moves to the order consuming their
    /// destination moves. Only destination orders without an origin qualify.
    async fn by_move_destinations(
        &self,
        order: &production_order::Model,
    ) -> Result<Option<production_order::Model>, ServiceError> {
        let finished_moves = StockMoveEntity::find()
            .filter(stock_move::Column::ProductionOrderId.eq(order.id))
            .filter(stock_move::Column::Finished.eq(true))
            .order_by_asc(stock_move::Column::Id)
            .all(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?;

        for finished_move in finished_moves {
            let links = StockMoveDestEntity::find()
                .filter(stock_move_dest::Column::MoveId.eq(finished_move.id))
                .order_by_asc(stock_move_dest::Column::DestMoveId)
                .all(&*self.db)
                .await
                .map_err(|e| ServiceError::db_error(e))?;

            for link in links {
                let Some(dest_move) = StockMoveEntity::find_by_id(link.dest_move_id)
                    .one(&*self.db)
                    .await
                    .map_err(|e| ServiceError::db_error(e))?
                else {
                    continue;
                };
                let Some(dest_order_id) = dest_move.production_order_id else {
                    continue;
                };
                if dest_order_id == order.id {
                    continue;
                }
                let Some(dest_order) = ProductionOrderEntity::find_by_id(dest_order_id)
                    .one(&*self.db)
                    .await
                    .map_err(|e| ServiceError::db_error(e))?
                else {
                    continue;
                };
                if trimmed(&dest_order.origin).is_none() {
                    return Ok(Some(dest_order));
                }
            }
        }

        Ok(None)
    }

    /// Signal 4: `X-100-2` style names decompose to the parent `X-100` when
    /// the name has at least three hyphen-separated segments.
    async fn by_name_pattern(
        &self,
        order: &production_order::Model,
    ) -> Result<Option<production_order::Model>, ServiceError> {
        let segments: Vec<&str> = order.name.split('-').collect();
        if segments.len() < MIN_NAME_SEGMENTS {
            return Ok(None);
        }

        let parent_name = segments[..segments.len() - 1].join("-");
        match self.find_by_name(&parent_name).await? {
            Some(parent) if parent.id != order.id => Ok(Some(parent)),
            _ => Ok(None),
        }
    }

    /// Signal 5: first same-origin sibling created no later than `order`.
    /// First match in iteration order, not a true minimum.
    async fn by_shared_origin(
        &self,
        order: &production_order::Model,
    ) -> Result<Option<production_order::Model>, ServiceError> {
        let Some(origin) = trimmed(&order.origin) else {
            return Ok(None);
        };
        if origin.starts_with(ORDER_REF_PREFIX) {
            return Ok(None);
        }

        let siblings = ProductionOrderEntity::find()
            .filter(production_order::Column::Origin.eq(origin))
            .filter(production_order::Column::Id.ne(order.id))
            .order_by_asc(production_order::Column::Id)
            .all(&*self.db)
            .await
            .map_err(|e| ServiceError::db_error(e))?;

        Ok(siblings
            .into_iter()
            .find(|sibling| sibling.created_at <= order.created_at))
    }
}

/// Some(trimmed) when the optional text has non-whitespace content.
fn trimmed(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trimmed_filters_blank_values() {
        assert_eq!(trimmed(&None), None);
        assert_eq!(trimmed(&Some("".to_string())), None);
        assert_eq!(trimmed(&Some("   ".to_string())), None);
        assert_eq!(trimmed(&Some("  SO-001 ".to_string())), Some("SO-001"));
    }
}
