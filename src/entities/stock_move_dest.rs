use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Junction row linking a stock move to one of its destination moves. A
/// finished-goods move of a sub-assembly order points at the consuming
/// order's move through this table.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_move_dests")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub move_id: i64,
    #[sea_orm(primary_key, auto_increment = false)]
    pub dest_move_id: i64,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock_move::Entity",
        from = "Column::MoveId",
        to = "super::stock_move::Column::Id"
    )]
    SourceMove,
    #[sea_orm(
        belongs_to = "super::stock_move::Entity",
        from = "Column::DestMoveId",
        to = "super::stock_move::Column::Id"
    )]
    DestMove,
}

impl ActiveModelBehavior for ActiveModel {}
