use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_products_table::Migration),
            Box::new(m20240101_000002_create_production_orders_table::Migration),
            Box::new(m20240101_000003_create_stock_moves_table::Migration),
            Box::new(m20240101_000004_create_stock_move_dests_table::Migration),
            Box::new(m20240101_000005_create_work_orders_table::Migration),
            Box::new(m20240101_000006_create_order_notes_table::Migration),
            Box::new(m20240101_000007_create_system_parameters_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Products::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::DefaultCode).string().null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_products_default_code")
                        .table(Products::Table)
                        .col(Products::DefaultCode)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Products {
        Table,
        Id,
        Name,
        DefaultCode,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000002_create_production_orders_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_products_table::Products;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_production_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ProductionOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ProductionOrders::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ProductionOrders::Name).string().not_null())
                        .col(ColumnDef::new(ProductionOrders::Origin).string().null())
                        .col(
                            ColumnDef::new(ProductionOrders::ProcurementGroupId)
                                .big_integer()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::ProductId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(ProductionOrders::State).string().not_null())
                        .col(
                            ColumnDef::new(ProductionOrders::Quantity)
                                .decimal()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::DateStart)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::DateFinished)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ProductionOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_production_orders_product_id")
                                .from(ProductionOrders::Table, ProductionOrders::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::SetNull)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .unique()
                        .name("idx_production_orders_name")
                        .table(ProductionOrders::Table)
                        .col(ProductionOrders::Name)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_orders_origin")
                        .table(ProductionOrders::Table)
                        .col(ProductionOrders::Origin)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_production_orders_procurement_group_id")
                        .table(ProductionOrders::Table)
                        .col(ProductionOrders::ProcurementGroupId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ProductionOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum ProductionOrders {
        Table,
        Id,
        Name,
        Origin,
        ProcurementGroupId,
        ProductId,
        State,
        Quantity,
        DateStart,
        DateFinished,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_stock_moves_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000002_create_production_orders_table::ProductionOrders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_stock_moves_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMoves::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMoves::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(StockMoves::ProductionOrderId)
                                .big_integer()
                                .null(),
                        )
                        .col(ColumnDef::new(StockMoves::ProductId).big_integer().null())
                        .col(
                            ColumnDef::new(StockMoves::Quantity)
                                .decimal()
                                .not_null()
                                .default(1),
                        )
                        .col(
                            ColumnDef::new(StockMoves::Finished)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(StockMoves::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_moves_production_order_id")
                                .from(StockMoves::Table, StockMoves::ProductionOrderId)
                                .to(ProductionOrders::Table, ProductionOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_moves_production_order_id")
                        .table(StockMoves::Table)
                        .col(StockMoves::ProductionOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMoves::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockMoves {
        Table,
        Id,
        ProductionOrderId,
        ProductId,
        Quantity,
        Finished,
        CreatedAt,
    }
}

mod m20240101_000004_create_stock_move_dests_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000003_create_stock_moves_table::StockMoves;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_stock_move_dests_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockMoveDests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockMoveDests::MoveId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockMoveDests::DestMoveId)
                                .big_integer()
                                .not_null(),
                        )
                        .primary_key(
                            Index::create()
                                .col(StockMoveDests::MoveId)
                                .col(StockMoveDests::DestMoveId),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_move_dests_move_id")
                                .from(StockMoveDests::Table, StockMoveDests::MoveId)
                                .to(StockMoves::Table, StockMoves::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_move_dests_dest_move_id")
                                .from(StockMoveDests::Table, StockMoveDests::DestMoveId)
                                .to(StockMoves::Table, StockMoves::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_move_dests_move_id")
                        .table(StockMoveDests::Table)
                        .col(StockMoveDests::MoveId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockMoveDests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum StockMoveDests {
        Table,
        MoveId,
        DestMoveId,
    }
}

mod m20240101_000005_create_work_orders_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000002_create_production_orders_table::ProductionOrders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000005_create_work_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(WorkOrders::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(WorkOrders::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::ProductionOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(WorkOrders::Name).string().not_null())
                        .col(ColumnDef::new(WorkOrders::Workcenter).string().null())
                        .col(ColumnDef::new(WorkOrders::State).string().not_null())
                        .col(
                            ColumnDef::new(WorkOrders::DateStart)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::DateFinished)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(WorkOrders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_work_orders_production_order_id")
                                .from(WorkOrders::Table, WorkOrders::ProductionOrderId)
                                .to(ProductionOrders::Table, ProductionOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_orders_production_order_id")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::ProductionOrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_work_orders_state")
                        .table(WorkOrders::Table)
                        .col(WorkOrders::State)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(WorkOrders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum WorkOrders {
        Table,
        Id,
        ProductionOrderId,
        Name,
        Workcenter,
        State,
        DateStart,
        DateFinished,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000006_create_order_notes_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000002_create_production_orders_table::ProductionOrders;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000006_create_order_notes_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderNotes::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderNotes::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(OrderNotes::ProductionOrderId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderNotes::Subject).string().null())
                        .col(ColumnDef::new(OrderNotes::Body).text().not_null())
                        .col(ColumnDef::new(OrderNotes::NoteType).string().not_null())
                        .col(
                            ColumnDef::new(OrderNotes::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_notes_production_order_id")
                                .from(OrderNotes::Table, OrderNotes::ProductionOrderId)
                                .to(ProductionOrders::Table, ProductionOrders::Id)
                                .on_delete(ForeignKeyAction::Cascade)
                                .on_update(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_notes_production_order_id")
                        .table(OrderNotes::Table)
                        .col(OrderNotes::ProductionOrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderNotes::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum OrderNotes {
        Table,
        Id,
        ProductionOrderId,
        Subject,
        Body,
        NoteType,
        CreatedAt,
    }
}

mod m20240101_000007_create_system_parameters_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000007_create_system_parameters_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(SystemParameters::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SystemParameters::Key)
                                .string()
                                .not_null()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(SystemParameters::Value).text().not_null())
                        .col(
                            ColumnDef::new(SystemParameters::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SystemParameters::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SystemParameters::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum SystemParameters {
        Table,
        Key,
        Value,
        CreatedAt,
        UpdatedAt,
    }
}
