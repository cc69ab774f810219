use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240101_000001_create_customers_table::Migration),
            Box::new(m20240101_000002_create_tracking_items_table::Migration),
            Box::new(m20240101_000003_create_tracking_history_table::Migration),
            Box::new(m20240101_000004_create_activity_logs_table::Migration),
        ]
    }
}

// Migration implementations

mod m20240101_000001_create_customers_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000001_create_customers_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Customers::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Customers::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(Customers::UserId).string().not_null())
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(ColumnDef::new(Customers::Email).string().not_null())
                        .col(ColumnDef::new(Customers::Phone).string().null())
                        .col(ColumnDef::new(Customers::CreatedAt).timestamp().not_null())
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_customers_user_id")
                        .table(Customers::Table)
                        .col(Customers::UserId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Customers {
        Table,
        Id,
        UserId,
        Name,
        Email,
        Phone,
        CreatedAt,
    }
}

mod m20240101_000002_create_tracking_items_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000001_create_customers_table::Customers;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000002_create_tracking_items_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TrackingItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TrackingItems::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(TrackingItems::TrackingNumber)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TrackingItems::CustomerId).big_integer().null())
                        .col(
                            ColumnDef::new(TrackingItems::CustomerName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TrackingItems::CustomerEmail)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TrackingItems::ProductName).string().null())
                        .col(
                            ColumnDef::new(TrackingItems::ProductQuantity)
                                .integer()
                                .not_null()
                                .default(1),
                        )
                        .col(ColumnDef::new(TrackingItems::StatusTitle).string().not_null())
                        .col(ColumnDef::new(TrackingItems::Status).string().not_null())
                        .col(
                            ColumnDef::new(TrackingItems::CurrentLocation)
                                .string()
                                .null(),
                        )
                        .col(ColumnDef::new(TrackingItems::ExpectedDate).date().null())
                        .col(
                            ColumnDef::new(TrackingItems::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TrackingItems::UpdatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tracking_items_customer")
                                .from(TrackingItems::Table, TrackingItems::CustomerId)
                                .to(Customers::Table, Customers::Id)
                                .on_delete(ForeignKeyAction::SetNull),
                        )
                        .to_owned(),
                )
                .await?;

            // One tracking item per tracking number, ever.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_tracking_items_tracking_number")
                        .table(TrackingItems::Table)
                        .col(TrackingItems::TrackingNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tracking_items_customer_id")
                        .table(TrackingItems::Table)
                        .col(TrackingItems::CustomerId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TrackingItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum TrackingItems {
        Table,
        Id,
        TrackingNumber,
        CustomerId,
        CustomerName,
        CustomerEmail,
        ProductName,
        ProductQuantity,
        StatusTitle,
        Status,
        CurrentLocation,
        ExpectedDate,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240101_000003_create_tracking_history_table {

    use sea_orm_migration::prelude::*;

    use super::m20240101_000002_create_tracking_items_table::TrackingItems;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000003_create_tracking_history_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TrackingHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(TrackingHistory::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(
                            ColumnDef::new(TrackingHistory::TrackingItemId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TrackingHistory::StatusTitle)
                                .string()
                                .not_null(),
                        )
                        .col(ColumnDef::new(TrackingHistory::Status).string().not_null())
                        .col(ColumnDef::new(TrackingHistory::Location).string().null())
                        .col(
                            ColumnDef::new(TrackingHistory::Description)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(TrackingHistory::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_tracking_history_item")
                                .from(TrackingHistory::Table, TrackingHistory::TrackingItemId)
                                .to(TrackingItems::Table, TrackingItems::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_tracking_history_item_id")
                        .table(TrackingHistory::Table)
                        .col(TrackingHistory::TrackingItemId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(TrackingHistory::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TrackingHistory {
        Table,
        Id,
        TrackingItemId,
        StatusTitle,
        Status,
        Location,
        Description,
        CreatedAt,
    }
}

mod m20240101_000004_create_activity_logs_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240101_000004_create_activity_logs_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ActivityLogs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ActivityLogs::Id)
                                .big_integer()
                                .not_null()
                                .auto_increment()
                                .primary_key(),
                        )
                        .col(ColumnDef::new(ActivityLogs::UserType).string().not_null())
                        .col(
                            ColumnDef::new(ActivityLogs::UserId)
                                .big_integer()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ActivityLogs::Action).string().not_null())
                        .col(ColumnDef::new(ActivityLogs::Description).string().null())
                        .col(ColumnDef::new(ActivityLogs::IpAddress).string().not_null())
                        .col(
                            ColumnDef::new(ActivityLogs::CreatedAt)
                                .timestamp()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_activity_logs_created_at")
                        .table(ActivityLogs::Table)
                        .col(ActivityLogs::CreatedAt)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(ActivityLogs::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ActivityLogs {
        Table,
        Id,
        UserType,
        UserId,
        Action,
        Description,
        IpAddress,
        CreatedAt,
    }
}
