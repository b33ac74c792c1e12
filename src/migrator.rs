use sea_orm_migration::prelude::*;

/// Money columns. SQLite rejects a declared precision above 16.
const MONEY_PRECISION: u32 = 16;
const MONEY_SCALE: u32 = 4;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240601_000001_create_catalog_tables::Migration),
            Box::new(m20240601_000002_create_customer_tables::Migration),
            Box::new(m20240601_000003_create_order_tables::Migration),
            Box::new(m20240601_000004_create_access_tables::Migration),
            Box::new(m20240601_000005_create_store_config_tables::Migration),
            Box::new(m20240601_000006_create_support_tables::Migration),
            Box::new(m20240601_000007_create_payment_records_table::Migration),
        ]
    }
}

mod m20240601_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    use super::{MONEY_PRECISION, MONEY_SCALE};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000001_create_catalog_tables"
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
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(
                            ColumnDef::new(Products::Slug)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Products::Description).text().null())
                        .col(
                            ColumnDef::new(Products::Sku)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(Products::Price)
                                .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::Stock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Products::Category).string().null())
                        .col(ColumnDef::new(Products::ImageUrl).string().null())
                        .col(
                            ColumnDef::new(Products::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
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
                        .name("idx_products_category")
                        .table(Products::Table)
                        .col(Products::Category)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Reviews::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Reviews::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Reviews::ProductId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Reviews::Rating).integer().not_null())
                        .col(ColumnDef::new(Reviews::Title).string().null())
                        .col(ColumnDef::new(Reviews::Comment).text().null())
                        .col(
                            ColumnDef::new(Reviews::IsApproved)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(Reviews::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Reviews::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_reviews_product_id")
                                .from(Reviews::Table, Reviews::ProductId)
                                .to(Products::Table, Products::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_reviews_product_id")
                        .table(Reviews::Table)
                        .col(Reviews::ProductId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Reviews::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Products {
        Table,
        Id,
        Name,
        Slug,
        Description,
        Sku,
        Price,
        Stock,
        Category,
        ImageUrl,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Reviews {
        Table,
        Id,
        ProductId,
        CustomerId,
        Rating,
        Title,
        Comment,
        IsApproved,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000002_create_customer_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000002_create_customer_tables"
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
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Customers::Name).string().not_null())
                        .col(
                            ColumnDef::new(Customers::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Customers::Phone).string().null())
                        .col(ColumnDef::new(Customers::PasswordHash).string().null())
                        .col(ColumnDef::new(Customers::AddressLine).string().null())
                        .col(ColumnDef::new(Customers::City).string().null())
                        .col(ColumnDef::new(Customers::State).string().null())
                        .col(ColumnDef::new(Customers::PostalCode).string().null())
                        .col(ColumnDef::new(Customers::Country).string().null())
                        .col(
                            ColumnDef::new(Customers::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Customers::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CartItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartItems::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(CartItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartItems::UpdatedAt)
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
                        .name("idx_cart_items_customer_product")
                        .table(CartItems::Table)
                        .col(CartItems::CustomerId)
                        .col(CartItems::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Likes::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Likes::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Likes::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Likes::ProductId).uuid().not_null())
                        .col(
                            ColumnDef::new(Likes::CreatedAt)
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
                        .name("idx_likes_customer_product")
                        .table(Likes::Table)
                        .col(Likes::CustomerId)
                        .col(Likes::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Likes::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Customers::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Customers {
        Table,
        Id,
        Name,
        Email,
        Phone,
        PasswordHash,
        AddressLine,
        City,
        State,
        PostalCode,
        Country,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        CustomerId,
        ProductId,
        Quantity,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Likes {
        Table,
        Id,
        CustomerId,
        ProductId,
        CreatedAt,
    }
}

mod m20240601_000003_create_order_tables {
    use sea_orm_migration::prelude::*;

    use super::{MONEY_PRECISION, MONEY_SCALE};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000003_create_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Orders::PaymentStatus)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::Subtotal)
                                .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TaxRate)
                                .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::TaxAmount)
                                .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Orders::NetTotal)
                                .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Currency).string_len(3).not_null())
                        .col(ColumnDef::new(Orders::ShippingAddress).string().null())
                        .col(ColumnDef::new(Orders::Notes).text().null())
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
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
                        .name("idx_orders_customer_id")
                        .table(Orders::Table)
                        .col(Orders::CustomerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderItems::OrderId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(OrderItems::ProductName).string().not_null())
                        .col(ColumnDef::new(OrderItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(OrderItems::UnitPrice)
                                .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::LineTotal)
                                .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_items_order_id")
                                .from(OrderItems::Table, OrderItems::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_items_order_id")
                        .table(OrderItems::Table)
                        .col(OrderItems::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Invoices::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Invoices::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Invoices::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(Invoices::InvoiceNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Invoices::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Invoices::ProductSummary).text().not_null())
                        .col(
                            ColumnDef::new(Invoices::Amount)
                                .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                                .not_null(),
                        )
                        .col(ColumnDef::new(Invoices::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Invoices::IssuedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::DueDate)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Invoices::UpdatedAt)
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
                        .name("idx_invoices_order_id")
                        .table(Invoices::Table)
                        .col(Invoices::OrderId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(DeliveryTracking::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(DeliveryTracking::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryTracking::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(DeliveryTracking::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(DeliveryTracking::Carrier).string().null())
                        .col(
                            ColumnDef::new(DeliveryTracking::TrackingNumber)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryTracking::EstimatedDelivery)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(ColumnDef::new(DeliveryTracking::Notes).text().null())
                        .col(
                            ColumnDef::new(DeliveryTracking::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(DeliveryTracking::UpdatedAt)
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
                        .name("idx_delivery_tracking_order_id")
                        .table(DeliveryTracking::Table)
                        .col(DeliveryTracking::OrderId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(DeliveryTracking::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Invoices::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(OrderItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        OrderNumber,
        CustomerId,
        Status,
        PaymentStatus,
        Subtotal,
        TaxRate,
        TaxAmount,
        NetTotal,
        Currency,
        ShippingAddress,
        Notes,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderItems {
        Table,
        Id,
        OrderId,
        ProductId,
        ProductName,
        Quantity,
        UnitPrice,
        LineTotal,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum Invoices {
        Table,
        Id,
        OrderId,
        InvoiceNumber,
        CustomerId,
        ProductSummary,
        Amount,
        Status,
        IssuedAt,
        DueDate,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum DeliveryTracking {
        Table,
        Id,
        OrderId,
        Status,
        Carrier,
        TrackingNumber,
        EstimatedDelivery,
        Notes,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000004_create_access_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000004_create_access_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Roles::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Roles::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Roles::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Roles::Description).string().null())
                        .col(
                            ColumnDef::new(Roles::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Roles::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Permissions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Permissions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Permissions::Key)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Permissions::Description).string().null())
                        .col(
                            ColumnDef::new(Permissions::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RolePermissions::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RolePermissions::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RolePermissions::RoleId).uuid().not_null())
                        .col(
                            ColumnDef::new(RolePermissions::PermissionId)
                                .uuid()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_role_permissions_role_id")
                                .from(RolePermissions::Table, RolePermissions::RoleId)
                                .to(Roles::Table, Roles::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_role_permissions_permission_id")
                                .from(RolePermissions::Table, RolePermissions::PermissionId)
                                .to(Permissions::Table, Permissions::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_role_permissions_pair")
                        .table(RolePermissions::Table)
                        .col(RolePermissions::RoleId)
                        .col(RolePermissions::PermissionId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Users::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Users::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Users::Name).string().not_null())
                        .col(
                            ColumnDef::new(Users::Email)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                        .col(ColumnDef::new(Users::RoleId).uuid().null())
                        .col(
                            ColumnDef::new(Users::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Users::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Users::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Users::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(RolePermissions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Permissions::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Roles::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Roles {
        Table,
        Id,
        Name,
        Description,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Permissions {
        Table,
        Id,
        Key,
        Description,
        CreatedAt,
    }

    #[derive(DeriveIden)]
    enum RolePermissions {
        Table,
        Id,
        RoleId,
        PermissionId,
    }

    #[derive(DeriveIden)]
    enum Users {
        Table,
        Id,
        Name,
        Email,
        PasswordHash,
        RoleId,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000005_create_store_config_tables {
    use sea_orm_migration::prelude::*;

    use super::{MONEY_PRECISION, MONEY_SCALE};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000005_create_store_config_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(TaxRules::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(TaxRules::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(TaxRules::State)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(TaxRules::Rate).decimal_len(MONEY_PRECISION, MONEY_SCALE).not_null())
                        .col(ColumnDef::new(TaxRules::Description).string().null())
                        .col(
                            ColumnDef::new(TaxRules::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(TaxRules::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(TaxRules::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Plans::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Plans::Id).uuid().primary_key().not_null())
                        .col(
                            ColumnDef::new(Plans::Name)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Plans::Price).decimal_len(MONEY_PRECISION, MONEY_SCALE).not_null())
                        .col(ColumnDef::new(Plans::BillingCycle).string_len(20).not_null())
                        .col(ColumnDef::new(Plans::Features).json().not_null())
                        .col(
                            ColumnDef::new(Plans::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Plans::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Plans::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(SiteSettings::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(SiteSettings::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(SiteSettings::Key)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(SiteSettings::Value).text().not_null())
                        .col(
                            ColumnDef::new(SiteSettings::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(SiteSettings::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Plans::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(TaxRules::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum TaxRules {
        Table,
        Id,
        State,
        Rate,
        Description,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum Plans {
        Table,
        Id,
        Name,
        Price,
        BillingCycle,
        Features,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum SiteSettings {
        Table,
        Id,
        Key,
        Value,
        UpdatedAt,
    }
}

mod m20240601_000006_create_support_tables {
    use sea_orm_migration::prelude::*;

    use super::{MONEY_PRECISION, MONEY_SCALE};

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000006_create_support_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Complaints::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(Complaints::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Complaints::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(Complaints::OrderId).uuid().null())
                        .col(ColumnDef::new(Complaints::Subject).string().not_null())
                        .col(ColumnDef::new(Complaints::Message).text().not_null())
                        .col(ColumnDef::new(Complaints::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Complaints::Resolution).text().null())
                        .col(
                            ColumnDef::new(Complaints::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Complaints::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(ReturnRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ReturnRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ReturnRequests::OrderId).uuid().not_null())
                        .col(ColumnDef::new(ReturnRequests::OrderItemId).uuid().not_null())
                        .col(ColumnDef::new(ReturnRequests::CustomerId).uuid().not_null())
                        .col(ColumnDef::new(ReturnRequests::Reason).text().not_null())
                        .col(ColumnDef::new(ReturnRequests::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(ReturnRequests::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReturnRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ReturnRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(RefundRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(RefundRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(RefundRequests::OrderId).uuid().not_null())
                        .col(ColumnDef::new(RefundRequests::ReturnRequestId).uuid().null())
                        .col(ColumnDef::new(RefundRequests::CustomerId).uuid().not_null())
                        .col(
                            ColumnDef::new(RefundRequests::Amount)
                                .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                                .not_null(),
                        )
                        .col(ColumnDef::new(RefundRequests::Reason).text().null())
                        .col(
                            ColumnDef::new(RefundRequests::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RefundRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(RefundRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(RefundRequests::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(ReturnRequests::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Complaints::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Complaints {
        Table,
        Id,
        CustomerId,
        OrderId,
        Subject,
        Message,
        Status,
        Resolution,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum ReturnRequests {
        Table,
        Id,
        OrderId,
        OrderItemId,
        CustomerId,
        Reason,
        Quantity,
        Status,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum RefundRequests {
        Table,
        Id,
        OrderId,
        ReturnRequestId,
        CustomerId,
        Amount,
        Reason,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20240601_000007_create_payment_records_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240601_000007_create_payment_records_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(PaymentRecords::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PaymentRecords::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PaymentRecords::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(PaymentRecords::GatewayOrderId)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(
                            ColumnDef::new(PaymentRecords::GatewayPaymentId)
                                .string()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(PaymentRecords::Amount)
                                .big_integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentRecords::Currency)
                                .string_len(3)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentRecords::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentRecords::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PaymentRecords::UpdatedAt)
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
                        .name("idx_payment_records_order_id")
                        .table(PaymentRecords::Table)
                        .col(PaymentRecords::OrderId)
                        .to_owned(),
                )
                .await?;

            Ok(())
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PaymentRecords::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum PaymentRecords {
        Table,
        Id,
        OrderId,
        GatewayOrderId,
        GatewayPaymentId,
        Amount,
        Currency,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{establish_connection_with_config, DbConfig};
    use crate::entities::product;
    use rust_decimal_macros::dec;
    use sea_orm::{ActiveModelTrait, EntityTrait, Set};
    use uuid::Uuid;

    #[test]
    fn money_columns_render_for_every_backend() {
        let stmt = Table::create()
            .table(Alias::new("prices"))
            .col(
                ColumnDef::new(Alias::new("amount"))
                    .decimal_len(MONEY_PRECISION, MONEY_SCALE)
                    .not_null(),
            )
            .to_owned();

        assert!(stmt.to_string(SqliteQueryBuilder).contains("(16, 4)"));
        assert!(stmt.to_string(PostgresQueryBuilder).contains("(16, 4)"));
    }

    #[tokio::test]
    async fn migrated_sqlite_schema_keeps_four_decimal_places() {
        let db = establish_connection_with_config(&DbConfig::in_memory())
            .await
            .expect("in-memory database");
        Migrator::up(&db, None).await.expect("migrations");

        let id = Uuid::new_v4();
        product::ActiveModel {
            id: Set(id),
            name: Set("Scale".to_string()),
            slug: Set("scale".to_string()),
            description: Set(None),
            sku: Set("SCALE-1".to_string()),
            price: Set(dec!(1234.5678)),
            stock: Set(1),
            category: Set(None),
            image_url: Set(None),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(&db)
        .await
        .expect("insert product");

        let stored = product::Entity::find_by_id(id)
            .one(&db)
            .await
            .expect("query")
            .expect("row");
        assert_eq!(stored.price, dec!(1234.5678));
    }
}
