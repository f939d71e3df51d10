use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_catalog_tables::Migration),
            Box::new(m20240301_000002_create_stock_journals_table::Migration),
            Box::new(m20240301_000003_create_cart_and_address_tables::Migration),
            Box::new(m20240301_000004_create_shipment_method_tables::Migration),
            Box::new(m20240301_000005_create_payment_and_order_tables::Migration),
            Box::new(m20240301_000006_create_stock_request_tables::Migration),
        ]
    }
}

mod m20240301_000001_create_catalog_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000001_create_catalog_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Pharmacies::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Pharmacies::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Pharmacies::ManagerId).uuid().not_null())
                        .col(ColumnDef::new(Pharmacies::Name).string().not_null())
                        .col(ColumnDef::new(Pharmacies::Address).string().not_null())
                        .col(ColumnDef::new(Pharmacies::CityId).integer().not_null())
                        .col(ColumnDef::new(Pharmacies::Latitude).double().not_null())
                        .col(ColumnDef::new(Pharmacies::Longitude).double().not_null())
                        .col(
                            ColumnDef::new(Pharmacies::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Pharmacies::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Pharmacies::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_pharmacies_manager_id")
                        .table(Pharmacies::Table)
                        .col(Pharmacies::ManagerId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Drugs::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Drugs::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Drugs::Name).string().not_null())
                        .col(ColumnDef::new(Drugs::Weight).integer().not_null())
                        .col(
                            ColumnDef::new(Drugs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Drugs::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Drugs::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PharmacyDrugs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PharmacyDrugs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(PharmacyDrugs::PharmacyId).uuid().not_null())
                        .col(ColumnDef::new(PharmacyDrugs::DrugId).uuid().not_null())
                        .col(ColumnDef::new(PharmacyDrugs::CategoryId).uuid().null())
                        .col(
                            ColumnDef::new(PharmacyDrugs::Stock)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(PharmacyDrugs::Price).big_integer().not_null())
                        .col(
                            ColumnDef::new(PharmacyDrugs::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(PharmacyDrugs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PharmacyDrugs::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PharmacyDrugs::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pharmacy_drugs_pharmacy_id")
                                .from(PharmacyDrugs::Table, PharmacyDrugs::PharmacyId)
                                .to(Pharmacies::Table, Pharmacies::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pharmacy_drugs_drug_id")
                                .from(PharmacyDrugs::Table, PharmacyDrugs::DrugId)
                                .to(Drugs::Table, Drugs::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("uq_pharmacy_drugs_pharmacy_drug")
                        .table(PharmacyDrugs::Table)
                        .col(PharmacyDrugs::PharmacyId)
                        .col(PharmacyDrugs::DrugId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(PharmacyDrugs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Drugs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Pharmacies::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub(super) enum Pharmacies {
        Table,
        Id,
        ManagerId,
        Name,
        Address,
        CityId,
        Latitude,
        Longitude,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    enum Drugs {
        Table,
        Id,
        Name,
        Weight,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    pub(super) enum PharmacyDrugs {
        Table,
        Id,
        PharmacyId,
        DrugId,
        CategoryId,
        Stock,
        Price,
        IsActive,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240301_000002_create_stock_journals_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000002_create_stock_journals_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockJournals::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockJournals::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockJournals::DrugId).uuid().not_null())
                        .col(ColumnDef::new(StockJournals::PharmacyId).uuid().not_null())
                        .col(ColumnDef::new(StockJournals::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(StockJournals::Description)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockJournals::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockJournals::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockJournals::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            // journals are looked up by the (drug, pharmacy) pair
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_stock_journals_drug_pharmacy")
                        .table(StockJournals::Table)
                        .col(StockJournals::DrugId)
                        .col(StockJournals::PharmacyId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockJournals::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockJournals {
        Table,
        Id,
        DrugId,
        PharmacyId,
        Quantity,
        Description,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240301_000003_create_cart_and_address_tables {
    use super::m20240301_000001_create_catalog_tables::PharmacyDrugs;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000003_create_cart_and_address_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(CartItems::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(CartItems::UserId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::PharmacyDrugId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(CartItems::IsPrescripted)
                                .boolean()
                                .not_null()
                                .default(false),
                        )
                        .col(
                            ColumnDef::new(CartItems::Price)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(CartItems::TotalPrice)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
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
                        .col(
                            ColumnDef::new(CartItems::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_items_pharmacy_drug_id")
                                .from(CartItems::Table, CartItems::PharmacyDrugId)
                                .to(PharmacyDrugs::Table, PharmacyDrugs::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cart_items_user_id")
                        .table(CartItems::Table)
                        .col(CartItems::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(UserAddresses::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(UserAddresses::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(UserAddresses::UserId).uuid().not_null())
                        .col(ColumnDef::new(UserAddresses::Address).string().not_null())
                        .col(ColumnDef::new(UserAddresses::CityId).integer().not_null())
                        .col(ColumnDef::new(UserAddresses::Latitude).double().not_null())
                        .col(ColumnDef::new(UserAddresses::Longitude).double().not_null())
                        .col(
                            ColumnDef::new(UserAddresses::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserAddresses::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(UserAddresses::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(UserAddresses::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        UserId,
        PharmacyDrugId,
        Quantity,
        IsPrescripted,
        Price,
        TotalPrice,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    enum UserAddresses {
        Table,
        Id,
        UserId,
        Address,
        CityId,
        Latitude,
        Longitude,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }
}

mod m20240301_000004_create_shipment_method_tables {
    use super::m20240301_000001_create_catalog_tables::Pharmacies;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000004_create_shipment_method_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(ShipmentMethods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(ShipmentMethods::Id)
                                .integer()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(ShipmentMethods::Name).string().not_null())
                        .col(
                            ColumnDef::new(ShipmentMethods::CourierName)
                                .string()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(ShipmentMethods::PricePerKm)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(ShipmentMethods::EstimatedDays)
                                .integer()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(PharmacyShipmentMethods::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(PharmacyShipmentMethods::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PharmacyShipmentMethods::PharmacyId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(PharmacyShipmentMethods::ShipmentMethodId)
                                .integer()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pharmacy_shipment_methods_pharmacy_id")
                                .from(
                                    PharmacyShipmentMethods::Table,
                                    PharmacyShipmentMethods::PharmacyId,
                                )
                                .to(Pharmacies::Table, Pharmacies::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_pharmacy_shipment_methods_method_id")
                                .from(
                                    PharmacyShipmentMethods::Table,
                                    PharmacyShipmentMethods::ShipmentMethodId,
                                )
                                .to(ShipmentMethods::Table, ShipmentMethods::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(
                    Table::drop()
                        .table(PharmacyShipmentMethods::Table)
                        .to_owned(),
                )
                .await?;
            manager
                .drop_table(Table::drop().table(ShipmentMethods::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum ShipmentMethods {
        Table,
        Id,
        Name,
        CourierName,
        PricePerKm,
        EstimatedDays,
    }

    #[derive(DeriveIden)]
    enum PharmacyShipmentMethods {
        Table,
        Id,
        PharmacyId,
        ShipmentMethodId,
    }
}

mod m20240301_000005_create_payment_and_order_tables {
    use super::m20240301_000001_create_catalog_tables::PharmacyDrugs;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000005_create_payment_and_order_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Payments::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Payments::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Payments::UserId).uuid().not_null())
                        .col(
                            ColumnDef::new(Payments::Number)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Payments::Method).string().not_null())
                        .col(ColumnDef::new(Payments::Proof).string().null())
                        .col(ColumnDef::new(Payments::TotalPrice).big_integer().not_null())
                        .col(ColumnDef::new(Payments::Address).string().not_null())
                        .col(
                            ColumnDef::new(Payments::ExpiredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Payments::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Payments::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::PaymentId).uuid().not_null())
                        .col(ColumnDef::new(Orders::PharmacyId).uuid().not_null())
                        .col(
                            ColumnDef::new(Orders::OrderNumber)
                                .string()
                                .not_null()
                                .unique_key(),
                        )
                        .col(ColumnDef::new(Orders::TotalPrice).big_integer().not_null())
                        .col(
                            ColumnDef::new(Orders::ShipmentPrice)
                                .big_integer()
                                .not_null()
                                .default(0),
                        )
                        .col(ColumnDef::new(Orders::Status).string_len(40).not_null())
                        .col(ColumnDef::new(Orders::ShipmentMethodId).integer().not_null())
                        .col(
                            ColumnDef::new(Orders::FinishedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
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
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_orders_payment_id")
                                .from(Orders::Table, Orders::PaymentId)
                                .to(Payments::Table, Payments::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_payment_id")
                        .table(Orders::Table)
                        .col(Orders::PaymentId)
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
                        .table(OrderDetails::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderDetails::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderDetails::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderDetails::PharmacyDrugId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderDetails::Quantity).integer().not_null())
                        .col(ColumnDef::new(OrderDetails::Price).big_integer().not_null())
                        .col(
                            ColumnDef::new(OrderDetails::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_details_order_id")
                                .from(OrderDetails::Table, OrderDetails::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_details_pharmacy_drug_id")
                                .from(OrderDetails::Table, OrderDetails::PharmacyDrugId)
                                .to(PharmacyDrugs::Table, PharmacyDrugs::Id),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderDetails::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Payments::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Payments {
        Table,
        Id,
        UserId,
        Number,
        Method,
        Proof,
        TotalPrice,
        Address,
        ExpiredAt,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    enum Orders {
        Table,
        Id,
        PaymentId,
        PharmacyId,
        OrderNumber,
        TotalPrice,
        ShipmentPrice,
        Status,
        ShipmentMethodId,
        FinishedAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderDetails {
        Table,
        Id,
        OrderId,
        PharmacyDrugId,
        Quantity,
        Price,
        CreatedAt,
    }
}

mod m20240301_000006_create_stock_request_tables {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20240301_000006_create_stock_request_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(StockRequests::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockRequests::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRequests::SenderPharmacyId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRequests::ReceiverPharmacyId)
                                .uuid()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRequests::Status)
                                .string_len(32)
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRequests::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRequests::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRequests::DeletedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(StockRequestDrugs::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(StockRequestDrugs::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRequestDrugs::StockRequestId)
                                .uuid()
                                .not_null(),
                        )
                        .col(ColumnDef::new(StockRequestDrugs::DrugId).uuid().not_null())
                        .col(
                            ColumnDef::new(StockRequestDrugs::Quantity)
                                .integer()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(StockRequestDrugs::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_stock_request_drugs_request_id")
                                .from(StockRequestDrugs::Table, StockRequestDrugs::StockRequestId)
                                .to(StockRequests::Table, StockRequests::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(StockRequestDrugs::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(StockRequests::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum StockRequests {
        Table,
        Id,
        SenderPharmacyId,
        ReceiverPharmacyId,
        Status,
        CreatedAt,
        UpdatedAt,
        DeletedAt,
    }

    #[derive(DeriveIden)]
    enum StockRequestDrugs {
        Table,
        Id,
        StockRequestId,
        DrugId,
        Quantity,
        CreatedAt,
    }
}
