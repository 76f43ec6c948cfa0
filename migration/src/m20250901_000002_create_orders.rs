use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Orders {
    Table,
    Id,
    SellerId,
    CustomerId,
    CustomerName,
    Phone,
    Address,
    Pincode,
    Cart,
    TotalAmount,
    Status,
    PreviousStatus,
    PaymentMethod,
    PaymentStatus,
    PaymentId,
    AttributionActor,
    AttributionReason,
    DeliveredAt,
    CreatedAt,
    UpdatedAt,
}

/// Append-only status facts, one row per status change.
#[derive(DeriveIden)]
enum OrderEvents {
    Table,
    Id,
    OrderId,
    FromStatus,
    ToStatus,
    Actor,
    ActorId,
    Reason,
    OccurredAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Orders::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Orders::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Orders::SellerId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::CustomerId).big_integer().not_null())
                    .col(ColumnDef::new(Orders::CustomerName).string_len(255).null())
                    .col(ColumnDef::new(Orders::Phone).string_len(32).null())
                    .col(ColumnDef::new(Orders::Address).text().null())
                    .col(ColumnDef::new(Orders::Pincode).string_len(12).null())
                    .col(ColumnDef::new(Orders::Cart).json().not_null())
                    // 金额统一以 paise 存储
                    .col(ColumnDef::new(Orders::TotalAmount).big_integer().not_null())
                    .col(ColumnDef::new(Orders::Status).string_len(24).not_null())
                    .col(ColumnDef::new(Orders::PreviousStatus).string_len(24).null())
                    .col(
                        ColumnDef::new(Orders::PaymentMethod)
                            .string_len(16)
                            .not_null()
                            .default("COD"),
                    )
                    .col(
                        ColumnDef::new(Orders::PaymentStatus)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Orders::PaymentId).string_len(64).null())
                    .col(ColumnDef::new(Orders::AttributionActor).string_len(16).null())
                    .col(ColumnDef::new(Orders::AttributionReason).text().null())
                    .col(
                        ColumnDef::new(Orders::DeliveredAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Orders::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Orders::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_seller_status")
                    .table(Orders::Table)
                    .col(Orders::SellerId)
                    .col(Orders::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_orders_customer")
                    .table(Orders::Table)
                    .col(Orders::CustomerId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrderEvents::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrderEvents::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrderEvents::OrderId).big_integer().not_null())
                    .col(ColumnDef::new(OrderEvents::FromStatus).string_len(24).null())
                    .col(ColumnDef::new(OrderEvents::ToStatus).string_len(24).not_null())
                    .col(ColumnDef::new(OrderEvents::Actor).string_len(16).null())
                    .col(ColumnDef::new(OrderEvents::ActorId).big_integer().null())
                    .col(ColumnDef::new(OrderEvents::Reason).text().null())
                    .col(
                        ColumnDef::new(OrderEvents::OccurredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_order_events_order")
                            .from(OrderEvents::Table, OrderEvents::OrderId)
                            .to(Orders::Table, Orders::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_order_events_order")
                    .table(OrderEvents::Table)
                    .col(OrderEvents::OrderId)
                    .col(OrderEvents::OccurredAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(OrderEvents::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Orders::Table).to_owned())
            .await
    }
}
