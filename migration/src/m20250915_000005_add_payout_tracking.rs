use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum Orders {
    Table,
    SellerId,
    PayoutReleasedAt,
}

#[derive(DeriveIden)]
enum GlobalCommissionSettings {
    Table,
    PayoutCycle,
    MinPayout,
}

/// 已结算订单在旧水位线之前的，视为已发放
const BACKFILL_RELEASED: &str = r#"
UPDATE orders
SET payout_released_at = (
    SELECT p.last_paid_at FROM seller_payouts p WHERE p.seller_id = orders.seller_id
)
WHERE status = 'DELIVERED'
  AND payout_released_at IS NULL
  AND COALESCE(delivered_at, created_at) <= (
    SELECT p.last_paid_at FROM seller_payouts p WHERE p.seller_id = orders.seller_id
  )
"#;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Orders remember the release that paid them; the settings row gains the payout cycle
/// and the minimum payout (paise). SQLite only takes one column per ALTER TABLE.
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(Orders::Table)
                    .add_column(
                        ColumnDef::new(Orders::PayoutReleasedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_orders_seller_payout_released")
                    .table(Orders::Table)
                    .col(Orders::SellerId)
                    .col(Orders::PayoutReleasedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(BACKFILL_RELEASED)
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(GlobalCommissionSettings::Table)
                    .add_column(
                        ColumnDef::new(GlobalCommissionSettings::PayoutCycle)
                            .string_len(16)
                            .not_null()
                            .default("WEEKLY"),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(GlobalCommissionSettings::Table)
                    .add_column(
                        ColumnDef::new(GlobalCommissionSettings::MinPayout)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(GlobalCommissionSettings::Table)
                    .drop_column(GlobalCommissionSettings::MinPayout)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(GlobalCommissionSettings::Table)
                    .drop_column(GlobalCommissionSettings::PayoutCycle)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_orders_seller_payout_released")
                    .table(Orders::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .alter_table(
                Table::alter()
                    .table(Orders::Table)
                    .drop_column(Orders::PayoutReleasedAt)
                    .to_owned(),
            )
            .await
    }
}
