use sea_orm_migration::prelude::*;

#[derive(DeriveIden)]
enum SellerCommissions {
    Table,
    SellerId,
    PercentBp,
    UpdatedAt,
}

/// Process-wide singleton row (id = 1)
#[derive(DeriveIden)]
enum GlobalCommissionSettings {
    Table,
    Id,
    Enabled,
    PercentBp,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum SellerPayouts {
    Table,
    SellerId,
    LastPaidAt,
    UpdatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

/// 百分比使用 basis points 存储，100% = 10000bp
#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(SellerCommissions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SellerCommissions::SellerId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SellerCommissions::PercentBp)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SellerCommissions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GlobalCommissionSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GlobalCommissionSettings::Id)
                            .integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(GlobalCommissionSettings::Enabled)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(GlobalCommissionSettings::PercentBp)
                            .integer()
                            .not_null()
                            .default(1000),
                    )
                    .col(
                        ColumnDef::new(GlobalCommissionSettings::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(SellerPayouts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(SellerPayouts::SellerId)
                            .big_integer()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(SellerPayouts::LastPaidAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(SellerPayouts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(SellerPayouts::Table).to_owned())
            .await?;
        manager
            .drop_table(
                Table::drop()
                    .table(GlobalCommissionSettings::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(SellerCommissions::Table).to_owned())
            .await
    }
}
