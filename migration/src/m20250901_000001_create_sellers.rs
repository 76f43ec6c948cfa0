use sea_orm_migration::prelude::*;

/// Seller registry as seen by the order core.
///
/// Registration, KYC uploads and approval live outside this service; the table is
/// created here so a fresh database is usable. The bank columns are optional from the
/// core's point of view: deployments that predate them keep working, the payout
/// release path simply refuses to pay sellers whose bank details cannot be read.
#[derive(DeriveIden)]
enum Sellers {
    Table,
    Id,
    StoreName,
    Status,
    BankHolder,
    BankAccount,
    BankIfsc,
    CreatedAt,
}

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Sellers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Sellers::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Sellers::StoreName).string_len(255).not_null())
                    // PENDING / APPROVED / REJECTED / BLOCKED
                    .col(
                        ColumnDef::new(Sellers::Status)
                            .string_len(20)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(Sellers::BankHolder).string_len(255).null())
                    .col(ColumnDef::new(Sellers::BankAccount).string_len(32).null())
                    .col(ColumnDef::new(Sellers::BankIfsc).string_len(16).null())
                    .col(
                        ColumnDef::new(Sellers::CreatedAt)
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
            .drop_table(Table::drop().table(Sellers::Table).to_owned())
            .await
    }
}
