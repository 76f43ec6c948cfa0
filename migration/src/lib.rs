pub use sea_orm_migration::prelude::*;

mod m20250901_000001_create_sellers;
mod m20250901_000002_create_orders;
mod m20250901_000003_create_commission_and_payouts;
mod m20250901_000004_create_audit_logs;
mod m20250915_000005_add_payout_tracking;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250901_000001_create_sellers::Migration),
            Box::new(m20250901_000002_create_orders::Migration),
            Box::new(m20250901_000003_create_commission_and_payouts::Migration),
            Box::new(m20250901_000004_create_audit_logs::Migration),
            Box::new(m20250915_000005_add_payout_tracking::Migration),
        ]
    }
}
