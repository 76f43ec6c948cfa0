use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Per-seller commission override. Absence means the global setting applies.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "seller_commissions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub seller_id: i64,
    /// basis points, 100% = 10000
    pub percent_bp: i32,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
