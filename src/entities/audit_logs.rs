use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ActorRole;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(40))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditAction {
    #[sea_orm(string_value = "ORDER_CREATED")]
    OrderCreated,
    #[sea_orm(string_value = "ORDER_STATUS_CHANGED")]
    OrderStatusChanged,
    #[sea_orm(string_value = "ORDER_IMPORTED")]
    OrderImported,
    #[sea_orm(string_value = "SELLER_COMMISSION_SET")]
    SellerCommissionSet,
    #[sea_orm(string_value = "SELLER_COMMISSION_CLEARED")]
    SellerCommissionCleared,
    #[sea_orm(string_value = "GLOBAL_COMMISSION_SET")]
    GlobalCommissionSet,
    #[sea_orm(string_value = "PAYOUT_SETTINGS_SET")]
    PayoutSettingsSet,
    #[sea_orm(string_value = "PAYOUT_RELEASED")]
    PayoutReleased,
    #[sea_orm(string_value = "SCHEMA_REFRESHED")]
    SchemaRefreshed,
}

pub const SUBJECT_ORDER: &str = "ORDER";
pub const SUBJECT_SELLER: &str = "SELLER";
pub const SUBJECT_SETTINGS: &str = "SETTINGS";

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "audit_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub actor_role: Option<ActorRole>,
    pub actor_id: Option<i64>,
    pub action: AuditAction,
    pub subject_type: String,
    pub subject_id: i64,
    #[sea_orm(column_type = "Json", nullable)]
    pub detail: Option<Json>,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
