use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::ActorRole;

#[derive(
    Debug,
    Clone,
    Copy,
    Hash,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    ToSchema,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(24))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[sea_orm(string_value = "PLACED")]
    Placed,
    #[sea_orm(string_value = "CONFIRMED")]
    Confirmed,
    #[sea_orm(string_value = "PACKED")]
    Packed,
    #[sea_orm(string_value = "OUT_FOR_DELIVERY")]
    OutForDelivery,
    #[sea_orm(string_value = "DELIVERED")]
    Delivered,
    #[sea_orm(string_value = "REJECTED")]
    Rejected,
    #[sea_orm(string_value = "CANCELLED")]
    Cancelled,
}

impl OrderStatus {
    /// Main chain, in order. REJECTED / CANCELLED are off-chain terminals.
    pub const MAIN_CHAIN: [OrderStatus; 5] = [
        OrderStatus::Placed,
        OrderStatus::Confirmed,
        OrderStatus::Packed,
        OrderStatus::OutForDelivery,
        OrderStatus::Delivered,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Placed => "PLACED",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Packed => "PACKED",
            OrderStatus::OutForDelivery => "OUT_FOR_DELIVERY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Rejected => "REJECTED",
            OrderStatus::Cancelled => "CANCELLED",
        }
    }

    /// Position on the main chain, `None` for REJECTED / CANCELLED.
    pub fn chain_rank(&self) -> Option<usize> {
        Self::MAIN_CHAIN.iter().position(|s| s == self)
    }

    /// DELIVERED, REJECTED and CANCELLED are absorbing.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrderStatus::Delivered | OrderStatus::Rejected | OrderStatus::Cancelled
        )
    }

    /// Terminal states that end the flow early and carry an attribution.
    pub fn is_abandoned(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Cancelled)
    }

    /// Parses canonical tokens plus the spellings legacy rows carry.
    pub fn from_token(raw: &str) -> Option<Self> {
        let token = raw
            .split_whitespace()
            .collect::<Vec<_>>()
            .join("_")
            .to_ascii_uppercase()
            .replace('-', "_");
        match token.as_str() {
            "PLACED" => Some(OrderStatus::Placed),
            "CONFIRMED" | "ACCEPTED" => Some(OrderStatus::Confirmed),
            "PACKED" => Some(OrderStatus::Packed),
            "OUT_FOR_DELIVERY" | "OUT_FOR_DELIVER" => Some(OrderStatus::OutForDelivery),
            "DELIVERED" | "DELIVERED_BY_RIDER" | "COMPLETED" => Some(OrderStatus::Delivered),
            "REJECTED" => Some(OrderStatus::Rejected),
            "CANCELLED" | "CANCELED" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[sea_orm(string_value = "COD")]
    Cod,
    #[sea_orm(string_value = "ONLINE")]
    Online,
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, ToSchema, DeriveActiveEnum, EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "INITIATED")]
    Initiated,
    #[sea_orm(string_value = "PAID")]
    Paid,
}

/// 订单实体
/// - cart 为下单时的快照，之后商品改价不影响历史订单
/// - total_amount 单位为 paise，创建后不再根据 cart 重算
/// - attribution_* 仅在 REJECTED / CANCELLED 时写入，其余状态为 NULL
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub seller_id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub cart: Json,
    pub total_amount: i64,
    pub status: OrderStatus,
    pub previous_status: Option<OrderStatus>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub attribution_actor: Option<ActorRole>,
    pub attribution_reason: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    /// 结算发放时间，NULL 表示尚未结算
    pub payout_released_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order_events::Entity")]
    Events,
}

impl Related<super::order_events::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Events.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
