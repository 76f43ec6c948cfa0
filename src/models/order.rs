use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::domain::attribution::{Attribution, AttributionSource, ResolvedAttribution};
use crate::domain::timeline::{Timeline, TimelineRow, step_label};
use crate::entities::{
    ActorRole, OrderStatus, PaymentMethod, PaymentStatus, order_entity, order_event_entity,
};
use crate::utils::paise_to_decimal;

/// One cart line, frozen into the order at creation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub product_id: i64,
    pub name: String,
    #[schema(value_type = String, example = "49.50")]
    pub unit_price: Decimal,
    pub quantity: u32,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub seller_id: i64,
    pub cart: Vec<CartItem>,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    pub payment_id: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    /// Target status; legacy spellings such as `CANCELED` are accepted
    #[schema(example = "CANCELLED")]
    pub status: String,
    /// Must match the caller's token role when present
    pub actor_role: Option<ActorRole>,
    pub reason: Option<String>,
    /// Optimistic precondition: the status the caller last saw
    pub expected_status: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct OrderQuery {
    pub customer_id: Option<i64>,
    pub seller_id: Option<i64>,
    #[param(value_type = Option<String>)]
    pub status: Option<OrderStatus>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DataQualityFlag {
    /// Terminal order with no actor in either the row or its events
    AttributionUnresolvable,
    /// Terminal order whose stop point had to be assumed
    PreviousStatusMissing,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AttributionResponse {
    pub actor: Option<ActorRole>,
    pub reason: Option<String>,
    pub resolved: bool,
    pub source: AttributionSource,
}

impl From<&ResolvedAttribution> for AttributionResponse {
    fn from(r: &ResolvedAttribution) -> Self {
        Self {
            actor: r.attribution.actor,
            reason: r.attribution.reason.clone(),
            resolved: r.is_resolved(),
            source: r.source,
        }
    }
}

/// Strict reconstruction result for the admin attribution endpoint.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StrictAttributionResponse {
    pub order_id: i64,
    pub status: OrderStatus,
    pub attribution: Attribution,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderResponse {
    pub id: i64,
    pub seller_id: i64,
    pub customer_id: i64,
    pub customer_name: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub pincode: Option<String>,
    pub cart: Vec<CartItem>,
    #[schema(value_type = String, example = "500.00")]
    pub total_amount: Decimal,
    pub status: OrderStatus,
    /// e.g. `OUT FOR DELIVERY`
    pub display_status: String,
    /// e.g. `CANCELLED BY CUSTOMER`
    pub status_label: String,
    pub previous_status: Option<OrderStatus>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub payment_id: Option<String>,
    pub attribution: AttributionResponse,
    pub timeline: Vec<TimelineRow>,
    pub data_quality: Vec<DataQualityFlag>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub fn status_label(status: OrderStatus, actor: Option<ActorRole>) -> String {
    match (status.is_abandoned(), actor) {
        (true, Some(actor)) => format!("{} BY {}", step_label(status), actor),
        _ => step_label(status).to_string(),
    }
}

impl OrderResponse {
    /// Read projection. `previous_status` is the effective stop point (the stored
    /// column or a value recovered from events).
    pub fn project(
        m: order_entity::Model,
        previous_status: Option<OrderStatus>,
        attribution: &ResolvedAttribution,
    ) -> Self {
        let timeline = Timeline::project(m.status, previous_status, &attribution.attribution);

        let mut data_quality = Vec::new();
        if !attribution.is_resolved() {
            data_quality.push(DataQualityFlag::AttributionUnresolvable);
        }
        if timeline.stop_defaulted() {
            data_quality.push(DataQualityFlag::PreviousStatusMissing);
        }

        // 快照在写入时已校验，解析失败只可能来自手工改库
        let cart = serde_json::from_value::<Vec<CartItem>>(m.cart).unwrap_or_else(|e| {
            log::warn!("Order {} has an unreadable cart snapshot: {e}", m.id);
            Vec::new()
        });

        Self {
            id: m.id,
            seller_id: m.seller_id,
            customer_id: m.customer_id,
            customer_name: m.customer_name,
            phone: m.phone,
            address: m.address,
            pincode: m.pincode,
            cart,
            total_amount: paise_to_decimal(m.total_amount),
            status: m.status,
            display_status: step_label(m.status).to_string(),
            status_label: status_label(m.status, attribution.attribution.actor),
            previous_status,
            payment_method: m.payment_method,
            payment_status: m.payment_status,
            payment_id: m.payment_id,
            attribution: AttributionResponse::from(attribution),
            timeline: timeline.rows().collect(),
            data_quality,
            delivered_at: m.delivered_at,
            created_at: m.created_at,
            updated_at: m.updated_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderEventResponse {
    pub id: i64,
    pub order_id: i64,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub actor: Option<ActorRole>,
    pub actor_id: Option<i64>,
    pub reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl From<order_event_entity::Model> for OrderEventResponse {
    fn from(m: order_event_entity::Model) -> Self {
        Self {
            id: m.id,
            order_id: m.order_id,
            from_status: m.from_status,
            to_status: m.to_status,
            actor: m.actor,
            actor_id: m.actor_id,
            reason: m.reason,
            occurred_at: m.occurred_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_label() {
        assert_eq!(
            status_label(OrderStatus::Cancelled, Some(ActorRole::Customer)),
            "CANCELLED BY CUSTOMER"
        );
        assert_eq!(
            status_label(OrderStatus::Rejected, Some(ActorRole::Seller)),
            "REJECTED BY SELLER"
        );
        assert_eq!(status_label(OrderStatus::Cancelled, None), "CANCELLED");
        assert_eq!(
            status_label(OrderStatus::OutForDelivery, Some(ActorRole::Seller)),
            "OUT FOR DELIVERY"
        );
    }

    #[test]
    fn test_update_request_accepts_camel_case() {
        let req: UpdateStatusRequest = serde_json::from_str(
            r#"{"status":"CANCELLED","actorRole":"CUSTOMER","reason":"x","expectedStatus":"PLACED"}"#,
        )
        .unwrap();
        assert_eq!(req.actor_role, Some(ActorRole::Customer));
        assert_eq!(req.expected_status.as_deref(), Some("PLACED"));
    }
}
