use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

use super::CartItem;
use crate::domain::legacy::{LegacyFields, LegacySource};
use crate::entities::{ActorRole, OrderStatus, PaymentMethod, PaymentStatus};
use crate::error::{AppError, AppResult};

/// One row exported from the old order tables.
///
/// Known columns are typed; everything else (the various `*_by`, `*_reason` and
/// history columns) lands in `legacy` and feeds the attribution heuristics.
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyOrderRow {
    #[serde(alias = "sellerId", alias = "store_id")]
    pub seller_id: i64,
    #[serde(alias = "customerId", alias = "user_id")]
    pub customer_id: i64,
    pub status: String,
    #[serde(alias = "totalAmount", alias = "total")]
    pub total_amount: Decimal,
    #[serde(default)]
    pub cart: Option<Value>,
    #[serde(default, alias = "customerName")]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub pincode: Option<String>,
    #[serde(default, alias = "paymentMethod")]
    pub payment_method: Option<String>,
    #[serde(default, alias = "paymentStatus")]
    pub payment_status: Option<String>,
    #[serde(default, alias = "paymentId")]
    pub payment_id: Option<String>,
    #[serde(default, alias = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "deliveredAt")]
    pub delivered_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub legacy: Map<String, Value>,
}

/// One legacy cart entry: `{id, name|product_name, price, qty|quantity}`, or the
/// current `{productId, name, unitPrice, quantity}` shape.
fn legacy_cart_item(index: usize, item: &Value) -> AppResult<CartItem> {
    let fields = LegacyFields::from_value(item);
    let invalid = |what: &str| AppError::ValidationError(format!("Cart item {index}: {what}"));

    let product_id = fields
        .first_text(&["product_id", "id"])
        .and_then(|raw| raw.parse::<i64>().ok())
        .ok_or_else(|| invalid("missing or non-numeric product id"))?;
    let name = fields
        .first_text(&["name", "product_name", "title"])
        .ok_or_else(|| invalid("missing name"))?;
    let unit_price = fields
        .first_text(&["unit_price", "price"])
        .and_then(|raw| Decimal::from_str(&raw).ok())
        .ok_or_else(|| invalid("missing or invalid price"))?;
    // 旧发票逻辑：数量缺失按 1 计
    let quantity = match fields.first_text(&["quantity", "qty"]) {
        Some(raw) => raw
            .parse::<u32>()
            .map_err(|_| invalid("invalid quantity"))?,
        None => 1,
    };

    Ok(CartItem {
        product_id,
        name,
        unit_price,
        quantity,
    })
}

impl LegacyOrderRow {
    /// Maps the legacy cart snapshot onto [`CartItem`]s. Old exports sometimes
    /// carry the cart as a JSON-encoded string; a missing cart imports as empty.
    pub fn cart_items(&self) -> AppResult<Vec<CartItem>> {
        let parsed = match &self.cart {
            None | Some(Value::Null) => return Ok(Vec::new()),
            Some(Value::String(raw)) => serde_json::from_str::<Value>(raw).map_err(|_| {
                AppError::ValidationError("Cart is not valid JSON".to_string())
            })?,
            Some(value) => value.clone(),
        };
        let Value::Array(items) = parsed else {
            return Err(AppError::ValidationError(
                "Cart must be a list of items".to_string(),
            ));
        };
        items
            .iter()
            .enumerate()
            .map(|(i, item)| legacy_cart_item(i, item))
            .collect()
    }

    pub fn payment_method(&self) -> PaymentMethod {
        match self.payment_method.as_deref().map(str::trim) {
            Some(m) if m.eq_ignore_ascii_case("ONLINE") => PaymentMethod::Online,
            _ => PaymentMethod::Cod,
        }
    }

    pub fn payment_status(&self) -> PaymentStatus {
        match self
            .payment_status
            .as_deref()
            .map(|s| s.trim().to_ascii_uppercase())
            .as_deref()
        {
            Some("PAID") => PaymentStatus::Paid,
            Some("INITIATED") => PaymentStatus::Initiated,
            _ => PaymentStatus::Pending,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportOrdersRequest {
    /// Raw legacy rows; unknown columns are kept for attribution
    #[schema(value_type = Vec<Object>)]
    pub orders: Vec<LegacyOrderRow>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportedOrder {
    pub order_id: i64,
    /// `id` column of the legacy row, echoed back for reconciliation
    #[schema(value_type = Option<Object>)]
    pub legacy_id: Option<Value>,
    pub status: OrderStatus,
    pub previous_status: Option<OrderStatus>,
    pub actor: Option<ActorRole>,
    pub reason: Option<String>,
    pub source: LegacySource,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImportOrdersResponse {
    pub imported: Vec<ImportedOrder>,
    /// Terminal orders imported without an actor
    pub unresolved: usize,
}
