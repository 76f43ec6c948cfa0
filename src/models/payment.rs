use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::payout::{CommissionSource, PayoutLine, PayoutStatement, PayoutStatus};
use crate::utils::{bp_to_percent, paise_to_decimal};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLine {
    pub order_id: i64,
    #[schema(value_type = String)]
    pub total: Decimal,
    #[schema(value_type = String)]
    pub fee: Decimal,
    #[schema(value_type = String)]
    pub net_payout: Decimal,
}

impl From<&PayoutLine> for PaymentLine {
    fn from(l: &PayoutLine) -> Self {
        Self {
            order_id: l.order_id,
            total: paise_to_decimal(l.total),
            fee: paise_to_decimal(l.fee),
            net_payout: paise_to_decimal(l.net_payout),
        }
    }
}

/// Admin payments row for one seller.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub seller_id: i64,
    pub store_name: String,
    #[schema(value_type = String, example = "10.00")]
    pub commission_percent: Decimal,
    pub commission_source: CommissionSource,
    pub order_count: usize,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
    #[schema(value_type = String)]
    pub platform_fee: Decimal,
    /// Net amount owed to the seller for this cycle
    #[schema(value_type = String)]
    pub seller_payout: Decimal,
    pub payout_status: PayoutStatus,
    pub last_paid_at: Option<DateTime<Utc>>,
    pub kyc_complete: bool,
    pub lines: Vec<PaymentLine>,
}

impl PaymentSummary {
    pub fn new(statement: &PayoutStatement, store_name: String, kyc_complete: bool) -> Self {
        Self {
            seller_id: statement.seller_id,
            store_name,
            commission_percent: bp_to_percent(statement.percent_bp),
            commission_source: statement.source,
            order_count: statement.order_count(),
            total_amount: paise_to_decimal(statement.total_amount),
            platform_fee: paise_to_decimal(statement.platform_fee),
            seller_payout: paise_to_decimal(statement.total_due),
            payout_status: statement.status,
            last_paid_at: statement.last_paid_at,
            kyc_complete,
            lines: statement.lines.iter().map(PaymentLine::from).collect(),
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePayoutRequest {
    pub seller_id: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReleasePayoutResponse {
    /// The statement that was settled by this release
    pub released: PaymentSummary,
    pub last_paid_at: DateTime<Utc>,
}
