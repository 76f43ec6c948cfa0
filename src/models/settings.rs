use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::PayoutCycle;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetSellerCommissionRequest {
    pub seller_id: i64,
    #[schema(value_type = String, example = "15")]
    pub percent: Decimal,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetGlobalCommissionRequest {
    pub enabled: bool,
    #[schema(value_type = String, example = "10")]
    pub percent: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SellerCommissionResponse {
    pub seller_id: i64,
    #[schema(value_type = String)]
    pub percent: Decimal,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GlobalCommissionResponse {
    pub enabled: bool,
    #[schema(value_type = String)]
    pub percent: Decimal,
    /// `None` while no admin has saved the setting and config defaults apply
    pub updated_at: Option<DateTime<Utc>>,
}

/// Both spellings are accepted; the old admin panel posts `payout_cycle` / `min_payout`.
#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SetPayoutSettingsRequest {
    /// `DAILY`, `WEEKLY`, `BIWEEKLY` or `MONTHLY`, case-insensitive. Defaults to weekly.
    #[serde(default, alias = "payout_cycle")]
    #[schema(example = "WEEKLY")]
    pub payout_cycle: Option<String>,
    /// Smallest amount a release may pay out. Defaults to 0.
    #[serde(default, alias = "min_payout")]
    #[schema(value_type = Option<String>, example = "500.00")]
    pub min_payout: Option<Decimal>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayoutSettingsResponse {
    pub payout_cycle: PayoutCycle,
    #[schema(value_type = String)]
    pub min_payout: Decimal,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SettingsResponse {
    pub commission: GlobalCommissionResponse,
    pub payout: PayoutSettingsResponse,
    pub seller_commissions: Vec<SellerCommissionResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payout_settings_accept_panel_spelling() {
        let req: SetPayoutSettingsRequest =
            serde_json::from_str(r#"{"payout_cycle":"Monthly","min_payout":"250.5"}"#).unwrap();
        assert_eq!(req.payout_cycle.as_deref(), Some("Monthly"));
        assert_eq!(req.min_payout, Some(Decimal::new(2505, 1)));

        let req: SetPayoutSettingsRequest = serde_json::from_str("{}").unwrap();
        assert!(req.payout_cycle.is_none() && req.min_payout.is_none());
    }
}
