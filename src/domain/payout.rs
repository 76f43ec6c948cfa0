use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::entities::{OrderStatus, PayoutCycle, order_entity};

/// 10% in basis points, used when neither a seller override nor an enabled
/// global setting applies.
pub const DEFAULT_PERCENT_BP: i32 = 1000;

const BP_SCALE: i128 = 10_000;

/// Global commission switch. Missing settings fall back to `Default`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommissionSettings {
    pub enabled: bool,
    pub percent_bp: i32,
}

impl Default for CommissionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            percent_bp: DEFAULT_PERCENT_BP,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommissionSource {
    Seller,
    Global,
    Default,
}

/// Settlement cycle and the smallest amount (paise) a release may pay out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PayoutSettings {
    pub cycle: PayoutCycle,
    pub min_payout: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayoutStatus {
    Pending,
    /// Something is owed, but less than the minimum payout
    BelowMinimum,
    Paid,
}

/// Seller override, then the global percent when enabled, then 10%.
pub fn effective_percent(
    seller_override_bp: Option<i32>,
    settings: &CommissionSettings,
) -> (i32, CommissionSource) {
    match seller_override_bp {
        Some(bp) => (bp, CommissionSource::Seller),
        None if settings.enabled => (settings.percent_bp, CommissionSource::Global),
        None => (DEFAULT_PERCENT_BP, CommissionSource::Default),
    }
}

/// One settled order. All amounts in paise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayoutLine {
    pub order_id: i64,
    pub total: i64,
    pub fee: i64,
    pub net_payout: i64,
}

/// `fee = total * percent` rounded half-up to the paisa; `net = total - fee`.
/// Rounding happens here, per order, never on an aggregate.
pub fn settle_order(order_id: i64, total: i64, percent_bp: i32) -> PayoutLine {
    let raw = i128::from(total) * i128::from(percent_bp);
    let fee = if raw >= 0 {
        (raw + BP_SCALE / 2) / BP_SCALE
    } else {
        (raw - BP_SCALE / 2) / BP_SCALE
    };
    // |fee| <= |total| for percent <= 100%, so it fits back into i64
    let fee = fee as i64;
    PayoutLine {
        order_id,
        total,
        fee,
        net_payout: total - fee,
    }
}

/// The moment an order became payable: delivery time, or creation time for rows
/// delivered before `delivered_at` was recorded.
pub fn settled_at(order: &order_entity::Model) -> DateTime<Utc> {
    order.delivered_at.unwrap_or(order.created_at)
}

/// DELIVERED and not yet part of a release.
pub fn is_pending(order: &order_entity::Model) -> bool {
    order.status == OrderStatus::Delivered && order.payout_released_at.is_none()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutStatement {
    pub seller_id: i64,
    pub percent_bp: i32,
    pub source: CommissionSource,
    pub last_paid_at: Option<DateTime<Utc>>,
    pub lines: Vec<PayoutLine>,
    pub total_amount: i64,
    pub platform_fee: i64,
    pub total_due: i64,
    pub status: PayoutStatus,
}

impl PayoutStatement {
    pub fn order_count(&self) -> usize {
        self.lines.len()
    }
}

pub struct PayoutCalculator {
    settings: CommissionSettings,
    min_payout: i64,
}

impl PayoutCalculator {
    pub fn new(settings: CommissionSettings) -> Self {
        Self {
            settings,
            min_payout: 0,
        }
    }

    pub fn with_min_payout(mut self, min_payout: i64) -> Self {
        self.min_payout = min_payout;
        self
    }

    pub fn settings(&self) -> &CommissionSettings {
        &self.settings
    }

    /// Builds the statement for one seller from its orders. Orders that are not
    /// DELIVERED, belong to another seller or were already released are skipped.
    /// `last_paid_at` is only reported back.
    pub fn statement(
        &self,
        seller_id: i64,
        seller_override_bp: Option<i32>,
        last_paid_at: Option<DateTime<Utc>>,
        orders: &[order_entity::Model],
    ) -> PayoutStatement {
        let (percent_bp, source) = effective_percent(seller_override_bp, &self.settings);

        let mut pending: Vec<&order_entity::Model> = orders
            .iter()
            .filter(|o| o.seller_id == seller_id && is_pending(o))
            .collect();
        pending.sort_by_key(|o| (settled_at(o), o.id));

        let lines: Vec<PayoutLine> = pending
            .iter()
            .map(|o| settle_order(o.id, o.total_amount, percent_bp))
            .collect();

        let total_amount = lines.iter().map(|l| l.total).sum();
        let platform_fee = lines.iter().map(|l| l.fee).sum();
        let total_due: i64 = lines.iter().map(|l| l.net_payout).sum();

        PayoutStatement {
            seller_id,
            percent_bp,
            source,
            last_paid_at,
            lines,
            total_amount,
            platform_fee,
            total_due,
            status: if total_due <= 0 {
                PayoutStatus::Paid
            } else if total_due < self.min_payout {
                PayoutStatus::BelowMinimum
            } else {
                PayoutStatus::Pending
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{PaymentMethod, PaymentStatus};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, 1, 9, 0, 0).unwrap()
    }

    fn delivered(id: i64, seller_id: i64, total: i64, hours: i64) -> order_entity::Model {
        order_entity::Model {
            id,
            seller_id,
            customer_id: 1,
            customer_name: None,
            phone: None,
            address: None,
            pincode: None,
            cart: serde_json::json!([]),
            total_amount: total,
            status: OrderStatus::Delivered,
            previous_status: Some(OrderStatus::OutForDelivery),
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Paid,
            payment_id: None,
            attribution_actor: None,
            attribution_reason: None,
            delivered_at: Some(t0() + Duration::hours(hours)),
            payout_released_at: None,
            created_at: t0(),
            updated_at: t0(),
        }
    }

    #[test]
    fn test_global_ten_percent() {
        let line = settle_order(1, 50_000, 1000);
        assert_eq!(line.fee, 5_000);
        assert_eq!(line.net_payout, 45_000);
    }

    #[test]
    fn test_commission_precedence() {
        let global = CommissionSettings {
            enabled: true,
            percent_bp: 1000,
        };
        assert_eq!(
            effective_percent(Some(1500), &global),
            (1500, CommissionSource::Seller)
        );
        assert_eq!(effective_percent(None, &global), (1000, CommissionSource::Global));

        let disabled = CommissionSettings {
            enabled: false,
            percent_bp: 2500,
        };
        assert_eq!(
            effective_percent(None, &disabled),
            (DEFAULT_PERCENT_BP, CommissionSource::Default)
        );
        assert_eq!(CommissionSettings::default().percent_bp, 1000);
    }

    #[test]
    fn test_seller_override_applies_to_that_seller_only() {
        let calc = PayoutCalculator::new(CommissionSettings::default());
        let orders = vec![delivered(1, 7, 50_000, 1), delivered(2, 8, 50_000, 1)];

        let overridden = calc.statement(7, Some(1500), None, &orders);
        assert_eq!(overridden.platform_fee, 7_500);
        assert_eq!(overridden.total_due, 42_500);

        let global = calc.statement(8, None, None, &orders);
        assert_eq!(global.platform_fee, 5_000);
        assert_eq!(global.total_due, 45_000);
    }

    #[test]
    fn test_half_up_rounding_per_order() {
        // 3.35 * 10% = 0.335 -> 0.34 ; 3.33 * 10% = 0.333 -> 0.33
        assert_eq!(settle_order(1, 335, 1000).fee, 34);
        assert_eq!(settle_order(2, 333, 1000).fee, 33);
        // 12.5% of 0.04 = 0.005 -> 0.01
        assert_eq!(settle_order(3, 4, 1250).fee, 1);
    }

    #[test]
    fn test_sum_of_lines_matches_total_due() {
        let calc = PayoutCalculator::new(CommissionSettings::default());
        let orders: Vec<_> = (1..=7).map(|i| delivered(i, 3, 335, i)).collect();
        let s = calc.statement(3, None, None, &orders);

        let independent: i64 = (1..=7).map(|i| settle_order(i, 335, 1000).net_payout).sum();
        assert_eq!(s.total_due, independent);
        assert_eq!(s.total_due, 7 * 301);
        // rounding the aggregate fee (234.5 -> 235) would give 2110
        assert_ne!(s.total_due, 2_110);
    }

    #[test]
    fn test_released_orders_are_not_pending() {
        let calc = PayoutCalculator::new(CommissionSettings::default());
        let mut orders = vec![delivered(1, 5, 10_000, 1), delivered(2, 5, 20_000, 5)];

        let all = calc.statement(5, None, None, &orders);
        assert_eq!(all.order_count(), 2);
        assert_eq!(all.status, PayoutStatus::Pending);

        // 晚提交的送达订单：送达时间早于上次发放，但尚未结算，仍应计入
        orders[1].payout_released_at = Some(t0() + Duration::hours(6));
        let paid_at = Some(t0() + Duration::hours(6));
        let after = calc.statement(5, None, paid_at, &orders);
        assert_eq!(after.order_count(), 1);
        assert_eq!(after.lines[0].order_id, 1);
        assert_eq!(after.last_paid_at, paid_at);

        orders[0].payout_released_at = paid_at;
        let none = calc.statement(5, None, paid_at, &orders);
        assert_eq!(none.total_due, 0);
        assert_eq!(none.status, PayoutStatus::Paid);
    }

    #[test]
    fn test_minimum_payout_gates_status() {
        let orders = vec![delivered(1, 5, 10_000, 1)];
        let calc = PayoutCalculator::new(CommissionSettings::default()).with_min_payout(10_000);
        let s = calc.statement(5, None, None, &orders);
        assert_eq!(s.total_due, 9_000);
        assert_eq!(s.status, PayoutStatus::BelowMinimum);

        let calc = PayoutCalculator::new(CommissionSettings::default()).with_min_payout(9_000);
        assert_eq!(calc.statement(5, None, None, &orders).status, PayoutStatus::Pending);

        let empty = calc.statement(5, None, None, &[]);
        assert_eq!(empty.status, PayoutStatus::Paid);
    }

    #[test]
    fn test_non_delivered_orders_are_ignored() {
        let calc = PayoutCalculator::new(CommissionSettings::default());
        let mut cancelled = delivered(1, 5, 10_000, 1);
        cancelled.status = OrderStatus::Cancelled;
        let s = calc.statement(5, None, None, &[cancelled]);
        assert_eq!(s.order_count(), 0);
        assert_eq!(s.status, PayoutStatus::Paid);
    }
}
