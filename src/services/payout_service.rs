use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde_json::json;

use crate::domain::payout::{PayoutCalculator, PayoutStatement, PayoutStatus};
use crate::entities::{
    AuditAction, OrderStatus, audit_logs::SUBJECT_SELLER, order_entity as orders,
    seller_entity as sellers, seller_payout_entity as seller_payouts,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{PaymentSummary, ReleasePayoutRequest, ReleasePayoutResponse};
use crate::services::{AuditEntry, AuditService, CommissionService, SellerService};
use crate::utils::{KeyedLocks, paise_to_decimal};

/// 商家结算：计算待付金额并推进付款水位线
#[derive(Clone)]
pub struct PayoutService {
    pool: DatabaseConnection,
    sellers: SellerService,
    commissions: CommissionService,
    /// Per-seller lock; release holds it across the whole transaction
    release_locks: KeyedLocks<i64>,
}

impl PayoutService {
    pub fn new(
        pool: DatabaseConnection,
        sellers: SellerService,
        commissions: CommissionService,
    ) -> Self {
        Self {
            pool,
            sellers,
            commissions,
            release_locks: KeyedLocks::default(),
        }
    }

    /// DELIVERED orders no release has paid yet.
    async fn unreleased_orders<C: ConnectionTrait>(
        conn: &C,
        seller_id: i64,
        for_update: bool,
    ) -> AppResult<Vec<orders::Model>> {
        let mut select = orders::Entity::find()
            .filter(orders::Column::SellerId.eq(seller_id))
            .filter(orders::Column::Status.eq(OrderStatus::Delivered))
            .filter(orders::Column::PayoutReleasedAt.is_null())
            .order_by_asc(orders::Column::Id);
        if for_update {
            select = select.lock_exclusive();
        }
        Ok(select.all(conn).await?)
    }

    async fn statement_in<C: ConnectionTrait>(
        conn: &C,
        calculator: &PayoutCalculator,
        seller_id: i64,
    ) -> AppResult<PayoutStatement> {
        let seller_override = CommissionService::seller_override_in(conn, seller_id).await?;
        let watermark = seller_payouts::Entity::find_by_id(seller_id)
            .one(conn)
            .await?
            .map(|p| p.last_paid_at);
        let pending = Self::unreleased_orders(conn, seller_id, false).await?;
        Ok(calculator.statement(seller_id, seller_override, watermark, &pending))
    }

    async fn summary(
        &self,
        calculator: &PayoutCalculator,
        seller: sellers::Model,
    ) -> AppResult<PaymentSummary> {
        let statement = Self::statement_in(&self.pool, calculator, seller.id).await?;
        let kyc_complete = self.sellers.kyc_complete(seller.id).await?;
        Ok(PaymentSummary::new(&statement, seller.store_name, kyc_complete))
    }

    /// 所有已审核商家的结算概览
    pub async fn list_payments(&self, user: &AuthUser) -> AppResult<Vec<PaymentSummary>> {
        user.require_admin()?;
        let calculator = self.commissions.calculator_in(&self.pool).await?;

        let mut summaries = Vec::new();
        for seller in self.sellers.approved_sellers().await? {
            summaries.push(self.summary(&calculator, seller).await?);
        }
        Ok(summaries)
    }

    pub async fn seller_payment(&self, user: &AuthUser, seller_id: i64) -> AppResult<PaymentSummary> {
        user.require_admin()?;
        let seller = self.sellers.get_seller(seller_id).await?;
        let calculator = self.commissions.calculator_in(&self.pool).await?;
        self.summary(&calculator, seller).await
    }

    /// 发放结算款
    ///
    /// 在事务内锁定未结算的送达订单，逐单标记 `payout_released_at` 后推进水位线。
    /// 事务提交较晚的送达订单不会被本次读到，保持未结算，进入下一期。
    /// 同一商家的并发请求依次执行。
    pub async fn release(
        &self,
        user: &AuthUser,
        req: &ReleasePayoutRequest,
    ) -> AppResult<ReleasePayoutResponse> {
        user.require_admin()?;
        let seller_id = req.seller_id;

        let seller = self.sellers.get_seller(seller_id).await?;
        if !seller.is_approved() {
            return Err(AppError::ValidationError(format!(
                "Seller {seller_id} is not approved"
            )));
        }
        self.sellers.bank_details(seller_id).await?.validate()?;

        self.release_locks
            .run(seller_id, self.release_locked(user, seller))
            .await
    }

    async fn release_locked(
        &self,
        user: &AuthUser,
        seller: sellers::Model,
    ) -> AppResult<ReleasePayoutResponse> {
        let seller_id = seller.id;
        let txn = self.pool.begin().await?;

        let previous = seller_payouts::Entity::find_by_id(seller_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .map(|p| p.last_paid_at);
        let now = Utc::now();

        let calculator = self.commissions.calculator_in(&txn).await?;
        let seller_override = CommissionService::seller_override_in(&txn, seller_id).await?;
        let pending = Self::unreleased_orders(&txn, seller_id, true).await?;
        let statement = calculator.statement(seller_id, seller_override, previous, &pending);

        if statement.status == PayoutStatus::BelowMinimum {
            return Err(AppError::ValidationError(format!(
                "Seller {seller_id} is owed {}, below the minimum payout",
                paise_to_decimal(statement.total_due)
            )));
        }

        let order_ids: Vec<i64> = statement.lines.iter().map(|l| l.order_id).collect();
        if !order_ids.is_empty() {
            let marked = orders::Entity::update_many()
                .set(orders::ActiveModel {
                    payout_released_at: Set(Some(now)),
                    ..Default::default()
                })
                .filter(orders::Column::Id.is_in(order_ids.clone()))
                .filter(orders::Column::PayoutReleasedAt.is_null())
                .exec(&txn)
                .await?;
            if marked.rows_affected != order_ids.len() as u64 {
                return Err(AppError::Conflict(format!(
                    "Orders of seller {seller_id} were released concurrently"
                )));
            }
        }

        let watermark = previous.map_or(now, |p| p.max(now));
        seller_payouts::Entity::insert(seller_payouts::ActiveModel {
            seller_id: Set(seller_id),
            last_paid_at: Set(watermark),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(seller_payouts::Column::SellerId)
                .update_columns([
                    seller_payouts::Column::LastPaidAt,
                    seller_payouts::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        AuditService::record(
            &txn,
            AuditEntry {
                actor: Some(user),
                action: AuditAction::PayoutReleased,
                subject_type: SUBJECT_SELLER,
                subject_id: seller_id,
                detail: json!({
                    "orderIds": order_ids,
                    "percentBp": statement.percent_bp,
                    "totalAmount": statement.total_amount,
                    "platformFee": statement.platform_fee,
                    "totalDue": statement.total_due,
                    "previousLastPaidAt": previous,
                    "lastPaidAt": watermark,
                }),
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Payout released for seller {seller_id} by admin {}: {} orders, {} paise due",
            user.id,
            statement.order_count(),
            statement.total_due
        );

        Ok(ReleasePayoutResponse {
            released: PaymentSummary::new(&statement, seller.store_name, true),
            last_paid_at: watermark,
        })
    }
}
