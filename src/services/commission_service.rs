use chrono::{DateTime, Utc};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ConnectionTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryOrder, Set,
    TransactionTrait,
};
use serde_json::json;

use crate::domain::payout::{CommissionSettings, PayoutCalculator, PayoutSettings};
use crate::entities::{
    AuditAction, PayoutCycle,
    audit_logs::{SUBJECT_SELLER, SUBJECT_SETTINGS},
    global_commission_entity as global_settings, seller_commission_entity as seller_commissions,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{
    GlobalCommissionResponse, PayoutSettingsResponse, SellerCommissionResponse,
    SetGlobalCommissionRequest, SetPayoutSettingsRequest, SetSellerCommissionRequest,
    SettingsResponse,
};
use crate::services::{AuditEntry, AuditService, SellerService};
use crate::utils::{bp_to_percent, decimal_to_paise, paise_to_decimal, percent_to_bp};

/// 单例设置行的当前值；`updated_at` 为 None 表示尚未保存过，使用默认值
#[derive(Debug, Clone, Copy)]
pub struct GlobalSettings {
    pub commission: CommissionSettings,
    pub payout: PayoutSettings,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Clone)]
pub struct CommissionService {
    pool: DatabaseConnection,
    /// Used until an admin saves the global setting
    defaults: CommissionSettings,
}

impl CommissionService {
    pub fn new(pool: DatabaseConnection, defaults: CommissionSettings) -> Self {
        Self { pool, defaults }
    }

    /// 全局设置；单例行不存在时使用配置默认值
    pub async fn settings_in<C: ConnectionTrait>(&self, conn: &C) -> AppResult<GlobalSettings> {
        let row = global_settings::Entity::find_by_id(global_settings::SINGLETON_ID)
            .one(conn)
            .await?;
        Ok(match row {
            Some(m) => GlobalSettings {
                commission: CommissionSettings {
                    enabled: m.enabled,
                    percent_bp: m.percent_bp,
                },
                payout: PayoutSettings {
                    cycle: m.payout_cycle,
                    min_payout: m.min_payout,
                },
                updated_at: Some(m.updated_at),
            },
            None => GlobalSettings {
                commission: self.defaults,
                payout: PayoutSettings::default(),
                updated_at: None,
            },
        })
    }

    pub async fn seller_override_in<C: ConnectionTrait>(
        conn: &C,
        seller_id: i64,
    ) -> AppResult<Option<i32>> {
        let row = seller_commissions::Entity::find_by_id(seller_id)
            .one(conn)
            .await?;
        Ok(row.map(|m| m.percent_bp))
    }

    pub async fn calculator_in<C: ConnectionTrait>(&self, conn: &C) -> AppResult<PayoutCalculator> {
        let settings = self.settings_in(conn).await?;
        Ok(PayoutCalculator::new(settings.commission).with_min_payout(settings.payout.min_payout))
    }

    pub async fn get_settings(&self, user: &AuthUser) -> AppResult<SettingsResponse> {
        user.require_admin()?;
        let settings = self.settings_in(&self.pool).await?;
        let sellers = seller_commissions::Entity::find()
            .order_by_asc(seller_commissions::Column::SellerId)
            .all(&self.pool)
            .await?;

        Ok(SettingsResponse {
            commission: GlobalCommissionResponse {
                enabled: settings.commission.enabled,
                percent: bp_to_percent(settings.commission.percent_bp),
                updated_at: settings.updated_at,
            },
            payout: PayoutSettingsResponse {
                payout_cycle: settings.payout.cycle,
                min_payout: paise_to_decimal(settings.payout.min_payout),
                updated_at: settings.updated_at,
            },
            seller_commissions: sellers
                .into_iter()
                .map(|m| SellerCommissionResponse {
                    seller_id: m.seller_id,
                    percent: bp_to_percent(m.percent_bp),
                    updated_at: m.updated_at,
                })
                .collect(),
        })
    }

    /// 设置商家专属佣金（覆盖全局设置）
    pub async fn set_seller_commission(
        &self,
        user: &AuthUser,
        req: &SetSellerCommissionRequest,
    ) -> AppResult<SellerCommissionResponse> {
        user.require_admin()?;
        let percent_bp = percent_to_bp(req.percent)?;
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        SellerService::get_seller_in(&txn, req.seller_id).await?;

        seller_commissions::Entity::insert(seller_commissions::ActiveModel {
            seller_id: Set(req.seller_id),
            percent_bp: Set(percent_bp),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(seller_commissions::Column::SellerId)
                .update_columns([
                    seller_commissions::Column::PercentBp,
                    seller_commissions::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        AuditService::record(
            &txn,
            AuditEntry {
                actor: Some(user),
                action: AuditAction::SellerCommissionSet,
                subject_type: SUBJECT_SELLER,
                subject_id: req.seller_id,
                detail: json!({ "percentBp": percent_bp }),
            },
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Seller {} commission set to {}% by admin {}",
            req.seller_id,
            bp_to_percent(percent_bp),
            user.id
        );

        Ok(SellerCommissionResponse {
            seller_id: req.seller_id,
            percent: bp_to_percent(percent_bp),
            updated_at: now,
        })
    }

    /// 删除商家专属佣金，恢复使用全局设置
    pub async fn clear_seller_commission(&self, user: &AuthUser, seller_id: i64) -> AppResult<()> {
        user.require_admin()?;

        let txn = self.pool.begin().await?;
        let existing = seller_commissions::Entity::find_by_id(seller_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!("Seller {seller_id} has no commission override"))
            })?;
        let previous_bp = existing.percent_bp;
        existing.delete(&txn).await?;

        AuditService::record(
            &txn,
            AuditEntry {
                actor: Some(user),
                action: AuditAction::SellerCommissionCleared,
                subject_type: SUBJECT_SELLER,
                subject_id: seller_id,
                detail: json!({ "previousPercentBp": previous_bp }),
            },
        )
        .await?;
        txn.commit().await?;

        log::info!("Seller {seller_id} commission override cleared by admin {}", user.id);
        Ok(())
    }

    pub async fn set_global_commission(
        &self,
        user: &AuthUser,
        req: &SetGlobalCommissionRequest,
    ) -> AppResult<GlobalCommissionResponse> {
        user.require_admin()?;
        let percent_bp = percent_to_bp(req.percent)?;
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        global_settings::Entity::insert(global_settings::ActiveModel {
            id: Set(global_settings::SINGLETON_ID),
            enabled: Set(req.enabled),
            percent_bp: Set(percent_bp),
            updated_at: Set(now),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::column(global_settings::Column::Id)
                .update_columns([
                    global_settings::Column::Enabled,
                    global_settings::Column::PercentBp,
                    global_settings::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        AuditService::record(
            &txn,
            AuditEntry {
                actor: Some(user),
                action: AuditAction::GlobalCommissionSet,
                subject_type: SUBJECT_SETTINGS,
                subject_id: i64::from(global_settings::SINGLETON_ID),
                detail: json!({ "enabled": req.enabled, "percentBp": percent_bp }),
            },
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Global commission set to {}% (enabled: {}) by admin {}",
            bp_to_percent(percent_bp),
            req.enabled,
            user.id
        );

        Ok(GlobalCommissionResponse {
            enabled: req.enabled,
            percent: bp_to_percent(percent_bp),
            updated_at: Some(now),
        })
    }

    /// 保存结算周期与最低结算金额（后台“结算设置”）
    pub async fn set_payout_settings(
        &self,
        user: &AuthUser,
        req: &SetPayoutSettingsRequest,
    ) -> AppResult<PayoutSettingsResponse> {
        user.require_admin()?;
        let cycle = match req.payout_cycle.as_deref().map(str::trim) {
            None | Some("") => PayoutCycle::default(),
            Some(raw) => PayoutCycle::from_token(raw).ok_or_else(|| {
                AppError::ValidationError(format!("Unknown payout cycle: {raw}"))
            })?,
        };
        let min_payout = match req.min_payout {
            Some(amount) => decimal_to_paise(amount)?,
            None => 0,
        };
        let now = Utc::now();

        let txn = self.pool.begin().await?;
        // 单例行可能尚不存在：插入时沿用当前佣金设置，冲突时只更新结算列
        let current = self.settings_in(&txn).await?;
        global_settings::Entity::insert(global_settings::ActiveModel {
            id: Set(global_settings::SINGLETON_ID),
            enabled: Set(current.commission.enabled),
            percent_bp: Set(current.commission.percent_bp),
            payout_cycle: Set(cycle),
            min_payout: Set(min_payout),
            updated_at: Set(now),
        })
        .on_conflict(
            OnConflict::column(global_settings::Column::Id)
                .update_columns([
                    global_settings::Column::PayoutCycle,
                    global_settings::Column::MinPayout,
                    global_settings::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;

        AuditService::record(
            &txn,
            AuditEntry {
                actor: Some(user),
                action: AuditAction::PayoutSettingsSet,
                subject_type: SUBJECT_SETTINGS,
                subject_id: i64::from(global_settings::SINGLETON_ID),
                detail: json!({ "payoutCycle": cycle, "minPayout": min_payout }),
            },
        )
        .await?;
        txn.commit().await?;

        log::info!(
            "Payout settings set to {cycle:?} with minimum {} by admin {}",
            paise_to_decimal(min_payout),
            user.id
        );

        Ok(PayoutSettingsResponse {
            payout_cycle: cycle,
            min_payout: paise_to_decimal(min_payout),
            updated_at: Some(now),
        })
    }
}
