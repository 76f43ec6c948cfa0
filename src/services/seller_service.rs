use sea_orm::sea_query::{Alias, Expr, Query};
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    TransactionTrait,
};
use serde_json::json;

use crate::database::{SchemaDescriptor, SharedSchema};
use crate::database::schema::BANK_COLUMNS;
use crate::entities::{AuditAction, audit_logs::SUBJECT_SETTINGS, seller_entity as sellers};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::services::{AuditEntry, AuditService};
use crate::utils::BankDetails;

/// Read access to the seller registry owned by the onboarding service.
#[derive(Clone)]
pub struct SellerService {
    pool: DatabaseConnection,
    schema: SharedSchema,
}

impl SellerService {
    pub fn new(pool: DatabaseConnection, schema: SharedSchema) -> Self {
        Self { pool, schema }
    }

    pub async fn get_seller_in<C: ConnectionTrait>(
        conn: &C,
        seller_id: i64,
    ) -> AppResult<sellers::Model> {
        sellers::Entity::find_by_id(seller_id)
            .one(conn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Seller {seller_id} not found")))
    }

    pub async fn get_seller(&self, seller_id: i64) -> AppResult<sellers::Model> {
        Self::get_seller_in(&self.pool, seller_id).await
    }

    pub async fn approved_sellers(&self) -> AppResult<Vec<sellers::Model>> {
        let list = sellers::Entity::find()
            .filter(sellers::Column::Status.eq(sellers::STATUS_APPROVED))
            .order_by_asc(sellers::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list)
    }

    /// 读取银行信息；旧库没有银行列时返回空信息（视为 KYC 未完成）
    pub async fn bank_details(&self, seller_id: i64) -> AppResult<BankDetails> {
        if !self.schema.read().await.has_bank_details() {
            return Ok(BankDetails::default());
        }

        let stmt = Query::select()
            .columns(BANK_COLUMNS.map(Alias::new))
            .from(sellers::Entity)
            .and_where(Expr::col(sellers::Column::Id).eq(seller_id))
            .to_owned();
        let backend = self.pool.get_database_backend();
        let Some(row) = self.pool.query_one(backend.build(&stmt)).await? else {
            return Err(AppError::NotFound(format!("Seller {seller_id} not found")));
        };

        Ok(BankDetails {
            holder: row.try_get::<Option<String>>("", "bank_holder")?,
            account: row.try_get::<Option<String>>("", "bank_account")?,
            ifsc: row.try_get::<Option<String>>("", "bank_ifsc")?,
        })
    }

    pub async fn kyc_complete(&self, seller_id: i64) -> AppResult<bool> {
        Ok(self.bank_details(seller_id).await?.is_complete())
    }

    pub async fn schema(&self) -> SchemaDescriptor {
        self.schema.read().await.clone()
    }

    /// 重新读取表结构并整体替换
    pub async fn refresh_schema(&self, user: &AuthUser) -> AppResult<SchemaDescriptor> {
        user.require_admin()?;

        let txn = self.pool.begin().await?;
        let fresh = SchemaDescriptor::load(&txn).await?;
        AuditService::record(
            &txn,
            AuditEntry {
                actor: Some(user),
                action: AuditAction::SchemaRefreshed,
                subject_type: SUBJECT_SETTINGS,
                subject_id: 0,
                detail: json!({
                    "sellerColumns": fresh.seller_columns,
                    "bankDetails": fresh.has_bank_details(),
                }),
            },
        )
        .await?;
        txn.commit().await?;

        *self.schema.write().await = fresh.clone();
        log::info!(
            "Schema descriptor refreshed by admin {}: bank columns {}",
            user.id,
            if fresh.has_bank_details() { "present" } else { "missing" }
        );
        Ok(fresh)
    }
}
