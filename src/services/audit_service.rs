use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::Value;

use crate::entities::{AuditAction, audit_log_entity as audit_logs};
use crate::error::AppResult;
use crate::middlewares::AuthUser;
use crate::models::{AuditLogQuery, AuditLogResponse};
use crate::utils::{PaginatedResponse, PaginationParams};

/// One audit row to append.
pub struct AuditEntry<'a> {
    pub actor: Option<&'a AuthUser>,
    pub action: AuditAction,
    pub subject_type: &'static str,
    pub subject_id: i64,
    pub detail: Value,
}

#[derive(Clone)]
pub struct AuditService {
    pool: DatabaseConnection,
}

impl AuditService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 写入审计记录；调用方传入事务以保证与业务变更同时提交
    pub async fn record<C: ConnectionTrait>(conn: &C, entry: AuditEntry<'_>) -> AppResult<()> {
        audit_logs::ActiveModel {
            actor_role: Set(entry.actor.map(|a| a.role)),
            actor_id: Set(entry.actor.map(|a| a.id)),
            action: Set(entry.action),
            subject_type: Set(entry.subject_type.to_string()),
            subject_id: Set(entry.subject_id),
            detail: Set(Some(entry.detail)),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(conn)
        .await?;
        Ok(())
    }

    /// 审计日志（分页，最新在前）
    pub async fn list(
        &self,
        user: &AuthUser,
        query: &AuditLogQuery,
    ) -> AppResult<PaginatedResponse<AuditLogResponse>> {
        user.require_admin()?;
        let params = PaginationParams::new(query.page, query.per_page);

        let mut select = audit_logs::Entity::find();
        if let Some(action) = query.action {
            select = select.filter(audit_logs::Column::Action.eq(action));
        }
        if let Some(subject_type) = &query.subject_type {
            select = select.filter(audit_logs::Column::SubjectType.eq(subject_type.clone()));
        }
        if let Some(subject_id) = query.subject_id {
            select = select.filter(audit_logs::Column::SubjectId.eq(subject_id));
        }

        let paginator = select
            .order_by_desc(audit_logs::Column::CreatedAt)
            .order_by_desc(audit_logs::Column::Id)
            .paginate(&self.pool, params.get_per_page());
        let total = paginator.num_items().await?;
        let items = paginator
            .fetch_page(params.page_index())
            .await?
            .into_iter()
            .map(AuditLogResponse::from)
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }
}
