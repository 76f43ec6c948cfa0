use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::entities::{ActorRole, AuditAction, audit_log_entity};

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct AuditLogQuery {
    #[param(value_type = Option<String>)]
    pub action: Option<AuditAction>,
    pub subject_type: Option<String>,
    pub subject_id: Option<i64>,
    pub page: Option<u64>,
    pub per_page: Option<u64>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuditLogResponse {
    pub id: i64,
    pub actor_role: Option<ActorRole>,
    pub actor_id: Option<i64>,
    pub action: AuditAction,
    pub subject_type: String,
    pub subject_id: i64,
    #[schema(value_type = Option<Object>)]
    pub detail: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl From<audit_log_entity::Model> for AuditLogResponse {
    fn from(m: audit_log_entity::Model) -> Self {
        Self {
            id: m.id,
            actor_role: m.actor_role,
            actor_id: m.actor_id,
            action: m.action,
            subject_type: m.subject_type,
            subject_id: m.subject_id,
            detail: m.detail,
            created_at: m.created_at,
        }
    }
}
