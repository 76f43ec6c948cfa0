use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set, TransactionTrait};
use serde_json::{Value, json};

use crate::domain::legacy::{LegacyResolution, LegacyResolver, LegacySource};
use crate::entities::{
    ActorRole, AuditAction, OrderStatus, audit_logs::SUBJECT_ORDER, order_entity as orders,
    order_event_entity as order_events,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{ImportOrdersRequest, ImportOrdersResponse, ImportedOrder, LegacyOrderRow};
use crate::services::{AuditEntry, AuditService, SellerService, cart_total};
use crate::utils::decimal_to_paise;

/// 旧订单导入
///
/// 旧数据里的归因字段五花八门，这里解析一次并写入规范列与事件日志，
/// 之后的读取路径只看规范数据。
#[derive(Clone)]
pub struct ImportService {
    pool: DatabaseConnection,
}

impl ImportService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 整批导入，任一行失败则全部回滚
    pub async fn import_orders(
        &self,
        user: &AuthUser,
        req: ImportOrdersRequest,
    ) -> AppResult<ImportOrdersResponse> {
        user.require_admin()?;
        if req.orders.is_empty() {
            return Err(AppError::ValidationError("No orders to import".to_string()));
        }

        let txn = self.pool.begin().await?;
        let mut imported = Vec::with_capacity(req.orders.len());

        for (index, row) in req.orders.into_iter().enumerate() {
            let status = OrderStatus::from_token(&row.status).ok_or_else(|| {
                AppError::ValidationError(format!(
                    "Row {index}: unknown status {:?}",
                    row.status
                ))
            })?;
            let total = decimal_to_paise(row.total_amount)
                .map_err(|e| AppError::ValidationError(format!("Row {index}: {e}")))?;
            let cart = row
                .cart_items()
                .and_then(|items| {
                    if !items.is_empty() {
                        cart_total(&items)?;
                    }
                    Ok(serde_json::to_value(&items)?)
                })
                .map_err(|e| AppError::ValidationError(format!("Row {index}: {e}")))?;
            SellerService::get_seller_in(&txn, row.seller_id).await?;

            let resolution = LegacyResolver::new(row.customer_id, row.seller_id)
                .resolve(status, &Value::Object(row.legacy.clone()));
            let order = Self::insert_row(&txn, &row, status, total, cart, &resolution).await?;

            let legacy_id = row.legacy.get("id").cloned();
            let inferred = resolution.source == LegacySource::Heuristic;
            if inferred {
                log::warn!(
                    "Imported order {} ({status}): actor {:?} inferred from reason text",
                    order.id,
                    resolution.attribution.actor
                );
            } else if resolution.source == LegacySource::Unresolved {
                log::warn!(
                    "Imported order {} ({status}) has no resolvable actor",
                    order.id
                );
            }

            AuditService::record(
                &txn,
                AuditEntry {
                    actor: Some(user),
                    action: AuditAction::OrderImported,
                    subject_type: SUBJECT_ORDER,
                    subject_id: order.id,
                    detail: json!({
                        "legacyId": legacy_id,
                        "status": status,
                        "source": resolution.source,
                        "inferred": inferred,
                        "actor": resolution.attribution.actor,
                    }),
                },
            )
            .await?;

            imported.push(ImportedOrder {
                order_id: order.id,
                legacy_id,
                status,
                previous_status: order.previous_status,
                actor: resolution.attribution.actor,
                reason: resolution.attribution.reason,
                source: resolution.source,
            });
        }

        txn.commit().await?;

        let unresolved = imported
            .iter()
            .filter(|o| o.source == LegacySource::Unresolved)
            .count();
        log::info!(
            "Admin {} imported {} legacy orders ({unresolved} unresolved)",
            user.id,
            imported.len()
        );

        Ok(ImportOrdersResponse {
            imported,
            unresolved,
        })
    }

    /// 写入订单行以及对应事件：创建事件 + 到当前状态的一次变更
    async fn insert_row<C: sea_orm::ConnectionTrait>(
        conn: &C,
        row: &LegacyOrderRow,
        status: OrderStatus,
        total: i64,
        cart: Value,
        resolution: &LegacyResolution,
    ) -> AppResult<orders::Model> {
        let now = Utc::now();
        let created_at = row.created_at.unwrap_or(now);
        let updated_at = row.updated_at.unwrap_or(created_at).max(created_at);
        let previous_status = if status.is_terminal() {
            resolution.previous_status
        } else {
            None
        };
        let (actor, reason) = if status.is_abandoned() {
            (
                resolution.attribution.actor,
                resolution.attribution.reason.clone(),
            )
        } else {
            (None, None)
        };
        let delivered_at = (status == OrderStatus::Delivered)
            .then(|| row.delivered_at.unwrap_or(updated_at));

        let order = orders::ActiveModel {
            seller_id: Set(row.seller_id),
            customer_id: Set(row.customer_id),
            customer_name: Set(row.customer_name.clone()),
            phone: Set(row.phone.clone()),
            address: Set(row.address.clone()),
            pincode: Set(row.pincode.clone()),
            cart: Set(cart),
            total_amount: Set(total),
            status: Set(status),
            previous_status: Set(previous_status),
            payment_method: Set(row.payment_method()),
            payment_status: Set(row.payment_status()),
            payment_id: Set(row.payment_id.clone()),
            attribution_actor: Set(actor),
            attribution_reason: Set(reason.clone()),
            delivered_at: Set(delivered_at),
            created_at: Set(created_at),
            updated_at: Set(updated_at),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        order_events::ActiveModel {
            order_id: Set(order.id),
            from_status: Set(None),
            to_status: Set(OrderStatus::Placed),
            actor: Set(Some(ActorRole::Customer)),
            actor_id: Set(Some(row.customer_id)),
            reason: Set(None),
            occurred_at: Set(created_at),
            ..Default::default()
        }
        .insert(conn)
        .await?;

        if status != OrderStatus::Placed {
            let actor_id = match actor {
                Some(ActorRole::Customer) => Some(row.customer_id),
                Some(ActorRole::Seller) => Some(row.seller_id),
                _ => None,
            };
            order_events::ActiveModel {
                order_id: Set(order.id),
                from_status: Set(previous_status),
                to_status: Set(status),
                actor: Set(actor),
                actor_id: Set(actor_id),
                reason: Set(reason),
                occurred_at: Set(updated_at),
                ..Default::default()
            }
            .insert(conn)
            .await?;
        }

        Ok(order)
    }
}
