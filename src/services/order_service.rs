use std::collections::HashMap;

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait, UpdateResult,
};
use serde_json::json;

use crate::domain::attribution::{self, Attribution};
use crate::domain::timeline::previous_status_from_events;
use crate::domain::transition::{RoleDecision, plan_transition, role_policy};
use crate::entities::{
    ActorRole, AuditAction, OrderStatus, PaymentMethod, PaymentStatus,
    audit_logs::SUBJECT_ORDER, order_entity as orders, order_event_entity as order_events,
};
use crate::error::{AppError, AppResult};
use crate::middlewares::AuthUser;
use crate::models::{
    CartItem, CreateOrderRequest, OrderEventResponse, OrderQuery, OrderResponse,
    StrictAttributionResponse, UpdateStatusRequest,
};
use crate::services::{AuditEntry, AuditService, SellerService};
use crate::utils::{PaginatedResponse, PaginationParams, decimal_to_paise};

#[derive(Clone)]
pub struct OrderService {
    pool: DatabaseConnection,
}

/// 校验购物车并计算总金额（paise）
pub fn cart_total(cart: &[CartItem]) -> AppResult<i64> {
    if cart.is_empty() {
        return Err(AppError::ValidationError("Cart must not be empty".to_string()));
    }
    let mut total: i64 = 0;
    for (i, item) in cart.iter().enumerate() {
        if item.name.trim().is_empty() {
            return Err(AppError::ValidationError(format!(
                "Cart item {i} has no name"
            )));
        }
        if item.quantity == 0 {
            return Err(AppError::ValidationError(format!(
                "Cart item {i} must have quantity >= 1"
            )));
        }
        let unit = decimal_to_paise(item.unit_price)?;
        let line = unit
            .checked_mul(i64::from(item.quantity))
            .ok_or_else(|| AppError::ValidationError("Cart total is out of range".to_string()))?;
        total = total
            .checked_add(line)
            .ok_or_else(|| AppError::ValidationError("Cart total is out of range".to_string()))?;
    }
    Ok(total)
}

/// Read access to one order: admins see everything, customers and sellers only their own.
pub fn ensure_access(user: &AuthUser, order: &orders::Model) -> AppResult<()> {
    let allowed = match user.role {
        ActorRole::Admin => true,
        ActorRole::Customer => order.customer_id == user.id,
        ActorRole::Seller => order.seller_id == user.id,
    };
    if !allowed {
        return Err(AppError::Forbidden(format!(
            "Order {} does not belong to the caller",
            order.id
        )));
    }
    Ok(())
}

fn parse_status(raw: &str, field: &str) -> AppResult<OrderStatus> {
    OrderStatus::from_token(raw)
        .ok_or_else(|| AppError::ValidationError(format!("Unknown {field}: {raw}")))
}

impl OrderService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    async fn find_order<C: ConnectionTrait>(conn: &C, order_id: i64) -> AppResult<orders::Model> {
        orders::Entity::find_by_id(order_id)
            .one(conn)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))
    }

    async fn load_events<C: ConnectionTrait>(
        conn: &C,
        order_id: i64,
    ) -> AppResult<Vec<order_events::Model>> {
        let events = order_events::Entity::find()
            .filter(order_events::Column::OrderId.eq(order_id))
            .order_by_asc(order_events::Column::OccurredAt)
            .order_by_asc(order_events::Column::Id)
            .all(conn)
            .await?;
        Ok(events)
    }

    /// Builds the read projection; the event log fills whatever the row lacks.
    pub fn project(order: orders::Model, events: &[order_events::Model]) -> OrderResponse {
        let resolved = attribution::resolve(&order, events);
        let previous_status = order
            .previous_status
            .or_else(|| previous_status_from_events(order.status, events));
        OrderResponse::project(order, previous_status, &resolved)
    }

    /// 创建订单（状态 PLACED，快照购物车与总金额）
    pub async fn create_order(
        &self,
        user: &AuthUser,
        req: CreateOrderRequest,
    ) -> AppResult<OrderResponse> {
        if user.role != ActorRole::Customer {
            return Err(AppError::Forbidden(
                "Only customers can place orders".to_string(),
            ));
        }
        let total = cart_total(&req.cart)?;
        let cart = serde_json::to_value(&req.cart)?;
        let now = Utc::now();

        let txn = self.pool.begin().await?;

        let seller = SellerService::get_seller_in(&txn, req.seller_id).await?;
        if !seller.is_approved() {
            return Err(AppError::ValidationError(format!(
                "Seller {} is not accepting orders",
                seller.id
            )));
        }

        let order = orders::ActiveModel {
            seller_id: Set(req.seller_id),
            customer_id: Set(user.id),
            customer_name: Set(req.customer_name),
            phone: Set(req.phone),
            address: Set(req.address),
            pincode: Set(req.pincode),
            cart: Set(cart),
            total_amount: Set(total),
            status: Set(OrderStatus::Placed),
            previous_status: Set(None),
            payment_method: Set(req.payment_method.unwrap_or(PaymentMethod::Cod)),
            payment_status: Set(PaymentStatus::Pending),
            payment_id: Set(req.payment_id),
            attribution_actor: Set(None),
            attribution_reason: Set(None),
            delivered_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let event = order_events::ActiveModel {
            order_id: Set(order.id),
            from_status: Set(None),
            to_status: Set(OrderStatus::Placed),
            actor: Set(Some(user.role)),
            actor_id: Set(Some(user.id)),
            reason: Set(None),
            occurred_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        AuditService::record(
            &txn,
            AuditEntry {
                actor: Some(user),
                action: AuditAction::OrderCreated,
                subject_type: SUBJECT_ORDER,
                subject_id: order.id,
                detail: json!({ "sellerId": order.seller_id, "totalAmount": total }),
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Order {} placed by customer {} for seller {} (total {} paise)",
            order.id,
            user.id,
            order.seller_id,
            total
        );

        Ok(Self::project(order, &[event]))
    }

    pub async fn get_order(&self, user: &AuthUser, order_id: i64) -> AppResult<OrderResponse> {
        let order = Self::find_order(&self.pool, order_id).await?;
        ensure_access(user, &order)?;
        let events = Self::load_events(&self.pool, order_id).await?;
        Ok(Self::project(order, &events))
    }

    pub async fn get_events(
        &self,
        user: &AuthUser,
        order_id: i64,
    ) -> AppResult<Vec<OrderEventResponse>> {
        let order = Self::find_order(&self.pool, order_id).await?;
        ensure_access(user, &order)?;
        let events = Self::load_events(&self.pool, order_id).await?;
        Ok(events.into_iter().map(OrderEventResponse::from).collect())
    }

    /// 订单列表（按角色限定范围，最新在前）
    pub async fn list_orders(
        &self,
        user: &AuthUser,
        query: &OrderQuery,
    ) -> AppResult<PaginatedResponse<OrderResponse>> {
        let mut select = orders::Entity::find();

        match user.role {
            ActorRole::Customer => {
                if query.customer_id.is_some_and(|id| id != user.id) {
                    return Err(AppError::Forbidden(
                        "Customers can only list their own orders".to_string(),
                    ));
                }
                select = select.filter(orders::Column::CustomerId.eq(user.id));
                if let Some(seller_id) = query.seller_id {
                    select = select.filter(orders::Column::SellerId.eq(seller_id));
                }
            }
            ActorRole::Seller => {
                if query.seller_id.is_some_and(|id| id != user.id) {
                    return Err(AppError::Forbidden(
                        "Sellers can only list their own orders".to_string(),
                    ));
                }
                select = select.filter(orders::Column::SellerId.eq(user.id));
                if let Some(customer_id) = query.customer_id {
                    select = select.filter(orders::Column::CustomerId.eq(customer_id));
                }
            }
            ActorRole::Admin => {
                if let Some(customer_id) = query.customer_id {
                    select = select.filter(orders::Column::CustomerId.eq(customer_id));
                }
                if let Some(seller_id) = query.seller_id {
                    select = select.filter(orders::Column::SellerId.eq(seller_id));
                }
            }
        }
        if let Some(status) = query.status {
            select = select.filter(orders::Column::Status.eq(status));
        }

        let params = PaginationParams::new(query.page, query.per_page);
        let paginator = select
            .order_by_desc(orders::Column::CreatedAt)
            .order_by_desc(orders::Column::Id)
            .paginate(&self.pool, params.get_per_page());
        let total = paginator.num_items().await?;
        let page = paginator.fetch_page(params.page_index()).await?;

        let ids: Vec<i64> = page.iter().map(|o| o.id).collect();
        let mut events_by_order: HashMap<i64, Vec<order_events::Model>> = HashMap::new();
        if !ids.is_empty() {
            let events = order_events::Entity::find()
                .filter(order_events::Column::OrderId.is_in(ids))
                .order_by_asc(order_events::Column::OccurredAt)
                .order_by_asc(order_events::Column::Id)
                .all(&self.pool)
                .await?;
            for event in events {
                events_by_order.entry(event.order_id).or_default().push(event);
            }
        }

        let items = page
            .into_iter()
            .map(|order| {
                let events = events_by_order.remove(&order.id).unwrap_or_default();
                Self::project(order, &events)
            })
            .collect();

        Ok(PaginatedResponse::new(items, &params, total))
    }

    /// 更新订单状态
    ///
    /// 在同一事务内重新读取当前状态再校验，写入时以 `status = 当前状态` 作为条件；
    /// 并发请求中后提交者得到 Conflict。
    pub async fn update_status(
        &self,
        user: &AuthUser,
        order_id: i64,
        req: &UpdateStatusRequest,
    ) -> AppResult<OrderResponse> {
        let requested = parse_status(&req.status, "status")?;
        if let Some(claimed) = req.actor_role
            && claimed != user.role
        {
            return Err(AppError::Forbidden(format!(
                "actorRole {claimed} does not match the authenticated role {}",
                user.role
            )));
        }
        let expected = req
            .expected_status
            .as_deref()
            .map(|raw| parse_status(raw, "expectedStatus"))
            .transpose()?;

        let txn = self.pool.begin().await?;

        let order = orders::Entity::find_by_id(order_id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or(AppError::OrderNotFound(order_id))?;
        ensure_access(user, &order)?;

        let current = order.status;
        if let Some(expected) = expected
            && expected != current
        {
            return Err(AppError::Conflict(format!(
                "Order {order_id} is {current}, expected {expected}"
            )));
        }
        if !current.is_terminal() {
            match role_policy(user.role, current, requested) {
                RoleDecision::Allowed => {}
                RoleDecision::Forbidden => {
                    return Err(AppError::Forbidden(format!(
                        "{} may not move an order to {requested}",
                        user.role
                    )));
                }
                // 订单已越过可取消/拒绝的阶段，按并发冲突处理
                RoleDecision::Stale => {
                    return Err(AppError::Conflict(format!(
                        "Order {order_id} is already {current} and can no longer be {requested}"
                    )));
                }
            }
        }

        let transition = plan_transition(current, requested, req.reason.as_deref())?;
        let stamped = match (&transition.reason, requested.is_abandoned()) {
            (Some(reason), true) => attribution::stamp(user.role, reason)?,
            _ => Attribution::default(),
        };

        let now = Utc::now();
        let mut changes = orders::ActiveModel {
            status: Set(requested),
            updated_at: Set(now),
            ..Default::default()
        };
        if let Some(previous) = transition.previous_status() {
            changes.previous_status = Set(Some(previous));
        }
        if requested.is_abandoned() {
            changes.attribution_actor = Set(stamped.actor);
            changes.attribution_reason = Set(stamped.reason.clone());
        }
        if requested == OrderStatus::Delivered {
            changes.delivered_at = Set(Some(now));
        }

        let result: UpdateResult = orders::Entity::update_many()
            .set(changes)
            .filter(orders::Column::Id.eq(order_id))
            .filter(orders::Column::Status.eq(current))
            .exec(&txn)
            .await?;
        if result.rows_affected != 1 {
            return Err(AppError::Conflict(format!(
                "Order {order_id} changed while the request was processed"
            )));
        }

        order_events::ActiveModel {
            order_id: Set(order_id),
            from_status: Set(Some(current)),
            to_status: Set(requested),
            actor: Set(Some(user.role)),
            actor_id: Set(Some(user.id)),
            reason: Set(transition.reason.clone()),
            occurred_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        AuditService::record(
            &txn,
            AuditEntry {
                actor: Some(user),
                action: AuditAction::OrderStatusChanged,
                subject_type: SUBJECT_ORDER,
                subject_id: order_id,
                detail: json!({
                    "from": current,
                    "to": requested,
                    "reason": transition.reason,
                }),
            },
        )
        .await?;

        txn.commit().await?;

        log::info!(
            "Order {order_id} moved {current} -> {requested} by {} {}",
            user.role,
            user.id
        );

        self.get_order(user, order_id).await
    }

    /// 仅依据事件日志还原终态归因，无法还原时返回 AttributionUnresolvable
    pub async fn strict_attribution(
        &self,
        user: &AuthUser,
        order_id: i64,
    ) -> AppResult<StrictAttributionResponse> {
        user.require_admin()?;
        let order = Self::find_order(&self.pool, order_id).await?;
        let events = Self::load_events(&self.pool, order_id).await?;
        let attribution = attribution::reconstruct(order.id, order.status, &events)?;
        Ok(StrictAttributionResponse {
            order_id,
            status: order.status,
            attribution,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item(price: rust_decimal::Decimal, quantity: u32) -> CartItem {
        CartItem {
            product_id: 1,
            name: "Atta 5kg".to_string(),
            unit_price: price,
            quantity,
        }
    }

    #[test]
    fn test_cart_total() {
        assert_eq!(
            cart_total(&[item(dec!(249.50), 2), item(dec!(1), 1)]).unwrap(),
            50_000
        );
    }

    #[test]
    fn test_cart_validation() {
        assert!(cart_total(&[]).is_err());
        assert!(cart_total(&[item(dec!(10), 0)]).is_err());
        assert!(cart_total(&[item(dec!(-1), 1)]).is_err());
        assert!(cart_total(&[item(dec!(0.001), 1)]).is_err());
        assert!(matches!(
            cart_total(&[item(rust_decimal::Decimal::MAX, 1)]),
            Err(AppError::ValidationError(_))
        ));

        let mut nameless = item(dec!(10), 1);
        nameless.name = "  ".to_string();
        assert!(cart_total(&[nameless]).is_err());
    }
}
