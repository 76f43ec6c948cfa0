use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::handlers::respond;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::OrderService;

#[utoipa::path(
    post,
    path = "/orders",
    tag = "order",
    request_body = CreateOrderRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "下单成功", body = OrderResponse),
        (status = 400, description = "购物车或商家无效"),
        (status = 401, description = "未授权"),
        (status = 403, description = "仅顾客可下单")
    )
)]
pub async fn create_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    body: web::Json<CreateOrderRequest>,
) -> Result<HttpResponse> {
    let result = async {
        let user = current_user(&req)?;
        order_service.create_order(&user, body.into_inner()).await
    }
    .await;

    match result {
        Ok(order) => Ok(HttpResponse::Created().json(json!({
            "success": true,
            "data": order
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/orders",
    tag = "order",
    params(OrderQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取订单列表成功"),
        (status = 401, description = "未授权"),
        (status = 403, description = "查询了他人的订单")
    )
)]
pub async fn get_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            order_service.list_orders(&user, &query).await
        }
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/orders/{id}",
    tag = "order",
    params(
        ("id" = i64, Path, description = "订单 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "获取订单成功", body = OrderResponse),
        (status = 403, description = "无权查看"),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn get_order(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let order_id = path.into_inner();
    respond(
        async {
            let user = current_user(&req)?;
            order_service.get_order(&user, order_id).await
        }
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/orders/{id}/events",
    tag = "order",
    params(
        ("id" = i64, Path, description = "订单 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "订单状态历史", body = [OrderEventResponse]),
        (status = 403, description = "无权查看"),
        (status = 404, description = "订单不存在")
    )
)]
pub async fn get_order_events(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let order_id = path.into_inner();
    respond(
        async {
            let user = current_user(&req)?;
            order_service.get_events(&user, order_id).await
        }
        .await,
    )
}

#[utoipa::path(
    put,
    path = "/orders/{id}/status",
    tag = "order",
    params(
        ("id" = i64, Path, description = "订单 ID")
    ),
    request_body = UpdateStatusRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "状态已更新", body = OrderResponse),
        (status = 400, description = "非法状态变更或缺少原因"),
        (status = 403, description = "角色不允许此操作"),
        (status = 404, description = "订单不存在"),
        (status = 409, description = "订单状态已被其他请求修改")
    )
)]
pub async fn update_order_status(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
    body: web::Json<UpdateStatusRequest>,
) -> Result<HttpResponse> {
    let order_id = path.into_inner();
    respond(
        async {
            let user = current_user(&req)?;
            order_service.update_status(&user, order_id, &body).await
        }
        .await,
    )
}

pub fn order_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/orders")
            .route("", web::post().to(create_order))
            .route("", web::get().to(get_orders))
            .route("/{id}", web::get().to(get_order))
            .route("/{id}/events", web::get().to(get_order_events))
            .route("/{id}/status", web::put().to(update_order_status)),
    );
}
