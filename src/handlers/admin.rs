use actix_web::{HttpRequest, HttpResponse, Result, web};

use crate::database::SchemaDescriptor;
use crate::handlers::respond;
use crate::middlewares::current_user;
use crate::models::*;
use crate::services::{
    AuditService, CommissionService, ImportService, OrderService, PayoutService, SellerService,
};

#[utoipa::path(
    get,
    path = "/admin/orders",
    tag = "admin",
    params(OrderQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "全部订单"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_orders(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    query: web::Query<OrderQuery>,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            user.require_admin()?;
            order_service.list_orders(&user, &query).await
        }
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/admin/orders/{id}/attribution",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "订单 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "由事件日志还原的归因", body = StrictAttributionResponse),
        (status = 404, description = "订单不存在"),
        (status = 422, description = "事件日志无法解释终态")
    )
)]
pub async fn order_attribution(
    order_service: web::Data<OrderService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let order_id = path.into_inner();
    respond(
        async {
            let user = current_user(&req)?;
            order_service.strict_attribution(&user, order_id).await
        }
        .await,
    )
}

#[utoipa::path(
    post,
    path = "/admin/orders/import",
    tag = "admin",
    request_body = ImportOrdersRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "导入完成", body = ImportOrdersResponse),
        (status = 400, description = "数据无效，整批回滚")
    )
)]
pub async fn import_orders(
    import_service: web::Data<ImportService>,
    req: HttpRequest,
    body: web::Json<ImportOrdersRequest>,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            import_service.import_orders(&user, body.into_inner()).await
        }
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/admin/payments",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "各商家待结算金额", body = [PaymentSummary]),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_payments(
    payout_service: web::Data<PayoutService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            payout_service.list_payments(&user).await
        }
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/admin/payments/{seller_id}",
    tag = "admin",
    params(
        ("seller_id" = i64, Path, description = "商家 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "商家结算明细", body = PaymentSummary),
        (status = 404, description = "商家不存在")
    )
)]
pub async fn seller_payment(
    payout_service: web::Data<PayoutService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let seller_id = path.into_inner();
    respond(
        async {
            let user = current_user(&req)?;
            payout_service.seller_payment(&user, seller_id).await
        }
        .await,
    )
}

#[utoipa::path(
    post,
    path = "/admin/payments/release",
    tag = "admin",
    request_body = ReleasePayoutRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已结算", body = ReleasePayoutResponse),
        (status = 400, description = "商家 KYC 信息不完整"),
        (status = 404, description = "商家不存在")
    )
)]
pub async fn release_payout(
    payout_service: web::Data<PayoutService>,
    req: HttpRequest,
    body: web::Json<ReleasePayoutRequest>,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            payout_service.release(&user, &body).await
        }
        .await,
    )
}

#[utoipa::path(
    post,
    path = "/admin/sellers/commission",
    tag = "admin",
    request_body = SetSellerCommissionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "商家佣金已设置", body = SellerCommissionResponse),
        (status = 400, description = "佣金比例无效"),
        (status = 404, description = "商家不存在")
    )
)]
pub async fn set_seller_commission(
    commission_service: web::Data<CommissionService>,
    req: HttpRequest,
    body: web::Json<SetSellerCommissionRequest>,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            commission_service.set_seller_commission(&user, &body).await
        }
        .await,
    )
}

#[utoipa::path(
    delete,
    path = "/admin/sellers/{id}/commission",
    tag = "admin",
    params(
        ("id" = i64, Path, description = "商家 ID")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "已恢复使用全局佣金"),
        (status = 404, description = "商家没有专属佣金")
    )
)]
pub async fn clear_seller_commission(
    commission_service: web::Data<CommissionService>,
    req: HttpRequest,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    let seller_id = path.into_inner();
    respond(
        async {
            let user = current_user(&req)?;
            commission_service
                .clear_seller_commission(&user, seller_id)
                .await
        }
        .await,
    )
}

#[utoipa::path(
    post,
    path = "/admin/settings/commission",
    tag = "admin",
    request_body = SetGlobalCommissionRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "全局佣金已更新", body = GlobalCommissionResponse),
        (status = 400, description = "佣金比例无效")
    )
)]
pub async fn set_global_commission(
    commission_service: web::Data<CommissionService>,
    req: HttpRequest,
    body: web::Json<SetGlobalCommissionRequest>,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            commission_service.set_global_commission(&user, &body).await
        }
        .await,
    )
}

#[utoipa::path(
    post,
    path = "/admin/settings/payout",
    tag = "admin",
    request_body = SetPayoutSettingsRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "结算设置已更新", body = PayoutSettingsResponse),
        (status = 400, description = "结算周期或最低金额无效")
    )
)]
pub async fn set_payout_settings(
    commission_service: web::Data<CommissionService>,
    req: HttpRequest,
    body: web::Json<SetPayoutSettingsRequest>,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            commission_service.set_payout_settings(&user, &body).await
        }
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/admin/settings",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "佣金设置", body = SettingsResponse),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn get_settings(
    commission_service: web::Data<CommissionService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            commission_service.get_settings(&user).await
        }
        .await,
    )
}

#[utoipa::path(
    get,
    path = "/admin/audit-logs",
    tag = "admin",
    params(AuditLogQuery),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "审计日志"),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn list_audit_logs(
    audit_service: web::Data<AuditService>,
    req: HttpRequest,
    query: web::Query<AuditLogQuery>,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            audit_service.list(&user, &query).await
        }
        .await,
    )
}

#[utoipa::path(
    post,
    path = "/admin/schema/refresh",
    tag = "admin",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "表结构已重新读取", body = SchemaDescriptor),
        (status = 403, description = "需要管理员权限")
    )
)]
pub async fn refresh_schema(
    seller_service: web::Data<SellerService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    respond(
        async {
            let user = current_user(&req)?;
            seller_service.refresh_schema(&user).await
        }
        .await,
    )
}

pub fn admin_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .route("/orders", web::get().to(list_orders))
            .route("/orders/import", web::post().to(import_orders))
            .route("/orders/{id}/attribution", web::get().to(order_attribution))
            .route("/payments", web::get().to(list_payments))
            .route("/payments/release", web::post().to(release_payout))
            .route("/payments/{seller_id}", web::get().to(seller_payment))
            .route("/sellers/commission", web::post().to(set_seller_commission))
            .route(
                "/sellers/{id}/commission",
                web::delete().to(clear_seller_commission),
            )
            .route("/settings", web::get().to(get_settings))
            .route("/settings/commission", web::post().to(set_global_commission))
            .route("/settings/payout", web::post().to(set_payout_settings))
            .route("/audit-logs", web::get().to(list_audit_logs))
            .route("/schema/refresh", web::post().to(refresh_schema)),
    );
}
