use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::database::SchemaDescriptor;
use crate::domain::attribution::{Attribution, AttributionSource};
use crate::domain::legacy::LegacySource;
use crate::domain::payout::{CommissionSource, PayoutStatus};
use crate::domain::timeline::{StepState, TimelineRow};
use crate::entities::{
    ActorRole, AuditAction, OrderStatus, PaymentMethod, PaymentStatus, PayoutCycle,
};
use crate::handlers;
use crate::models::*;
use crate::utils::PaginationInfo;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::order::create_order,
        handlers::order::get_orders,
        handlers::order::get_order,
        handlers::order::get_order_events,
        handlers::order::update_order_status,
        handlers::admin::list_orders,
        handlers::admin::order_attribution,
        handlers::admin::import_orders,
        handlers::admin::list_payments,
        handlers::admin::seller_payment,
        handlers::admin::release_payout,
        handlers::admin::set_seller_commission,
        handlers::admin::clear_seller_commission,
        handlers::admin::set_global_commission,
        handlers::admin::set_payout_settings,
        handlers::admin::get_settings,
        handlers::admin::list_audit_logs,
        handlers::admin::refresh_schema,
    ),
    components(
        schemas(
            OrderStatus,
            ActorRole,
            PaymentMethod,
            PaymentStatus,
            AuditAction,
            CartItem,
            CreateOrderRequest,
            UpdateStatusRequest,
            OrderResponse,
            OrderEventResponse,
            AttributionResponse,
            Attribution,
            AttributionSource,
            StrictAttributionResponse,
            DataQualityFlag,
            TimelineRow,
            StepState,
            PaginationInfo,
            ImportOrdersRequest,
            ImportOrdersResponse,
            ImportedOrder,
            LegacySource,
            PaymentSummary,
            PaymentLine,
            CommissionSource,
            PayoutStatus,
            ReleasePayoutRequest,
            ReleasePayoutResponse,
            SetSellerCommissionRequest,
            SetGlobalCommissionRequest,
            SellerCommissionResponse,
            GlobalCommissionResponse,
            PayoutCycle,
            SetPayoutSettingsRequest,
            PayoutSettingsResponse,
            SettingsResponse,
            AuditLogResponse,
            SchemaDescriptor,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "order", description = "Order lifecycle API"),
        (name = "admin", description = "Payouts, commission, import and audit API"),
    ),
    info(
        title = "Local Basket Backend API",
        version = "1.0.0",
        description = "Order lifecycle and attribution engine of the Local Basket marketplace"
    ),
    servers(
        (url = "/api/v1", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
