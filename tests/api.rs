mod common;

use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use common::*;
use local_basket_backend::handlers;
use local_basket_backend::middlewares::{AuthMiddleware, AuthUser};

macro_rules! init_app {
    ($ctx:expr) => {
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new($ctx.jwt.clone()))
                .app_data(web::Data::new($ctx.audit.clone()))
                .app_data(web::Data::new($ctx.sellers.clone()))
                .app_data(web::Data::new($ctx.commissions.clone()))
                .app_data(web::Data::new($ctx.orders.clone()))
                .app_data(web::Data::new($ctx.payouts.clone()))
                .app_data(web::Data::new($ctx.imports.clone()))
                .configure(handlers::health_config)
                .service(
                    web::scope("/api/v1")
                        .configure(handlers::order_config)
                        .configure(handlers::admin_config),
                ),
        )
        .await
    };
}

fn bearer(ctx: &TestContext, user: &AuthUser) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", ctx.token(user)))
}

fn new_order() -> Value {
    json!({
        "sellerId": SELLER_ID,
        "cart": [
            { "productId": 1, "name": "Paneer 200g", "unitPrice": "90.00", "quantity": 2 },
            { "productId": 2, "name": "Bread", "unitPrice": "45", "quantity": 1 }
        ],
        "customerName": "Asha",
        "pincode": "560001"
    })
}

#[actix_web::test]
async fn test_missing_token_is_rejected() {
    let ctx = setup().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get().uri("/api/v1/orders").to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get()
        .uri("/api/v1/orders")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let err = test::try_call_service(&app, req).await.unwrap_err();
    assert_eq!(
        err.as_response_error().status_code(),
        StatusCode::UNAUTHORIZED
    );

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_order_flow_over_http() {
    let ctx = setup().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/orders")
        .insert_header(bearer(&ctx, &CUSTOMER))
        .set_json(new_order())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["totalAmount"], "225.00");
    assert_eq!(body["data"]["status"], "PLACED");
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/orders/{id}/status"))
        .insert_header(bearer(&ctx, &seller(SELLER_ID)))
        .set_json(json!({ "status": "OUT_FOR_DELIVERY", "expectedStatus": "PLACED" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["displayStatus"], "OUT FOR DELIVERY");

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/orders/{id}/status"))
        .insert_header(bearer(&ctx, &seller(SELLER_ID)))
        .set_json(json!({ "status": "PACKED" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/orders/{id}/events"))
        .insert_header(bearer(&ctx, &CUSTOMER))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 2);
}

#[actix_web::test]
async fn test_cancel_over_http_renders_attribution() {
    let ctx = setup().await;
    let app = init_app!(ctx);
    let order = ctx
        .orders
        .create_order(&CUSTOMER, serde_json::from_value(new_order()).unwrap())
        .await
        .unwrap();

    // 请求体里的角色与令牌不符
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/orders/{}/status", order.id))
        .insert_header(bearer(&ctx, &CUSTOMER))
        .set_json(json!({ "status": "CANCELLED", "actorRole": "SELLER", "reason": "x" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/orders/{}/status", order.id))
        .insert_header(bearer(&ctx, &CUSTOMER))
        .set_json(json!({ "status": "CANCELLED" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "MISSING_REASON");

    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/orders/{}/status", order.id))
        .insert_header(bearer(&ctx, &CUSTOMER))
        .set_json(json!({
            "status": "CANCELED",
            "actorRole": "CUSTOMER",
            "reason": "Changed my mind"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    let data = &body["data"];
    assert_eq!(data["statusLabel"], "CANCELLED BY CUSTOMER");
    assert_eq!(data["previousStatus"], "PLACED");
    assert_eq!(data["attribution"]["actor"], "CUSTOMER");
    assert_eq!(data["attribution"]["source"], "STORED");
    assert_eq!(data["timeline"][1]["state"], "crossed");
    assert_eq!(data["timeline"][5]["state"], "terminal");

    // 已是终态
    let req = test::TestRequest::put()
        .uri(&format!("/api/v1/orders/{}/status", order.id))
        .insert_header(bearer(&ctx, &seller(SELLER_ID)))
        .set_json(json!({ "status": "REJECTED", "reason": "Out of stock" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/orders/{}", order.id))
        .insert_header(bearer(&ctx, &OTHER_CUSTOMER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get()
        .uri("/api/v1/orders/424242")
        .insert_header(bearer(&ctx, &ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_admin_routes() {
    let ctx = setup().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/payments")
        .insert_header(bearer(&ctx, &CUSTOMER))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/sellers/commission")
        .insert_header(bearer(&ctx, &ADMIN))
        .set_json(json!({ "sellerId": SELLER_ID, "percent": "12.5" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["percent"], "12.50");

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/payments")
        .insert_header(bearer(&ctx, &ADMIN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let rows = body["data"].as_array().unwrap();
    assert_eq!(rows.len(), 2);
    let row = rows
        .iter()
        .find(|r| r["sellerId"] == SELLER_ID)
        .unwrap();
    assert_eq!(row["commissionPercent"], "12.50");
    assert_eq!(row["commissionSource"], "SELLER");
    assert_eq!(row["payoutStatus"], "PAID");
    assert_eq!(row["kycComplete"], true);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/payments/release")
        .insert_header(bearer(&ctx, &ADMIN))
        .set_json(json!({ "sellerId": SELLER_NO_KYC_ID }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "KYC_INCOMPLETE");

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/payments/release")
        .insert_header(bearer(&ctx, &ADMIN))
        .set_json(json!({ "sellerId": SELLER_ID }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::delete()
        .uri(&format!("/api/v1/admin/sellers/{SELLER_ID}/commission"))
        .insert_header(bearer(&ctx, &ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/audit-logs?action=PAYOUT_RELEASED")
        .insert_header(bearer(&ctx, &ADMIN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["pagination"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["subjectId"], SELLER_ID);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/schema/refresh")
        .insert_header(bearer(&ctx, &ADMIN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(
        body["data"]["sellerColumns"]
            .as_array()
            .unwrap()
            .contains(&json!("bank_ifsc"))
    );
}

#[actix_web::test]
async fn test_payout_settings_over_http() {
    let ctx = setup().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/settings/payout")
        .insert_header(bearer(&ctx, &ADMIN))
        .set_json(json!({ "payout_cycle": "Monthly", "min_payout": "100" }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["payoutCycle"], "MONTHLY");
    assert_eq!(body["data"]["minPayout"], "100.00");

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/settings")
        .insert_header(bearer(&ctx, &ADMIN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["payout"]["payoutCycle"], "MONTHLY");
    assert_eq!(body["data"]["payout"]["minPayout"], "100.00");
    assert_eq!(body["data"]["commission"]["percent"], "10.00");

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/settings/payout")
        .insert_header(bearer(&ctx, &ADMIN))
        .set_json(json!({ "payoutCycle": "hourly" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/settings/payout")
        .insert_header(bearer(&ctx, &seller(SELLER_ID)))
        .set_json(json!({ "payoutCycle": "WEEKLY" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn test_unresolvable_attribution_is_422() {
    let ctx = setup().await;
    let app = init_app!(ctx);

    let req = test::TestRequest::post()
        .uri("/api/v1/admin/orders/import")
        .insert_header(bearer(&ctx, &ADMIN))
        .set_json(json!({
            "orders": [{
                "sellerId": SELLER_ID,
                "customerId": CUSTOMER.id,
                "status": "REJECTED",
                "total": "75.00"
            }]
        }))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["unresolved"], 1);
    let id = body["data"]["imported"][0]["orderId"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/v1/admin/orders/{id}/attribution"))
        .insert_header(bearer(&ctx, &ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "ATTRIBUTION_UNRESOLVABLE");

    let req = test::TestRequest::get()
        .uri("/api/v1/admin/orders")
        .insert_header(bearer(&ctx, &ADMIN))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let flags = &body["data"]["items"][0]["dataQuality"];
    assert!(
        flags
            .as_array()
            .unwrap()
            .contains(&json!("ATTRIBUTION_UNRESOLVABLE"))
    );
}
