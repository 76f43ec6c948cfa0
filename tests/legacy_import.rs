mod common;

use common::*;
use local_basket_backend::AppError;
use local_basket_backend::domain::attribution::AttributionSource;
use local_basket_backend::domain::legacy::LegacySource;
use local_basket_backend::domain::timeline::StepState;
use local_basket_backend::entities::{ActorRole, OrderStatus};
use local_basket_backend::models::{DataQualityFlag, ImportOrdersRequest, OrderQuery};
use rust_decimal_macros::dec;
use serde_json::json;

fn request(rows: serde_json::Value) -> ImportOrdersRequest {
    serde_json::from_value(json!({ "orders": rows })).unwrap()
}

#[tokio::test]
async fn test_import_resolves_legacy_attribution() {
    let ctx = setup().await;
    let result = ctx
        .imports
        .import_orders(
            &ADMIN,
            request(json!([
                {
                    "id": "A-1",
                    "seller_id": SELLER_ID,
                    "customer_id": CUSTOMER.id,
                    "status": "canceled",
                    "total": "250.00",
                    "cart": [
                        { "id": 5, "product_name": "Toor dal 1kg", "price": "125.00", "qty": 2 }
                    ],
                    "cancelled_by": "customer",
                    "cancel_reason": "Ordered by mistake",
                    "previous_status": "confirmed",
                    "createdAt": "2024-11-02T10:00:00Z",
                    "updatedAt": "2024-11-02T10:20:00Z"
                },
                {
                    "id": "A-2",
                    "seller_id": SELLER_ID,
                    "customer_id": CUSTOMER.id,
                    "status": "REJECTED",
                    "total": 80,
                    "status_history": [
                        { "status": "PLACED" },
                        { "status": "REJECTED", "updated_by": "store", "reason": "Closed today",
                          "from_status": "PLACED" }
                    ]
                },
                {
                    "id": "A-3",
                    "seller_id": SELLER_ID,
                    "customer_id": CUSTOMER.id,
                    "status": "CANCELLED",
                    "total": "99.90",
                    "reason": "Found cheaper elsewhere"
                }
            ])),
        )
        .await
        .unwrap();

    assert_eq!(result.imported.len(), 3);
    assert_eq!(result.unresolved, 0);

    let explicit = &result.imported[0];
    assert_eq!(explicit.legacy_id, Some(json!("A-1")));
    assert_eq!(explicit.status, OrderStatus::Cancelled);
    assert_eq!(explicit.actor, Some(ActorRole::Customer));
    assert_eq!(explicit.source, LegacySource::Explicit);
    assert_eq!(explicit.previous_status, Some(OrderStatus::Confirmed));

    let history = &result.imported[1];
    assert_eq!(history.actor, Some(ActorRole::Seller));
    assert_eq!(history.source, LegacySource::History);
    assert_eq!(history.reason.as_deref(), Some("Closed today"));
    assert_eq!(history.previous_status, Some(OrderStatus::Placed));

    let heuristic = &result.imported[2];
    assert_eq!(heuristic.actor, Some(ActorRole::Customer));
    assert_eq!(heuristic.source, LegacySource::Heuristic);

    // 导入后读取路径看到的是规范列
    let order = ctx
        .orders
        .get_order(&CUSTOMER, explicit.order_id)
        .await
        .unwrap();
    assert_eq!(order.total_amount, dec!(250.00));
    assert_eq!(order.cart.len(), 1);
    assert_eq!(order.cart[0].product_id, 5);
    assert_eq!(order.cart[0].name, "Toor dal 1kg");
    assert_eq!(order.cart[0].unit_price, dec!(125.00));
    assert_eq!(order.cart[0].quantity, 2);
    assert_eq!(order.status_label, "CANCELLED BY CUSTOMER");
    assert_eq!(order.attribution.source, AttributionSource::Stored);
    assert_eq!(order.timeline[1].state, StepState::Active);
    assert!(order.data_quality.is_empty());

    // 事件日志与缓存列一致
    let strict = ctx
        .orders
        .strict_attribution(&ADMIN, history.order_id)
        .await
        .unwrap();
    assert_eq!(strict.attribution.actor, Some(ActorRole::Seller));
}

#[tokio::test]
async fn test_cancelled_without_previous_status_defaults_stop_index() {
    let ctx = setup().await;
    let result = ctx
        .imports
        .import_orders(
            &ADMIN,
            request(json!([{
                "seller_id": SELLER_ID,
                "customer_id": CUSTOMER.id,
                "status": "CANCELLED",
                "total": "40"
            }])),
        )
        .await
        .unwrap();

    assert_eq!(result.unresolved, 1);
    let imported = &result.imported[0];
    assert_eq!(imported.source, LegacySource::Unresolved);
    assert_eq!(imported.actor, None);

    let order = ctx
        .orders
        .get_order(&ADMIN, imported.order_id)
        .await
        .unwrap();
    assert_eq!(order.previous_status, None);
    assert_eq!(order.timeline[0].state, StepState::Active);
    assert_eq!(order.timeline[5].label, "CANCELLED by unknown");
    assert!(!order.attribution.resolved);
    assert_eq!(order.attribution.source, AttributionSource::Unresolved);
    assert!(order
        .data_quality
        .contains(&DataQualityFlag::AttributionUnresolvable));
    assert!(order
        .data_quality
        .contains(&DataQualityFlag::PreviousStatusMissing));

    let err = ctx
        .orders
        .strict_attribution(&ADMIN, imported.order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::AttributionUnresolvable(id) if id == imported.order_id));
}

#[tokio::test]
async fn test_imported_delivered_orders_are_payable() {
    let ctx = setup().await;
    ctx.imports
        .import_orders(
            &ADMIN,
            request(json!([{
                "seller_id": SELLER_ID,
                "customer_id": CUSTOMER.id,
                "status": "Delivered",
                "total": "1000",
                "created_at": "2024-10-01T08:00:00Z",
                "delivered_at": "2024-10-01T09:30:00Z"
            }])),
        )
        .await
        .unwrap();

    let summary = ctx.payouts.seller_payment(&ADMIN, SELLER_ID).await.unwrap();
    assert_eq!(summary.order_count, 1);
    assert_eq!(summary.seller_payout, dec!(900.00));
}

#[tokio::test]
async fn test_bad_row_rolls_back_the_batch() {
    let ctx = setup().await;
    let err = ctx
        .imports
        .import_orders(
            &ADMIN,
            request(json!([
                {
                    "seller_id": SELLER_ID,
                    "customer_id": CUSTOMER.id,
                    "status": "PLACED",
                    "total": "10"
                },
                {
                    "seller_id": SELLER_ID,
                    "customer_id": CUSTOMER.id,
                    "status": "LOST_IN_TRANSIT",
                    "total": "10"
                }
            ])),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let all = ctx
        .orders
        .list_orders(&ADMIN, &OrderQuery::default())
        .await
        .unwrap();
    assert_eq!(all.pagination.total, 0);

    let err = ctx
        .imports
        .import_orders(
            &ADMIN,
            request(json!([{
                "seller_id": SELLER_ID,
                "customer_id": CUSTOMER.id,
                "status": "PLACED",
                "total": "10",
                "cart": [{ "name": "Mystery item" }]
            }])),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));

    let err = ctx
        .imports
        .import_orders(&seller(SELLER_ID), request(json!([])))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));
}
