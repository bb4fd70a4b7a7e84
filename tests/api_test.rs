mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use rstest::rstest;
use pharmagebeya_api::entities::notification;
use rust_decimal_macros::dec;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde_json::{json, Value};
use uuid::Uuid;

fn order_body(product_id: &str, quantity: i32) -> Value {
    json!({
        "full_name": "Hanna Tesfaye",
        "email_address": "hanna@example.com",
        "phone": "+251911000111",
        "pharmacy_name": "Tena Pharmacy",
        "delivery_address": "Kazanchis, Addis Ababa",
        "items": [{ "product_id": product_id, "quantity": quantity }]
    })
}

#[tokio::test]
async fn health_and_metrics_respond() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/api/v1/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "up");

    let response = app.request(Method::GET, "/metrics", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn anonymous_buyer_can_place_an_order() {
    let app = TestApp::new().await;
    let tablet = app.seed_dosage_form("Tablet").await;
    let supplier = app.seed_supplier("Abay", Some(Uuid::new_v4())).await;
    let amox = app.seed_product(supplier.id, tablet, "Amoxicillin", 10, dec!(12.50)).await;

    let response = app
        .request(Method::POST, "/api/v1/orders", Some(order_body(&amox.product_id, 2)), None)
        .await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["message"], "Order created successfully");
    assert!(Uuid::parse_str(body["order_id"].as_str().unwrap()).is_ok());
    assert_eq!(app.stock_of(amox.id).await, 8);
}

#[tokio::test]
async fn bad_order_payloads_are_400() {
    let app = TestApp::new().await;
    let tablet = app.seed_dosage_form("Tablet").await;
    let supplier = app.seed_supplier("Abay", None).await;
    let amox = app.seed_product(supplier.id, tablet, "Amoxicillin", 1, dec!(12.50)).await;

    let mut bad_email = order_body(&amox.product_id, 1);
    bad_email["email_address"] = json!("nope");
    let cases = vec![
        json!({ "full_name": "Missing everything else" }),
        bad_email,
        order_body(&amox.product_id, 5),
        order_body("unknown-product", 1),
    ];

    for body in cases {
        let response = app.request(Method::POST, "/api/v1/orders", Some(body.clone()), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "payload: {body}");
        let error = read_json(response).await;
        assert!(error["message"].is_string());
        assert!(error["timestamp"].is_string());
    }

    let response = app
        .request_raw(Method::POST, "/api/v1/orders", "application/json", b"{not json".to_vec())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.stock_of(amox.id).await, 1);
}

#[tokio::test]
async fn supplier_routes_require_a_supplier_token() {
    let app = TestApp::new().await;
    let supplier_user = Uuid::new_v4();
    app.seed_supplier("Abay", Some(supplier_user)).await;

    let response = app.request(Method::GET, "/api/v1/supplier/orders", None, None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .request(Method::GET, "/api/v1/supplier/orders", None, Some("garbage"))
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let buyer = app.token_for(Uuid::new_v4());
    let response = app
        .request(Method::GET, "/api/v1/supplier/orders", None, Some(&buyer))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let token = app.token_for(supplier_user);
    let response = app
        .request(Method::GET, "/api/v1/supplier/orders", None, Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await, json!([]));
}

#[rstest]
#[case(Method::GET, "/api/v1/supplier/orders")]
#[case(Method::GET, "/api/v1/supplier/orders/5f0c7d4e-2f6b-4a55-9a1e-0d7c4a3b2e11")]
#[case(Method::POST, "/api/v1/supplier/products/import")]
#[case(Method::GET, "/api/v1/supplier/products")]
#[case(Method::POST, "/api/v1/supplier/products")]
#[case(Method::PATCH, "/api/v1/supplier/products/3b1f6c0e9d2a4f7b8c5e1a2d3f4b5c6d")]
#[case(Method::DELETE, "/api/v1/supplier/products/3b1f6c0e9d2a4f7b8c5e1a2d3f4b5c6d")]
#[case(Method::GET, "/api/v1/notifications")]
#[case(Method::PATCH, "/api/v1/notifications/read-all")]
#[case(Method::POST, "/api/v1/notifications/5f0c7d4e-2f6b-4a55-9a1e-0d7c4a3b2e11/read")]
#[tokio::test]
async fn protected_routes_reject_anonymous_callers(#[case] method: Method, #[case] uri: &str) {
    let app = TestApp::new().await;

    let response = app.request(method, uri, None, None).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(read_json(response).await["error"], "Unauthorized");
}

#[tokio::test]
async fn supplier_manages_order_over_http() {
    let app = TestApp::new().await;
    let tablet = app.seed_dosage_form("Tablet").await;
    let supplier_user = Uuid::new_v4();
    let supplier = app.seed_supplier("Abay", Some(supplier_user)).await;
    let amox = app.seed_product(supplier.id, tablet, "Amoxicillin", 10, dec!(12.50)).await;
    let token = app.token_for(supplier_user);

    let created = read_json(
        app.request(Method::POST, "/api/v1/orders", Some(order_body(&amox.product_id, 3)), None)
            .await,
    )
    .await;
    let order_id = created["order_id"].as_str().unwrap().to_string();

    let list = read_json(
        app.request(Method::GET, "/api/v1/supplier/orders", None, Some(&token))
            .await,
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["id"], order_id.as_str());
    assert_eq!(list[0]["has_expired"], false);

    let uri = format!("/api/v1/supplier/orders/{}", order_id);
    let detail = app.request(Method::GET, &uri, None, Some(&token)).await;
    assert_eq!(detail.status(), StatusCode::OK);
    let detail = read_json(detail).await;
    assert_eq!(detail["status"], "pending");
    assert_eq!(detail["items"].as_array().unwrap().len(), 1);

    let response = app
        .request(Method::PATCH, &uri, Some(json!({ "status": "cancelled" })), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["status"], "cancelled");
    assert_eq!(app.stock_of(amox.id).await, 10);

    let response = app
        .request(Method::PATCH, &uri, Some(json!({ "status": "shipped" })), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let other_user = Uuid::new_v4();
    app.seed_supplier("Bekele", Some(other_user)).await;
    let response = app
        .request(Method::GET, &uri, None, Some(&app.token_for(other_user)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn import_endpoint_accepts_multipart_file() {
    let app = TestApp::new().await;
    app.seed_dosage_form("Tablet").await;
    let supplier_user = Uuid::new_v4();
    app.seed_supplier("Abay", Some(supplier_user)).await;
    let token = app.token_for(supplier_user);
    let csv = "name,strength,price,stock,form\nAmoxicillin,500mg,12.50,10,Tablet\nZinc,20mg,-1,3,Tablet\n";

    let response = app
        .upload("/api/v1/supplier/products/import", &token, "file", "catalog.csv", csv.as_bytes())
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["created"], 1);
    assert_eq!(body["updated"], 0);
    assert_eq!(body["errors"], json!(["Row 3: Invalid price '-1'"]));
    assert_eq!(body["message"], "Imported 1 new products, Updated 0 existing products");

    let response = app
        .upload("/api/v1/supplier/products/import", &token, "attachment", "catalog.csv", csv.as_bytes())
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .upload("/api/v1/supplier/products/import", &token, "file", "catalog.pdf", b"%PDF-1.4")
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn abuse_report_notifies_supplier_once() {
    let app = TestApp::new().await;
    let tablet = app.seed_dosage_form("Tablet").await;
    let supplier_user = Uuid::new_v4();
    let supplier = app.seed_supplier("Abay", Some(supplier_user)).await;
    let amox = app.seed_product(supplier.id, tablet, "Amoxicillin", 10, dec!(12.50)).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/reports",
            Some(json!({
                "product_id": amox.product_id,
                "reporter_email": "watchdog@example.com",
                "reason": "counterfeit",
                "description": "Packaging looks wrong"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let report = read_json(response).await;
    assert_eq!(report["reason"], "counterfeit");
    assert_eq!(report["product_id"], amox.product_id.as_str());

    let notes = notification::Entity::find()
        .filter(notification::Column::RecipientId.eq(supplier_user))
        .all(&*app.db)
        .await
        .unwrap();
    assert_eq!(notes.len(), 1);
    assert!(notes[0].message.starts_with("Your product 'Amoxicillin' has been reported."));

    let response = app
        .request(
            Method::POST,
            "/api/v1/reports",
            Some(json!({
                "product_id": amox.product_id,
                "reporter_email": "watchdog@example.com",
                "reason": "because"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request(
            Method::POST,
            "/api/v1/reports",
            Some(json!({
                "product_id": amox.id,
                "reporter_email": "watchdog@example.com",
                "reason": "spam"
            })),
            None,
        )
        .await;
    // reports address products by their public token only
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn users_read_only_their_notifications() {
    let app = TestApp::new().await;
    let owner = Uuid::new_v4();
    let stranger = Uuid::new_v4();
    let notifications = &app.state.services.notifications;
    let first = notifications.create(owner, "first".into()).await.unwrap();
    notifications.create(owner, "second".into()).await.unwrap();

    let token = app.token_for(owner);
    let list = read_json(
        app.request(Method::GET, "/api/v1/notifications", None, Some(&token))
            .await,
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 2);

    let uri = format!("/api/v1/notifications/{}/read", first.id);
    let response = app
        .request(Method::POST, &uri, None, Some(&app.token_for(stranger)))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.request(Method::POST, &uri, None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(read_json(response).await["is_read"], true);

    let response = app
        .request(Method::PATCH, "/api/v1/notifications/read-all", None, Some(&token))
        .await;
    assert_eq!(read_json(response).await["updated"], 1);
}
