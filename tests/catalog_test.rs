mod common;

use axum::http::{Method, StatusCode};
use common::{read_json, TestApp};
use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::str::FromStr;
use uuid::Uuid;

struct Catalog {
    app: TestApp,
    tablet: i32,
    syrup: i32,
    abay: Uuid,
}

/// Two suppliers, three products:
/// Paracetamol 5.00 x100 and Amoxicillin 12.50 x40 (Abay, tablets),
/// Cough Syrup 85.25 x10 (Bekele, syrup).
async fn catalog() -> Catalog {
    let app = TestApp::new().await;
    let tablet = app.seed_dosage_form("Tablet").await;
    let syrup = app.seed_dosage_form("Syrup").await;
    let abay = app.seed_supplier("Abay", Some(Uuid::new_v4())).await;
    let bekele = app.seed_supplier("Bekele", Some(Uuid::new_v4())).await;

    app.seed_product(abay.id, tablet, "Amoxicillin", 40, dec!(12.50)).await;
    app.seed_product(abay.id, tablet, "Paracetamol", 100, dec!(5.00)).await;
    app.seed_product(bekele.id, syrup, "Cough Syrup", 10, dec!(85.25)).await;

    Catalog {
        app,
        tablet,
        syrup,
        abay: abay.id,
    }
}

fn names(page: &Value) -> Vec<String> {
    page["data"]
        .as_array()
        .expect("data array")
        .iter()
        .map(|p| p["name"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn price(product: &Value) -> Decimal {
    Decimal::from_str(product["price"].as_str().expect("price string")).expect("decimal price")
}

async fn get_page(app: &TestApp, query: &str) -> Value {
    let response = app
        .request(Method::GET, &format!("/api/v1/products{}", query), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK, "query: {query}");
    read_json(response).await
}

#[rstest]
#[case("", &["Paracetamol", "Amoxicillin", "Cough Syrup"])]
#[case("?ordering=-price", &["Cough Syrup", "Amoxicillin", "Paracetamol"])]
#[case("?ordering=-stock_quantity", &["Paracetamol", "Amoxicillin", "Cough Syrup"])]
#[case("?ordering=name", &["Amoxicillin", "Cough Syrup", "Paracetamol"])]
#[case("?q=amox", &["Amoxicillin"])]
#[case("?q=BEKELE", &["Cough Syrup"])]
#[case("?q=tablet&ordering=name", &["Amoxicillin", "Paracetamol"])]
#[case("?q=syrup", &["Cough Syrup"])]
#[case("?q=%20%20", &["Paracetamol", "Amoxicillin", "Cough Syrup"])]
#[case("?q=50%25", &[])]
#[tokio::test]
async fn catalog_search_and_ordering(#[case] query: &str, #[case] expected: &[&str]) {
    let catalog = catalog().await;

    let page = get_page(&catalog.app, query).await;

    assert_eq!(names(&page), expected);
    assert_eq!(page["total"], expected.len());
}

#[tokio::test]
async fn catalog_filters_and_pages() {
    let catalog = catalog().await;
    let app = &catalog.app;

    let page = get_page(app, &format!("?dosage_form={}", catalog.syrup)).await;
    assert_eq!(names(&page), ["Cough Syrup"]);

    let page = get_page(app, &format!("?dosage_form={}&ordering=-price", catalog.tablet)).await;
    assert_eq!(names(&page), ["Amoxicillin", "Paracetamol"]);

    let page = get_page(app, &format!("?supplier={}", catalog.abay)).await;
    assert_eq!(page["total"], 2);

    let page = get_page(app, "?per_page=2&page=2").await;
    assert_eq!(names(&page), ["Cough Syrup"]);
    assert_eq!(page["page"], 2);
    assert_eq!(page["per_page"], 2);
    assert_eq!(page["total"], 3);
    assert_eq!(page["total_pages"], 2);

    let response = app
        .request(Method::GET, "/api/v1/products?ordering=supplier", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn product_detail_uses_the_public_token() {
    let catalog = catalog().await;
    let app = &catalog.app;
    let page = get_page(app, "?q=amoxicillin").await;
    let token = page["data"][0]["product_id"].as_str().unwrap().to_string();

    let response = app
        .request(Method::GET, &format!("/api/v1/products/{}", token), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["name"], "Amoxicillin");
    assert_eq!(price(&body), dec!(12.50));
    assert_eq!(body["dosage_form"], json!({ "id": catalog.tablet, "name": "Tablet" }));
    assert_eq!(body["supplier"]["name"], "Abay");
    assert_eq!(body["supplier"]["telegram_link"], "https://t.me/abay");
    assert!(body.get("id").is_none());

    let response = app
        .request(Method::GET, "/api/v1/products/not-a-product", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn dosage_forms_are_listed_by_name() {
    let catalog = catalog().await;

    let response = catalog
        .app
        .request(Method::GET, "/api/v1/dosage-forms", None, None)
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        read_json(response).await,
        json!([
            { "id": catalog.syrup, "name": "Syrup" },
            { "id": catalog.tablet, "name": "Tablet" },
        ])
    );
}

#[tokio::test]
async fn supplier_manages_own_catalog() {
    let app = TestApp::new().await;
    let tablet = app.seed_dosage_form("Tablet").await;
    let owner = Uuid::new_v4();
    let supplier = app.seed_supplier("Abay", Some(owner)).await;
    let rival = app.seed_supplier("Bekele", Some(Uuid::new_v4())).await;
    let rivals_product = app.seed_product(rival.id, tablet, "Ibuprofen", 5, dec!(3.00)).await;
    let token = app.token_for(owner);

    let new_product = json!({
        "name": " Amoxicillin ",
        "strength": "500mg",
        "expire_date": "2027-12-31",
        "price": "12.50",
        "stock_quantity": 25,
        "dosage_form_id": tablet
    });
    let response = app
        .request(Method::POST, "/api/v1/supplier/products", Some(new_product.clone()), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created = read_json(response).await;
    assert_eq!(created["name"], "Amoxicillin");
    assert_eq!(created["stock_quantity"], 25);
    assert_eq!(created["supplier"]["id"], json!(supplier.id));
    let product_id = created["product_id"].as_str().unwrap().to_string();
    assert!(!product_id.is_empty());

    // same natural key again
    let response = app
        .request(Method::POST, "/api/v1/supplier/products", Some(new_product), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let list = read_json(
        app.request(Method::GET, "/api/v1/supplier/products", None, Some(&token))
            .await,
    )
    .await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["product_id"], product_id.as_str());

    let uri = format!("/api/v1/supplier/products/{}", product_id);
    let response = app
        .request(
            Method::PATCH,
            &uri,
            Some(json!({ "stock_quantity": 0, "price": "9.99", "expire_date": null })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = read_json(response).await;
    assert_eq!(updated["stock_quantity"], 0);
    assert_eq!(price(&updated), dec!(9.99));
    assert_eq!(updated["expire_date"], Value::Null);
    assert_eq!(updated["name"], "Amoxicillin");

    let fetched = read_json(app.request(Method::GET, &uri, None, Some(&token)).await).await;
    assert_eq!(fetched, updated);

    let response = app.request(Method::DELETE, &uri, None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let response = app.request(Method::GET, &uri, None, Some(&token)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // another supplier's product looks absent
    let foreign = format!("/api/v1/supplier/products/{}", rivals_product.product_id);
    for method in [Method::GET, Method::DELETE] {
        let response = app.request(method, &foreign, None, Some(&token)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    let response = app
        .request(Method::PATCH, &foreign, Some(json!({ "stock_quantity": 1 })), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.stock_of(rivals_product.id).await, 5);
}

#[rstest]
#[case(json!({ "stock_quantity": -1 }))]
#[case(json!({ "price": "-0.50" }))]
#[case(json!({ "name": "   " }))]
#[case(json!({ "dosage_form_id": 999 }))]
#[tokio::test]
async fn invalid_product_edits_change_nothing(#[case] patch: Value) {
    let app = TestApp::new().await;
    let tablet = app.seed_dosage_form("Tablet").await;
    let owner = Uuid::new_v4();
    let supplier = app.seed_supplier("Abay", Some(owner)).await;
    let amox = app.seed_product(supplier.id, tablet, "Amoxicillin", 7, dec!(12.50)).await;
    let token = app.token_for(owner);

    let response = app
        .request(
            Method::PATCH,
            &format!("/api/v1/supplier/products/{}", amox.product_id),
            Some(patch.clone()),
            Some(&token),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST, "patch: {patch}");
    assert_eq!(app.stock_of(amox.id).await, 7);

    let mut create = json!({
        "name": "Zinc",
        "strength": "20mg",
        "price": "1.50",
        "stock_quantity": 3,
        "dosage_form_id": tablet
    });
    for (field, value) in patch.as_object().unwrap() {
        create[field] = value.clone();
    }
    let response = app
        .request(Method::POST, "/api/v1/supplier/products", Some(create), Some(&token))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn ordered_products_cannot_be_deleted() {
    let app = TestApp::new().await;
    let tablet = app.seed_dosage_form("Tablet").await;
    let owner = Uuid::new_v4();
    let supplier = app.seed_supplier("Abay", Some(owner)).await;
    let amox = app.seed_product(supplier.id, tablet, "Amoxicillin", 10, dec!(12.50)).await;

    let order = json!({
        "full_name": "Hanna Tesfaye",
        "email_address": "hanna@example.com",
        "phone": "+251911000111",
        "pharmacy_name": "Tena Pharmacy",
        "delivery_address": "Kazanchis, Addis Ababa",
        "items": [{ "product_id": amox.product_id, "quantity": 2 }]
    });
    let response = app.request(Method::POST, "/api/v1/orders", Some(order), None).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .request(
            Method::DELETE,
            &format!("/api/v1/supplier/products/{}", amox.product_id),
            None,
            Some(&app.token_for(owner)),
        )
        .await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(app.stock_of(amox.id).await, 8);
}
