mod common;

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};

use common::{body_json, TestApp};

// Decimals lose their scale on the way through the database, so money
// assertions compare values rather than rendered strings.
fn decimal_field(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn staff_can_manage_the_supplier_directory() {
    let app = TestApp::new().await;

    // Create
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({
                "name": "Acme Industrial Supply",
                "contact_person": "Grace Chen",
                "email": "grace@acme.example",
                "phone": "+1-555-0201",
                "address": "1200 Harbor Blvd, Oakland, CA",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["name"], "Acme Industrial Supply");
    let supplier_id = body["data"]["id"].as_str().unwrap().to_string();

    // Read back as a non-staff user
    let response = app
        .request_as_clerk(
            Method::GET,
            &format!("/api/v1/suppliers/{}", supplier_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["contact_person"], "Grace Chen");

    // Partial update
    let response = app
        .request_as_staff(
            Method::PUT,
            &format!("/api/v1/suppliers/{}", supplier_id),
            Some(json!({ "contact_person": "Tom Ruiz" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["contact_person"], "Tom Ruiz");
    assert_eq!(body["data"]["name"], "Acme Industrial Supply");

    // Delete
    let response = app
        .request_as_staff(
            Method::DELETE,
            &format!("/api/v1/suppliers/{}", supplier_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // Gone
    let response = app
        .request_as_staff(
            Method::GET,
            &format!("/api/v1/suppliers/{}", supplier_id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not Found");
}

#[tokio::test]
async fn supplier_writes_are_staff_only() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Northline Fasteners").await;

    let payload = json!({
        "name": "Should Not Exist",
        "contact_person": "Nobody",
        "email": "nobody@example.com",
        "phone": "+1-555-0000",
        "address": "0 Nowhere Lane",
    });

    let response = app
        .request_as_clerk(Method::POST, "/api/v1/suppliers", Some(payload.clone()))
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"]["code"], "AUTH_INSUFFICIENT_PERMISSIONS");

    let response = app
        .request_as_clerk(
            Method::PUT,
            &format!("/api/v1/suppliers/{}", supplier.id),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_as_clerk(
            Method::DELETE,
            &format!("/api/v1/suppliers/{}", supplier.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Reads stay open to any authenticated user
    let response = app
        .request_as_clerk(Method::GET, "/api/v1/suppliers", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn supplier_payloads_are_validated() {
    let app = TestApp::new().await;

    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/suppliers",
            Some(json!({
                "name": "Bad Email Co",
                "contact_person": "A Person",
                "email": "not-an-email",
                "phone": "+1-555-0300",
                "address": "1 Somewhere",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Bad Request");
}

#[tokio::test]
async fn items_can_be_created_updated_and_deleted() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Brightpack Packaging").await;

    // Create with an explicit supplier link
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "name": "Shipping Box 40cm",
                "sku": "BX-40",
                "description": "Corrugated single-wall box",
                "quantity": 310,
                "price": "1.10",
                "supplier_id": supplier.id,
                "threshold": 100,
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["data"]["sku"], "BX-40");
    assert_eq!(decimal_field(&body["data"]["price"]), dec!(1.10));
    assert_eq!(body["data"]["supplier_name"], "Brightpack Packaging");
    assert_eq!(body["data"]["is_low_stock"], false);
    let item_id = body["data"]["id"].as_str().unwrap().to_string();

    // Duplicate SKU is rejected
    let response = app
        .request_as_staff(
            Method::POST,
            "/api/v1/items",
            Some(json!({
                "name": "Another Box",
                "sku": "BX-40",
                "price": "2.00",
            })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("already exists"));

    // Update price and threshold; quantity is not updatable here
    let response = app
        .request_as_staff(
            Method::PUT,
            &format!("/api/v1/items/{}", item_id),
            Some(json!({ "price": "1.25", "threshold": 350 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(decimal_field(&body["data"]["price"]), dec!(1.25));
    assert_eq!(body["data"]["threshold"], 350);
    // 310 on hand with threshold 350 is now low stock
    assert_eq!(body["data"]["is_low_stock"], true);
    // Supplier was left untouched because the field was absent
    assert_eq!(body["data"]["supplier_name"], "Brightpack Packaging");

    // An explicit null clears the supplier link
    let response = app
        .request_as_staff(
            Method::PUT,
            &format!("/api/v1/items/{}", item_id),
            Some(json!({ "supplier_id": null })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["supplier_id"].is_null());
    assert!(body["data"]["supplier_name"].is_null());

    // Delete
    let response = app
        .request_as_staff(Method::DELETE, &format!("/api/v1/items/{}", item_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = app
        .request_as_staff(Method::GET, &format!("/api/v1/items/{}", item_id), None)
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn item_writes_are_staff_only() {
    let app = TestApp::new().await;
    let item = app
        .seed_item("Packing Tape", "PT-48", 95, dec!(2.85), 30, None)
        .await;

    let response = app
        .request_as_clerk(
            Method::POST,
            "/api/v1/items",
            Some(json!({ "name": "Nope", "sku": "NO-1", "price": "1.00" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_as_clerk(
            Method::PUT,
            &format!("/api/v1/items/{}", item.id),
            Some(json!({ "price": "9.99" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .request_as_clerk(Method::DELETE, &format!("/api/v1/items/{}", item.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // Reads are fine
    let response = app
        .request_as_clerk(Method::GET, &format!("/api/v1/items/{}", item.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn deleting_a_supplier_detaches_its_items() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Evergreen Chemical Co").await;
    let item = app
        .seed_item("Degreaser 5L", "DG-5L", 8, dec!(31.40), 10, Some(supplier.id))
        .await;

    let response = app
        .request_as_staff(
            Method::DELETE,
            &format!("/api/v1/suppliers/{}", supplier.id),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    // The item survives with its supplier reference cleared
    let response = app
        .request_as_staff(Method::GET, &format!("/api/v1/items/{}", item.id), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["data"]["supplier_id"].is_null());
    assert_eq!(body["data"]["quantity"], 8);
}

#[tokio::test]
async fn item_listing_supports_search_filters_and_sorting() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Industrial Supply").await;

    app.seed_item("Hex Bolt M8x40", "HB-M8-40", 240, dec!(12.50), 50, Some(supplier.id))
        .await;
    app.seed_item("Hex Nut M8", "HN-M8", 35, dec!(9.75), 40, Some(supplier.id))
        .await;
    app.seed_item("Label Sheets A4", "LB-A4", 57, dec!(6.30), 10, None)
        .await;

    // Substring search over name/SKU/description
    let response = app
        .request_as_clerk(Method::GET, "/api/v1/items?search=hex", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 2);

    // Low stock only (35 <= 40)
    let response = app
        .request_as_clerk(Method::GET, "/api/v1/items?low_stock=true", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 1);
    assert_eq!(body["data"]["items"][0]["sku"], "HN-M8");

    // Supplier filter
    let response = app
        .request_as_clerk(
            Method::GET,
            &format!("/api/v1/items?supplier_id={}", supplier.id),
            None,
        )
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 2);

    // Sort by price ascending
    let response = app
        .request_as_clerk(Method::GET, "/api/v1/items?sort_by=price", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["items"][0]["sku"], "LB-A4");
    assert_eq!(body["data"]["items"][2]["sku"], "HB-M8-40");

    // Unknown sort field is a validation error
    let response = app
        .request_as_clerk(Method::GET, "/api/v1/items?sort_by=colour", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Pagination bounds are enforced
    let response = app
        .request_as_clerk(Method::GET, "/api/v1/items?per_page=500", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .request_as_clerk(Method::GET, "/api/v1/items?page=1&per_page=2", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total"], 3);
    assert_eq!(body["data"]["total_pages"], 2);
    assert_eq!(body["data"]["items"].as_array().unwrap().len(), 2);
}
