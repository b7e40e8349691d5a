mod common;

use axum::http::{header, Method, StatusCode};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use common::{body_json, body_string, TestApp};

// Decimals lose their scale on the way through the database, so money
// assertions compare values rather than rendered strings.
fn decimal_field(value: &Value) -> Decimal {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn dashboard_reports_totals_over_the_whole_inventory() {
    let app = TestApp::new().await;
    app.seed_item("Widget A", "WA-1", 5, dec!(10.00), 10, None)
        .await;
    app.seed_item("Widget B", "WB-1", 20, dec!(5.00), 10, None)
        .await;

    let response = app
        .request_as_clerk(Method::GET, "/api/v1/items/dashboard", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["total_items"], 2);
    // 5 on hand with threshold 10 is the only low item
    assert_eq!(body["data"]["low_stock_items"], 1);
    // 5 * 10.00 + 20 * 5.00
    assert_eq!(
        decimal_field(&body["data"]["total_stock_value"]),
        dec!(150.00)
    );
    assert!(body["data"]["recent_transactions"]
        .as_array()
        .unwrap()
        .is_empty());
    assert!(body["data"]["generated_at"].is_string());
}

#[tokio::test]
async fn dashboard_counts_stock_at_threshold_as_low() {
    let app = TestApp::new().await;
    app.seed_item("At Threshold", "AT-1", 10, dec!(1.00), 10, None)
        .await;
    app.seed_item("Above Threshold", "AB-1", 11, dec!(1.00), 10, None)
        .await;

    let response = app
        .request_as_clerk(Method::GET, "/api/v1/items/dashboard", None)
        .await;
    let body = body_json(response).await;
    assert_eq!(body["data"]["total_items"], 2);
    assert_eq!(body["data"]["low_stock_items"], 1);
}

#[tokio::test]
async fn dashboard_shows_the_five_most_recent_transactions() {
    let app = TestApp::new().await;
    let item = app
        .seed_item("Hex Bolt M8x40", "HB-M8-40", 500, dec!(12.50), 50, None)
        .await;

    let base = Utc::now() - Duration::days(10);
    let mut older = Vec::new();
    for day in 0..5 {
        let tx = app
            .seed_transaction(
                item.id,
                if day % 2 == 0 { "IN" } else { "OUT" },
                day + 1,
                Some(app.staff.id),
                base + Duration::days(i64::from(day)),
            )
            .await;
        older.push(tx);
    }
    // Two movements recorded at the same instant; their relative order
    // falls back to the id column and stays stable across reads.
    let tied_at = base + Duration::days(6);
    let tied_a = app
        .seed_transaction(item.id, "IN", 40, Some(app.staff.id), tied_at)
        .await;
    let tied_b = app
        .seed_transaction(item.id, "OUT", 7, Some(app.clerk.id), tied_at)
        .await;
    let (tied_first, tied_second) = if tied_a.id > tied_b.id {
        (&tied_a, &tied_b)
    } else {
        (&tied_b, &tied_a)
    };

    let response = app
        .request_as_staff(Method::GET, "/api/v1/items/dashboard", None)
        .await;
    let body = body_json(response).await;
    let recent = body["data"]["recent_transactions"].as_array().unwrap();
    assert_eq!(recent.len(), 5);

    assert_eq!(recent[0]["id"], tied_first.id.to_string());
    assert_eq!(recent[1]["id"], tied_second.id.to_string());
    assert_eq!(recent[2]["id"], older[4].id.to_string());
    assert_eq!(recent[3]["id"], older[3].id.to_string());
    assert_eq!(recent[4]["id"], older[2].id.to_string());

    // Entries are enriched with the item name and acting username
    assert_eq!(recent[2]["item_name"], "Hex Bolt M8x40");
    assert_eq!(recent[2]["username"], "admin");
    let clerk_position = if tied_first.id == tied_b.id { 0 } else { 1 };
    assert_eq!(recent[clerk_position]["username"], "clerk");
}

#[tokio::test]
async fn inventory_export_returns_a_csv_attachment() {
    let app = TestApp::new().await;
    let supplier = app.seed_supplier("Acme Industrial Supply").await;
    app.seed_item("Hex Bolt M8x40", "HB-M8-40", 240, dec!(12.50), 50, Some(supplier.id))
        .await;
    app.seed_item("Hex Nut M8", "HN-M8", 35, dec!(9.75), 40, Some(supplier.id))
        .await;
    app.seed_item("Label Sheets A4", "LB-A4", 57, dec!(6.30), 10, None)
        .await;

    // The export is still behind authentication
    let response = app
        .request(Method::GET, "/api/v1/items/export", None, None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let date_before = Utc::now().date_naive();
    let response = app
        .request_as_clerk(Method::GET, "/api/v1/items/export", None)
        .await;
    let date_after = Utc::now().date_naive();
    assert_eq!(response.status(), StatusCode::OK);

    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(content_type, "text/csv; charset=utf-8");

    let disposition = response
        .headers()
        .get(header::CONTENT_DISPOSITION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    // Either date is acceptable if the clock rolled over mid-request
    let candidates = [
        format!("attachment; filename=\"inventory_report_{}.csv\"", date_before),
        format!("attachment; filename=\"inventory_report_{}.csv\"", date_after),
    ];
    assert!(
        candidates.contains(&disposition),
        "unexpected disposition: {}",
        disposition
    );

    let body = body_string(response).await;
    let lines: Vec<&str> = body.lines().collect();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        "Name,SKU,Quantity,Price,Supplier,Threshold,Is Low Stock"
    );

    // Rows come back in creation order
    let first: Vec<&str> = lines[1].split(',').collect();
    assert_eq!(first[0], "Hex Bolt M8x40");
    assert_eq!(first[1], "HB-M8-40");
    assert_eq!(first[2], "240");
    assert_eq!(first[3].parse::<Decimal>().unwrap(), dec!(12.50));
    assert_eq!(first[4], "Acme Industrial Supply");
    assert_eq!(first[5], "50");
    assert_eq!(first[6], "No");

    let second: Vec<&str> = lines[2].split(',').collect();
    assert_eq!(second[0], "Hex Nut M8");
    assert_eq!(second[6], "Yes");

    // No supplier renders as an empty field
    let third: Vec<&str> = lines[3].split(',').collect();
    assert_eq!(third[0], "Label Sheets A4");
    assert_eq!(third[4], "");
    assert_eq!(third[6], "No");
}

#[tokio::test]
async fn export_with_no_items_is_header_only() {
    let app = TestApp::new().await;

    let response = app
        .request_as_staff(Method::GET, "/api/v1/items/export", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert_eq!(
        body.lines().collect::<Vec<_>>(),
        vec!["Name,SKU,Quantity,Price,Supplier,Threshold,Is Low Stock"]
    );
}
