use chrono::Utc;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rust_decimal::Decimal;
use std::time::Duration;
use uuid::Uuid;

use stockroom_api::entities::inventory_item;
use stockroom_api::services::dashboard::summarize_items;
use stockroom_api::services::items::ItemResponse;
use stockroom_api::services::reports::write_inventory_report;

fn make_item(i: usize) -> inventory_item::Model {
    let now = Utc::now();
    inventory_item::Model {
        id: Uuid::new_v4(),
        name: format!("Bench Item {}", i),
        sku: format!("SKU-{:05}", i),
        description: "Benchmark fixture".to_string(),
        quantity: (i % 50) as i32,
        price: Decimal::new(1099, 2),
        supplier_id: None,
        threshold: 10,
        expiration_date: None,
        created_at: now,
        updated_at: now,
    }
}

// Benchmark for dashboard stock aggregation
fn dashboard_totals_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("dashboard_totals");

    for size in [10usize, 100, 1_000, 5_000].iter() {
        let items: Vec<inventory_item::Model> = (0..*size).map(make_item).collect();
        group.bench_with_input(BenchmarkId::from_parameter(size), &items, |b, items| {
            b.iter(|| {
                let totals = summarize_items(black_box(items));
                black_box(totals)
            });
        });
    }

    group.finish();
}

// Benchmark for CSV report generation
fn csv_export_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("csv_export");

    for size in [10usize, 100, 1_000].iter() {
        let rows: Vec<(inventory_item::Model, Option<String>)> = (0..*size)
            .map(|i| {
                let supplier = if i % 3 == 0 {
                    None
                } else {
                    Some(format!("Supplier {}", i % 7))
                };
                (make_item(i), supplier)
            })
            .collect();

        group.bench_with_input(BenchmarkId::from_parameter(size), &rows, |b, rows| {
            b.iter(|| {
                let report = write_inventory_report(black_box(rows)).unwrap();
                black_box(report)
            });
        });
    }

    group.finish();
}

// Benchmark for response JSON serialization
fn json_serialization_benchmark(c: &mut Criterion) {
    let now = Utc::now();
    let response = ItemResponse {
        id: Uuid::new_v4(),
        name: "Hex Bolt M8x40".to_string(),
        sku: "HB-M8-40".to_string(),
        description: "Zinc-plated hex bolt, box of 100".to_string(),
        quantity: 240,
        price: Decimal::new(1250, 2),
        supplier_id: Some(Uuid::new_v4()),
        supplier_name: Some("Acme Industrial Supply".to_string()),
        threshold: 50,
        is_low_stock: false,
        expiration_date: None,
        created_at: now,
        updated_at: now,
    };

    c.bench_function("item_response_serialize", |b| {
        b.iter(|| {
            let serialized = serde_json::to_string(&response).unwrap();
            black_box(serialized)
        });
    });
}

// Benchmark for UUID generation
fn uuid_generation_benchmark(c: &mut Criterion) {
    c.bench_function("uuid_v4_generation", |b| {
        b.iter(|| {
            let id = Uuid::new_v4();
            black_box(id)
        });
    });
}

criterion_group! {
    name = benches;
    config = Criterion::default()
        .measurement_time(Duration::from_secs(10))
        .sample_size(100);
    targets =
        dashboard_totals_benchmark,
        csv_export_benchmark,
        json_serialization_benchmark,
        uuid_generation_benchmark
}

criterion_main!(benches);
