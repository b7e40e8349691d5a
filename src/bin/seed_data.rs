//! Seed data script - populates the database with realistic demo data
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - 2 users (one staff, one regular clerk)
//! - 4 suppliers
//! - 10 stock items across the suppliers (some below their thresholds)
//! - A trail of IN/OUT transactions spread over the past month

use chrono::{Duration, Utc};
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, Set};
use std::time::Duration as StdDuration;
use tracing::info;
use uuid::Uuid;

use stockroom_api::auth::hash_password;
use stockroom_api::entities::{inventory_item, inventory_transaction, supplier, user};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    info!("=== Stockroom API Seed Data ===");
    info!("Creating demo data for exploration...\n");

    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://stockroom.db?mode=rwc".to_string());

    let mut options = ConnectOptions::new(database_url.clone());
    options
        .max_connections(5)
        .min_connections(1)
        .connect_timeout(StdDuration::from_secs(10))
        .acquire_timeout(StdDuration::from_secs(10));

    info!("Connecting to database: {}", database_url);
    let db = Database::connect(options).await?;
    info!("Connected!\n");

    info!("Applying migrations...");
    stockroom_api::db::run_migrations(&db).await?;

    info!("Creating users...");
    let users = create_users(&db).await?;
    info!("  Created {} users", users.len());

    info!("Creating suppliers...");
    let suppliers = create_suppliers(&db).await?;
    info!("  Created {} suppliers", suppliers.len());

    info!("Creating stock items...");
    let items = create_items(&db, &suppliers).await?;
    info!("  Created {} items", items.len());

    info!("Creating transactions...");
    let transaction_count = create_transactions(&db, &items, &users).await?;
    info!("  Created {} transactions", transaction_count);

    info!("\n=== Seed Data Complete ===");
    info!("Your Stockroom API is now populated with demo data!");
    info!("");
    info!("Log in first (staff: admin / Adm1n-Demo-Pass, clerk: clerk / Cl3rk-Demo-Pass):");
    info!("  curl -X POST http://localhost:8080/auth/login -H 'Content-Type: application/json' \\");
    info!("       -d '{{\"username\":\"admin\",\"password\":\"Adm1n-Demo-Pass\"}}'");
    info!("");
    info!("Then try these API calls with the returned access token:");
    info!("  curl -H 'Authorization: Bearer <token>' http://localhost:8080/api/v1/items");
    info!("  curl -H 'Authorization: Bearer <token>' http://localhost:8080/api/v1/items/dashboard");
    info!("  curl -H 'Authorization: Bearer <token>' http://localhost:8080/api/v1/suppliers");
    info!("");
    info!("Or explore interactively at: http://localhost:8080/swagger-ui");

    Ok(())
}

async fn create_users(db: &sea_orm::DatabaseConnection) -> anyhow::Result<Vec<user::Model>> {
    let users_data = vec![
        ("admin", "Adm1n-Demo-Pass", true),
        ("clerk", "Cl3rk-Demo-Pass", false),
    ];

    let mut created = Vec::new();
    let now = Utc::now();

    for (username, password, is_staff) in users_data {
        let user = user::ActiveModel {
            id: Set(Uuid::new_v4()),
            username: Set(username.to_string()),
            password_hash: Set(hash_password(password)?),
            is_staff: Set(is_staff),
            created_at: Set(now),
        };

        let model = user.insert(db).await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_suppliers(
    db: &sea_orm::DatabaseConnection,
) -> anyhow::Result<Vec<supplier::Model>> {
    let suppliers_data = vec![
        (
            "Acme Industrial Supply",
            "Grace Chen",
            "grace@acme-industrial.example",
            "+1-555-0201",
            "1200 Harbor Blvd, Oakland, CA 94607",
        ),
        (
            "Northline Fasteners",
            "Tomas Ruiz",
            "tomas@northline.example",
            "+1-555-0202",
            "88 Mill Road, Portland, OR 97209",
        ),
        (
            "Brightpack Packaging",
            "Ada Okafor",
            "ada@brightpack.example",
            "+1-555-0203",
            "410 Commerce Way, Reno, NV 89502",
        ),
        (
            "Evergreen Chemical Co",
            "Sam Whitfield",
            "sam@evergreenchem.example",
            "+1-555-0204",
            "75 Refinery Lane, Tacoma, WA 98421",
        ),
    ];

    let mut created = Vec::new();
    let now = Utc::now();

    for (name, contact_person, email, phone, address) in suppliers_data {
        let supplier = supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            contact_person: Set(contact_person.to_string()),
            email: Set(email.to_string()),
            phone: Set(phone.to_string()),
            address: Set(address.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let model = supplier.insert(db).await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_items(
    db: &sea_orm::DatabaseConnection,
    suppliers: &[supplier::Model],
) -> anyhow::Result<Vec<inventory_item::Model>> {
    // (name, sku, description, quantity, price, supplier index, threshold, days since created)
    let items_data = vec![
        ("Hex Bolt M8x40", "HB-M8-40", "Zinc-plated hex bolt, box of 100", 240, dec!(12.50), Some(1), 50, 30),
        ("Hex Nut M8", "HN-M8", "Zinc-plated hex nut, box of 200", 35, dec!(9.75), Some(1), 40, 29),
        ("Nitrile Gloves L", "GL-NIT-L", "Disposable nitrile gloves, 100-pack", 18, dec!(14.99), Some(0), 20, 25),
        ("Safety Goggles", "SG-CLR", "Anti-fog clear safety goggles", 64, dec!(7.25), Some(0), 15, 22),
        ("Shipping Box 40cm", "BX-40", "Corrugated single-wall box", 310, dec!(1.10), Some(2), 100, 18),
        ("Bubble Wrap Roll", "BW-50M", "50m perforated bubble wrap roll", 12, dec!(22.00), Some(2), 12, 14),
        ("Packing Tape", "PT-48", "48mm clear packing tape", 95, dec!(2.85), Some(2), 30, 12),
        ("Degreaser 5L", "DG-5L", "Industrial citrus degreaser", 8, dec!(31.40), Some(3), 10, 9),
        ("Isopropyl Alcohol 1L", "IPA-1L", "99% isopropyl alcohol", 42, dec!(8.60), Some(3), 25, 5),
        ("Label Sheets A4", "LB-A4", "Self-adhesive label sheets, 100-pack", 57, dec!(6.30), None, 10, 2),
    ];

    let mut created = Vec::new();
    let now = Utc::now();

    for (name, sku, description, quantity, price, supplier_idx, threshold, days_ago) in items_data
    {
        let created_at = now - Duration::days(days_ago);
        let item = inventory_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            sku: Set(sku.to_string()),
            description: Set(description.to_string()),
            quantity: Set(quantity),
            price: Set(price),
            supplier_id: Set(supplier_idx.map(|idx: usize| suppliers[idx].id)),
            threshold: Set(threshold),
            expiration_date: Set(None),
            created_at: Set(created_at),
            updated_at: Set(created_at),
        };

        let model = item.insert(db).await?;
        created.push(model);
    }

    Ok(created)
}

async fn create_transactions(
    db: &sea_orm::DatabaseConnection,
    items: &[inventory_item::Model],
    users: &[user::Model],
) -> anyhow::Result<usize> {
    // (item index, type, quantity, days ago, user index, notes)
    let transaction_scenarios = vec![
        (0, "IN", 300, 28, 0, "Initial stocking order"),
        (1, "IN", 150, 28, 0, "Initial stocking order"),
        (2, "IN", 40, 24, 0, "Initial stocking order"),
        (0, "OUT", 60, 21, 1, "Workshop requisition"),
        (4, "IN", 400, 17, 0, "Quarterly packaging restock"),
        (1, "OUT", 115, 15, 1, "Assembly line draw-down"),
        (5, "IN", 20, 13, 0, ""),
        (6, "IN", 120, 12, 0, ""),
        (7, "IN", 15, 8, 0, "Hazmat delivery, checked in"),
        (5, "OUT", 8, 7, 1, "Fulfilment floor"),
        (8, "IN", 50, 5, 0, ""),
        (4, "OUT", 90, 4, 1, "Holiday shipping push"),
        (7, "OUT", 7, 3, 1, "Machine shop cleaning"),
        (9, "IN", 60, 2, 0, "Direct purchase, no supplier"),
        (2, "OUT", 22, 1, 1, "PPE handout"),
    ];

    let now = Utc::now();
    let mut count = 0;

    for (item_idx, transaction_type, quantity, days_ago, user_idx, notes) in transaction_scenarios
    {
        let occurred = now - Duration::days(days_ago);
        let transaction = inventory_transaction::ActiveModel {
            id: Set(Uuid::new_v4()),
            item_id: Set(items[item_idx].id),
            transaction_type: Set(transaction_type.to_string()),
            quantity: Set(quantity),
            transaction_date: Set(occurred),
            user_id: Set(Some(users[user_idx].id)),
            notes: Set(notes.to_string()),
            created_at: Set(occurred),
        };

        transaction.insert(db).await?;
        count += 1;
    }

    Ok(count)
}
