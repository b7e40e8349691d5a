use crate::{
    db::DbPool,
    entities::{
        inventory_item::{self, Entity as ItemEntity, Model as ItemModel},
        supplier::Entity as SupplierEntity,
    },
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{EntityTrait, QueryOrder};
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Fixed column order of the inventory export.
const CSV_HEADER: [&str; 7] = [
    "Name",
    "SKU",
    "Quantity",
    "Price",
    "Supplier",
    "Threshold",
    "Is Low Stock",
];

/// A rendered CSV attachment with its date-stamped filename.
#[derive(Debug)]
pub struct InventoryReport {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Service rendering inventory data as CSV reports
#[derive(Clone)]
pub struct ReportService {
    db_pool: Arc<DbPool>,
}

impl ReportService {
    /// Creates a new report service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Exports the full inventory as a CSV attachment
    #[instrument(skip(self))]
    pub async fn export_inventory_csv(&self) -> Result<InventoryReport, ServiceError> {
        let db = &*self.db_pool;

        let rows: Vec<(ItemModel, Option<String>)> = ItemEntity::find()
            .find_also_related(SupplierEntity)
            .order_by_asc(inventory_item::Column::CreatedAt)
            .order_by_asc(inventory_item::Column::Id)
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch items for inventory report");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|(item, supplier)| (item, supplier.map(|s| s.name)))
            .collect();

        let content = write_inventory_report(&rows)?;
        let filename = format!("inventory_report_{}.csv", Utc::now().date_naive());

        info!(rows = rows.len(), filename = %filename, "Inventory report generated");

        Ok(InventoryReport { filename, content })
    }
}

/// Renders the report rows in the order given.
pub fn write_inventory_report(
    rows: &[(ItemModel, Option<String>)],
) -> Result<Vec<u8>, ServiceError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(CSV_HEADER)?;

    for (item, supplier_name) in rows {
        let quantity = item.quantity.to_string();
        let price = item.price.to_string();
        let threshold = item.threshold.to_string();
        let low_stock = if item.is_low_stock() { "Yes" } else { "No" };
        writer.write_record([
            item.name.as_str(),
            item.sku.as_str(),
            quantity.as_str(),
            price.as_str(),
            supplier_name.as_deref().unwrap_or(""),
            threshold.as_str(),
            low_stock,
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ServiceError::InternalError(format!("Failed to finalize CSV report: {}", e)))
}
