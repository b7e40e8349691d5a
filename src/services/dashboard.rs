use super::transactions::{enrich_transactions, TransactionResponse};
use crate::{
    db::DbPool,
    entities::{
        inventory_item::{Entity as ItemEntity, Model as ItemModel},
        inventory_transaction::{self, Entity as TransactionEntity},
    },
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, QueryOrder, QuerySelect, TransactionError, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument};
use utoipa::ToSchema;

/// How many of the latest transactions the dashboard shows.
const RECENT_TRANSACTIONS: u64 = 5;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub total_items: u64,
    pub low_stock_items: u64,
    pub total_stock_value: Decimal,
    pub recent_transactions: Vec<TransactionResponse>,
    pub generated_at: DateTime<Utc>,
}

/// Aggregates derived from one snapshot of the item collection.
#[derive(Debug, PartialEq, Eq)]
pub struct ItemTotals {
    pub total_items: u64,
    pub low_stock_items: u64,
    pub total_stock_value: Decimal,
}

/// Service producing inventory summary statistics
#[derive(Clone)]
pub struct DashboardService {
    db_pool: Arc<DbPool>,
}

impl DashboardService {
    /// Creates a new dashboard service instance
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Computes the dashboard snapshot
    ///
    /// Item aggregates and the recent-transactions list are read inside one
    /// database transaction, and all three counters derive from the same
    /// result set, so the numbers are mutually consistent. Stock value is
    /// summed in exact decimal arithmetic on this side of the driver rather
    /// than in SQL.
    #[instrument(skip(self))]
    pub async fn get_dashboard(&self) -> Result<DashboardResponse, ServiceError> {
        let db = &*self.db_pool;

        let (items, recent) = db
            .transaction::<_, (Vec<ItemModel>, Vec<TransactionResponse>), ServiceError>(|txn| {
                Box::pin(async move {
                    let items = ItemEntity::find()
                        .all(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    let recent_models = TransactionEntity::find()
                        .order_by_desc(inventory_transaction::Column::CreatedAt)
                        .order_by_desc(inventory_transaction::Column::Id)
                        .limit(RECENT_TRANSACTIONS)
                        .all(txn)
                        .await
                        .map_err(ServiceError::DatabaseError)?;

                    let recent = enrich_transactions(txn, recent_models).await?;

                    Ok((items, recent))
                })
            })
            .await
            .map_err(|e| match e {
                TransactionError::Connection(db_err) => {
                    error!(error = %db_err, "Database transaction failed while reading dashboard data");
                    ServiceError::DatabaseError(db_err)
                }
                TransactionError::Transaction(service_err) => service_err,
            })?;

        let totals = summarize_items(&items);

        info!(
            total_items = totals.total_items,
            low_stock_items = totals.low_stock_items,
            recent_count = recent.len(),
            "Dashboard computed successfully"
        );

        Ok(DashboardResponse {
            total_items: totals.total_items,
            low_stock_items: totals.low_stock_items,
            total_stock_value: totals.total_stock_value,
            recent_transactions: recent,
            generated_at: Utc::now(),
        })
    }
}

/// Derives the dashboard counters from one item snapshot.
pub fn summarize_items(items: &[ItemModel]) -> ItemTotals {
    let total_stock_value = items
        .iter()
        .map(|item| Decimal::from(item.quantity) * item.price)
        .sum();
    ItemTotals {
        total_items: items.len() as u64,
        low_stock_items: items.iter().filter(|item| item.is_low_stock()).count() as u64,
        total_stock_value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn item(quantity: i32, price: Decimal, threshold: i32) -> ItemModel {
        let now = Utc::now();
        ItemModel {
            id: Uuid::new_v4(),
            name: "Widget".to_string(),
            sku: Uuid::new_v4().to_string(),
            description: String::new(),
            quantity,
            price,
            supplier_id: None,
            threshold,
            expiration_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_inventory_summarizes_to_zeroes() {
        let totals = summarize_items(&[]);
        assert_eq!(totals.total_items, 0);
        assert_eq!(totals.low_stock_items, 0);
        assert_eq!(totals.total_stock_value, Decimal::ZERO);
    }

    #[test]
    fn totals_match_worked_example() {
        let items = vec![
            item(5, dec!(10.00), 10),
            item(20, dec!(5.00), 10),
        ];
        let totals = summarize_items(&items);
        assert_eq!(totals.total_items, 2);
        assert_eq!(totals.low_stock_items, 1);
        assert_eq!(totals.total_stock_value, dec!(150.00));
    }

    #[test]
    fn zero_quantity_items_count_but_add_no_value() {
        let items = vec![item(0, dec!(99.99), 10)];
        let totals = summarize_items(&items);
        assert_eq!(totals.total_items, 1);
        assert_eq!(totals.low_stock_items, 1);
        assert_eq!(totals.total_stock_value, Decimal::ZERO);
    }
}
