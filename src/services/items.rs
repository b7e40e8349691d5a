use crate::{
    db::DbPool,
    entities::{
        inventory_item::{
            self, ActiveModel as ItemActiveModel, Entity as ItemEntity, Model as ItemModel,
        },
        supplier::Entity as SupplierEntity,
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, Condition, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Request/Response types for the item service
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 100, message = "Name is required and must be at most 100 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 50, message = "SKU is required and must be at most 50 characters"))]
    pub sku: String,
    pub description: Option<String>,
    #[validate(range(min = 0, message = "Quantity cannot be negative"))]
    pub quantity: Option<i32>,
    #[validate(custom = "validate_price")]
    pub price: Decimal,
    pub supplier_id: Option<Uuid>,
    #[validate(range(min = 0, message = "Threshold cannot be negative"))]
    pub threshold: Option<i32>,
    pub expiration_date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 50, message = "SKU must be at most 50 characters"))]
    pub sku: Option<String>,
    pub description: Option<String>,
    #[validate(custom = "validate_price")]
    pub price: Option<Decimal>,
    // Absent leaves the supplier untouched; an explicit null clears it.
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub supplier_id: Option<Option<Uuid>>,
    #[validate(range(min = 0, message = "Threshold cannot be negative"))]
    pub threshold: Option<i32>,
    #[serde(
        default,
        deserialize_with = "double_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub expiration_date: Option<Option<NaiveDate>>,
}

/// Keeps `Some(None)` distinct from `None`: serde only calls this when the
/// field is present, so an explicit `null` maps to `Some(None)` while an
/// absent field falls back to the `default` of `None`.
fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ItemResponse {
    pub id: Uuid,
    pub name: String,
    pub sku: String,
    pub description: String,
    pub quantity: i32,
    pub price: Decimal,
    pub supplier_id: Option<Uuid>,
    pub supplier_name: Option<String>,
    pub threshold: i32,
    pub is_low_stock: bool,
    pub expiration_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ItemListResponse {
    pub items: Vec<ItemResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Filters and ordering accepted by [`ItemService::list_items`].
#[derive(Debug, Clone, Default)]
pub struct ItemListParams {
    pub page: u64,
    pub per_page: u64,
    pub search: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub low_stock: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

/// Service for managing inventory items
///
/// Quantity changes are deliberately absent from the update path. Stock
/// levels move only through recorded transactions, which keeps the audit
/// trail complete.
#[derive(Clone)]
pub struct ItemService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl ItemService {
    /// Creates a new item service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Creates a new inventory item
    #[instrument(skip(self, request), fields(sku = %request.sku))]
    pub async fn create_item(
        &self,
        request: CreateItemRequest,
    ) -> Result<ItemResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let sku_taken = ItemEntity::find()
            .filter(inventory_item::Column::Sku.eq(request.sku.clone()))
            .count(db)
            .await
            .map_err(|e| {
                error!(error = %e, sku = %request.sku, "Failed to check SKU uniqueness");
                ServiceError::DatabaseError(e)
            })?
            > 0;
        if sku_taken {
            return Err(ServiceError::ValidationError(format!(
                "An item with SKU '{}' already exists",
                request.sku
            )));
        }

        let supplier = match request.supplier_id {
            Some(supplier_id) => {
                let supplier = SupplierEntity::find_by_id(supplier_id)
                    .one(db)
                    .await
                    .map_err(|e| {
                        error!(error = %e, supplier_id = %supplier_id, "Failed to look up supplier for item");
                        ServiceError::DatabaseError(e)
                    })?;
                match supplier {
                    Some(supplier) => Some(supplier),
                    None => {
                        return Err(ServiceError::ValidationError(format!(
                            "Supplier {} does not exist",
                            supplier_id
                        )))
                    }
                }
            }
            None => None,
        };

        let item_id = Uuid::new_v4();

        let txn = db.begin().await.map_err(|e| {
            error!(error = %e, "Failed to start transaction for item creation");
            ServiceError::DatabaseError(e)
        })?;

        let item_active_model = ItemActiveModel {
            id: Set(item_id),
            name: Set(request.name),
            sku: Set(request.sku.clone()),
            description: Set(request.description.unwrap_or_default()),
            quantity: Set(request.quantity.unwrap_or(0)),
            price: Set(request.price),
            supplier_id: Set(request.supplier_id),
            threshold: Set(request.threshold.unwrap_or(10)),
            expiration_date: Set(request.expiration_date),
            ..Default::default()
        };

        let item_model = item_active_model.insert(&txn).await.map_err(|e| {
            error!(error = %e, item_id = %item_id, "Failed to create item in database");
            ServiceError::DatabaseError(e)
        })?;

        txn.commit().await.map_err(|e| {
            error!(error = %e, item_id = %item_id, "Failed to commit item creation transaction");
            ServiceError::DatabaseError(e)
        })?;

        info!(item_id = %item_id, sku = %request.sku, "Item created successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ItemCreated(item_id)).await {
                warn!(error = %e, item_id = %item_id, "Failed to send item created event");
            }
        }

        Ok(model_to_response(item_model, supplier.map(|s| s.name)))
    }

    /// Retrieves an item by ID, including its supplier's name when linked
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn get_item(&self, item_id: Uuid) -> Result<Option<ItemResponse>, ServiceError> {
        let db = &*self.db_pool;

        let found = ItemEntity::find_by_id(item_id)
            .find_also_related(SupplierEntity)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, item_id = %item_id, "Failed to fetch item from database");
                ServiceError::DatabaseError(e)
            })?;

        Ok(found.map(|(item, supplier)| model_to_response(item, supplier.map(|s| s.name))))
    }

    /// Lists items with filtering, sorting and pagination
    ///
    /// `low_stock = Some(true)` restricts the result to items at or below
    /// their threshold; any other value leaves the filter off.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        params: ItemListParams,
    ) -> Result<ItemListResponse, ServiceError> {
        let db = &*self.db_pool;

        let (sort_column, default_order) = match params.sort_by.as_deref() {
            None | Some("created_at") => (inventory_item::Column::CreatedAt, Order::Desc),
            Some("name") => (inventory_item::Column::Name, Order::Asc),
            Some("quantity") => (inventory_item::Column::Quantity, Order::Asc),
            Some("price") => (inventory_item::Column::Price, Order::Asc),
            Some(other) => {
                return Err(ServiceError::ValidationError(format!(
                    "Unsupported sort field '{}'; expected one of name, quantity, price, created_at",
                    other
                )))
            }
        };
        let sort_order = match params.sort_order.as_deref() {
            None => default_order,
            Some("asc") => Order::Asc,
            Some("desc") => Order::Desc,
            Some(other) => {
                return Err(ServiceError::ValidationError(format!(
                    "Unsupported sort order '{}'; expected asc or desc",
                    other
                )))
            }
        };

        let mut query = ItemEntity::find();
        if let Some(term) = params.search.as_deref().filter(|term| !term.trim().is_empty()) {
            let term = term.trim();
            query = query.filter(
                Condition::any()
                    .add(inventory_item::Column::Name.contains(term))
                    .add(inventory_item::Column::Sku.contains(term))
                    .add(inventory_item::Column::Description.contains(term)),
            );
        }
        if let Some(supplier_id) = params.supplier_id {
            query = query.filter(inventory_item::Column::SupplierId.eq(supplier_id));
        }
        if params.low_stock == Some(true) {
            query = query.filter(
                Expr::col(inventory_item::Column::Quantity)
                    .lte(Expr::col(inventory_item::Column::Threshold)),
            );
        }

        let paginator = query
            .find_also_related(SupplierEntity)
            .order_by(sort_column, sort_order)
            .paginate(db, params.per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count items");
            ServiceError::DatabaseError(e)
        })?;

        let rows = paginator
            .fetch_page(params.page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page = params.page, per_page = params.per_page, "Failed to fetch items page");
                ServiceError::DatabaseError(e)
            })?;

        let item_responses: Vec<ItemResponse> = rows
            .into_iter()
            .map(|(item, supplier)| model_to_response(item, supplier.map(|s| s.name)))
            .collect();

        info!(
            total = total,
            page = params.page,
            per_page = params.per_page,
            returned_count = item_responses.len(),
            "Items listed successfully"
        );

        Ok(ItemListResponse {
            items: item_responses,
            total,
            page: params.page,
            per_page: params.per_page,
        })
    }

    /// Updates an item's descriptive fields
    #[instrument(skip(self, request), fields(item_id = %item_id))]
    pub async fn update_item(
        &self,
        item_id: Uuid,
        request: UpdateItemRequest,
    ) -> Result<ItemResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let db = &*self.db_pool;

        let item = ItemEntity::find_by_id(item_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, item_id = %item_id, "Failed to find item for update");
                ServiceError::DatabaseError(e)
            })?;

        let item = item.ok_or_else(|| {
            warn!(item_id = %item_id, "Item not found for update");
            ServiceError::NotFound(format!("Item {} not found", item_id))
        })?;

        if let Some(new_sku) = &request.sku {
            if *new_sku != item.sku {
                let sku_taken = ItemEntity::find()
                    .filter(inventory_item::Column::Sku.eq(new_sku.clone()))
                    .filter(inventory_item::Column::Id.ne(item_id))
                    .count(db)
                    .await
                    .map_err(|e| {
                        error!(error = %e, sku = %new_sku, "Failed to check SKU uniqueness");
                        ServiceError::DatabaseError(e)
                    })?
                    > 0;
                if sku_taken {
                    return Err(ServiceError::ValidationError(format!(
                        "An item with SKU '{}' already exists",
                        new_sku
                    )));
                }
            }
        }

        if let Some(Some(new_supplier_id)) = request.supplier_id {
            let supplier_exists = SupplierEntity::find_by_id(new_supplier_id)
                .count(db)
                .await
                .map_err(|e| {
                    error!(error = %e, supplier_id = %new_supplier_id, "Failed to look up supplier for item");
                    ServiceError::DatabaseError(e)
                })?
                > 0;
            if !supplier_exists {
                return Err(ServiceError::ValidationError(format!(
                    "Supplier {} does not exist",
                    new_supplier_id
                )));
            }
        }

        let mut item_active_model: ItemActiveModel = item.into();
        if let Some(name) = request.name {
            item_active_model.name = Set(name);
        }
        if let Some(sku) = request.sku {
            item_active_model.sku = Set(sku);
        }
        if let Some(description) = request.description {
            item_active_model.description = Set(description);
        }
        if let Some(price) = request.price {
            item_active_model.price = Set(price);
        }
        if let Some(supplier_change) = request.supplier_id {
            item_active_model.supplier_id = Set(supplier_change);
        }
        if let Some(threshold) = request.threshold {
            item_active_model.threshold = Set(threshold);
        }
        if let Some(expiration_change) = request.expiration_date {
            item_active_model.expiration_date = Set(expiration_change);
        }

        let updated_item = item_active_model.update(db).await.map_err(|e| {
            error!(error = %e, item_id = %item_id, "Failed to update item");
            ServiceError::DatabaseError(e)
        })?;

        info!(item_id = %item_id, "Item updated successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ItemUpdated(item_id)).await {
                warn!(error = %e, item_id = %item_id, "Failed to send item updated event");
            }
        }

        let supplier_name = match updated_item.supplier_id {
            Some(supplier_id) => SupplierEntity::find_by_id(supplier_id)
                .one(db)
                .await
                .map_err(|e| {
                    error!(error = %e, supplier_id = %supplier_id, "Failed to fetch supplier name");
                    ServiceError::DatabaseError(e)
                })?
                .map(|s| s.name),
            None => None,
        };

        Ok(model_to_response(updated_item, supplier_name))
    }

    /// Deletes an item
    ///
    /// The item's transaction history goes with it through the cascading
    /// foreign key.
    #[instrument(skip(self), fields(item_id = %item_id))]
    pub async fn delete_item(&self, item_id: Uuid) -> Result<(), ServiceError> {
        let db = &*self.db_pool;

        let result = ItemEntity::delete_by_id(item_id)
            .exec(db)
            .await
            .map_err(|e| {
                error!(error = %e, item_id = %item_id, "Failed to delete item");
                ServiceError::DatabaseError(e)
            })?;

        if result.rows_affected == 0 {
            warn!(item_id = %item_id, "Item not found for deletion");
            return Err(ServiceError::NotFound(format!("Item {} not found", item_id)));
        }

        info!(item_id = %item_id, "Item deleted successfully");

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender.send(Event::ItemDeleted(item_id)).await {
                warn!(error = %e, item_id = %item_id, "Failed to send item deleted event");
            }
        }

        Ok(())
    }
}

/// Prices carry at most two decimal places and must fit in 10 digits.
fn validate_price(price: &Decimal) -> Result<(), ValidationError> {
    if price.is_sign_negative() {
        let mut err = ValidationError::new("price");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    if price.round_dp(2) != *price {
        let mut err = ValidationError::new("price");
        err.message = Some("Price supports at most two decimal places".into());
        return Err(err);
    }
    if *price >= Decimal::from(100_000_000) {
        let mut err = ValidationError::new("price");
        err.message = Some("Price is too large".into());
        return Err(err);
    }
    Ok(())
}

/// Converts an item model to response format
pub(crate) fn model_to_response(model: ItemModel, supplier_name: Option<String>) -> ItemResponse {
    let is_low_stock = model.is_low_stock();
    ItemResponse {
        id: model.id,
        name: model.name,
        sku: model.sku,
        description: model.description,
        quantity: model.quantity,
        price: model.price,
        supplier_id: model.supplier_id,
        supplier_name,
        threshold: model.threshold,
        is_low_stock,
        expiration_date: model.expiration_date,
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn item_model(quantity: i32, threshold: i32) -> ItemModel {
        let now = Utc::now();
        ItemModel {
            id: Uuid::new_v4(),
            name: "Widget".to_string(),
            sku: "WID-001".to_string(),
            description: String::new(),
            quantity,
            price: dec!(9.99),
            supplier_id: None,
            threshold,
            expiration_date: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn price_validation_rejects_negative() {
        assert!(validate_price(&dec!(-0.01)).is_err());
    }

    #[test]
    fn price_validation_rejects_excess_scale() {
        assert!(validate_price(&dec!(1.999)).is_err());
    }

    #[test]
    fn price_validation_accepts_two_decimal_places() {
        assert!(validate_price(&dec!(0)).is_ok());
        assert!(validate_price(&dec!(19.99)).is_ok());
    }

    #[test]
    fn price_validation_rejects_values_beyond_ten_digits() {
        assert!(validate_price(&dec!(100000000.00)).is_err());
        assert!(validate_price(&dec!(99999999.99)).is_ok());
    }

    #[test]
    fn response_reflects_low_stock_state() {
        let response = model_to_response(item_model(3, 10), Some("Acme Corp".to_string()));
        assert!(response.is_low_stock);
        assert_eq!(response.supplier_name.as_deref(), Some("Acme Corp"));

        let response = model_to_response(item_model(11, 10), None);
        assert!(!response.is_low_stock);
        assert!(response.supplier_name.is_none());
    }

    #[test]
    fn update_request_distinguishes_absent_from_null_supplier() {
        let absent: UpdateItemRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(absent.supplier_id.is_none());

        let cleared: UpdateItemRequest =
            serde_json::from_value(serde_json::json!({ "supplier_id": null })).unwrap();
        assert_eq!(cleared.supplier_id, Some(None));
    }
}
