use super::items::{self, ItemResponse};
use crate::{
    db::DbPool,
    entities::{
        inventory_item::{self, Entity as ItemEntity, Model as ItemModel},
        inventory_transaction::{
            self, ActiveModel as TransactionActiveModel, Entity as TransactionEntity,
            Model as TransactionModel, TransactionType,
        },
        supplier::Entity as SupplierEntity,
        user::{self, Entity as UserEntity},
    },
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, ExprTrait},
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, ConnectionTrait, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, TransactionError, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Request/Response types for the transaction service
#[derive(Debug, Serialize, Deserialize, Validate, ToSchema)]
pub struct RecordTransactionRequest {
    pub item_id: Uuid,
    /// Transaction type ("IN" or "OUT")
    pub transaction_type: String,
    #[validate(range(min = 1, message = "Quantity must be a positive whole number"))]
    pub quantity: i32,
    pub transaction_date: Option<DateTime<Utc>>,
    #[validate(length(max = 500, message = "Notes must be at most 500 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub item_id: Uuid,
    pub item_name: Option<String>,
    pub transaction_type: String,
    pub quantity: i32,
    pub transaction_date: DateTime<Utc>,
    pub user_id: Option<Uuid>,
    pub username: Option<String>,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordTransactionResponse {
    pub transaction: TransactionResponse,
    pub item: ItemResponse,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionListResponse {
    pub transactions: Vec<TransactionResponse>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
}

/// Filters accepted by [`TransactionService::list_transactions`].
#[derive(Debug, Clone, Default)]
pub struct TransactionListParams {
    pub page: u64,
    pub per_page: u64,
    pub item_id: Option<Uuid>,
    pub transaction_type: Option<String>,
}

/// Service for recording and querying stock movements
///
/// Transactions are audit records: they are created once and never updated
/// or deleted through the API. Recording one is the only sanctioned way to
/// change an item's quantity.
#[derive(Clone)]
pub struct TransactionService {
    db_pool: Arc<DbPool>,
    event_sender: Option<Arc<EventSender>>,
}

impl TransactionService {
    /// Creates a new transaction service instance
    pub fn new(db_pool: Arc<DbPool>, event_sender: Option<Arc<EventSender>>) -> Self {
        Self {
            db_pool,
            event_sender,
        }
    }

    /// Records a stock movement and applies it to the item's quantity
    ///
    /// The item update and the transaction insert commit together or not at
    /// all. A concurrent update on the same item surfaces as a conflict and
    /// is retried once with a fresh read before being returned to the caller.
    #[instrument(
        skip(self, request),
        fields(item_id = %request.item_id, transaction_type = %request.transaction_type)
    )]
    pub async fn record_transaction(
        &self,
        request: RecordTransactionRequest,
        acting_user_id: Uuid,
    ) -> Result<RecordTransactionResponse, ServiceError> {
        request
            .validate()
            .map_err(|e| ServiceError::ValidationError(e.to_string()))?;

        let transaction_type =
            TransactionType::from_str(&request.transaction_type).ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unknown transaction type '{}'; expected IN or OUT",
                    request.transaction_type
                ))
            })?;
        let delta = quantity_delta(transaction_type, request.quantity);
        let notes = request.notes.unwrap_or_default();

        let (transaction_model, item_model) = match self
            .apply_transaction(
                request.item_id,
                transaction_type,
                request.quantity,
                delta,
                request.transaction_date,
                notes.clone(),
                acting_user_id,
            )
            .await
        {
            Err(ServiceError::Conflict(reason)) => {
                warn!(
                    item_id = %request.item_id,
                    reason = %reason,
                    "Concurrent stock update detected; retrying once with a fresh read"
                );
                self.apply_transaction(
                    request.item_id,
                    transaction_type,
                    request.quantity,
                    delta,
                    request.transaction_date,
                    notes,
                    acting_user_id,
                )
                .await
            }
            other => other,
        }?;

        info!(
            transaction_id = %transaction_model.id,
            item_id = %item_model.id,
            new_quantity = item_model.quantity,
            "Transaction recorded successfully"
        );

        if let Some(event_sender) = &self.event_sender {
            if let Err(e) = event_sender
                .send(Event::TransactionRecorded {
                    transaction_id: transaction_model.id,
                    item_id: item_model.id,
                    transaction_type: transaction_model.transaction_type.clone(),
                    quantity: transaction_model.quantity,
                    new_item_quantity: item_model.quantity,
                })
                .await
            {
                warn!(error = %e, transaction_id = %transaction_model.id, "Failed to send transaction recorded event");
            }
            if item_model.is_low_stock() {
                if let Err(e) = event_sender
                    .send(Event::LowStockDetected {
                        item_id: item_model.id,
                        quantity: item_model.quantity,
                        threshold: item_model.threshold,
                    })
                    .await
                {
                    warn!(error = %e, item_id = %item_model.id, "Failed to send low stock event");
                }
            }
        }

        let db = &*self.db_pool;
        let username = UserEntity::find_by_id(acting_user_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = %acting_user_id, "Failed to fetch acting user");
                ServiceError::DatabaseError(e)
            })?
            .map(|u| u.username);
        let supplier_name = match item_model.supplier_id {
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

        let item_name = item_model.name.clone();
        Ok(RecordTransactionResponse {
            transaction: model_to_response(transaction_model, Some(item_name), username),
            item: items::model_to_response(item_model, supplier_name),
        })
    }

    /// One atomic attempt at applying a stock movement.
    async fn apply_transaction(
        &self,
        item_id: Uuid,
        transaction_type: TransactionType,
        quantity: i32,
        delta: i32,
        transaction_date: Option<DateTime<Utc>>,
        notes: String,
        acting_user_id: Uuid,
    ) -> Result<(TransactionModel, ItemModel), ServiceError> {
        let db = &*self.db_pool;

        db.transaction::<_, (TransactionModel, ItemModel), ServiceError>(|txn| {
            Box::pin(async move {
                let item = ItemEntity::find_by_id(item_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .ok_or_else(|| {
                        ServiceError::NotFound(format!("Item {} not found", item_id))
                    })?;

                let projected = i64::from(item.quantity) + i64::from(delta);
                if projected < 0 {
                    return Err(ServiceError::InsufficientStock(format!(
                        "Item {} has {} on hand; cannot remove {}",
                        item_id, item.quantity, quantity
                    )));
                }
                if projected > i64::from(i32::MAX) {
                    return Err(ServiceError::ValidationError(
                        "Quantity would exceed the storable maximum".to_string(),
                    ));
                }

                // The increment happens in the database so concurrent applies
                // cannot lose updates, with the floor re-checked in the same
                // statement. before_save does not run for update_many, so
                // updated_at is bumped here.
                let update_result = ItemEntity::update_many()
                    .col_expr(
                        inventory_item::Column::Quantity,
                        Expr::col(inventory_item::Column::Quantity).add(delta),
                    )
                    .col_expr(inventory_item::Column::UpdatedAt, Expr::value(Utc::now()))
                    .filter(inventory_item::Column::Id.eq(item_id))
                    .filter(Expr::col(inventory_item::Column::Quantity).add(delta).gte(0))
                    .exec(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;

                if update_result.rows_affected == 0 {
                    return Err(ServiceError::Conflict(format!(
                        "Stock level for item {} changed concurrently",
                        item_id
                    )));
                }

                let transaction_active_model = TransactionActiveModel {
                    id: Set(Uuid::new_v4()),
                    item_id: Set(item_id),
                    transaction_type: Set(transaction_type.as_str().to_string()),
                    quantity: Set(quantity),
                    transaction_date: transaction_date.map(Set).unwrap_or(NotSet),
                    user_id: Set(Some(acting_user_id)),
                    notes: Set(notes),
                    ..Default::default()
                };

                let transaction_model = transaction_active_model
                    .insert(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?;

                let updated_item = ItemEntity::find_by_id(item_id)
                    .one(txn)
                    .await
                    .map_err(ServiceError::DatabaseError)?
                    .ok_or_else(|| {
                        ServiceError::InternalError(format!(
                            "Failed to reload item {} after applying transaction",
                            item_id
                        ))
                    })?;

                Ok((transaction_model, updated_item))
            })
        })
        .await
        .map_err(|e| match e {
            TransactionError::Connection(db_err) => {
                error!(error = %db_err, item_id = %item_id, "Database transaction failed while recording stock movement");
                ServiceError::DatabaseError(db_err)
            }
            TransactionError::Transaction(service_err) => service_err,
        })
    }

    /// Lists transactions newest-first
    ///
    /// Non-staff callers are always scoped to their own records; the
    /// `item_id` and `transaction_type` filters apply on top of that.
    #[instrument(skip(self), fields(acting_user_id = %acting_user_id))]
    pub async fn list_transactions(
        &self,
        params: TransactionListParams,
        acting_user_id: Uuid,
        acting_user_is_staff: bool,
    ) -> Result<TransactionListResponse, ServiceError> {
        let db = &*self.db_pool;

        let mut query = TransactionEntity::find();
        if !acting_user_is_staff {
            query = query.filter(inventory_transaction::Column::UserId.eq(acting_user_id));
        }
        if let Some(item_id) = params.item_id {
            query = query.filter(inventory_transaction::Column::ItemId.eq(item_id));
        }
        if let Some(raw_type) = params.transaction_type.as_deref() {
            let parsed = TransactionType::from_str(raw_type).ok_or_else(|| {
                ServiceError::ValidationError(format!(
                    "Unknown transaction type '{}'; expected IN or OUT",
                    raw_type
                ))
            })?;
            query = query
                .filter(inventory_transaction::Column::TransactionType.eq(parsed.as_str()));
        }

        let paginator = query
            .order_by_desc(inventory_transaction::Column::TransactionDate)
            .order_by_desc(inventory_transaction::Column::Id)
            .paginate(db, params.per_page);

        let total = paginator.num_items().await.map_err(|e| {
            error!(error = %e, "Failed to count transactions");
            ServiceError::DatabaseError(e)
        })?;

        let transactions = paginator
            .fetch_page(params.page.saturating_sub(1))
            .await
            .map_err(|e| {
                error!(error = %e, page = params.page, per_page = params.per_page, "Failed to fetch transactions page");
                ServiceError::DatabaseError(e)
            })?;

        let transaction_responses = enrich_transactions(db, transactions).await?;

        info!(
            total = total,
            page = params.page,
            per_page = params.per_page,
            returned_count = transaction_responses.len(),
            "Transactions listed successfully"
        );

        Ok(TransactionListResponse {
            transactions: transaction_responses,
            total,
            page: params.page,
            per_page: params.per_page,
        })
    }

    /// Retrieves a single transaction
    ///
    /// Non-staff callers only see their own records; anyone else's look
    /// like they do not exist.
    #[instrument(skip(self), fields(transaction_id = %transaction_id))]
    pub async fn get_transaction(
        &self,
        transaction_id: Uuid,
        acting_user_id: Uuid,
        acting_user_is_staff: bool,
    ) -> Result<TransactionResponse, ServiceError> {
        let db = &*self.db_pool;

        let transaction = TransactionEntity::find_by_id(transaction_id)
            .one(db)
            .await
            .map_err(|e| {
                error!(error = %e, transaction_id = %transaction_id, "Failed to fetch transaction");
                ServiceError::DatabaseError(e)
            })?;

        let transaction = transaction.ok_or_else(|| {
            ServiceError::NotFound(format!("Transaction {} not found", transaction_id))
        })?;

        if !acting_user_is_staff && transaction.user_id != Some(acting_user_id) {
            warn!(
                transaction_id = %transaction_id,
                acting_user_id = %acting_user_id,
                "Non-staff caller requested another user's transaction"
            );
            return Err(ServiceError::NotFound(format!(
                "Transaction {} not found",
                transaction_id
            )));
        }

        let mut enriched = enrich_transactions(db, vec![transaction]).await?;
        enriched.pop().ok_or_else(|| {
            ServiceError::InternalError(format!(
                "Failed to build response for transaction {}",
                transaction_id
            ))
        })
    }
}

/// Attaches item names and usernames to transaction models in bulk.
pub(crate) async fn enrich_transactions<C: ConnectionTrait>(
    db: &C,
    transactions: Vec<TransactionModel>,
) -> Result<Vec<TransactionResponse>, ServiceError> {
    if transactions.is_empty() {
        return Ok(Vec::new());
    }

    let item_ids: Vec<Uuid> = transactions
        .iter()
        .map(|t| t.item_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let user_ids: Vec<Uuid> = transactions
        .iter()
        .filter_map(|t| t.user_id)
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();

    let item_names: HashMap<Uuid, String> = ItemEntity::find()
        .filter(inventory_item::Column::Id.is_in(item_ids))
        .all(db)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to fetch item names for transactions");
            ServiceError::DatabaseError(e)
        })?
        .into_iter()
        .map(|item| (item.id, item.name))
        .collect();

    let usernames: HashMap<Uuid, String> = if user_ids.is_empty() {
        HashMap::new()
    } else {
        UserEntity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(db)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to fetch usernames for transactions");
                ServiceError::DatabaseError(e)
            })?
            .into_iter()
            .map(|u| (u.id, u.username))
            .collect()
    };

    Ok(transactions
        .into_iter()
        .map(|transaction| {
            let item_name = item_names.get(&transaction.item_id).cloned();
            let username = transaction
                .user_id
                .and_then(|id| usernames.get(&id).cloned());
            model_to_response(transaction, item_name, username)
        })
        .collect())
}

fn quantity_delta(transaction_type: TransactionType, quantity: i32) -> i32 {
    match transaction_type {
        TransactionType::In => quantity,
        TransactionType::Out => -quantity,
    }
}

/// Converts a transaction model to response format
pub(crate) fn model_to_response(
    model: TransactionModel,
    item_name: Option<String>,
    username: Option<String>,
) -> TransactionResponse {
    TransactionResponse {
        id: model.id,
        item_id: model.item_id,
        item_name,
        transaction_type: model.transaction_type,
        quantity: model.quantity,
        transaction_date: model.transaction_date,
        user_id: model.user_id,
        username,
        notes: model.notes,
        created_at: model.created_at,
    }
}
