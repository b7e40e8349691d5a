use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common;
use crate::{
    auth::AuthUser,
    errors::ServiceError,
    services::transactions::{
        RecordTransactionRequest, RecordTransactionResponse, TransactionListParams,
        TransactionResponse,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize)]
pub struct TransactionListQuery {
    #[serde(default = "common::default_page")]
    pub page: u64,
    #[serde(default = "common::default_per_page")]
    pub per_page: u64,
    pub item_id: Option<Uuid>,
    pub transaction_type: Option<String>,
}

#[utoipa::path(
    post,
    path = "/api/v1/transactions",
    summary = "Record transaction",
    description = "Record an IN or OUT stock movement and apply it to the item's quantity. \
                   The acting user is taken from the access token, never from the body.",
    request_body = RecordTransactionRequest,
    responses(
        (status = 201, description = "Transaction recorded successfully", body = ApiResponse<RecordTransactionResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 409, description = "Concurrent update conflict", body = crate::errors::ErrorResponse),
        (status = 422, description = "Insufficient stock", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "transactions"
)]
pub async fn record_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<RecordTransactionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<RecordTransactionResponse>>), ServiceError> {
    let response = state
        .services
        .transactions
        .record_transaction(request, user.user_id)
        .await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::success(response))))
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions",
    summary = "List transactions",
    description = "Get a paginated list of stock movements, newest first. \
                   Non-staff callers only see their own records.",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<u64>, Query, description = "Items per page (default: 20, max: 100)"),
        ("item_id" = Option<Uuid>, Query, description = "Filter by item"),
        ("transaction_type" = Option<String>, Query, description = "Filter by type: IN or OUT"),
    ),
    responses(
        (status = 200, description = "Transactions retrieved successfully", body = ApiResponse<PaginatedResponse<TransactionResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "transactions"
)]
pub async fn list_transactions(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<PaginatedResponse<TransactionResponse>> {
    common::validate_pagination(query.page, query.per_page)?;

    let params = TransactionListParams {
        page: query.page,
        per_page: query.per_page,
        item_id: query.item_id,
        transaction_type: query.transaction_type,
    };
    let list = state
        .services
        .transactions
        .list_transactions(params, user.user_id, user.is_staff)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        list.transactions,
        list.page,
        list.per_page,
        list.total,
    ))))
}

#[utoipa::path(
    get,
    path = "/api/v1/transactions/{id}",
    summary = "Get transaction",
    description = "Retrieve a single stock movement; staff or the recording user only",
    params(("id" = Uuid, Path, description = "Transaction ID")),
    responses(
        (status = 200, description = "Transaction retrieved successfully", body = ApiResponse<TransactionResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Transaction not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "transactions"
)]
pub async fn get_transaction(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<TransactionResponse> {
    let transaction = state
        .services
        .transactions
        .get_transaction(id, user.user_id, user.is_staff)
        .await?;

    Ok(Json(ApiResponse::success(transaction)))
}
