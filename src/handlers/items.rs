use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common;
use crate::{
    errors::ServiceError,
    services::dashboard::DashboardResponse,
    services::items::{
        CreateItemRequest, ItemListParams, ItemResponse, UpdateItemRequest,
    },
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize)]
pub struct ItemListQuery {
    #[serde(default = "common::default_page")]
    pub page: u64,
    #[serde(default = "common::default_per_page")]
    pub per_page: u64,
    pub search: Option<String>,
    pub supplier_id: Option<Uuid>,
    pub low_stock: Option<bool>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/items",
    summary = "List items",
    description = "Get a paginated list of inventory items with filtering and sorting",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<u64>, Query, description = "Items per page (default: 20, max: 100)"),
        ("search" = Option<String>, Query, description = "Substring match on name, SKU or description"),
        ("supplier_id" = Option<Uuid>, Query, description = "Filter by supplier"),
        ("low_stock" = Option<bool>, Query, description = "When true, only items at or below their threshold"),
        ("sort_by" = Option<String>, Query, description = "Sort field: name, quantity, price or created_at"),
        ("sort_order" = Option<String>, Query, description = "Sort direction: asc or desc"),
    ),
    responses(
        (status = 200, description = "Items retrieved successfully", body = ApiResponse<PaginatedResponse<ItemResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    Query(query): Query<ItemListQuery>,
) -> ApiResult<PaginatedResponse<ItemResponse>> {
    common::validate_pagination(query.page, query.per_page)?;

    let params = ItemListParams {
        page: query.page,
        per_page: query.per_page,
        search: query.search,
        supplier_id: query.supplier_id,
        low_stock: query.low_stock,
        sort_by: query.sort_by,
        sort_order: query.sort_order,
    };
    let list = state.services.items.list_items(params).await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        list.items,
        list.page,
        list.per_page,
        list.total,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/items",
    summary = "Create item",
    description = "Create a new inventory item (staff only)",
    request_body = CreateItemRequest,
    responses(
        (status = 201, description = "Item created successfully", body = ApiResponse<ItemResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data or duplicate SKU", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    Json(request): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ItemResponse>>), ServiceError> {
    let item = state.services.items.create_item(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(item))))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/dashboard",
    summary = "Dashboard statistics",
    description = "Item count, low-stock count, total stock value and the five most recent transactions",
    responses(
        (status = 200, description = "Dashboard computed successfully", body = ApiResponse<DashboardResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn get_dashboard(State(state): State<AppState>) -> ApiResult<DashboardResponse> {
    let dashboard = state.services.dashboard.get_dashboard().await?;
    Ok(Json(ApiResponse::success(dashboard)))
}

#[utoipa::path(
    get,
    path = "/api/v1/items/export",
    summary = "Export inventory CSV",
    description = "Download the full inventory as a date-stamped CSV attachment",
    responses(
        (status = 200, description = "CSV attachment", body = String, content_type = "text/csv"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn export_inventory(State(state): State<AppState>) -> Result<Response, ServiceError> {
    let report = state.services.reports.export_inventory_csv().await?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", report.filename),
        ),
    ];
    Ok((headers, report.content).into_response())
}

#[utoipa::path(
    get,
    path = "/api/v1/items/{id}",
    summary = "Get item",
    description = "Retrieve a single item by ID, including supplier name and low-stock state",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item retrieved successfully", body = ApiResponse<ItemResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn get_item(State(state): State<AppState>, Path(id): Path<Uuid>) -> ApiResult<ItemResponse> {
    let item = state
        .services
        .items
        .get_item(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Item with ID {} not found", id)))?;

    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    put,
    path = "/api/v1/items/{id}",
    summary = "Update item",
    description = "Update an item's descriptive fields (staff only); quantity moves only through transactions",
    params(("id" = Uuid, Path, description = "Item ID")),
    request_body = UpdateItemRequest,
    responses(
        (status = 200, description = "Item updated successfully", body = ApiResponse<ItemResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data or duplicate SKU", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<ItemResponse> {
    let item = state.services.items.update_item(id, request).await?;
    Ok(Json(ApiResponse::success(item)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/items/{id}",
    summary = "Delete item",
    description = "Delete an item and its transaction history (staff only)",
    params(("id" = Uuid, Path, description = "Item ID")),
    responses(
        (status = 204, description = "Item deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Item not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.items.delete_item(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
