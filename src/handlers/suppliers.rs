use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use super::common;
use crate::{
    errors::ServiceError,
    services::suppliers::{CreateSupplierRequest, SupplierResponse, UpdateSupplierRequest},
    ApiResponse, ApiResult, AppState, PaginatedResponse,
};

#[derive(Debug, Deserialize)]
pub struct SupplierListQuery {
    #[serde(default = "common::default_page")]
    pub page: u64,
    #[serde(default = "common::default_per_page")]
    pub per_page: u64,
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers",
    summary = "List suppliers",
    description = "Get a paginated list of suppliers, ordered by name",
    params(
        ("page" = Option<u64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<u64>, Query, description = "Items per page (default: 20, max: 100)"),
        ("search" = Option<String>, Query, description = "Substring match on name, contact person or email"),
    ),
    responses(
        (status = 200, description = "Suppliers retrieved successfully", body = ApiResponse<PaginatedResponse<SupplierResponse>>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request parameters", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "suppliers"
)]
pub async fn list_suppliers(
    State(state): State<AppState>,
    Query(query): Query<SupplierListQuery>,
) -> ApiResult<PaginatedResponse<SupplierResponse>> {
    common::validate_pagination(query.page, query.per_page)?;

    let list = state
        .services
        .suppliers
        .list_suppliers(query.page, query.per_page, query.search)
        .await?;

    Ok(Json(ApiResponse::success(PaginatedResponse::new(
        list.suppliers,
        list.page,
        list.per_page,
        list.total,
    ))))
}

#[utoipa::path(
    post,
    path = "/api/v1/suppliers",
    summary = "Create supplier",
    description = "Create a new supplier (staff only)",
    request_body = CreateSupplierRequest,
    responses(
        (status = 201, description = "Supplier created successfully", body = ApiResponse<SupplierResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "suppliers"
)]
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(request): Json<CreateSupplierRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SupplierResponse>>), ServiceError> {
    let supplier = state.services.suppliers.create_supplier(request).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::success(supplier))))
}

#[utoipa::path(
    get,
    path = "/api/v1/suppliers/{id}",
    summary = "Get supplier",
    description = "Retrieve a single supplier by ID",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 200, description = "Supplier retrieved successfully", body = ApiResponse<SupplierResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "suppliers"
)]
pub async fn get_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<SupplierResponse> {
    let supplier = state
        .services
        .suppliers
        .get_supplier(id)
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("Supplier with ID {} not found", id)))?;

    Ok(Json(ApiResponse::success(supplier)))
}

#[utoipa::path(
    put,
    path = "/api/v1/suppliers/{id}",
    summary = "Update supplier",
    description = "Update a supplier's contact details (staff only)",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    request_body = UpdateSupplierRequest,
    responses(
        (status = 200, description = "Supplier updated successfully", body = ApiResponse<SupplierResponse>,
            headers(("X-Request-Id" = String, description = "Unique request id"))
        ),
        (status = 400, description = "Invalid request data", body = crate::errors::ErrorResponse),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "suppliers"
)]
pub async fn update_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateSupplierRequest>,
) -> ApiResult<SupplierResponse> {
    let supplier = state
        .services
        .suppliers
        .update_supplier(id, request)
        .await?;

    Ok(Json(ApiResponse::success(supplier)))
}

#[utoipa::path(
    delete,
    path = "/api/v1/suppliers/{id}",
    summary = "Delete supplier",
    description = "Delete a supplier (staff only); linked items keep existing with their supplier cleared",
    params(("id" = Uuid, Path, description = "Supplier ID")),
    responses(
        (status = 204, description = "Supplier deleted successfully"),
        (status = 401, description = "Unauthorized", body = crate::errors::ErrorResponse),
        (status = 403, description = "Forbidden", body = crate::errors::ErrorResponse),
        (status = 404, description = "Supplier not found", body = crate::errors::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::errors::ErrorResponse),
    ),
    security(("Bearer" = [])),
    tag = "suppliers"
)]
pub async fn delete_supplier(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServiceError> {
    state.services.suppliers.delete_supplier(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
