//! Stockroom API
//!
//! Inventory tracking backend: suppliers, items, and stock transactions
//! behind a JWT-authenticated JSON API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

use crate::auth::AuthRouterExt;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Uniform JSON envelope returned by every endpoint.
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub errors: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        let request_id = crate::tracing::current_request_id().map(|id| id.as_str().to_owned());
        Self {
            request_id,
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    fn envelope(success: bool) -> Self {
        Self {
            success,
            data: None,
            message: None,
            errors: None,
            meta: Some(ResponseMeta::capture()),
        }
    }

    pub fn success(data: T) -> Self {
        Self {
            data: Some(data),
            ..Self::envelope(true)
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            message: Some(message),
            ..Self::envelope(false)
        }
    }

    pub fn validation_errors(errors: Vec<String>) -> Self {
        Self {
            message: Some("Validation failed".to_string()),
            errors: Some(errors),
            ..Self::envelope(false)
        }
    }
}

/// Page of results together with the figures needed to render a pager.
#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub per_page: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, page: u64, per_page: u64, total: u64) -> Self {
        let total_pages = total.div_ceil(per_page.max(1));
        Self {
            items,
            total,
            page,
            per_page,
            total_pages,
        }
    }
}

/// What every JSON handler returns: an enveloped body or a service error.
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

// API routes, nested under /api/v1 by the binary
pub fn api_v1_routes() -> Router<AppState> {
    // Supplier routes: reads for any authenticated user, writes for staff
    let suppliers_read = Router::new()
        .route("/suppliers", get(handlers::suppliers::list_suppliers))
        .route("/suppliers/:id", get(handlers::suppliers::get_supplier))
        .with_auth();

    let suppliers_write = Router::new()
        .route(
            "/suppliers",
            axum::routing::post(handlers::suppliers::create_supplier),
        )
        .route(
            "/suppliers/:id",
            axum::routing::put(handlers::suppliers::update_supplier),
        )
        .route(
            "/suppliers/:id",
            axum::routing::delete(handlers::suppliers::delete_supplier),
        )
        .with_staff();

    // Item routes. The dashboard and export live under /items so they share
    // the resource's read gating.
    let items_read = Router::new()
        .route("/items", get(handlers::items::list_items))
        .route("/items/dashboard", get(handlers::items::get_dashboard))
        .route("/items/export", get(handlers::items::export_inventory))
        .route("/items/:id", get(handlers::items::get_item))
        .with_auth();

    let items_write = Router::new()
        .route("/items", axum::routing::post(handlers::items::create_item))
        .route(
            "/items/:id",
            axum::routing::put(handlers::items::update_item),
        )
        .route(
            "/items/:id",
            axum::routing::delete(handlers::items::delete_item),
        )
        .with_staff();

    // Transaction routes: any authenticated user may record and read; the
    // service scopes what non-staff callers can see.
    let transactions = Router::new()
        .route(
            "/transactions",
            get(handlers::transactions::list_transactions),
        )
        .route(
            "/transactions",
            axum::routing::post(handlers::transactions::record_transaction),
        )
        .route(
            "/transactions/:id",
            get(handlers::transactions::get_transaction),
        )
        .with_auth();

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .merge(suppliers_read)
        .merge(suppliers_write)
        .merge(items_read)
        .merge(items_write)
        .merge(transactions)
}

async fn api_status(State(state): State<AppState>) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "service": "stockroom-api",
        "version": env!("CARGO_PKG_VERSION"),
        "git": option_env!("GIT_HASH").unwrap_or("unknown"),
        "built": option_env!("BUILD_TIME").unwrap_or("unknown"),
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "environment": state.config.environment,
    });

    Ok(Json(ApiResponse::success(status_data)))
}

async fn health_check(State(state): State<AppState>) -> ApiResult<Value> {
    let database = match db::check_connection(&state.db).await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    let health_data = json!({
        "status": database,
        "checks": { "database": database },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(health_data)))
}

pub mod prelude {
    pub use crate::db::*;
    pub use crate::errors::*;
    pub use crate::events::*;
    pub use crate::openapi::*;
    pub use crate::services::*;
    pub use crate::tracing::*;
}

#[cfg(test)]
mod envelope_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_envelope_captures_the_active_request_id() {
        let id = crate::tracing::RequestId::new("env-1");
        let response = crate::tracing::scope_request_id(id, async {
            ApiResponse::success("ok")
        })
        .await;

        assert!(response.success);
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("env-1"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }

    #[tokio::test]
    async fn error_envelope_captures_the_active_request_id() {
        let id = crate::tracing::RequestId::new("env-2");
        let response = crate::tracing::scope_request_id(id, async {
            ApiResponse::<()>::error("oops".into())
        })
        .await;

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("oops"));
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("env-2"));
    }

    #[tokio::test]
    async fn validation_envelope_lists_the_failures() {
        let id = crate::tracing::RequestId::new("env-3");
        let response = crate::tracing::scope_request_id(id, async {
            ApiResponse::<()>::validation_errors(vec!["sku is required".into()])
        })
        .await;

        assert!(!response.success);
        assert_eq!(response.message.as_deref(), Some("Validation failed"));
        assert_eq!(
            response.errors.as_deref(),
            Some(&["sku is required".to_string()][..])
        );
        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("env-3"));
    }

    #[test]
    fn paginated_response_rounds_total_pages_up() {
        let page = PaginatedResponse::new(vec![1, 2, 3], 1, 20, 41);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.per_page, 20);
    }

    #[test]
    fn paginated_response_empty_set_has_no_pages() {
        let page: PaginatedResponse<i32> = PaginatedResponse::new(vec![], 1, 20, 0);
        assert_eq!(page.total_pages, 0);
        assert_eq!(page.total, 0);
    }
}
