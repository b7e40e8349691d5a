//! OpenAPI documentation for the Stockroom API.
//!
//! The generated document covers the `/api/v1` resource surface. Auth token
//! endpoints live under `/auth` and are described in the intro text rather
//! than as typed paths.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::{Config, SwaggerUi};

/// OpenAPI document for version 1 of the API.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockroom API",
        version = "0.1.0",
        description = r#"
Inventory tracking backend: suppliers, stock items, and the stock movement
ledger, plus dashboard aggregates and CSV export.

## Authentication

All `/api/v1` routes require a JWT access token in the `Authorization`
header: `Authorization: Bearer <token>`. Tokens are issued by
`POST /auth/login` (username + password) and renewed with
`POST /auth/refresh`; `POST /auth/logout` revokes the presented token and
`GET /auth/me` echoes the authenticated principal. Supplier writes and item
writes additionally require a staff account.

## Response envelope

Successful responses wrap their payload in an envelope:

```json
{
  "success": true,
  "data": { ... },
  "message": null,
  "errors": null
}
```

Errors use a flat body with an `error` code, human-readable `message`, and
the `request_id` to quote when reporting a problem.

## Pagination

List endpoints accept `page` (1-based) and `per_page` (max 100) and return
a `PaginatedResponse` with `items`, `total`, and `total_pages`.
"#,
        contact(name = "Stockroom API maintainers"),
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "suppliers", description = "Supplier directory. Writes require a staff account."),
        (name = "items", description = "Stock items, the low-stock dashboard, and CSV export."),
        (name = "transactions", description = "Stock movement ledger. Non-staff callers only see their own records.")
    ),
    paths(
        crate::handlers::suppliers::list_suppliers,
        crate::handlers::suppliers::create_supplier,
        crate::handlers::suppliers::get_supplier,
        crate::handlers::suppliers::update_supplier,
        crate::handlers::suppliers::delete_supplier,
        crate::handlers::items::list_items,
        crate::handlers::items::create_item,
        crate::handlers::items::get_dashboard,
        crate::handlers::items::export_inventory,
        crate::handlers::items::get_item,
        crate::handlers::items::update_item,
        crate::handlers::items::delete_item,
        crate::handlers::transactions::record_transaction,
        crate::handlers::transactions::list_transactions,
        crate::handlers::transactions::get_transaction,
    ),
    components(schemas(
        crate::ApiResponse<serde_json::Value>,
        crate::PaginatedResponse<serde_json::Value>,
        crate::errors::ErrorResponse,
        crate::services::suppliers::CreateSupplierRequest,
        crate::services::suppliers::UpdateSupplierRequest,
        crate::services::suppliers::SupplierResponse,
        crate::services::items::CreateItemRequest,
        crate::services::items::UpdateItemRequest,
        crate::services::items::ItemResponse,
        crate::services::transactions::RecordTransactionRequest,
        crate::services::transactions::TransactionResponse,
        crate::services::transactions::RecordTransactionResponse,
        crate::services::dashboard::DashboardResponse,
    )),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Registers the `Bearer` scheme referenced by the per-path `security`
/// requirements.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "Bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some("JWT access token from POST /auth/login"))
                        .build(),
                ),
            );
        }
    }
}

/// Swagger UI mounted at `/swagger-ui`, serving the document from
/// `/api-docs/openapi.json`.
pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
