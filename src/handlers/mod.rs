pub mod common;
pub mod items;
pub mod suppliers;
pub mod transactions;

use crate::db::DbPool;
use crate::events::EventSender;
use std::sync::Arc;

// Handler modules take their state through crate::handlers::AppState
pub use crate::AppState;

/// One service per resource, shared by every handler through [`AppState`].
#[derive(Clone)]
pub struct AppServices {
    pub suppliers: Arc<crate::services::SupplierService>,
    pub items: Arc<crate::services::ItemService>,
    pub transactions: Arc<crate::services::TransactionService>,
    pub dashboard: Arc<crate::services::DashboardService>,
    pub reports: Arc<crate::services::ReportService>,
}

impl AppServices {
    /// Build the AppServices container backing the HTTP layer.
    pub fn new(db_pool: Arc<DbPool>, event_sender: Arc<EventSender>) -> Self {
        let suppliers = Arc::new(crate::services::SupplierService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let items = Arc::new(crate::services::ItemService::new(
            db_pool.clone(),
            Some(event_sender.clone()),
        ));
        let transactions = Arc::new(crate::services::TransactionService::new(
            db_pool.clone(),
            Some(event_sender),
        ));
        let dashboard = Arc::new(crate::services::DashboardService::new(db_pool.clone()));
        let reports = Arc::new(crate::services::ReportService::new(db_pool));

        Self {
            suppliers,
            items,
            transactions,
            dashboard,
            reports,
        }
    }
}
