// Resource services
pub mod items;
pub mod suppliers;
pub mod transactions;

// Read-side aggregation and export
pub mod dashboard;
pub mod reports;

pub use dashboard::DashboardService;
pub use items::ItemService;
pub use reports::ReportService;
pub use suppliers::SupplierService;
pub use transactions::TransactionService;
