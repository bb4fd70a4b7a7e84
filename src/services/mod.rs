pub mod abuse_reports;
pub mod catalog_posting;
pub mod notifications;
pub mod orders;
pub mod product_import;
pub mod products;
pub mod stock_ledger;
