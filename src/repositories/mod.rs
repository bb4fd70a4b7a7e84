use sea_orm::DatabaseConnection;
use std::sync::Arc;

pub mod catalog_post_repository;
pub mod dosage_form_repository;
pub mod order_repository;
pub mod product_repository;
pub mod supplier_repository;

pub use catalog_post_repository::CatalogPostRepository;
pub use dosage_form_repository::DosageFormRepository;
pub use order_repository::OrderRepository;
pub use product_repository::ProductRepository;
pub use supplier_repository::SupplierRepository;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}
