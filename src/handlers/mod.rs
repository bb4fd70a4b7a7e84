pub mod catalog_posts;
pub mod common;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod reports;
