/*!
 * # Pharmagebeya API
 *
 * Marketplace backend where pharmacies order from wholesale suppliers.
 * The order engine and the bulk catalog importer both work against the
 * stock ledger, which never lets a product's stock go below zero.
 */

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod integrations;
pub mod metrics;
pub mod migrator;
pub mod repositories;
pub mod services;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    config::AppConfig,
    db::DbPool,
    events::{EventPublishHook, EventSender, HookRegistry, NotificationHook},
    integrations::CatalogPublisher,
    repositories::SupplierRepository,
    services::{
        abuse_reports::AbuseReportService, catalog_posting::CatalogPostingService,
        notifications::NotificationService, orders::OrderService,
        product_import::ProductImportService, products::ProductService,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: Arc<AppConfig>,
    pub services: AppServices,
}

#[derive(Clone)]
pub struct AppServices {
    pub orders: OrderService,
    pub product_import: ProductImportService,
    pub products: ProductService,
    pub notifications: NotificationService,
    pub abuse_reports: AbuseReportService,
    pub catalog_posting: Arc<CatalogPostingService>,
    pub suppliers: SupplierRepository,
}

impl AppServices {
    pub fn new(
        db: Arc<DbPool>,
        config: &AppConfig,
        hooks: Arc<HookRegistry>,
        publisher: Arc<dyn CatalogPublisher>,
    ) -> Self {
        Self {
            orders: OrderService::new(db.clone(), hooks.clone(), config.order_lifetime()),
            product_import: ProductImportService::new(db.clone(), hooks.clone()),
            products: ProductService::new(db.clone()),
            notifications: NotificationService::new(db.clone()),
            abuse_reports: AbuseReportService::new(db.clone(), hooks.clone()),
            catalog_posting: Arc::new(CatalogPostingService::new(
                db.clone(),
                hooks,
                publisher,
                config.catalog_posting.clone(),
            )),
            suppliers: SupplierRepository::new(db),
        }
    }
}

impl AppState {
    pub fn new(db: Arc<DbPool>, config: AppConfig, services: AppServices) -> Self {
        Self {
            db,
            config: Arc::new(config),
            services,
        }
    }
}

/// Hooks every committed operation runs through: supplier notifications
/// first, then the event channel when one is given.
pub fn default_hooks(db: Arc<DbPool>, events: Option<EventSender>) -> HookRegistry {
    let registry = HookRegistry::new().with_hook(Arc::new(NotificationHook::new(db)));
    match events {
        Some(sender) => registry.with_hook(Arc::new(EventPublishHook::new(sender))),
        None => registry,
    }
}

pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/products", get(handlers::products::list_catalog))
        .route("/products/:product_id", get(handlers::products::get_product))
        .route("/dosage-forms", get(handlers::products::list_dosage_forms))
        .route("/orders", post(handlers::orders::create_order))
        .route(
            "/supplier/orders",
            get(handlers::orders::list_supplier_orders),
        )
        .route(
            "/supplier/orders/:id",
            get(handlers::orders::get_supplier_order)
                .patch(handlers::orders::update_order_status),
        )
        .route(
            "/supplier/products",
            get(handlers::products::list_supplier_products)
                .post(handlers::products::create_product),
        )
        .route(
            "/supplier/products/import",
            post(handlers::products::import_products),
        )
        .route(
            "/supplier/products/:product_id",
            get(handlers::products::get_supplier_product)
                .patch(handlers::products::update_product)
                .delete(handlers::products::delete_product),
        )
        .route(
            "/notifications",
            get(handlers::notifications::list_notifications),
        )
        .route(
            "/notifications/read-all",
            patch(handlers::notifications::mark_all_notifications_read),
        )
        .route(
            "/notifications/:id/read",
            post(handlers::notifications::mark_notification_read),
        )
        .route("/reports", post(handlers::reports::create_report))
        .route(
            "/catalog-posts/run",
            post(handlers::catalog_posts::run_catalog_post),
        )
}

/// Full application router with shared middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .route("/metrics", get(metrics::metrics_handler))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .with_state(state)
}
