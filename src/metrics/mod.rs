/*!
 * # Metrics Module
 *
 * Prometheus counters for the order engine, the import reconciler, post-commit
 * hooks and catalog posting. All counters live in one crate registry rendered
 * in text format at `/metrics`.
 */

use axum::{http::header, response::IntoResponse};
use lazy_static::lazy_static;
use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};
use tracing::error;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    pub static ref ORDERS_CREATED: IntCounter =
        IntCounter::new("orders_created_total", "Total number of orders created")
            .expect("metric can be created");
    pub static ref ORDER_CREATION_FAILURES: IntCounter = IntCounter::new(
        "order_creation_failures_total",
        "Total number of failed order creations"
    )
    .expect("metric can be created");
    pub static ref ORDER_STATUS_CHANGES: IntCounterVec = IntCounterVec::new(
        Opts::new(
            "order_status_changes_total",
            "Order status transitions by target status"
        ),
        &["status"]
    )
    .expect("metric can be created");
    pub static ref STOCK_CONFLICTS: IntCounter = IntCounter::new(
        "stock_conflicts_total",
        "Conditional stock decrements that matched no row"
    )
    .expect("metric can be created");
    pub static ref IMPORT_ROWS: IntCounterVec = IntCounterVec::new(
        Opts::new("product_import_rows_total", "Imported rows by outcome"),
        &["outcome"]
    )
    .expect("metric can be created");
    pub static ref HOOK_FAILURES: IntCounterVec = IntCounterVec::new(
        Opts::new("post_commit_hook_failures_total", "Failed post-commit hooks"),
        &["hook"]
    )
    .expect("metric can be created");
    pub static ref CATALOG_POSTS: IntCounterVec = IntCounterVec::new(
        Opts::new("catalog_posts_total", "Catalog posting attempts by outcome"),
        &["outcome"]
    )
    .expect("metric can be created");
    pub static ref DB_CONNECTION_FAILURES: IntCounter = IntCounter::new(
        "db_connection_failures_total",
        "Failed database connectivity checks"
    )
    .expect("metric can be created");
}

/// Registers every collector with [`REGISTRY`]. Safe to call more than once.
pub fn register_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(ORDERS_CREATED.clone()),
        Box::new(ORDER_CREATION_FAILURES.clone()),
        Box::new(ORDER_STATUS_CHANGES.clone()),
        Box::new(STOCK_CONFLICTS.clone()),
        Box::new(IMPORT_ROWS.clone()),
        Box::new(HOOK_FAILURES.clone()),
        Box::new(CATALOG_POSTS.clone()),
        Box::new(DB_CONNECTION_FAILURES.clone()),
    ];

    for collector in collectors {
        if let Err(e) = REGISTRY.register(collector) {
            if !matches!(e, prometheus::Error::AlreadyReg) {
                error!(error = %e, "failed to register metric");
            }
        }
    }
}

/// Renders the registry in Prometheus text format.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&REGISTRY.gather(), &mut buffer) {
        error!(error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8(buffer).unwrap_or_default()
}

pub async fn metrics_handler() -> impl IntoResponse {
    register_metrics();
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registered_counters_are_rendered() {
        register_metrics();
        register_metrics();
        ORDERS_CREATED.inc();
        IMPORT_ROWS.with_label_values(&["created"]).inc();

        let text = render();
        assert!(text.contains("orders_created_total"));
        assert!(text.contains("product_import_rows_total{outcome=\"created\"}"));
    }
}
