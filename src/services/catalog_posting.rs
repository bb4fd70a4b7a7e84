//! Scheduled catalog posts to Telegram.
//!
//! Each run posts for at most one supplier: the first one, in posting order,
//! that still has products not yet posted today.

use chrono::{NaiveDate, Utc};
use sea_orm::TransactionTrait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    config::CatalogPostingConfig,
    db::DbPool,
    entities::{product::Model as ProductModel, supplier::Model as SupplierModel},
    errors::ServiceError,
    events::{Event, HookRegistry},
    integrations::CatalogPublisher,
    metrics::CATALOG_POSTS,
    repositories::{CatalogPostRepository, ProductRepository, SupplierRepository},
};

const PUBLISH_ATTEMPTS: u32 = 3;

/// Result of one posting run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PostingOutcome {
    Posted {
        post_id: Uuid,
        supplier_id: Uuid,
        count: usize,
    },
    NothingToPost,
}

/// Renders the post body. Telegram parses it as HTML, so user-supplied
/// values are escaped.
pub fn render_catalog_text(
    supplier: &SupplierModel,
    products: &[ProductModel],
    config: &CatalogPostingConfig,
) -> String {
    let mut text = format!(
        "✨ {} Pharmaceutical Import\n🆕 Check out our latest arrivals!\n",
        escape_html(&supplier.name)
    );

    for (idx, product) in products.iter().take(config.products_listed).enumerate() {
        text.push_str(&format!(
            "{}. {} {} - {} ETB\n",
            idx + 1,
            escape_html(&product.name),
            escape_html(&product.strength),
            product.price
        ));
    }

    text.push_str("\n💵 Attractive price 💵\n🚚 Free & fast delivery\n");

    let contacts = [
        ("Telegram", &supplier.telegram_link),
        ("WhatsApp", &supplier.whatsapp_link),
        ("Phone", &supplier.phone),
    ];
    for (label, value) in contacts {
        if let Some(value) = value.as_deref().filter(|v| !v.trim().is_empty()) {
            text.push_str(&format!("{}: {}\n", label, escape_html(value)));
        }
    }

    text.push_str(&format!(
        "Or come to: {}\n",
        escape_html(supplier.address.as_deref().unwrap_or_default())
    ));
    text.push_str(&format!(
        "See full Supplier Products and order: {}/suppliers/{}\n",
        config.site_url.trim_end_matches('/'),
        supplier.id
    ));
    text.push_str(&format!(
        "\n🛒 Browse the complete catalog and order today: {}\n",
        config.catalog_url
    ));

    text
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

#[derive(Clone)]
pub struct CatalogPostingService {
    db_pool: Arc<DbPool>,
    hooks: Arc<HookRegistry>,
    publisher: Arc<dyn CatalogPublisher>,
    config: CatalogPostingConfig,
    suppliers: SupplierRepository,
    products: ProductRepository,
    posts: CatalogPostRepository,
    retry_backoff: Duration,
}

impl CatalogPostingService {
    pub fn new(
        db_pool: Arc<DbPool>,
        hooks: Arc<HookRegistry>,
        publisher: Arc<dyn CatalogPublisher>,
        config: CatalogPostingConfig,
    ) -> Self {
        Self {
            suppliers: SupplierRepository::new(db_pool.clone()),
            products: ProductRepository::new(db_pool.clone()),
            posts: CatalogPostRepository::new(db_pool.clone()),
            db_pool,
            hooks,
            publisher,
            config,
            retry_backoff: Duration::from_secs(1),
        }
    }

    /// Base delay between publish attempts; doubles after each failure.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    /// Posts the next supplier's unposted products for `today`.
    #[instrument(skip(self))]
    pub async fn post_next_supplier_products(
        &self,
        today: NaiveDate,
    ) -> Result<PostingOutcome, ServiceError> {
        for supplier in self.suppliers.list_in_posting_order().await? {
            let already_posted = self.posts.products_posted_on(supplier.id, today).await?;
            let products = self
                .products
                .find_for_supplier_excluding(
                    supplier.id,
                    already_posted,
                    self.config.products_per_post,
                )
                .await?;
            if products.is_empty() {
                continue;
            }

            let text = render_catalog_text(&supplier, &products, &self.config);
            if let Err(e) = self.publish_with_retry(&text).await {
                CATALOG_POSTS.with_label_values(&["failed"]).inc();
                error!(supplier_id = %supplier.id, error = %e, "Catalog post failed; trying next supplier");
                continue;
            }

            let product_ids: Vec<Uuid> = products.iter().map(|p| p.id).collect();
            let txn = self.db_pool.begin().await?;
            let post =
                CatalogPostRepository::record_post(&txn, supplier.id, today, &product_ids).await?;
            txn.commit().await?;

            CATALOG_POSTS.with_label_values(&["posted"]).inc();
            info!(
                supplier_id = %supplier.id,
                post_id = %post.id,
                product_count = product_ids.len(),
                "Catalog posted"
            );

            self.hooks
                .dispatch(Event::CatalogPosted {
                    post_id: post.id,
                    supplier_id: supplier.id,
                    product_count: product_ids.len(),
                })
                .await;

            return Ok(PostingOutcome::Posted {
                post_id: post.id,
                supplier_id: supplier.id,
                count: product_ids.len(),
            });
        }

        CATALOG_POSTS.with_label_values(&["nothing_to_post"]).inc();
        info!("No supplier has unposted products today");
        Ok(PostingOutcome::NothingToPost)
    }

    async fn publish_with_retry(&self, text: &str) -> Result<(), ServiceError> {
        let mut attempt = 1;
        loop {
            match self.publisher.publish(text).await {
                Ok(()) => return Ok(()),
                Err(e) if attempt < PUBLISH_ATTEMPTS => {
                    warn!(attempt, max_attempts = PUBLISH_ATTEMPTS, error = %e, "Publish failed; retrying");
                    tokio::time::sleep(self.retry_backoff * 2_u32.pow(attempt - 1)).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Runs the posting job every `period` until the runtime shuts down.
    pub fn spawn_interval(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            loop {
                ticker.tick().await;
                if let Err(e) = self.post_next_supplier_products(Utc::now().date_naive()).await {
                    error!(error = %e, "Catalog posting run failed");
                }
            }
        })
    }
}
