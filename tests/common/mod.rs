#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, Duration, Utc};
use pharmagebeya_api::{
    auth,
    config::AppConfig,
    db::{self, DbPool},
    default_hooks,
    entities::{dosage_form, product, supplier},
    errors::ServiceError,
    events::{self, EventSender, HookRegistry},
    integrations::CatalogPublisher,
    AppServices, AppState,
};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, EntityTrait, Set};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const JWT_SECRET: &str = "integration_test_secret_key_with_plenty_of_length";
const MULTIPART_BOUNDARY: &str = "pharmagebeya-test-boundary";

/// Publisher that records what it was asked to post and can fail on demand.
#[derive(Default)]
pub struct RecordingPublisher {
    pub posts: Mutex<Vec<String>>,
    failures_left: AtomicUsize,
    pub attempts: AtomicUsize,
}

impl RecordingPublisher {
    pub fn failing(times: usize) -> Self {
        Self {
            failures_left: AtomicUsize::new(times),
            ..Default::default()
        }
    }

    pub fn published(&self) -> Vec<String> {
        self.posts.lock().unwrap().clone()
    }
}

#[async_trait]
impl CatalogPublisher for RecordingPublisher {
    async fn publish(&self, text: &str) -> Result<(), ServiceError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if failed {
            return Err(ServiceError::ExternalServiceError("telegram down".into()));
        }
        self.posts.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

/// Application backed by a fresh in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub db: Arc<DbPool>,
    pub hooks: Arc<HookRegistry>,
    pub publisher: Arc<RecordingPublisher>,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_publisher(Arc::new(RecordingPublisher::default())).await
    }

    pub async fn with_publisher(publisher: Arc<RecordingPublisher>) -> Self {
        // one connection keeps the in-memory database alive and shared
        Self::build("sqlite::memory:", 1, publisher).await
    }

    /// Application on a database file, for tests that need several
    /// connections open at once.
    pub async fn on_database_file(path: &std::path::Path, connections: u32) -> Self {
        let url = format!("sqlite://{}?mode=rwc", path.display());
        Self::build(&url, connections, Arc::new(RecordingPublisher::default())).await
    }

    async fn build(database_url: &str, connections: u32, publisher: Arc<RecordingPublisher>) -> Self {
        let mut cfg = AppConfig::new(
            database_url.to_string(),
            JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        cfg.db_max_connections = connections;
        cfg.db_min_connections = 1;
        cfg.catalog_posting.site_url = "https://pharmagebeya.test".to_string();
        cfg.catalog_posting.catalog_url = "https://pharmagebeya.test/catalog".to_string();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");
        let db = Arc::new(pool);

        let (tx, rx) = mpsc::channel(256);
        let event_task = tokio::spawn(events::process_events(rx));
        let hooks = Arc::new(default_hooks(db.clone(), Some(EventSender::new(tx))));

        let services = AppServices::new(db.clone(), &cfg, hooks.clone(), publisher.clone());
        let state = AppState::new(db.clone(), cfg, services);
        let router = pharmagebeya_api::build_router(state.clone());

        Self {
            router,
            state,
            db,
            hooks,
            publisher,
            _event_task: event_task,
        }
    }

    pub fn token_for(&self, user_id: Uuid) -> String {
        auth::create_token(JWT_SECRET, user_id, Duration::hours(1)).expect("token")
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_raw(&self, method: Method, uri: &str, content_type: &str, body: Vec<u8>) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", content_type)
            .body(Body::from(body))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Posts `bytes` as a multipart form with a single field.
    pub async fn upload(
        &self,
        uri: &str,
        token: &str,
        field: &str,
        file_name: &str,
        bytes: &[u8],
    ) -> Response {
        let mut body = format!(
            "--{b}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: application/octet-stream\r\n\r\n",
            b = MULTIPART_BOUNDARY
        )
        .into_bytes();
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());

        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .header(
                "content-type",
                format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
            )
            .body(Body::from(body))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn seed_dosage_form(&self, name: &str) -> i32 {
        dosage_form::ActiveModel {
            name: Set(name.to_string()),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed dosage form")
        .id
    }

    pub async fn seed_supplier(&self, name: &str, user_id: Option<Uuid>) -> supplier::Model {
        self.seed_supplier_at(name, user_id, Utc::now()).await
    }

    pub async fn seed_supplier_at(
        &self,
        name: &str,
        user_id: Option<Uuid>,
        created_at: DateTime<Utc>,
    ) -> supplier::Model {
        supplier::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            name: Set(name.to_string()),
            phone: Set(Some("+251911223344".to_string())),
            address: Set(Some("Piassa, Addis Ababa".to_string())),
            telegram_link: Set(Some(format!("https://t.me/{}", name.to_lowercase()))),
            whatsapp_link: Set(None),
            created_at: Set(created_at),
        }
        .insert(&*self.db)
        .await
        .expect("seed supplier")
    }

    pub async fn seed_product(
        &self,
        supplier_id: Uuid,
        dosage_form_id: i32,
        name: &str,
        stock: i32,
        price: Decimal,
    ) -> product::Model {
        product::ActiveModel {
            name: Set(name.to_string()),
            strength: Set("500mg".to_string()),
            expire_date: Set(None),
            price: Set(price),
            stock_quantity: Set(stock),
            dosage_form_id: Set(dosage_form_id),
            supplier_id: Set(supplier_id),
            ..Default::default()
        }
        .insert(&*self.db)
        .await
        .expect("seed product")
    }

    pub async fn stock_of(&self, product_id: Uuid) -> i32 {
        product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await
            .expect("load product")
            .expect("product exists")
            .stock_quantity
    }
}

pub async fn read_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json body")
}
