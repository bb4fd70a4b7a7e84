use crate::{
    db::DbPool,
    entities::abuse_report::{self, AbuseReason, Model as AbuseReportModel},
    errors::ServiceError,
    events::{Event, HookRegistry},
    repositories::ProductRepository,
};
use chrono::{DateTime, Utc};
use sea_orm::{ActiveModelTrait, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAbuseReportRequest {
    /// Public product token, as shown in the catalog.
    #[validate(length(min = 1, message = "product_id is required"))]
    pub product_id: String,
    #[validate(email(message = "A valid email address is required"))]
    pub reporter_email: String,
    pub reason: AbuseReason,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

/// Stored report as returned to the reporter.
#[derive(Debug, Clone, Serialize)]
pub struct AbuseReportView {
    pub id: Uuid,
    /// Public token of the reported product.
    pub product_id: String,
    pub reporter_email: String,
    pub reason: AbuseReason,
    pub description: Option<String>,
    pub reported_at: DateTime<Utc>,
}

impl AbuseReportView {
    fn new(report: AbuseReportModel, product_token: String) -> Self {
        Self {
            id: report.id,
            product_id: product_token,
            reporter_email: report.reporter_email,
            reason: report.reason,
            description: report.description,
            reported_at: report.reported_at,
        }
    }
}

#[derive(Clone)]
pub struct AbuseReportService {
    db_pool: Arc<DbPool>,
    hooks: Arc<HookRegistry>,
}

impl AbuseReportService {
    pub fn new(db_pool: Arc<DbPool>, hooks: Arc<HookRegistry>) -> Self {
        Self { db_pool, hooks }
    }

    /// Records a report and, after it is stored, lets the supplier know.
    #[instrument(skip(self, request), fields(product_id = %request.product_id, reason = %request.reason))]
    pub async fn create_report(
        &self,
        request: CreateAbuseReportRequest,
    ) -> Result<AbuseReportView, ServiceError> {
        request.validate()?;

        let product = ProductRepository::find_by_public_id(&*self.db_pool, request.product_id.trim())
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", request.product_id))
            })?;

        let description = request
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        let report = abuse_report::ActiveModel {
            id: Set(Uuid::new_v4()),
            product_id: Set(product.id),
            reporter_email: Set(request.reporter_email.trim().to_string()),
            reason: Set(request.reason),
            description: Set(description),
            reported_at: Set(Utc::now()),
        }
        .insert(&*self.db_pool)
        .await
        .map_err(ServiceError::db_error)?;

        info!(report_id = %report.id, "Abuse report stored");

        self.hooks
            .dispatch(Event::AbuseReported {
                report_id: report.id,
                product_id: product.id,
                product_name: product.name,
                supplier_id: product.supplier_id,
                reason: report.reason,
            })
            .await;

        Ok(AbuseReportView::new(report, product.product_id))
    }
}
