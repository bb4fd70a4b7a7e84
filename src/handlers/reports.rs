use axum::{extract::State, response::Response};

use super::common::{created_response, JsonBody};
use crate::{errors::ServiceError, services::abuse_reports::CreateAbuseReportRequest, AppState};

/// Files an abuse report against a product. Open to anyone.
pub async fn create_report(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<CreateAbuseReportRequest>,
) -> Result<Response, ServiceError> {
    let report = state.services.abuse_reports.create_report(request).await?;
    Ok(created_response(report))
}
