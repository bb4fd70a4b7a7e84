use axum::{extract::State, Json};
use chrono::Utc;

use crate::{errors::ServiceError, services::catalog_posting::PostingOutcome, AppState};

/// Runs one catalog posting pass now. Used by external schedulers.
pub async fn run_catalog_post(
    State(state): State<AppState>,
) -> Result<Json<PostingOutcome>, ServiceError> {
    let outcome = state
        .services
        .catalog_posting
        .post_next_supplier_products(Utc::now().date_naive())
        .await?;
    Ok(Json(outcome))
}
