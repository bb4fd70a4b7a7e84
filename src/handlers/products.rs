use axum::{
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::Response,
    Json,
};
use tracing::{info, warn};

use super::common::{created_response, JsonBody};
use crate::{
    auth::AuthSupplier,
    entities::dosage_form::Model as DosageFormModel,
    errors::ServiceError,
    services::{
        product_import::UploadedFile,
        products::{CatalogPage, CatalogQuery, CreateProductRequest, ProductView, UpdateProductRequest},
    },
    AppState,
};

const FILE_FIELD: &str = "file";

/// Bulk upsert of the supplier's catalog from a spreadsheet in the `file`
/// multipart field.
pub async fn import_products(
    State(state): State<AppState>,
    auth: AuthSupplier,
    mut multipart: Multipart,
) -> Result<Response, ServiceError> {
    let mut upload = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServiceError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServiceError::BadRequest(format!("Unable to read upload: {}", e)))?;
        upload = Some(UploadedFile::from_bytes(&file_name, &bytes)?);
        break;
    }

    let upload = upload.ok_or_else(|| {
        warn!(supplier_id = %auth.supplier_id(), "Import request without a file");
        ServiceError::BadRequest("No file uploaded".to_string())
    })?;

    info!(supplier_id = %auth.supplier_id(), file = upload.original_name(), "Starting product import");
    let summary = state
        .services
        .product_import
        .import(auth.supplier_id(), upload)
        .await?;
    Ok(created_response(summary))
}

/// Public catalog: search, filter, sort and page through every supplier's
/// products.
pub async fn list_catalog(
    State(state): State<AppState>,
    Query(query): Query<CatalogQuery>,
) -> Result<Json<CatalogPage>, ServiceError> {
    let page = state.services.products.search(query).await?;
    Ok(Json(page))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<String>,
) -> Result<Json<ProductView>, ServiceError> {
    let product = state.services.products.get(&product_id).await?;
    Ok(Json(product))
}

pub async fn list_dosage_forms(
    State(state): State<AppState>,
) -> Result<Json<Vec<DosageFormModel>>, ServiceError> {
    let forms = state.services.products.list_dosage_forms().await?;
    Ok(Json(forms))
}

pub async fn list_supplier_products(
    State(state): State<AppState>,
    auth: AuthSupplier,
) -> Result<Json<Vec<ProductView>>, ServiceError> {
    let products = state
        .services
        .products
        .list_for_supplier(auth.supplier_id())
        .await?;
    Ok(Json(products))
}

pub async fn create_product(
    State(state): State<AppState>,
    auth: AuthSupplier,
    JsonBody(request): JsonBody<CreateProductRequest>,
) -> Result<Response, ServiceError> {
    let product = state
        .services
        .products
        .create(auth.supplier_id(), request)
        .await?;
    Ok(created_response(product))
}

pub async fn get_supplier_product(
    State(state): State<AppState>,
    auth: AuthSupplier,
    Path(product_id): Path<String>,
) -> Result<Json<ProductView>, ServiceError> {
    let product = state
        .services
        .products
        .get_for_supplier(auth.supplier_id(), &product_id)
        .await?;
    Ok(Json(product))
}

pub async fn update_product(
    State(state): State<AppState>,
    auth: AuthSupplier,
    Path(product_id): Path<String>,
    JsonBody(request): JsonBody<UpdateProductRequest>,
) -> Result<Json<ProductView>, ServiceError> {
    let product = state
        .services
        .products
        .update(auth.supplier_id(), &product_id, request)
        .await?;
    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    auth: AuthSupplier,
    Path(product_id): Path<String>,
) -> Result<StatusCode, ServiceError> {
    state
        .services
        .products
        .delete(auth.supplier_id(), &product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
