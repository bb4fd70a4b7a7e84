//! Bulk catalog import from spreadsheets.
//!
//! Each data row is validated on its own and upserted by natural key
//! `(name, strength, dosage form, supplier)`. Row problems are collected as
//! `Row N: ...` messages and never abort the batch; only an unreadable file
//! fails the whole import. The uploaded file lives in a temp-file guard and
//! is removed however the import ends.

pub mod dates;
pub mod headers;
pub mod sheet;

use std::collections::HashMap;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Set};
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    db::DbPool,
    entities::product,
    errors::ServiceError,
    events::{Event, HookRegistry},
    metrics::IMPORT_ROWS,
    repositories::{product_repository::NaturalKey, DosageFormRepository, ProductRepository},
};

pub use headers::{HeaderMap, ImportField};
pub use sheet::{CellValue, Sheet, SheetFormat};

/// An uploaded spreadsheet stored in a temporary file. Dropping the guard
/// deletes the file.
#[derive(Debug)]
pub struct UploadedFile {
    file: NamedTempFile,
    original_name: String,
    format: SheetFormat,
}

impl UploadedFile {
    /// Stores `bytes` in a temp file whose extension matches `original_name`.
    pub fn from_bytes(original_name: &str, bytes: &[u8]) -> Result<Self, ServiceError> {
        let (format, extension) = SheetFormat::from_file_name(original_name).ok_or_else(|| {
            ServiceError::ImportError(format!(
                "Unsupported file type '{}'; upload an .xlsx, .xls, .ods or .csv file",
                original_name
            ))
        })?;

        let mut file = tempfile::Builder::new()
            .prefix("product-import-")
            .suffix(&format!(".{}", extension))
            .tempfile()
            .map_err(|e| ServiceError::InternalError(format!("Unable to create temp file: {}", e)))?;
        file.write_all(bytes)
            .and_then(|_| file.flush())
            .map_err(|e| ServiceError::InternalError(format!("Unable to write temp file: {}", e)))?;

        Ok(Self {
            file,
            original_name: original_name.to_string(),
            format,
        })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    pub fn format(&self) -> SheetFormat {
        self.format
    }
}

/// Outcome of one import call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub message: String,
    pub created: usize,
    pub updated: usize,
    pub errors: Vec<String>,
}

impl ImportSummary {
    fn finish(mut self) -> Self {
        self.message = format!(
            "Imported {} new products, Updated {} existing products",
            self.created, self.updated
        );
        self
    }
}

/// A validated data row ready to be upserted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductRow {
    pub name: String,
    pub strength: String,
    pub expire_date: Option<NaiveDate>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub dosage_form_id: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UpsertOutcome {
    Created,
    Updated,
}

/// Validates one data row. `dosage_forms` maps lower-cased names to ids.
///
/// Returns `Ok(None)` for a completely blank row.
pub fn parse_row(
    row_number: usize,
    cells: &[CellValue],
    header_map: &HeaderMap,
    dosage_forms: &HashMap<String, i32>,
) -> Result<Option<ProductRow>, String> {
    if cells.iter().all(CellValue::is_blank) {
        return Ok(None);
    }

    let cell = |field: ImportField| -> Option<&CellValue> {
        header_map
            .column(field)
            .and_then(|idx| cells.get(idx))
            .filter(|c| !c.is_blank())
    };

    let missing: Vec<&str> = ImportField::REQUIRED
        .iter()
        .filter(|f| cell(**f).is_none())
        .map(|f| f.key())
        .collect();
    if !missing.is_empty() {
        return Err(format!(
            "Row {}: Missing required fields: {}",
            row_number,
            missing.join(", ")
        ));
    }

    // all required cells are present past this point
    let text = |field: ImportField| cell(field).map(CellValue::as_text).unwrap_or_default();

    let dosage_form_raw = text(ImportField::DosageForm);
    let dosage_form_id = *dosage_forms
        .get(&dosage_form_raw.to_lowercase())
        .ok_or_else(|| format!("Row {}: Invalid dosage form '{}'", row_number, dosage_form_raw))?;

    let expire_date = match cell(ImportField::ExpireDate) {
        Some(value) => Some(value.as_date().ok_or_else(|| {
            format!("Row {}: Invalid date format '{}'", row_number, value.as_text())
        })?),
        None => None,
    };

    let price = cell(ImportField::Price)
        .and_then(parse_price)
        .ok_or_else(|| format!("Row {}: Invalid price '{}'", row_number, text(ImportField::Price)))?;

    let stock_quantity = cell(ImportField::StockQuantity)
        .and_then(parse_stock)
        .ok_or_else(|| {
            format!(
                "Row {}: Invalid stock quantity '{}'",
                row_number,
                text(ImportField::StockQuantity)
            )
        })?;

    Ok(Some(ProductRow {
        name: text(ImportField::Name),
        strength: text(ImportField::Strength),
        expire_date,
        price,
        stock_quantity,
        dosage_form_id,
    }))
}

fn parse_price(value: &CellValue) -> Option<Decimal> {
    let price = match value {
        CellValue::Number(n) => Decimal::try_from(*n).ok()?,
        CellValue::Text(s) => Decimal::from_str(&strip_grouping(s.trim())?).ok()?,
        _ => return None,
    };
    if price.is_sign_negative() {
        return None;
    }
    Some(price.round_dp(2))
}

fn parse_stock(value: &CellValue) -> Option<i32> {
    match value {
        CellValue::Number(n) if n.fract() == 0.0 && *n >= 0.0 && *n <= i32::MAX as f64 => {
            Some(*n as i32)
        }
        CellValue::Text(s) => {
            let cleaned = strip_grouping(s.trim())?;
            // "40.0" is a whole number, "40.5" is not
            let (whole, fraction) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), ""));
            if whole.is_empty()
                || !whole.bytes().all(|b| b.is_ascii_digit())
                || !fraction.bytes().all(|b| b == b'0')
            {
                return None;
            }
            whole.parse::<i32>().ok()
        }
        _ => None,
    }
}

/// Removes thousands separators from a numeric string.
///
/// A comma is only accepted between groups of three digits in the integer
/// part (`1,250` or `12,000.50`); `12,50` and `1,5` are rejected rather
/// than read as a decimal comma.
fn strip_grouping(raw: &str) -> Option<String> {
    if !raw.contains(',') {
        return Some(raw.to_string());
    }
    let (integer, fraction) = match raw.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (raw, None),
    };
    let unsigned = integer.strip_prefix('-').unwrap_or(integer);

    let mut groups = unsigned.split(',');
    let lead = groups.next()?;
    if lead.is_empty() || lead.len() > 3 || !lead.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !groups.all(|g| g.len() == 3 && g.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }

    let mut cleaned = integer.replace(',', "");
    if let Some(fraction) = fraction {
        if fraction.contains(',') {
            return None;
        }
        cleaned.push('.');
        cleaned.push_str(fraction);
    }
    Some(cleaned)
}

/// Message recorded for a row whose write failed. Storage details stay in
/// the logs.
fn upsert_failure(row_number: usize, err: &ServiceError) -> String {
    format!("Row {}: {}", row_number, err.response_message())
}

/// Imports a supplier's catalog spreadsheet.
#[derive(Clone)]
pub struct ProductImportService {
    db_pool: Arc<DbPool>,
    hooks: Arc<HookRegistry>,
    dosage_forms: DosageFormRepository,
}

impl ProductImportService {
    pub fn new(db_pool: Arc<DbPool>, hooks: Arc<HookRegistry>) -> Self {
        let dosage_forms = DosageFormRepository::new(db_pool.clone());
        Self {
            db_pool,
            hooks,
            dosage_forms,
        }
    }

    /// Reads `upload` and upserts every valid row for `supplier_id`.
    ///
    /// Takes the upload by value so the temp file is gone when this returns.
    #[instrument(skip(self, upload), fields(file = %upload.original_name()))]
    pub async fn import(
        &self,
        supplier_id: Uuid,
        upload: UploadedFile,
    ) -> Result<ImportSummary, ServiceError> {
        let path = upload.path().to_path_buf();
        let format = upload.format();
        let sheet = tokio::task::spawn_blocking(move || sheet::read_sheet(&path, format))
            .await
            .map_err(|e| ServiceError::InternalError(format!("Import reader panicked: {}", e)))??;
        drop(upload);

        let header_map = HeaderMap::from_headers(&sheet.headers);
        if header_map.is_empty() {
            warn!("No recognised columns in header row");
        }
        let dosage_forms = self.dosage_forms.lookup_table().await?;

        let mut summary = ImportSummary::default();
        for (row_number, cells) in &sheet.rows {
            let row = match parse_row(*row_number, cells, &header_map, &dosage_forms) {
                Ok(Some(row)) => row,
                Ok(None) => {
                    IMPORT_ROWS.with_label_values(&["skipped"]).inc();
                    continue;
                }
                Err(message) => {
                    IMPORT_ROWS.with_label_values(&["failed"]).inc();
                    debug!(row = row_number, %message, "Row rejected");
                    summary.errors.push(message);
                    continue;
                }
            };

            match self.upsert(supplier_id, row).await {
                Ok(UpsertOutcome::Created) => {
                    IMPORT_ROWS.with_label_values(&["created"]).inc();
                    summary.created += 1;
                }
                Ok(UpsertOutcome::Updated) => {
                    IMPORT_ROWS.with_label_values(&["updated"]).inc();
                    summary.updated += 1;
                }
                Err(e) => {
                    IMPORT_ROWS.with_label_values(&["failed"]).inc();
                    warn!(row = row_number, error = %e, "Row upsert failed");
                    summary.errors.push(upsert_failure(*row_number, &e));
                }
            }
        }

        let summary = summary.finish();
        info!(
            supplier_id = %supplier_id,
            created = summary.created,
            updated = summary.updated,
            failed_rows = summary.errors.len(),
            "Product import completed"
        );

        self.hooks
            .dispatch(Event::ProductsImported {
                supplier_id,
                created: summary.created,
                updated: summary.updated,
                failed_rows: summary.errors.len(),
            })
            .await;

        Ok(summary)
    }

    async fn upsert(&self, supplier_id: Uuid, row: ProductRow) -> Result<UpsertOutcome, ServiceError> {
        let db = &*self.db_pool;
        let key = NaturalKey {
            name: &row.name,
            strength: &row.strength,
            dosage_form_id: row.dosage_form_id,
            supplier_id,
        };

        match ProductRepository::find_by_natural_key(db, &key).await? {
            Some(existing) => {
                let mut active: product::ActiveModel = existing.into();
                active.stock_quantity = Set(row.stock_quantity);
                active.price = Set(row.price);
                active.expire_date = Set(row.expire_date);
                active.update(db).await.map_err(ServiceError::db_error)?;
                Ok(UpsertOutcome::Updated)
            }
            None => {
                product::ActiveModel {
                    product_id: Set(product::new_public_id()),
                    name: Set(row.name),
                    strength: Set(row.strength),
                    expire_date: Set(row.expire_date),
                    price: Set(row.price),
                    stock_quantity: Set(row.stock_quantity),
                    dosage_form_id: Set(row.dosage_form_id),
                    supplier_id: Set(supplier_id),
                    ..Default::default()
                }
                .insert(db)
                .await
                .map_err(ServiceError::db_error)?;
                Ok(UpsertOutcome::Created)
            }
        }
    }
}
