//! Public catalog browsing and supplier-side product management.
//!
//! Suppliers only ever see and change their own products; a product of
//! another supplier is reported as not found. Stock set here is an absolute
//! value and must not be negative.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, Order, Set, TransactionTrait};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::DbPool,
    entities::{
        dosage_form::Model as DosageFormModel,
        product::{self, Column as ProductColumn, Model as ProductModel},
        supplier::Model as SupplierModel,
    },
    errors::ServiceError,
    repositories::{
        product_repository::{CatalogFilter, NaturalKey},
        DosageFormRepository, ProductRepository, SupplierRepository,
    },
};

const MAX_PER_PAGE: u64 = 100;

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    20
}

/// Query string of the public catalog.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogQuery {
    /// Free-text search over product, supplier and dosage form names.
    pub q: Option<String>,
    pub dosage_form: Option<i32>,
    pub supplier: Option<Uuid>,
    /// `price`, `stock_quantity` or `name`; a leading `-` sorts descending.
    pub ordering: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl Default for CatalogQuery {
    fn default() -> Self {
        Self {
            q: None,
            dosage_form: None,
            supplier: None,
            ordering: None,
            page: default_page(),
            per_page: default_per_page(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    Price,
    StockQuantity,
    Name,
}

/// Sort order of the catalog. Cheapest first unless asked otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogOrdering {
    pub field: SortField,
    pub descending: bool,
}

impl Default for CatalogOrdering {
    fn default() -> Self {
        Self {
            field: SortField::Price,
            descending: false,
        }
    }
}

impl FromStr for CatalogOrdering {
    type Err = ServiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (name, descending) = match raw.strip_prefix('-') {
            Some(name) => (name, true),
            None => (raw, false),
        };
        let field = match name {
            "price" => SortField::Price,
            "stock_quantity" => SortField::StockQuantity,
            "name" => SortField::Name,
            _ => {
                return Err(ServiceError::ValidationError(format!(
                    "Cannot order by '{}'; use price, stock_quantity or name",
                    raw
                )))
            }
        };
        Ok(Self { field, descending })
    }
}

impl CatalogOrdering {
    fn as_sort(self) -> (ProductColumn, Order) {
        let column = match self.field {
            SortField::Price => ProductColumn::Price,
            SortField::StockQuantity => ProductColumn::StockQuantity,
            SortField::Name => ProductColumn::Name,
        };
        let order = if self.descending { Order::Desc } else { Order::Asc };
        (column, order)
    }
}

/// Supplier contact card shown next to a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SupplierCard {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub telegram_link: Option<String>,
    pub whatsapp_link: Option<String>,
}

impl From<SupplierModel> for SupplierCard {
    fn from(supplier: SupplierModel) -> Self {
        Self {
            id: supplier.id,
            name: supplier.name,
            phone: supplier.phone,
            address: supplier.address,
            telegram_link: supplier.telegram_link,
            whatsapp_link: supplier.whatsapp_link,
        }
    }
}

/// A product as shown to buyers and to its supplier. Addressed by its
/// public token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductView {
    pub product_id: String,
    pub name: String,
    pub strength: String,
    pub expire_date: Option<NaiveDate>,
    pub price: Decimal,
    pub stock_quantity: i32,
    pub dosage_form: DosageFormModel,
    pub supplier: Option<SupplierCard>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CatalogPage {
    pub data: Vec<ProductView>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}

/// New product in the signed-in supplier's catalog.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Product name is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Strength is required"))]
    pub strength: String,
    pub expire_date: Option<NaiveDate>,
    pub price: Decimal,
    #[validate(range(min = 0, message = "Stock quantity cannot be negative"))]
    pub stock_quantity: i32,
    pub dosage_form_id: i32,
}

/// Partial update. `expire_date: null` clears the date; an absent field
/// leaves it unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Product name cannot be empty"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Strength cannot be empty"))]
    pub strength: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub expire_date: Option<Option<NaiveDate>>,
    pub price: Option<Decimal>,
    #[validate(range(min = 0, message = "Stock quantity cannot be negative"))]
    pub stock_quantity: Option<i32>,
    pub dosage_form_id: Option<i32>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn check_price(price: Decimal) -> Result<Decimal, ServiceError> {
    if price.is_sign_negative() {
        return Err(ServiceError::ValidationError(
            "Price cannot be negative".to_string(),
        ));
    }
    Ok(price.round_dp(2))
}

#[derive(Clone)]
pub struct ProductService {
    db_pool: Arc<DbPool>,
    products: ProductRepository,
    dosage_forms: DosageFormRepository,
    suppliers: SupplierRepository,
}

impl ProductService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            products: ProductRepository::new(db_pool.clone()),
            dosage_forms: DosageFormRepository::new(db_pool.clone()),
            suppliers: SupplierRepository::new(db_pool.clone()),
            db_pool,
        }
    }

    /// Searches the public catalog.
    #[instrument(skip(self, query), fields(q = ?query.q, page = query.page))]
    pub async fn search(&self, query: CatalogQuery) -> Result<CatalogPage, ServiceError> {
        let ordering = match query.ordering.as_deref().map(str::trim) {
            Some(raw) if !raw.is_empty() => raw.parse::<CatalogOrdering>()?,
            _ => CatalogOrdering::default(),
        };
        let page = query.page.max(1);
        let per_page = query.per_page.clamp(1, MAX_PER_PAGE);
        let term = query.q.as_deref().map(str::trim).filter(|t| !t.is_empty());

        let filter = CatalogFilter {
            term,
            dosage_form_id: query.dosage_form,
            supplier_id: query.supplier,
        };
        let (products, total) = self
            .products
            .search(&filter, ordering.as_sort(), page, per_page)
            .await?;

        Ok(CatalogPage {
            data: self.views(products).await?,
            page,
            per_page,
            total,
            total_pages: total.div_ceil(per_page),
        })
    }

    /// Public product detail with its supplier's contact card.
    pub async fn get(&self, product_id: &str) -> Result<ProductView, ServiceError> {
        let product = ProductRepository::find_by_public_id(&*self.db_pool, product_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        self.view(product).await
    }

    pub async fn list_dosage_forms(&self) -> Result<Vec<DosageFormModel>, ServiceError> {
        self.dosage_forms.list_all().await
    }

    pub async fn list_for_supplier(
        &self,
        supplier_id: Uuid,
    ) -> Result<Vec<ProductView>, ServiceError> {
        let products = self.products.list_for_supplier(supplier_id).await?;
        self.views(products).await
    }

    pub async fn get_for_supplier(
        &self,
        supplier_id: Uuid,
        product_id: &str,
    ) -> Result<ProductView, ServiceError> {
        let product = self.owned(supplier_id, product_id).await?;
        self.view(product).await
    }

    /// Adds a product to the supplier's catalog under a fresh public token.
    #[instrument(skip(self, request), fields(supplier_id = %supplier_id, name = %request.name))]
    pub async fn create(
        &self,
        supplier_id: Uuid,
        request: CreateProductRequest,
    ) -> Result<ProductView, ServiceError> {
        request.validate()?;
        let price = check_price(request.price)?;
        self.require_dosage_form(request.dosage_form_id).await?;

        let name = required_text(&request.name, "Product name")?;
        let strength = required_text(&request.strength, "Strength")?;
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;

        let key = NaturalKey {
            name: &name,
            strength: &strength,
            dosage_form_id: request.dosage_form_id,
            supplier_id,
        };
        if ProductRepository::find_by_natural_key(&txn, &key).await?.is_some() {
            return Err(duplicate(&name, &strength));
        }

        let created = product::ActiveModel {
            product_id: Set(product::new_public_id()),
            name: Set(name),
            strength: Set(strength),
            expire_date: Set(request.expire_date),
            price: Set(price),
            stock_quantity: Set(request.stock_quantity),
            dosage_form_id: Set(request.dosage_form_id),
            supplier_id: Set(supplier_id),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(product_id = %created.product_id, "Product created");
        self.view(created).await
    }

    /// Applies a partial update to one of the supplier's products.
    #[instrument(skip(self, request), fields(supplier_id = %supplier_id, product_id = %product_id))]
    pub async fn update(
        &self,
        supplier_id: Uuid,
        product_id: &str,
        request: UpdateProductRequest,
    ) -> Result<ProductView, ServiceError> {
        request.validate()?;
        let price = request.price.map(check_price).transpose()?;
        if let Some(dosage_form_id) = request.dosage_form_id {
            self.require_dosage_form(dosage_form_id).await?;
        }

        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;
        let existing = ProductRepository::find_by_public_id(&txn, product_id)
            .await?
            .filter(|p| p.supplier_id == supplier_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        let name = match request.name.as_deref() {
            Some(raw) => required_text(raw, "Product name")?,
            None => existing.name.clone(),
        };
        let strength = match request.strength.as_deref() {
            Some(raw) => required_text(raw, "Strength")?,
            None => existing.strength.clone(),
        };
        let dosage_form_id = request.dosage_form_id.unwrap_or(existing.dosage_form_id);

        let key = NaturalKey {
            name: &name,
            strength: &strength,
            dosage_form_id,
            supplier_id,
        };
        if let Some(other) = ProductRepository::find_by_natural_key(&txn, &key).await? {
            if other.id != existing.id {
                return Err(duplicate(&name, &strength));
            }
        }

        let mut active: product::ActiveModel = existing.into();
        active.name = Set(name);
        active.strength = Set(strength);
        active.dosage_form_id = Set(dosage_form_id);
        if let Some(expire_date) = request.expire_date {
            active.expire_date = Set(expire_date);
        }
        if let Some(price) = price {
            active.price = Set(price);
        }
        if let Some(stock_quantity) = request.stock_quantity {
            active.stock_quantity = Set(stock_quantity);
        }

        let updated = active.update(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(stock_quantity = updated.stock_quantity, "Product updated");
        self.view(updated).await
    }

    /// Deletes one of the supplier's products. Products that appear on any
    /// order are kept so order history stays intact.
    #[instrument(skip(self), fields(supplier_id = %supplier_id))]
    pub async fn delete(&self, supplier_id: Uuid, product_id: &str) -> Result<(), ServiceError> {
        let db = &*self.db_pool;
        let txn = db.begin().await.map_err(ServiceError::DatabaseError)?;
        let existing = ProductRepository::find_by_public_id(&txn, product_id)
            .await?
            .filter(|p| p.supplier_id == supplier_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        if ProductRepository::count_order_items(&txn, existing.id).await? > 0 {
            return Err(ServiceError::Conflict(format!(
                "Product {} appears on orders and cannot be deleted",
                product_id
            )));
        }

        let active: product::ActiveModel = existing.into();
        active.delete(&txn).await.map_err(ServiceError::db_error)?;
        txn.commit().await.map_err(ServiceError::DatabaseError)?;

        info!(product_id = %product_id, "Product deleted");
        Ok(())
    }

    async fn owned(&self, supplier_id: Uuid, product_id: &str) -> Result<ProductModel, ServiceError> {
        ProductRepository::find_by_public_id(&*self.db_pool, product_id)
            .await?
            .filter(|p| p.supplier_id == supplier_id)
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }

    async fn require_dosage_form(&self, id: i32) -> Result<(), ServiceError> {
        match self.dosage_forms.find_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::ValidationError(format!(
                "Unknown dosage form {}",
                id
            ))),
        }
    }

    async fn view(&self, product: ProductModel) -> Result<ProductView, ServiceError> {
        let mut views = self.views(vec![product]).await?;
        views
            .pop()
            .ok_or_else(|| ServiceError::InternalError("Product view went missing".to_string()))
    }

    /// Joins products with their dosage forms and supplier cards.
    async fn views(&self, products: Vec<ProductModel>) -> Result<Vec<ProductView>, ServiceError> {
        let forms: HashMap<i32, DosageFormModel> = self
            .dosage_forms
            .list_all()
            .await?
            .into_iter()
            .map(|form| (form.id, form))
            .collect();

        let mut supplier_ids: Vec<Uuid> = products.iter().map(|p| p.supplier_id).collect();
        supplier_ids.sort();
        supplier_ids.dedup();
        let suppliers: HashMap<Uuid, SupplierCard> = self
            .suppliers
            .find_many(supplier_ids)
            .await?
            .into_iter()
            .map(|s| (s.id, SupplierCard::from(s)))
            .collect();

        products
            .into_iter()
            .map(|p| {
                let dosage_form = forms.get(&p.dosage_form_id).cloned().ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "Dosage form {} of product {} is missing",
                        p.dosage_form_id, p.product_id
                    ))
                })?;
                Ok(ProductView {
                    supplier: suppliers.get(&p.supplier_id).cloned(),
                    product_id: p.product_id,
                    name: p.name,
                    strength: p.strength,
                    expire_date: p.expire_date,
                    price: p.price,
                    stock_quantity: p.stock_quantity,
                    dosage_form,
                })
            })
            .collect()
    }
}

fn required_text(raw: &str, field: &str) -> Result<String, ServiceError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(ServiceError::ValidationError(format!("{} cannot be blank", field)));
    }
    Ok(value.to_string())
}

fn duplicate(name: &str, strength: &str) -> ServiceError {
    ServiceError::Conflict(format!(
        "You already list {} {} in this dosage form",
        name, strength
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn ordering_defaults_to_cheapest_first() {
        let ordering = CatalogOrdering::default();
        assert_eq!(ordering.field, SortField::Price);
        assert!(!ordering.descending);
    }

    #[test]
    fn ordering_accepts_known_fields_with_optional_minus() {
        let ordering: CatalogOrdering = "-stock_quantity".parse().unwrap();
        assert_eq!(ordering.field, SortField::StockQuantity);
        assert!(ordering.descending);

        let ordering: CatalogOrdering = "name".parse().unwrap();
        assert_eq!(ordering.field, SortField::Name);
        assert!(!ordering.descending);

        assert_matches!(
            "supplier".parse::<CatalogOrdering>(),
            Err(ServiceError::ValidationError(_))
        );
    }

    #[test]
    fn expire_date_null_differs_from_absent() {
        let request: UpdateProductRequest =
            serde_json::from_str(r#"{"expire_date": null}"#).unwrap();
        assert_eq!(request.expire_date, Some(None));

        let request: UpdateProductRequest = serde_json::from_str(r#"{"price": "9.50"}"#).unwrap();
        assert_eq!(request.expire_date, None);
    }

    #[test]
    fn negative_stock_fails_validation() {
        let request = UpdateProductRequest {
            stock_quantity: Some(-1),
            ..Default::default()
        };
        assert!(request.validate().is_err());

        let request = UpdateProductRequest {
            stock_quantity: Some(0),
            ..Default::default()
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn negative_price_is_rejected() {
        assert_matches!(
            check_price(Decimal::new(-1, 0)),
            Err(ServiceError::ValidationError(_))
        );
        assert_eq!(check_price(Decimal::new(12346, 3)).unwrap(), Decimal::new(1235, 2));
    }
}
