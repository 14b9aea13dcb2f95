//! Product use-case service.
//!
//! # Responsibility
//! - Validate raw form input, stamp write timestamps and delegate storage.
//! - Serve filtered, paginated list views and the CSV export.
//!
//! # Invariants
//! - No write reaches the repository without passing `validate_product()`.
//! - A rejected submission leaves storage untouched.
//! - Filters apply before pagination; a page past the end is empty.

use crate::export::export_csv;
use crate::model::catalog::{CategoryCatalog, OnSaleTokens};
use crate::model::product::{Product, ProductId};
use crate::repo::product_repo::{ProductRepository, RepoError};
use crate::validation::{validate_product, RawProductInput, ValidationErrors};
use chrono::Utc;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

const PAGE_SIZE_DEFAULT: u32 = 10;
const PAGE_SIZE_MAX: u32 = 100;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Service error for product use-cases.
#[derive(Debug)]
pub enum ServiceError {
    /// Submission rejected; every violated rule is listed.
    Validation(ValidationErrors),
    /// Target product does not exist.
    NotFound(ProductId),
    /// Storage backing failed; prior state is untouched.
    Storage(RepoError),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "producto no encontrado: {id}"),
            Self::Storage(err) => write!(f, "error de almacenamiento: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::NotFound(_) => None,
            Self::Storage(err) => Some(err),
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}

impl From<ValidationErrors> for ServiceError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

/// Filter and pagination options for list views.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductListQuery {
    /// Case-insensitive name substring.
    pub name_contains: Option<String>,
    /// Exact catalog label the product must carry.
    pub category: Option<String>,
    /// 1-based page number; 0 is treated as 1.
    pub page: u32,
    /// Page size; clamped to `1..=100`.
    pub per_page: u32,
}

impl Default for ProductListQuery {
    fn default() -> Self {
        Self {
            name_contains: None,
            category: None,
            page: 1,
            per_page: PAGE_SIZE_DEFAULT,
        }
    }
}

impl ProductListQuery {
    fn applied_page(&self) -> u32 {
        self.page.max(1)
    }

    fn applied_per_page(&self) -> u32 {
        self.per_page.clamp(1, PAGE_SIZE_MAX)
    }

    fn matches(&self, product: &Product) -> bool {
        let name_ok = self
            .name_contains
            .as_deref()
            .map_or(true, |needle| product.name_contains(needle));
        let category_ok = self
            .category
            .as_deref()
            .map_or(true, |label| product.has_category(label));
        name_ok && category_ok
    }
}

/// One page of a filtered list view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductPage {
    /// Products on this page, in insertion order.
    pub items: Vec<Product>,
    /// Effective page number.
    pub page: u32,
    /// Effective page size.
    pub per_page: u32,
    /// Products matching the filters across all pages.
    pub total_items: usize,
    /// At least 1, even when nothing matches.
    pub total_pages: u32,
}

/// Current wall-clock time in Unix epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Product service facade over a storage backing.
pub struct ProductService<R: ProductRepository> {
    repo: R,
    catalog: CategoryCatalog,
    tokens: OnSaleTokens,
    clock: fn() -> i64,
}

impl<R: ProductRepository> ProductService<R> {
    /// Creates a service using the provided repository and vocabularies.
    pub fn new(repo: R, catalog: CategoryCatalog, tokens: OnSaleTokens) -> Self {
        Self {
            repo,
            catalog,
            tokens,
            clock: now_epoch_ms,
        }
    }

    /// Replaces the timestamp source (epoch milliseconds).
    pub fn with_clock(mut self, clock: fn() -> i64) -> Self {
        self.clock = clock;
        self
    }

    pub fn catalog(&self) -> &CategoryCatalog {
        &self.catalog
    }

    pub fn tokens(&self) -> &OnSaleTokens {
        &self.tokens
    }

    /// Current time according to this service's clock.
    pub fn now(&self) -> i64 {
        (self.clock)()
    }

    /// Validates `input` and stores it as a new product.
    pub fn create_product(&self, input: &RawProductInput) -> ServiceResult<Product> {
        let fragment = validate_product(input, &self.catalog, &self.tokens).map_err(|errors| {
            warn!(
                "event=product_create module=service status=rejected error_codes={}",
                errors.codes()
            );
            errors
        })?;

        let product = self
            .repo
            .insert_product(&fragment, self.now())
            .map_err(|err| log_storage_failure("product_create", err))?;
        info!(
            "event=product_create module=service status=ok product_id={}",
            product.id
        );
        Ok(product)
    }

    /// Validates `input` and fully replaces the mutable fields of `id`.
    ///
    /// `id` is the explicit editing target; no edit-mode state is kept.
    pub fn update_product(&self, id: ProductId, input: &RawProductInput) -> ServiceResult<Product> {
        let fragment = validate_product(input, &self.catalog, &self.tokens).map_err(|errors| {
            warn!(
                "event=product_update module=service status=rejected product_id={id} error_codes={}",
                errors.codes()
            );
            errors
        })?;

        let product = self
            .repo
            .update_product(id, &fragment, self.now())
            .map_err(|err| log_storage_failure("product_update", err))?;
        info!("event=product_update module=service status=ok product_id={id}");
        Ok(product)
    }

    pub fn get_product(&self, id: ProductId) -> ServiceResult<Option<Product>> {
        Ok(self.repo.get_product(id)?)
    }

    /// Hard-deletes one product.
    pub fn delete_product(&self, id: ProductId) -> ServiceResult<()> {
        self.repo
            .delete_product(id)
            .map_err(|err| log_storage_failure("product_delete", err))?;
        info!("event=product_delete module=service status=ok product_id={id}");
        Ok(())
    }

    /// Removes every stored product.
    pub fn delete_all_products(&self) -> ServiceResult<()> {
        self.repo
            .delete_all_products()
            .map_err(|err| log_storage_failure("product_delete_all", err))?;
        info!("event=product_delete_all module=service status=ok");
        Ok(())
    }

    /// Lists products using name/category filters and pagination.
    pub fn list_products(&self, query: &ProductListQuery) -> ServiceResult<ProductPage> {
        let page = query.applied_page();
        let per_page = query.applied_per_page();

        let matching: Vec<Product> = self
            .repo
            .list_products()?
            .into_iter()
            .filter(|product| query.matches(product))
            .collect();

        let total_items = matching.len();
        let total_pages = u32::try_from(total_items.div_ceil(per_page as usize))
            .unwrap_or(u32::MAX)
            .max(1);
        let skip = (page as usize - 1).saturating_mul(per_page as usize);
        let items = matching
            .into_iter()
            .skip(skip)
            .take(per_page as usize)
            .collect();

        Ok(ProductPage {
            items,
            page,
            per_page,
            total_items,
            total_pages,
        })
    }

    /// Renders every stored product as CSV export text.
    pub fn export_csv(&self) -> ServiceResult<String> {
        let products = self.repo.list_products()?;
        info!(
            "event=product_export module=service status=ok rows={}",
            products.len()
        );
        Ok(export_csv(&products))
    }
}

fn log_storage_failure(event: &'static str, err: RepoError) -> ServiceError {
    match err {
        RepoError::NotFound(id) => {
            warn!("event={event} module=service status=not_found product_id={id}");
            ServiceError::NotFound(id)
        }
        other => {
            error!("event={event} module=service status=error error={other}");
            ServiceError::Storage(other)
        }
    }
}
