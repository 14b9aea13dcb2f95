//! Core domain logic for the Confitería product registry.
//! This crate is the single source of truth for product invariants.

pub mod config;
pub mod db;
mod delimited;
pub mod export;
pub mod logging;
pub mod model;
pub mod relative_time;
pub mod repo;
pub mod service;
pub mod validation;

pub use config::{ConfigError, RegistryConfig, StorageBackend};
pub use export::{export_csv, format_timestamp, EXPORT_HEADER};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::catalog::{CatalogError, CategoryCatalog, OnSaleTokens};
pub use model::product::{Product, ProductFragment, ProductId};
pub use relative_time::format_relative;
pub use repo::csv_repo::CsvProductRepository;
pub use repo::product_repo::{ProductRepository, RepoError, RepoResult, SqliteProductRepository};
pub use service::product_service::{
    now_epoch_ms, ProductListQuery, ProductPage, ProductService, ServiceError, ServiceResult,
};
pub use validation::{
    validate_fragment, validate_product, CategoryError, PriceError, RawProductInput,
    ValidationError, ValidationErrors,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
