//! Product repository contract and SQLite table-store implementation.
//!
//! # Responsibility
//! - Provide the list/get/insert/update/delete/delete-all contract the
//!   service layer relies on.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `validate_fragment()` before SQL mutations.
//! - Read paths reject invalid persisted rows with `InvalidData`.
//! - `list_products` returns insertion order.

use crate::db::migrations::{current_user_version, latest_version};
use crate::db::DbError;
use crate::model::catalog::{join_categories, split_categories, CategoryCatalog};
use crate::model::product::{Product, ProductFragment, ProductId};
use crate::validation::{validate_fragment, ValidationErrors};
use rusqlite::{params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use uuid::Uuid;

const PRODUCT_SELECT_SQL: &str = "SELECT
    uuid,
    name,
    price,
    categories,
    on_sale,
    created_at,
    updated_at
FROM products";

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage-boundary error for product persistence.
#[derive(Debug)]
pub enum RepoError {
    /// Fragment handed to a write path is not canonical.
    Validation(ValidationErrors),
    Db(DbError),
    Io(std::io::Error),
    NotFound(ProductId),
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "{err}"),
            Self::NotFound(id) => write!(f, "product not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted product data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with open_db()"
            ),
            Self::MissingRequiredTable(table) => write!(f, "required table `{table}` is missing"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::NotFound(_)
            | Self::InvalidData(_)
            | Self::UninitializedConnection { .. }
            | Self::MissingRequiredTable(_) => None,
        }
    }
}

impl From<ValidationErrors> for RepoError {
    fn from(value: ValidationErrors) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<std::io::Error> for RepoError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Repository interface for product persistence.
///
/// Timestamps are supplied by the caller; ids are assigned here.
pub trait ProductRepository {
    /// Returns every stored product in insertion order.
    fn list_products(&self) -> RepoResult<Vec<Product>>;
    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>>;
    /// Stores a new product stamped `created_at = updated_at = timestamp`.
    fn insert_product(&self, fragment: &ProductFragment, timestamp: i64) -> RepoResult<Product>;
    /// Replaces the mutable fields of `id` and refreshes `updated_at`.
    fn update_product(
        &self,
        id: ProductId,
        fragment: &ProductFragment,
        timestamp: i64,
    ) -> RepoResult<Product>;
    /// Hard-deletes one product; `NotFound` when absent.
    fn delete_product(&self, id: ProductId) -> RepoResult<()>;
    fn delete_all_products(&self) -> RepoResult<()>;
}

/// SQLite-backed product table store.
pub struct SqliteProductRepository<'conn> {
    conn: &'conn Connection,
    catalog: CategoryCatalog,
}

impl<'conn> SqliteProductRepository<'conn> {
    /// Wraps a connection returned by `open_db()` / `open_db_in_memory()`.
    ///
    /// # Errors
    /// - `UninitializedConnection` when migrations have not been applied.
    /// - `MissingRequiredTable` when the `products` table is absent.
    pub fn try_new(conn: &'conn Connection, catalog: CategoryCatalog) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = current_user_version(conn)?;
        if actual_version > expected_version {
            return Err(RepoError::Db(DbError::UnsupportedSchemaVersion {
                db_version: actual_version,
                latest_supported: expected_version,
            }));
        }
        if actual_version < expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }

        let has_products: bool = conn.query_row(
            "SELECT EXISTS(
                SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'products'
            );",
            [],
            |row| row.get(0),
        )?;
        if !has_products {
            return Err(RepoError::MissingRequiredTable("products"));
        }

        Ok(Self { conn, catalog })
    }

    fn parse_product_row(&self, row: &Row<'_>) -> RepoResult<Product> {
        let uuid_text: String = row.get("uuid")?;
        let id = Uuid::parse_str(&uuid_text).map_err(|_| {
            RepoError::InvalidData(format!("invalid uuid value `{uuid_text}` in products.uuid"))
        })?;

        let price_text: String = row.get("price")?;
        let price = Decimal::from_str(&price_text).map_err(|_| {
            RepoError::InvalidData(format!(
                "invalid price `{price_text}` in products.price for {id}"
            ))
        })?;

        let on_sale = match row.get::<_, i64>("on_sale")? {
            0 => false,
            1 => true,
            other => {
                return Err(RepoError::InvalidData(format!(
                    "invalid on_sale value `{other}` in products.on_sale for {id}"
                )));
            }
        };

        let categories_text: String = row.get("categories")?;
        let product = Product {
            id,
            name: row.get("name")?,
            price,
            categories: split_categories(&categories_text),
            on_sale,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        };
        validate_fragment(&product.fragment(), &self.catalog)
            .map_err(|err| RepoError::InvalidData(format!("product {id}: {err}")))?;
        Ok(product)
    }
}

impl ProductRepository for SqliteProductRepository<'_> {
    fn list_products(&self) -> RepoResult<Vec<Product>> {
        let mut stmt = self.conn.prepare(&format!(
            "{PRODUCT_SELECT_SQL} ORDER BY created_at ASC, rowid ASC;"
        ))?;
        let mut rows = stmt.query([])?;
        let mut products = Vec::new();

        while let Some(row) = rows.next()? {
            products.push(self.parse_product_row(row)?);
        }

        Ok(products)
    }

    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PRODUCT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(self.parse_product_row(row)?));
        }

        Ok(None)
    }

    fn insert_product(&self, fragment: &ProductFragment, timestamp: i64) -> RepoResult<Product> {
        validate_fragment(fragment, &self.catalog)?;

        let id = Uuid::new_v4();
        self.conn.execute(
            "INSERT INTO products (
                uuid,
                name,
                price,
                categories,
                on_sale,
                created_at,
                updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                id.to_string(),
                fragment.name.as_str(),
                price_to_db(fragment.price),
                join_categories(&fragment.categories),
                bool_to_int(fragment.on_sale),
                timestamp,
                timestamp,
            ],
        )?;

        Ok(Product::from_fragment(
            id,
            fragment.clone(),
            timestamp,
            timestamp,
        ))
    }

    fn update_product(
        &self,
        id: ProductId,
        fragment: &ProductFragment,
        timestamp: i64,
    ) -> RepoResult<Product> {
        validate_fragment(fragment, &self.catalog)?;

        let changed = self.conn.execute(
            "UPDATE products
             SET
                name = ?1,
                price = ?2,
                categories = ?3,
                on_sale = ?4,
                updated_at = ?5
             WHERE uuid = ?6;",
            params![
                fragment.name.as_str(),
                price_to_db(fragment.price),
                join_categories(&fragment.categories),
                bool_to_int(fragment.on_sale),
                timestamp,
                id.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        let created_at: i64 = self
            .conn
            .query_row(
                "SELECT created_at FROM products WHERE uuid = ?1;",
                [id.to_string()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or(RepoError::NotFound(id))?;

        Ok(Product::from_fragment(
            id,
            fragment.clone(),
            created_at,
            timestamp,
        ))
    }

    fn delete_product(&self, id: ProductId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM products WHERE uuid = ?1;", [id.to_string()])?;

        if changed == 0 {
            return Err(RepoError::NotFound(id));
        }

        Ok(())
    }

    fn delete_all_products(&self) -> RepoResult<()> {
        self.conn.execute("DELETE FROM products;", [])?;
        Ok(())
    }
}

fn price_to_db(price: Decimal) -> String {
    format!("{price:.2}")
}

fn bool_to_int(value: bool) -> i64 {
    if value {
        1
    } else {
        0
    }
}
