//! Local delimited-file product store.
//!
//! # Responsibility
//! - Persist the product collection as one CSV file.
//! - Offer the same contract as the SQLite table store.
//!
//! # Invariants
//! - A missing file is an empty collection.
//! - Every mutation rewrites the whole file through a temp file + rename, so
//!   readers never observe a partially written collection.
//! - File order is insertion order.

use crate::delimited::{encode_record, parse_records};
use crate::model::catalog::{join_categories, split_categories, CategoryCatalog};
use crate::model::product::{Product, ProductFragment, ProductId};
use crate::repo::product_repo::{ProductRepository, RepoError, RepoResult};
use crate::validation::validate_fragment;
use log::debug;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// File name used inside a data directory.
pub const PRODUCTS_FILE_NAME: &str = "products.csv";

const STORE_HEADER: [&str; 7] = [
    "id",
    "name",
    "price",
    "categories",
    "on_sale",
    "created_at",
    "updated_at",
];

/// CSV-file-backed product store.
#[derive(Debug, Clone)]
pub struct CsvProductRepository {
    path: PathBuf,
    catalog: CategoryCatalog,
}

impl CsvProductRepository {
    /// Uses `path` as the store file. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>, catalog: CategoryCatalog) -> Self {
        Self {
            path: path.into(),
            catalog,
        }
    }

    /// Uses `<dir>/products.csv` as the store file.
    pub fn in_dir(dir: impl AsRef<Path>, catalog: CategoryCatalog) -> Self {
        Self::new(dir.as_ref().join(PRODUCTS_FILE_NAME), catalog)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> RepoResult<Vec<Product>> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let records = parse_records(&text).map_err(|message| {
            RepoError::InvalidData(format!("{}: {message}", self.path.display()))
        })?;
        let mut records = records.into_iter();
        let Some(header) = records.next() else {
            return Ok(Vec::new());
        };
        if !header.iter().map(String::as_str).eq(STORE_HEADER) {
            return Err(RepoError::InvalidData(format!(
                "{}: unexpected header `{}`",
                self.path.display(),
                header.join(",")
            )));
        }

        let mut seen = HashSet::new();
        let mut products = Vec::new();
        for (index, record) in records.enumerate() {
            let product = self.parse_record(index + 1, record)?;
            if !seen.insert(product.id) {
                return Err(RepoError::InvalidData(format!(
                    "{}: duplicate id {}",
                    self.path.display(),
                    product.id
                )));
            }
            products.push(product);
        }

        Ok(products)
    }

    fn save(&self, products: &[Product]) -> RepoResult<()> {
        if let Some(parent) = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            fs::create_dir_all(parent)?;
        }

        let mut text = encode_record(&STORE_HEADER);
        text.push('\n');
        for product in products {
            text.push_str(&encode_record(&product_to_record(product)));
            text.push('\n');
        }

        let temp_path = self.temp_path();
        fs::write(&temp_path, text)?;
        if let Err(err) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(err.into());
        }

        debug!(
            "event=csv_store_write module=repo status=ok rows={}",
            products.len()
        );
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| PRODUCTS_FILE_NAME.into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn parse_record(&self, number: usize, record: Vec<String>) -> RepoResult<Product> {
        let invalid = |message: String| {
            RepoError::InvalidData(format!(
                "{} record {number}: {message}",
                self.path.display()
            ))
        };

        let [id, name, price, categories, on_sale, created_at, updated_at]: [String; 7] = record
            .try_into()
            .map_err(|fields: Vec<String>| {
                invalid(format!("expected 7 fields, found {}", fields.len()))
            })?;

        let id = Uuid::parse_str(&id).map_err(|_| invalid(format!("invalid id `{id}`")))?;
        let price =
            Decimal::from_str(&price).map_err(|_| invalid(format!("invalid price `{price}`")))?;
        let on_sale = match on_sale.as_str() {
            "true" => true,
            "false" => false,
            other => return Err(invalid(format!("invalid on_sale `{other}`"))),
        };
        let created_at = created_at
            .parse::<i64>()
            .map_err(|_| invalid(format!("invalid created_at `{created_at}`")))?;
        let updated_at = updated_at
            .parse::<i64>()
            .map_err(|_| invalid(format!("invalid updated_at `{updated_at}`")))?;

        let product = Product {
            id,
            name,
            price,
            categories: split_categories(&categories),
            on_sale,
            created_at,
            updated_at,
        };
        validate_fragment(&product.fragment(), &self.catalog)
            .map_err(|err| invalid(err.to_string()))?;
        Ok(product)
    }
}

impl ProductRepository for CsvProductRepository {
    fn list_products(&self) -> RepoResult<Vec<Product>> {
        self.load()
    }

    fn get_product(&self, id: ProductId) -> RepoResult<Option<Product>> {
        Ok(self.load()?.into_iter().find(|product| product.id == id))
    }

    fn insert_product(&self, fragment: &ProductFragment, timestamp: i64) -> RepoResult<Product> {
        validate_fragment(fragment, &self.catalog)?;

        let mut products = self.load()?;
        let mut id = Uuid::new_v4();
        while products.iter().any(|product| product.id == id) {
            id = Uuid::new_v4();
        }

        let product = Product::from_fragment(id, fragment.clone(), timestamp, timestamp);
        products.push(product.clone());
        self.save(&products)?;
        Ok(product)
    }

    fn update_product(
        &self,
        id: ProductId,
        fragment: &ProductFragment,
        timestamp: i64,
    ) -> RepoResult<Product> {
        validate_fragment(fragment, &self.catalog)?;

        let mut products = self.load()?;
        let slot = products
            .iter_mut()
            .find(|product| product.id == id)
            .ok_or(RepoError::NotFound(id))?;
        let updated = Product::from_fragment(id, fragment.clone(), slot.created_at, timestamp);
        *slot = updated.clone();

        self.save(&products)?;
        Ok(updated)
    }

    fn delete_product(&self, id: ProductId) -> RepoResult<()> {
        let mut products = self.load()?;
        let before = products.len();
        products.retain(|product| product.id != id);
        if products.len() == before {
            return Err(RepoError::NotFound(id));
        }

        self.save(&products)
    }

    fn delete_all_products(&self) -> RepoResult<()> {
        self.save(&[])
    }
}

fn product_to_record(product: &Product) -> [String; 7] {
    [
        product.id.to_string(),
        product.name.clone(),
        format!("{:.2}", product.price),
        join_categories(&product.categories),
        product.on_sale.to_string(),
        product.created_at.to_string(),
        product.updated_at.to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::{CsvProductRepository, PRODUCTS_FILE_NAME};
    use crate::model::catalog::CategoryCatalog;
    use crate::repo::product_repo::{ProductRepository, RepoError};

    #[test]
    fn missing_file_lists_empty() {
        let dir = tempfile::tempdir().unwrap();
        let repo = CsvProductRepository::in_dir(dir.path(), CategoryCatalog::default());
        assert!(repo.list_products().unwrap().is_empty());
        assert_eq!(repo.path(), dir.path().join(PRODUCTS_FILE_NAME));
    }

    #[test]
    fn unexpected_header_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PRODUCTS_FILE_NAME);
        std::fs::write(&path, "id_product,nombre,precio\n").unwrap();

        let repo = CsvProductRepository::new(&path, CategoryCatalog::default());
        let err = repo.list_products().unwrap_err();
        assert!(matches!(err, RepoError::InvalidData(message) if message.contains("header")));
    }

    #[test]
    fn wrong_field_count_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(PRODUCTS_FILE_NAME);
        std::fs::write(
            &path,
            "id,name,price,categories,on_sale,created_at,updated_at\nabc,Trufa\n",
        )
        .unwrap();

        let repo = CsvProductRepository::new(&path, CategoryCatalog::default());
        let err = repo.list_products().unwrap_err();
        assert!(
            matches!(err, RepoError::InvalidData(ref message) if message.contains("expected 7 fields")),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn delete_all_leaves_header_only_file() {
        let dir = tempfile::tempdir().unwrap();
        let repo = CsvProductRepository::in_dir(dir.path().join("nested"), CategoryCatalog::default());
        repo.delete_all_products().unwrap();

        let text = std::fs::read_to_string(repo.path()).unwrap();
        assert_eq!(text, "id,name,price,categories,on_sale,created_at,updated_at\n");
        assert!(repo.list_products().unwrap().is_empty());
    }
}
