//! Product domain model.
//!
//! # Responsibility
//! - Define the stored product record and the canonical fragment produced by
//!   validation.
//! - Provide the read-side predicates used by list filtering.
//!
//! # Invariants
//! - `id` is assigned by the storage backing and never reused.
//! - `categories` is sorted and free of duplicates.
//! - `created_at` is fixed at insert; only `updated_at` moves on update.

use crate::model::catalog::OnSaleTokens;
use crate::validation::RawProductInput;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a stored product.
pub type ProductId = Uuid;

/// Normalized `{name, price, categories, on_sale}` tuple returned by
/// successful validation, before id/timestamp assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFragment {
    /// Trimmed display name.
    pub name: String,
    /// Price rounded to two decimal places.
    pub price: Decimal,
    /// Sorted, deduplicated catalog labels.
    pub categories: Vec<String>,
    /// Whether the product is currently offered.
    pub on_sale: bool,
}

impl ProductFragment {
    /// Renders this fragment back into raw form input.
    ///
    /// Validating the result yields an equal fragment.
    pub fn to_raw_input(&self, tokens: &OnSaleTokens) -> RawProductInput {
        RawProductInput {
            name: self.name.clone(),
            price: Some(format!("{:.2}", self.price)),
            categories: self.categories.clone(),
            on_sale: tokens.label(self.on_sale).to_string(),
        }
    }
}

/// Stored product record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub categories: Vec<String>,
    pub on_sale: bool,
    /// Unix epoch milliseconds of the accepted create.
    pub created_at: i64,
    /// Unix epoch milliseconds of the latest accepted write.
    pub updated_at: i64,
}

impl Product {
    /// Builds a record from a canonical fragment and storage-assigned metadata.
    pub fn from_fragment(
        id: ProductId,
        fragment: ProductFragment,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            id,
            name: fragment.name,
            price: fragment.price,
            categories: fragment.categories,
            on_sale: fragment.on_sale,
            created_at,
            updated_at,
        }
    }

    /// Returns the mutable part of this record.
    pub fn fragment(&self) -> ProductFragment {
        ProductFragment {
            name: self.name.clone(),
            price: self.price,
            categories: self.categories.clone(),
            on_sale: self.on_sale,
        }
    }

    /// Case-insensitive substring match on the name.
    ///
    /// A blank needle matches every product.
    pub fn name_contains(&self, needle: &str) -> bool {
        let needle = needle.trim();
        if needle.is_empty() {
            return true;
        }
        self.name.to_lowercase().contains(&needle.to_lowercase())
    }

    /// Returns whether `label` is one of this product's categories.
    pub fn has_category(&self, label: &str) -> bool {
        let label = label.trim();
        self.categories.iter().any(|category| category == label)
    }
}
