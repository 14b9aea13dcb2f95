//! CSV export of the stored product collection.
//!
//! # Invariants
//! - Header is always `id,name,price,categories,onSale,timestamp`.
//! - Categories are joined with `;`, prices carry exactly two decimals.
//! - `timestamp` is the last accepted write, rendered in UTC.

use crate::delimited::encode_record;
use crate::model::catalog::join_categories;
use crate::model::product::Product;
use chrono::{DateTime, Utc};

/// Header row written before any product row.
pub const EXPORT_HEADER: &str = "id,name,price,categories,onSale,timestamp";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Renders the full collection as CSV text, one row per product, in the
/// given order. Every line, the last included, ends with `\n`.
pub fn export_csv(products: &[Product]) -> String {
    let mut out = String::with_capacity(EXPORT_HEADER.len() + 1 + products.len() * 64);
    out.push_str(EXPORT_HEADER);
    out.push('\n');

    for product in products {
        let row = [
            product.id.to_string(),
            product.name.clone(),
            format!("{:.2}", product.price),
            join_categories(&product.categories),
            product.on_sale.to_string(),
            format_timestamp(product.updated_at),
        ];
        out.push_str(&encode_record(&row));
        out.push('\n');
    }

    out
}

/// Formats epoch milliseconds as `YYYY-MM-DD HH:MM:SS` in UTC.
///
/// Values outside the calendar range fall back to the raw number.
pub fn format_timestamp(epoch_ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(epoch_ms) {
        Some(instant) => instant.format(TIMESTAMP_FORMAT).to_string(),
        None => epoch_ms.to_string(),
    }
}
