//! Storage collaborator contract and its two backings.
//!
//! # Responsibility
//! - Define the product persistence contract used by the service layer.
//! - Provide a local delimited-file backing and a SQLite table backing that
//!   behave identically under that contract.
//!
//! # Invariants
//! - Writes re-check the fragment with `validate_fragment()` before
//!   persisting.
//! - Reads reject invalid persisted rows instead of masking them.
//! - Ids are assigned by the backing at insert and never reused.

pub mod csv_repo;
pub mod product_repo;
