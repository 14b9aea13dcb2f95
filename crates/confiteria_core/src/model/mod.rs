//! Domain model for the product registry.
//!
//! # Responsibility
//! - Define the canonical product record and its pre-storage fragment.
//! - Hold the configurable vocabularies (category catalog, on-sale tokens).
//!
//! # Invariants
//! - Every stored product is identified by a stable `ProductId`.
//! - Deletion is a hard delete; ids are never handed out again.

pub mod catalog;
pub mod product;
