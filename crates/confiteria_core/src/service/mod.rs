//! Core use-case services.
//!
//! # Responsibility
//! - Compose validation, timestamping and persistence into use-case APIs.
//! - Keep the presentation layer decoupled from storage details.

pub mod product_service;
