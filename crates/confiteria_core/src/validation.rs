//! Product validation and canonical-form normalization.
//!
//! # Responsibility
//! - Decide whether raw form input describes an acceptable product.
//! - Produce the canonical fragment that storage backings persist.
//!
//! # Invariants
//! - Pure: no I/O, no clock, no logging.
//! - Every violated rule is reported, in check order
//!   (name, price, categories, on-sale flag).
//! - Validating the raw rendering of an accepted fragment yields the same
//!   fragment.

use crate::model::catalog::{CategoryCatalog, OnSaleTokens};
use crate::model::product::ProductFragment;
use once_cell::sync::Lazy;
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Maximum product name length, in characters, after trimming.
pub const NAME_MAX_CHARS: usize = 20;
/// Decimal places kept for stored prices.
pub const PRICE_SCALE: u32 = 2;
/// Exclusive upper price bound.
pub const PRICE_UPPER_BOUND: i64 = 999;

static DECIMAL_LITERAL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:[0-9]+\.?[0-9]*|\.[0-9]+)(?:[eE][+-]?[0-9]+)?$")
        .expect("valid decimal literal regex")
});

/// Raw field values collected by the presentation layer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProductInput {
    pub name: String,
    /// `None` when the price field was left empty.
    pub price: Option<String>,
    pub categories: Vec<String>,
    /// Label chosen for the on-sale question.
    pub on_sale: String,
}

/// Why a price was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    Missing,
    Unparseable(String),
    /// Value (raw text) is not strictly between 0 and 999 once rounded.
    OutOfRange(String),
    /// Stored value carries more than two decimal places.
    TooPrecise(Decimal),
}

/// Why a category selection was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryError {
    Empty,
    Unknown(String),
    /// Stored list is not sorted or contains duplicates.
    NotNormalized,
}

/// One violated product rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    InvalidName,
    InvalidPrice(PriceError),
    InvalidCategories(CategoryError),
    InvalidOnSaleFlag(String),
}

impl ValidationError {
    /// Stable machine-readable code for logs and callers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidName => "invalid_name",
            Self::InvalidPrice(_) => "invalid_price",
            Self::InvalidCategories(_) => "invalid_categories",
            Self::InvalidOnSaleFlag(_) => "invalid_on_sale_flag",
        }
    }
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidName => write!(
                f,
                "El nombre no puede estar vacío ni superar {NAME_MAX_CHARS} caracteres."
            ),
            Self::InvalidPrice(PriceError::Missing) => {
                write!(f, "Por favor verifique el campo del precio.")
            }
            Self::InvalidPrice(PriceError::Unparseable(raw)) => {
                write!(f, "Por favor verifique el campo precio: `{raw}` no es un número.")
            }
            Self::InvalidPrice(PriceError::OutOfRange(_)) => write!(
                f,
                "El precio debe ser mayor a 0 y menor a {PRICE_UPPER_BOUND}."
            ),
            Self::InvalidPrice(PriceError::TooPrecise(value)) => write!(
                f,
                "El precio admite como máximo {PRICE_SCALE} decimales: {value}."
            ),
            Self::InvalidCategories(CategoryError::Empty) => {
                write!(f, "Debe elegir al menos una categoría.")
            }
            Self::InvalidCategories(CategoryError::Unknown(label)) => {
                write!(f, "Categoría inválida: {label}")
            }
            Self::InvalidCategories(CategoryError::NotNormalized) => {
                write!(f, "Las categorías deben estar ordenadas y sin duplicados.")
            }
            Self::InvalidOnSaleFlag(_) => write!(f, "Valor inválido para ¿está en venta?"),
        }
    }
}

impl Error for ValidationError {}

/// Non-empty set of violations for one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<ValidationError>,
}

impl ValidationErrors {
    fn from_vec(errors: Vec<ValidationError>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Violations in check order.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// The violation a short-circuiting check would have reported.
    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Comma-separated violation codes, deduplicated, in check order.
    pub fn codes(&self) -> String {
        let mut codes: Vec<&'static str> = Vec::new();
        for error in &self.errors {
            if !codes.contains(&error.code()) {
                codes.push(error.code());
            }
        }
        codes.join(",")
    }
}

impl Display for ValidationErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let messages: Vec<String> = self.errors.iter().map(ToString::to_string).collect();
        write!(f, "{}", messages.join(" "))
    }
}

impl Error for ValidationErrors {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.errors.first().map(|err| err as &(dyn Error + 'static))
    }
}

/// Validates raw form input and returns its canonical fragment.
///
/// # Errors
/// Returns every violated rule when the input is not acceptable.
pub fn validate_product(
    input: &RawProductInput,
    catalog: &CategoryCatalog,
    tokens: &OnSaleTokens,
) -> Result<ProductFragment, ValidationErrors> {
    let mut errors = Vec::new();

    let name = input.name.trim();
    if !name_length_ok(name) {
        errors.push(ValidationError::InvalidName);
    }

    let price = match normalize_price(input.price.as_deref()) {
        Ok(price) => Some(price),
        Err(err) => {
            errors.push(ValidationError::InvalidPrice(err));
            None
        }
    };

    let categories = match normalize_categories(&input.categories, catalog) {
        Ok(categories) => Some(categories),
        Err(category_errors) => {
            errors.extend(
                category_errors
                    .into_iter()
                    .map(ValidationError::InvalidCategories),
            );
            None
        }
    };

    let on_sale = tokens.parse(&input.on_sale);
    if on_sale.is_none() {
        errors.push(ValidationError::InvalidOnSaleFlag(
            input.on_sale.trim().to_string(),
        ));
    }

    match (price, categories, on_sale) {
        (Some(price), Some(categories), Some(on_sale)) if errors.is_empty() => {
            Ok(ProductFragment {
                name: name.to_string(),
                price,
                categories,
                on_sale,
            })
        }
        _ => Err(ValidationErrors { errors }),
    }
}

/// Re-checks a fragment that claims to be canonical.
///
/// Used by storage backings before writes and when decoding stored rows.
///
/// # Errors
/// Returns every field that breaks a stored-product invariant.
pub fn validate_fragment(
    fragment: &ProductFragment,
    catalog: &CategoryCatalog,
) -> Result<(), ValidationErrors> {
    let mut errors = Vec::new();

    if fragment.name.trim() != fragment.name || !name_length_ok(&fragment.name) {
        errors.push(ValidationError::InvalidName);
    }

    if fragment.price.scale() > PRICE_SCALE {
        errors.push(ValidationError::InvalidPrice(PriceError::TooPrecise(
            fragment.price,
        )));
    } else if !price_in_range(fragment.price) {
        errors.push(ValidationError::InvalidPrice(PriceError::OutOfRange(
            fragment.price.to_string(),
        )));
    }

    if fragment.categories.is_empty() {
        errors.push(ValidationError::InvalidCategories(CategoryError::Empty));
    }
    for label in &fragment.categories {
        if !catalog.contains(label) {
            errors.push(ValidationError::InvalidCategories(CategoryError::Unknown(
                label.clone(),
            )));
        }
    }
    if fragment
        .categories
        .windows(2)
        .any(|pair| pair[0] >= pair[1])
    {
        errors.push(ValidationError::InvalidCategories(
            CategoryError::NotNormalized,
        ));
    }

    match ValidationErrors::from_vec(errors) {
        Some(errors) => Err(errors),
        None => Ok(()),
    }
}

fn name_length_ok(name: &str) -> bool {
    let chars = name.chars().count();
    chars > 0 && chars <= NAME_MAX_CHARS
}

fn price_in_range(value: Decimal) -> bool {
    value > Decimal::ZERO && value < Decimal::from(PRICE_UPPER_BOUND)
}

fn normalize_price(raw: Option<&str>) -> Result<Decimal, PriceError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or(PriceError::Missing)?;

    let parsed = parse_decimal_literal(raw)?;
    if !price_in_range(parsed) {
        return Err(PriceError::OutOfRange(raw.to_string()));
    }

    // Rounding can push a value onto a bound (0.004 -> 0.00, 998.996 -> 999.00).
    let mut rounded = parsed.round_dp(PRICE_SCALE);
    if !price_in_range(rounded) {
        return Err(PriceError::OutOfRange(raw.to_string()));
    }
    rounded.rescale(PRICE_SCALE);
    Ok(rounded)
}

fn parse_decimal_literal(raw: &str) -> Result<Decimal, PriceError> {
    if !DECIMAL_LITERAL_RE.is_match(raw) {
        return Err(PriceError::Unparseable(raw.to_string()));
    }

    let (mantissa, exponent) = match raw.find(|c: char| c == 'e' || c == 'E') {
        Some(index) => (&raw[..index], Some(&raw[index + 1..])),
        None => (raw, None),
    };
    let (sign, digits) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa.strip_prefix('+').unwrap_or(mantissa)),
    };

    let mut digits = digits.to_string();
    if digits.starts_with('.') {
        digits.insert(0, '0');
    }
    if digits.ends_with('.') {
        digits.push('0');
    }

    let parsed = match exponent {
        Some(exponent) => Decimal::from_scientific(&format!("{sign}{digits}e{exponent}")),
        None => Decimal::from_str(&format!("{sign}{digits}")),
    };

    // The literal is well-formed, so a conversion failure means the value
    // does not fit a 96-bit decimal: far outside (0, 999) either way.
    parsed.map_err(|_| PriceError::OutOfRange(raw.to_string()))
}

fn normalize_categories(
    labels: &[String],
    catalog: &CategoryCatalog,
) -> Result<Vec<String>, Vec<CategoryError>> {
    if labels.is_empty() {
        return Err(vec![CategoryError::Empty]);
    }

    let mut unknown: Vec<CategoryError> = Vec::new();
    let mut accepted = BTreeSet::new();
    for label in labels {
        let label = label.trim();
        if catalog.contains(label) {
            accepted.insert(label.to_string());
            continue;
        }
        let error = CategoryError::Unknown(label.to_string());
        if !unknown.contains(&error) {
            unknown.push(error);
        }
    }

    if !unknown.is_empty() {
        return Err(unknown);
    }
    Ok(accepted.into_iter().collect())
}
