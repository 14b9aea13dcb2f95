//! Closed vocabularies supplied by deployment configuration.
//!
//! # Responsibility
//! - Hold the category catalog products may reference.
//! - Hold the locale-specific yes/no labels for the on-sale flag.
//!
//! # Invariants
//! - Catalog labels are non-empty, trimmed, unique and free of `;`
//!   (the storage join separator).
//! - The two on-sale tokens are non-empty and distinct.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Separator used when a category list is flattened into one text field.
pub const CATEGORY_SEPARATOR: char = ';';

const DEFAULT_CATEGORIES: &[&str] = &[
    "Chocolates",
    "Caramelos",
    "Mashmelos",
    "Galletas",
    "Salados",
    "Gomas de mascar",
];

const DEFAULT_YES_TOKEN: &str = "Si";
const DEFAULT_NO_TOKEN: &str = "No";

/// Error raised when configured vocabularies are malformed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// Catalog declares no labels.
    EmptyCatalog,
    /// Label is blank, padded, or contains the storage separator.
    InvalidLabel(String),
    /// Label appears more than once.
    DuplicateLabel(String),
    /// An on-sale token is blank.
    EmptyToken,
    /// Both on-sale tokens are the same text.
    AmbiguousTokens(String),
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyCatalog => write!(f, "category catalog must declare at least one label"),
            Self::InvalidLabel(label) => write!(
                f,
                "invalid category label `{label}`; labels must be trimmed, non-empty and contain no `{CATEGORY_SEPARATOR}`"
            ),
            Self::DuplicateLabel(label) => write!(f, "duplicate category label `{label}`"),
            Self::EmptyToken => write!(f, "on-sale tokens must not be empty"),
            Self::AmbiguousTokens(token) => {
                write!(f, "on-sale tokens must differ; both are `{token}`")
            }
        }
    }
}

impl Error for CatalogError {}

/// Flattens a category list into one storage/export field.
pub(crate) fn join_categories(categories: &[String]) -> String {
    categories.join(&CATEGORY_SEPARATOR.to_string())
}

/// Inverse of [`join_categories`]; an empty field is an empty list.
pub(crate) fn split_categories(field: &str) -> Vec<String> {
    if field.is_empty() {
        return Vec::new();
    }
    field
        .split(CATEGORY_SEPARATOR)
        .map(ToString::to_string)
        .collect()
}

/// Fixed, closed set of permitted category labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryCatalog {
    labels: Vec<String>,
}

impl CategoryCatalog {
    /// Builds a catalog from configured labels, keeping declaration order.
    pub fn new<I, S>(labels: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for label in labels {
            let label = label.into();
            if label.is_empty() || label.trim() != label || label.contains(CATEGORY_SEPARATOR) {
                return Err(CatalogError::InvalidLabel(label));
            }
            if collected.contains(&label) {
                return Err(CatalogError::DuplicateLabel(label));
            }
            collected.push(label);
        }

        if collected.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }

        Ok(Self { labels: collected })
    }

    /// Labels in declaration order.
    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|known| known == label)
    }
}

impl Default for CategoryCatalog {
    fn default() -> Self {
        Self {
            labels: DEFAULT_CATEGORIES
                .iter()
                .map(|label| (*label).to_string())
                .collect(),
        }
    }
}

/// Locale-specific labels accepted for the on-sale question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnSaleTokens {
    yes: String,
    no: String,
}

impl OnSaleTokens {
    pub fn new(yes: impl Into<String>, no: impl Into<String>) -> Result<Self, CatalogError> {
        let yes = yes.into().trim().to_string();
        let no = no.into().trim().to_string();
        if yes.is_empty() || no.is_empty() {
            return Err(CatalogError::EmptyToken);
        }
        if yes == no {
            return Err(CatalogError::AmbiguousTokens(yes));
        }
        Ok(Self { yes, no })
    }

    /// Maps a raw label to the flag value; `None` when it matches neither token.
    ///
    /// Matching is exact after trimming surrounding whitespace.
    pub fn parse(&self, label: &str) -> Option<bool> {
        let label = label.trim();
        if label == self.yes {
            Some(true)
        } else if label == self.no {
            Some(false)
        } else {
            None
        }
    }

    /// Returns the token that renders `value`.
    pub fn label(&self, value: bool) -> &str {
        if value {
            &self.yes
        } else {
            &self.no
        }
    }

    pub fn yes(&self) -> &str {
        &self.yes
    }

    pub fn no(&self) -> &str {
        &self.no
    }
}

impl Default for OnSaleTokens {
    fn default() -> Self {
        Self {
            yes: DEFAULT_YES_TOKEN.to_string(),
            no: DEFAULT_NO_TOKEN.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CatalogError, CategoryCatalog, OnSaleTokens};

    #[test]
    fn default_catalog_has_six_confectionery_labels() {
        let catalog = CategoryCatalog::default();
        assert_eq!(catalog.labels().len(), 6);
        assert!(catalog.contains("Chocolates"));
        assert!(catalog.contains("Gomas de mascar"));
        assert!(!catalog.contains("Lacteos"));
    }

    #[test]
    fn catalog_rejects_malformed_labels() {
        assert_eq!(
            CategoryCatalog::new(Vec::<String>::new()).unwrap_err(),
            CatalogError::EmptyCatalog
        );
        assert_eq!(
            CategoryCatalog::new(["Chocolates", " Galletas"]).unwrap_err(),
            CatalogError::InvalidLabel(" Galletas".to_string())
        );
        assert_eq!(
            CategoryCatalog::new(["Dulces;Salados"]).unwrap_err(),
            CatalogError::InvalidLabel("Dulces;Salados".to_string())
        );
        assert_eq!(
            CategoryCatalog::new(["Galletas", "Galletas"]).unwrap_err(),
            CatalogError::DuplicateLabel("Galletas".to_string())
        );
    }

    #[test]
    fn on_sale_tokens_parse_exact_labels() {
        let tokens = OnSaleTokens::default();
        assert_eq!(tokens.parse("Si"), Some(true));
        assert_eq!(tokens.parse(" No "), Some(false));
        assert_eq!(tokens.parse("si"), None);
        assert_eq!(tokens.parse("Sí"), None);
        assert_eq!(tokens.label(true), "Si");
        assert_eq!(tokens.label(false), "No");
    }

    #[test]
    fn on_sale_tokens_must_differ() {
        assert_eq!(
            OnSaleTokens::new("Yes", " Yes").unwrap_err(),
            CatalogError::AmbiguousTokens("Yes".to_string())
        );
        assert_eq!(
            OnSaleTokens::new("", "No").unwrap_err(),
            CatalogError::EmptyToken
        );
    }
}
