use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};

/// Prefix carried by every store-assigned product identifier.
pub const PRODUCT_ID_PREFIX: &str = "PRD-";

/// Opaque, globally unique product identifier.
///
/// Store-assigned ids are `PRD-` followed by a UUID v7. Ids read off a tag
/// or supplied externally are accepted as long as they are non-empty and
/// safe to embed in a URL path segment.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ProductId(String);

impl ProductId {
    /// Generate a fresh time-ordered identifier.
    pub fn generate() -> Self {
        Self(format!("{PRODUCT_ID_PREFIX}{}", uuid::Uuid::now_v7()))
    }

    /// Parse an externally supplied identifier.
    pub fn parse(raw: impl AsRef<str>) -> ValidationResult<Self> {
        let trimmed = raw.as_ref().trim();
        if trimmed.is_empty() {
            return Err(ValidationError::MissingField("productId"));
        }
        if trimmed.chars().any(char::is_whitespace) {
            return Err(ValidationError::InvalidProductId {
                id: trimmed.to_string(),
                reason: "contains whitespace",
            });
        }
        if trimmed.contains('/') {
            return Err(ValidationError::InvalidProductId {
                id: trimmed.to_string(),
                reason: "contains '/'",
            });
        }
        if trimmed == "." || trimmed == ".." {
            return Err(ValidationError::InvalidProductId {
                id: trimmed.to_string(),
                reason: "is a dot path segment",
            });
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if this id was produced by [`ProductId::generate`].
    pub fn is_generated(&self) -> bool {
        self.0.starts_with(PRODUCT_ID_PREFIX)
    }
}

impl FromStr for ProductId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ProductId {
    type Error = ValidationError;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

impl From<ProductId> for String {
    fn from(id: ProductId) -> Self {
        id.0
    }
}

impl AsRef<str> for ProductId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductId({})", self.0)
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_ids_are_prefixed_and_distinct() {
        let a = ProductId::generate();
        let b = ProductId::generate();
        assert!(a.is_generated());
        assert!(a.as_str().starts_with("PRD-"));
        assert_ne!(a, b);
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let id = ProductId::parse("  04A2B3C4  ").unwrap();
        assert_eq!(id.as_str(), "04A2B3C4");
        assert!(!id.is_generated());
    }

    #[test]
    fn parse_rejects_blank() {
        assert_eq!(
            ProductId::parse("   "),
            Err(ValidationError::MissingField("productId"))
        );
    }

    #[test]
    fn parse_rejects_path_separators_and_inner_spaces() {
        assert!(matches!(
            ProductId::parse("a/b"),
            Err(ValidationError::InvalidProductId { .. })
        ));
        assert!(matches!(
            ProductId::parse("a b"),
            Err(ValidationError::InvalidProductId { .. })
        ));
    }

    #[test]
    fn parse_rejects_dot_segments() {
        for raw in [".", "..", " .. "] {
            assert!(matches!(
                ProductId::parse(raw),
                Err(ValidationError::InvalidProductId { .. })
            ));
        }
        assert!(serde_json::from_str::<ProductId>("\"..\"").is_err());
        assert_eq!(ProductId::parse("...").unwrap().as_str(), "...");
        assert_eq!(ProductId::parse(".hidden").unwrap().as_str(), ".hidden");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = ProductId::parse("PRD-1").unwrap();
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"PRD-1\"");
    }

    #[test]
    fn deserialize_applies_parse_rules() {
        let id: ProductId = serde_json::from_str("\" PRD-2 \"").unwrap();
        assert_eq!(id.as_str(), "PRD-2");
        assert!(serde_json::from_str::<ProductId>("\"a/b\"").is_err());
        assert!(serde_json::from_str::<ProductId>("\"\"").is_err());
    }
}
