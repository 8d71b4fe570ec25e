//! Error types for sqlstitch

use thiserror::Error;

/// Result type alias for fragment-assembly operations
pub type StitchResult<T> = Result<T, StitchError>;

/// Error types raised while building criteria
#[derive(Debug, Error)]
pub enum StitchError {
    /// A property has no column mapping in the relation metadata
    #[error("Unresolved property '{property}' on relation '{relation}'")]
    UnresolvedProperty { relation: String, property: String },

    /// A template predicate failed marker/argument validation
    #[error("Malformed template: {0}")]
    MalformedTemplate(String),

    /// A range predicate was given bounds that do not form a pair
    #[error("Invalid range bounds: {0}")]
    InvalidRange(String),

    /// A raw column, table or alias string failed identifier validation
    #[error("Invalid identifier: {0}")]
    Identifier(String),

    /// Relation metadata is malformed
    #[error("Metadata error: {0}")]
    Metadata(String),
}

impl StitchError {
    /// Create an unresolved-property error
    pub fn unresolved(relation: impl Into<String>, property: impl Into<String>) -> Self {
        Self::UnresolvedProperty {
            relation: relation.into(),
            property: property.into(),
        }
    }

    /// Create a malformed-template error
    pub fn template(message: impl Into<String>) -> Self {
        Self::MalformedTemplate(message.into())
    }

    /// Create an invalid-range error
    pub fn range(message: impl Into<String>) -> Self {
        Self::InvalidRange(message.into())
    }

    /// Create an identifier error
    pub fn identifier(message: impl Into<String>) -> Self {
        Self::Identifier(message.into())
    }

    /// Create a metadata error
    pub fn metadata(message: impl Into<String>) -> Self {
        Self::Metadata(message.into())
    }

    /// Check if this is an unresolved-property error
    pub fn is_unresolved(&self) -> bool {
        matches!(self, Self::UnresolvedProperty { .. })
    }

    /// Check if this is a malformed-template error
    pub fn is_template(&self) -> bool {
        matches!(self, Self::MalformedTemplate(_))
    }

    /// Check if this is an invalid-range error
    pub fn is_range(&self) -> bool {
        matches!(self, Self::InvalidRange(_))
    }

    /// Check if this is an identifier error
    pub fn is_identifier(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }
}
