//! Binding error types.

use std::error::Error as StdError;
use thiserror::Error;

/// Result type for binding operations.
pub type BindResult<T> = Result<T, BindError>;

/// Errors that can occur while binding configuration sources onto a record.
///
/// A failed layer leaves every field it already wrote in place; callers must
/// not assume an all-or-nothing record after an error.
#[derive(Error, Debug)]
pub enum BindError {
    /// The target or the document is not shaped like a record.
    #[error("config must be {expected} (got {found})")]
    ShapeMismatch {
        /// What the binder expected.
        expected: &'static str,
        /// What it received.
        found: String,
    },

    /// A source value could not be coerced into its field's type.
    #[error("{key}: {reason}")]
    Parse {
        /// The external key, with `[index]` for collection elements.
        key: String,
        /// The underlying parse failure.
        reason: String,
    },

    /// The field's type has no coercion rule.
    #[error("{key}: unsupported field type {kind}")]
    UnsupportedKind {
        /// The external key.
        key: String,
        /// Name of the offending type.
        kind: String,
    },

    /// Strict mode found environment keys under the prefix that no field consumed.
    #[error("unknown environment variables: [{}]", .0.join(", "))]
    UnknownKeys(Vec<String>),

    /// Strict mode found a document key with no matching record field.
    #[error("unknown fields in config: unknown field \"{field}\"")]
    UnknownField {
        /// Dotted path of the offending key.
        field: String,
    },

    /// A document source could not produce any content.
    #[error("no data source {origin}: {source}")]
    NoDataSource {
        /// Description of the source (path, stream).
        origin: String,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The remote store has no value for the key.
    #[error("parameter {key} not found or has no value")]
    NotFound {
        /// The parameter name.
        key: String,
    },

    /// The remote store collaborator failed.
    #[error("failed to get parameter {key}: {source}")]
    Transport {
        /// The parameter name.
        key: String,
        /// Error reported by the collaborator.
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON decoding error.
    #[error("failed to decode JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML decoding error.
    #[error("failed to decode TOML document: {0}")]
    Toml(#[from] toml::de::Error),

    /// A text document contained bytes that are not UTF-8.
    #[error("failed to decode document: {0}")]
    Utf8(#[from] std::str::Utf8Error),
}

impl BindError {
    /// Create a new shape mismatch error.
    pub fn shape_mismatch(expected: &'static str, found: impl Into<String>) -> Self {
        Self::ShapeMismatch {
            expected,
            found: found.into(),
        }
    }

    /// Create a new parse error.
    pub fn parse(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Parse {
            key: key.into(),
            reason: reason.into(),
        }
    }

    /// Create a new parse error for one element of a collection.
    pub fn parse_element(key: &str, index: usize, reason: impl Into<String>) -> Self {
        Self::Parse {
            key: format!("{key}[{index}]"),
            reason: reason.into(),
        }
    }

    /// Create a new unsupported kind error.
    pub fn unsupported_kind(key: impl Into<String>, kind: impl Into<String>) -> Self {
        Self::UnsupportedKind {
            key: key.into(),
            kind: kind.into(),
        }
    }

    /// Create a new unknown field error.
    pub fn unknown_field(field: impl Into<String>) -> Self {
        Self::UnknownField {
            field: field.into(),
        }
    }

    /// Create a new no data source error.
    pub fn no_data_source(origin: impl Into<String>, source: std::io::Error) -> Self {
        Self::NoDataSource {
            origin: origin.into(),
            source,
        }
    }

    /// Create a new not found error.
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a new transport error.
    pub fn transport(
        key: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self::Transport {
            key: key.into(),
            source: source.into(),
        }
    }

    /// Returns true if this error reports source data the record has no field for.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::UnknownKeys(_) | Self::UnknownField { .. })
    }
}
