//! Remote parameter store source.
//!
//! The transport is not part of this crate. Callers supply a
//! [`ParameterStore`] that fetches one decrypted parameter by name; a present
//! value is bound as a JSON document.

use std::collections::HashMap;
use std::error::Error as StdError;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::document::{bind_document, DocumentFormat};
use crate::{BindError, BindResult};

/// Region used when a parameter layer does not name one.
pub const DEFAULT_REGION: &str = "us-east-1";

/// A single parameter lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRequest<'a> {
    /// Parameter name.
    pub name: &'a str,
    /// Ask the store to decrypt secure values.
    pub with_decryption: bool,
    /// Region the parameter lives in.
    pub region: &'a str,
    /// Named credentials profile, if any.
    pub profile: Option<&'a str>,
}

/// Fetches one string value by name.
///
/// `Ok(None)` means the store answered but holds no value for the name.
pub trait ParameterStore: Send + Sync {
    /// Fetch the parameter described by `request`.
    ///
    /// # Errors
    ///
    /// Any transport or authorization failure.
    fn get_parameter(
        &self,
        request: &ParameterRequest<'_>,
    ) -> Result<Option<String>, Box<dyn StdError + Send + Sync>>;
}

/// In-memory store keyed by parameter name.
#[derive(Debug, Clone, Default)]
pub struct StaticParameterStore {
    values: HashMap<String, String>,
}

impl StaticParameterStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a parameter, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl ParameterStore for StaticParameterStore {
    fn get_parameter(
        &self,
        request: &ParameterRequest<'_>,
    ) -> Result<Option<String>, Box<dyn StdError + Send + Sync>> {
        Ok(self.values.get(request.name).cloned())
    }
}

/// Fetches `request.name` from `store` and binds it onto `target` as JSON.
///
/// # Errors
///
/// - `BindError::Transport` if the store call fails.
/// - `BindError::NotFound` if the parameter is absent or empty.
/// - Any document binding error for the fetched value.
pub fn bind_parameter<T>(
    target: &mut T,
    store: &dyn ParameterStore,
    request: &ParameterRequest<'_>,
    strict: bool,
) -> BindResult<()>
where
    T: Serialize + DeserializeOwned,
{
    let value = store
        .get_parameter(request)
        .map_err(|e| BindError::transport(request.name, e))?;

    let value = match value {
        Some(value) if !value.is_empty() => value,
        _ => return Err(BindError::not_found(request.name)),
    };

    debug!(
        name = request.name,
        region = request.region,
        bytes = value.len(),
        "fetched parameter"
    );
    bind_document(target, value.as_bytes(), DocumentFormat::Json, strict)
}
