//! Layered loading.
//!
//! This module provides [`ConfigLoader`] and [`load`] for applying an ordered
//! list of sources onto one record. Later layers override earlier ones:
//!
//! 1. Option layers ([`ErrOnUnknown`], [`WithParameterStore`]), wherever they
//!    appear in the list
//! 2. Source layers, in the order given
//!
//! The first failing layer aborts the load. Fields written by earlier layers,
//! and by the failing layer before it failed, are kept.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use crate::coerce::DEFAULT_DELIMITER;
use crate::document::{bind_document, DocumentFormat, DocumentSource};
use crate::env::{bind_env, BindContext, EnvSource, MapEnv, StdEnv};
use crate::record::Record;
use crate::remote::{bind_parameter, ParameterRequest, ParameterStore, DEFAULT_REGION};
use crate::{BindError, BindResult};

/// State shared by the layers of one load.
///
/// Option layers write it before any source layer runs; source layers only
/// read it.
#[derive(Default)]
pub struct LoaderState {
    /// Report source data the record has no field for.
    pub err_on_unknown: bool,
    /// Client used by parameter layers.
    pub parameter_store: Option<Arc<dyn ParameterStore>>,
}

impl fmt::Debug for LoaderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoaderState")
            .field("err_on_unknown", &self.err_on_unknown)
            .field("parameter_store", &self.parameter_store.is_some())
            .finish()
    }
}

/// One step of a load.
pub trait Layer<T> {
    /// Applies the layer onto `target`.
    ///
    /// # Errors
    ///
    /// Any binding error; the load stops at the first one.
    fn apply(self: Box<Self>, target: &mut T, state: &mut LoaderState) -> BindResult<()>;

    /// Option layers run before every source layer.
    fn is_option(&self) -> bool {
        false
    }

    /// Short description for logs.
    fn describe(&self) -> String;
}

// ============================================================================
// Option layers
// ============================================================================

/// Fail on source data that no record field consumes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrOnUnknown;

impl<T> Layer<T> for ErrOnUnknown {
    fn apply(self: Box<Self>, _target: &mut T, state: &mut LoaderState) -> BindResult<()> {
        state.err_on_unknown = true;
        Ok(())
    }

    fn is_option(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        "err_on_unknown".to_string()
    }
}

/// Use the given client for parameter layers.
#[derive(Clone)]
pub struct WithParameterStore(pub Arc<dyn ParameterStore>);

impl fmt::Debug for WithParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("WithParameterStore(..)")
    }
}

impl<T> Layer<T> for WithParameterStore {
    fn apply(self: Box<Self>, _target: &mut T, state: &mut LoaderState) -> BindResult<()> {
        state.parameter_store = Some(self.0);
        Ok(())
    }

    fn is_option(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        "parameter_store".to_string()
    }
}

// ============================================================================
// Source layers
// ============================================================================

/// Binds environment-style variables under a prefix.
pub struct EnvLayer {
    prefix: String,
    delimiter: String,
    source: Box<dyn EnvSource>,
}

impl EnvLayer {
    /// Read from the process environment.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self::from_source(prefix, StdEnv)
    }

    /// Read from any [`EnvSource`].
    pub fn from_source(prefix: impl Into<String>, source: impl EnvSource + 'static) -> Self {
        Self {
            prefix: prefix.into(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            source: Box::new(source),
        }
    }

    /// Read variables from a `.env` file, without touching the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_dotenv(prefix: impl Into<String>, path: impl Into<PathBuf>) -> BindResult<Self> {
        let source = MapEnv::from_dotenv(path.into())?;
        Ok(Self::from_source(prefix, source))
    }

    /// Set the collection delimiter.
    #[must_use]
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }
}

impl fmt::Debug for EnvLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvLayer")
            .field("prefix", &self.prefix)
            .field("delimiter", &self.delimiter)
            .finish_non_exhaustive()
    }
}

impl<T: Record> Layer<T> for EnvLayer {
    fn apply(self: Box<Self>, target: &mut T, state: &mut LoaderState) -> BindResult<()> {
        let ctx = BindContext::new(self.prefix)
            .delimiter(self.delimiter)
            .strict(state.err_on_unknown);
        bind_env(target, self.source.as_ref(), &ctx)
    }

    fn describe(&self) -> String {
        format!("env({})", self.prefix)
    }
}

/// Binds a JSON or TOML document.
#[derive(Debug)]
pub struct DocumentLayer {
    source: DocumentSource,
    format: DocumentFormat,
}

impl DocumentLayer {
    /// Create a layer for `source` in `format`.
    pub fn new(source: impl Into<DocumentSource>, format: DocumentFormat) -> Self {
        Self {
            source: source.into(),
            format,
        }
    }

    /// A JSON document layer.
    pub fn json(source: impl Into<DocumentSource>) -> Self {
        Self::new(source, DocumentFormat::Json)
    }

    /// A TOML document layer.
    pub fn toml(source: impl Into<DocumentSource>) -> Self {
        Self::new(source, DocumentFormat::Toml)
    }
}

impl<T> Layer<T> for DocumentLayer
where
    T: Serialize + DeserializeOwned,
{
    fn apply(self: Box<Self>, target: &mut T, state: &mut LoaderState) -> BindResult<()> {
        let bytes = self.source.read_all()?;
        bind_document(target, &bytes, self.format, state.err_on_unknown)
    }

    fn describe(&self) -> String {
        format!("{}({})", self.format, self.source)
    }
}

/// Binds a JSON value fetched from the parameter store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterLayer {
    name: String,
    region: String,
    profile: Option<String>,
}

impl ParameterLayer {
    /// Fetch `name` from [`DEFAULT_REGION`].
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            region: DEFAULT_REGION.to_string(),
            profile: None,
        }
    }

    /// Set the region.
    #[must_use]
    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    /// Set the credentials profile.
    #[must_use]
    pub fn profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}

impl<T> Layer<T> for ParameterLayer
where
    T: Serialize + DeserializeOwned,
{
    fn apply(self: Box<Self>, target: &mut T, state: &mut LoaderState) -> BindResult<()> {
        let Some(store) = state.parameter_store.clone() else {
            return Err(BindError::transport(
                self.name.clone(),
                format!("no parameter store configured for region {}", self.region),
            ));
        };

        let request = ParameterRequest {
            name: &self.name,
            with_decryption: true,
            region: &self.region,
            profile: self.profile.as_deref(),
        };
        bind_parameter(target, store.as_ref(), &request, state.err_on_unknown)
    }

    fn describe(&self) -> String {
        format!("parameter({})", self.name)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Applies `layers` onto `target`.
///
/// Option layers run first, then source layers in list order.
///
/// # Errors
///
/// Returns the first layer error. Earlier writes are not rolled back.
pub fn load<T>(target: &mut T, layers: Vec<Box<dyn Layer<T>>>) -> BindResult<()> {
    let mut state = LoaderState::default();
    let (options, sources): (Vec<_>, Vec<_>) =
        layers.into_iter().partition(|layer| layer.is_option());

    for layer in options.into_iter().chain(sources) {
        let name = layer.describe();
        layer.apply(target, &mut state)?;
        debug!(layer = %name, "applied configuration layer");
    }

    Ok(())
}

/// Builder for an ordered list of layers.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use strata::{Bind, ConfigLoader, MapEnv};
///
/// #[derive(Debug, Default, Bind, Serialize, Deserialize)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// let env = MapEnv::from_pairs([("APP_PORT", "9090")]);
/// let server: Server = ConfigLoader::new()
///     .with_json(br#"{"host": "0.0.0.0", "port": 8080}"#.as_slice())
///     .with_env_source("APP", env)
///     .load()
///     .unwrap();
///
/// assert_eq!(server.host, "0.0.0.0");
/// assert_eq!(server.port, 9090);
/// ```
pub struct ConfigLoader<T> {
    layers: Vec<Box<dyn Layer<T>>>,
}

impl<T> Default for ConfigLoader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ConfigLoader<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let layers: Vec<_> = self.layers.iter().map(|layer| layer.describe()).collect();
        f.debug_struct("ConfigLoader").field("layers", &layers).finish()
    }
}

impl<T> ConfigLoader<T> {
    /// Create a loader with no layers.
    #[must_use]
    pub fn new() -> Self {
        Self { layers: Vec::new() }
    }

    /// Append any layer.
    #[must_use]
    pub fn with_layer(mut self, layer: impl Layer<T> + 'static) -> Self {
        self.layers.push(Box::new(layer));
        self
    }

    /// Fail on source data that no field consumes.
    #[must_use]
    pub fn err_on_unknown(self) -> Self {
        self.with_layer(ErrOnUnknown)
    }

    /// Use `store` for parameter layers.
    #[must_use]
    pub fn with_parameter_store(self, store: impl ParameterStore + 'static) -> Self {
        self.with_layer(WithParameterStore(Arc::new(store)))
    }

    /// Number of layers added so far.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// Returns true if no layer was added.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Applies every layer onto `target`.
    ///
    /// # Errors
    ///
    /// Returns the first layer error.
    pub fn load_into(self, target: &mut T) -> BindResult<()> {
        load(target, self.layers)
    }

    /// Applies every layer onto `T::default()`.
    ///
    /// # Errors
    ///
    /// Returns the first layer error.
    pub fn load(self) -> BindResult<T>
    where
        T: Default,
    {
        let mut target = T::default();
        self.load_into(&mut target)?;
        Ok(target)
    }
}

impl<T: Record> ConfigLoader<T> {
    /// Bind process environment variables under `prefix`.
    #[must_use]
    pub fn with_env(self, prefix: impl Into<String>) -> Self {
        self.with_layer(EnvLayer::new(prefix))
    }

    /// Bind process environment variables, splitting collections on `delimiter`.
    #[must_use]
    pub fn with_env_delimited(
        self,
        prefix: impl Into<String>,
        delimiter: impl Into<String>,
    ) -> Self {
        self.with_layer(EnvLayer::new(prefix).delimiter(delimiter))
    }

    /// Bind variables from `source` under `prefix`.
    #[must_use]
    pub fn with_env_source(
        self,
        prefix: impl Into<String>,
        source: impl EnvSource + 'static,
    ) -> Self {
        self.with_layer(EnvLayer::from_source(prefix, source))
    }
}

impl<T> ConfigLoader<T>
where
    T: Serialize + DeserializeOwned,
{
    /// Bind a JSON document.
    #[must_use]
    pub fn with_json(self, source: impl Into<DocumentSource>) -> Self {
        self.with_layer(DocumentLayer::json(source))
    }

    /// Bind a TOML document.
    #[must_use]
    pub fn with_toml(self, source: impl Into<DocumentSource>) -> Self {
        self.with_layer(DocumentLayer::toml(source))
    }

    /// Bind the JSON value of parameter `name` from the default region.
    #[must_use]
    pub fn with_parameter(self, name: impl Into<String>) -> Self {
        self.with_layer(ParameterLayer::new(name))
    }

    /// Bind the JSON value of parameter `name` from `region`, optionally
    /// using a named credentials profile.
    #[must_use]
    pub fn with_parameter_in(
        self,
        name: impl Into<String>,
        region: impl Into<String>,
        profile: Option<&str>,
    ) -> Self {
        let mut layer = ParameterLayer::new(name).region(region);
        if let Some(profile) = profile {
            layer = layer.profile(profile);
        }
        self.with_layer(layer)
    }
}
