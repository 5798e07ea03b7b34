//! Environment variable binding.
//!
//! Fields are looked up under keys derived from their names, joined to the
//! accumulated prefix with `_`. Given the prefix `"APP"`:
//!
//! ```rust,ignore
//! struct AppConfig {
//!     port: u16,                  // APP_PORT
//!     #[bind(env = "LISTEN")]
//!     listen: String,             // LISTEN
//!     #[bind(nested)]
//!     database: DatabaseConfig,   // APP_DATABASE_*
//! }
//! ```
//!
//! Lookups go through [`EnvSource`], so binding can be tested without touching
//! the process environment.

use std::collections::BTreeSet;
use std::path::Path;

use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::coerce::DEFAULT_DELIMITER;
use crate::key::{field_key, KEY_SEPARATOR};
use crate::record::{FieldSlot, Record};
use crate::{BindError, BindResult};

// ============================================================================
// EnvSource trait
// ============================================================================

/// A flat key/value source with environment semantics.
pub trait EnvSource {
    /// Get the value of a variable by its exact name.
    ///
    /// # Errors
    ///
    /// Returns `BindError::Parse` naming the variable if it is set but cannot
    /// be read as a string.
    fn get(&self, name: &str) -> BindResult<Option<String>>;

    /// Iterate over all variables.
    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_>;
}

/// Reads from the actual process environment.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdEnv;

impl EnvSource for StdEnv {
    fn get(&self, name: &str) -> BindResult<Option<String>> {
        match std::env::var_os(name) {
            None => Ok(None),
            Some(value) => value
                .into_string()
                .map(Some)
                .map_err(|raw| BindError::parse(name, format!("value is not valid UTF-8: {raw:?}"))),
        }
    }

    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_> {
        // Non-UTF-8 entries cannot match a derived key.
        Box::new(std::env::vars_os().filter_map(|(k, v)| {
            Some((k.into_string().ok()?, v.into_string().ok()?))
        }))
    }
}

/// In-memory environment, for tests and `.env` files.
#[derive(Debug, Clone, Default)]
pub struct MapEnv {
    vars: IndexMap<String, String>,
}

impl MapEnv {
    /// Create an empty environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an environment from key/value pairs.
    pub fn from_pairs<I, K, V>(iter: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Read a `.env` file without modifying the process environment.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NoDataSource` if the file cannot be opened, and
    /// `BindError::Parse` if a line is malformed.
    pub fn from_dotenv(path: impl AsRef<Path>) -> BindResult<Self> {
        let path = path.as_ref();
        let origin = path.display().to_string();

        let iter = dotenvy::from_path_iter(path).map_err(|e| dotenv_error(&origin, e))?;

        let mut vars = IndexMap::new();
        for item in iter {
            let (key, value) = item.map_err(|e| dotenv_error(&origin, e))?;
            vars.insert(key, value);
        }

        debug!(path = %origin, count = vars.len(), "loaded dotenv file");
        Ok(Self { vars })
    }

    /// Set a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(name.into(), value.into());
    }

    /// Number of variables.
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the environment is empty.
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

impl EnvSource for MapEnv {
    fn get(&self, name: &str) -> BindResult<Option<String>> {
        Ok(self.vars.get(name).cloned())
    }

    fn vars(&self) -> Box<dyn Iterator<Item = (String, String)> + '_> {
        Box::new(self.vars.iter().map(|(k, v)| (k.clone(), v.clone())))
    }
}

fn dotenv_error(origin: &str, err: dotenvy::Error) -> BindError {
    match err {
        dotenvy::Error::Io(source) => BindError::no_data_source(origin, source),
        other => BindError::parse(origin, other.to_string()),
    }
}

// ============================================================================
// Binding
// ============================================================================

/// Per-call binding state, threaded down the record recursion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindContext {
    /// Accumulated key prefix; empty at the top level without a prefix.
    pub prefix: String,
    /// Delimiter between collection elements.
    pub delimiter: String,
    /// Report source keys under the prefix that no field consumed.
    pub strict: bool,
}

impl Default for BindContext {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            strict: false,
        }
    }
}

impl BindContext {
    /// Create a context for `prefix` with the default delimiter.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Self::default()
        }
    }

    /// Set the collection delimiter.
    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.delimiter = delimiter.into();
        self
    }

    /// Enable or disable strict unknown-key detection.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn nested(&self, prefix: String) -> Self {
        Self {
            prefix,
            delimiter: self.delimiter.clone(),
            strict: self.strict,
        }
    }
}

/// Binds `record` from `source`.
///
/// Fields are visited in declaration order; a field without a matching key is
/// left untouched and nested records are always visited. The first coercion
/// failure aborts, leaving earlier fields already written.
///
/// In strict mode with a non-empty prefix, every source key starting with
/// `PREFIX_` that no field consumed is reported, sorted, as
/// `BindError::UnknownKeys`. Keys are collected once for the top-level prefix
/// and shared by all nesting levels.
///
/// # Example
///
/// ```
/// use strata::{bind_env, Bind, BindContext, MapEnv};
///
/// #[derive(Default, Bind)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// let env = MapEnv::from_pairs([("APP_HOST", "localhost"), ("APP_PORT", "8080")]);
/// let mut server = Server::default();
/// bind_env(&mut server, &env, &BindContext::new("APP")).unwrap();
///
/// assert_eq!(server.host, "localhost");
/// assert_eq!(server.port, 8080);
/// ```
pub fn bind_env(
    record: &mut dyn Record,
    source: &dyn EnvSource,
    ctx: &BindContext,
) -> BindResult<()> {
    let ctx = ctx.nested(ctx.prefix.to_uppercase());

    let mut unknown = BTreeSet::new();
    if ctx.strict && !ctx.prefix.is_empty() {
        let scope = format!("{}{KEY_SEPARATOR}", ctx.prefix);
        unknown.extend(
            source
                .vars()
                .map(|(key, _)| key)
                .filter(|key| key.starts_with(&scope)),
        );
    }

    bind_fields(record, source, &ctx, &mut unknown)?;

    if unknown.is_empty() {
        Ok(())
    } else {
        Err(BindError::UnknownKeys(unknown.into_iter().collect()))
    }
}

fn bind_fields(
    record: &mut dyn Record,
    source: &dyn EnvSource,
    ctx: &BindContext,
    unknown: &mut BTreeSet<String>,
) -> BindResult<()> {
    for (index, field) in record.fields().iter().enumerate() {
        let Some(slot) = record.field_mut(index) else {
            continue;
        };

        let key = field_key(&ctx.prefix, field);

        match slot {
            FieldSlot::Record(nested) => {
                trace!(prefix = %key, field = field.name, "visiting nested record");
                bind_fields(nested, source, &ctx.nested(key.to_uppercase()), unknown)?;
            }
            FieldSlot::Value(value) => {
                let Some(raw) = source.get(&key)? else {
                    continue;
                };

                unknown.remove(&key);
                value.bind_str(&key, &raw, &ctx.delimiter)?;
                debug!(key = %key, field = field.name, "bound environment variable");
            }
        }
    }

    Ok(())
}
