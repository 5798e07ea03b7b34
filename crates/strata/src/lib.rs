//! Layered, type-driven configuration binding.
//!
//! `strata` fills a statically shaped configuration record from an ordered
//! list of sources, each overriding what the previous ones set:
//!
//! - environment variables, or any [`EnvSource`] such as a `.env` file
//! - JSON and TOML documents from a path, a buffer or a stream
//! - a remote parameter store holding a JSON document
//!
//! # Overview
//!
//! Records derive [`Bind`] for environment binding and serde's `Serialize` /
//! `Deserialize` for documents. Environment keys are derived from field names
//! in upper snake case and prefixed by the layer's prefix and every enclosing
//! nested field:
//!
//! | Field                          | Prefix `APP`        |
//! |--------------------------------|---------------------|
//! | `port`                         | `APP_PORT`          |
//! | `http_request_id`              | `APP_HTTP_REQUEST_ID` |
//! | `#[bind(env = "LISTEN")] addr` | `LISTEN`            |
//! | `#[bind(nested)] db` → `url`   | `APP_DB_URL`        |
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//!
//! use serde::{Deserialize, Serialize};
//! use strata::{Bind, ConfigLoader, MapEnv};
//!
//! #[derive(Debug, Default, Bind, Serialize, Deserialize)]
//! struct Database {
//!     url: String,
//!     #[serde(with = "strata::duration::as_str")]
//!     timeout: Duration,
//! }
//!
//! #[derive(Debug, Default, Bind, Serialize, Deserialize)]
//! struct AppConfig {
//!     port: u16,
//!     hosts: Vec<String>,
//!     #[bind(nested)]
//!     database: Database,
//! }
//!
//! let env = MapEnv::from_pairs([
//!     ("APP_HOSTS", "a.internal,b.internal"),
//!     ("APP_DATABASE_TIMEOUT", "1m30s"),
//! ]);
//!
//! let config: AppConfig = ConfigLoader::new()
//!     .with_json(br#"{"port": 8080, "database": {"url": "postgres://db"}}"#.as_slice())
//!     .with_env_source("APP", env)
//!     .err_on_unknown()
//!     .load()
//!     .unwrap();
//!
//! assert_eq!(config.port, 8080);
//! assert_eq!(config.hosts, vec!["a.internal", "b.internal"]);
//! assert_eq!(config.database.url, "postgres://db");
//! assert_eq!(config.database.timeout, Duration::from_secs(90));
//! ```
//!
//! # Failure semantics
//!
//! Binding mutates the record in place. A failing layer stops the load and
//! nothing is rolled back: fields set by earlier layers, and by the failing
//! layer before the failure, stay set. See [`BindError`] for the error kinds.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Lets `#[derive(Bind)]` output, which names `::strata`, compile inside this crate.
extern crate self as strata;

mod coerce;
mod document;
pub mod duration;
mod env;
mod error;
mod key;
mod loader;
mod overlay;
mod record;
mod remote;

pub use strata_macros::Bind;

pub use coerce::{parse_bool, parse_list, Bindable, Scalar, DEFAULT_DELIMITER};
pub use document::{bind_document, parse_document, DocumentFormat, DocumentSource, ReadSeek};
pub use env::{bind_env, BindContext, EnvSource, MapEnv, StdEnv};
pub use error::{BindError, BindResult};
pub use key::{to_upper_snake, KEY_SEPARATOR};
pub use loader::{
    load, ConfigLoader, DocumentLayer, EnvLayer, ErrOnUnknown, Layer, LoaderState,
    ParameterLayer, WithParameterStore,
};
pub use record::{FieldDescriptor, FieldShape, FieldSlot, Record};
pub use remote::{
    bind_parameter, ParameterRequest, ParameterStore, StaticParameterStore, DEFAULT_REGION,
};
