//! Strata Inspect - layered configuration diagnostics
//!
//! Applies configuration sources in command-line order onto [`ServiceConfig`]
//! and renders the resolved record as JSON. Useful for checking which
//! environment keys a record reads and how documents and variables combine.
//!
//! ```text
//! strata-inspect --toml base.toml --json override.json --env APP --strict
//! ```

use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use strata::{ConfigLoader, EnvLayer, DEFAULT_DELIMITER};
use tracing::info;

mod config;

pub use config::{DatabaseConfig, ServiceConfig, TelemetryConfig};

/// Version of the inspector.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prefix used by `--dotenv` when no `--env` is given.
pub const DEFAULT_PREFIX: &str = "APP";

/// One source, in the order it was given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// JSON document at a path.
    Json(PathBuf),
    /// TOML document at a path.
    Toml(PathBuf),
    /// `.env` file read under the active prefix.
    Dotenv(PathBuf),
    /// Process environment under a prefix.
    Env(String),
}

/// Parsed command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Args {
    /// Sources in application order.
    pub sources: Vec<Source>,
    /// Collection delimiter for environment sources.
    pub delimiter: String,
    /// Fail on keys the record does not know.
    pub strict: bool,
    /// Emit logs as JSON.
    pub log_json: bool,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            delimiter: DEFAULT_DELIMITER.to_string(),
            strict: false,
            log_json: false,
        }
    }
}

/// What the command line asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Resolve and print the configuration.
    Inspect(Args),
    /// Print usage.
    Help,
    /// Print the version.
    Version,
}

impl Command {
    /// Parses arguments, excluding the program name.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown flags or a flag missing its value.
    pub fn parse_from<I>(args: I) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        let mut parsed = Args::default();

        while let Some(arg) = args.next() {
            let mut value =
                |flag: &str| args.next().with_context(|| format!("{flag} requires a value"));

            match arg.as_str() {
                "--json" => parsed.sources.push(Source::Json(value("--json")?.into())),
                "--toml" => parsed.sources.push(Source::Toml(value("--toml")?.into())),
                "--dotenv" => parsed
                    .sources
                    .push(Source::Dotenv(value("--dotenv")?.into())),
                "--env" => parsed.sources.push(Source::Env(value("--env")?)),
                "--delimiter" | "-d" => parsed.delimiter = value("--delimiter")?,
                "--strict" => parsed.strict = true,
                "--log-json" => parsed.log_json = true,
                "--help" | "-h" => return Ok(Self::Help),
                "--version" | "-v" => return Ok(Self::Version),
                other => bail!("unknown argument: {other}"),
            }
        }

        Ok(Self::Inspect(parsed))
    }
}

impl Args {
    /// Prefix for `.env` sources: the first `--env` prefix, if any.
    pub fn env_prefix(&self) -> &str {
        self.sources
            .iter()
            .find_map(|source| match source {
                Source::Env(prefix) => Some(prefix.as_str()),
                _ => None,
            })
            .unwrap_or(DEFAULT_PREFIX)
    }

    /// Builds a loader with one layer per source.
    ///
    /// # Errors
    ///
    /// Returns an error if a `.env` file cannot be read.
    pub fn loader(&self) -> Result<ConfigLoader<ServiceConfig>> {
        let mut loader = ConfigLoader::new();

        for source in &self.sources {
            loader = match source {
                Source::Json(path) => loader.with_json(path.clone()),
                Source::Toml(path) => loader.with_toml(path.clone()),
                Source::Env(prefix) => {
                    loader.with_env_delimited(prefix.clone(), self.delimiter.clone())
                }
                Source::Dotenv(path) => {
                    let layer = EnvLayer::from_dotenv(self.env_prefix(), path.clone())
                        .with_context(|| format!("failed to read {}", path.display()))?
                        .delimiter(self.delimiter.clone());
                    loader.with_layer(layer)
                }
            };
        }

        if self.strict {
            loader = loader.err_on_unknown();
        }

        Ok(loader)
    }
}

/// Resolves the configuration described by `args`.
///
/// # Errors
///
/// Returns the first source that fails to bind, with context.
pub fn resolve(args: &Args) -> Result<ServiceConfig> {
    let loader = args.loader()?;
    info!(layers = loader.len(), strict = args.strict, "resolving configuration");

    loader.load().context("failed to resolve configuration")
}

/// Resolves the configuration and renders it as pretty JSON.
///
/// # Errors
///
/// See [`resolve`].
pub fn render(args: &Args) -> Result<String> {
    let config = resolve(args)?;
    serde_json::to_string_pretty(&config).context("failed to render configuration")
}
