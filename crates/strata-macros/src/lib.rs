//! Procedural macros for strata records.
//!
//! This crate provides `#[derive(Bind)]`, which generates the field-descriptor
//! table the strata binders walk. Use it through the re-export in `strata`.
//!
//! # Example
//!
//! ```rust,ignore
//! use strata::Bind;
//!
//! #[derive(Default, Bind)]
//! struct AppConfig {
//!     host: String,
//!     #[bind(env = "APP_LISTEN_PORT")]
//!     port: u16,
//!     #[bind(nested)]
//!     database: DatabaseConfig,
//!     #[bind(skip)]
//!     cache: Option<Cache>,
//! }
//! ```
//!
//! # Field Attributes
//!
//! - `env = "NAME"`: explicit external key, used verbatim and never prefixed
//! - `nested`: the field is itself a `Record`; its fields are bound under the
//!   field's key as prefix
//! - `skip`: the binder never sees the field

mod parse;
mod record;

use proc_macro::TokenStream;

/// Derives `strata::Record` for a struct with named fields.
///
/// Every non-skipped field must implement `strata::Bindable`, or
/// `strata::Record` when marked `#[bind(nested)]`.
///
/// # Generated Code
///
/// The macro generates approximately:
///
/// ```rust,ignore
/// impl strata::Record for AppConfig {
///     fn fields(&self) -> &'static [strata::FieldDescriptor] {
///         const FIELDS: &[strata::FieldDescriptor] = &[
///             strata::FieldDescriptor { name: "host", env: None, shape: strata::FieldShape::Value },
///             // ...
///         ];
///         FIELDS
///     }
///
///     fn field_mut(&mut self, index: usize) -> Option<strata::FieldSlot<'_>> {
///         match index {
///             0 => Some(strata::FieldSlot::Value(&mut self.host)),
///             // ...
///             _ => None,
///         }
///     }
/// }
/// ```
#[proc_macro_derive(Bind, attributes(bind))]
pub fn derive_bind(item: TokenStream) -> TokenStream {
    record::expand_bind(item.into())
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
