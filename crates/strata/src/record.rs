//! Record shape description.
//!
//! A record exposes a `'static` table of [`FieldDescriptor`]s and an indexed
//! accessor returning a mutable [`FieldSlot`] per descriptor. Binders walk the
//! table instead of inspecting types at runtime. `#[derive(Bind)]` generates
//! both halves.

use crate::coerce::Bindable;

/// Whether a field holds a value or another record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldShape {
    /// A scalar, optional scalar or collection of scalars.
    Value,
    /// A nested record bound under the field's key as prefix.
    Record,
}

/// Static description of one bindable field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Declared field name.
    pub name: &'static str,
    /// Explicit external key, used verbatim and never prefixed.
    pub env: Option<&'static str>,
    /// Value or nested record.
    pub shape: FieldShape,
}

/// Mutable access to one field of a record.
pub enum FieldSlot<'a> {
    /// A value field.
    Value(&'a mut dyn Bindable),
    /// A nested record.
    Record(&'a mut dyn Record),
}

impl std::fmt::Debug for FieldSlot<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Value(_) => f.write_str("FieldSlot::Value"),
            Self::Record(_) => f.write_str("FieldSlot::Record"),
        }
    }
}

/// A statically shaped configuration record.
///
/// Implement it with `#[derive(Bind)]`:
///
/// ```
/// use strata::{Bind, FieldShape, Record};
///
/// #[derive(Default, Bind)]
/// struct Database {
///     url: String,
///     pool_size: u32,
/// }
///
/// #[derive(Default, Bind)]
/// struct AppConfig {
///     #[bind(env = "LISTEN_PORT")]
///     port: u16,
///     #[bind(nested)]
///     database: Database,
/// }
///
/// let config = AppConfig::default();
/// let fields = config.fields();
/// assert_eq!(fields[0].env, Some("LISTEN_PORT"));
/// assert_eq!(fields[1].shape, FieldShape::Record);
/// ```
pub trait Record {
    /// The record's bindable fields in declaration order.
    fn fields(&self) -> &'static [FieldDescriptor];

    /// Mutable slot for the field at `index` in [`Record::fields`].
    ///
    /// Returns `None` for an index with no settable field.
    fn field_mut(&mut self, index: usize) -> Option<FieldSlot<'_>>;
}
