//! Text-to-value coercion for environment-style sources.
//!
//! [`Scalar`] converts one textual value into one primitive type. [`Bindable`]
//! is what a record field must implement to be set from text; scalars,
//! `Option<scalar>` and `Vec<scalar>` implement it here.

use std::path::PathBuf;
use std::time::Duration;

use crate::duration::parse_duration;
use crate::{BindError, BindResult};

/// Default delimiter between collection elements.
pub const DEFAULT_DELIMITER: &str = ",";

/// A primitive type that can be parsed from one textual value.
pub trait Scalar: Sized {
    /// Human-readable kind name used in error messages.
    const KIND: &'static str;

    /// Parses `raw`, returning the reason on failure.
    fn parse_scalar(raw: &str) -> Result<Self, String>;
}

/// A field type that can be set from a textual source value.
///
/// The default `bind_str` rejects every value with an unsupported-kind error,
/// so a custom type can opt into living inside a record with an empty impl
/// and only fail when a source actually provides a value for it.
pub trait Bindable {
    /// Sets `self` from `raw`, found under `key`.
    ///
    /// `delimiter` separates elements for collection types.
    fn bind_str(&mut self, key: &str, raw: &str, delimiter: &str) -> BindResult<()> {
        let _ = (raw, delimiter);
        Err(BindError::unsupported_kind(key, std::any::type_name::<Self>()))
    }
}

/// Parses a boolean, accepting `1, t, true, y, yes` and `0, f, false, n, no`
/// in any case, surrounded by optional whitespace.
pub fn parse_bool(raw: &str) -> Result<bool, String> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "t" | "true" | "y" | "yes" => Ok(true),
        "0" | "f" | "false" | "n" | "no" => Ok(false),
        _ => Err(format!("invalid boolean value: {raw:?}")),
    }
}

impl Scalar for String {
    const KIND: &'static str = "string";

    fn parse_scalar(raw: &str) -> Result<Self, String> {
        Ok(raw.to_string())
    }
}

impl Scalar for PathBuf {
    const KIND: &'static str = "path";

    fn parse_scalar(raw: &str) -> Result<Self, String> {
        Ok(PathBuf::from(raw))
    }
}

impl Scalar for bool {
    const KIND: &'static str = "boolean";

    fn parse_scalar(raw: &str) -> Result<Self, String> {
        parse_bool(raw)
    }
}

impl Scalar for Duration {
    const KIND: &'static str = "duration";

    fn parse_scalar(raw: &str) -> Result<Self, String> {
        parse_duration(raw).map_err(|e| e.to_string())
    }
}

macro_rules! impl_scalar_int {
    ($kind:literal => $($ty:ty),+) => {
        $(
            impl Scalar for $ty {
                const KIND: &'static str = $kind;

                fn parse_scalar(raw: &str) -> Result<Self, String> {
                    raw.parse::<$ty>()
                        .map_err(|e| format!("invalid {} {raw:?}: {e}", Self::KIND))
                }
            }
        )+
    };
}

impl_scalar_int!("integer" => i8, i16, i32, i64, i128, isize);
impl_scalar_int!("unsigned integer" => u8, u16, u32, u64, u128, usize);

impl Scalar for f64 {
    const KIND: &'static str = "float";

    fn parse_scalar(raw: &str) -> Result<Self, String> {
        raw.parse::<f64>()
            .map_err(|e| format!("invalid {} {raw:?}: {e}", Self::KIND))
    }
}

impl Scalar for f32 {
    const KIND: &'static str = "float";

    // Parsed at double precision, then narrowed.
    #[allow(clippy::cast_possible_truncation)]
    fn parse_scalar(raw: &str) -> Result<Self, String> {
        f64::parse_scalar(raw).map(|v| v as f32)
    }
}

macro_rules! impl_bindable_scalar {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl Bindable for $ty {
                fn bind_str(&mut self, key: &str, raw: &str, _delimiter: &str) -> BindResult<()> {
                    *self = <$ty as Scalar>::parse_scalar(raw)
                        .map_err(|reason| BindError::parse(key, reason))?;
                    Ok(())
                }
            }
        )+
    };
}

impl_bindable_scalar!(
    String, PathBuf, bool, Duration, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128,
    usize, f32, f64,
);

impl<T: Scalar> Bindable for Option<T> {
    fn bind_str(&mut self, key: &str, raw: &str, _delimiter: &str) -> BindResult<()> {
        let value = T::parse_scalar(raw).map_err(|reason| BindError::parse(key, reason))?;
        *self = Some(value);
        Ok(())
    }
}

impl<T: Scalar> Bindable for Vec<T> {
    fn bind_str(&mut self, key: &str, raw: &str, delimiter: &str) -> BindResult<()> {
        *self = parse_list(key, raw, delimiter)?;
        Ok(())
    }
}

/// Splits `raw` on `delimiter` and parses each trimmed element.
///
/// An empty (or all-whitespace) value yields an empty list. The first element
/// that fails aborts the whole list.
///
/// # Example
///
/// ```
/// use strata::parse_list;
///
/// let ports: Vec<u16> = parse_list("PORTS", "80; 443 ;8080", ";").unwrap();
/// assert_eq!(ports, vec![80, 443, 8080]);
/// ```
pub fn parse_list<T: Scalar>(key: &str, raw: &str, delimiter: &str) -> BindResult<Vec<T>> {
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }

    let delimiter = if delimiter.is_empty() {
        DEFAULT_DELIMITER
    } else {
        delimiter
    };

    raw.split(delimiter)
        .enumerate()
        .map(|(index, part)| {
            T::parse_scalar(part.trim())
                .map_err(|reason| BindError::parse_element(key, index, reason))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bool() {
        for raw in ["1", "t", "T", "true", "TRUE", "True", "y", "yes", " Yes "] {
            assert_eq!(parse_bool(raw), Ok(true), "{raw:?}");
        }
        for raw in ["0", "f", "F", "false", "FALSE", "n", "no", "\tNO\n"] {
            assert_eq!(parse_bool(raw), Ok(false), "{raw:?}");
        }

        assert_eq!(
            parse_bool("maybe").unwrap_err(),
            "invalid boolean value: \"maybe\""
        );
        assert!(parse_bool("on").is_err());
        assert!(parse_bool("").is_err());
    }

    #[test]
    fn test_bind_integers() {
        let mut port: u16 = 0;
        port.bind_str("PORT", "8080", ",").unwrap();
        assert_eq!(port, 8080);

        let mut offset: i32 = 0;
        offset.bind_str("OFFSET", "-42", ",").unwrap();
        assert_eq!(offset, -42);
    }

    #[test]
    fn test_bind_integer_overflow_names_key() {
        let mut small: u8 = 7;
        let err = small.bind_str("APP_SMALL", "300", ",").unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("APP_SMALL: invalid unsigned integer \"300\""), "{msg}");
        assert_eq!(small, 7);
    }

    #[test]
    fn test_bind_integer_rejects_garbage() {
        let mut n: i64 = 0;
        let err = n.bind_str("CPLX_INT", "notanint", ",").unwrap_err();
        assert!(matches!(err, BindError::Parse { ref key, .. } if key == "CPLX_INT"));
        assert!(err.to_string().contains("\"notanint\""));
    }

    #[test]
    fn test_bind_floats() {
        let mut ratio: f64 = 0.0;
        ratio.bind_str("RATIO", "2.75", ",").unwrap();
        assert!((ratio - 2.75).abs() < f64::EPSILON);

        let mut narrow: f32 = 0.0;
        narrow.bind_str("NARROW", "0.5", ",").unwrap();
        assert!((narrow - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn test_bind_bool_error_names_key_and_value() {
        let mut debug = false;
        let err = debug.bind_str("PFX_DEBUG", "maybe", ",").unwrap_err();
        assert_eq!(err.to_string(), "PFX_DEBUG: invalid boolean value: \"maybe\"");
    }

    #[test]
    fn test_bind_duration() {
        let mut timeout = Duration::ZERO;
        timeout.bind_str("TIMEOUT", "1h30m", ",").unwrap();
        assert_eq!(timeout, Duration::from_secs(5_400));

        let err = timeout.bind_str("TIMEOUT", "90", ",").unwrap_err();
        assert!(err.to_string().starts_with("TIMEOUT: missing unit"));
    }

    #[test]
    fn test_bind_string_passthrough() {
        let mut s = String::new();
        s.bind_str("S", "  spaced, with comma ", ",").unwrap();
        assert_eq!(s, "  spaced, with comma ");
    }

    #[test]
    fn test_bind_option() {
        let mut endpoint: Option<String> = None;
        endpoint.bind_str("ENDPOINT", "http://localhost:4317", ",").unwrap();
        assert_eq!(endpoint.as_deref(), Some("http://localhost:4317"));

        let mut keep_alive: Option<u64> = Some(60);
        assert!(keep_alive.bind_str("KEEP_ALIVE", "never", ",").is_err());
        assert_eq!(keep_alive, Some(60));
    }

    #[test]
    fn test_parse_list_default_delimiter() {
        let ints: Vec<i32> = parse_list("INTS", "1,2,3", DEFAULT_DELIMITER).unwrap();
        assert_eq!(ints, vec![1, 2, 3]);
    }

    #[test]
    fn test_parse_list_custom_delimiter_trims() {
        let ints: Vec<u32> = parse_list("INTS", "1; 2 ;3", ";").unwrap();
        assert_eq!(ints, vec![1, 2, 3]);

        let words: Vec<String> = parse_list("WORDS", "a::b:: c", "::").unwrap();
        assert_eq!(words, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_parse_list_empty_value() {
        let empty: Vec<String> = parse_list("STRS", "", ",").unwrap();
        assert!(empty.is_empty());

        let blank: Vec<u8> = parse_list("BYTES", "   ", ",").unwrap();
        assert!(blank.is_empty());
    }

    #[test]
    fn test_parse_list_keeps_inner_empty_elements() {
        let strs: Vec<String> = parse_list("STRS", "a,,b", ",").unwrap();
        assert_eq!(strs, vec!["a", "", "b"]);
    }

    #[test]
    fn test_parse_list_reports_element_index() {
        let err = parse_list::<bool>("CPLX_BOOLS", "true,false,maybe", ",").unwrap_err();
        assert_eq!(
            err.to_string(),
            "CPLX_BOOLS[2]: invalid boolean value: \"maybe\""
        );
    }

    #[test]
    fn test_bind_vec_failure_keeps_previous() {
        let mut ints = vec![9, 9];
        assert!(ints.bind_str("INTS", "1,x,3", ",").is_err());
        assert_eq!(ints, vec![9, 9]);
    }

    #[test]
    fn test_bind_durations_list() {
        let mut backoff: Vec<Duration> = Vec::new();
        backoff.bind_str("BACKOFF", "100ms, 1s, 1m", ",").unwrap();
        assert_eq!(
            backoff,
            vec![
                Duration::from_millis(100),
                Duration::from_secs(1),
                Duration::from_secs(60)
            ]
        );
    }

    #[derive(Debug, Default)]
    struct Opaque;

    impl Bindable for Opaque {}

    #[test]
    fn test_opt_in_type_is_unsupported() {
        let mut value = Opaque;
        let err = value.bind_str("APP_OPAQUE", "x", ",").unwrap_err();
        assert!(matches!(err, BindError::UnsupportedKind { ref key, .. } if key == "APP_OPAQUE"));
        assert!(err.to_string().contains("Opaque"));
    }
}
