//! External key derivation.
//!
//! Field names become environment keys by splitting them into words and
//! joining the upper-cased words with `_`. A word boundary sits before an
//! uppercase letter that follows a lowercase one, or that starts a new
//! capitalized word after an acronym:
//!
//! - `HTTPRequestID` → `HTTP_REQUEST_ID`
//! - `XMLParser` → `XML_PARSER`
//! - `http_addr` → `HTTP_ADDR`

use crate::record::FieldDescriptor;

/// Separator placed between words and between a prefix and a field key.
pub const KEY_SEPARATOR: char = '_';

/// Converts a `CamelCase` or `snake_case` name to `UPPER_SNAKE_CASE`.
///
/// # Example
///
/// ```
/// use strata::to_upper_snake;
///
/// assert_eq!(to_upper_snake("HTTPRequestID"), "HTTP_REQUEST_ID");
/// assert_eq!(to_upper_snake("MyID"), "MY_ID");
/// assert_eq!(to_upper_snake("max_connections"), "MAX_CONNECTIONS");
/// ```
pub fn to_upper_snake(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_ascii_uppercase() && !out.ends_with(KEY_SEPARATOR) {
            let prev_lower = chars[i - 1].is_ascii_lowercase();
            let next_lower = chars.get(i + 1).is_some_and(char::is_ascii_lowercase);

            if prev_lower || next_lower {
                out.push(KEY_SEPARATOR);
            }
        }

        out.push(c);
    }

    out.to_uppercase()
}

/// Resolves the external key of a field under `prefix`.
///
/// An explicit `env` annotation wins verbatim and ignores the prefix.
pub(crate) fn field_key(prefix: &str, field: &FieldDescriptor) -> String {
    if let Some(env) = field.env {
        return env.to_string();
    }

    let name = to_upper_snake(field.name);
    if prefix.is_empty() {
        name
    } else {
        format!("{prefix}{KEY_SEPARATOR}{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldShape;
    use proptest::prelude::*;

    #[test]
    fn test_to_upper_snake() {
        let cases = [
            ("AWSRegion", "AWS_REGION"),
            ("HTTPRequest", "HTTP_REQUEST"),
            ("OAuthToken", "O_AUTH_TOKEN"),
            ("MyID", "MY_ID"),
            ("MyId", "MY_ID"),
            ("UserID", "USER_ID"),
            ("SimpleTest", "SIMPLE_TEST"),
            ("XMLParser", "XML_PARSER"),
            ("JSONData", "JSON_DATA"),
            ("ABTest", "AB_TEST"),
            ("TestA", "TEST_A"),
            ("TestAB", "TEST_AB"),
            ("TestABC", "TEST_ABC"),
            ("TestABCTest", "TEST_ABC_TEST"),
            ("test", "TEST"),
            ("A", "A"),
            ("ID", "ID"),
            ("", ""),
            ("lowercase", "LOWERCASE"),
            ("CamelCase", "CAMEL_CASE"),
            ("CamelCASE", "CAMEL_CASE"),
            ("CamelCaseX", "CAMEL_CASE_X"),
            ("CamelCASETest", "CAMEL_CASE_TEST"),
            ("HTTPRequestID", "HTTP_REQUEST_ID"),
            ("HTTPRequestId", "HTTP_REQUEST_ID"),
            ("HTTPRequestIDTest", "HTTP_REQUEST_ID_TEST"),
        ];

        for (input, want) in cases {
            assert_eq!(to_upper_snake(input), want, "to_upper_snake({input:?})");
        }
    }

    #[test]
    fn test_to_upper_snake_snake_case_names() {
        assert_eq!(to_upper_snake("http_addr"), "HTTP_ADDR");
        assert_eq!(to_upper_snake("request_timeout_ms"), "REQUEST_TIMEOUT_MS");
        assert_eq!(to_upper_snake("foo_Bar"), "FOO_BAR");
        assert_eq!(to_upper_snake("user_ID"), "USER_ID");
    }

    #[test]
    fn test_field_key_prefixing() {
        let plain = FieldDescriptor {
            name: "max_connections",
            env: None,
            shape: FieldShape::Value,
        };
        assert_eq!(field_key("", &plain), "MAX_CONNECTIONS");
        assert_eq!(field_key("APP_SERVER", &plain), "APP_SERVER_MAX_CONNECTIONS");
    }

    #[test]
    fn test_field_key_annotation_ignores_prefix() {
        let tagged = FieldDescriptor {
            name: "port",
            env: Some("CUSTOM_PORT"),
            shape: FieldShape::Value,
        };
        assert_eq!(field_key("APP", &tagged), "CUSTOM_PORT");
        assert_eq!(field_key("", &tagged), "CUSTOM_PORT");
    }

    proptest! {
        #[test]
        fn prop_derivation_is_deterministic(name in "[A-Za-z]{0,24}") {
            prop_assert_eq!(to_upper_snake(&name), to_upper_snake(&name));
        }

        #[test]
        fn prop_derived_key_is_stable(name in "[A-Za-z]{0,24}") {
            let once = to_upper_snake(&name);
            prop_assert_eq!(to_upper_snake(&once), once.clone());
        }

        #[test]
        fn prop_derived_key_has_no_lowercase(name in "[A-Za-z_]{0,24}") {
            let key = to_upper_snake(&name);
            prop_assert!(!key.chars().any(|c| c.is_ascii_lowercase()));
        }
    }
}
