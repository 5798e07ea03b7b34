//! Structured document binding (JSON and TOML).
//!
//! A document is decoded over the record's current serialized state: struct
//! fields the document leaves out keep their current values at any depth, map
//! entries are added or replaced, and any other value the document sets
//! replaces the current one. Keys the record does not accept are ignored; in
//! strict mode the first of them is reported once the record is updated.

use std::fmt;
use std::fs;
use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_ignored::Path;
use serde_json::Value;
use tracing::debug;

use crate::overlay::Overlay;
use crate::{BindError, BindResult};

/// Supported document formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// JSON document.
    Json,
    /// TOML document.
    Toml,
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("json"),
            Self::Toml => f.write_str("toml"),
        }
    }
}

/// A readable, seekable stream.
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Where a document comes from.
pub enum DocumentSource {
    /// A file on disk, opened when the layer is applied.
    Path(PathBuf),
    /// An in-memory buffer.
    Bytes(Vec<u8>),
    /// A seekable stream, read from its start.
    Seekable(Box<dyn ReadSeek + Send>),
    /// A forward-only stream, buffered in full before decoding.
    Reader(Box<dyn Read + Send>),
}

impl DocumentSource {
    /// Create a source from a seekable stream.
    pub fn seekable(stream: impl Read + Seek + Send + 'static) -> Self {
        Self::Seekable(Box::new(stream))
    }

    /// Create a source from a forward-only stream.
    pub fn reader(stream: impl Read + Send + 'static) -> Self {
        Self::Reader(Box::new(stream))
    }

    /// Reads the whole document into memory.
    ///
    /// # Errors
    ///
    /// Returns `BindError::NoDataSource` if the source is missing or unreadable.
    pub fn read_all(self) -> BindResult<Vec<u8>> {
        let origin = self.to_string();

        match self {
            Self::Path(path) => {
                fs::read(&path).map_err(|e| BindError::no_data_source(origin, e))
            }
            Self::Bytes(bytes) => Ok(bytes),
            Self::Seekable(mut stream) => {
                let mut buf = Vec::new();
                stream
                    .seek(SeekFrom::Start(0))
                    .and_then(|_| stream.read_to_end(&mut buf))
                    .map_err(|e| BindError::no_data_source(origin, e))?;
                Ok(buf)
            }
            Self::Reader(mut stream) => {
                let mut buf = Vec::new();
                stream
                    .read_to_end(&mut buf)
                    .map_err(|e| BindError::no_data_source(origin, e))?;
                Ok(buf)
            }
        }
    }
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Bytes(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Seekable(_) => f.write_str("<seekable stream>"),
            Self::Reader(_) => f.write_str("<stream>"),
        }
    }
}

impl fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DocumentSource({self})")
    }
}

impl From<PathBuf> for DocumentSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&std::path::Path> for DocumentSource {
    fn from(path: &std::path::Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for DocumentSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<String> for DocumentSource {
    fn from(path: String) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Vec<u8>> for DocumentSource {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}

impl From<&[u8]> for DocumentSource {
    fn from(bytes: &[u8]) -> Self {
        Self::Bytes(bytes.to_vec())
    }
}

/// Decodes raw document bytes into a value tree.
///
/// # Errors
///
/// Returns `BindError::Json` / `BindError::Toml` for malformed documents and
/// `BindError::Utf8` for a TOML document that is not UTF-8.
pub fn parse_document(bytes: &[u8], format: DocumentFormat) -> BindResult<Value> {
    match format {
        DocumentFormat::Json => Ok(serde_json::from_slice(bytes)?),
        DocumentFormat::Toml => Ok(toml::from_str(std::str::from_utf8(bytes)?)?),
    }
}

/// Binds a document onto `target`.
///
/// The document is decoded once, by the record's own `Deserialize` impl, over
/// its current state. A malformed document or a value of the wrong type fails
/// and leaves `target` untouched. When `strict` is set, the first document key
/// the record ignored yields `BindError::UnknownField` after `target` has taken
/// every value it does accept.
///
/// # Example
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use strata::{bind_document, DocumentFormat};
///
/// #[derive(Default, Serialize, Deserialize)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
///
/// let mut server = Server { host: "localhost".into(), port: 80 };
/// bind_document(&mut server, br#"{"port": 8080}"#, DocumentFormat::Json, false).unwrap();
///
/// assert_eq!(server.host, "localhost");
/// assert_eq!(server.port, 8080);
/// ```
pub fn bind_document<T>(
    target: &mut T,
    bytes: &[u8],
    format: DocumentFormat,
    strict: bool,
) -> BindResult<()>
where
    T: Serialize + DeserializeOwned,
{
    let incoming = match parse_document(bytes, format)? {
        Value::Object(map) => map,
        other => return Err(BindError::shape_mismatch("an object", value_kind(&other))),
    };

    let current = match serde_json::to_value(&*target)? {
        Value::Object(map) => map,
        other => return Err(BindError::shape_mismatch("a struct", value_kind(&other))),
    };

    let keys = incoming.len();
    let mut ignored = None;
    let overlay = Overlay::new(Value::Object(incoming), Value::Object(current));
    *target = serde_ignored::deserialize(overlay, |path| {
        if ignored.is_none() {
            ignored = Some(dotted(&path));
        }
    })?;
    debug!(%format, keys, "bound document");

    match ignored {
        Some(field) if strict => Err(BindError::unknown_field(field)),
        _ => Ok(()),
    }
}

/// Renders an ignored key as a dotted path of map keys and sequence indexes.
fn dotted(path: &Path<'_>) -> String {
    let mut segments = Vec::new();
    let mut cursor = path;

    loop {
        match cursor {
            Path::Root => break,
            Path::Map { parent, key } => {
                segments.push(key.clone());
                cursor = *parent;
            }
            Path::Seq { parent, index } => {
                segments.push(index.to_string());
                cursor = *parent;
            }
            Path::Some { parent }
            | Path::NewtypeStruct { parent }
            | Path::NewtypeVariant { parent } => cursor = *parent,
        }
    }

    segments.reverse();
    segments.join(".")
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Deep {
        foo: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Nested {
        value: String,
        deep: Deep,
    }

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    #[serde(rename_all = "PascalCase")]
    struct Example {
        host: String,
        port: i64,
        debug: bool,
        nested: Nested,
        strs: Vec<String>,
    }

    const DOC: &str = r#"{"Host":"localhost","Port":8080,"Debug":true,"Nested":{"Value":"foo","Deep":{"Foo":"baz","Unused":"unknown"}}}"#;

    #[test]
    fn test_bind_json_all_fields() {
        let mut cfg = Example::default();
        bind_document(&mut cfg, DOC.as_bytes(), DocumentFormat::Json, false).unwrap();

        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.port, 8080);
        assert!(cfg.debug);
        assert_eq!(cfg.nested.value, "foo");
        assert_eq!(cfg.nested.deep.foo, "baz");
    }

    #[test]
    fn test_absent_fields_keep_values() {
        let mut cfg = Example {
            port: 1234,
            strs: vec!["keep".to_string()],
            nested: Nested {
                value: "old".to_string(),
                deep: Deep {
                    foo: "deep-old".to_string(),
                },
            },
            ..Example::default()
        };

        let doc = br#"{"Host":"h","Nested":{"Value":"new"}}"#;
        bind_document(&mut cfg, doc, DocumentFormat::Json, false).unwrap();

        assert_eq!(cfg.host, "h");
        assert_eq!(cfg.port, 1234);
        assert_eq!(cfg.strs, vec!["keep"]);
        assert_eq!(cfg.nested.value, "new");
        assert_eq!(cfg.nested.deep.foo, "deep-old");
    }

    #[test]
    fn test_strict_reports_unknown_but_keeps_values() {
        let mut cfg = Example::default();
        let err = bind_document(&mut cfg, DOC.as_bytes(), DocumentFormat::Json, true).unwrap_err();

        match err {
            BindError::UnknownField { ref field } => assert_eq!(field, "Nested.Deep.Unused"),
            ref other => panic!("unexpected error: {other}"),
        }
        assert!(err.to_string().contains("unknown field \"Nested.Deep.Unused\""));
        assert_eq!(cfg.host, "localhost");
        assert_eq!(cfg.nested.deep.foo, "baz");
    }

    #[test]
    fn test_strict_accepts_known_document() {
        let mut cfg = Example::default();
        let doc = br#"{"Host":"h","Nested":{"Deep":{"Foo":"x"}}}"#;
        bind_document(&mut cfg, doc, DocumentFormat::Json, true).unwrap();
        assert_eq!(cfg.nested.deep.foo, "x");
    }

    #[test]
    fn test_type_mismatch_leaves_target_untouched() {
        let mut cfg = Example {
            host: "before".to_string(),
            ..Example::default()
        };
        let err = bind_document(
            &mut cfg,
            br#"{"Host":"after","Port":"not-a-number"}"#,
            DocumentFormat::Json,
            false,
        )
        .unwrap_err();

        assert!(matches!(err, BindError::Json(_)));
        assert_eq!(cfg.host, "before");
    }

    #[test]
    fn test_malformed_document() {
        let mut cfg = Example::default();
        let err = bind_document(&mut cfg, b"{not json", DocumentFormat::Json, false).unwrap_err();
        assert!(matches!(err, BindError::Json(_)));
    }

    #[test]
    fn test_non_object_root_is_shape_mismatch() {
        let mut cfg = Example::default();
        let err = bind_document(&mut cfg, b"[1,2,3]", DocumentFormat::Json, false).unwrap_err();
        assert_eq!(err.to_string(), "config must be an object (got array)");
    }

    #[test]
    fn test_non_struct_target_is_shape_mismatch() {
        let mut target: i32 = 0;
        let err = bind_document(&mut target, b"{}", DocumentFormat::Json, false).unwrap_err();
        assert_eq!(err.to_string(), "config must be a struct (got number)");
    }

    #[test]
    fn test_bind_toml() {
        let doc = r#"
            Host = "tomlhost"
            Port = 9000

            [Nested.Deep]
            Foo = "from-toml"
        "#;

        let mut cfg = Example::default();
        bind_document(&mut cfg, doc.as_bytes(), DocumentFormat::Toml, true).unwrap();

        assert_eq!(cfg.host, "tomlhost");
        assert_eq!(cfg.port, 9000);
        assert_eq!(cfg.nested.deep.foo, "from-toml");
    }

    #[test]
    fn test_duration_literals_in_documents() {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct Timeouts {
            #[serde(with = "crate::duration::as_str")]
            request: Duration,
            #[serde(with = "crate::duration::as_str")]
            idle: Duration,
        }

        let mut cfg = Timeouts {
            idle: Duration::from_secs(60),
            ..Timeouts::default()
        };
        bind_document(&mut cfg, br#"{"request":"1m30s"}"#, DocumentFormat::Json, true).unwrap();
        assert_eq!(cfg.request, Duration::from_secs(90));
        assert_eq!(cfg.idle, Duration::from_secs(60));
    }

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Item {
        known: u32,
    }

    #[test]
    fn test_strict_accepts_field_skipped_when_none() {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct Client {
            #[serde(skip_serializing_if = "Option::is_none")]
            endpoint: Option<String>,
        }

        let mut cfg = Client::default();
        bind_document(&mut cfg, br#"{"endpoint":"http://x"}"#, DocumentFormat::Json, true)
            .unwrap();
        assert_eq!(cfg.endpoint.as_deref(), Some("http://x"));
    }

    #[test]
    fn test_strict_reports_unknown_inside_absent_option() {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct Holder {
            inner: Option<Item>,
        }

        let mut cfg = Holder::default();
        let err = bind_document(
            &mut cfg,
            br#"{"inner":{"known":1,"bogus":2}}"#,
            DocumentFormat::Json,
            true,
        )
        .unwrap_err();

        match err {
            BindError::UnknownField { ref field } => assert_eq!(field, "inner.bogus"),
            ref other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cfg.inner, Some(Item { known: 1 }));
    }

    #[test]
    fn test_strict_reports_unknown_inside_sequence_element() {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct Holder {
            items: Vec<Item>,
        }

        let mut cfg = Holder::default();
        let err = bind_document(
            &mut cfg,
            br#"{"items":[{"known":1},{"known":2,"bogus":3}]}"#,
            DocumentFormat::Json,
            true,
        )
        .unwrap_err();

        match err {
            BindError::UnknownField { ref field } => assert_eq!(field, "items.1.bogus"),
            ref other => panic!("unexpected error: {other}"),
        }
        assert_eq!(cfg.items, vec![Item { known: 1 }, Item { known: 2 }]);

        // Lenient binding ignores the same key.
        let mut cfg = Holder::default();
        bind_document(
            &mut cfg,
            br#"{"items":[{"known":1,"bogus":3}]}"#,
            DocumentFormat::Json,
            false,
        )
        .unwrap();
        assert_eq!(cfg.items, vec![Item { known: 1 }]);
    }

    #[test]
    fn test_enum_variant_is_replaced() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        enum Mode {
            A { x: u32 },
            B { y: u32 },
        }

        #[derive(Debug, Serialize, Deserialize)]
        struct Holder {
            mode: Mode,
            name: String,
        }

        let mut cfg = Holder {
            mode: Mode::A { x: 1 },
            name: "keep".to_string(),
        };
        bind_document(&mut cfg, br#"{"mode":{"B":{"y":2}}}"#, DocumentFormat::Json, true)
            .unwrap();

        assert_eq!(cfg.mode, Mode::B { y: 2 });
        assert_eq!(cfg.name, "keep");
    }

    #[test]
    fn test_map_entries_are_merged() {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct Holder {
            limits: std::collections::BTreeMap<String, u32>,
        }

        let mut cfg = Holder::default();
        cfg.limits.insert("cpu".to_string(), 1);
        cfg.limits.insert("mem".to_string(), 2);

        bind_document(&mut cfg, br#"{"limits":{"mem":4,"disk":8}}"#, DocumentFormat::Json, true)
            .unwrap();

        assert_eq!(cfg.limits.get("cpu"), Some(&1));
        assert_eq!(cfg.limits.get("mem"), Some(&4));
        assert_eq!(cfg.limits.get("disk"), Some(&8));
    }

    #[test]
    fn test_alias_conflicts_with_current_value() {
        #[derive(Debug, Default, Serialize, Deserialize)]
        struct Server {
            #[serde(alias = "hostname")]
            host: String,
            port: u16,
        }

        let mut cfg = Server {
            host: "before".to_string(),
            port: 80,
        };
        let err = bind_document(&mut cfg, br#"{"hostname":"h"}"#, DocumentFormat::Json, false)
            .unwrap_err();

        assert!(matches!(err, BindError::Json(_)));
        assert!(err.to_string().contains("duplicate field `host`"), "{err}");
        assert_eq!(cfg.host, "before");

        bind_document(&mut cfg, br#"{"host":"h"}"#, DocumentFormat::Json, false).unwrap();
        assert_eq!(cfg.host, "h");
        assert_eq!(cfg.port, 80);
    }

    #[test]
    fn test_invalid_utf8_is_a_decode_error() {
        let mut cfg = Example {
            host: "before".to_string(),
            ..Example::default()
        };

        let err = bind_document(&mut cfg, b"Host = \"bad\xff\"\n", DocumentFormat::Toml, false)
            .unwrap_err();
        assert!(matches!(err, BindError::Utf8(_)), "{err}");

        let err = bind_document(&mut cfg, b"{\"Host\":\"bad\xff\"}", DocumentFormat::Json, false)
            .unwrap_err();
        assert!(matches!(err, BindError::Json(_)), "{err}");

        assert_eq!(cfg.host, "before");
    }

    #[test]
    fn test_read_all_sources() {
        let bytes = DocumentSource::from(DOC.as_bytes()).read_all().unwrap();
        assert_eq!(bytes, DOC.as_bytes());

        let mut cursor = Cursor::new(DOC.as_bytes().to_vec());
        cursor.set_position(10);
        let bytes = DocumentSource::seekable(cursor).read_all().unwrap();
        assert_eq!(bytes, DOC.as_bytes());

        let bytes = DocumentSource::reader(Cursor::new(DOC.as_bytes().to_vec()))
            .read_all()
            .unwrap();
        assert_eq!(bytes, DOC.as_bytes());
    }

    #[test]
    fn test_read_missing_file() {
        let err = DocumentSource::from("no_such_file.json").read_all().unwrap_err();
        assert!(matches!(err, BindError::NoDataSource { .. }));
        assert!(err.to_string().contains("no_such_file.json"));
    }
}
