use crate::key::{Key, KeyId};

/// Decoded property value.
///
/// Strategy by type:
/// - Scalars (Int64, Double, Bool, Timestamp, Rating): copied out of the payload
/// - Text-like variants: validated UTF-8, owned
/// - Blob, ByteString, EmbeddedEntity: opaque bytes, owned
/// - List: one element per descriptor of a multi-valued property, in wire order
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Int64(i64),
    Bool(bool),
    Double(f64),
    /// Microseconds since the Unix epoch.
    Timestamp(i64),
    /// 0..=100.
    Rating(i64),

    String(String),
    Text(String),
    Category(String),
    Link(String),
    Email(String),
    Im(String),
    PhoneNumber(String),
    PostalAddress(String),
    BlobKey(String),

    Blob(Vec<u8>),
    ByteString(Vec<u8>),
    /// Serialized nested entity, kept opaque.
    EmbeddedEntity(Vec<u8>),

    GeoPt { lat: f64, lon: f64 },
    User { email: String, auth_domain: String },
    Key(Key),

    List(Vec<FieldValue>),
}

impl FieldValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Int64(_) => "int64",
            FieldValue::Bool(_) => "bool",
            FieldValue::Double(_) => "double",
            FieldValue::Timestamp(_) => "timestamp",
            FieldValue::Rating(_) => "rating",
            FieldValue::String(_) => "string",
            FieldValue::Text(_) => "text",
            FieldValue::Category(_) => "category",
            FieldValue::Link(_) => "link",
            FieldValue::Email(_) => "email",
            FieldValue::Im(_) => "im",
            FieldValue::PhoneNumber(_) => "phone_number",
            FieldValue::PostalAddress(_) => "postal_address",
            FieldValue::BlobKey(_) => "blob_key",
            FieldValue::Blob(_) => "blob",
            FieldValue::ByteString(_) => "byte_string",
            FieldValue::EmbeddedEntity(_) => "embedded_entity",
            FieldValue::GeoPt { .. } => "geo_pt",
            FieldValue::User { .. } => "user",
            FieldValue::Key(_) => "key",
            FieldValue::List(_) => "list",
        }
    }

    /// String content of any text-like variant.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s)
            | FieldValue::Text(s)
            | FieldValue::Category(s)
            | FieldValue::Link(s)
            | FieldValue::Email(s)
            | FieldValue::Im(s)
            | FieldValue::PhoneNumber(s)
            | FieldValue::PostalAddress(s)
            | FieldValue::BlobKey(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Int64(v) | FieldValue::Timestamp(v) | FieldValue::Rating(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            FieldValue::Blob(b) | FieldValue::ByteString(b) | FieldValue::EmbeddedEntity(b) => {
                Some(b)
            }
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[FieldValue]> {
        match self {
            FieldValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_key(&self) -> Option<&Key> {
        match self {
            FieldValue::Key(k) => Some(k),
            _ => None,
        }
    }

    /// JSON view for dumps. Bytes become arrays of numbers, keys their display form.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::{Value, json};

        match self {
            FieldValue::Null => Value::Null,
            FieldValue::Int64(v) | FieldValue::Rating(v) => json!(v),
            FieldValue::Timestamp(us) => json!({ "timestamp_us": us }),
            FieldValue::Bool(v) => json!(v),
            FieldValue::Double(v) => json!(v),
            FieldValue::Blob(b) | FieldValue::ByteString(b) | FieldValue::EmbeddedEntity(b) => {
                json!(b)
            }
            FieldValue::GeoPt { lat, lon } => json!({ "lat": lat, "lon": lon }),
            FieldValue::User { email, auth_domain } => {
                json!({ "email": email, "auth_domain": auth_domain })
            }
            FieldValue::Key(k) => {
                let id = match k.id() {
                    KeyId::Id(id) => json!(id),
                    KeyId::Name(name) => json!(name),
                    KeyId::Incomplete => Value::Null,
                };
                json!({ "kind": k.kind(), "id": id, "path": k.to_string() })
            }
            FieldValue::List(items) => Value::Array(items.iter().map(FieldValue::to_json).collect()),
            other => other.as_str().map(|s| json!(s)).unwrap_or(Value::Null),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<i64> for FieldValue {
    fn from(v: i64) -> Self {
        FieldValue::Int64(v)
    }
}

impl From<f64> for FieldValue {
    fn from(v: f64) -> Self {
        FieldValue::Double(v)
    }
}

impl From<bool> for FieldValue {
    fn from(v: bool) -> Self {
        FieldValue::Bool(v)
    }
}

impl From<Key> for FieldValue {
    fn from(k: Key) -> Self {
        FieldValue::Key(k)
    }
}

impl<T: Into<FieldValue>> From<Vec<T>> for FieldValue {
    fn from(items: Vec<T>) -> Self {
        FieldValue::List(items.into_iter().map(Into::into).collect())
    }
}
