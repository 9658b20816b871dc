use crate::error::{DecodeError, EncodeError};
use crate::key::Key;
use crate::value::FieldValue;
use crate::wire::{Meaning, PointValue, Property, PropertyValue, UserValue};

/// Translates one raw property into a typed value.
///
/// Implementations must be pure: the same property always yields the same value.
/// Multi-valued properties are decoded one descriptor at a time by the caller.
pub trait FieldDecoder: Send + Sync {
    fn decode(&self, property: &Property) -> Result<FieldValue, DecodeError>;
}

/// Standard decoder driven by the payload slot and the property meaning.
#[derive(Debug, Clone, Copy, Default)]
pub struct PropertyDecoder;

impl FieldDecoder for PropertyDecoder {
    fn decode(&self, property: &Property) -> Result<FieldValue, DecodeError> {
        decode_property(property)
    }
}

pub fn decode_property(property: &Property) -> Result<FieldValue, DecodeError> {
    let meaning = property.known_meaning();
    let err = |reason: String| DecodeError::new(property.name.as_str(), reason);

    let Some(value) = &property.value else {
        return Ok(FieldValue::Null);
    };

    if let Some(v) = value.int64_value {
        return match meaning {
            Some(Meaning::GdWhen) => Ok(FieldValue::Timestamp(v)),
            Some(Meaning::GdRating) if (0..=100).contains(&v) => Ok(FieldValue::Rating(v)),
            Some(Meaning::GdRating) => Err(err(format!("rating {v} out of range 0..=100"))),
            Some(m) if is_bytes_meaning(m) => Err(err(format!("{m:?} requires a string payload"))),
            _ => Ok(FieldValue::Int64(v)),
        };
    }

    if let Some(m @ (Meaning::GdWhen | Meaning::GdRating)) = meaning {
        return Err(err(format!("{m:?} requires an int64 payload")));
    }

    if let Some(v) = value.boolean_value {
        return match meaning {
            Some(m) if is_bytes_meaning(m) => Err(err(format!("{m:?} requires a string payload"))),
            _ => Ok(FieldValue::Bool(v)),
        };
    }

    if let Some(bytes) = &value.string_value {
        return decode_bytes(meaning, bytes).map_err(err);
    }

    if let Some(m) = meaning.filter(|m| is_bytes_meaning(*m)) {
        return Err(err(format!("{m:?} requires a string payload")));
    }

    if let Some(v) = value.double_value {
        return Ok(FieldValue::Double(v));
    }

    if let Some(point) = &value.point_value {
        if !(-90.0..=90.0).contains(&point.x) || !(-180.0..=180.0).contains(&point.y) {
            return Err(err(format!("point ({}, {}) out of range", point.x, point.y)));
        }
        return Ok(FieldValue::GeoPt { lat: point.x, lon: point.y });
    }

    if let Some(user) = &value.user_value {
        return Ok(FieldValue::User {
            email: user.email.clone(),
            auth_domain: user.auth_domain.clone(),
        });
    }

    if let Some(reference) = &value.reference_value {
        return Key::from_reference(reference)
            .map(FieldValue::Key)
            .map_err(|e| err(e.to_string()));
    }

    Ok(FieldValue::Null)
}

fn is_bytes_meaning(meaning: Meaning) -> bool {
    !matches!(
        meaning,
        Meaning::NoMeaning
            | Meaning::GdWhen
            | Meaning::GdRating
            | Meaning::GeorssPoint
            | Meaning::IndexValue
    )
}

fn decode_bytes(meaning: Option<Meaning>, bytes: &[u8]) -> Result<FieldValue, String> {
    let text = || {
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|e| format!("invalid UTF-8: {e}"))
    };

    Ok(match meaning {
        Some(Meaning::Blob) => FieldValue::Blob(bytes.to_vec()),
        Some(Meaning::Bytestring) => FieldValue::ByteString(bytes.to_vec()),
        Some(Meaning::EntityProto) => FieldValue::EmbeddedEntity(bytes.to_vec()),
        Some(Meaning::Text) => FieldValue::Text(text()?),
        Some(Meaning::AtomCategory) => FieldValue::Category(text()?),
        Some(Meaning::AtomLink) => FieldValue::Link(text()?),
        Some(Meaning::GdEmail) => FieldValue::Email(text()?),
        Some(Meaning::GdIm) => FieldValue::Im(text()?),
        Some(Meaning::GdPhonenumber) => FieldValue::PhoneNumber(text()?),
        Some(Meaning::GdPostaladdress) => FieldValue::PostalAddress(text()?),
        Some(Meaning::Blobkey) => FieldValue::BlobKey(text()?),
        _ => FieldValue::String(text()?),
    })
}

// ---------------------------------------------------------------------------
// Inverse direction
// ---------------------------------------------------------------------------

/// Wire descriptors for one named value. Lists expand to one multi-valued
/// descriptor per element; an empty list produces none.
pub fn encode_field(name: &str, value: &FieldValue) -> Result<Vec<Property>, EncodeError> {
    match value {
        FieldValue::List(items) => items
            .iter()
            .map(|item| encode_property(name, item, true))
            .collect(),
        other => Ok(vec![encode_property(name, other, false)?]),
    }
}

pub fn encode_property(
    name: &str,
    value: &FieldValue,
    multiple: bool,
) -> Result<Property, EncodeError> {
    let mut pv = PropertyValue::default();
    let mut meaning = None;
    let bytes = |s: &str| Some(s.as_bytes().to_vec());

    match value {
        FieldValue::Null => {}
        FieldValue::Int64(v) => pv.int64_value = Some(*v),
        FieldValue::Bool(v) => pv.boolean_value = Some(*v),
        FieldValue::Double(v) => pv.double_value = Some(*v),
        FieldValue::Timestamp(v) => {
            pv.int64_value = Some(*v);
            meaning = Some(Meaning::GdWhen);
        }
        FieldValue::Rating(v) => {
            pv.int64_value = Some(*v);
            meaning = Some(Meaning::GdRating);
        }
        FieldValue::String(s) => pv.string_value = bytes(s),
        FieldValue::Text(s) => {
            pv.string_value = bytes(s);
            meaning = Some(Meaning::Text);
        }
        FieldValue::Category(s) => {
            pv.string_value = bytes(s);
            meaning = Some(Meaning::AtomCategory);
        }
        FieldValue::Link(s) => {
            pv.string_value = bytes(s);
            meaning = Some(Meaning::AtomLink);
        }
        FieldValue::Email(s) => {
            pv.string_value = bytes(s);
            meaning = Some(Meaning::GdEmail);
        }
        FieldValue::Im(s) => {
            pv.string_value = bytes(s);
            meaning = Some(Meaning::GdIm);
        }
        FieldValue::PhoneNumber(s) => {
            pv.string_value = bytes(s);
            meaning = Some(Meaning::GdPhonenumber);
        }
        FieldValue::PostalAddress(s) => {
            pv.string_value = bytes(s);
            meaning = Some(Meaning::GdPostaladdress);
        }
        FieldValue::BlobKey(s) => {
            pv.string_value = bytes(s);
            meaning = Some(Meaning::Blobkey);
        }
        FieldValue::Blob(b) => {
            pv.string_value = Some(b.clone());
            meaning = Some(Meaning::Blob);
        }
        FieldValue::ByteString(b) => {
            pv.string_value = Some(b.clone());
            meaning = Some(Meaning::Bytestring);
        }
        FieldValue::EmbeddedEntity(b) => {
            pv.string_value = Some(b.clone());
            meaning = Some(Meaning::EntityProto);
        }
        FieldValue::GeoPt { lat, lon } => {
            pv.point_value = Some(PointValue { x: *lat, y: *lon });
            meaning = Some(Meaning::GeorssPoint);
        }
        FieldValue::User { email, auth_domain } => {
            pv.user_value = Some(UserValue {
                email: email.clone(),
                auth_domain: auth_domain.clone(),
            });
        }
        FieldValue::Key(k) => pv.reference_value = Some(k.to_reference()),
        FieldValue::List(_) => {
            return Err(EncodeError {
                property: name.to_string(),
                reason: "nested lists are not supported".to_string(),
            });
        }
    }

    Ok(Property {
        meaning: meaning.map(|m| m as i32),
        meaning_uri: None,
        name: name.to_string(),
        multiple,
        value: Some(pv),
    })
}
