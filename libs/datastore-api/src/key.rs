use std::fmt;

use crate::error::ParseError;
use crate::wire::{Path, PathElement, Reference};

/// Identifier of one path element.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KeyId {
    Id(i64),
    Name(String),
    /// Not yet assigned by the store.
    Incomplete,
}

/// Decoded entity key: app, namespace and an ancestor path ending in the entity itself.
///
/// Always has at least one path element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key {
    app: String,
    namespace: String,
    path: Vec<(String, KeyId)>,
}

impl Key {
    pub fn new(app: impl Into<String>, kind: impl Into<String>, id: KeyId) -> Self {
        Self {
            app: app.into(),
            namespace: String::new(),
            path: vec![(kind.into(), id)],
        }
    }

    pub fn with_id(app: impl Into<String>, kind: impl Into<String>, id: i64) -> Self {
        Self::new(app, kind, KeyId::Id(id))
    }

    pub fn with_name(app: impl Into<String>, kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(app, kind, KeyId::Name(name.into()))
    }

    /// Child key of `self`.
    pub fn child(&self, kind: impl Into<String>, id: KeyId) -> Self {
        let mut path = self.path.clone();
        path.push((kind.into(), id));
        Self {
            app: self.app.clone(),
            namespace: self.namespace.clone(),
            path,
        }
    }

    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn app(&self) -> &str {
        &self.app
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Kind of the entity (last path element).
    pub fn kind(&self) -> &str {
        self.path.last().map(|(kind, _)| kind.as_str()).unwrap_or_default()
    }

    pub fn id(&self) -> &KeyId {
        self.path.last().map(|(_, id)| id).unwrap_or(&KeyId::Incomplete)
    }

    pub fn path(&self) -> &[(String, KeyId)] {
        &self.path
    }

    pub fn parent(&self) -> Option<Key> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Self {
            app: self.app.clone(),
            namespace: self.namespace.clone(),
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    pub fn is_complete(&self) -> bool {
        !matches!(self.id(), KeyId::Incomplete)
    }

    pub fn from_reference(reference: &Reference) -> Result<Self, ParseError> {
        let elements = reference
            .path
            .as_ref()
            .map(|p| p.element.as_slice())
            .unwrap_or_default();
        if elements.is_empty() {
            return Err(ParseError::InvalidKey("empty path".to_string()));
        }

        let mut path = Vec::with_capacity(elements.len());
        for element in elements {
            if element.kind.is_empty() {
                return Err(ParseError::InvalidKey("path element without kind".to_string()));
            }
            let id = match (element.id, &element.name) {
                (Some(_), Some(_)) => {
                    return Err(ParseError::InvalidKey(format!(
                        "path element '{}' has both id and name",
                        element.kind
                    )));
                }
                (Some(id), None) => KeyId::Id(id),
                (None, Some(name)) => KeyId::Name(name.clone()),
                (None, None) => KeyId::Incomplete,
            };
            path.push((element.kind.clone(), id));
        }

        Ok(Self {
            app: reference.app.clone(),
            namespace: reference.name_space.clone(),
            path,
        })
    }

    pub fn to_reference(&self) -> Reference {
        let element = self
            .path
            .iter()
            .map(|(kind, id)| {
                let (id, name) = match id {
                    KeyId::Id(id) => (Some(*id), None),
                    KeyId::Name(name) => (None, Some(name.clone())),
                    KeyId::Incomplete => (None, None),
                };
                PathElement { kind: kind.clone(), id, name }
            })
            .collect();
        Reference {
            app: self.app.clone(),
            name_space: self.namespace.clone(),
            path: Some(Path { element }),
        }
    }
}

impl fmt::Display for KeyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyId::Id(id) => write!(f, "{id}"),
            KeyId::Name(name) => write!(f, "'{name}'"),
            KeyId::Incomplete => write!(f, "?"),
        }
    }
}

/// `Parent(1)/Kind('name')`
impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (kind, id)) in self.path.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{kind}({id})")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_roundtrip_keeps_ancestors() {
        let key = Key::with_name("app", "Account", "acme")
            .child("User", KeyId::Id(7))
            .in_namespace("tenant");

        let decoded = Key::from_reference(&key.to_reference()).unwrap();
        assert_eq!(decoded, key);
        assert_eq!(decoded.kind(), "User");
        assert_eq!(decoded.parent().unwrap().kind(), "Account");
        assert_eq!(decoded.to_string(), "Account('acme')/User(7)");
    }

    #[test]
    fn empty_path_is_rejected() {
        let reference = Reference { app: "app".into(), name_space: String::new(), path: None };
        assert!(matches!(Key::from_reference(&reference), Err(ParseError::InvalidKey(_))));
    }

    #[test]
    fn id_and_name_together_are_rejected() {
        let reference = Reference {
            app: "app".into(),
            name_space: String::new(),
            path: Some(Path {
                element: vec![PathElement { kind: "K".into(), id: Some(1), name: Some("x".into()) }],
            }),
        };
        assert!(Key::from_reference(&reference).is_err());
    }

    #[test]
    fn incomplete_key() {
        let key = Key::new("app", "Draft", KeyId::Incomplete);
        assert!(!key.is_complete());
        assert_eq!(Key::from_reference(&key.to_reference()).unwrap(), key);
    }
}
