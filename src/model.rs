use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{ser, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

/// Backend identifiers are 24-char hex object ids.
static PERSISTED_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9a-fA-F]{24}$").expect("valid persisted id pattern"));

/// Id field names recognised on incoming items, besides the configured one.
const ID_ALIASES: [&str; 2] = ["_id", "id"];

/// Whether `raw` has the shape of a backend-issued identifier.
pub fn is_persisted_id(raw: &str) -> bool {
    PERSISTED_ID.is_match(raw)
}

/// Identity of a list item. Placeholders exist only locally and are never
/// sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemId {
    Placeholder(String),
    Persisted(String),
}

impl ItemId {
    pub fn placeholder() -> Self {
        ItemId::Placeholder(format!("new-{}", Uuid::new_v4().simple()))
    }

    /// Classify an id that came from outside the editor by its shape.
    pub fn classify(raw: &str) -> Self {
        if is_persisted_id(raw) {
            ItemId::Persisted(raw.to_string())
        } else {
            ItemId::Placeholder(raw.to_string())
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ItemId::Placeholder(id) | ItemId::Persisted(id) => id,
        }
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, ItemId::Persisted(_))
    }

    pub fn persisted(&self) -> Option<&str> {
        match self {
            ItemId::Persisted(id) => Some(id),
            ItemId::Placeholder(_) => None,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of an ordered list. Its rank is its index in the list.
#[derive(Debug, Clone, PartialEq)]
pub struct Item<P> {
    pub id: ItemId,
    pub payload: P,
}

impl<P> Item<P> {
    pub fn new(payload: P) -> Self {
        Self {
            id: ItemId::placeholder(),
            payload,
        }
    }

    pub fn with_id(id: &str, payload: P) -> Self {
        Self {
            id: ItemId::classify(id),
            payload,
        }
    }
}

impl<P: DeserializeOwned> Item<P> {
    /// Decode a wire object. The id is taken from `id_field` (or a common
    /// alias) and classified by shape; a missing id yields a placeholder.
    pub fn from_wire(mut obj: Map<String, Value>, id_field: &str) -> Result<Self, serde_json::Error> {
        let mut raw_id = take_id(&mut obj, id_field);
        for alias in ID_ALIASES {
            let alt = take_id(&mut obj, alias);
            if raw_id.is_none() {
                raw_id = alt;
            }
        }
        let payload: P = serde_json::from_value(Value::Object(obj))?;
        let id = match raw_id {
            Some(raw) if !raw.trim().is_empty() => ItemId::classify(&raw),
            _ => ItemId::placeholder(),
        };
        Ok(Self { id, payload })
    }
}

impl<P: Serialize> Item<P> {
    /// Encode for transmission. Placeholder ids are left out so the backend
    /// allocates a real identifier.
    pub fn to_wire(&self, id_field: &str) -> Result<Value, serde_json::Error> {
        let mut obj = match serde_json::to_value(&self.payload)? {
            Value::Object(obj) => obj,
            other => {
                return Err(ser::Error::custom(format!(
                    "item payload must serialize to an object, got {}",
                    other
                )))
            }
        };
        if let Some(id) = self.id.persisted() {
            obj.insert(id_field.to_string(), Value::String(id.to_string()));
        }
        Ok(Value::Object(obj))
    }

    /// Like `to_wire`, but keeps placeholder ids. Used for display only.
    pub fn to_display(&self, id_field: &str) -> Result<Value, serde_json::Error> {
        let mut value = self.to_wire(id_field)?;
        if let (Value::Object(obj), ItemId::Placeholder(id)) = (&mut value, &self.id) {
            obj.insert(id_field.to_string(), Value::String(id.clone()));
        }
        Ok(value)
    }
}

fn take_id(obj: &mut Map<String, Value>, field: &str) -> Option<String> {
    match obj.remove(field)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Neighbour-swap direction for `move_item`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}
