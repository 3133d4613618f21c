//! # Wire Payloads
//!
//! An encoding-neutral tree the binder reads and writes. A [`Node`] has an
//! attribute level (scalar strings keyed by attribute local part) and an
//! element level (nested payloads keyed by element local part). Keys are
//! unique on each level and both levels keep insertion order, so a
//! marshalled node lists its properties in resolution order.
//!
//! ## JSON codec
//!
//! ```text
//! { "@id": "acct-1",              attribute  id
//!   "@action": "create",          attribute  action
//!   "entitlement": [              element    entitlement (sequence)
//!     { "@id": "e1", "@risk": "high" }
//!   ] }
//! ```
//!
//! Attribute values must be scalars. JSON numbers and booleans are
//! carried as their literal text; `null` members are treated as absent.
//! Member order is preserved in both directions.

use serde_json::{Map, Value as Json};

use igs_core::BindError;

/// Prefix marking an attribute key in the JSON codec.
pub const ATTRIBUTE_PREFIX: char = '@';

/// A structured payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    /// A scalar literal.
    Text(String),
    /// A structural node.
    Node(Node),
    /// An ordered sequence (collection properties).
    Sequence(Vec<Payload>),
}

impl Payload {
    /// Short shape name used in mismatch reports.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Node(_) => "node",
            Self::Sequence(_) => "sequence",
        }
    }

    /// Decode a JSON document.
    ///
    /// # Errors
    ///
    /// [`BindError::TypeMismatch`] for a `null` document or a non-scalar
    /// attribute value.
    pub fn from_json(json: &Json) -> Result<Self, BindError> {
        decode(json, "")
    }

    /// Encode as JSON.
    pub fn to_json(&self) -> Json {
        match self {
            Self::Text(s) => Json::String(s.clone()),
            Self::Sequence(items) => Json::Array(items.iter().map(Payload::to_json).collect()),
            Self::Node(node) => {
                let mut map = Map::new();
                for (k, v) in node.attributes() {
                    map.insert(format!("{ATTRIBUTE_PREFIX}{k}"), Json::String(v.to_string()));
                }
                for (k, v) in node.elements() {
                    map.insert(k.to_string(), v.to_json());
                }
                Json::Object(map)
            }
        }
    }
}

impl From<Node> for Payload {
    fn from(node: Node) -> Self {
        Self::Node(node)
    }
}

impl From<&str> for Payload {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

/// One structural level of a payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    attributes: Vec<(String, String)>,
    elements: Vec<(String, Payload)>,
}

impl Node {
    /// An empty node.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style attribute assignment.
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(key, value);
        self
    }

    /// Builder-style element assignment.
    pub fn with_element(mut self, key: impl Into<String>, value: impl Into<Payload>) -> Self {
        self.set_element(key, value);
        self
    }

    /// Set an attribute. An existing key keeps its position.
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        upsert(&mut self.attributes, key.into(), value.into());
    }

    /// Set an element. An existing key keeps its position.
    pub fn set_element(&mut self, key: impl Into<String>, value: impl Into<Payload>) {
        upsert(&mut self.elements, key.into(), value.into());
    }

    /// Read an attribute.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Read an element.
    pub fn element(&self, key: &str) -> Option<&Payload> {
        self.elements.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Attributes in insertion order.
    pub fn attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Elements in insertion order.
    pub fn elements(&self) -> impl Iterator<Item = (&str, &Payload)> {
        self.elements.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Whether the node carries nothing.
    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.elements.is_empty()
    }
}

fn upsert<V>(entries: &mut Vec<(String, V)>, key: String, value: V) {
    match entries.iter_mut().find(|(k, _)| *k == key) {
        Some(slot) => slot.1 = value,
        None => entries.push((key, value)),
    }
}

fn scalar_text(json: &Json) -> Option<String> {
    match json {
        Json::String(s) => Some(s.clone()),
        Json::Bool(b) => Some(b.to_string()),
        Json::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn decode(json: &Json, path: &str) -> Result<Payload, BindError> {
    if let Some(text) = scalar_text(json) {
        return Ok(Payload::Text(text));
    }
    match json {
        Json::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, item)| decode(item, &format!("{path}/{i}")))
            .collect::<Result<Vec<_>, _>>()
            .map(Payload::Sequence),
        Json::Object(map) => {
            let mut node = Node::new();
            for (key, value) in map {
                if value.is_null() {
                    continue;
                }
                match key.strip_prefix(ATTRIBUTE_PREFIX) {
                    Some(attr) => {
                        let text = scalar_text(value).ok_or_else(|| BindError::TypeMismatch {
                            path: format!("{path}/{key}"),
                            expected: "scalar attribute value".to_string(),
                            found: json_kind(value).to_string(),
                        })?;
                        node.set_attribute(attr, text);
                    }
                    None => {
                        let child = decode(value, &format!("{path}/{key}"))?;
                        node.set_element(key.clone(), child);
                    }
                }
            }
            Ok(Payload::Node(node))
        }
        other => Err(BindError::TypeMismatch {
            path: path.to_string(),
            expected: "payload".to_string(),
            found: json_kind(other).to_string(),
        }),
    }
}

fn json_kind(json: &Json) -> &'static str {
    match json {
        Json::Null => "null",
        Json::Bool(_) => "boolean",
        Json::Number(_) => "number",
        Json::String(_) => "string",
        Json::Array(_) => "array",
        Json::Object(_) => "object",
    }
}
