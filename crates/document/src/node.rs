use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::DocumentError;
use crate::schema::{SchemaVersion, Tag};

/// Text content key used by the XML-to-map converter for mixed elements.
const TEXT_KEY: &str = "_";
/// Attribute the converter uses when it folds repeated elements into a map.
const KEY_ATTR: &str = "Key";

/// An owned, decoded vendor response.
///
/// The shape is whatever the vendor sent for the operation; nothing is
/// validated beyond the fields a reader asks for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawDocument(Value);

impl RawDocument {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Decode a document from its JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, DocumentError> {
        serde_json::from_str(text)
            .map(Self)
            .map_err(|err| DocumentError::Decode(err.to_string()))
    }

    /// Re-encode the document. Key order is preserved.
    pub fn to_json_string(&self) -> Result<String, DocumentError> {
        serde_json::to_string(&self.0).map_err(|err| DocumentError::Decode(err.to_string()))
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn into_value(self) -> Value {
        self.0
    }

    /// View the top level of the document under `schema`.
    pub fn root(&self, schema: &SchemaVersion) -> Node<'_> {
        Node::new(&self.0, *schema)
    }
}

impl From<Value> for RawDocument {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

/// Borrowed view of one element of a [`RawDocument`].
#[derive(Debug, Clone, Copy)]
pub struct Node<'a> {
    value: &'a Value,
    schema: SchemaVersion,
}

impl<'a> Node<'a> {
    pub fn new(value: &'a Value, schema: SchemaVersion) -> Self {
        Self { value, schema }
    }

    pub fn value(&self) -> &'a Value {
        self.value
    }

    pub fn schema(&self) -> SchemaVersion {
        self.schema
    }

    fn wrap(&self, value: &'a Value) -> Node<'a> {
        Node::new(value, self.schema)
    }

    fn lookup(&self, key: &str) -> Option<&'a Value> {
        match self.value.get(key) {
            Some(Value::Null) | None => None,
            Some(value) => Some(value),
        }
    }

    /// First occurrence of `tag`, if any.
    pub fn child(&self, tag: Tag) -> Option<Node<'a>> {
        self.children(tag).into_iter().next()
    }

    /// Like [`Node::child`] but absent children are a [`DocumentError::MissingField`].
    pub fn required_child(&self, tag: Tag) -> Result<Node<'a>, DocumentError> {
        self.child(tag)
            .ok_or_else(|| DocumentError::MissingField(tag.to_string()))
    }

    /// Every occurrence of `tag` in document order.
    ///
    /// A single object, an array, and a keyed map all read as a sequence.
    pub fn children(&self, tag: Tag) -> Vec<Node<'a>> {
        let key = self.schema.qualify(tag);
        match self.lookup(&key) {
            None => Vec::new(),
            Some(value) => self.sequence_of(value),
        }
    }

    pub fn has(&self, tag: Tag) -> bool {
        self.lookup(&self.schema.qualify(tag)).is_some()
    }

    /// Unqualified field such as `faultstring` or `detail`.
    pub fn field(&self, name: &str) -> Option<Node<'a>> {
        self.lookup(name).map(|value| self.wrap(value))
    }

    fn sequence_of(&self, value: &'a Value) -> Vec<Node<'a>> {
        match value {
            Value::Array(items) => items
                .iter()
                .filter(|item| !item.is_null())
                .map(|item| self.wrap(item))
                .collect(),
            Value::Object(map) if is_keyed_map(map) => {
                map.values().map(|item| self.wrap(item)).collect()
            }
            other => vec![self.wrap(other)],
        }
    }

    /// Scalar attribute; numbers and booleans are rendered as text.
    pub fn attr(&self, name: &str) -> Option<Cow<'a, str>> {
        self.lookup(name).and_then(scalar_text)
    }

    pub fn required_attr(&self, name: &str) -> Result<Cow<'a, str>, DocumentError> {
        self.attr(name)
            .ok_or_else(|| DocumentError::MissingField(name.to_string()))
    }

    /// Text content: the scalar itself, or the `_` entry of a mixed element.
    pub fn text(&self) -> Option<Cow<'a, str>> {
        match self.value {
            Value::Object(map) => map.get(TEXT_KEY).and_then(scalar_text),
            other => scalar_text(other),
        }
    }

    pub fn is_sequence(&self) -> bool {
        self.value.is_array()
    }
}

fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

/// A map qualifies as keyed when every entry is an object whose `Key`
/// attribute equals its map key.
fn is_keyed_map(map: &serde_json::Map<String, Value>) -> bool {
    !map.is_empty()
        && map.iter().all(|(key, value)| {
            value
                .get(KEY_ATTR)
                .and_then(Value::as_str)
                .is_some_and(|inner| inner == key)
        })
}
