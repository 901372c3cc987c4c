//! Payload values carried by log events
//!
//! A payload is a JSON-like tree. Objects are shared handles so that a
//! logging front-end can hand over the same structure it keeps mutating,
//! including structures that refer back to themselves. Encoding such a
//! structure to JSON fails with [`EncodeError::Circular`] instead of
//! recursing forever, and nesting deeper than [`MAX_DEPTH`] fails with
//! [`EncodeError::TooDeep`].

use serde_json::Number;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use thiserror::Error;

/// Deepest nesting of arrays and objects that can be encoded
pub const MAX_DEPTH: usize = 128;

/// Errors produced when encoding a payload value as JSON text
#[derive(Debug, Error)]
pub enum EncodeError {
    /// The value contains an object that (transitively) contains itself
    #[error("circular reference detected while encoding payload")]
    Circular,

    /// The value nests arrays or objects deeper than [`MAX_DEPTH`]
    #[error("payload nests deeper than {} levels", MAX_DEPTH)]
    TooDeep,

    /// serde_json rejected the converted value
    #[error("failed to encode payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// A payload value
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Object),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Converts this value into a `serde_json::Value`
    ///
    /// Objects already being visited on the current path are reported as
    /// [`EncodeError::Circular`]. The same object reached twice through
    /// sibling paths is fine.
    pub fn to_json(&self) -> Result<serde_json::Value, EncodeError> {
        let mut path = Vec::new();
        self.to_json_inner(&mut path, 0)
    }

    /// Encodes this value as compact JSON text
    pub fn to_json_string(&self) -> Result<String, EncodeError> {
        let json = self.to_json()?;
        Ok(serde_json::to_string(&json)?)
    }

    fn to_json_inner(
        &self,
        path: &mut Vec<usize>,
        depth: usize,
    ) -> Result<serde_json::Value, EncodeError> {
        if matches!(self, Value::Array(_) | Value::Object(_)) && depth >= MAX_DEPTH {
            return Err(EncodeError::TooDeep);
        }

        match self {
            Value::Null => Ok(serde_json::Value::Null),
            Value::Bool(b) => Ok(serde_json::Value::Bool(*b)),
            Value::Number(n) => Ok(serde_json::Value::Number(n.clone())),
            Value::String(s) => Ok(serde_json::Value::String(s.clone())),
            Value::Array(items) => items
                .iter()
                .map(|item| item.to_json_inner(path, depth + 1))
                .collect::<Result<Vec<_>, _>>()
                .map(serde_json::Value::Array),
            Value::Object(object) => {
                let id = object.id();
                if path.contains(&id) {
                    return Err(EncodeError::Circular);
                }

                path.push(id);
                let mut map = serde_json::Map::new();
                for (key, value) in object.entries() {
                    map.insert(key, value.to_json_inner(path, depth + 1)?);
                }
                path.pop();

                Ok(serde_json::Value::Object(map))
            }
        }
    }
}

/// A shared, ordered, mutable object
///
/// Cloning an `Object` clones the handle, not the fields. Keys keep their
/// insertion order; inserting an existing key replaces its value in place.
///
/// Reference cycles built through `Object` handles are never freed.
#[derive(Clone, Default)]
pub struct Object {
    fields: Arc<RwLock<Vec<(String, Value)>>>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets `key` to `value`, returning the previous value if there was one
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        let mut fields = self.fields.write().unwrap_or_else(PoisonError::into_inner);

        match fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, value)),
            None => {
                fields.push((key, value));
                None
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let fields = self.fields.read().unwrap_or_else(PoisonError::into_inner);
        fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value.clone())
    }

    pub fn len(&self) -> usize {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the fields in insertion order
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.fields
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.fields) as *const () as usize
    }
}

// Releases nested values with an explicit stack so that dropping a deeply
// nested payload cannot overflow the thread stack.
impl Drop for Object {
    fn drop(&mut self) {
        let Some(fields) = Arc::get_mut(&mut self.fields) else {
            return;
        };

        let mut pending: Vec<Value> = take_fields(fields)
            .into_iter()
            .map(|(_, value)| value)
            .collect();
        while let Some(value) = pending.pop() {
            match value {
                Value::Object(mut object) => {
                    if let Some(fields) = Arc::get_mut(&mut object.fields) {
                        pending.extend(take_fields(fields).into_iter().map(|(_, value)| value));
                    }
                }
                Value::Array(items) => pending.extend(items),
                _ => {}
            }
        }
    }
}

fn take_fields(fields: &mut RwLock<Vec<(String, Value)>>) -> Vec<(String, Value)> {
    std::mem::take(fields.get_mut().unwrap_or_else(PoisonError::into_inner))
}

// Printing the fields could recurse forever on cyclic objects.
impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<String> = self.entries().into_iter().map(|(key, _)| key).collect();
        f.debug_struct("Object").field("keys", &keys).finish()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Object {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let object = Object::new();
        for (key, value) in iter {
            object.insert(key, value);
        }
        object
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(map.into_iter().collect()),
        }
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Number(n.into())
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Number(n.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become null
    fn from(n: f64) -> Self {
        Number::from_f64(n).map(Value::Number).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_insert_keeps_order_and_replaces_in_place() {
        let object = Object::new();
        object.insert("a", 1i64);
        object.insert("b", 2i64);
        let previous = object.insert("a", 3i64);

        assert!(matches!(previous, Some(Value::Number(_))));
        let keys: Vec<String> = object.entries().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(object.get("a").unwrap().to_json().unwrap(), json!(3));
    }

    #[test]
    fn test_from_serde_json() {
        let value = Value::from(json!({"user": {"id": 7}, "tags": ["x", "y"]}));
        assert_eq!(
            value.to_json_string().unwrap(),
            r#"{"user":{"id":7},"tags":["x","y"]}"#
        );
    }

    #[test]
    fn test_self_reference_is_circular() {
        let object = Object::new();
        object.insert("name", "loop");
        object.insert("me", object.clone());

        let err = Value::Object(object).to_json_string().unwrap_err();
        assert!(matches!(err, EncodeError::Circular));
    }

    #[test]
    fn test_shared_object_without_cycle_encodes() {
        let shared = Object::new();
        shared.insert("id", 1i64);

        let parent = Object::new();
        parent.insert("left", shared.clone());
        parent.insert("right", shared);

        assert_eq!(
            Value::Object(parent).to_json_string().unwrap(),
            r#"{"left":{"id":1},"right":{"id":1}}"#
        );
    }

    fn chain(depth: usize) -> Object {
        let root = Object::new();
        let mut current = root.clone();
        for _ in 0..depth {
            let next = Object::new();
            current.insert("n", next.clone());
            current = next;
        }
        root
    }

    #[test]
    fn test_nesting_limit() {
        assert!(Value::Object(chain(MAX_DEPTH - 1)).to_json().is_ok());
        assert!(matches!(
            Value::Object(chain(MAX_DEPTH)).to_json(),
            Err(EncodeError::TooDeep)
        ));

        let mut nested = Value::from(1i64);
        for _ in 0..=MAX_DEPTH {
            nested = Value::Array(vec![nested]);
        }
        assert!(matches!(nested.to_json(), Err(EncodeError::TooDeep)));
    }

    #[test]
    fn test_very_deep_payload_encodes_and_drops_without_overflow() {
        let root = Value::Object(chain(200_000));
        assert!(matches!(root.to_json_string(), Err(EncodeError::TooDeep)));
        drop(root);
    }

    #[test]
    fn test_debug_does_not_recurse() {
        let object = Object::new();
        object.insert("me", object.clone());
        assert_eq!(format!("{:?}", object), r#"Object { keys: ["me"] }"#);
    }

    #[test]
    fn test_non_finite_float_is_null() {
        assert!(Value::from(f64::NAN).is_null());
    }
}
