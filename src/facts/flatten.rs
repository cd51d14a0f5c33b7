//! Record Flattening
//!
//! Turns one ZAPI record into a nested JSON mapping and provides the two
//! tree walks the collector needs: hyphen-to-underscore key rewriting and
//! first-match field lookup.
//!
//! Conversion rules (attributes are ignored):
//!
//! | element                      | value                               |
//! |------------------------------|-------------------------------------|
//! | no children, no text         | `null`                              |
//! | text only                    | string                              |
//! | children                     | object, repeated tags become arrays |
//! | children and text            | object with a `#text` entry         |

use crate::zapi::ZapiElement;
use serde_json::{Map, Value};

/// Key used for text that sits next to child elements
pub const TEXT_KEY: &str = "#text";

/// Convert a record to `{tag: content}`
pub fn element_to_value(element: &ZapiElement) -> Value {
    let mut root = Map::new();
    root.insert(element.name().to_string(), element_content(element));
    Value::Object(root)
}

/// Convert the content of an element, without its own tag
pub fn element_content(element: &ZapiElement) -> Value {
    if element.children().is_empty() {
        return if element.content().is_empty() {
            Value::Null
        } else {
            Value::String(element.content().to_string())
        };
    }

    let mut map = Map::new();
    for child in element.children() {
        let value = element_content(child);
        match map.get_mut(child.name()) {
            Some(Value::Array(items)) => items.push(value),
            Some(existing) => {
                let first = existing.take();
                *existing = Value::Array(vec![first, value]);
            }
            None => {
                map.insert(child.name().to_string(), value);
            }
        }
    }

    if !element.content().is_empty() {
        map.insert(TEXT_KEY.to_string(), Value::String(element.content().to_string()));
    }

    Value::Object(map)
}

/// Rewrite every object key from `a-b` to `a_b`, at every depth
///
/// Objects nested inside arrays are rewritten too.
pub fn convert_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, inner)| (key.replace('-', "_"), convert_keys(inner)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(convert_keys).collect()),
        other => other,
    }
}

/// Depth-first, parent-first search for `key`
///
/// A key present on `object` itself wins even when its value is `null`;
/// nested matches are only taken when non-null. Arrays are not searched.
/// When several nested objects carry the same key the first one in
/// document order wins.
pub fn find_item<'a>(object: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    if let Some(value) = object.get(key) {
        return Some(value);
    }

    object.values().find_map(|value| match value {
        Value::Object(inner) => find_item(inner, key).filter(|found| !found.is_null()),
        _ => None,
    })
}

/// Scalar value rendered as a table key
pub fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
