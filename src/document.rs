use indexmap::IndexMap;
use std::fmt::{Debug, Display};

use crate::errors::{ErrorKind, LineageError, LineageResult};

/// Field value stored inside a [Document].
pub type Value = serde_json::Value;

/// Represents a document in a schema-less collection.
///
/// Documents are composed of key-value pairs. The key is always a [String]
/// and the value is a JSON [Value]. Field insertion order is preserved, so
/// a document round-trips through the database boundary without reordering.
///
/// Documents carry no schema; a revision's data change can put arbitrary
/// fields on any document it touches. The engine itself only ever reads and
/// writes the control marker document (see the state tracker).
///
/// # Examples
///
/// ```ignore
/// let mut doc = Document::new();
/// doc.put("name", "Alice")?;
/// doc.put("age", 30)?;
/// assert_eq!(doc.get_str("name"), Some("Alice"));
/// ```
#[derive(Clone, Eq, PartialEq, Default, serde::Deserialize, serde::Serialize)]
pub struct Document {
    fields: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            fields: IndexMap::new(),
        }
    }

    /// Checks if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Returns the number of fields in the document.
    pub fn size(&self) -> usize {
        self.fields.len()
    }

    /// Associates the specified [Value] with the specified key in this
    /// document. If the key already exists, its value is updated.
    ///
    /// # Arguments
    ///
    /// * `key` - The field name. Cannot be empty.
    /// * `value` - The value to associate with the key. Can be any type that
    ///   implements `Into<Value>` (primitives, strings, `json!` values).
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> LineageResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(LineageError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }
        self.fields.insert(key.to_string(), value.into());
        Ok(())
    }

    /// Returns the value associated with the key, if any.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Returns the value associated with the key as a string slice, if the
    /// field exists and holds a string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|value| value.as_str())
    }

    /// Returns the value associated with the key as an i64, if the field
    /// exists and holds an integer.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.fields.get(key).and_then(|value| value.as_i64())
    }

    /// Removes the field with the given key, returning its previous value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.fields.shift_remove(key)
    }

    /// Checks whether the document contains the given key.
    pub fn contains_key(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    /// Iterates over the fields in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Returns all field names in insertion order.
    pub fn field_names(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.fields.iter()).finish()
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let rendered = self
            .fields
            .iter()
            .map(|(key, value)| format!("{}: {}", key, value))
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "{{{}}}", rendered)
    }
}

/// Creates a [Document] from key-value pairs.
///
/// Keys may be identifiers or string literals; values accept anything the
/// `json!` macro accepts, including nested objects and arrays.
///
/// # Examples
///
/// ```ignore
/// let doc = doc! { "name": "Alice", "age": 30 };
/// let nested = doc! { "address": { "city": "Pune" }, "tags": ["a", "b"] };
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::document::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::document::Document::new();
            $(
                doc.put(stringify!($key).trim_matches('"'), $crate::json!($value))
                    .expect("failed to put value in document");
            )*
            doc
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_document_is_empty() {
        let doc = Document::new();
        assert!(doc.is_empty());
        assert_eq!(doc.size(), 0);
    }

    #[test]
    fn test_put_and_get() {
        let mut doc = Document::new();
        doc.put("name", "Alice").unwrap();
        doc.put("age", 30).unwrap();

        assert_eq!(doc.get_str("name"), Some("Alice"));
        assert_eq!(doc.get_i64("age"), Some(30));
        assert_eq!(doc.size(), 2);
    }

    #[test]
    fn test_put_empty_key_fails() {
        let mut doc = Document::new();
        let result = doc.put("", "value");
        assert!(result.is_err());
        assert_eq!(
            result.unwrap_err().kind(),
            &ErrorKind::InvalidOperation
        );
    }

    #[test]
    fn test_put_overwrites_existing_key() {
        let mut doc = Document::new();
        doc.put("status", "inactive").unwrap();
        doc.put("status", "active").unwrap();

        assert_eq!(doc.get_str("status"), Some("active"));
        assert_eq!(doc.size(), 1);
    }

    #[test]
    fn test_remove_field() {
        let mut doc = Document::new();
        doc.put("name", "Alice").unwrap();

        let removed = doc.remove("name");
        assert!(removed.is_some());
        assert!(doc.is_empty());
        assert!(doc.remove("name").is_none());
    }

    #[test]
    fn test_field_order_preserved() {
        let mut doc = Document::new();
        doc.put("z", 1).unwrap();
        doc.put("a", 2).unwrap();
        doc.put("m", 3).unwrap();

        assert_eq!(doc.field_names(), vec!["z", "a", "m"]);
    }

    #[test]
    fn test_get_str_on_non_string_returns_none() {
        let mut doc = Document::new();
        doc.put("age", 30).unwrap();
        assert_eq!(doc.get_str("age"), None);
    }

    #[test]
    fn test_doc_macro_empty() {
        let doc = doc! {};
        assert!(doc.is_empty());
    }

    #[test]
    fn test_doc_macro_with_pairs() {
        let doc = doc! { "name": "Alice", "age": 30 };
        assert_eq!(doc.get_str("name"), Some("Alice"));
        assert_eq!(doc.get_i64("age"), Some(30));
    }

    #[test]
    fn test_doc_macro_with_nested_value() {
        let doc = doc! { "address": { "city": "Pune" }, "tags": ["a", "b"] };
        let address = doc.get("address").unwrap();
        assert_eq!(address["city"], "Pune");
        let tags = doc.get("tags").unwrap();
        assert_eq!(tags.as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_display_format() {
        let mut doc = Document::new();
        doc.put("name", "Alice").unwrap();
        let rendered = format!("{}", doc);
        assert!(rendered.contains("name"));
        assert!(rendered.contains("Alice"));
    }
}
