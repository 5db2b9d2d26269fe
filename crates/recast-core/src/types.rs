//! Record and collection types flowing between pipeline steps.
//!
//! Values are plain `serde_json::Value`s; a `Record` is an insertion-ordered
//! JSON object. A `Collection` is either one record or a sequence of them.

use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// One structured item: field name → value, insertion ordered.
pub type Record = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum Collection {
    Single(Record),
    Many(Vec<Record>),
}

impl Collection {
    /// Convert a raw JSON value into a collection.
    ///
    /// Accepts an object or an array of objects; anything else is rejected.
    pub fn from_value(value: Value) -> Result<Self> {
        match value {
            Value::Object(record) => Ok(Collection::Single(record)),
            Value::Array(items) => {
                let mut records = Vec::with_capacity(items.len());
                for (idx, item) in items.into_iter().enumerate() {
                    match item {
                        Value::Object(record) => records.push(record),
                        other => {
                            return Err(Error::Input(format!(
                                "element {idx} is {}, expected an object",
                                kind_name(&other)
                            )))
                        }
                    }
                }
                Ok(Collection::Many(records))
            }
            other => Err(Error::Input(format!(
                "top-level value is {}, expected an object or an array of objects",
                kind_name(&other)
            ))),
        }
    }

    pub fn into_value(self) -> Value {
        match self {
            Collection::Single(record) => Value::Object(record),
            Collection::Many(records) => {
                Value::Array(records.into_iter().map(Value::Object).collect())
            }
        }
    }

    /// Number of records (a single record counts as one).
    pub fn len(&self) -> usize {
        match self {
            Collection::Single(_) => 1,
            Collection::Many(records) => records.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self, Collection::Many(_))
    }

    pub fn records(&self) -> &[Record] {
        match self {
            Collection::Single(record) => std::slice::from_ref(record),
            Collection::Many(records) => records,
        }
    }

    /// Build a new collection of the same shape by transforming every record.
    ///
    /// The closure receives the record's position within the collection.
    pub fn map_records<F, E>(&self, mut f: F) -> std::result::Result<Collection, E>
    where
        F: FnMut(usize, &Record) -> std::result::Result<Record, E>,
    {
        match self {
            Collection::Single(record) => Ok(Collection::Single(f(0, record)?)),
            Collection::Many(records) => records
                .iter()
                .enumerate()
                .map(|(idx, record)| f(idx, record))
                .collect::<std::result::Result<Vec<_>, E>>()
                .map(Collection::Many),
        }
    }
}

impl From<Vec<Record>> for Collection {
    fn from(records: Vec<Record>) -> Self {
        Collection::Many(records)
    }
}

impl From<Record> for Collection {
    fn from(record: Record) -> Self {
        Collection::Single(record)
    }
}

/// Short human-readable name of a value's JSON kind.
pub fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_becomes_single_record() {
        let c = Collection::from_value(json!({"a": 1})).unwrap();
        assert!(!c.is_sequence());
        assert_eq!(c.len(), 1);
        assert_eq!(c.into_value(), json!({"a": 1}));
    }

    #[test]
    fn array_of_objects_becomes_sequence() {
        let c = Collection::from_value(json!([{"a": 1}, {"a": 2}])).unwrap();
        assert!(c.is_sequence());
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn scalars_are_rejected() {
        assert!(matches!(
            Collection::from_value(json!(5)),
            Err(Error::Input(_))
        ));
        let err = Collection::from_value(json!([{"a": 1}, "x"])).unwrap_err();
        assert!(err.to_string().contains("element 1"));
    }

    #[test]
    fn empty_array_is_an_empty_sequence() {
        let c = Collection::from_value(json!([])).unwrap();
        assert!(c.is_sequence());
        assert!(c.is_empty());
    }
}
