use indexmap::IndexMap;

use crate::value::Value;

/// Per-invocation store populated by processors as the graph is walked.
///
/// Insertion ordered; entries are overwritten but never removed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    values: IndexMap<String, Value>,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.values.iter()
    }

    pub fn string(&self, key: &str) -> &str {
        self.get(key).map_or("", Value::as_str)
    }

    pub fn string_list(&self, key: &str) -> &[String] {
        self.get(key).map(Value::as_string_list).unwrap_or_default()
    }

    pub fn int(&self, key: &str) -> i64 {
        self.get(key).map_or(0, Value::as_int)
    }

    pub fn int_list(&self, key: &str) -> &[i64] {
        self.get(key).map(Value::as_int_list).unwrap_or_default()
    }

    pub fn float(&self, key: &str) -> f64 {
        self.get(key).map_or(0.0, Value::as_float)
    }

    pub fn float_list(&self, key: &str) -> &[f64] {
        self.get(key).map(Value::as_float_list).unwrap_or_default()
    }

    pub fn bool(&self, key: &str) -> bool {
        self.get(key).is_some_and(Value::as_bool)
    }
}
