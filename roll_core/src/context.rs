use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Variables a formula may reference with `@name` or `@path.to.value`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RollContext(Map<String, Value>);

impl RollContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a context from any value that serializes to a map
    pub fn from_serialize<T: Serialize>(data: &T) -> Result<Self, serde_json::Error> {
        match serde_json::to_value(data)? {
            Value::Object(map) => Ok(RollContext(map)),
            other => Err(<serde_json::Error as serde::ser::Error>::custom(format!(
                "roll data must serialize to a map, got {}",
                other
            ))),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Look up a dotted path such as `att.die`
    pub fn resolve(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let mut current = self.0.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }
}
