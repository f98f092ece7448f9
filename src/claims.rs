//! The claims payload carried inside a token.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim holding the time the current refresh window opened.
pub const ORIG_IAT: &str = "orig_iat";

/// Default name of the expiry claim.
pub const DEFAULT_EXP_FIELD: &str = "exp";

/// String-keyed JSON claims. Keys are unique; order is irrelevant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

/// Result of reading a numeric timestamp claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Timestamp {
    Missing,
    NotNumeric,
    At(i64),
}

impl Claims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// Read a Unix-seconds claim. Integer and float JSON numbers are both
    /// accepted; fractional seconds are truncated.
    pub(crate) fn timestamp(&self, key: &str) -> Timestamp {
        match self.0.get(key) {
            None | Some(Value::Null) => Timestamp::Missing,
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map_or(Timestamp::NotNumeric, Timestamp::At),
            Some(_) => Timestamp::NotNumeric,
        }
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Claims {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
