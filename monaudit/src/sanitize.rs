use regex::Regex;
use serde_json::{
    Map,
    Value,
};
use std::sync::LazyLock;
use thiserror::Error;

/// Substitute for the values of sensitive keys.
pub const CLEANSED_SUBSTITUTE: &str = "********************";
/// Marker for values that could not be sanitized.
pub const OPAQUE: &str = "<opaque>";

pub const HIDDEN_PATTERN: &str = "(?i)API|TOKEN|KEY|SECRET|PASS|SIGNATURE|HTTP_COOKIE";
pub const ALLOWED_PATTERN: &str = "(?i)passing";

const DEFAULT_MAX_DEPTH: usize = 32;

static HIDDEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(HIDDEN_PATTERN).expect("valid hidden key pattern")
});
static ALLOWED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(ALLOWED_PATTERN).expect("valid allowed key pattern")
});

#[derive(Debug, Error, PartialEq)]
pub enum SanitizeError {
    #[error("value under {key:?} is nested deeper than {limit} levels")]
    TooDeep {
        key: String,
        limit: usize,
    },
}

/// Redacts sensitive values before they are stored or compared.
pub trait Sanitizer: Send + Sync {
    /// Sanitize the value found under the key.
    fn sanitize(&self, key: &str, value: &Value) -> Result<Value, SanitizeError>;
}

/// Redacts values by matching their keys against a pattern of sensitive
/// names, recursing into objects and arrays.
///
/// Objects are cleansed by their own keys; the items of an array are
/// cleansed by the key the array was found under.
#[derive(Clone, Debug)]
pub struct KeyPatternSanitizer {
    hidden: Regex,
    allowed: Regex,
    max_depth: usize,
}

impl Default for KeyPatternSanitizer {
    fn default() -> Self {
        Self {
            hidden: HIDDEN.clone(),
            allowed: ALLOWED.clone(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl KeyPatternSanitizer {
    pub fn new(hidden: &str, allowed: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            hidden: Regex::new(hidden)?,
            allowed: Regex::new(allowed)?,
            max_depth: DEFAULT_MAX_DEPTH,
        })
    }

    pub fn max_depth(mut self, value: usize) -> Self {
        self.max_depth = value;
        self
    }

    pub fn is_hidden(&self, key: &str) -> bool {
        self.hidden.is_match(key) && !self.allowed.is_match(key)
    }

    fn cleanse_item(
        &self,
        key: &str,
        value: &Value,
        depth: usize,
    ) -> Result<Value, SanitizeError> {
        if depth > self.max_depth {
            return Err(SanitizeError::TooDeep {
                key: key.to_string(),
                limit: self.max_depth,
            });
        }
        match value {
            Value::Object(obj) => Ok(Value::Object(self.cleanse_map(obj, depth + 1)?)),
            Value::Array(items) => Ok(Value::Array(items.iter()
                .map(|item| self.cleanse_item(key, item, depth + 1))
                .collect::<Result<Vec<_>, _>>()?
            )),
            _ if self.is_hidden(key) => Ok(Value::String(CLEANSED_SUBSTITUTE.into())),
            _ => Ok(value.clone()),
        }
    }

    fn cleanse_map(
        &self,
        obj: &Map<String, Value>,
        depth: usize,
    ) -> Result<Map<String, Value>, SanitizeError> {
        obj.iter()
            .map(|(k, v)| Ok((k.clone(), self.cleanse_item(k, v, depth)?)))
            .collect()
    }
}

impl Sanitizer for KeyPatternSanitizer {
    fn sanitize(&self, key: &str, value: &Value) -> Result<Value, SanitizeError> {
        self.cleanse_item(key, value, 0)
    }
}
