use serde::{
    Deserialize,
    Serialize,
};
use serde_json::Value;
use std::collections::{
    BTreeMap,
    BTreeSet,
};
use crate::{
    sanitize::{
        Sanitizer,
        OPAQUE,
    },
    snapshot::Snapshot,
};

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct ValueChange {
    pub old_value: Value,
    pub new_value: Value,
}

/// The difference between two snapshots, keyed by the path to each
/// value, e.g. `root['attributes']['groups'][0]`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct AuditDiff {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub added: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub removed: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub changed: BTreeMap<String, ValueChange>,
}

impl AuditDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty()
            && self.removed.is_empty()
            && self.changed.is_empty()
    }

    fn compare(&mut self, path: String, old: &Value, new: &Value) {
        if old == new {
            return;
        }
        match (old, new) {
            (Value::Object(old), Value::Object(new)) => {
                let keys = old.keys()
                    .chain(new.keys())
                    .collect::<BTreeSet<_>>();
                for key in keys {
                    let path = key_path(&path, key);
                    match (old.get(key), new.get(key)) {
                        (Some(o), Some(n)) => self.compare(path, o, n),
                        (Some(o), None) => { self.removed.insert(path, o.clone()); }
                        (None, Some(n)) => { self.added.insert(path, n.clone()); }
                        (None, None) => (),
                    }
                }
            }
            (Value::Array(old), Value::Array(new)) => {
                for i in 0..old.len().max(new.len()) {
                    let path = format!("{path}[{i}]");
                    match (old.get(i), new.get(i)) {
                        (Some(o), Some(n)) => self.compare(path, o, n),
                        (Some(o), None) => { self.removed.insert(path, o.clone()); }
                        (None, Some(n)) => { self.added.insert(path, n.clone()); }
                        (None, None) => (),
                    }
                }
            }
            _ => {
                self.changed.insert(path, ValueChange {
                    old_value: old.clone(),
                    new_value: new.clone(),
                });
            }
        }
    }
}

fn key_path(parent: &str, key: &str) -> String {
    format!("{parent}['{}']", key.replace('\'', "\\'"))
}

fn opaque() -> Value {
    Value::String(OPAQUE.to_string())
}

/// Compute the difference between two snapshots after sanitizing both.
///
/// A value that cannot be sanitized is compared as the opaque marker,
/// and is reported as changed whenever the raw values differ.
pub fn diff(
    before: &Snapshot,
    after: &Snapshot,
    sanitizer: &dyn Sanitizer,
) -> AuditDiff {
    let mut result = AuditDiff::default();
    let keys = before.keys()
        .chain(after.keys())
        .collect::<BTreeSet<_>>();
    for key in keys {
        let path = key_path("root", key);
        let old = before.get(key)
            .map(|v| sanitizer.sanitize(key, v).map_err(|_| v));
        let new = after.get(key)
            .map(|v| sanitizer.sanitize(key, v).map_err(|_| v));
        match (old, new) {
            (Some(Ok(o)), Some(Ok(n))) => result.compare(path, &o, &n),
            (Some(Err(o)), Some(Err(n))) if o == n => (),
            (Some(o), Some(n)) => {
                result.changed.insert(path, ValueChange {
                    old_value: o.unwrap_or_else(|_| opaque()),
                    new_value: n.unwrap_or_else(|_| opaque()),
                });
            }
            (Some(o), None) => {
                result.removed.insert(path, o.unwrap_or_else(|_| opaque()));
            }
            (None, Some(n)) => {
                result.added.insert(path, n.unwrap_or_else(|_| opaque()));
            }
            (None, None) => (),
        }
    }
    result
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use crate::sanitize::{
        KeyPatternSanitizer,
        CLEANSED_SUBSTITUTE,
    };
    use super::*;

    fn snapshot(value: Value) -> Snapshot {
        match value {
            Value::Object(obj) => obj.into_iter().collect(),
            _ => panic!("snapshot must be an object"),
        }
    }

    #[test]
    fn identical() {
        let sanitizer = KeyPatternSanitizer::default();
        let a = snapshot(json!({"name": "a", "attributes": {"x": [1, 2]}}));
        assert!(diff(&a, &a, &sanitizer).is_empty());
        assert_eq!(serde_json::to_value(diff(&a, &a, &sanitizer)).unwrap(), json!({}));
    }

    #[test]
    fn changes() {
        let sanitizer = KeyPatternSanitizer::default();
        let a = snapshot(json!({
            "name": "a",
            "email": "a@example.com",
            "attributes": {"groups": ["x"], "theme": "dark"},
        }));
        let b = snapshot(json!({
            "name": "b",
            "is_active": true,
            "attributes": {"groups": ["x", "y"], "locale": "en"},
        }));
        let result = diff(&a, &b, &sanitizer);
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({
            "added": {
                "root['is_active']": true,
                "root['attributes']['groups'][1]": "y",
                "root['attributes']['locale']": "en",
            },
            "removed": {
                "root['email']": "a@example.com",
                "root['attributes']['theme']": "dark",
            },
            "changed": {
                "root['name']": {"old_value": "a", "new_value": "b"},
            },
        }));
    }

    #[test]
    fn symmetric() {
        let sanitizer = KeyPatternSanitizer::default();
        let a = snapshot(json!({"name": "a", "email": "e", "tags": [1, 2, 3]}));
        let b = snapshot(json!({"name": "b", "slug": "s", "tags": [1, 4]}));
        let ab = diff(&a, &b, &sanitizer);
        let ba = diff(&b, &a, &sanitizer);
        assert_eq!(ab.added, ba.removed);
        assert_eq!(ab.removed, ba.added);
        assert_eq!(
            ab.changed.keys().collect::<Vec<_>>(),
            ba.changed.keys().collect::<Vec<_>>(),
        );
        for (path, change) in ab.changed.iter() {
            assert_eq!(change.old_value, ba.changed[path].new_value);
            assert_eq!(change.new_value, ba.changed[path].old_value);
        }
    }

    #[test]
    fn sensitive_values_are_redacted() {
        let sanitizer = KeyPatternSanitizer::default();
        let a = snapshot(json!({"password": "old"}));
        let b = snapshot(json!({"password": "new", "api_key": "k"}));
        let result = diff(&a, &b, &sanitizer);
        assert!(result.changed.is_empty());
        assert_eq!(result.added["root['api_key']"], json!(CLEANSED_SUBSTITUTE));
    }

    #[test]
    fn unsanitizable_is_opaque() {
        let sanitizer = KeyPatternSanitizer::default().max_depth(1);
        let a = snapshot(json!({"layout": {"a": {"b": 1}}}));
        let b = snapshot(json!({"layout": {"a": {"b": 2}}}));
        let result = diff(&a, &b, &sanitizer);
        assert_eq!(result.changed["root['layout']"], ValueChange {
            old_value: json!(OPAQUE),
            new_value: json!(OPAQUE),
        });
        assert!(diff(&a, &a, &sanitizer).is_empty());
        let result = diff(&Snapshot::new(), &b, &sanitizer);
        assert_eq!(result.added["root['layout']"], json!(OPAQUE));
    }
}
