use serde_json::{
    Map,
    Number,
    Value,
};
use std::{
    collections::BTreeMap,
    ops::Deref,
    sync::atomic::Ordering,
};
use chrono::{
    DateTime,
    SecondsFormat,
    Utc,
};
use crate::{
    error::ValueError,
    model::*,
};

impl Field {
    pub fn scalar(
        name: impl Into<String>,
        kind: ScalarKind,
        value: impl Into<Value>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar(kind),
            value: FieldValue::Value(value.into()),
        }
    }

    pub fn relation(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Relation,
            value: FieldValue::Value(value.into()),
        }
    }

    pub fn deferred(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar(kind),
            value: FieldValue::Deferred,
        }
    }

    pub fn expression(
        name: impl Into<String>,
        kind: ScalarKind,
        expression: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind: FieldKind::Scalar(kind),
            value: FieldValue::Expression(expression.into()),
        }
    }
}

fn coercion_error(kind: &'static str, value: &Value) -> ValueError {
    ValueError::Coercion {
        kind,
        value: value.to_string(),
    }
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Timestamp => "timestamp",
            Self::Json => "json",
            Self::File => "file",
        }
    }

    /// Coerce a stored value into the canonical representation for this
    /// kind of field.  Null is canonical for every kind.
    pub fn to_canonical(&self, value: &Value) -> Result<Value, ValueError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        let err = || coercion_error(self.as_str(), value);
        match (self, value) {
            (Self::Json, value) => Ok(value.clone()),

            (Self::Text, Value::String(_)) => Ok(value.clone()),
            (Self::Text, Value::Number(n)) => Ok(Value::String(n.to_string())),
            (Self::Text, Value::Bool(b)) => Ok(Value::String(b.to_string())),

            (Self::Integer, Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
                (Some(_), _) => Ok(value.clone()),
                (None, Some(f)) if f.fract() == 0.0
                    && f >= i64::MIN as f64
                    && f <= i64::MAX as f64 => Ok(Value::from(f as i64)),
                _ => Err(err()),
            },
            (Self::Integer, Value::String(s)) => s.trim()
                .parse::<i64>()
                .map(Value::from)
                .map_err(|_| err()),
            (Self::Integer, Value::Bool(b)) => Ok(Value::from(*b as i64)),

            (Self::Float, Value::Number(n)) => n.as_f64()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(err),
            (Self::Float, Value::String(s)) => s.trim()
                .parse::<f64>()
                .ok()
                .and_then(Number::from_f64)
                .map(Value::Number)
                .ok_or_else(err),

            (Self::Boolean, Value::Bool(_)) => Ok(value.clone()),
            (Self::Boolean, Value::Number(n)) => match n.as_i64() {
                Some(0) => Ok(Value::Bool(false)),
                Some(1) => Ok(Value::Bool(true)),
                _ => Err(err()),
            },
            (Self::Boolean, Value::String(s)) => match s.as_str() {
                "t" | "true" | "True" | "1" => Ok(Value::Bool(true)),
                "f" | "false" | "False" | "0" => Ok(Value::Bool(false)),
                _ => Err(err()),
            },

            (Self::Timestamp, Value::Number(n)) => n.as_i64()
                .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
                .map(|dt| Value::String(
                    dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)
                ))
                .ok_or_else(err),
            (Self::Timestamp, Value::String(s)) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Value::String(
                    dt.with_timezone(&Utc)
                        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
                ))
                .map_err(|_| err()),

            (Self::File, Value::String(_)) => Ok(value.clone()),
            (Self::File, Value::Object(obj)) => match obj.get("name") {
                Some(Value::String(name)) => Ok(Value::String(name.clone())),
                _ => Err(err()),
            },

            _ => Err(err()),
        }
    }
}

impl Snapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(key.into(), value)
    }

    pub fn into_inner(self) -> BTreeMap<String, Value> {
        self.0
    }
}

impl Deref for Snapshot {
    type Target = BTreeMap<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<BTreeMap<String, Value>> for Snapshot {
    fn from(value: BTreeMap<String, Value>) -> Self {
        Self(value)
    }
}

impl FromIterator<(String, Value)> for Snapshot {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Snapshot> for Value {
    fn from(value: Snapshot) -> Self {
        Value::Object(value.0.into_iter().collect::<Map<_, _>>())
    }
}

impl QueryLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use crate::model::*;

    #[test]
    fn coerce_text() {
        assert_eq!(ScalarKind::Text.to_canonical(&json!("a")).unwrap(), json!("a"));
        assert_eq!(ScalarKind::Text.to_canonical(&json!(12)).unwrap(), json!("12"));
        assert!(ScalarKind::Text.to_canonical(&json!(["a"])).is_err());
    }

    #[test]
    fn coerce_integer() {
        assert_eq!(ScalarKind::Integer.to_canonical(&json!(" 42")).unwrap(), json!(42));
        assert_eq!(ScalarKind::Integer.to_canonical(&json!(3.0)).unwrap(), json!(3));
        assert_eq!(ScalarKind::Integer.to_canonical(&json!(true)).unwrap(), json!(1));
        assert!(ScalarKind::Integer.to_canonical(&json!(3.5)).is_err());
        assert!(ScalarKind::Integer.to_canonical(&json!("abc")).is_err());
    }

    #[test]
    fn coerce_boolean() {
        assert_eq!(ScalarKind::Boolean.to_canonical(&json!("t")).unwrap(), json!(true));
        assert_eq!(ScalarKind::Boolean.to_canonical(&json!(0)).unwrap(), json!(false));
        assert!(ScalarKind::Boolean.to_canonical(&json!("maybe")).is_err());
    }

    #[test]
    fn coerce_timestamp() {
        assert_eq!(
            ScalarKind::Timestamp.to_canonical(&json!(1234567890)).unwrap(),
            json!("2009-02-13T23:31:30Z"),
        );
        assert_eq!(
            ScalarKind::Timestamp.to_canonical(&json!("2009-02-14T12:31:30+13:00")).unwrap(),
            json!("2009-02-13T23:31:30Z"),
        );
        assert!(ScalarKind::Timestamp.to_canonical(&json!("yesterday")).is_err());
    }

    #[test]
    fn coerce_file_and_null() {
        assert_eq!(
            ScalarKind::File.to_canonical(&json!({"name": "icon.png", "size": 3})).unwrap(),
            json!("icon.png"),
        );
        assert_eq!(ScalarKind::Integer.to_canonical(&json!(null)).unwrap(), json!(null));
    }

    #[test]
    fn query_log_shared() {
        let log = QueryLog::new();
        let other = log.clone();
        other.record();
        other.record();
        assert_eq!(log.count(), 2);
    }
}
