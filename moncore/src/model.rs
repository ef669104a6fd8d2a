use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::{
    collections::BTreeMap,
    sync::{
        Arc,
        atomic::AtomicUsize,
    },
};

/// A persisted domain object that may take part in auditing.
///
/// Implementations describe their own-table fields through `fields` and
/// hold on to the state captured when they were first materialized
/// within a request.
pub trait Model: Send + Sync {
    /// The kind of object, e.g. `user` or `provider`.
    fn kind(&self) -> &str;
    fn pk(&self) -> Option<String>;
    /// Human readable name for the object.
    fn name(&self) -> String {
        self.pk().unwrap_or_default()
    }
    fn fields(&self) -> Vec<Field>;
    fn previous_state(&self) -> Option<&Snapshot>;
    fn set_previous_state(&mut self, state: Snapshot);
}

#[derive(Clone, Debug, PartialEq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub value: FieldValue,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// Foreign keys and other fields that refer to other objects.
    Relation,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ScalarKind {
    Text,
    Integer,
    Float,
    Boolean,
    /// Stored as unix seconds or RFC 3339, canonically RFC 3339 in UTC.
    Timestamp,
    Json,
    /// Canonically the name of the file.
    File,
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    /// Not loaded from the backing store yet.
    Deferred,
    /// An expression that will only be evaluated by the backing store,
    /// e.g. `count + 1`.
    Expression(String),
    Value(Value),
}

/// Flat capture of the scalar state of a `Model`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Snapshot(BTreeMap<String, Value>);

/// Count of the read queries issued on behalf of a single request.
///
/// Data access layers record every read they issue so that code which
/// must not cause additional reads can verify that.
#[derive(Clone, Debug, Default)]
pub struct QueryLog(Arc<AtomicUsize>);

mod impls;
