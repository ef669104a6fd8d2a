use num_enum::{
    IntoPrimitive,
    TryFromPrimitive,
};
use serde::{Deserialize, Serialize};
use serde_json::{
    Map,
    Value,
};

/// The recorded outcome of a task run.
///
/// The discriminants are what gets persisted, so they must never be
/// renumbered.
#[derive(
    Clone, Copy, Debug, Default, Eq, Hash, PartialEq,
    Deserialize, Serialize,
    IntoPrimitive, TryFromPrimitive,
)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
#[repr(i64)]
pub enum TaskStatus {
    Successful = 1,
    Warning = 2,
    Error = 4,
    #[default]
    Unknown = 8,
}

/// Identity of a task status record.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq, Deserialize, Serialize)]
pub struct TaskStatusKey {
    pub name: String,
    pub uid: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TaskStatusRecord {
    pub name: String,
    pub uid: Option<String>,
    pub status: TaskStatus,
    pub messages: Vec<String>,
    pub description: String,
    pub start_ts: Option<i64>,
    pub finish_ts: Option<i64>,
    pub call_module: String,
    pub call_func: String,
    pub call_args: Vec<Value>,
    pub call_kwargs: Map<String, Value>,
    pub expires_ts: Option<i64>,
    pub expiring: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct TaskStatusRecords(Vec<TaskStatusRecord>);

/// Criteria for listing task status records; unset fields match all.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskStatusFilter {
    pub name: Option<String>,
    pub status: Option<TaskStatus>,
}

#[cfg(feature = "display")]
mod display;
mod impls;
pub mod traits;
