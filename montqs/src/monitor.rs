use moncore::{
    platform::MonitorPlatform,
    task_status::TaskStatus,
};
use serde_json::{
    Map,
    Value,
};
use std::{
    sync::Arc,
    time::Duration,
};

/// How long terminal results are kept around by default.
pub const DEFAULT_RESULT_TIMEOUT: Duration = Duration::from_secs(6 * 60 * 60);

/// Static configuration of a monitored job.
#[derive(Clone, Debug, PartialEq)]
pub struct TaskInfo {
    pub name: String,
    pub description: String,
    pub call_module: String,
    pub call_func: String,
    /// When false, a successful run removes the status record instead of
    /// saving it.
    pub save_on_success: bool,
    pub result_timeout: Duration,
}

/// The serialized parameters a job was invoked with.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TaskCall {
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RunPhase {
    #[default]
    Pending,
    Running,
    Completed,
}

/// State of a single run, reset whenever a run starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunState {
    pub uid: Option<String>,
    pub status: Option<(TaskStatus, Vec<String>)>,
    pub start_ts: Option<i64>,
    pub phase: RunPhase,
}

/// A job run that records its outcome to the status store.
pub struct MonitoredTask {
    pub(super) info: TaskInfo,
    pub(super) platform: Arc<dyn MonitorPlatform>,
    pub(super) state: RunState,
}

mod impls;
