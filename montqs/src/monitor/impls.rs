use log::{
    debug,
    error,
    warn,
};
use moncore::{
    event::{
        Event,
        EventAction,
    },
    platform::MonitorPlatform,
    task_status::{
        TaskStatus,
        TaskStatusKey,
        TaskStatusRecord,
    },
};
use serde_json::{
    json,
    Value,
};
use std::{
    error::Error,
    sync::Arc,
    time::Duration,
};

use crate::{
    chrono::Utc,
    error::format_error_chain,
};
use super::*;

impl TaskInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            call_module: String::new(),
            call_func: String::new(),
            save_on_success: true,
            result_timeout: DEFAULT_RESULT_TIMEOUT,
        }
    }

    pub fn description(mut self, value: impl Into<String>) -> Self {
        self.description = value.into();
        self
    }

    pub fn call(
        mut self,
        module: impl Into<String>,
        func: impl Into<String>,
    ) -> Self {
        self.call_module = module.into();
        self.call_func = func.into();
        self
    }

    pub fn save_on_success(mut self, value: bool) -> Self {
        self.save_on_success = value;
        self
    }

    pub fn result_timeout(mut self, value: Duration) -> Self {
        self.result_timeout = value;
        self
    }
}

impl TaskCall {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        self.args.push(value.into());
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }
}

impl MonitoredTask {
    pub fn new(info: TaskInfo, platform: Arc<dyn MonitorPlatform>) -> Self {
        Self {
            info,
            platform,
            state: RunState::default(),
        }
    }

    pub fn info(&self) -> &TaskInfo {
        &self.info
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn key(&self) -> TaskStatusKey {
        TaskStatusKey::new(self.info.name.clone(), self.state.uid.as_deref())
    }

    fn is_completed(&self, call: &str) -> bool {
        let completed = self.state.phase == RunPhase::Completed;
        if completed {
            warn!("{call} called on completed run of task {}; ignoring", self.key());
        }
        completed
    }

    pub fn set_uid(&mut self, uid: impl Into<String>) {
        if self.is_completed("set_uid") {
            return;
        }
        self.state.uid = Some(uid.into());
    }

    /// Set the status the run completes with; the last call wins.
    pub fn set_status<S>(&mut self, status: TaskStatus, messages: impl IntoIterator<Item = S>)
    where
        S: Into<String>,
    {
        if self.is_completed("set_status") {
            return;
        }
        self.state.status = Some((
            status,
            messages.into_iter().map(Into::into).collect(),
        ));
    }

    pub fn set_error(&mut self, err: &(dyn Error + Send + Sync)) {
        self.set_status(TaskStatus::Error, [format_error_chain(err)]);
    }

    pub fn on_start(&mut self) {
        self.state = RunState {
            start_ts: Some(Utc::now().timestamp()),
            phase: RunPhase::Running,
            .. Default::default()
        };
        debug!("task {} started", self.info.name);
    }

    fn record(
        &self,
        status: TaskStatus,
        messages: Vec<String>,
        call: &TaskCall,
    ) -> TaskStatusRecord {
        let finish_ts = Utc::now().timestamp();
        let timeout = i64::try_from(self.info.result_timeout.as_secs())
            .unwrap_or(i64::MAX);
        TaskStatusRecord {
            name: self.info.name.clone(),
            uid: self.state.uid.clone(),
            status,
            messages,
            description: self.info.description.clone(),
            start_ts: self.state.start_ts,
            finish_ts: Some(finish_ts),
            call_module: self.info.call_module.clone(),
            call_func: self.info.call_func.clone(),
            call_args: call.args.clone(),
            call_kwargs: call.kwargs.clone(),
            expires_ts: Some(finish_ts.saturating_add(timeout)),
            expiring: true,
        }
    }

    /// Persist the status that was set during the run.
    ///
    /// Runs that never set a status leave the store untouched.  Failures
    /// to write are logged, never returned.
    pub async fn on_success(&mut self, call: &TaskCall) {
        if self.is_completed("on_success") {
            return;
        }
        self.state.phase = RunPhase::Completed;
        let (status, messages) = match self.state.status.take() {
            Some(status) => status,
            None => {
                debug!("task {} completed without setting a status", self.key());
                return;
            }
        };
        if status == TaskStatus::Successful && !self.info.save_on_success {
            let key = self.key();
            match self.platform.delete_task_status(&key).await {
                Ok(deleted) => debug!("task {key} successful; record removed: {deleted}"),
                Err(e) => error!("failed to remove status of task {key}: {e}"),
            }
            return;
        }
        let record = self.record(status, messages, call);
        match self.platform.upsert_task_status(&record).await {
            Ok(()) => debug!("task {} completed with status {status}", record.key()),
            Err(e) => error!("failed to save status of task {}: {e}", record.key()),
        }
    }

    /// Persist the failure of the run and record it as an event.
    ///
    /// The status set during the run is kept if there is one, otherwise
    /// the run is marked as an error with the failure as its message.
    pub async fn on_failure(
        &mut self,
        err: &(dyn Error + Send + Sync),
        call: &TaskCall,
    ) {
        if self.is_completed("on_failure") {
            return;
        }
        self.state.phase = RunPhase::Completed;
        let failure = format_error_chain(err);
        let (status, messages) = self.state.status
            .take()
            .unwrap_or_else(|| (TaskStatus::Error, vec![failure.clone()]));
        let record = self.record(status, messages, call);
        if let Err(e) = self.platform.upsert_task_status(&record).await {
            error!("failed to save status of task {}: {e}", record.key());
        }
        let event = Event::new(EventAction::SystemTaskException)
            .message(format!("Task {} encountered an error: {failure}", self.info.name))
            .context("task", json!({
                "name": self.info.name,
                "uid": self.state.uid,
            }));
        if let Err(e) = self.platform.record_event(&event).await {
            error!("failed to record failure of task {}: {e}", record.key());
        }
    }
}
