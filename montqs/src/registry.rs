use async_trait::async_trait;
use moncore::platform::MonitorPlatform;
use std::{
    collections::BTreeMap,
    sync::Arc,
};

use crate::{
    error::JobError,
    monitor::{
        MonitoredTask,
        TaskCall,
        TaskInfo,
    },
    prefill::prefill_task,
};

/// A unit of background work.
///
/// Implementations report the outcome of the work through the provided
/// task, e.g. with `set_status`; returning an error marks the run as
/// failed.
#[async_trait]
pub trait Job: Send + Sync {
    fn info(&self) -> &TaskInfo;
    async fn run(
        &self,
        task: &mut MonitoredTask,
        call: &TaskCall,
    ) -> Result<(), JobError>;
}

pub struct JobRegistry {
    platform: Arc<dyn MonitorPlatform>,
    jobs: BTreeMap<String, Arc<dyn Job>>,
}

impl JobRegistry {
    pub fn new(platform: Arc<dyn MonitorPlatform>) -> Self {
        Self {
            platform,
            jobs: BTreeMap::new(),
        }
    }

    /// Register the job, prefilling its status record.
    ///
    /// Returns whether a placeholder status was created.
    pub async fn register(&mut self, job: Arc<dyn Job>) -> bool {
        let name = job.info().name.clone();
        let prefilled = prefill_task(self.platform.as_ref(), job.info()).await;
        if self.jobs.insert(name.clone(), job).is_some() {
            log::warn!("job {name} registered again; replacing previous registration");
        }
        prefilled
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Job>> {
        self.jobs.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.jobs.keys().map(String::as_str)
    }

    pub fn platform(&self) -> Arc<dyn MonitorPlatform> {
        self.platform.clone()
    }

    /// A fresh task for a single run of the job.
    pub fn monitor(&self, job: &dyn Job) -> MonitoredTask {
        MonitoredTask::new(job.info().clone(), self.platform.clone())
    }
}
