use std::sync::{
    Arc,
    atomic::AtomicBool,
};
use tokio::{
    runtime,
    sync::{
        Semaphore,
        mpsc,
    },
};
use tokio_util::task::TaskTracker;

use crate::{
    monitor::TaskCall,
    registry::JobRegistry,
};

pub struct QueuedJob {
    pub name: String,
    pub call: TaskCall,
}

pub enum RunnerMessage {
    Job(QueuedJob),
    Shutdown,
}

pub struct Runner {
    pub(super) registry: Arc<JobRegistry>,
    pub(super) rt_handle: runtime::Handle,
    pub(super) sender: mpsc::Sender<RunnerMessage>,
    pub(super) receiver: mpsc::Receiver<RunnerMessage>,
    pub(super) semaphore: Arc<Semaphore>,
    pub(super) task_tracker: TaskTracker,
    pub(super) termination_token: Arc<AtomicBool>,
}

#[derive(Clone)]
pub struct RunnerHandle {
    pub(super) registry: Arc<JobRegistry>,
    pub(super) sender: mpsc::Sender<RunnerMessage>,
    pub(super) task_tracker: TaskTracker,
    pub(super) termination_token: Arc<AtomicBool>,
}

mod impls;
