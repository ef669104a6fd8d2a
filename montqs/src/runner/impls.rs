use futures::FutureExt;
use std::{
    any::Any,
    panic::AssertUnwindSafe,
    sync::{
        Arc,
        atomic::Ordering,
    },
    time::Duration,
};
use tokio::{
    runtime,
    signal,
    sync::{
        Semaphore,
        mpsc,
    },
    time,
};
use tokio_stream::{
    StreamExt,
    wrappers::IntervalStream,
};
use tokio_util::task::TaskTracker;

use crate::{
    error::{
        JobError,
        RunnerError,
    },
    monitor::TaskCall,
    registry::{
        Job,
        JobRegistry,
    },
};

use super::*;

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload.downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

async fn run_job(registry: &JobRegistry, job: Arc<dyn Job>, call: TaskCall) {
    let mut task = registry.monitor(job.as_ref());
    task.on_start();
    let result = AssertUnwindSafe(job.run(&mut task, &call))
        .catch_unwind()
        .await
        .unwrap_or_else(|payload| Err(JobError::Panicked(panic_message(payload))));
    match result {
        Ok(()) => task.on_success(&call).await,
        Err(e) => {
            log::warn!("job {} failed: {e}", job.info().name);
            task.on_failure(&e, &call).await
        }
    }
}

impl Runner {
    pub fn new(
        registry: Arc<JobRegistry>,
        rt_handle: runtime::Handle,
        permits: usize,  // the number of jobs permitted to run at once
    ) -> Self {
        log::info!("setting up runner with {permits} permits");
        let semaphore = Arc::new(Semaphore::new(permits));
        let task_tracker = TaskTracker::new();
        let (sender, receiver) = mpsc::channel(permits.max(1));
        let termination_token = Arc::new(false.into());
        Self {
            registry,
            rt_handle,
            sender,
            receiver,
            semaphore,
            task_tracker,
            termination_token,
        }
    }

    pub fn handle(&self) -> RunnerHandle {
        RunnerHandle {
            registry: self.registry.clone(),
            sender: self.sender.clone(),
            task_tracker: self.task_tracker.clone(),
            termination_token: self.termination_token.clone(),
        }
    }

    // listen for queued jobs until shut down; jobs already in the queue
    // when the shutdown message arrives still get run.
    pub async fn run(&mut self) {
        log::debug!("runner starting up");
        while let Some(msg) = self.receiver.recv().await {
            if self.termination_token.load(Ordering::Relaxed) {
                self.receiver.close();
                self.task_tracker.close();
                log::debug!("termination token set, ignoring receiver queue");
                break;
            }
            match msg {
                RunnerMessage::Job(QueuedJob { name, call }) => {
                    let job = match self.registry.get(&name) {
                        Some(job) => job,
                        None => {
                            log::error!("{}", RunnerError::UnknownJob(name));
                            continue;
                        }
                    };
                    log::debug!("runner received job: {name}");
                    let semaphore = self.semaphore.clone();
                    let termination_token = self.termination_token.clone();
                    let registry = self.registry.clone();
                    self.rt_handle.spawn(self.task_tracker.track_future(async move {
                        // only acquire the permit after spawning so this
                        // doesn't block other messages, like shutdown
                        let _permit = match semaphore.acquire_owned().await {
                            Ok(permit) => permit,
                            Err(_) => {
                                log::error!("semaphore closed; dropping job {name}");
                                return;
                            }
                        };
                        if termination_token.load(Ordering::Relaxed) {
                            log::debug!("runner ignoring job due to termination token: {name}");
                        } else {
                            log::debug!("runner starting job: {name}");
                            run_job(&registry, job, call).await;
                            log::debug!("runner finished job: {name}");
                        }
                    }));
                },
                RunnerMessage::Shutdown => {
                    self.receiver.close();
                    self.task_tracker.close();
                    log::debug!("runner shutdown signal received");
                },
            }
        }
        log::debug!("runner shutting down");
    }
}

impl RunnerHandle {
    pub async fn queue(&self, name: &str, call: TaskCall) -> Result<(), RunnerError> {
        if self.registry.get(name).is_none() {
            return Err(RunnerError::UnknownJob(name.to_string()));
        }
        self.sender.send(RunnerMessage::Job(QueuedJob {
            name: name.to_string(),
            call,
        }))
            .await
            .map_err(|_| RunnerError::Closed)
    }

    pub async fn shutdown(&self) {
        match self.sender.send(RunnerMessage::Shutdown).await {
            Ok(()) => (),
            Err(_) => log::debug!("failed to send shutdown signal to runner as it's no longer listening."),
        }
        log::debug!("waiting for task_tracker...");
        self.task_tracker.wait().await;
        log::debug!("finished waiting for task_tracker");
    }

    pub fn terminate(&self) {
        self.termination_token.store(true, Ordering::Relaxed);
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Queue the job every period until the runner stops listening.
    pub async fn every(&self, name: &str, period: Duration, call: TaskCall) {
        let mut ticker = IntervalStream::new(time::interval(period));
        log::debug!("scheduling job {name} every {period:?}");
        while let Some(_) = (!self.is_closed()).then_some(ticker.next().await).flatten() {
            if let Err(e) = self.queue(name, call.clone()).await {
                log::debug!("stopped scheduling job {name}: {e}");
                break;
            }
        }
    }

    pub async fn wait_for_shutdown_signal(&self) {
        log::trace!("waiting for shutdown signal");
        match signal::ctrl_c().await {
            Ok(()) => {
                log::debug!("Ctrl-C received for shutdown");
                self.shutdown().await;
                log::debug!("shutdown confirmed");
            },
            Err(err) => {
                log::debug!("Unable to listen for shutdown signal: {}", err);
                log::debug!("shutdown not signaled");
            },
        }
    }
}
