use log::{
    info,
    warn,
};
use moncore::{
    platform::MonitorPlatform,
    task_status::{
        TaskStatus,
        TaskStatusRecord,
    },
};

use crate::monitor::TaskInfo;

pub const PREFILL_MESSAGE: &str = "Task has not been run yet.";

/// Create the placeholder status record for a job that has no record yet,
/// so its status may be queried before it first runs.
///
/// Returns whether the placeholder was created.  Errors from the store are
/// logged and otherwise ignored, as the store may not be available yet
/// while jobs get registered.
pub async fn prefill_task(platform: &dyn MonitorPlatform, info: &TaskInfo) -> bool {
    match platform.first_task_status_by_name(&info.name).await {
        Ok(Some(_)) => false,
        Ok(None) => {
            let record = TaskStatusRecord {
                name: info.name.clone(),
                status: TaskStatus::Unknown,
                messages: vec![PREFILL_MESSAGE.to_string()],
                description: info.description.clone(),
                call_module: info.call_module.clone(),
                call_func: info.call_func.clone(),
                expiring: false,
                .. Default::default()
            };
            match platform.upsert_task_status(&record).await {
                Ok(()) => {
                    info!("prefilled status for task {}", info.name);
                    true
                }
                Err(e) => {
                    warn!("unable to prefill status for task {}: {e}", info.name);
                    false
                }
            }
        }
        Err(e) => {
            warn!("unable to look up status for task {}: {e}", info.name);
            false
        }
    }
}
