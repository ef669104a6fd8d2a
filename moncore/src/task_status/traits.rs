use async_trait::async_trait;
use crate::{
    error::{
        BackendError,
        task::TaskStatusError,
    },
    task_status::{
        TaskStatusFilter,
        TaskStatusKey,
        TaskStatusRecord,
        TaskStatusRecords,
    },
};

#[async_trait]
pub trait TaskStatusBackend {
    /// Create or fully replace the record identified by the name and uid
    /// of the provided record, as a single atomic write.
    async fn upsert_task_status(
        &self,
        record: &TaskStatusRecord,
    ) -> Result<(), TaskStatusError>;
    async fn delete_task_status(
        &self,
        key: &TaskStatusKey,
    ) -> Result<bool, BackendError>;
    async fn get_task_status(
        &self,
        key: &TaskStatusKey,
    ) -> Result<Option<TaskStatusRecord>, BackendError>;
    // the first record with the name, regardless of uid.
    async fn first_task_status_by_name(
        &self,
        name: &str,
    ) -> Result<Option<TaskStatusRecord>, BackendError>;
    async fn list_task_status(
        &self,
        filter: &TaskStatusFilter,
    ) -> Result<TaskStatusRecords, BackendError>;
}
