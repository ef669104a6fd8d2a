use async_trait::async_trait;
use mockall::mock;
use moncore::{
    error::{
        BackendError,
        task::TaskStatusError,
    },
    event::{
        Event,
        EventAction,
        Events,
        traits::EventBackend,
    },
    platform::{
        DefaultMonitorPlatform,
        PlatformUrl,
    },
    task_status::{
        TaskStatusFilter,
        TaskStatusKey,
        TaskStatusRecord,
        TaskStatusRecords,
        traits::TaskStatusBackend,
    },
};

mock! {
    pub Platform {}

    #[async_trait]
    impl TaskStatusBackend for Platform {
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
        async fn first_task_status_by_name(
            &self,
            name: &str,
        ) -> Result<Option<TaskStatusRecord>, BackendError>;
        async fn list_task_status(
            &self,
            filter: &TaskStatusFilter,
        ) -> Result<TaskStatusRecords, BackendError>;
    }

    #[async_trait]
    impl EventBackend for Platform {
        async fn record_event(
            &self,
            event: &Event,
        ) -> Result<i64, BackendError>;
        async fn list_events(
            &self,
            action: Option<EventAction>,
        ) -> Result<Events, BackendError>;
    }
}

impl PlatformUrl for MockPlatform {
    fn url(&self) -> &str {
        "mock://platform"
    }
}

impl DefaultMonitorPlatform for MockPlatform {}
