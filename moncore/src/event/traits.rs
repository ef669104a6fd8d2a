use async_trait::async_trait;
use crate::{
    error::BackendError,
    event::{
        Event,
        EventAction,
        Events,
    },
};

#[async_trait]
pub trait EventBackend {
    /// Persist the event, returning the id assigned to it.
    async fn record_event(
        &self,
        event: &Event,
    ) -> Result<i64, BackendError>;
    async fn list_events(
        &self,
        action: Option<EventAction>,
    ) -> Result<Events, BackendError>;
}
