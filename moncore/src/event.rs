use serde::{Deserialize, Serialize};
use serde_json::{
    Map,
    Value,
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Deserialize, Serialize)]
#[cfg_attr(feature = "clap", derive(clap::ValueEnum))]
#[serde(rename_all = "snake_case")]
pub enum EventAction {
    ModelCreated,
    ModelUpdated,
    SystemTaskException,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct EventUser {
    pub pk: Option<i64>,
    pub username: String,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct EventRequest {
    pub request_id: Option<String>,
    pub method: String,
    pub path: String,
}

/// An audit event as handed to the event sink.
///
/// The `id` and `created_ts` are assigned by the backend that records the
/// event; values provided when recording are ignored.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Event {
    pub id: i64,
    pub action: EventAction,
    pub user: EventUser,
    pub request: Option<EventRequest>,
    pub message: String,
    pub context: Map<String, Value>,
    pub created_ts: i64,
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct Events(Vec<Event>);

mod impls;
pub mod traits;
