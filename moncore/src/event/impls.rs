use serde_json::{
    Map,
    Value,
};
use std::{
    ops::Deref,
    str::FromStr,
};
use crate::{
    error::ValueError,
    event::*,
};

impl EventAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ModelCreated => "model_created",
            Self::ModelUpdated => "model_updated",
            Self::SystemTaskException => "system_task_exception",
        }
    }
}

impl FromStr for EventAction {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "model_created" => Ok(Self::ModelCreated),
            "model_updated" => Ok(Self::ModelUpdated),
            "system_task_exception" => Ok(Self::SystemTaskException),
            _ => Err(ValueError::Coercion {
                kind: "event action",
                value: s.to_string(),
            }),
        }
    }
}

impl EventUser {
    pub fn new(pk: i64, username: impl Into<String>) -> Self {
        Self {
            pk: Some(pk),
            username: username.into(),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            pk: None,
            username: "AnonymousUser".into(),
        }
    }

    /// The user background work is attributed to.
    pub fn system() -> Self {
        Self {
            pk: None,
            username: "system".into(),
        }
    }
}

impl Default for EventUser {
    fn default() -> Self {
        Self::anonymous()
    }
}

impl Event {
    pub fn new(action: EventAction) -> Self {
        Self {
            id: 0,
            action,
            user: EventUser::system(),
            request: None,
            message: String::new(),
            context: Map::new(),
            created_ts: 0,
        }
    }

    pub fn message(mut self, value: impl Into<String>) -> Self {
        self.message = value.into();
        self
    }

    pub fn user(mut self, value: EventUser) -> Self {
        self.user = value;
        self
    }

    pub fn request(mut self, value: EventRequest) -> Self {
        self.request = Some(value);
        self
    }

    pub fn context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }
}

impl From<Vec<Event>> for Events {
    fn from(events: Vec<Event>) -> Self {
        Self(events)
    }
}

impl Deref for Events {
    type Target = Vec<Event>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl IntoIterator for Events {
    type Item = Event;
    type IntoIter = std::vec::IntoIter<Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod test {
    use serde_json::json;
    use crate::event::*;

    #[test]
    fn action_round_trip_str() {
        for action in [
            EventAction::ModelCreated,
            EventAction::ModelUpdated,
            EventAction::SystemTaskException,
        ] {
            assert_eq!(action.as_str().parse::<EventAction>().unwrap(), action);
            assert_eq!(json!(action), json!(action.as_str()));
        }
        assert!("model_deleted".parse::<EventAction>().is_err());
    }

    #[test]
    fn builder() {
        let event = Event::new(EventAction::ModelUpdated)
            .message("updated")
            .user(EventUser::new(3, "admin"))
            .context("diff", json!({}));
        assert_eq!(event.message, "updated");
        assert_eq!(event.user.pk, Some(3));
        assert_eq!(event.context.get("diff"), Some(&json!({})));
        assert_eq!(event.request, None);
    }
}
