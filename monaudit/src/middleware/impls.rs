use log::{
    debug,
    warn,
};
use moncore::{
    event::{
        traits::EventBackend,
        Event,
        EventAction,
        EventRequest,
        EventUser,
    },
    model::{
        Model,
        QueryLog,
    },
};
use rand::{
    distributions::Alphanumeric,
    Rng,
};
use serde_json::json;
use std::{
    collections::hash_map::Entry,
    fmt,
    sync::{
        atomic::Ordering,
        Arc,
    },
};
use crate::{
    error::AuditError,
    middleware::*,
    policy::ShouldAudit,
    sanitize::Sanitizer,
    snapshot::{
        Snapshot,
        SnapshotEngine,
    },
};

impl RequestId {
    pub fn generate() -> Self {
        Self(rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RequestId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AuditRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            request_id: None,
            user: EventUser::anonymous(),
            method: method.into(),
            path: path.into(),
            queries: QueryLog::new(),
        }
    }

    pub fn request_id(mut self, value: RequestId) -> Self {
        self.request_id = Some(value);
        self
    }

    pub fn user(mut self, value: EventUser) -> Self {
        self.user = value;
        self
    }

    pub fn event_request(&self) -> EventRequest {
        EventRequest {
            request_id: self.request_id.as_ref().map(ToString::to_string),
            method: self.method.clone(),
            path: self.path.clone(),
        }
    }
}

impl Builder {
    pub fn new(sink: Arc<dyn EventBackend + Send + Sync>) -> Self {
        Self {
            enabled: true,
            engine: SnapshotEngine::default(),
            should_audit: ShouldAudit::default(),
            sink,
        }
    }

    pub fn from_config(
        sink: Arc<dyn EventBackend + Send + Sync>,
        config: &AuditConfig,
    ) -> Self {
        Self::new(sink).enabled(config.enabled)
    }

    pub fn enabled(mut self, value: bool) -> Self {
        self.enabled = value;
        self
    }

    pub fn sanitizer(mut self, value: Arc<dyn Sanitizer>) -> Self {
        self.engine = SnapshotEngine::new(value);
        self
    }

    pub fn should_audit(mut self, value: ShouldAudit) -> Self {
        self.should_audit = value;
        self
    }

    pub fn build(self) -> AuditMiddleware {
        AuditMiddleware {
            enabled: self.enabled,
            engine: self.engine,
            should_audit: self.should_audit,
            sink: self.sink,
            hooks: Default::default(),
            next_token: Default::default(),
        }
    }
}

impl AuditMiddleware {
    pub fn builder(sink: Arc<dyn EventBackend + Send + Sync>) -> Builder {
        Builder::new(sink)
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn engine(&self) -> &SnapshotEngine {
        &self.engine
    }

    /// Register the hook that captures the initial state of objects
    /// materialized on behalf of the request.
    ///
    /// Nothing is registered when auditing is disabled, when the request
    /// has no id, or when a hook is already connected under the same id;
    /// the returned guard is inert in those cases.
    pub fn connect(&self, request: &AuditRequest) -> ConnectGuard {
        let inert = || ConnectGuard {
            middleware: self.clone(),
            connection: None,
        };
        let request_id = match (self.enabled, &request.request_id) {
            (true, Some(request_id)) => request_id.clone(),
            _ => return inert(),
        };
        let engine = self.engine.clone();
        let should_audit = self.should_audit.clone();
        let queries = request.queries.clone();
        let hook: Hook = Arc::new(move |instance: &mut dyn Model| {
            if !should_audit.check(instance) || instance.previous_state().is_some() {
                return Ok(());
            }
            let snapshot = engine.capture(instance, &queries)?;
            instance.set_previous_state(snapshot);
            Ok(())
        });
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        match self.hooks.write().entry(request_id.clone()) {
            Entry::Occupied(_) => {
                warn!("an audit hook is already connected for request {request_id}");
                return inert();
            }
            Entry::Vacant(entry) => {
                entry.insert((token, hook));
            }
        }
        debug!("connected audit hook for request {request_id}");
        ConnectGuard {
            middleware: self.clone(),
            connection: Some((request_id, token)),
        }
    }

    fn disconnect(&self, request_id: &RequestId, token: u64) {
        let mut hooks = self.hooks.write();
        if hooks.get(request_id).is_some_and(|(t, _)| *t == token) {
            hooks.remove(request_id);
            debug!("disconnected audit hook for request {request_id}");
        }
    }

    pub fn is_connected(&self, request_id: &RequestId) -> bool {
        self.hooks.read().contains_key(request_id)
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.read().len()
    }

    /// Called by the data access layer once an object has been populated
    /// from the backing store or constructed on behalf of the request.
    pub fn materialized(
        &self,
        request_id: &RequestId,
        instance: &mut dyn Model,
    ) -> Result<(), AuditError> {
        let hook = self.hooks.read()
            .get(request_id)
            .map(|(_, hook)| hook.clone());
        match hook {
            Some(hook) => hook(instance),
            None => Ok(()),
        }
    }

    /// Record the event for an object that was just saved, returning the
    /// id of the event if one was recorded.
    ///
    /// The difference against the initial state is attached as
    /// `context.diff` when the object was created or had its initial state
    /// captured.
    pub async fn persisted(
        &self,
        request: &AuditRequest,
        instance: &dyn Model,
        created: bool,
    ) -> Result<Option<i64>, AuditError> {
        if !self.should_audit.check(instance) {
            return Ok(None);
        }
        let action = if created {
            EventAction::ModelCreated
        } else {
            EventAction::ModelUpdated
        };
        let mut event = Event::new(action)
            .user(request.user.clone())
            .request(request.event_request())
            .context("model", json!({
                "model_name": instance.kind(),
                "pk": instance.pk(),
                "name": instance.name(),
            }));
        if self.enabled && (created || instance.previous_state().is_some()) {
            let empty = Snapshot::new();
            let before = instance.previous_state().unwrap_or(&empty);
            let after = self.engine.capture(instance, &request.queries)?;
            let diff = self.engine.diff(before, &after);
            event = event.context("diff", serde_json::to_value(diff)?);
        }
        let id = self.sink.record_event(&event).await?;
        debug!("recorded {} event {id} for {}", action.as_str(), instance.kind());
        Ok(Some(id))
    }

}

impl ConnectGuard {
    pub fn request_id(&self) -> Option<&RequestId> {
        self.connection.as_ref().map(|(request_id, _)| request_id)
    }

    /// Disconnect the hook now rather than when the guard goes out of
    /// scope.
    pub fn disconnect(mut self) {
        if let Some((request_id, token)) = self.connection.take() {
            self.middleware.disconnect(&request_id, token);
        }
    }
}

impl Drop for ConnectGuard {
    fn drop(&mut self) {
        if let Some((request_id, token)) = self.connection.take() {
            self.middleware.disconnect(&request_id, token);
        }
    }
}
