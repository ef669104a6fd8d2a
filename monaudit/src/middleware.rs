use moncore::{
    event::{
        traits::EventBackend,
        EventUser,
    },
    model::{
        Model,
        QueryLog,
    },
};
use parking_lot::RwLock;
use std::{
    collections::HashMap,
    sync::{
        atomic::AtomicU64,
        Arc,
    },
};
use crate::{
    error::AuditError,
    policy::ShouldAudit,
    snapshot::SnapshotEngine,
};

/// Identifier assigned to each inbound request.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RequestId(String);

/// The parts of an inbound request the audit trail is concerned with.
#[derive(Clone, Debug)]
pub struct AuditRequest {
    pub request_id: Option<RequestId>,
    pub user: EventUser,
    pub method: String,
    pub path: String,
    /// Reads issued by the data access layer on behalf of this request.
    pub queries: QueryLog,
}

pub(crate) type Hook = Arc<
    dyn Fn(&mut dyn Model) -> Result<(), AuditError> + Send + Sync
>;

/// Captures the initial state of objects materialized during a request
/// and records the difference once they are persisted.
///
/// Hooks are held per request id, so objects materialized for one
/// request are never captured by the hook of another.  Each connection
/// is tagged with a token so that only the guard that registered a hook
/// may remove it.
#[derive(Clone)]
pub struct AuditMiddleware {
    enabled: bool,
    engine: SnapshotEngine,
    should_audit: ShouldAudit,
    sink: Arc<dyn EventBackend + Send + Sync>,
    hooks: Arc<RwLock<HashMap<RequestId, (u64, Hook)>>>,
    next_token: Arc<AtomicU64>,
}

pub struct Builder {
    enabled: bool,
    engine: SnapshotEngine,
    should_audit: ShouldAudit,
    sink: Arc<dyn EventBackend + Send + Sync>,
}

#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "clap", derive(clap::Args))]
pub struct AuditConfig {
    /// Attach the differences of audited objects to their events.
    #[cfg_attr(feature = "clap", clap(
        long = "audit-enabled",
        env = "MON_AUDIT_ENABLED",
        action = clap::ArgAction::Set,
        default_value_t = false,
        default_missing_value = "true",
    ))]
    pub enabled: bool,
}

/// Disconnects the hook of a request when dropped.
#[must_use = "the hook is disconnected as soon as the guard is dropped"]
pub struct ConnectGuard {
    middleware: AuditMiddleware,
    connection: Option<(RequestId, u64)>,
}

mod impls;
