use moncore::error::BackendError;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AuditError {
    /// Capturing the state of an object caused reads against the backing
    /// store; the instrumentation of the object is defective.
    #[error("capturing the state of {kind} issued queries (before: {before}, after: {after})")]
    QueryAmplification {
        kind: String,
        before: usize,
        after: usize,
    },
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
}
