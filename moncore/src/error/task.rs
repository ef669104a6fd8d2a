use thiserror::Error;

#[derive(Debug, Error)]
pub enum TaskStatusError {
    #[error("task status record is missing a name")]
    MissingName,
    #[error(transparent)]
    BackendError(#[from] crate::error::BackendError),
}
