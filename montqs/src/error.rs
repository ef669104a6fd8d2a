use std::error::Error;
use thiserror::Error;

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Backend(#[from] moncore::error::BackendError),
    #[error("{0}")]
    Failed(String),
    #[error("job panicked: {0}")]
    Panicked(String),
    #[error(transparent)]
    Other(#[from] Box<dyn Error + Send + Sync>),
}

#[non_exhaustive]
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no job registered under the name {0:?}")]
    UnknownJob(String),
    #[error("runner is no longer accepting jobs")]
    Closed,
}

/// Render the error along with every error in its source chain.
pub fn format_error_chain(err: &dyn Error) -> String {
    let mut result = err.to_string();
    let mut source = err.source();
    while let Some(err) = source {
        result.push_str(": ");
        result.push_str(&err.to_string());
        source = err.source();
    }
    result
}
