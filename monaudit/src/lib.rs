#[cfg(feature = "axum")]
pub mod axum;
pub mod diff;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod sanitize;
pub mod snapshot;
