pub mod error;
pub mod event;
pub mod model;
pub mod platform;
pub mod task_status;

