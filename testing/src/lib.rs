#[cfg(feature = "chrono")]
pub mod chrono;
pub mod core;
pub mod model;
#[cfg(feature = "sqlite")]
pub mod sqlite;

mod utils;
pub use utils::*;
