pub mod error;
pub mod monitor;
pub mod prefill;
pub mod registry;
pub mod runner;

pub(crate) mod chrono {
    #[cfg(not(test))]
    pub use ::chrono::Utc;
    #[cfg(test)]
    pub use test_mon::chrono::Utc;
}
