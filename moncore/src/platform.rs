use crate::{
    event::traits::EventBackend,
    task_status::traits::TaskStatusBackend,
};

mod connector;
pub use connector::ConnectorOption;

pub trait PlatformUrl {
    fn url(&self) -> &str;
}

/// MonitorPlatform - the platform used to record task status and audit
/// events.
///
/// This trait is applicable to everything that correctly implements the
/// relevant backends that compose this trait.
pub trait MonitorPlatform: TaskStatusBackend
    + EventBackend
    + PlatformUrl

    + Send
    + Sync
{
    fn as_dyn(&self) -> &dyn MonitorPlatform;
}

pub trait DefaultMonitorPlatform: MonitorPlatform {}

impl<P: TaskStatusBackend
    + EventBackend
    + PlatformUrl

    + DefaultMonitorPlatform

    + Send
    + Sync
> MonitorPlatform for P {
    fn as_dyn(&self) -> &dyn MonitorPlatform {
        self
    }
}

