use std::future::Future;
use std::sync::Arc;

use crate::Result;
use crate::types::DeviceSettings;

/// Access to one thermostat's settings record by gateway serial.
///
/// Implementations are shared between sessions and must tolerate concurrent
/// calls for different devices.
pub trait Transport: Send + Sync {
    /// Fresh snapshot for `device_id`; `Error::DeviceNotFound` if the account
    /// no longer lists it.
    fn fetch_settings(&self, device_id: &str) -> impl Future<Output = Result<DeviceSettings>> + Send;

    /// Replace the device's full settings record.
    fn write_settings(&self, settings: &DeviceSettings) -> impl Future<Output = Result<()>> + Send;
}

impl<T: Transport> Transport for Arc<T> {
    fn fetch_settings(&self, device_id: &str) -> impl Future<Output = Result<DeviceSettings>> + Send {
        (**self).fetch_settings(device_id)
    }

    fn write_settings(&self, settings: &DeviceSettings) -> impl Future<Output = Result<()>> + Send {
        (**self).write_settings(settings)
    }
}
