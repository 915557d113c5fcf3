use crate::{
    ChannelClass, ChannelHandle, ChannelReading, DetectionListener, DetectionStatus, DeviceInfo,
    DriverInfo, Result,
};
use std::time::Duration;

/// A minimal blocking telemetry SDK interface.
pub trait TelemetryProvider {
    /// Switch every available driver online. Fails when none could be brought up.
    fn open_drivers(&mut self) -> Result<Vec<DriverInfo>>;

    /// Switch drivers offline again; best effort.
    fn close_drivers(&mut self) {}

    /// Register the listener that receives detection events.
    fn set_detection_listener(&mut self, listener: DetectionListener);

    /// Begin searching for `expected` devices. Completion is reported through the listener.
    fn start_detection(&mut self, expected: usize) -> Result<DetectionStatus>;

    /// Devices found so far, in SDK order.
    fn device_handles(&mut self) -> Result<Vec<DeviceInfo>>;

    /// Channel handles of one class for a device.
    fn channel_handles(
        &mut self,
        device: crate::DeviceHandle,
        class: ChannelClass,
    ) -> Result<Vec<ChannelHandle>>;

    /// Published name of a channel (e.g. "Pac").
    fn channel_name(&mut self, channel: ChannelHandle) -> Result<String>;

    /// Read one value, blocking for at most `max_age` when the cached value is stale.
    fn read_channel(
        &mut self,
        device: crate::DeviceHandle,
        channel: ChannelHandle,
        max_age: Duration,
    ) -> Result<ChannelReading>;
}
