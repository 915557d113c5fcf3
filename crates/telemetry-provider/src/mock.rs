use crate::{
    ChannelClass, ChannelHandle, ChannelReading, DetectionEvent, DetectionListener,
    DetectionStatus, DeviceHandle, DeviceInfo, DriverInfo, ProviderError, Result,
    TelemetryProvider,
};
use std::time::Duration;
use tracing::debug;

/// One scripted answer to `read_channel`.
#[derive(Clone, Debug, PartialEq)]
pub enum ScriptedRead {
    Value(ChannelReading),
    Timeout,
    Error(String),
}

impl ScriptedRead {
    pub fn value(value: f64) -> Self {
        ScriptedRead::Value(ChannelReading::numeric(value))
    }

    pub fn text(value: f64, text: &str) -> Self {
        ScriptedRead::Value(ChannelReading::with_text(value, text))
    }
}

/// A scripted channel. Reads walk the script; once exhausted the last entry repeats,
/// or the script restarts when `cycle` is set.
#[derive(Clone, Debug)]
pub struct MockChannel {
    pub handle: ChannelHandle,
    pub name: String,
    pub class: ChannelClass,
    script: Vec<ScriptedRead>,
    cursor: usize,
    cycle: bool,
}

impl MockChannel {
    fn next_read(&mut self) -> ScriptedRead {
        let Some(last) = self.script.len().checked_sub(1) else {
            return ScriptedRead::Timeout;
        };
        let idx = if self.cursor > last {
            if self.cycle {
                self.cursor = 0;
                0
            } else {
                last
            }
        } else {
            self.cursor
        };
        self.cursor = idx + 1;
        self.script[idx].clone()
    }
}

#[derive(Clone, Debug)]
pub struct MockDevice {
    pub info: DeviceInfo,
    pub channels: Vec<MockChannel>,
    /// When set, `channel_handles` fails for this device.
    pub unlisted: bool,
}

/// In-process provider with scripted devices and channels. Each instance is independent.
pub struct MockProvider {
    devices: Vec<MockDevice>,
    drivers: Vec<DriverInfo>,
    listener: Option<DetectionListener>,
    hold_search: bool,
    /// When set, `device_handles` fails.
    roster_unavailable: bool,
    next_handle: u32,
    reads: usize,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            devices: Vec::new(),
            drivers: vec![DriverInfo {
                name: "mock-rs485".to_string(),
                online: false,
            }],
            listener: None,
            hold_search: false,
            roster_unavailable: false,
            next_handle: 1,
            reads: 0,
        }
    }

    /// A provider whose driver list is empty, so `open_drivers` fails.
    pub fn without_drivers() -> Self {
        Self {
            drivers: Vec::new(),
            ..Self::new()
        }
    }

    /// A single SMA-style inverter with the parameter and spot channels the default keymap expects.
    pub fn sma_inverter() -> Self {
        let mut provider = Self::new();
        let dev = provider.add_device("WR38-012 SN:2001234567");
        provider.add_channel(dev, "Plimit", ChannelClass::Parameter, [ScriptedRead::value(3800.0)]);
        provider.add_channel(
            dev,
            "Software-BFR",
            ChannelClass::Parameter,
            [ScriptedRead::text(2.3, "2.30")],
        );
        provider.add_channel(
            dev,
            "Seriennummer",
            ChannelClass::Parameter,
            [ScriptedRead::text(2001234567.0, "2001234567")],
        );
        provider.add_cycling_channel(
            dev,
            "Pac",
            ChannelClass::Spot,
            [1512.0, 1524.0, 1498.0, 1530.0].map(ScriptedRead::value),
        );
        provider.add_cycling_channel(
            dev,
            "Uac",
            ChannelClass::Spot,
            [231.4, 231.9, 230.8].map(ScriptedRead::value),
        );
        provider.add_cycling_channel(
            dev,
            "Iac-Ist",
            ChannelClass::Spot,
            [6.53, 6.57, 6.49].map(ScriptedRead::value),
        );
        provider.add_cycling_channel(
            dev,
            "Fac",
            ChannelClass::Spot,
            [50.01, 49.99, 50.0].map(ScriptedRead::value),
        );
        provider.add_channel(dev, "Upv-Soll", ChannelClass::Spot, [ScriptedRead::value(320.0)]);
        provider.add_channel(dev, "E-Total", ChannelClass::Spot, [ScriptedRead::value(14523.6)]);
        provider.add_channel(dev, "Status", ChannelClass::Spot, [ScriptedRead::text(0.0, "Mpp")]);
        provider
    }

    pub fn add_device(&mut self, name: &str) -> DeviceHandle {
        let handle = DeviceHandle(self.alloc_handle());
        self.devices.push(MockDevice {
            info: DeviceInfo {
                handle,
                name: name.to_string(),
            },
            channels: Vec::new(),
            unlisted: false,
        });
        handle
    }

    pub fn add_channel(
        &mut self,
        device: DeviceHandle,
        name: &str,
        class: ChannelClass,
        script: impl IntoIterator<Item = ScriptedRead>,
    ) -> ChannelHandle {
        self.insert_channel(device, name, class, script.into_iter().collect(), false)
    }

    pub fn add_cycling_channel(
        &mut self,
        device: DeviceHandle,
        name: &str,
        class: ChannelClass,
        script: impl IntoIterator<Item = ScriptedRead>,
    ) -> ChannelHandle {
        self.insert_channel(device, name, class, script.into_iter().collect(), true)
    }

    /// Append reads to a channel's script; they are served after the pending ones.
    pub fn push_reads(
        &mut self,
        channel: ChannelHandle,
        reads: impl IntoIterator<Item = ScriptedRead>,
    ) -> Result<()> {
        let ch = self
            .devices
            .iter_mut()
            .flat_map(|d| d.channels.iter_mut())
            .find(|c| c.handle == channel)
            .ok_or(ProviderError::ChannelNotFound(channel.0))?;
        ch.script.extend(reads);
        Ok(())
    }

    /// Make `channel_handles` fail for a device.
    pub fn set_unlisted(&mut self, device: DeviceHandle, unlisted: bool) -> Result<()> {
        let dev = self.device_mut(device)?;
        dev.unlisted = unlisted;
        Ok(())
    }

    /// Make `device_handles` fail until cleared.
    pub fn set_roster_unavailable(&mut self, unavailable: bool) {
        self.roster_unavailable = unavailable;
    }

    /// Keep the device search open until `finish_search` is called.
    pub fn hold_search(&mut self) {
        self.hold_search = true;
    }

    pub fn finish_search(&mut self) {
        self.hold_search = false;
        self.emit(DetectionEvent::SearchEnd);
    }

    /// Total number of `read_channel` calls served.
    pub fn reads(&self) -> usize {
        self.reads
    }

    fn alloc_handle(&mut self) -> u32 {
        let h = self.next_handle;
        self.next_handle += 1;
        h
    }

    fn insert_channel(
        &mut self,
        device: DeviceHandle,
        name: &str,
        class: ChannelClass,
        script: Vec<ScriptedRead>,
        cycle: bool,
    ) -> ChannelHandle {
        let handle = ChannelHandle(self.alloc_handle());
        if let Ok(dev) = self.device_mut(device) {
            dev.channels.push(MockChannel {
                handle,
                name: name.to_string(),
                class,
                script,
                cursor: 0,
                cycle,
            });
        }
        handle
    }

    fn device_mut(&mut self, device: DeviceHandle) -> Result<&mut MockDevice> {
        self.devices
            .iter_mut()
            .find(|d| d.info.handle == device)
            .ok_or(ProviderError::DeviceNotFound(device.0))
    }

    fn emit(&self, event: DetectionEvent) {
        if let Some(listener) = &self.listener {
            listener(event);
        }
    }
}

impl TelemetryProvider for MockProvider {
    fn open_drivers(&mut self) -> Result<Vec<DriverInfo>> {
        if self.drivers.is_empty() {
            return Err(ProviderError::NoDrivers);
        }
        for driver in &mut self.drivers {
            driver.online = true;
        }
        Ok(self.drivers.clone())
    }

    fn close_drivers(&mut self) {
        for driver in &mut self.drivers {
            driver.online = false;
        }
    }

    fn set_detection_listener(&mut self, listener: DetectionListener) {
        self.listener = Some(listener);
    }

    fn start_detection(&mut self, expected: usize) -> Result<DetectionStatus> {
        for dev in &self.devices {
            self.emit(DetectionEvent::DeviceAdded(dev.info.handle));
        }
        if self.hold_search {
            return Ok(DetectionStatus::InProgress);
        }
        self.emit(DetectionEvent::SearchEnd);
        if self.devices.len() < expected {
            Ok(DetectionStatus::Partial)
        } else {
            Ok(DetectionStatus::Complete)
        }
    }

    fn device_handles(&mut self) -> Result<Vec<DeviceInfo>> {
        if self.roster_unavailable {
            return Err(ProviderError::Backend("device list unavailable".into()));
        }
        Ok(self.devices.iter().map(|d| d.info.clone()).collect())
    }

    fn channel_handles(
        &mut self,
        device: DeviceHandle,
        class: ChannelClass,
    ) -> Result<Vec<ChannelHandle>> {
        let dev = self.device_mut(device)?;
        if dev.unlisted {
            return Err(ProviderError::Backend(format!(
                "channel list unavailable for device {device}"
            )));
        }
        Ok(dev
            .channels
            .iter()
            .filter(|c| c.class == class)
            .map(|c| c.handle)
            .collect())
    }

    fn channel_name(&mut self, channel: ChannelHandle) -> Result<String> {
        self.devices
            .iter()
            .flat_map(|d| d.channels.iter())
            .find(|c| c.handle == channel)
            .map(|c| c.name.clone())
            .ok_or(ProviderError::ChannelNotFound(channel.0))
    }

    fn read_channel(
        &mut self,
        device: DeviceHandle,
        channel: ChannelHandle,
        max_age: Duration,
    ) -> Result<ChannelReading> {
        self.reads += 1;
        let dev = self.device_mut(device)?;
        let ch = dev
            .channels
            .iter_mut()
            .find(|c| c.handle == channel)
            .ok_or(ProviderError::ChannelNotFound(channel.0))?;
        debug!(channel = %ch.name, ?max_age, "mock read");
        match ch.next_read() {
            ScriptedRead::Value(reading) => Ok(reading),
            ScriptedRead::Timeout => Err(ProviderError::Timeout),
            ScriptedRead::Error(msg) => Err(ProviderError::Backend(msg)),
        }
    }
}
