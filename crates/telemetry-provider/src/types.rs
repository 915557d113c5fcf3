use core::fmt;

/// Opaque handle the SDK hands out for a detected device.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct DeviceHandle(pub u32);

/// Opaque handle for one telemetry channel of a device.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ChannelHandle(pub u32);

impl fmt::Display for DeviceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ChannelHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parameter channels are static and read once; spot channels are re-read every cycle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ChannelClass {
    Parameter,
    Spot,
}

impl fmt::Display for ChannelClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelClass::Parameter => f.write_str("parameter"),
            ChannelClass::Spot => f.write_str("spot"),
        }
    }
}

/// Outcome of `start_detection`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DetectionStatus {
    Complete,
    InProgress,
    Partial,
}

/// Asynchronous notifications emitted while devices are being detected.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DetectionEvent {
    DeviceAdded(DeviceHandle),
    DeviceRemoved(DeviceHandle),
    SearchEnd,
    ChannelListDownload,
}

/// Callback invoked by the provider for every detection event, possibly from an SDK thread.
pub type DetectionListener = Box<dyn Fn(DetectionEvent) + Send + Sync>;

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeviceInfo {
    pub handle: DeviceHandle,
    pub name: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DriverInfo {
    pub name: String,
    pub online: bool,
}

/// A successful channel read: the numeric value plus the SDK's textual rendering, if any.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelReading {
    pub value: f64,
    pub text: Option<String>,
}

impl ChannelReading {
    pub fn numeric(value: f64) -> Self {
        Self { value, text: None }
    }

    pub fn with_text(value: f64, text: impl Into<String>) -> Self {
        Self {
            value,
            text: Some(text.into()),
        }
    }

    /// Text to publish: the SDK's text when present, otherwise the value to two decimals.
    pub fn display_text(&self) -> String {
        match self.text.as_deref() {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => format!("{:.2}", self.value),
        }
    }
}
