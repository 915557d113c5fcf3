//! telemetry-provider: device detection and channel reading abstractions
//!
//! This crate describes the boundary to a field-bus telemetry SDK: starting device
//! detection, enumerating device and channel handles, and reading channel values with
//! a bounded "max age". The default build enables a scripted `mock` backend so that
//! binaries and tests run on any host without the vendor library.

mod types;
pub use types::{
    ChannelClass, ChannelHandle, ChannelReading, DetectionEvent, DetectionListener,
    DetectionStatus, DeviceHandle, DeviceInfo, DriverInfo,
};

mod error;
pub use error::{ProviderError, Result};

mod traits;
pub use traits::TelemetryProvider;

#[cfg(feature = "mock")]
mod mock;

#[cfg(feature = "mock")]
pub use mock::{MockChannel, MockDevice, MockProvider, ScriptedRead};
