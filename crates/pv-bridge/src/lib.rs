//! pv-bridge: keeps bus-item points fresh from a telemetry provider
//!
//! `TelemetryBridge` reads provider channels into registry points and tracks
//! per-channel timeouts; `PollScheduler` owns the whole context and alternates
//! between serving one bus request and running a poll pass on its probe interval.

mod error;
pub use error::{BridgeError, Result};

mod config;
pub use config::{
    BridgeConfig, DEFAULT_MAX_AGE, DEFAULT_PROBE_INTERVAL, DEFAULT_PUMP_WAIT,
    OFFLINE_PROBE_INTERVAL,
};

mod device;
pub use device::{ChannelState, DeviceState, DEVICE_MAX, MAX_CHANNEL_COUNT};

mod bridge;
pub use bridge::TelemetryBridge;

mod scheduler;
pub use scheduler::{PassReport, PollScheduler};
