use std::time::Duration;

pub const DEFAULT_PROBE_INTERVAL: Duration = Duration::from_millis(1500);
pub const OFFLINE_PROBE_INTERVAL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_PUMP_WAIT: Duration = Duration::from_millis(1500);
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(5);

/// Timing and discovery parameters of the poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Interval between passes while the device answers.
    pub default_probe_interval: Duration,
    /// Interval adopted after a pass in which every channel of a device timed out.
    pub offline_probe_interval: Duration,
    /// Upper bound on waiting for one inbound bus request per loop iteration.
    pub pump_wait: Duration,
    /// Oldest cached channel value the provider may return without a fresh read.
    pub max_age: Duration,
    pub expected_devices: usize,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            default_probe_interval: DEFAULT_PROBE_INTERVAL,
            offline_probe_interval: OFFLINE_PROBE_INTERVAL,
            pump_wait: DEFAULT_PUMP_WAIT,
            max_age: DEFAULT_MAX_AGE,
            expected_devices: 1,
        }
    }
}
