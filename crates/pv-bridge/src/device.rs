use busitem_registry::{ChannelKeyMap, PointId};
use telemetry_provider::{ChannelClass, ChannelHandle, DeviceHandle, DeviceInfo};

/// Most devices tracked.
pub const DEVICE_MAX: usize = 50;
/// Most channels tracked per device across both classes.
pub const MAX_CHANNEL_COUNT: usize = 100;

/// Last known state of one provider channel.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelState {
    pub handle: ChannelHandle,
    pub name: String,
    pub class: ChannelClass,
    pub text: String,
    pub decimal: f64,
    pub timed_out: bool,
    targets: Option<Vec<PointId>>,
}

impl ChannelState {
    pub fn new(handle: ChannelHandle, name: String, class: ChannelClass) -> Self {
        Self {
            handle,
            name,
            class,
            text: String::new(),
            decimal: 0.0,
            timed_out: false,
            targets: None,
        }
    }

    /// Registry points fed by this channel. Looked up in the keymap on first use only.
    pub fn targets(&mut self, keymap: &ChannelKeyMap) -> &[PointId] {
        let name = &self.name;
        self.targets
            .get_or_insert_with(|| keymap.targets(name).to_vec())
    }

    pub fn is_resolved(&self) -> bool {
        self.targets.is_some()
    }
}

/// One detected device and the channels seen on it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceState {
    pub handle: DeviceHandle,
    pub name: String,
    /// Parameter channels were fetched successfully once.
    pub parameters_captured: bool,
    pub channels: Vec<ChannelState>,
    /// Reads attempted during the current pass.
    pub channels_read: usize,
    /// Reads that timed out during the current pass.
    pub channels_timed_out: usize,
}

impl DeviceState {
    pub fn new(info: DeviceInfo) -> Self {
        Self {
            handle: info.handle,
            name: info.name,
            parameters_captured: false,
            channels: Vec::new(),
            channels_read: 0,
            channels_timed_out: 0,
        }
    }

    pub fn begin_pass(&mut self) {
        self.channels_read = 0;
        self.channels_timed_out = 0;
    }

    /// At least one channel was read this pass and every read timed out.
    pub fn is_offline(&self) -> bool {
        self.channels_read > 0 && self.channels_timed_out >= self.channels_read
    }

    pub fn channel_index(&self, handle: ChannelHandle) -> Option<usize> {
        self.channels.iter().position(|c| c.handle == handle)
    }
}
