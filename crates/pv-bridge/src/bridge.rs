use crate::device::{ChannelState, DeviceState, DEVICE_MAX, MAX_CHANNEL_COUNT};
use crate::Result;
use busitem_registry::{ChangeSet, ChannelKeyMap, PointRegistry, PointUpdate};
use busitem_service::BusMetrics;
use std::time::Duration;
use telemetry_provider::{ChannelClass, DeviceInfo, TelemetryProvider};
use tracing::{debug, info, warn};

/// Moves channel readings into registry points and tracks per-channel timeouts.
pub struct TelemetryBridge {
    devices: Vec<DeviceState>,
    keymap: ChannelKeyMap,
    max_age: Duration,
    metrics: Option<BusMetrics>,
}

impl TelemetryBridge {
    pub fn new(keymap: ChannelKeyMap, max_age: Duration) -> Self {
        Self {
            devices: Vec::new(),
            keymap,
            max_age,
            metrics: None,
        }
    }

    pub fn set_metrics(&mut self, metrics: BusMetrics) {
        self.metrics = Some(metrics);
    }

    pub fn keymap(&self) -> &ChannelKeyMap {
        &self.keymap
    }

    /// Replace the device roster. Anything beyond `DEVICE_MAX` is dropped.
    pub fn record_devices(&mut self, mut devices: Vec<DeviceInfo>) {
        if devices.len() > DEVICE_MAX {
            warn!(found = devices.len(), max = DEVICE_MAX, "too many devices, ignoring the rest");
            devices.truncate(DEVICE_MAX);
        }
        for dev in &devices {
            info!(device = %dev.handle, name = %dev.name, "device recorded");
        }
        self.devices = devices.into_iter().map(DeviceState::new).collect();
    }

    pub fn devices(&self) -> &[DeviceState] {
        &self.devices
    }

    pub fn device_mut(&mut self, idx: usize) -> Option<&mut DeviceState> {
        self.devices.get_mut(idx)
    }

    /// Fetch one class of channels for the device at `idx`.
    ///
    /// Changed points are written to `registry` and collected in `changes`. Whenever a
    /// read times out or fails, `on_stall` runs before the next channel so that inbound
    /// requests keep being served. Returns `false` when the channel list could not be
    /// obtained; per-channel failures do not fail the fetch.
    pub fn fetch_device<P>(
        &mut self,
        idx: usize,
        class: ChannelClass,
        provider: &mut P,
        registry: &mut PointRegistry,
        changes: &mut ChangeSet,
        on_stall: &mut dyn FnMut(&PointRegistry) -> Result<()>,
    ) -> Result<bool>
    where
        P: TelemetryProvider + ?Sized,
    {
        let Self {
            devices,
            keymap,
            max_age,
            metrics,
        } = self;
        let Some(device) = devices.get_mut(idx) else {
            return Ok(false);
        };

        let mut handles = match provider.channel_handles(device.handle, class) {
            Ok(handles) => handles,
            Err(e) => {
                warn!(device = %device.handle, %class, "channel list unavailable: {e}");
                return Ok(false);
            }
        };
        if handles.len() > MAX_CHANNEL_COUNT {
            warn!(
                device = %device.handle,
                found = handles.len(),
                max = MAX_CHANNEL_COUNT,
                "too many channels, ignoring the rest"
            );
            handles.truncate(MAX_CHANNEL_COUNT);
        }
        debug!(device = %device.handle, %class, channels = handles.len(), "fetching");

        for handle in handles {
            let slot = match device.channel_index(handle) {
                Some(slot) => slot,
                None if device.channels.len() >= MAX_CHANNEL_COUNT => continue,
                None => match provider.channel_name(handle) {
                    Ok(name) => {
                        device.channels.push(ChannelState::new(handle, name, class));
                        device.channels.len() - 1
                    }
                    Err(e) => {
                        warn!(device = %device.handle, channel = %handle, "channel name unavailable: {e}");
                        continue;
                    }
                },
            };
            let channel = &mut device.channels[slot];
            let targets = channel.targets(keymap).to_vec();
            device.channels_read += 1;

            match provider.read_channel(device.handle, handle, *max_age) {
                Ok(reading) => {
                    if channel.timed_out {
                        info!(channel = %channel.name, "channel answering again");
                        channel.timed_out = false;
                    }
                    let text = reading.display_text();
                    channel.decimal = reading.value;
                    channel.text.clone_from(&text);
                    for id in targets {
                        if registry.differs(id, &text, reading.value)? {
                            registry.set_value(id, PointUpdate::reading(reading.value, text.clone()))?;
                            changes.mark(id);
                        }
                    }
                }
                Err(e) if e.is_timeout() => {
                    device.channels_timed_out += 1;
                    if let Some(m) = metrics.as_ref() {
                        m.channel_timeouts.inc();
                    }
                    if !channel.timed_out {
                        info!(channel = %channel.name, points = targets.len(), "channel timed out, blanking");
                        channel.timed_out = true;
                        for id in targets {
                            registry.blank(id)?;
                            changes.mark(id);
                        }
                    }
                    on_stall(registry)?;
                }
                Err(e) => {
                    warn!(channel = %channel.name, "read failed: {e}");
                    on_stall(registry)?;
                }
            }
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use busitem_registry::DEFAULT_KEYMAP;
    use telemetry_provider::{MockProvider, ScriptedRead};

    struct Fixture {
        registry: PointRegistry,
        bridge: TelemetryBridge,
        provider: MockProvider,
    }

    fn fixture(provider: MockProvider) -> Fixture {
        let registry = PointRegistry::with_default_schema().unwrap();
        let keymap = ChannelKeyMap::resolve(DEFAULT_KEYMAP, &registry);
        let mut bridge = TelemetryBridge::new(keymap, Duration::from_secs(5));
        let mut provider = provider;
        bridge.record_devices(provider.device_handles().unwrap());
        Fixture {
            registry,
            bridge,
            provider,
        }
    }

    fn fetch(f: &mut Fixture, class: ChannelClass, stalls: &mut usize) -> ChangeSet {
        let mut changes = ChangeSet::new();
        let mut on_stall = |_: &PointRegistry| -> Result<()> {
            *stalls += 1;
            Ok(())
        };
        f.bridge.device_mut(0).unwrap().begin_pass();
        let ok = f
            .bridge
            .fetch_device(0, class, &mut f.provider, &mut f.registry, &mut changes, &mut on_stall)
            .unwrap();
        assert!(ok);
        changes
    }

    fn text(reg: &PointRegistry, path: &str) -> String {
        reg.get(path).unwrap().text.clone()
    }

    #[test]
    fn parameter_fetch_fills_static_points() {
        let mut f = fixture(MockProvider::sma_inverter());
        let mut stalls = 0;
        let changes = fetch(&mut f, ChannelClass::Parameter, &mut stalls);
        assert_eq!(text(&f.registry, "/FirmwareVersion"), "2.30");
        assert_eq!(text(&f.registry, "/Serial"), "2001234567");
        assert_eq!(f.registry.get("/Serial").unwrap().unsigned, 2_001_234_567);
        // /Ac/MaxPower reads 3800.00 against a seeded "3800", so it changes once.
        assert_eq!(changes.len(), 3);
        assert_eq!(stalls, 0);
    }

    #[test]
    fn one_channel_feeds_all_its_points() {
        let mut f = fixture(MockProvider::sma_inverter());
        let mut stalls = 0;
        let changes = fetch(&mut f, ChannelClass::Spot, &mut stalls);
        assert_eq!(text(&f.registry, "/Ac/Power"), "1512.00");
        assert_eq!(text(&f.registry, "/Ac/L1/Power"), "1512.00");
        assert_eq!(text(&f.registry, "/Ac/Energy/Forward"), "14523.60");
        assert_eq!(text(&f.registry, "/StatusCode"), "Mpp");
        assert_eq!(f.registry.get("/Ac/Frequency").unwrap().decimal, 50.01);
        // Pac x2, Uac, Iac-Ist, Fac, Upv-Soll, E-Total x2, Status
        assert_eq!(changes.len(), 9);
    }

    #[test]
    fn unchanged_readings_are_not_recollected() {
        let mut provider = MockProvider::new();
        let dev = provider.add_device("inv");
        provider.add_channel(dev, "Upv-Soll", ChannelClass::Spot, [ScriptedRead::value(320.0)]);
        let mut f = fixture(provider);
        let mut stalls = 0;
        assert_eq!(fetch(&mut f, ChannelClass::Spot, &mut stalls).len(), 1);
        assert!(fetch(&mut f, ChannelClass::Spot, &mut stalls).is_empty());
    }

    #[test]
    fn first_timeout_blanks_then_stays_silent() {
        let mut provider = MockProvider::new();
        let dev = provider.add_device("inv");
        let pac = provider.add_channel(
            dev,
            "Pac",
            ChannelClass::Spot,
            [ScriptedRead::value(1500.0), ScriptedRead::Timeout],
        );
        let mut f = fixture(provider);
        let mut stalls = 0;

        fetch(&mut f, ChannelClass::Spot, &mut stalls);
        assert_eq!(text(&f.registry, "/Ac/Power"), "1500.00");

        let changes = fetch(&mut f, ChannelClass::Spot, &mut stalls);
        assert_eq!(changes.len(), 2);
        let power = f.registry.get("/Ac/Power").unwrap();
        assert_eq!((power.text.as_str(), power.decimal, power.unsigned), ("", 0.0, 0));
        assert!(f.bridge.devices()[0].is_offline());
        assert_eq!(stalls, 1);

        assert!(fetch(&mut f, ChannelClass::Spot, &mut stalls).is_empty());
        assert_eq!(stalls, 2);

        f.provider
            .push_reads(pac, [ScriptedRead::value(1400.0)])
            .unwrap();
        let changes = fetch(&mut f, ChannelClass::Spot, &mut stalls);
        assert_eq!(changes.len(), 2);
        assert_eq!(text(&f.registry, "/Ac/Power"), "1400.00");
        assert!(!f.bridge.devices()[0].channels[0].timed_out);
    }

    #[test]
    fn read_errors_pump_without_blanking() {
        let mut provider = MockProvider::new();
        let dev = provider.add_device("inv");
        provider.add_channel(
            dev,
            "Pac",
            ChannelClass::Spot,
            [ScriptedRead::Error("bus collision".into())],
        );
        let mut f = fixture(provider);
        let mut stalls = 0;
        let changes = fetch(&mut f, ChannelClass::Spot, &mut stalls);
        assert!(changes.is_empty());
        assert_eq!(stalls, 1);
        assert_eq!(text(&f.registry, "/Ac/Power"), "0");
    }

    #[test]
    fn unlisted_device_fails_the_fetch() {
        let mut provider = MockProvider::new();
        let dev = provider.add_device("inv");
        provider.set_unlisted(dev, true).unwrap();
        let mut f = fixture(provider);
        let mut changes = ChangeSet::new();
        let ok = f
            .bridge
            .fetch_device(
                0,
                ChannelClass::Parameter,
                &mut f.provider,
                &mut f.registry,
                &mut changes,
                &mut |_| Ok(()),
            )
            .unwrap();
        assert!(!ok);
    }
}
