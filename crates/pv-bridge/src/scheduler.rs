use crate::{BridgeConfig, Result, TelemetryBridge};
use busitem_registry::{
    ChangeSet, ChannelKeyMap, KeyMapEntry, PathTree, PointRegistry, DEFAULT_KEYMAP,
};
use busitem_service::{BusService, BusTransport, MetricsHub};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use telemetry_provider::{ChannelClass, DetectionEvent, DetectionStatus, TelemetryProvider};
use tracing::{debug, info, warn};

/// Summary of one poll pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassReport {
    /// Device search had not finished; nothing was fetched.
    pub searching: bool,
    pub changed: usize,
    pub notified: bool,
    pub probe_interval: Duration,
}

/// Single-threaded loop alternating between serving bus requests and polling devices.
pub struct PollScheduler<P, T> {
    registry: PointRegistry,
    tree: PathTree,
    bridge: TelemetryBridge,
    provider: P,
    service: BusService<T>,
    config: BridgeConfig,
    metrics: Option<MetricsHub>,
    search_complete: Arc<AtomicBool>,
    discovery_complete: bool,
    last_probe: Option<Instant>,
    probe_interval: Duration,
}

impl<P, T> PollScheduler<P, T>
where
    P: TelemetryProvider,
    T: BusTransport,
{
    pub fn new(
        registry: PointRegistry,
        provider: P,
        transport: T,
        config: BridgeConfig,
    ) -> Result<Self> {
        Self::with_keymap(registry, DEFAULT_KEYMAP, provider, transport, config)
    }

    pub fn with_keymap(
        registry: PointRegistry,
        keymap: &[KeyMapEntry],
        mut provider: P,
        transport: T,
        config: BridgeConfig,
    ) -> Result<Self> {
        let tree = PathTree::build(&registry)?;
        let keymap = ChannelKeyMap::resolve(keymap, &registry);
        info!(
            points = registry.len(),
            nodes = tree.node_count(),
            channels = keymap.len(),
            "object model ready"
        );

        let search_complete = Arc::new(AtomicBool::new(false));
        let flag = search_complete.clone();
        provider.set_detection_listener(Box::new(move |event| match event {
            DetectionEvent::DeviceAdded(h) => info!(device = %h, "device detected"),
            DetectionEvent::DeviceRemoved(h) => info!(device = %h, "device removed"),
            DetectionEvent::SearchEnd => {
                info!("device search finished");
                flag.store(true, Ordering::SeqCst);
            }
            DetectionEvent::ChannelListDownload => debug!("downloading channel lists"),
        }));

        Ok(Self {
            bridge: TelemetryBridge::new(keymap, config.max_age),
            probe_interval: config.default_probe_interval,
            registry,
            tree,
            provider,
            service: BusService::new(transport),
            config,
            metrics: None,
            search_complete,
            discovery_complete: false,
            last_probe: None,
        })
    }

    /// Count requests, signals and timeouts into `hub`.
    pub fn with_metrics(mut self, hub: MetricsHub) -> Self {
        hub.bus.points.set(self.registry.len() as i64);
        self.bridge.set_metrics(hub.bus.clone());
        self.service.set_metrics(hub.bus.clone());
        self.metrics = Some(hub);
        self
    }

    /// Bring the drivers online and begin device detection.
    pub fn start(&mut self) -> Result<()> {
        let drivers = self.provider.open_drivers()?;
        for d in &drivers {
            info!(driver = %d.name, online = d.online, "driver");
        }
        let expected = self.config.expected_devices;
        match self.provider.start_detection(expected)? {
            DetectionStatus::Complete => {}
            DetectionStatus::InProgress => info!(expected, "device search running"),
            DetectionStatus::Partial => warn!(expected, "fewer devices found than expected"),
        }
        Ok(())
    }

    /// Serve at most one request, then poll if the probe interval has elapsed.
    /// Returns whether a poll pass ran.
    pub fn run_once(&mut self) -> Result<bool> {
        self.service
            .pump_once(&self.registry, &self.tree, self.config.pump_wait)?;
        let due = self
            .last_probe
            .map_or(true, |at| at.elapsed() > self.probe_interval);
        if due {
            self.poll_pass()?;
        }
        Ok(due)
    }

    /// Loop until `stop` is raised.
    pub fn run(&mut self, stop: &AtomicBool) -> Result<()> {
        info!(service = self.service.service_name(), "poll loop started");
        while !stop.load(Ordering::SeqCst) {
            self.run_once()?;
        }
        info!("poll loop stopped");
        Ok(())
    }

    /// One poll pass over every known device, followed by at most one change broadcast.
    pub fn poll_pass(&mut self) -> Result<PassReport> {
        if !self.search_complete.load(Ordering::SeqCst) {
            info!("device search pending");
            self.last_probe = Some(Instant::now());
            return Ok(PassReport {
                searching: true,
                changed: 0,
                notified: false,
                probe_interval: self.probe_interval,
            });
        }
        if !self.discovery_complete {
            match self.provider.device_handles() {
                Ok(devices) => {
                    self.bridge.record_devices(devices);
                    self.discovery_complete = true;
                }
                Err(e) => warn!("no devices found, retrying next pass: {e}"),
            }
        }

        let mut changes = ChangeSet::new();
        let Self {
            registry,
            tree,
            bridge,
            provider,
            service,
            config,
            probe_interval,
            ..
        } = self;
        let mut pump = |reg: &PointRegistry| -> Result<()> {
            service.pump_once(reg, tree, Duration::ZERO)?;
            Ok(())
        };

        for idx in 0..bridge.devices().len() {
            let captured = match bridge.device_mut(idx) {
                Some(dev) => {
                    dev.begin_pass();
                    dev.parameters_captured
                }
                None => continue,
            };
            // One class per device and pass: parameters until captured, spot values after.
            let class = if captured {
                ChannelClass::Spot
            } else {
                ChannelClass::Parameter
            };
            let fetched =
                bridge.fetch_device(idx, class, provider, registry, &mut changes, &mut pump)?;

            let Some(dev) = bridge.device_mut(idx) else {
                continue;
            };
            if fetched && !captured {
                info!(device = %dev.handle, "parameters captured");
                dev.parameters_captured = true;
            }
            let offline = dev.is_offline();
            let next = if offline {
                config.offline_probe_interval
            } else {
                config.default_probe_interval
            };
            if next != *probe_interval {
                info!(interval_ms = next.as_millis() as u64, offline, "probe interval changed");
            }
            *probe_interval = next;
        }

        let notified = service.notify(registry, &changes)?;
        debug!(changed = changes.len(), notified, "pass complete");
        self.last_probe = Some(Instant::now());
        Ok(PassReport {
            searching: false,
            changed: changes.len(),
            notified,
            probe_interval: self.probe_interval,
        })
    }

    /// Take the drivers offline.
    pub fn shutdown(&mut self) {
        self.provider.close_drivers();
        info!(signals = self.service.signals_emitted(), "provider closed");
    }

    pub fn registry(&self) -> &PointRegistry {
        &self.registry
    }

    pub fn tree(&self) -> &PathTree {
        &self.tree
    }

    pub fn bridge(&self) -> &TelemetryBridge {
        &self.bridge
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn provider_mut(&mut self) -> &mut P {
        &mut self.provider
    }

    pub fn service(&self) -> &BusService<T> {
        &self.service
    }

    pub fn service_mut(&mut self) -> &mut BusService<T> {
        &mut self.service
    }

    pub fn metrics(&self) -> Option<&MetricsHub> {
        self.metrics.as_ref()
    }

    pub fn probe_interval(&self) -> Duration {
        self.probe_interval
    }

    pub fn search_complete(&self) -> bool {
        self.search_complete.load(Ordering::SeqCst)
    }
}
