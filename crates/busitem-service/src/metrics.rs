use prometheus::core::Collector;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};

/// Counters shared by the service and the telemetry bridge feeding it.
#[derive(Clone)]
pub struct BusMetrics {
    pub requests: IntCounter,
    pub invalid: IntCounter,
    pub declined: IntCounter,
    pub signals: IntCounter,
    pub channel_timeouts: IntCounter,
    pub points: IntGauge,
}

#[derive(Clone)]
pub struct MetricsHub {
    pub registry: Registry,
    pub bus: BusMetrics,
}

fn counter(name: &str, help: &str) -> Result<IntCounter, String> {
    IntCounter::new(name, help).map_err(|e| format!("metrics init error: {e}"))
}

fn register<C>(registry: &Registry, collector: &C) -> Result<(), String>
where
    C: Collector + Clone + 'static,
{
    registry
        .register(Box::new(collector.clone()))
        .map_err(|e| format!("metrics register error: {e}"))
}

impl MetricsHub {
    pub fn new() -> Result<Self, String> {
        Self::with_registry(Registry::new())
    }

    /// Register the bus metrics into an existing registry.
    pub fn with_registry(registry: Registry) -> Result<Self, String> {
        let points = IntGauge::new("pvb_points_published", "Number of registry points on the bus")
            .map_err(|e| format!("metrics init error: {e}"))?;
        let bus = BusMetrics {
            requests: counter("pvb_bus_requests", "Bus requests answered")?,
            invalid: counter("pvb_bus_invalid_replies", "Requests answered with an empty reply")?,
            declined: counter("pvb_bus_declined", "Requests left unanswered")?,
            signals: counter("pvb_items_changed_signals", "ItemsChanged signals emitted")?,
            channel_timeouts: counter("pvb_channel_timeouts", "Telemetry channel read timeouts")?,
            points,
        };
        register(&registry, &bus.requests)?;
        register(&registry, &bus.invalid)?;
        register(&registry, &bus.declined)?;
        register(&registry, &bus.signals)?;
        register(&registry, &bus.channel_timeouts)?;
        register(&registry, &bus.points)?;
        Ok(Self { registry, bus })
    }

    pub fn encode_text(&self) -> String {
        let mut buf = Vec::new();
        let encoder = TextEncoder::new();
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buf) {
            return format!("error encoding metrics: {e}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }
}
