use anyhow::{bail, Context, Result};
use busitem_registry::{PointDefault, PointRegistry};
use busitem_service::DEFAULT_SERVICE_NAME;
use clap::ValueEnum;
use pv_bridge::BridgeConfig;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BusChoice {
    System,
    Session,
}

/// Replacement default for one point: a number, or a text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OverrideValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DaemonConfig {
    pub service_name: String,
    pub bus: BusChoice,
    pub default_probe_interval_ms: u64,
    pub offline_probe_interval_ms: u64,
    pub pump_wait_ms: u64,
    pub max_age_secs: u64,
    pub expected_devices: usize,
    pub overrides: BTreeMap<String, OverrideValue>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        let bridge = BridgeConfig::default();
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            bus: BusChoice::System,
            default_probe_interval_ms: bridge.default_probe_interval.as_millis() as u64,
            offline_probe_interval_ms: bridge.offline_probe_interval.as_millis() as u64,
            pump_wait_ms: bridge.pump_wait.as_millis() as u64,
            max_age_secs: bridge.max_age.as_secs(),
            expected_devices: bridge.expected_devices,
            overrides: BTreeMap::new(),
        }
    }
}

impl DaemonConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config: {}", path.display()))?;
        Self::from_yaml(&raw).with_context(|| format!("parsing config: {}", path.display()))
    }

    pub fn from_yaml(raw: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            default_probe_interval: Duration::from_millis(self.default_probe_interval_ms),
            offline_probe_interval: Duration::from_millis(self.offline_probe_interval_ms),
            pump_wait: Duration::from_millis(self.pump_wait_ms),
            max_age: Duration::from_secs(self.max_age_secs),
            expected_devices: self.expected_devices,
        }
    }

    /// Reseed the configured points. Fails on a path the schema does not define.
    pub fn apply_overrides(&self, registry: &mut PointRegistry) -> Result<()> {
        for (path, value) in &self.overrides {
            let Ok(point) = registry.get(path) else {
                bail!("override for unknown path {path}");
            };
            let default = match value {
                OverrideValue::Number(number) => PointDefault {
                    number: *number,
                    text: None,
                },
                OverrideValue::Text(text) => PointDefault {
                    number: point.default.number,
                    text: Some(text.clone()),
                },
            };
            registry
                .apply_override(path, default)
                .with_context(|| format!("applying override for {path}"))?;
            tracing::debug!(path = %path, "default overridden");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = DaemonConfig::from_yaml("{}").unwrap();
        assert_eq!(cfg, DaemonConfig::default());
        assert_eq!(cfg.bridge_config(), BridgeConfig::default());
        assert_eq!(cfg.service_name, "com.victronenergy.pvinverter.smanet");
    }

    #[test]
    fn parses_full_document() {
        let raw = r#"
service_name: com.victronenergy.pvinverter.roof
bus: session
default_probe_interval_ms: 1000
offline_probe_interval_ms: 60000
pump_wait_ms: 250
max_age_secs: 3
expected_devices: 2
overrides:
  /CustomName: "Roof array"
  /DeviceInstance: 21
  /Ac/MaxPower: 5000
"#;
        let cfg = DaemonConfig::from_yaml(raw).unwrap();
        assert_eq!(cfg.bus, BusChoice::Session);
        let bridge = cfg.bridge_config();
        assert_eq!(bridge.offline_probe_interval, Duration::from_secs(60));
        assert_eq!(bridge.pump_wait, Duration::from_millis(250));
        assert_eq!(bridge.expected_devices, 2);
        assert_eq!(
            cfg.overrides.get("/DeviceInstance"),
            Some(&OverrideValue::Number(21.0))
        );
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DaemonConfig::from_yaml("probe: 3").is_err());
    }

    #[test]
    fn overrides_reseed_points() {
        let cfg = DaemonConfig::from_yaml(
            "overrides:\n  /CustomName: Garage\n  /Ac/MaxPower: 5000\n  /DeviceInstance: 21\n",
        )
        .unwrap();
        let mut reg = PointRegistry::with_default_schema().unwrap();
        cfg.apply_overrides(&mut reg).unwrap();
        assert_eq!(reg.get("/CustomName").unwrap().text, "Garage");
        let max = reg.get("/Ac/MaxPower").unwrap();
        assert_eq!((max.text.as_str(), max.unsigned), ("5000", 5000));
        // A numeric override drops the compiled-in text.
        assert_eq!(reg.get("/DeviceInstance").unwrap().text, "21");
    }

    #[test]
    fn override_of_unknown_path_fails() {
        let cfg = DaemonConfig::from_yaml("overrides:\n  /Ac/L3/Power: 1\n").unwrap();
        let mut reg = PointRegistry::with_default_schema().unwrap();
        assert!(cfg.apply_overrides(&mut reg).is_err());
    }
}
