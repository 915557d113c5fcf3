use crate::{PointId, PointRegistry};
use std::collections::HashMap;
use tracing::warn;

/// Most registry points a single channel may feed.
pub const POINTS_PER_CHANNEL: usize = 3;

/// One `channel -> path` association.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyMapEntry {
    pub path: &'static str,
    pub channel: &'static str,
}

impl KeyMapEntry {
    pub const fn new(path: &'static str, channel: &'static str) -> Self {
        Self { path, channel }
    }
}

/// Keymap resolved against a registry: channel name to the point ids it updates.
#[derive(Debug, Clone, Default)]
pub struct ChannelKeyMap {
    targets: HashMap<String, Vec<PointId>>,
    unresolved: Vec<KeyMapEntry>,
}

impl ChannelKeyMap {
    /// Entries whose path is missing from the registry are logged once and left inert.
    pub fn resolve(entries: &[KeyMapEntry], registry: &PointRegistry) -> Self {
        let mut map = Self::default();
        for entry in entries {
            let Some(id) = registry.find(entry.path) else {
                warn!(path = entry.path, channel = entry.channel, "keymap target not in registry");
                map.unresolved.push(*entry);
                continue;
            };
            let ids = map.targets.entry(entry.channel.to_string()).or_default();
            if ids.contains(&id) {
                continue;
            }
            if ids.len() >= POINTS_PER_CHANNEL {
                warn!(
                    channel = entry.channel,
                    path = entry.path,
                    max = POINTS_PER_CHANNEL,
                    "channel already feeds the maximum number of points"
                );
                continue;
            }
            ids.push(id);
        }
        map
    }

    /// Point ids fed by `channel`, empty when the channel is unmapped.
    pub fn targets(&self, channel: &str) -> &[PointId] {
        self.targets.get(channel).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn unresolved(&self) -> &[KeyMapEntry] {
        &self.unresolved
    }

    /// Number of mapped channels.
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_KEYMAP;

    #[test]
    fn default_keymap_resolves_fully() {
        let reg = PointRegistry::with_default_schema().unwrap();
        let map = ChannelKeyMap::resolve(DEFAULT_KEYMAP, &reg);
        assert!(map.unresolved().is_empty());
        assert_eq!(map.len(), 10);

        let pac: Vec<&str> = map
            .targets("Pac")
            .iter()
            .map(|id| reg.point(*id).unwrap().path.as_str())
            .collect();
        assert_eq!(pac, vec!["/Ac/L1/Power", "/Ac/Power"]);
        assert_eq!(map.targets("E-Total").len(), 2);
        assert!(map.targets("Unknown").is_empty());
    }

    #[test]
    fn missing_target_is_inert() {
        let reg = PointRegistry::with_default_schema().unwrap();
        let entries = [
            KeyMapEntry::new("/Ac/L9/Voltage", "Uac2"),
            KeyMapEntry::new("/Ac/Power", "Pac"),
        ];
        let map = ChannelKeyMap::resolve(&entries, &reg);
        assert_eq!(map.unresolved(), &entries[..1]);
        assert!(map.targets("Uac2").is_empty());
        assert_eq!(map.targets("Pac").len(), 1);
    }

    #[test]
    fn fan_out_per_channel_is_capped() {
        let reg = PointRegistry::with_default_schema().unwrap();
        let entries = [
            KeyMapEntry::new("/Ac/Power", "X"),
            KeyMapEntry::new("/Ac/L1/Power", "X"),
            KeyMapEntry::new("/Ac/MaxPower", "X"),
            KeyMapEntry::new("/Latency", "X"),
            KeyMapEntry::new("/Ac/Power", "X"),
        ];
        let map = ChannelKeyMap::resolve(&entries, &reg);
        assert_eq!(map.targets("X").len(), POINTS_PER_CHANNEL);
    }
}
