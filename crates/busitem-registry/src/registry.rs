use crate::point::{PointDefault, PointId, PointSpec, PointUpdate, RegistryPoint};
use crate::schema::DEFAULT_SCHEMA;
use crate::wire::{ItemRecord, WireValue};
use crate::{RegistryError, Result};
use std::collections::HashMap;
use tracing::debug;

/// Owns every point and its live value. Ids are dense indices into `points`.
#[derive(Debug, Clone, Default)]
pub struct PointRegistry {
    points: Vec<RegistryPoint>,
    by_path: HashMap<String, PointId>,
}

impl PointRegistry {
    pub fn new(specs: &[PointSpec]) -> Result<Self> {
        let mut reg = Self::default();
        for spec in specs {
            if reg.by_path.contains_key(spec.path) {
                return Err(RegistryError::DuplicatePath(spec.path.to_string()));
            }
            let raw = u16::try_from(reg.points.len())
                .map_err(|_| RegistryError::TooManyPoints(usize::from(u16::MAX)))?;
            let id = PointId(raw);
            reg.by_path.insert(spec.path.to_string(), id);
            reg.points.push(RegistryPoint::from_spec(id, spec));
        }
        debug!(points = reg.points.len(), "registry initialised");
        Ok(reg)
    }

    pub fn with_default_schema() -> Result<Self> {
        Self::new(DEFAULT_SCHEMA)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> &[RegistryPoint] {
        &self.points
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.points.iter().map(|p| p.path.as_str())
    }

    /// Id of the point registered under exactly `path`.
    pub fn find(&self, path: &str) -> Option<PointId> {
        self.by_path.get(path).copied()
    }

    pub fn get(&self, path: &str) -> Result<&RegistryPoint> {
        self.find(path)
            .and_then(|id| self.points.get(id.index()))
            .ok_or_else(|| RegistryError::UnknownPath(path.to_string()))
    }

    pub fn point(&self, id: PointId) -> Result<&RegistryPoint> {
        self.points
            .get(id.index())
            .ok_or(RegistryError::UnknownId(id.0))
    }

    fn point_mut(&mut self, id: PointId) -> Result<&mut RegistryPoint> {
        self.points
            .get_mut(id.index())
            .ok_or(RegistryError::UnknownId(id.0))
    }

    /// Write the supplied representations and return the previously published text.
    pub fn set_value(&mut self, id: PointId, update: PointUpdate) -> Result<String> {
        Ok(self.point_mut(id)?.apply(update))
    }

    pub fn blank(&mut self, id: PointId) -> Result<()> {
        self.set_value(id, PointUpdate::blank()).map(|_| ())
    }

    pub fn reset(&mut self, id: PointId) -> Result<()> {
        self.point_mut(id)?.reset();
        Ok(())
    }

    /// Replace a point's default seed and republish it.
    pub fn apply_override(&mut self, path: &str, default: PointDefault) -> Result<()> {
        let id = self
            .find(path)
            .ok_or_else(|| RegistryError::UnknownPath(path.to_string()))?;
        let point = self.point_mut(id)?;
        point.default = default;
        point.reset();
        Ok(())
    }

    /// Whether a reading with this text and decimal would change what is published.
    pub fn differs(&self, id: PointId, text: &str, decimal: f64) -> Result<bool> {
        let point = self.point(id)?;
        Ok(point.text != text || point.decimal != decimal)
    }

    /// Wire value of a point, native to its kind unless text is requested.
    pub fn marshal(&self, id: PointId, as_text: bool) -> Result<WireValue> {
        Ok(WireValue::of(self.point(id)?, as_text))
    }

    pub fn item(&self, id: PointId) -> Result<ItemRecord> {
        Ok(ItemRecord::of(self.point(id)?))
    }

    /// Every point, in id order.
    pub fn items(&self) -> Vec<ItemRecord> {
        self.points.iter().map(ItemRecord::of).collect()
    }

    pub fn items_for(&self, ids: &[PointId]) -> Result<Vec<ItemRecord>> {
        ids.iter().map(|id| self.item(*id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PointKind;

    fn small() -> PointRegistry {
        PointRegistry::new(&[
            PointSpec::number("/Ac/Power", PointKind::UnsignedInteger, 0.0),
            PointSpec::number("/Ac/Frequency", PointKind::Decimal, 0.0),
            PointSpec::text("/CustomName", PointKind::Text, 0.0, "SMA 3800"),
        ])
        .unwrap()
    }

    #[test]
    fn ids_are_dense_and_stable() {
        let reg = PointRegistry::with_default_schema().unwrap();
        for (i, p) in reg.points().iter().enumerate() {
            assert_eq!(p.id.index(), i);
            assert_eq!(reg.find(&p.path), Some(p.id));
        }
    }

    #[test]
    fn duplicate_paths_are_rejected() {
        let err = PointRegistry::new(&[
            PointSpec::number("/A", PointKind::Decimal, 0.0),
            PointSpec::number("/A", PointKind::Decimal, 1.0),
        ])
        .unwrap_err();
        assert_eq!(err, RegistryError::DuplicatePath("/A".into()));
    }

    #[test]
    fn get_unknown_path_is_not_found() {
        let reg = small();
        assert!(matches!(
            reg.get("/Bogus"),
            Err(RegistryError::UnknownPath(p)) if p == "/Bogus"
        ));
        assert!(reg.get("/Ac").is_err());
    }

    #[test]
    fn numeric_set_value_refreshes_text_for_every_point() {
        let mut reg = PointRegistry::with_default_schema().unwrap();
        let ids: Vec<PointId> = reg.points().iter().map(|p| p.id).collect();
        for (n, id) in ids.into_iter().enumerate() {
            let value = n as f64 * 1.5 + 0.125;
            reg.set_value(id, PointUpdate::decimal(value)).unwrap();
            assert_eq!(reg.point(id).unwrap().text, format!("{value:.2}"));
        }
    }

    #[test]
    fn set_value_returns_previous_text() {
        let mut reg = small();
        let id = reg.find("/Ac/Power").unwrap();
        let prev = reg.set_value(id, PointUpdate::decimal(1500.0)).unwrap();
        assert_eq!(prev, "0");
        let prev = reg.set_value(id, PointUpdate::decimal(1.0)).unwrap();
        assert_eq!(prev, "1500.00");
    }

    #[test]
    fn marshal_selects_wire_type_by_kind() {
        let mut reg = small();
        let power = reg.find("/Ac/Power").unwrap();
        let freq = reg.find("/Ac/Frequency").unwrap();
        let name = reg.find("/CustomName").unwrap();
        reg.set_value(power, PointUpdate::decimal(1500.7)).unwrap();
        reg.set_value(freq, PointUpdate::decimal(50.01)).unwrap();

        assert_eq!(reg.marshal(power, false).unwrap(), WireValue::Uint32(1500));
        assert_eq!(reg.marshal(freq, false).unwrap(), WireValue::Double(50.01));
        assert_eq!(
            reg.marshal(name, false).unwrap(),
            WireValue::Text("SMA 3800".into())
        );
        assert_eq!(
            reg.marshal(power, true).unwrap(),
            WireValue::Text("1500.70".into())
        );
    }

    #[test]
    fn marshal_unknown_id_fails() {
        let reg = small();
        assert_eq!(
            reg.marshal(PointId(99), false).unwrap_err(),
            RegistryError::UnknownId(99)
        );
    }

    #[test]
    fn override_reseeds_and_reset_restores_it() {
        let mut reg = small();
        reg.apply_override(
            "/CustomName",
            PointDefault {
                number: 0.0,
                text: Some("Roof".into()),
            },
        )
        .unwrap();
        let id = reg.find("/CustomName").unwrap();
        assert_eq!(reg.point(id).unwrap().text, "Roof");
        reg.set_value(id, PointUpdate::text("other")).unwrap();
        reg.reset(id).unwrap();
        assert_eq!(reg.point(id).unwrap().text, "Roof");
        assert!(reg
            .apply_override("/Nope", PointDefault { number: 0.0, text: None })
            .is_err());
    }

    #[test]
    fn differs_compares_text_and_decimal() {
        let mut reg = small();
        let id = reg.find("/Ac/Power").unwrap();
        reg.set_value(id, PointUpdate::reading(1500.0, "1500.00"))
            .unwrap();
        assert!(!reg.differs(id, "1500.00", 1500.0).unwrap());
        assert!(reg.differs(id, "1500.00", 1500.5).unwrap());
        assert!(reg.differs(id, "1.5 kW", 1500.0).unwrap());
    }

    #[test]
    fn items_follow_id_order() {
        let reg = small();
        let paths: Vec<String> = reg.items().into_iter().map(|i| i.path).collect();
        assert_eq!(paths, vec!["/Ac/Power", "/Ac/Frequency", "/CustomName"]);
    }
}
