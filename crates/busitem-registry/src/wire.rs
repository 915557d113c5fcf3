use crate::point::{PointKind, RegistryPoint};
use serde::Serialize;

/// The on-wire representation chosen for a point.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WireValue {
    Double(f64),
    Uint32(u32),
    Text(String),
}

impl WireValue {
    pub(crate) fn of(point: &RegistryPoint, as_text: bool) -> Self {
        if as_text {
            return WireValue::Text(point.text.clone());
        }
        match point.kind {
            PointKind::Decimal => WireValue::Double(point.decimal),
            PointKind::UnsignedInteger => WireValue::Uint32(point.unsigned),
            PointKind::Text => WireValue::Text(point.text.clone()),
        }
    }

    /// Single-character type code of the wrapped value.
    pub fn signature(&self) -> &'static str {
        match self {
            WireValue::Double(_) => "d",
            WireValue::Uint32(_) => "u",
            WireValue::Text(_) => "s",
        }
    }
}

/// One `path -> {Value, Text}` entry of a bulk-item reply or change broadcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRecord {
    pub path: String,
    pub value: WireValue,
    pub text: String,
}

impl ItemRecord {
    pub(crate) fn of(point: &RegistryPoint) -> Self {
        Self {
            path: point.path.clone(),
            value: WireValue::of(point, false),
            text: point.text.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{PointRegistry, PointSpec, PointUpdate};

    #[test]
    fn item_carries_native_value_and_text() {
        let mut reg = PointRegistry::new(&[PointSpec::number(
            "/Ac/L1/Voltage",
            PointKind::Decimal,
            0.0,
        )])
        .unwrap();
        let id = reg.find("/Ac/L1/Voltage").unwrap();
        reg.set_value(id, PointUpdate::decimal(231.4)).unwrap();
        let item = reg.item(id).unwrap();
        assert_eq!(item.value, WireValue::Double(231.4));
        assert_eq!(item.value.signature(), "d");
        assert_eq!(item.text, "231.40");
    }

    #[test]
    fn serializes_untagged() {
        let json = serde_json::to_string(&WireValue::Uint32(7)).unwrap();
        assert_eq!(json, "7");
        let json = serde_json::to_string(&WireValue::Text("Mpp".into())).unwrap();
        assert_eq!(json, "\"Mpp\"");
    }
}
