use core::fmt;
use serde::Serialize;

/// Wire type of a point, fixed at definition time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PointKind {
    Decimal,
    UnsignedInteger,
    Text,
}

/// Dense, zero-based index of a point, assigned once when the registry is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PointId(pub u16);

impl PointId {
    pub fn index(self) -> usize {
        usize::from(self.0)
    }
}

impl fmt::Display for PointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Compile-time description of one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointSpec {
    pub path: &'static str,
    pub kind: PointKind,
    pub default_number: f64,
    pub default_text: Option<&'static str>,
}

impl PointSpec {
    pub const fn number(path: &'static str, kind: PointKind, default_number: f64) -> Self {
        Self {
            path,
            kind,
            default_number,
            default_text: None,
        }
    }

    pub const fn text(
        path: &'static str,
        kind: PointKind,
        default_number: f64,
        default_text: &'static str,
    ) -> Self {
        Self {
            path,
            kind,
            default_number,
            default_text: Some(default_text),
        }
    }
}

/// Seed used at initialization and by `reset`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PointDefault {
    pub number: f64,
    pub text: Option<String>,
}

impl PointDefault {
    /// Text published for this seed. Without an explicit text the number is rounded
    /// to an unsigned integer.
    pub fn seed_text(&self) -> String {
        match &self.text {
            Some(text) => text.clone(),
            None => format!("{}", self.number as u32),
        }
    }
}

/// One addressable point with its live value in every representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RegistryPoint {
    pub id: PointId,
    pub path: String,
    pub kind: PointKind,
    pub default: PointDefault,
    pub text: String,
    pub decimal: f64,
    pub unsigned: u32,
}

impl RegistryPoint {
    pub(crate) fn from_spec(id: PointId, spec: &PointSpec) -> Self {
        let mut point = Self {
            id,
            path: spec.path.to_string(),
            kind: spec.kind,
            default: PointDefault {
                number: spec.default_number,
                text: spec.default_text.map(str::to_string),
            },
            text: String::new(),
            decimal: 0.0,
            unsigned: 0,
        };
        point.reset();
        point
    }

    pub(crate) fn reset(&mut self) {
        self.text = self.default.seed_text();
        self.decimal = self.default.number;
        self.unsigned = self.default.number as u32;
    }

    /// Apply an update and return the text that was published before it.
    pub(crate) fn apply(&mut self, update: PointUpdate) -> String {
        match (update.decimal, update.unsigned) {
            (Some(d), Some(u)) => {
                self.decimal = d;
                self.unsigned = u;
            }
            (Some(d), None) => {
                self.decimal = d;
                self.unsigned = d as u32;
            }
            (None, Some(u)) => {
                self.unsigned = u;
                self.decimal = f64::from(u);
            }
            (None, None) => {}
        }
        let text = match update.text {
            Some(text) => text,
            None if update.decimal.is_some() => format!("{:.2}", self.decimal),
            None if update.unsigned.is_some() => format!("{:.2}", f64::from(self.unsigned)),
            None => self.text.clone(),
        };
        std::mem::replace(&mut self.text, text)
    }
}

/// Partial value update; whichever representations are supplied are written, the
/// rest are derived so all three stay consistent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointUpdate {
    pub decimal: Option<f64>,
    pub unsigned: Option<u32>,
    pub text: Option<String>,
}

impl PointUpdate {
    pub fn decimal(value: f64) -> Self {
        Self {
            decimal: Some(value),
            ..Self::default()
        }
    }

    pub fn unsigned(value: u32) -> Self {
        Self {
            unsigned: Some(value),
            ..Self::default()
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// A fresh channel reading: decimal, truncated unsigned, and the given text.
    pub fn reading(value: f64, text: impl Into<String>) -> Self {
        Self {
            decimal: Some(value),
            unsigned: Some(value as u32),
            text: Some(text.into()),
        }
    }

    /// Empty text and zero numerics, published while a source is unresponsive.
    pub fn blank() -> Self {
        Self::reading(0.0, String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(kind: PointKind, number: f64, text: Option<&'static str>) -> RegistryPoint {
        let spec = PointSpec {
            path: "/X",
            kind,
            default_number: number,
            default_text: text,
        };
        RegistryPoint::from_spec(PointId(0), &spec)
    }

    #[test]
    fn seed_text_rounds_number_without_explicit_text() {
        assert_eq!(point(PointKind::UnsignedInteger, 3800.0, None).text, "3800");
        assert_eq!(point(PointKind::Decimal, 0.0, None).text, "0");
        assert_eq!(
            point(PointKind::UnsignedInteger, 1.0, Some("1.0.0")).text,
            "1.0.0"
        );
    }

    #[test]
    fn numeric_only_update_formats_two_decimals() {
        let mut p = point(PointKind::Decimal, 0.0, None);
        let prev = p.apply(PointUpdate::decimal(231.456));
        assert_eq!(prev, "0");
        assert_eq!(p.text, "231.46");
        assert_eq!(p.unsigned, 231);

        let mut q = point(PointKind::UnsignedInteger, 0.0, None);
        q.apply(PointUpdate::unsigned(42));
        assert_eq!(q.text, "42.00");
        assert_eq!(q.decimal, 42.0);
    }

    #[test]
    fn explicit_text_wins() {
        let mut p = point(PointKind::Text, 0.0, Some("idle"));
        let prev = p.apply(PointUpdate::reading(7.0, "Mpp"));
        assert_eq!(prev, "idle");
        assert_eq!(p.text, "Mpp");
        assert_eq!(p.unsigned, 7);
    }

    #[test]
    fn negative_readings_saturate_unsigned() {
        let mut p = point(PointKind::UnsignedInteger, 0.0, None);
        p.apply(PointUpdate::reading(-12.5, "-12.50"));
        assert_eq!(p.unsigned, 0);
        assert_eq!(p.decimal, -12.5);
    }

    #[test]
    fn blank_then_reset_restores_seed() {
        let mut p = point(PointKind::UnsignedInteger, 3800.0, None);
        p.apply(PointUpdate::blank());
        assert_eq!((p.text.as_str(), p.decimal, p.unsigned), ("", 0.0, 0));
        p.reset();
        assert_eq!((p.text.as_str(), p.decimal, p.unsigned), ("3800", 3800.0, 3800));
    }
}
