//! Animatable properties and value sets.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A visual attribute driven by a timeline.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Property {
    Opacity,
    X,
    Y,
    Scale,
    Rotate,
    /// Any other host-defined attribute (e.g. `"value"` for counters).
    Custom(String),
}

impl Property {
    pub fn as_str(&self) -> &str {
        match self {
            Property::Opacity => "opacity",
            Property::X => "x",
            Property::Y => "y",
            Property::Scale => "scale",
            Property::Rotate => "rotate",
            Property::Custom(name) => name,
        }
    }

    /// Resting value used when a target names a property the initial set omits.
    pub fn neutral(&self) -> f64 {
        match self {
            Property::Opacity | Property::Scale => 1.0,
            _ => 0.0,
        }
    }
}

impl From<String> for Property {
    fn from(s: String) -> Self {
        match s.as_str() {
            "opacity" => Property::Opacity,
            "x" => Property::X,
            "y" => Property::Y,
            "scale" => Property::Scale,
            "rotate" => Property::Rotate,
            _ => Property::Custom(s),
        }
    }
}

impl From<&str> for Property {
    fn from(s: &str) -> Self {
        Property::from(s.to_string())
    }
}

impl From<Property> for String {
    fn from(p: Property) -> Self {
        match p {
            Property::Custom(name) => name,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered property → value map. Declaration order is preserved in snapshots.
pub type ValueSet = IndexMap<Property, f64>;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Componentwise blend of `from → to` at weight `w`.
///
/// Keys follow `to` first, then any keys only present in `from` (held constant).
/// A key missing from `from` starts at the property's neutral value.
pub fn blend(from: &ValueSet, to: &ValueSet, w: f64) -> ValueSet {
    let mut out = ValueSet::with_capacity(to.len().max(from.len()));
    for (prop, target) in to {
        let start = from.get(prop).copied().unwrap_or_else(|| prop.neutral());
        out.insert(prop.clone(), lerp(start, *target, w));
    }
    for (prop, start) in from {
        if !to.contains_key(prop) {
            out.insert(prop.clone(), *start);
        }
    }
    out
}

/// The set reached at completion: `to` verbatim plus held keys from `from`.
pub fn settle(from: &ValueSet, to: &ValueSet) -> ValueSet {
    let mut out = to.clone();
    for (prop, start) in from {
        if !out.contains_key(prop) {
            out.insert(prop.clone(), *start);
        }
    }
    out
}

/// Build a ValueSet from `(name, value)` pairs.
pub fn values<I, K>(pairs: I) -> ValueSet
where
    I: IntoIterator<Item = (K, f64)>,
    K: Into<Property>,
{
    pairs.into_iter().map(|(k, v)| (k.into(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_names_round_trip() {
        for name in ["opacity", "x", "y", "scale", "rotate", "blur"] {
            let p = Property::from(name);
            assert_eq!(p.as_str(), name);
        }
        assert_eq!(Property::from("blur"), Property::Custom("blur".into()));
    }

    #[test]
    fn blend_fills_missing_start_with_neutral() {
        let from = values([("y", 40.0)]);
        let to = values([("opacity", 0.5), ("y", 0.0)]);
        let mid = blend(&from, &to, 0.5);
        assert_eq!(mid[&Property::Opacity], 0.75);
        assert_eq!(mid[&Property::Y], 20.0);
    }

    #[test]
    fn keys_only_in_from_are_held() {
        let from = values([("rotate", 12.0), ("x", -10.0)]);
        let to = values([("x", 0.0)]);
        assert_eq!(blend(&from, &to, 0.5)[&Property::Rotate], 12.0);
        assert_eq!(settle(&from, &to)[&Property::Rotate], 12.0);
        assert_eq!(settle(&from, &to)[&Property::X], 0.0);
    }

    #[test]
    fn value_set_serializes_with_plain_keys() {
        let set = values([("opacity", 1.0), ("y", 0.0)]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(json, r#"{"opacity":1.0,"y":0.0}"#);
    }
}
