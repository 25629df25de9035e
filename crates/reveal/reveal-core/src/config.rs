//! Configuration surface for watched elements.
//!
//! `RevealConfig` carries every recognized option with its default; the
//! narrower `TriggerConfig` and `AnimationConfig` are derived from it after
//! validation. All checks run at construction time and never clamp.

use serde::{Deserialize, Serialize};

use crate::easing::Easing;
use crate::error::{Result, RevealError};
use crate::value::ValueSet;

/// Largest accepted `decimals`, matching `Number.prototype.toFixed`.
pub const MAX_DECIMALS: u32 = 100;

fn check_non_negative(field: &str, v: f64) -> Result<()> {
    if !v.is_finite() || v < 0.0 {
        return Err(RevealError::config(
            field,
            format!("must be a finite, non-negative number of seconds, got {v}"),
        ));
    }
    Ok(())
}

pub(crate) fn check_decimals(decimals: u32) -> Result<()> {
    if decimals > MAX_DECIMALS {
        return Err(RevealError::config(
            "decimals",
            format!("must be within [0, {MAX_DECIMALS}], got {decimals}"),
        ));
    }
    Ok(())
}

fn check_ratio(field: &str, v: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&v) {
        return Err(RevealError::config(
            field,
            format!("must be within [0, 1], got {v}"),
        ));
    }
    Ok(())
}

/// Viewport margin offsets in pixels, CSS order (top, right, bottom, left).
/// Negative values shrink the effective viewport.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct MarginBias {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl MarginBias {
    pub const ZERO: MarginBias = MarginBias::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(top: f64, right: f64, bottom: f64, left: f64) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Render as a CSS `rootMargin` string, e.g. `"0px 0px -100px 0px"`.
    pub fn to_root_margin(&self) -> String {
        format!(
            "{}px {}px {}px {}px",
            self.top, self.right, self.bottom, self.left
        )
    }

    fn validate(&self) -> Result<()> {
        if [self.top, self.right, self.bottom, self.left]
            .iter()
            .all(|v| v.is_finite())
        {
            Ok(())
        } else {
            Err(RevealError::config("marginBias", "offsets must be finite"))
        }
    }
}

impl Default for MarginBias {
    fn default() -> Self {
        Self::new(0.0, 0.0, -100.0, 0.0)
    }
}

impl From<[f64; 4]> for MarginBias {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<MarginBias> for [f64; 4] {
    fn from(m: MarginBias) -> Self {
        [m.top, m.right, m.bottom, m.left]
    }
}

/// Every option recognized for a watched element, with its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RevealConfig {
    /// Fraction of the element that must be visible, in `[0,1]`.
    pub threshold_ratio: f64,
    pub margin_bias: MarginBias,
    /// Fire a single Activate, then stop watching.
    pub once: bool,
    /// Seconds.
    pub duration: f64,
    /// Seconds between activation and the first interpolated frame.
    pub delay: f64,
    pub easing: Easing,
    /// Seconds between consecutive sequence children.
    pub stagger_interval: f64,
    pub decimals: u32,
    pub prefix: String,
    pub suffix: String,
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            threshold_ratio: 0.1,
            margin_bias: MarginBias::default(),
            once: true,
            duration: 0.5,
            delay: 0.0,
            easing: Easing::EaseOut,
            stagger_interval: 0.1,
            decimals: 0,
            prefix: String::new(),
            suffix: String::new(),
        }
    }
}

impl RevealConfig {
    pub fn validate(&self) -> Result<()> {
        check_ratio("thresholdRatio", self.threshold_ratio)?;
        self.margin_bias.validate()?;
        check_non_negative("duration", self.duration)?;
        check_non_negative("delay", self.delay)?;
        check_non_negative("staggerInterval", self.stagger_interval)?;
        check_decimals(self.decimals)?;
        Ok(())
    }

    /// Trigger half of the config.
    pub fn trigger(&self) -> Result<TriggerConfig> {
        TriggerConfig::new(self.threshold_ratio, self.margin_bias, self.once)
    }

    /// Timeline config between `initial` and `target`, using this config's timing.
    pub fn animation(&self, initial: ValueSet, target: ValueSet) -> Result<AnimationConfig> {
        AnimationConfig::new(initial, target, self.duration, self.delay, self.easing)
    }
}

/// Threshold and repeat policy for one watched element.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TriggerConfig {
    pub threshold: f64,
    pub margin_bias: MarginBias,
    pub once: bool,
}

impl TriggerConfig {
    pub fn new(threshold: f64, margin_bias: MarginBias, once: bool) -> Result<Self> {
        check_ratio("thresholdRatio", threshold)?;
        margin_bias.validate()?;
        Ok(Self {
            threshold,
            margin_bias,
            once,
        })
    }
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            threshold: 0.1,
            margin_bias: MarginBias::default(),
            once: true,
        }
    }
}

/// Interpolation between two value sets over `duration` after `delay`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationConfig {
    pub initial_values: ValueSet,
    pub target_values: ValueSet,
    pub duration: f64,
    #[serde(default)]
    pub delay: f64,
    #[serde(default)]
    pub easing: Easing,
}

impl AnimationConfig {
    pub fn new(
        initial_values: ValueSet,
        target_values: ValueSet,
        duration: f64,
        delay: f64,
        easing: Easing,
    ) -> Result<Self> {
        let cfg = Self {
            initial_values,
            target_values,
            duration,
            delay,
            easing,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        check_non_negative("duration", self.duration)?;
        check_non_negative("delay", self.delay)?;
        for (prop, v) in self.initial_values.iter().chain(self.target_values.iter()) {
            if !v.is_finite() {
                return Err(RevealError::config(
                    prop.as_str(),
                    format!("animated values must be finite, got {v}"),
                ));
            }
        }
        Ok(())
    }
}

/// Initial/target pair for a timeline or a sequence child.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValuesSpec {
    #[serde(default)]
    pub initial_values: ValueSet,
    #[serde(default)]
    pub target_values: ValueSet,
}

/// Counter endpoints and grouping. `to: None` displays `0`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CounterSpec {
    pub from: f64,
    pub to: Option<f64>,
    /// Thousands separator inserted into the integer part.
    pub separator: Option<char>,
}

/// What a watched element drives once activated.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DriverSpec {
    Timeline {
        #[serde(flatten)]
        values: ValuesSpec,
    },
    Counter {
        #[serde(flatten)]
        counter: CounterSpec,
    },
    Sequence {
        children: Vec<ValuesSpec>,
    },
}

/// Full registration request: options plus driver, as a single JSON object.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WatchSpec {
    #[serde(flatten)]
    pub config: RevealConfig,
    #[serde(flatten)]
    pub driver: DriverSpec,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::values;

    #[test]
    fn defaults_match_documented_surface() {
        let cfg = RevealConfig::default();
        assert_eq!(cfg.threshold_ratio, 0.1);
        assert_eq!(cfg.margin_bias, MarginBias::new(0.0, 0.0, -100.0, 0.0));
        assert!(cfg.once);
        assert_eq!(cfg.duration, 0.5);
        assert_eq!(cfg.delay, 0.0);
        assert_eq!(cfg.easing, Easing::EaseOut);
        assert_eq!(cfg.stagger_interval, 0.1);
        assert_eq!(cfg.decimals, 0);
        assert!(cfg.prefix.is_empty() && cfg.suffix.is_empty());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_json_yields_defaults() {
        let cfg: RevealConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, RevealConfig::default());
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let cfg = RevealConfig {
            threshold_ratio: 1.2,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, RevealError::Configuration { ref field, .. } if field == "thresholdRatio"));
        assert!(TriggerConfig::new(-0.1, MarginBias::ZERO, true).is_err());
        assert!(TriggerConfig::new(f64::NAN, MarginBias::ZERO, true).is_err());
    }

    #[test]
    fn rejects_negative_timing() {
        let cfg = RevealConfig {
            duration: -1.0,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        let cfg = RevealConfig {
            delay: -0.01,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
        assert!(AnimationConfig::new(
            values([("opacity", 0.0)]),
            values([("opacity", 1.0)]),
            f64::INFINITY,
            0.0,
            Easing::Linear
        )
        .is_err());
    }

    #[test]
    fn rejects_decimals_beyond_to_fixed_range() {
        let cfg = RevealConfig {
            decimals: 200_000,
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, RevealError::Configuration { ref field, .. } if field == "decimals"));
        let cfg = RevealConfig {
            decimals: MAX_DECIMALS,
            ..Default::default()
        };
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn root_margin_string() {
        assert_eq!(MarginBias::default().to_root_margin(), "0px 0px -100px 0px");
        let m: MarginBias = serde_json::from_str("[10, 0, 5.5, 0]").unwrap();
        assert_eq!(m.to_root_margin(), "10px 0px 5.5px 0px");
    }

    #[test]
    fn watch_spec_parses_flat_json() {
        let spec: WatchSpec = serde_json::from_str(
            r#"{
                "kind": "counter",
                "to": 2500,
                "separator": ",",
                "duration": 2,
                "decimals": 0,
                "prefix": "$"
            }"#,
        )
        .unwrap();
        assert_eq!(spec.config.duration, 2.0);
        assert_eq!(spec.config.prefix, "$");
        assert!(spec.config.once);
        match spec.driver {
            DriverSpec::Counter { counter } => {
                assert_eq!(counter.to, Some(2500.0));
                assert_eq!(counter.from, 0.0);
                assert_eq!(counter.separator, Some(','));
            }
            other => panic!("expected counter, got {other:?}"),
        }
    }
}
