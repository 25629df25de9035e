//! Numeric counter: a single-property timeline rendered as text.

use serde::{Deserialize, Serialize};

use crate::config::{check_decimals, AnimationConfig, CounterSpec, RevealConfig, MAX_DECIMALS};
use crate::error::{Result, RevealError};
use crate::timeline::{Timeline, TimelineStatus};
use crate::value::{values, Property, ValueSet};

/// Property name the counter animates.
pub const COUNTER_PROPERTY: &str = "value";

/// Text formatting for counter values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CounterFormat {
    pub decimals: u32,
    pub prefix: String,
    pub suffix: String,
    pub separator: Option<char>,
}

impl CounterFormat {
    /// `prefix + fixed(value, decimals) + suffix`. Non-finite input renders as 0.
    pub fn format(&self, value: f64) -> String {
        let mut out = String::with_capacity(self.prefix.len() + self.suffix.len() + 16);
        out.push_str(&self.prefix);
        out.push_str(&format_fixed(value, self.decimals, self.separator));
        out.push_str(&self.suffix);
        out
    }
}

/// Fixed-point rendering with optional thousands grouping.
/// Values that round to zero never carry a minus sign. Precision is capped
/// at [`MAX_DECIMALS`].
pub fn format_fixed(value: f64, decimals: u32, separator: Option<char>) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let fixed = format!("{:.*}", decimals.min(MAX_DECIMALS) as usize, value);
    let (negative, digits) = match fixed.strip_prefix('-') {
        Some(rest) if rest.chars().any(|c| c.is_ascii_digit() && c != '0') => (true, rest),
        Some(rest) => (false, rest),
        None => (false, fixed.as_str()),
    };
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    let mut out = String::with_capacity(fixed.len() + int_part.len() / 3);
    if negative {
        out.push('-');
    }
    match separator {
        Some(sep) => {
            let len = int_part.len();
            for (i, c) in int_part.chars().enumerate() {
                if i > 0 && (len - i) % 3 == 0 {
                    out.push(sep);
                }
                out.push(c);
            }
        }
        None => out.push_str(int_part),
    }
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Snapshot of a counter's numeric state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CounterState {
    pub target_value: Option<f64>,
    pub current_value: f64,
    pub decimals: u32,
    pub prefix: String,
    pub suffix: String,
}

/// Timeline over the single [`COUNTER_PROPERTY`] plus display formatting.
#[derive(Clone, Debug)]
pub struct NumericCounter {
    timeline: Timeline,
    target: Option<f64>,
    format: CounterFormat,
}

impl NumericCounter {
    /// Counter from `spec` using the timing and formatting fields of `cfg`.
    pub fn new(spec: &CounterSpec, cfg: &RevealConfig) -> Result<Self> {
        check_decimals(cfg.decimals)?;
        if !spec.from.is_finite() {
            return Err(RevealError::config(
                "from",
                format!("counter start must be finite, got {}", spec.from),
            ));
        }
        let target = spec.to.filter(|t| t.is_finite());
        let from = spec.from;
        let anim = AnimationConfig::new(
            values([(COUNTER_PROPERTY, from)]),
            values([(COUNTER_PROPERTY, target.unwrap_or(0.0))]),
            cfg.duration,
            cfg.delay,
            cfg.easing,
        )?;
        Ok(Self {
            timeline: Timeline::new(anim).with_repeat(!cfg.once),
            target,
            format: CounterFormat {
                decimals: cfg.decimals,
                prefix: cfg.prefix.clone(),
                suffix: cfg.suffix.clone(),
                separator: spec.separator,
            },
        })
    }

    pub fn start(&mut self, activated_at: f64) -> bool {
        self.timeline.start(activated_at)
    }

    pub fn reset(&mut self) {
        self.timeline.reset();
    }

    pub fn cancel(&mut self) {
        self.timeline.cancel();
    }

    pub fn sample(&mut self, now: f64) -> TimelineStatus {
        self.timeline.sample(now)
    }

    /// Current numeric value; 0 when the target is unset.
    pub fn value(&self) -> f64 {
        self.read(self.timeline.current())
    }

    /// Value `elapsed` seconds into the run. Pure.
    pub fn value_at(&self, elapsed: f64) -> f64 {
        self.read(&self.timeline.value_at(elapsed))
    }

    /// Formatted current value.
    pub fn display(&self) -> String {
        self.format.format(self.value())
    }

    /// Formatted value `elapsed` seconds into the run.
    pub fn display_at(&self, elapsed: f64) -> String {
        self.format.format(self.value_at(elapsed))
    }

    fn read(&self, set: &ValueSet) -> f64 {
        if self.target.is_none() {
            return 0.0;
        }
        set.get(&Property::from(COUNTER_PROPERTY))
            .copied()
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    pub fn status(&self) -> TimelineStatus {
        self.timeline.status()
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn format(&self) -> &CounterFormat {
        &self.format
    }

    pub fn state(&self) -> CounterState {
        CounterState {
            target_value: self.target,
            current_value: self.value(),
            decimals: self.format.decimals,
            prefix: self.format.prefix.clone(),
            suffix: self.format.suffix.clone(),
        }
    }
}
