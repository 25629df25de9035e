//! Easing curves mapping normalized progress `[0,1]` to an interpolation weight.
//!
//! Named curves follow the usual web-animation definitions:
//! - `linear`
//! - `easeIn` / `easeOut` / `easeInOut` (cubic-bezier 0.42,0,1,1 / 0,0,0.58,1 / 0.42,0,0.58,1)
//! - `circIn` / `circOut`
//! - `backOut` (overshoots past 1 before settling)
//! - `anticipate` (dips below 0 before accelerating)
//!
//! Any other curve can be given as a `[x1, y1, x2, y2]` cubic-bezier array.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RevealError;

const BISECT_ITERATIONS: usize = 40;

/// Easing curve applied to timeline progress.
#[derive(Copy, Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(try_from = "EasingRepr", into = "EasingRepr")]
pub enum Easing {
    Linear,
    EaseIn,
    #[default]
    EaseOut,
    EaseInOut,
    CircIn,
    CircOut,
    BackOut,
    Anticipate,
    /// CSS cubic-bezier curve (x1, y1, x2, y2)
    CubicBezier([f64; 4]),
}

impl Easing {
    /// Build a cubic-bezier curve, rejecting x control points outside `[0,1]`.
    pub fn cubic_bezier(x1: f64, y1: f64, x2: f64, y2: f64) -> Result<Self, RevealError> {
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(RevealError::config(
                "easing",
                "cubic-bezier control points must be finite",
            ));
        }
        if !(0.0..=1.0).contains(&x1) || !(0.0..=1.0).contains(&x2) {
            return Err(RevealError::config(
                "easing",
                format!("cubic-bezier x control points must be within [0, 1], got {x1} and {x2}"),
            ));
        }
        Ok(Easing::CubicBezier([x1, y1, x2, y2]))
    }

    /// Evaluate the curve at progress `p`. Input is clamped to `[0,1]`;
    /// the endpoints map exactly to 0 and 1.
    pub fn evaluate(&self, p: f64) -> f64 {
        if p.is_nan() || p <= 0.0 {
            return 0.0;
        }
        if p >= 1.0 {
            return 1.0;
        }
        match self {
            Easing::Linear => p,
            Easing::EaseIn => bezier_ease(p, 0.42, 0.0, 1.0, 1.0),
            Easing::EaseOut => bezier_ease(p, 0.0, 0.0, 0.58, 1.0),
            Easing::EaseInOut => bezier_ease(p, 0.42, 0.0, 0.58, 1.0),
            Easing::CircIn => circ_in(p),
            Easing::CircOut => 1.0 - circ_in(1.0 - p),
            Easing::BackOut => back_out(p),
            Easing::Anticipate => anticipate(p),
            Easing::CubicBezier([x1, y1, x2, y2]) => bezier_ease(p, *x1, *y1, *x2, *y2),
        }
    }

    /// Whether sampled weights never decrease as progress grows.
    pub fn is_monotonic(&self) -> bool {
        match self {
            Easing::BackOut | Easing::Anticipate => false,
            Easing::CubicBezier([_, y1, _, y2]) => {
                (0.0..=1.0).contains(y1) && (0.0..=1.0).contains(y2)
            }
            _ => true,
        }
    }

    /// Canonical name, or `None` for custom bezier curves.
    pub fn name(&self) -> Option<&'static str> {
        match self {
            Easing::Linear => Some("linear"),
            Easing::EaseIn => Some("easeIn"),
            Easing::EaseOut => Some("easeOut"),
            Easing::EaseInOut => Some("easeInOut"),
            Easing::CircIn => Some("circIn"),
            Easing::CircOut => Some("circOut"),
            Easing::BackOut => Some("backOut"),
            Easing::Anticipate => Some("anticipate"),
            Easing::CubicBezier(_) => None,
        }
    }
}

impl FromStr for Easing {
    type Err = RevealError;

    /// Accepts `easeOut`, `ease-out` and `ease_out` spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "linear" => Ok(Easing::Linear),
            "easein" => Ok(Easing::EaseIn),
            "easeout" => Ok(Easing::EaseOut),
            "easeinout" => Ok(Easing::EaseInOut),
            "circin" => Ok(Easing::CircIn),
            "circout" => Ok(Easing::CircOut),
            "backout" => Ok(Easing::BackOut),
            "anticipate" => Ok(Easing::Anticipate),
            _ => Err(RevealError::config(
                "easing",
                format!("unknown easing curve '{s}'"),
            )),
        }
    }
}

impl fmt::Display for Easing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.name(), self) {
            (Some(name), _) => f.write_str(name),
            (None, Easing::CubicBezier([x1, y1, x2, y2])) => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
            (None, _) => Ok(()),
        }
    }
}

/// Wire form: a curve name or a bezier control-point array.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum EasingRepr {
    Named(String),
    Bezier([f64; 4]),
}

impl TryFrom<EasingRepr> for Easing {
    type Error = RevealError;

    fn try_from(repr: EasingRepr) -> Result<Self, Self::Error> {
        match repr {
            EasingRepr::Named(name) => name.parse(),
            EasingRepr::Bezier([x1, y1, x2, y2]) => Easing::cubic_bezier(x1, y1, x2, y2),
        }
    }
}

impl From<Easing> for EasingRepr {
    fn from(easing: Easing) -> Self {
        match easing {
            Easing::CubicBezier(ctrl) => EasingRepr::Bezier(ctrl),
            named => EasingRepr::Named(named.name().unwrap_or("linear").to_string()),
        }
    }
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f64, p1: f64, p2: f64, p3: f64, t: f64) -> f64 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

/// Invert the x bezier by bisection, then evaluate y at the found parameter.
/// A fixed iteration count keeps results deterministic across samples.
fn bezier_ease(p: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    if x1 == y1 && x2 == y2 {
        return p;
    }
    let mut lo = 0.0f64;
    let mut hi = 1.0f64;
    for _ in 0..BISECT_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        if cubic_bezier(0.0, x1, x2, 1.0, mid) < p {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    cubic_bezier(0.0, y1, y2, 1.0, 0.5 * (lo + hi))
}

fn circ_in(p: f64) -> f64 {
    1.0 - (1.0 - p * p).max(0.0).sqrt()
}

fn back_out(p: f64) -> f64 {
    bezier_ease(p, 0.33, 1.53, 0.69, 0.99)
}

fn back_in(p: f64) -> f64 {
    1.0 - back_out(1.0 - p)
}

fn anticipate(p: f64) -> f64 {
    let p2 = p * 2.0;
    if p2 < 1.0 {
        0.5 * back_in(p2)
    } else {
        0.5 * (2.0 - 2f64.powf(-10.0 * (p2 - 1.0)))
    }
}
