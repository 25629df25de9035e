//! Timeline state machine.
//!
//! `Idle → Scheduled → Running → Completed`, driven purely by the sample
//! time passed in. `start` while Scheduled/Running restarts from the new
//! timestamp; `reset` returns to Idle with the initial values.

use serde::{Deserialize, Serialize};

use crate::config::AnimationConfig;
use crate::value::{blend, settle, ValueSet};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimelineStatus {
    Idle,
    /// Started, waiting out its delay.
    Scheduled,
    Running,
    Completed,
}

impl TimelineStatus {
    #[inline]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scheduled => "scheduled",
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }

    /// Scheduled or Running: needs further frames.
    #[inline]
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Running)
    }

    /// Ordering used by sequence guarantees: Idle < Scheduled < Running < Completed.
    #[inline]
    pub fn rank(&self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Scheduled => 1,
            Self::Running => 2,
            Self::Completed => 3,
        }
    }
}

/// One interpolation between `initialValues` and `targetValues`.
#[derive(Clone, Debug)]
pub struct Timeline {
    config: AnimationConfig,
    repeatable: bool,
    activated_at: Option<f64>,
    current: ValueSet,
    status: TimelineStatus,
    cancelled: bool,
}

impl Timeline {
    /// New timeline in `Idle`. Non-repeatable by default: once Completed it
    /// ignores further `start` calls until `reset`.
    pub fn new(config: AnimationConfig) -> Self {
        let current = blend(&config.initial_values, &config.target_values, 0.0);
        Self {
            config,
            repeatable: false,
            activated_at: None,
            current,
            status: TimelineStatus::Idle,
            cancelled: false,
        }
    }

    /// Allow `start` from `Completed` (repeating trigger policies).
    pub fn with_repeat(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }

    /// Begin at `activated_at` (seconds). Returns false when the call was
    /// ignored (cancelled, or Completed and not repeatable).
    pub fn start(&mut self, activated_at: f64) -> bool {
        if self.cancelled {
            return false;
        }
        if self.status == TimelineStatus::Completed && !self.repeatable {
            return false;
        }
        self.activated_at = Some(activated_at);
        self.status = TimelineStatus::Scheduled;
        self.current = self.initial_snapshot();
        true
    }

    /// Back to `Idle` with the initial values.
    pub fn reset(&mut self) {
        self.activated_at = None;
        self.status = TimelineStatus::Idle;
        self.current = self.initial_snapshot();
    }

    /// Freeze: further `start`/`sample` calls do nothing.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Advance to `now` and return the new status.
    pub fn sample(&mut self, now: f64) -> TimelineStatus {
        if self.cancelled || !self.status.is_active() {
            return self.status;
        }
        let Some(run_start) = self.run_start() else {
            return self.status;
        };
        let elapsed = now - run_start;
        if elapsed < 0.0 {
            self.status = TimelineStatus::Scheduled;
            return self.status;
        }
        if elapsed >= self.config.duration {
            self.status = TimelineStatus::Completed;
            self.current = settle(&self.config.initial_values, &self.config.target_values);
        } else {
            self.status = TimelineStatus::Running;
            self.current = self.value_at(elapsed);
        }
        self.status
    }

    /// Values `elapsed` seconds into the run (after the delay). Pure.
    pub fn value_at(&self, elapsed: f64) -> ValueSet {
        let duration = self.config.duration;
        if elapsed >= duration {
            return settle(&self.config.initial_values, &self.config.target_values);
        }
        if elapsed <= 0.0 {
            return self.initial_snapshot();
        }
        let w = self.config.easing.evaluate(elapsed / duration);
        blend(&self.config.initial_values, &self.config.target_values, w)
    }

    fn initial_snapshot(&self) -> ValueSet {
        blend(&self.config.initial_values, &self.config.target_values, 0.0)
    }

    /// Timestamp at which interpolation begins (activation + delay).
    pub fn run_start(&self) -> Option<f64> {
        self.activated_at.map(|t| t + self.config.delay)
    }

    pub fn status(&self) -> TimelineStatus {
        self.status
    }

    pub fn current(&self) -> &ValueSet {
        &self.current
    }

    pub fn activated_at(&self) -> Option<f64> {
        self.activated_at
    }

    pub fn config(&self) -> &AnimationConfig {
        &self.config
    }

    pub fn is_repeatable(&self) -> bool {
        self.repeatable
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}
