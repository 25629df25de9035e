//! Staggered sequence of sibling timelines under one trigger.
//!
//! Children live in an index-addressed arena. Child `i` starts at
//! `T + i * stagger`; since offsets never decrease with the index, sampling
//! children in index order can't show a child Running while a lower-indexed
//! sibling is still Idle.

use log::debug;

use crate::config::AnimationConfig;
use crate::error::{Result, RevealError};
use crate::timeline::{Timeline, TimelineStatus};

/// Ordered children plus the interval between their start times.
#[derive(Clone, Debug)]
pub struct SequenceGroup {
    children: Vec<Timeline>,
    stagger: f64,
    activated_at: Option<f64>,
}

impl SequenceGroup {
    /// Build a group; `repeatable` mirrors the parent's `once=false`.
    pub fn new(children: Vec<AnimationConfig>, stagger: f64, repeatable: bool) -> Result<Self> {
        if !stagger.is_finite() || stagger < 0.0 {
            return Err(RevealError::config(
                "staggerInterval",
                format!("must be a finite, non-negative number of seconds, got {stagger}"),
            ));
        }
        let children = children
            .into_iter()
            .map(|cfg| {
                cfg.validate()?;
                Ok(Timeline::new(cfg).with_repeat(repeatable))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            children,
            stagger,
            activated_at: None,
        })
    }

    /// Start offset of child `index` relative to the parent activation.
    #[inline]
    pub fn offset(&self, index: usize) -> f64 {
        index as f64 * self.stagger
    }

    /// Start every child at `at + offset(i)`, in index order.
    pub fn activate(&mut self, at: f64) {
        self.activated_at = Some(at);
        let stagger = self.stagger;
        for (i, child) in self.children.iter_mut().enumerate() {
            child.start(at + i as f64 * stagger);
        }
        debug!(
            "sequence of {} activated at {at} (stagger {stagger})",
            self.children.len()
        );
    }

    /// Reset all children at once; deactivation is not staggered.
    pub fn deactivate(&mut self) {
        self.activated_at = None;
        for child in &mut self.children {
            child.reset();
        }
    }

    pub fn cancel(&mut self) {
        for child in &mut self.children {
            child.cancel();
        }
    }

    /// Sample children in index order; returns the aggregate status.
    pub fn sample(&mut self, now: f64) -> TimelineStatus {
        for child in &mut self.children {
            child.sample(now);
        }
        self.status()
    }

    /// Aggregate: Idle if every child is Idle, Completed if every child is
    /// Completed, Running if any child runs, otherwise Scheduled.
    pub fn status(&self) -> TimelineStatus {
        if self.children.is_empty() {
            return match self.activated_at {
                Some(_) => TimelineStatus::Completed,
                None => TimelineStatus::Idle,
            };
        }
        let all = |s: TimelineStatus| self.children.iter().all(|c| c.status() == s);
        if all(TimelineStatus::Idle) {
            TimelineStatus::Idle
        } else if all(TimelineStatus::Completed) {
            TimelineStatus::Completed
        } else if self
            .children
            .iter()
            .any(|c| c.status() == TimelineStatus::Running)
        {
            TimelineStatus::Running
        } else {
            TimelineStatus::Scheduled
        }
    }

    /// Activation timestamps of each child, in index order.
    pub fn start_times(&self) -> Vec<Option<f64>> {
        self.children.iter().map(Timeline::activated_at).collect()
    }

    pub fn child(&self, index: usize) -> Option<&Timeline> {
        self.children.get(index)
    }

    pub fn children(&self) -> &[Timeline] {
        &self.children
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    pub fn stagger(&self) -> f64 {
        self.stagger
    }

    pub fn activated_at(&self) -> Option<f64> {
        self.activated_at
    }
}
