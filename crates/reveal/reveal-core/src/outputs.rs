//! Output contracts from the engine.
//!
//! Outputs carry the value snapshots that changed this tick, keyed by
//! element (and sequence child), plus a separate list of semantic events.
//! Adapters apply changes to visual attributes and forward events.

use serde::{Deserialize, Serialize};

use crate::ids::{ElementId, ElementKey};
use crate::timeline::TimelineStatus;
use crate::value::ValueSet;

/// One updated snapshot for an element, or for one child of a sequence.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub element: ElementId,
    pub key: ElementKey,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub child: Option<usize>,
    pub status: TimelineStatus,
    pub values: ValueSet,
    /// Formatted display text (counters only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

/// Discrete semantic signals emitted by the engine.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
#[non_exhaustive]
pub enum RevealEvent {
    Activated { element: ElementId, at: f64 },
    Deactivated { element: ElementId, at: f64 },
    /// The element's observer was released after a one-shot activation.
    Unsubscribed { element: ElementId },
    TimelineStarted {
        element: ElementId,
        #[serde(skip_serializing_if = "Option::is_none")]
        child: Option<usize>,
    },
    TimelineCompleted {
        element: ElementId,
        #[serde(skip_serializing_if = "Option::is_none")]
        child: Option<usize>,
    },
    Cancelled { element: ElementId },
}

impl RevealEvent {
    pub fn element(&self) -> ElementId {
        match self {
            Self::Activated { element, .. }
            | Self::Deactivated { element, .. }
            | Self::Unsubscribed { element }
            | Self::TimelineStarted { element, .. }
            | Self::TimelineCompleted { element, .. }
            | Self::Cancelled { element } => *element,
        }
    }
}

/// Outputs returned by `Engine::update()`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub changes: Vec<Change>,
    #[serde(default)]
    pub events: Vec<RevealEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.changes.clear();
        self.events.clear();
    }

    #[inline]
    pub fn push_change(&mut self, change: Change) {
        self.changes.push(change);
    }

    #[inline]
    pub fn push_event(&mut self, event: RevealEvent) {
        self.events.push(event);
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty() && self.events.is_empty()
    }

    /// Changes for one element, in emission order.
    pub fn changes_for(&self, element: ElementId) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(move |c| c.element == element)
    }
}
