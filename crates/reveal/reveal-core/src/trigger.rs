//! Edge-triggered visibility policy.
//!
//! Turns the raw `(ratio, isIntersecting)` stream of one element into
//! semantic Activate/Deactivate triggers. The initial state is "not
//! intersecting"; registration itself never emits.

use serde::{Deserialize, Serialize};

/// Semantic visibility event for one element.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Trigger {
    Activate,
    Deactivate,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum PolicyState {
    Watching { intersecting: bool },
    /// A `once` policy that already activated. Terminal.
    Spent,
}

/// Activate on false→true, Deactivate on true→false (repeating policies only).
#[derive(Clone, Debug)]
pub struct TriggerPolicy {
    once: bool,
    state: PolicyState,
    last_ratio: f64,
}

impl TriggerPolicy {
    pub fn new(once: bool) -> Self {
        Self {
            once,
            state: PolicyState::Watching {
                intersecting: false,
            },
            last_ratio: 0.0,
        }
    }

    /// Record the state reported at registration. Never triggers: an element
    /// already on screen when mounted stays quiet until it leaves and re-enters.
    pub fn baseline(&mut self, ratio: f64, is_intersecting: bool) {
        if let PolicyState::Watching { .. } = self.state {
            if ratio.is_finite() {
                self.last_ratio = ratio.clamp(0.0, 1.0);
            }
            self.state = PolicyState::Watching {
                intersecting: is_intersecting,
            };
        }
    }

    /// Feed one intersection sample. Returns the trigger it causes, if any.
    pub fn observe(&mut self, ratio: f64, is_intersecting: bool) -> Option<Trigger> {
        let was = match self.state {
            PolicyState::Spent => return None,
            PolicyState::Watching { intersecting } => intersecting,
        };
        if ratio.is_finite() {
            self.last_ratio = ratio.clamp(0.0, 1.0);
        }
        match (was, is_intersecting) {
            (false, true) => {
                self.state = if self.once {
                    PolicyState::Spent
                } else {
                    PolicyState::Watching { intersecting: true }
                };
                Some(Trigger::Activate)
            }
            (true, false) => {
                self.state = PolicyState::Watching {
                    intersecting: false,
                };
                // a `once` policy visible at mount leaves without deactivating
                (!self.once).then_some(Trigger::Deactivate)
            }
            _ => None,
        }
    }

    pub fn once(&self) -> bool {
        self.once
    }

    /// True once a `once` policy has fired; no further triggers will follow.
    pub fn is_spent(&self) -> bool {
        matches!(self.state, PolicyState::Spent)
    }

    /// Last observed intersecting state. A spent policy reports `true`.
    pub fn is_intersecting(&self) -> bool {
        match self.state {
            PolicyState::Watching { intersecting } => intersecting,
            PolicyState::Spent => true,
        }
    }

    pub fn last_ratio(&self) -> f64 {
        self.last_ratio
    }
}
