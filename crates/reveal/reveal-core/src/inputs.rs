//! Input contracts for the engine.
//!
//! Adapters collect platform notifications between frames and pass them to
//! `Engine::update()`, which applies them before sampling.

use serde::{Deserialize, Serialize};

use crate::ids::ElementId;
use crate::watcher::IntersectionEntry;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Inputs {
    /// Intersection entries delivered since the last frame, in arrival order.
    #[serde(default)]
    pub intersections: Vec<IntersectionEntry>,
    /// Elements whose owners unmounted.
    #[serde(default)]
    pub unmounts: Vec<ElementId>,
}

impl Inputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_intersection(mut self, entry: IntersectionEntry) -> Self {
        self.intersections.push(entry);
        self
    }

    pub fn with_unmount(mut self, element: ElementId) -> Self {
        self.unmounts.push(element);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.intersections.is_empty() && self.unmounts.is_empty()
    }
}
