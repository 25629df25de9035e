//! Identifiers and simple allocators for engine entities.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Engine-assigned id of a watched element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct ElementId(pub u32);

/// Handle returned by the platform observer for one observed element.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ObserverHandle(pub u32);

/// Handle for one pending frame callback.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct FrameToken(pub u32);

/// Host-side reference to a UI element (e.g. a DOM id or a widget key).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementKey(pub String);

impl ElementKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ElementKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ElementKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for ElementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic allocator for ElementId.
/// Ids are never reused within one engine, so a stale id can't alias a remounted element.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_element: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_element(&mut self) -> ElementId {
        let id = ElementId(self.next_element);
        self.next_element = self.next_element.wrapping_add(1);
        id
    }

    #[inline]
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
