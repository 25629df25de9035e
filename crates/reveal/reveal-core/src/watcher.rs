//! Visibility watcher over an injected viewport-intersection capability.
//!
//! The platform primitive (a browser `IntersectionObserver`, a scroll view
//! hit-test, a test double) sits behind [`ViewportObserver`]. The watcher
//! keeps exactly one subscription per element and routes platform entries
//! back to element ids. The first entry per subscription describes the state
//! at registration and is flagged `initial`.

use hashbrown::{HashMap, HashSet};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{MarginBias, TriggerConfig};
use crate::error::Result;
use crate::ids::{ElementId, ElementKey, ObserverHandle};

/// Options forwarded to the platform when observing an element.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObserveOptions {
    pub threshold: f64,
    pub margin_bias: MarginBias,
}

impl ObserveOptions {
    /// Bitwise key for grouping elements that can share one platform observer.
    pub fn share_key(&self) -> [u64; 5] {
        let m = self.margin_bias;
        [
            self.threshold.to_bits(),
            m.top.to_bits(),
            m.right.to_bits(),
            m.bottom.to_bits(),
            m.left.to_bits(),
        ]
    }
}

impl From<&TriggerConfig> for ObserveOptions {
    fn from(cfg: &TriggerConfig) -> Self {
        Self {
            threshold: cfg.threshold,
            margin_bias: cfg.margin_bias,
        }
    }
}

/// One platform notification: the observed handle crossed a threshold.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersectionEntry {
    pub handle: ObserverHandle,
    pub ratio: f64,
    pub is_intersecting: bool,
}

/// An entry resolved to the element it belongs to.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct IntersectionChange {
    pub element: ElementId,
    pub ratio: f64,
    pub is_intersecting: bool,
    /// First entry since registration: a baseline, not a crossing.
    pub initial: bool,
}

/// Viewport-intersection capability provided by the host.
///
/// Implementations may share one underlying observer across elements with
/// identical options, but must hand out a distinct handle per `observe` call
/// and deliver entries tagged with that handle. Like `IntersectionObserver`,
/// the first entry for a handle reports the state at registration.
pub trait ViewportObserver {
    /// Start observing `element`. Fails with a resource error when the
    /// capability is unavailable.
    fn observe(&mut self, element: &ElementKey, options: &ObserveOptions)
        -> Result<ObserverHandle>;

    /// Stop observing. Must tolerate handles that were already released.
    fn unobserve(&mut self, handle: ObserverHandle);
}

impl<T: ViewportObserver + ?Sized> ViewportObserver for Box<T> {
    fn observe(
        &mut self,
        element: &ElementKey,
        options: &ObserveOptions,
    ) -> Result<ObserverHandle> {
        (**self).observe(element, options)
    }

    fn unobserve(&mut self, handle: ObserverHandle) {
        (**self).unobserve(handle)
    }
}

/// Per-element subscription bookkeeping on top of a [`ViewportObserver`].
#[derive(Debug)]
pub struct VisibilityWatcher<V> {
    platform: V,
    by_handle: HashMap<ObserverHandle, ElementId>,
    by_element: HashMap<ElementId, ObserverHandle>,
    /// Live handles that have not delivered their first entry yet.
    awaiting_baseline: HashSet<ObserverHandle>,
}

impl<V: ViewportObserver> VisibilityWatcher<V> {
    pub fn new(platform: V) -> Self {
        Self {
            platform,
            by_handle: HashMap::new(),
            by_element: HashMap::new(),
            awaiting_baseline: HashSet::new(),
        }
    }

    /// Subscribe `element`. A second call for the same element returns the
    /// live handle instead of subscribing again.
    pub fn register(
        &mut self,
        element: ElementId,
        key: &ElementKey,
        options: &ObserveOptions,
    ) -> Result<ObserverHandle> {
        if let Some(handle) = self.by_element.get(&element) {
            return Ok(*handle);
        }
        let handle = self.platform.observe(key, options).map_err(|e| {
            warn!("observe failed for {key} ({element}): {e}");
            e
        })?;
        if let Some(prev) = self.by_handle.insert(handle, element) {
            warn!("platform reused observer handle {handle:?} (was {prev}, now {element})");
            self.by_element.remove(&prev);
        }
        self.by_element.insert(element, handle);
        self.awaiting_baseline.insert(handle);
        debug!(
            "observing {key} as {element} (threshold {}, rootMargin {})",
            options.threshold,
            options.margin_bias.to_root_margin()
        );
        Ok(handle)
    }

    /// Release the element's subscription. Returns false when there was
    /// nothing to release; repeated calls are no-ops.
    pub fn unregister(&mut self, element: ElementId) -> bool {
        match self.by_element.remove(&element) {
            Some(handle) => {
                self.by_handle.remove(&handle);
                self.awaiting_baseline.remove(&handle);
                self.platform.unobserve(handle);
                debug!("released observer for {element}");
                true
            }
            None => false,
        }
    }

    /// Resolve a platform entry to its element. Entries for released
    /// handles resolve to `None`.
    pub fn route(&mut self, entry: &IntersectionEntry) -> Option<IntersectionChange> {
        match self.by_handle.get(&entry.handle) {
            Some(element) => Some(IntersectionChange {
                element: *element,
                ratio: entry.ratio,
                is_intersecting: entry.is_intersecting,
                initial: self.awaiting_baseline.remove(&entry.handle),
            }),
            None => {
                trace!("dropping entry for released handle {:?}", entry.handle);
                None
            }
        }
    }

    pub fn is_registered(&self, element: ElementId) -> bool {
        self.by_element.contains_key(&element)
    }

    pub fn handle_of(&self, element: ElementId) -> Option<ObserverHandle> {
        self.by_element.get(&element).copied()
    }

    /// Number of live subscriptions.
    pub fn active(&self) -> usize {
        self.by_element.len()
    }

    pub fn platform(&self) -> &V {
        &self.platform
    }

    pub fn platform_mut(&mut self) -> &mut V {
        &mut self.platform
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RevealError;

    #[derive(Default)]
    struct Recorder {
        next: u32,
        observed: Vec<String>,
        released: Vec<ObserverHandle>,
        unavailable: bool,
    }

    impl ViewportObserver for Recorder {
        fn observe(
            &mut self,
            element: &ElementKey,
            _options: &ObserveOptions,
        ) -> Result<ObserverHandle> {
            if self.unavailable {
                return Err(RevealError::resource("no IntersectionObserver"));
            }
            self.observed.push(element.to_string());
            self.next += 1;
            Ok(ObserverHandle(self.next))
        }

        fn unobserve(&mut self, handle: ObserverHandle) {
            self.released.push(handle);
        }
    }

    fn opts() -> ObserveOptions {
        ObserveOptions {
            threshold: 0.1,
            margin_bias: MarginBias::default(),
        }
    }

    #[test]
    fn one_subscription_per_element() {
        let mut w = VisibilityWatcher::new(Recorder::default());
        let key = ElementKey::from("card");
        let a = w.register(ElementId(0), &key, &opts()).unwrap();
        let b = w.register(ElementId(0), &key, &opts()).unwrap();
        assert_eq!(a, b);
        assert_eq!(w.platform().observed.len(), 1);
        assert_eq!(w.active(), 1);
    }

    #[test]
    fn unregister_is_idempotent() {
        let mut w = VisibilityWatcher::new(Recorder::default());
        let h = w
            .register(ElementId(7), &ElementKey::from("x"), &opts())
            .unwrap();
        assert!(w.unregister(ElementId(7)));
        assert!(!w.unregister(ElementId(7)));
        assert!(!w.unregister(ElementId(99)));
        assert_eq!(w.platform().released, vec![h]);
    }

    #[test]
    fn routes_only_live_handles() {
        let mut w = VisibilityWatcher::new(Recorder::default());
        let h = w
            .register(ElementId(3), &ElementKey::from("x"), &opts())
            .unwrap();
        let entry = IntersectionEntry {
            handle: h,
            ratio: 0.5,
            is_intersecting: true,
        };
        assert_eq!(w.route(&entry).map(|c| c.element), Some(ElementId(3)));
        w.unregister(ElementId(3));
        assert!(w.route(&entry).is_none());
    }

    #[test]
    fn first_entry_per_subscription_is_initial() {
        let mut w = VisibilityWatcher::new(Recorder::default());
        let h = w
            .register(ElementId(1), &ElementKey::from("x"), &opts())
            .unwrap();
        let entry = IntersectionEntry {
            handle: h,
            ratio: 1.0,
            is_intersecting: true,
        };
        assert_eq!(w.route(&entry).map(|c| c.initial), Some(true));
        assert_eq!(w.route(&entry).map(|c| c.initial), Some(false));

        w.unregister(ElementId(1));
        let h = w
            .register(ElementId(1), &ElementKey::from("x"), &opts())
            .unwrap();
        let entry = IntersectionEntry { handle: h, ..entry };
        assert_eq!(w.route(&entry).map(|c| c.initial), Some(true));
    }

    #[test]
    fn resource_error_surfaces_at_register() {
        let mut w = VisibilityWatcher::new(Recorder {
            unavailable: true,
            ..Default::default()
        });
        let err = w
            .register(ElementId(0), &ElementKey::from("x"), &opts())
            .unwrap_err();
        assert_eq!(err.category(), "resource");
        assert!(!w.is_registered(ElementId(0)));
    }

    #[test]
    fn share_key_groups_identical_options() {
        let a = opts();
        let b = opts();
        let c = ObserveOptions {
            threshold: 0.5,
            ..opts()
        };
        assert_eq!(a.share_key(), b.share_key());
        assert_ne!(a.share_key(), c.share_key());
    }
}
