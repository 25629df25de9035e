use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    configs: HashMap<String, String>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = fixtures_root().join(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

/// Registration requests (`WatchSpec` JSON) shared by tests and benches.
pub mod configs {
    use super::*;
    use reveal_core::WatchSpec;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.configs.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn json(name: &str) -> Result<String> {
        let rel = lookup(&MANIFEST.configs, "config", name)?;
        read_to_string(rel)
    }

    pub fn load(name: &str) -> Result<WatchSpec> {
        let text = json(name)?;
        serde_json::from_str(&text).with_context(|| format!("failed to parse config fixture {name}"))
    }
}

/// In-memory viewport: hands out handles, groups them by option set the way a
/// browser shares one `IntersectionObserver` per options, queues the entry a
/// browser reports right after `observe`, and fabricates entries on demand.
pub mod viewport {
    use hashbrown::{HashMap, HashSet};
    use reveal_core::{
        ElementKey, Engine, FrameScheduler, IntersectionEntry, ObserveOptions, ObserverHandle,
        RevealError, ViewportObserver,
    };

    #[derive(Debug, Clone)]
    struct Observed {
        key: ElementKey,
        share_key: [u64; 5],
    }

    #[derive(Debug, Default)]
    pub struct FakeViewport {
        next: u32,
        unavailable: bool,
        live: HashMap<ObserverHandle, Observed>,
        observe_calls: Vec<ElementKey>,
        released: Vec<ObserverHandle>,
        visible_at_mount: HashSet<ElementKey>,
        initial: Vec<IntersectionEntry>,
    }

    impl FakeViewport {
        pub fn new() -> Self {
            Self::default()
        }

        /// A viewport whose `observe` always fails.
        pub fn unavailable() -> Self {
            Self {
                unavailable: true,
                ..Self::default()
            }
        }

        pub fn set_available(&mut self, available: bool) {
            self.unavailable = !available;
        }

        /// Report `key` as already on screen when it is next observed.
        pub fn set_visible_at_mount(&mut self, key: &str) {
            self.visible_at_mount.insert(ElementKey::from(key));
        }

        /// Drain the registration entries not delivered yet, oldest first.
        pub fn take_initial(&mut self) -> Vec<IntersectionEntry> {
            std::mem::take(&mut self.initial)
        }

        /// Live handle for `key`, if it is being observed.
        pub fn handle_for(&self, key: &str) -> Option<ObserverHandle> {
            self.live
                .iter()
                .find(|(_, o)| o.key.as_str() == key)
                .map(|(h, _)| *h)
        }

        /// Entry the platform would deliver for `key`. `None` once released.
        pub fn entry(&self, key: &str, ratio: f64, is_intersecting: bool) -> Option<IntersectionEntry> {
            self.handle_for(key).map(|handle| IntersectionEntry {
                handle,
                ratio,
                is_intersecting,
            })
        }

        pub fn enter(&self, key: &str) -> Option<IntersectionEntry> {
            self.entry(key, 1.0, true)
        }

        pub fn leave(&self, key: &str) -> Option<IntersectionEntry> {
            self.entry(key, 0.0, false)
        }

        /// Every `observe` call, in order, including ones for repeated keys.
        pub fn observe_calls(&self) -> &[ElementKey] {
            &self.observe_calls
        }

        pub fn released(&self) -> &[ObserverHandle] {
            &self.released
        }

        pub fn live(&self) -> usize {
            self.live.len()
        }

        pub fn is_observing(&self, key: &str) -> bool {
            self.handle_for(key).is_some()
        }

        /// Distinct option sets with at least one live element.
        pub fn shared_observers(&self) -> usize {
            let mut groups: Vec<[u64; 5]> = self.live.values().map(|o| o.share_key).collect();
            groups.sort_unstable();
            groups.dedup();
            groups.len()
        }
    }

    impl ViewportObserver for FakeViewport {
        fn observe(
            &mut self,
            element: &ElementKey,
            options: &ObserveOptions,
        ) -> reveal_core::Result<ObserverHandle> {
            self.observe_calls.push(element.clone());
            if self.unavailable {
                return Err(RevealError::resource("viewport observer unavailable"));
            }
            self.next += 1;
            let handle = ObserverHandle(self.next);
            let visible = self.visible_at_mount.contains(element);
            self.initial.push(IntersectionEntry {
                handle,
                ratio: if visible { 1.0 } else { 0.0 },
                is_intersecting: visible,
            });
            self.live.insert(
                handle,
                Observed {
                    key: element.clone(),
                    share_key: options.share_key(),
                },
            );
            Ok(handle)
        }

        fn unobserve(&mut self, handle: ObserverHandle) {
            self.initial.retain(|e| e.handle != handle);
            if self.live.remove(&handle).is_some() {
                self.released.push(handle);
            }
        }
    }

    /// Hand the engine every pending registration entry at `now`.
    pub fn deliver_initial<F: FrameScheduler>(eng: &mut Engine<FakeViewport, F>, now: f64) {
        for entry in eng.viewport_mut().take_initial() {
            eng.handle_intersection(&entry, now);
        }
    }
}

/// Manually fired frame scheduler.
pub mod frames {
    use reveal_core::{FrameScheduler, FrameToken, RevealError};

    #[derive(Debug, Default)]
    pub struct ManualFrames {
        next: u32,
        failing: bool,
        pending: Vec<FrameToken>,
        cancelled: Vec<FrameToken>,
    }

    impl ManualFrames {
        pub fn new() -> Self {
            Self::default()
        }

        /// Outstanding requests.
        pub fn pending(&self) -> usize {
            self.pending.len()
        }

        /// Total requests ever made.
        pub fn requested(&self) -> u32 {
            self.next
        }

        pub fn cancelled(&self) -> &[FrameToken] {
            &self.cancelled
        }

        /// While set, every request fails the way a throwing host callback does.
        pub fn set_failing(&mut self, failing: bool) {
            self.failing = failing;
        }

        /// Fire the oldest pending request, as the host would before calling
        /// `Engine::update`.
        pub fn fire(&mut self) -> Option<FrameToken> {
            if self.pending.is_empty() {
                None
            } else {
                Some(self.pending.remove(0))
            }
        }
    }

    impl FrameScheduler for ManualFrames {
        fn request_frame(&mut self) -> reveal_core::Result<FrameToken> {
            if self.failing {
                return Err(RevealError::resource("frame scheduler unavailable"));
            }
            self.next += 1;
            let token = FrameToken(self.next);
            self.pending.push(token);
            Ok(token)
        }

        fn cancel_frame(&mut self, token: FrameToken) {
            if let Some(pos) = self.pending.iter().position(|t| *t == token) {
                self.pending.remove(pos);
                self.cancelled.push(token);
            }
        }
    }
}

pub use frames::ManualFrames;
pub use viewport::{deliver_initial, FakeViewport};
