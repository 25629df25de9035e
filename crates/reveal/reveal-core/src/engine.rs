//! Engine: element ownership, trigger routing and per-frame sampling.
//!
//! Methods:
//! - new, watch / watch_timeline / watch_counter / watch_sequence (mount)
//! - handle_intersection (platform callback), on_frame (frame callback),
//!   update (sample outside a frame callback)
//! - cancel, unmount, dispose (teardown; all idempotent)

use hashbrown::HashMap;
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

use crate::config::{
    AnimationConfig, CounterSpec, DriverSpec, RevealConfig, TriggerConfig, ValuesSpec, WatchSpec,
};
use crate::counter::NumericCounter;
use crate::error::{Result, RevealError};
use crate::frames::FrameScheduler;
use crate::ids::{ElementId, ElementKey, FrameToken, IdAllocator};
use crate::inputs::Inputs;
use crate::outputs::{Change, Outputs, RevealEvent};
use crate::sequencer::SequenceGroup;
use crate::timeline::{Timeline, TimelineStatus};
use crate::trigger::{Trigger, TriggerPolicy};
use crate::value::ValueSet;
use crate::watcher::{IntersectionEntry, ObserveOptions, ViewportObserver, VisibilityWatcher};

/// What an element animates once activated.
#[derive(Clone, Debug)]
pub enum Driver {
    Timeline(Timeline),
    Counter(NumericCounter),
    Sequence(SequenceGroup),
}

impl Driver {
    /// Build the driver described by `spec`, using timing from `cfg`.
    pub fn from_spec(cfg: &RevealConfig, spec: &DriverSpec) -> Result<Self> {
        let repeat = !cfg.once;
        match spec {
            DriverSpec::Timeline { values } => {
                let anim = cfg.animation(
                    values.initial_values.clone(),
                    values.target_values.clone(),
                )?;
                Ok(Driver::Timeline(Timeline::new(anim).with_repeat(repeat)))
            }
            DriverSpec::Counter { counter } => {
                Ok(Driver::Counter(NumericCounter::new(counter, cfg)?))
            }
            DriverSpec::Sequence { children } => {
                let children = children
                    .iter()
                    .map(|c| cfg.animation(c.initial_values.clone(), c.target_values.clone()))
                    .collect::<Result<Vec<AnimationConfig>>>()?;
                Ok(Driver::Sequence(SequenceGroup::new(
                    children,
                    cfg.stagger_interval,
                    repeat,
                )?))
            }
        }
    }

    fn activate(&mut self, at: f64) {
        match self {
            Driver::Timeline(t) => {
                t.start(at);
            }
            Driver::Counter(c) => {
                c.start(at);
            }
            Driver::Sequence(s) => s.activate(at),
        }
    }

    fn deactivate(&mut self) {
        match self {
            Driver::Timeline(t) => t.reset(),
            Driver::Counter(c) => c.reset(),
            Driver::Sequence(s) => s.deactivate(),
        }
    }

    fn cancel(&mut self) {
        match self {
            Driver::Timeline(t) => t.cancel(),
            Driver::Counter(c) => c.cancel(),
            Driver::Sequence(s) => s.cancel(),
        }
    }

    fn sample(&mut self, now: f64) -> TimelineStatus {
        match self {
            Driver::Timeline(t) => t.sample(now),
            Driver::Counter(c) => c.sample(now),
            Driver::Sequence(s) => s.sample(now),
        }
    }

    /// Aggregate status (a sequence reports its children's aggregate).
    pub fn status(&self) -> TimelineStatus {
        match self {
            Driver::Timeline(t) => t.status(),
            Driver::Counter(c) => c.status(),
            Driver::Sequence(s) => s.status(),
        }
    }

    /// Number of independently reported timelines.
    fn units(&self) -> usize {
        match self {
            Driver::Sequence(s) => s.len(),
            _ => 1,
        }
    }

    fn unit_status(&self, unit: usize) -> TimelineStatus {
        match self {
            Driver::Sequence(s) => s
                .child(unit)
                .map(Timeline::status)
                .unwrap_or(TimelineStatus::Idle),
            other => other.status(),
        }
    }

    fn unit_values(&self, unit: usize) -> (Option<usize>, ValueSet, Option<String>) {
        match self {
            Driver::Timeline(t) => (None, t.current().clone(), None),
            Driver::Counter(c) => (None, c.timeline().current().clone(), Some(c.display())),
            Driver::Sequence(s) => (
                Some(unit),
                s.child(unit)
                    .map(|c| c.current().clone())
                    .unwrap_or_default(),
                None,
            ),
        }
    }
}

/// One mounted element and everything it owns.
#[derive(Debug)]
pub struct WatchedElement {
    pub id: ElementId,
    pub key: ElementKey,
    pub trigger: TriggerConfig,
    policy: TriggerPolicy,
    driver: Driver,
    /// Per-unit status as of the last emitted change.
    reported: Vec<TimelineStatus>,
    cancelled: bool,
}

impl WatchedElement {
    pub fn policy(&self) -> &TriggerPolicy {
        &self.policy
    }

    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    fn change(&self, unit: usize) -> Change {
        let (child, values, text) = self.driver.unit_values(unit);
        Change {
            element: self.id,
            key: self.key.clone(),
            child,
            status: self.driver.unit_status(unit),
            values,
            text,
        }
    }
}

/// Queryable summary of one element.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStatus {
    pub key: ElementKey,
    pub intersecting: bool,
    pub last_ratio: f64,
    pub subscribed: bool,
    pub spent: bool,
    pub cancelled: bool,
    pub timeline: TimelineStatus,
}

/// Engine over a viewport capability `V` and a frame scheduler `F`.
#[derive(Debug)]
pub struct Engine<V, F> {
    ids: IdAllocator,
    watcher: VisibilityWatcher<V>,
    frames: F,
    pending_frame: Option<FrameToken>,
    elements: HashMap<ElementId, WatchedElement>,
    by_key: HashMap<ElementKey, ElementId>,
    /// Registration order; sampling and outputs follow it.
    order: Vec<ElementId>,
    /// Events raised between frames, flushed by the next update.
    queued: Vec<RevealEvent>,
    outputs: Outputs,
}

impl<V: ViewportObserver, F: FrameScheduler> Engine<V, F> {
    pub fn new(viewport: V, frames: F) -> Self {
        Self {
            ids: IdAllocator::new(),
            watcher: VisibilityWatcher::new(viewport),
            frames,
            pending_frame: None,
            elements: HashMap::new(),
            by_key: HashMap::new(),
            order: Vec::new(),
            queued: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    /// Mount an element from a full registration request.
    pub fn watch(&mut self, key: impl Into<ElementKey>, spec: &WatchSpec) -> Result<ElementId> {
        spec.config.validate()?;
        let driver = Driver::from_spec(&spec.config, &spec.driver)?;
        self.watch_driver(key.into(), spec.config.trigger()?, driver)
    }

    pub fn watch_timeline(
        &mut self,
        key: impl Into<ElementKey>,
        cfg: &RevealConfig,
        initial_values: ValueSet,
        target_values: ValueSet,
    ) -> Result<ElementId> {
        self.watch(
            key,
            &WatchSpec {
                config: cfg.clone(),
                driver: DriverSpec::Timeline {
                    values: ValuesSpec {
                        initial_values,
                        target_values,
                    },
                },
            },
        )
    }

    pub fn watch_counter(
        &mut self,
        key: impl Into<ElementKey>,
        cfg: &RevealConfig,
        counter: CounterSpec,
    ) -> Result<ElementId> {
        self.watch(
            key,
            &WatchSpec {
                config: cfg.clone(),
                driver: DriverSpec::Counter { counter },
            },
        )
    }

    pub fn watch_sequence(
        &mut self,
        key: impl Into<ElementKey>,
        cfg: &RevealConfig,
        children: Vec<ValuesSpec>,
    ) -> Result<ElementId> {
        self.watch(
            key,
            &WatchSpec {
                config: cfg.clone(),
                driver: DriverSpec::Sequence { children },
            },
        )
    }

    /// Mount with a prebuilt driver. A key that is already mounted keeps its
    /// existing element and subscription; the new driver is discarded.
    pub fn watch_driver(
        &mut self,
        key: ElementKey,
        trigger: TriggerConfig,
        driver: Driver,
    ) -> Result<ElementId> {
        if let Some(id) = self.by_key.get(&key) {
            debug!("{key} already mounted as {id}; keeping existing subscription");
            return Ok(*id);
        }
        let id = self.ids.alloc_element();
        self.watcher
            .register(id, &key, &ObserveOptions::from(&trigger))?;
        let reported = (0..driver.units()).map(|u| driver.unit_status(u)).collect();
        self.elements.insert(
            id,
            WatchedElement {
                id,
                key: key.clone(),
                trigger,
                policy: TriggerPolicy::new(trigger.once),
                driver,
                reported,
                cancelled: false,
            },
        );
        self.by_key.insert(key, id);
        self.order.push(id);
        Ok(id)
    }

    /// Apply one platform notification at time `now`. Returns the trigger it
    /// caused, if any. Entries for released or cancelled elements are ignored,
    /// and the first entry after registration only records the baseline.
    pub fn handle_intersection(&mut self, entry: &IntersectionEntry, now: f64) -> Option<Trigger> {
        let change = self.watcher.route(entry)?;
        let el = self.elements.get_mut(&change.element)?;
        if el.cancelled {
            return None;
        }
        if change.initial {
            el.policy.baseline(change.ratio, change.is_intersecting);
            trace!(
                "{} ({}) baseline intersecting={}",
                el.key,
                el.id,
                change.is_intersecting
            );
            return None;
        }
        let trigger = el.policy.observe(change.ratio, change.is_intersecting)?;
        let id = el.id;
        match trigger {
            Trigger::Activate => {
                el.driver.activate(now);
                debug!("{} ({id}) activated at {now}", el.key);
                self.queued.push(RevealEvent::Activated { element: id, at: now });
                if el.policy.is_spent() && self.watcher.unregister(id) {
                    self.queued.push(RevealEvent::Unsubscribed { element: id });
                }
            }
            Trigger::Deactivate => {
                el.driver.deactivate();
                debug!("{} ({id}) deactivated at {now}", el.key);
                self.queued
                    .push(RevealEvent::Deactivated { element: id, at: now });
            }
        }
        self.ensure_frame();
        Some(trigger)
    }

    /// Frame callback for `token`: the request is consumed, then the engine
    /// updates at `now`. A stale token leaves the pending request alone.
    pub fn on_frame(&mut self, token: FrameToken, now: f64, inputs: Inputs) -> &Outputs {
        if self.pending_frame == Some(token) {
            self.pending_frame = None;
        } else {
            trace!("frame {token:?} is not the pending request");
        }
        self.update(now, inputs)
    }

    /// Apply `inputs`, then sample every live element at `now`. Leaves an
    /// outstanding frame request in place while anything is animating.
    pub fn update(&mut self, now: f64, inputs: Inputs) -> &Outputs {
        self.outputs.clear();

        for entry in &inputs.intersections {
            self.handle_intersection(entry, now);
        }
        for id in inputs.unmounts {
            self.unmount(id);
        }
        self.outputs.events.append(&mut self.queued);

        for id in &self.order {
            let Some(el) = self.elements.get_mut(id) else {
                continue;
            };
            if el.cancelled {
                continue;
            }
            el.driver.sample(now);
            for unit in 0..el.reported.len() {
                let before = el.reported[unit];
                let after = el.driver.unit_status(unit);
                let child = matches!(el.driver, Driver::Sequence(_)).then_some(unit);
                let started = match after {
                    TimelineStatus::Running => before != TimelineStatus::Running,
                    // finished between two frames without ever being seen Running
                    TimelineStatus::Completed => before.rank() < TimelineStatus::Running.rank(),
                    _ => false,
                };
                if started {
                    self.outputs.push_event(RevealEvent::TimelineStarted {
                        element: el.id,
                        child,
                    });
                }
                if after == TimelineStatus::Completed && before != TimelineStatus::Completed {
                    self.outputs.push_event(RevealEvent::TimelineCompleted {
                        element: el.id,
                        child,
                    });
                }
                if after == TimelineStatus::Running || after != before {
                    self.outputs.push_change(el.change(unit));
                }
                el.reported[unit] = after;
            }
        }

        if self.is_animating() {
            self.ensure_frame();
        } else {
            self.release_frame_if_idle();
        }
        trace!(
            "update at {now}: {} changes, {} events",
            self.outputs.changes.len(),
            self.outputs.events.len()
        );
        &self.outputs
    }

    /// Stop an element: release its observer and freeze its timelines.
    /// Returns false when there was nothing to cancel.
    pub fn cancel(&mut self, id: ElementId) -> bool {
        let Some(el) = self.elements.get_mut(&id) else {
            return false;
        };
        if el.cancelled {
            return false;
        }
        el.cancelled = true;
        el.driver.cancel();
        self.watcher.unregister(id);
        self.queued.push(RevealEvent::Cancelled { element: id });
        debug!("{} ({id}) cancelled", el.key);
        self.release_frame_if_idle();
        true
    }

    /// Cancel and forget an element. Safe to call repeatedly.
    pub fn unmount(&mut self, id: ElementId) -> bool {
        let cancelled = self.cancel(id);
        match self.elements.remove(&id) {
            Some(el) => {
                self.by_key.remove(&el.key);
                self.order.retain(|e| *e != id);
                debug!("{} ({id}) unmounted", el.key);
                true
            }
            None => cancelled,
        }
    }

    /// Unmount everything and withdraw any pending frame.
    pub fn dispose(&mut self) {
        for id in std::mem::take(&mut self.order) {
            self.unmount(id);
        }
        if let Some(token) = self.pending_frame.take() {
            self.frames.cancel_frame(token);
        }
    }

    /// Current snapshot of every unit of `id`, regardless of status.
    pub fn snapshot(&self, id: ElementId) -> Result<Vec<Change>> {
        let el = self
            .elements
            .get(&id)
            .ok_or(RevealError::UnknownElement { id: id.0 })?;
        Ok((0..el.driver.units()).map(|u| el.change(u)).collect())
    }

    pub fn status(&self, id: ElementId) -> Result<ElementStatus> {
        let el = self
            .elements
            .get(&id)
            .ok_or(RevealError::UnknownElement { id: id.0 })?;
        Ok(ElementStatus {
            key: el.key.clone(),
            intersecting: el.policy.is_intersecting(),
            last_ratio: el.policy.last_ratio(),
            subscribed: self.watcher.is_registered(id),
            spent: el.policy.is_spent(),
            cancelled: el.cancelled,
            timeline: el.driver.status(),
        })
    }

    pub fn element(&self, id: ElementId) -> Option<&WatchedElement> {
        self.elements.get(&id)
    }

    pub fn id_for(&self, key: &ElementKey) -> Option<ElementId> {
        self.by_key.get(key).copied()
    }

    /// Whether any live element still needs frames.
    pub fn is_animating(&self) -> bool {
        self.elements
            .values()
            .any(|el| !el.cancelled && el.driver.status().is_active())
    }

    pub fn pending_frame(&self) -> Option<FrameToken> {
        self.pending_frame
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Live observer subscriptions.
    pub fn subscriptions(&self) -> usize {
        self.watcher.active()
    }

    pub fn viewport(&self) -> &V {
        self.watcher.platform()
    }

    pub fn viewport_mut(&mut self) -> &mut V {
        self.watcher.platform_mut()
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut F {
        &mut self.frames
    }

    fn ensure_frame(&mut self) {
        if self.pending_frame.is_none() && self.is_animating() {
            match self.frames.request_frame() {
                Ok(token) => {
                    trace!("requested frame {token:?}");
                    self.pending_frame = Some(token);
                }
                Err(e) => warn!("frame request failed: {e}"),
            }
        }
    }

    fn release_frame_if_idle(&mut self) {
        if self.is_animating() {
            return;
        }
        if let Some(token) = self.pending_frame.take() {
            trace!("withdrawing frame {token:?}");
            self.frames.cancel_frame(token);
        }
    }
}
