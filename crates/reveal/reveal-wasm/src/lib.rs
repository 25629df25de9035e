use js_sys::Function;
use serde::Serialize;
use serde_wasm_bindgen as swb;
use wasm_bindgen::prelude::*;

use reveal_core::{
    ElementId, ElementKey, Engine, FrameScheduler, FrameToken, Inputs, IntersectionEntry,
    ObserveOptions, ObserverHandle, Outputs, RevealError, ViewportObserver, WatchSpec,
};

fn jsvalue_is_undefined_or_null(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

fn core_error(context: &str, e: RevealError) -> JsError {
    JsError::new(&format!("{context} ({}): {e}", e.category()))
}

/// A JS number that is a whole value within `u32`.
fn as_u32(v: &JsValue) -> Option<u32> {
    v.as_f64()
        .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= f64::from(u32::MAX))
        .map(|n| n as u32)
}

/// Options handed to the JS `observe` callback.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsObserveOptions {
    threshold: f64,
    root_margin: String,
}

/// Viewport capability backed by two JS callbacks:
/// `observe(key, { threshold, rootMargin }) -> number` and `unobserve(handle)`.
struct JsViewport {
    observe: Function,
    unobserve: Function,
}

impl ViewportObserver for JsViewport {
    fn observe(
        &mut self,
        element: &ElementKey,
        options: &ObserveOptions,
    ) -> reveal_core::Result<ObserverHandle> {
        let opts = swb::to_value(&JsObserveOptions {
            threshold: options.threshold,
            root_margin: options.margin_bias.to_root_margin(),
        })
        .map_err(|e| RevealError::resource(format!("observe options: {e}")))?;
        let key = JsValue::from_str(element.as_str());
        let handle = self
            .observe
            .call2(&JsValue::UNDEFINED, &key, &opts)
            .map_err(|e| RevealError::resource(format!("observe threw: {e:?}")))?;
        as_u32(&handle)
            .map(ObserverHandle)
            .ok_or_else(|| {
                RevealError::resource(format!("observe returned {handle:?}, not an integer handle"))
            })
    }

    fn unobserve(&mut self, handle: ObserverHandle) {
        let _ = self
            .unobserve
            .call1(&JsValue::UNDEFINED, &JsValue::from(handle.0));
    }
}

/// Frame scheduler backed by `requestFrame() -> number` and `cancelFrame(token)`,
/// typically thin wrappers over `requestAnimationFrame`.
struct JsFrames {
    request: Function,
    cancel: Function,
}

impl FrameScheduler for JsFrames {
    fn request_frame(&mut self) -> reveal_core::Result<FrameToken> {
        let token = self
            .request
            .call0(&JsValue::UNDEFINED)
            .map_err(|e| RevealError::resource(format!("requestFrame threw: {e:?}")))?;
        as_u32(&token).map(FrameToken).ok_or_else(|| {
            RevealError::resource(format!("requestFrame returned {token:?}, not an integer token"))
        })
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let _ = self
            .cancel
            .call1(&JsValue::UNDEFINED, &JsValue::from(token.0));
    }
}

fn parse_inputs(inputs_json: JsValue) -> Result<Inputs, JsError> {
    if jsvalue_is_undefined_or_null(&inputs_json) {
        Ok(Inputs::default())
    } else {
        swb::from_value(inputs_json).map_err(|e| JsError::new(&format!("inputs error: {e}")))
    }
}

#[wasm_bindgen]
pub struct RevealEngine {
    core: Engine<JsViewport, JsFrames>,
}

#[wasm_bindgen]
impl RevealEngine {
    /// Create an engine over host callbacks.
    /// Example:
    ///   new RevealEngine(observe, unobserve, () => requestAnimationFrame(tick), cancelAnimationFrame)
    #[wasm_bindgen(constructor)]
    pub fn new(
        observe: Function,
        unobserve: Function,
        request_frame: Function,
        cancel_frame: Function,
    ) -> RevealEngine {
        console_error_panic_hook::set_once();
        RevealEngine {
            core: Engine::new(
                JsViewport { observe, unobserve },
                JsFrames {
                    request: request_frame,
                    cancel: cancel_frame,
                },
            ),
        }
    }

    /// Mount an element. `spec` is a WatchSpec object (options plus `kind`).
    /// Returns the element id (u32).
    #[wasm_bindgen]
    pub fn watch(&mut self, key: String, spec: JsValue) -> Result<u32, JsError> {
        if jsvalue_is_undefined_or_null(&spec) {
            return Err(JsError::new("watch: spec is null/undefined"));
        }
        let spec: WatchSpec =
            swb::from_value(spec).map_err(|e| JsError::new(&format!("watch spec error: {e}")))?;
        let id = self
            .core
            .watch(key, &spec)
            .map_err(|e| core_error("watch", e))?;
        Ok(id.0)
    }

    /// Same as `watch`, taking the WatchSpec as a JSON string.
    #[wasm_bindgen(js_name = watch_json)]
    pub fn watch_json(&mut self, key: String, spec_json: &str) -> Result<u32, JsError> {
        let spec: WatchSpec = serde_json::from_str(spec_json)
            .map_err(|e| JsError::new(&format!("watch spec parse error: {e}")))?;
        let id = self
            .core
            .watch(key, &spec)
            .map_err(|e| core_error("watch", e))?;
        Ok(id.0)
    }

    /// Forward one IntersectionObserver entry `{ handle, ratio, isIntersecting }`
    /// observed at `now` (seconds). Returns "Activate", "Deactivate" or null.
    /// The first entry per handle is the state at `observe` and returns null.
    #[wasm_bindgen]
    pub fn intersect(&mut self, entry: JsValue, now: f64) -> Result<JsValue, JsError> {
        let entry: IntersectionEntry =
            swb::from_value(entry).map_err(|e| JsError::new(&format!("entry error: {e}")))?;
        let trigger = self.core.handle_intersection(&entry, now);
        swb::to_value(&trigger).map_err(|e| JsError::new(&format!("trigger error: {e}")))
    }

    /// Frame callback for the token `requestFrame` returned: sample at `now`
    /// (seconds) with optional Inputs. Returns Outputs.
    #[wasm_bindgen(js_name = on_frame)]
    pub fn on_frame(&mut self, token: u32, now: f64, inputs_json: JsValue) -> Result<JsValue, JsError> {
        let inputs = parse_inputs(inputs_json)?;
        let out: &Outputs = self.core.on_frame(FrameToken(token), now, inputs);
        swb::to_value(out).map_err(|e| JsError::new(&format!("outputs error: {e}")))
    }

    /// Sample at `now` outside a frame callback; a pending request stays
    /// outstanding. Returns Outputs.
    #[wasm_bindgen]
    pub fn update(&mut self, now: f64, inputs_json: JsValue) -> Result<JsValue, JsError> {
        let inputs = parse_inputs(inputs_json)?;
        let out: &Outputs = self.core.update(now, inputs);
        swb::to_value(out).map_err(|e| JsError::new(&format!("outputs error: {e}")))
    }

    /// Token of the outstanding frame request, if any.
    #[wasm_bindgen(js_name = pending_frame)]
    pub fn pending_frame(&self) -> Option<u32> {
        self.core.pending_frame().map(|t| t.0)
    }

    #[wasm_bindgen]
    pub fn cancel(&mut self, id: u32) -> bool {
        self.core.cancel(ElementId(id))
    }

    #[wasm_bindgen]
    pub fn unmount(&mut self, id: u32) -> bool {
        self.core.unmount(ElementId(id))
    }

    #[wasm_bindgen]
    pub fn dispose(&mut self) {
        self.core.dispose();
    }

    /// Current values of every timeline of `id`; apply before first paint.
    #[wasm_bindgen]
    pub fn snapshot(&self, id: u32) -> Result<JsValue, JsError> {
        let changes = self
            .core
            .snapshot(ElementId(id))
            .map_err(|e| core_error("snapshot", e))?;
        swb::to_value(&changes).map_err(|e| JsError::new(&format!("snapshot error: {e}")))
    }

    #[wasm_bindgen]
    pub fn status(&self, id: u32) -> Result<JsValue, JsError> {
        let status = self
            .core
            .status(ElementId(id))
            .map_err(|e| core_error("status", e))?;
        swb::to_value(&status).map_err(|e| JsError::new(&format!("status error: {e}")))
    }

    #[wasm_bindgen(js_name = is_animating)]
    pub fn is_animating(&self) -> bool {
        self.core.is_animating()
    }

    #[wasm_bindgen(getter)]
    pub fn len(&self) -> usize {
        self.core.len()
    }
}

/// Numeric ABI version for compatibility checks at init.
#[wasm_bindgen]
pub fn abi_version() -> u32 {
    1
}
