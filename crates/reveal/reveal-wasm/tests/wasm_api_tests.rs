#![cfg(target_arch = "wasm32")]
use js_sys::{Function, Reflect};
use reveal_wasm::{abi_version, RevealEngine};
use serde_json::json;
use serde_wasm_bindgen as swb;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

fn engine() -> RevealEngine {
    RevealEngine::new(
        Function::new_with_args("key, opts", "return 7;"),
        Function::new_no_args(""),
        Function::new_no_args("return 1;"),
        Function::new_with_args("token", ""),
    )
}

fn fade_spec() -> JsValue {
    swb::to_value(&json!({
        "kind": "timeline",
        "duration": 0.5,
        "initialValues": { "opacity": 0 },
        "targetValues": { "opacity": 1 }
    }))
    .unwrap()
}

fn entry(is_intersecting: bool) -> JsValue {
    swb::to_value(&json!({
        "handle": 7,
        "ratio": if is_intersecting { 1.0 } else { 0.0 },
        "isIntersecting": is_intersecting
    }))
    .unwrap()
}

fn no_trigger(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}

#[wasm_bindgen_test]
fn abi_is_1() {
    assert_eq!(abi_version(), 1);
}

#[wasm_bindgen_test]
fn watch_then_activate_emits_changes() {
    let mut eng = engine();
    let id = eng.watch("hero".into(), fade_spec()).unwrap();
    assert_eq!(eng.len(), 1);

    // registration entry: baseline only
    assert!(no_trigger(&eng.intersect(entry(false), 0.0).unwrap()));
    let trigger = eng.intersect(entry(true), 0.0).unwrap();
    assert_eq!(trigger.as_string().as_deref(), Some("Activate"));
    assert!(eng.is_animating());
    assert_eq!(eng.pending_frame(), Some(1));

    let out = eng.on_frame(1, 0.25, JsValue::UNDEFINED).unwrap();
    let changes = Reflect::get(&out, &JsValue::from_str("changes")).unwrap();
    assert_eq!(js_sys::Array::from(&changes).length(), 1);

    eng.update(0.5, JsValue::NULL).unwrap();
    assert!(!eng.is_animating());
    assert_eq!(eng.pending_frame(), None);
    assert!(eng.unmount(id));
    assert!(!eng.unmount(id));
}

#[wasm_bindgen_test]
fn observe_failure_is_reported() {
    let mut eng = RevealEngine::new(
        Function::new_with_args("key, opts", "throw new Error('no observer');"),
        Function::new_no_args(""),
        Function::new_no_args("return 1;"),
        Function::new_with_args("token", ""),
    );
    assert!(eng.watch("hero".into(), fade_spec()).is_err());
    assert_eq!(eng.len(), 0);
}

#[wasm_bindgen_test]
fn watch_json_rejects_bad_config() {
    let mut eng = engine();
    let bad = r#"{"kind":"timeline","thresholdRatio":2}"#;
    assert!(eng.watch_json("hero".into(), bad).is_err());
    let good = r#"{"kind":"counter","to":100}"#;
    let id = eng.watch_json("stat".into(), good).unwrap();
    let snap = eng.snapshot(id).unwrap();
    let first = js_sys::Array::from(&snap).get(0);
    let text = Reflect::get(&first, &JsValue::from_str("text")).unwrap();
    assert_eq!(text.as_string().as_deref(), Some("0"));
}

#[wasm_bindgen_test]
fn visible_at_mount_stays_quiet() {
    let mut eng = engine();
    eng.watch("hero".into(), fade_spec()).unwrap();
    assert!(no_trigger(&eng.intersect(entry(true), 0.0).unwrap()));
    assert!(!eng.is_animating());
}

#[wasm_bindgen_test]
fn fractional_handle_is_rejected() {
    let mut eng = RevealEngine::new(
        Function::new_with_args("key, opts", "return 7.5;"),
        Function::new_no_args(""),
        Function::new_no_args("return 1;"),
        Function::new_with_args("token", ""),
    );
    assert!(eng.watch("hero".into(), fade_spec()).is_err());
    assert_eq!(eng.len(), 0);
}

#[wasm_bindgen_test]
fn throwing_request_frame_leaves_no_pending_token() {
    let mut eng = RevealEngine::new(
        Function::new_with_args("key, opts", "return 7;"),
        Function::new_no_args(""),
        Function::new_no_args("throw new Error('no frames');"),
        Function::new_with_args("token", ""),
    );
    eng.watch("hero".into(), fade_spec()).unwrap();
    eng.intersect(entry(false), 0.0).unwrap();
    eng.intersect(entry(true), 0.0).unwrap();
    assert!(eng.is_animating());
    assert_eq!(eng.pending_frame(), None);
}
