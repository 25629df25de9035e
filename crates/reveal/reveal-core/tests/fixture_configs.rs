use reveal_core::{
    Driver, DriverSpec, Easing, Engine, Inputs, RevealEvent, TimelineStatus, WatchSpec,
};
use reveal_test_fixtures::{configs, deliver_initial, FakeViewport, ManualFrames};

#[test]
fn every_fixture_parses_and_mounts() {
    let mut eng = Engine::new(FakeViewport::new(), ManualFrames::new());
    let keys = configs::keys();
    assert!(!keys.is_empty());
    for name in &keys {
        let spec = configs::load(name).expect("fixture should parse");
        eng.watch(name.as_str(), &spec)
            .unwrap_or_else(|e| panic!("{name} failed to mount: {e}"));
    }
    assert_eq!(eng.len(), keys.len());
}

#[test]
fn fade_up_uses_documented_defaults() {
    let spec = configs::load("fade-up").expect("fade-up");
    assert!(spec.config.once);
    assert_eq!(spec.config.margin_bias.to_root_margin(), "0px 0px -100px 0px");
    assert_eq!(spec.config.easing, Easing::EaseOut);
    assert!(matches!(spec.driver, DriverSpec::Timeline { .. }));
}

#[test]
fn stagger_cards_builds_a_three_child_sequence() {
    let spec = configs::load("stagger-cards").expect("stagger-cards");
    assert_eq!(spec.config.threshold_ratio, 0.25);
    assert!(matches!(spec.config.easing, Easing::CubicBezier(_)));

    let mut eng = Engine::new(FakeViewport::new(), ManualFrames::new());
    let id = eng.watch("cards", &spec).expect("mount");
    let Some(Driver::Sequence(group)) = eng.element(id).map(|el| el.driver()) else {
        panic!("expected a sequence driver");
    };
    assert_eq!(group.len(), 3);
    assert_eq!(group.stagger(), 0.1);
}

#[test]
fn revenue_counter_renders_grouped_text() {
    let spec = configs::load("counter-revenue").expect("counter-revenue");
    let mut eng = Engine::new(FakeViewport::new(), ManualFrames::new());
    let id = eng.watch("revenue", &spec).expect("mount");
    deliver_initial(&mut eng, 0.0);
    let enter = eng.viewport().enter("revenue").expect("observed");
    eng.update(0.0, Inputs::new().with_intersection(enter));

    let out = eng.update(1.0, Inputs::new());
    let mid = out
        .changes_for(id)
        .next()
        .and_then(|c| c.text.clone())
        .expect("counter text");
    assert!(mid.starts_with('$') && mid.ends_with('+'), "{mid}");

    let out = eng.update(2.0, Inputs::new());
    let done = out.changes_for(id).next().expect("final change");
    assert_eq!(done.text.as_deref(), Some("$12,500+"));
}

#[test]
fn replay_slide_repeats_after_leaving() {
    let spec = configs::load("replay-slide").expect("replay-slide");
    assert!(!spec.config.once);
    assert_eq!(spec.config.easing, Easing::EaseInOut);

    let mut eng = Engine::new(FakeViewport::new(), ManualFrames::new());
    let id = eng.watch("slide", &spec).expect("mount");
    deliver_initial(&mut eng, 0.0);
    let enter = eng.viewport().enter("slide").expect("observed");
    let leave = eng.viewport().leave("slide").expect("observed");

    let mut activations = 0;
    for (t, inputs) in [
        (0.0, Inputs::new().with_intersection(enter)),
        (1.0, Inputs::new()),
        (1.5, Inputs::new().with_intersection(leave)),
        (2.0, Inputs::new().with_intersection(enter)),
    ] {
        let out = eng.update(t, inputs);
        activations += out
            .events
            .iter()
            .filter(|e| matches!(e, RevealEvent::Activated { .. }))
            .count();
    }
    assert_eq!(activations, 2);
    // reactivated at 2.0 with a 0.1s delay
    assert_eq!(eng.status(id).expect("status").timeline, TimelineStatus::Scheduled);
}

#[test]
fn watch_spec_json_round_trips_through_the_wire_shape() {
    let raw = configs::json("stagger-cards").expect("raw json");
    let spec: WatchSpec = serde_json::from_str(&raw).expect("parse");
    let value = serde_json::to_value(&spec).expect("serialize");
    assert_eq!(value["kind"], "sequence");
    assert_eq!(value["staggerInterval"], 0.1);
    assert_eq!(value["children"].as_array().map(Vec::len), Some(3));
}
