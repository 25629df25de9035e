use reveal_core::{
    values, CounterSpec, Driver, Engine, Inputs, RevealConfig, RevealEvent, TimelineStatus,
    ValuesSpec,
};
use reveal_test_fixtures::{deliver_initial, FakeViewport, ManualFrames};

fn engine() -> Engine<FakeViewport, ManualFrames> {
    Engine::new(FakeViewport::new(), ManualFrames::new())
}

fn card() -> ValuesSpec {
    ValuesSpec {
        initial_values: values([("opacity", 0.0), ("y", 16.0)]),
        target_values: values([("opacity", 1.0), ("y", 0.0)]),
    }
}

#[test]
fn sequence_children_start_at_stagger_offsets() {
    let mut eng = engine();
    let cfg = RevealConfig {
        stagger_interval: 0.1,
        ..Default::default()
    };
    let id = eng
        .watch_sequence("cards", &cfg, vec![card(), card(), card()])
        .expect("watch");
    deliver_initial(&mut eng, 0.0);
    let enter = eng.viewport().enter("cards").expect("observed");
    eng.handle_intersection(&enter, 0.0);

    let Some(Driver::Sequence(group)) = eng.element(id).map(|el| el.driver()) else {
        panic!("expected a sequence driver");
    };
    let starts: Vec<f64> = group.start_times().into_iter().flatten().collect();
    assert_eq!(starts.len(), 3);
    for (got, want) in starts.iter().zip([0.0, 0.1, 0.2]) {
        assert!((got - want).abs() < 1e-9, "{got} vs {want}");
    }
}

#[test]
fn sequence_never_shows_a_later_child_ahead() {
    let mut eng = engine();
    let cfg = RevealConfig {
        stagger_interval: 0.1,
        duration: 0.3,
        ..Default::default()
    };
    let id = eng
        .watch_sequence("cards", &cfg, vec![card(), card(), card()])
        .expect("watch");
    deliver_initial(&mut eng, 0.0);
    let enter = eng.viewport().enter("cards").expect("observed");

    let mut started = Vec::new();
    let mut completed = Vec::new();
    for step in 0..60 {
        let t = step as f64 * 0.02;
        let inputs = if step == 0 {
            Inputs::new().with_intersection(enter)
        } else {
            Inputs::new()
        };
        let out = eng.update(t, inputs);
        for event in &out.events {
            match event {
                RevealEvent::TimelineStarted { child: Some(i), .. } => started.push(*i),
                RevealEvent::TimelineCompleted { child: Some(i), .. } => completed.push(*i),
                _ => {}
            }
        }
        let Some(Driver::Sequence(group)) = eng.element(id).map(|el| el.driver()) else {
            panic!("expected a sequence driver");
        };
        let ranks: Vec<u8> = group.children().iter().map(|c| c.status().rank()).collect();
        assert!(ranks.windows(2).all(|w| w[0] >= w[1]), "at {t}: {ranks:?}");
    }
    assert_eq!(started, vec![0, 1, 2]);
    assert_eq!(completed, vec![0, 1, 2]);
    assert_eq!(eng.status(id).expect("status").timeline, TimelineStatus::Completed);
}

#[test]
fn sequence_changes_are_tagged_by_child() {
    let mut eng = engine();
    let id = eng
        .watch_sequence("cards", &RevealConfig::default(), vec![card(), card()])
        .expect("watch");
    deliver_initial(&mut eng, 0.0);
    let enter = eng.viewport().enter("cards").expect("observed");
    let out = eng.update(0.05, Inputs::new().with_intersection(enter));
    let children: Vec<Option<usize>> = out.changes_for(id).map(|c| c.child).collect();
    // child 1 is still scheduled, but its first status change is reported too
    assert_eq!(children, vec![Some(0), Some(1)]);
    assert_eq!(
        out.changes_for(id).map(|c| c.status).collect::<Vec<_>>(),
        vec![TimelineStatus::Running, TimelineStatus::Scheduled]
    );
}

#[test]
fn counter_counts_from_zero_to_target() {
    let mut eng = engine();
    let cfg = RevealConfig {
        duration: 2.0,
        decimals: 0,
        ..Default::default()
    };
    let id = eng
        .watch_counter(
            "stat",
            &cfg,
            CounterSpec {
                to: Some(100.0),
                ..Default::default()
            },
        )
        .expect("watch");

    let before = eng.snapshot(id).expect("snapshot");
    assert_eq!(before[0].text.as_deref(), Some("0"));

    deliver_initial(&mut eng, 0.0);
    let enter = eng.viewport().enter("stat").expect("observed");
    eng.update(0.0, Inputs::new().with_intersection(enter));

    let mut last = 0.0;
    for t in [0.5, 1.0, 1.5] {
        let out = eng.update(t, Inputs::new());
        let text = out
            .changes_for(id)
            .next()
            .and_then(|c| c.text.clone())
            .expect("counter text");
        let shown: f64 = text.parse().expect("plain number");
        assert!(shown >= last, "{shown} < {last} at {t}");
        last = shown;
    }

    let out = eng.update(2.0, Inputs::new());
    let done = out.changes_for(id).next().expect("final change");
    assert_eq!(done.status, TimelineStatus::Completed);
    assert_eq!(done.text.as_deref(), Some("100"));
}

#[test]
fn counter_without_target_shows_zero() {
    let mut eng = engine();
    let cfg = RevealConfig {
        decimals: 2,
        prefix: "~".into(),
        ..Default::default()
    };
    let id = eng
        .watch_counter("empty", &cfg, CounterSpec::default())
        .expect("watch");
    deliver_initial(&mut eng, 0.0);
    let enter = eng.viewport().enter("empty").expect("observed");
    eng.update(0.0, Inputs::new().with_intersection(enter));
    let out = eng.update(1.0, Inputs::new());
    let done = out.changes_for(id).next().expect("final change");
    assert_eq!(done.text.as_deref(), Some("~0.00"));
}
