use std::time::Duration;

use tetrathlon::prelude::*;
use tracing::{Level, Metadata};
use tracing_subscriber::{
    fmt,
    layer::{Context, Filter, SubscriberExt},
    Layer, Registry,
};

struct CustomLevelFilter;
impl<S> Filter<S> for CustomLevelFilter {
    fn enabled(&self, meta: &Metadata<'_>, _cx: &Context<'_, S>) -> bool {
        meta.level() <= &Level::WARN
    }
}

fn init_debug_logger() {
    let format = tracing_subscriber::fmt::format()
        .without_time()
        .with_ansi(true)
        .with_level(true)
        .with_thread_names(true)
        .with_target(false);

    let reg = Registry::default().with(
        fmt::layer()
            .event_format(format)
            .with_test_writer()
            .with_filter(CustomLevelFilter),
    );

    let _ = tracing::subscriber::set_global_default(reg);
}

fn script(population_index: usize, name: &str) -> Agent {
    let path = format!("{}/tests/agents/{name}.sh", env!("CARGO_MANIFEST_DIR"));
    Agent::new(population_index, "sh", vec![0.25, -1.5, 3.0]).with_args([path])
}

#[test]
fn invalid_agent_dies_on_first_query() {
    init_debug_logger();
    let agents = vec![
        script(10, "always_up"),
        script(11, "always_up"),
        script(12, "invalid_reply"),
    ];
    let mut game = Match::new(
        agents,
        100,
        Configuration::new().with_seed(5),
        &Constraints::unlimited(),
    )
    .unwrap();

    assert!(game.is_active(2));
    for _ in 0..100 {
        game.tick().unwrap();
        assert!(!game.is_active(2));
        assert!(game.is_active(0) && game.is_active(1));
        assert_eq!(game.last_actions(), [Action::Up, Action::Up, Action::Error]);
    }
    assert!(game.is_complete());
    assert!(game.tick().is_err());

    let medals = *game.medals();
    for event in &medals {
        assert_eq!(event[2][0] + event[2][1], 0, "a dead agent never medals");
    }
    let scores = game.finalize_scores();
    assert_eq!(scores.len(), 3);
    assert_eq!(scores[&12], 0);
}

#[test]
fn crash_is_detected_on_next_query() {
    init_debug_logger();
    let agents = vec![
        script(0, "always_up"),
        script(1, "crash_after_handshake"),
        script(2, "always_up"),
    ];
    let mut game = Match::new(agents, 5, Configuration::new(), &Constraints::unlimited()).unwrap();

    game.tick().unwrap();
    assert_eq!(game.last_actions(), [Action::Up, Action::Left, Action::Up]);
    assert!(game.is_active(1));

    game.tick().unwrap();
    assert!(!game.is_active(1));
    assert_eq!(game.last_actions(), [Action::Up, Action::Error, Action::Up]);
}

#[test]
fn silent_agent_times_out() {
    init_debug_logger();
    let constraints = ConstraintsBuilder::new()
        .with_action_timeout(Duration::from_millis(200))
        .with_init_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let agents = vec![
        script(0, "silent"),
        script(1, "always_up"),
        script(2, "always_up"),
    ];
    let mut game = Match::new(agents, 3, Configuration::new(), &constraints).unwrap();
    game.tick().unwrap();
    assert!(!game.is_active(0));
    assert_eq!(game.last_actions(), [Action::Error, Action::Up, Action::Up]);
}

#[test]
fn agent_that_stops_reading_times_out() {
    init_debug_logger();
    let constraints = ConstraintsBuilder::new()
        .with_action_timeout(Duration::from_millis(200))
        .with_init_timeout(Duration::from_secs(5))
        .build()
        .unwrap();
    let agents = vec![
        script(0, "never_reads"),
        script(1, "always_up"),
        script(2, "always_up"),
    ];
    let mut game = Match::new(agents, 1000, Configuration::new(), &constraints).unwrap();

    // its stale output answers until the input pipe fills up
    while game.is_active(0) {
        assert!(!game.is_complete(), "agent was never cut off");
        game.tick().unwrap();
    }
    assert_eq!(game.last_actions()[0], Action::Error);
    while !game.is_complete() {
        game.tick().unwrap();
    }
    assert_eq!(game.finalize_scores().len(), 3);
}

#[test]
fn bad_handshake_fails_construction() {
    init_debug_logger();
    let agents = vec![
        script(0, "always_up"),
        script(1, "bad_handshake"),
        script(2, "always_up"),
    ];
    let err = Match::new(agents, 10, Configuration::new(), &Constraints::unlimited()).unwrap_err();
    assert!(format!("{err:#}").contains("READY"));
}

#[test]
fn a_match_needs_three_agents() {
    let agents = vec![script(0, "always_up"), script(1, "always_up")];
    let err = Match::new(agents, 10, Configuration::new(), &Constraints::unlimited()).unwrap_err();
    assert!(err.to_string().contains("3 agents"));
}

#[test]
fn unknown_executable_fails_construction() {
    let agents = vec![
        script(0, "always_up"),
        Agent::new(1, "./this_agent_does_not_exist", vec![]),
        script(2, "always_up"),
    ];
    assert!(Match::new(agents, 10, Configuration::new(), &Constraints::unlimited()).is_err());
}

#[test]
fn full_match_returns_every_score() {
    init_debug_logger();
    let agents = vec![
        script(40, "always_up"),
        script(41, "always_up"),
        script(42, "always_up"),
    ];
    let scores = run_match(
        agents,
        50,
        Configuration::new().with_seed(9),
        &Constraints::unlimited(),
    )
    .unwrap();
    let mut keys: Vec<_> = scores.keys().copied().collect();
    keys.sort();
    assert_eq!(keys, vec![40, 41, 42]);
    // identical agents tie in every event
    let first = scores[&40];
    assert!(scores.values().all(|&score| score == first));
}
