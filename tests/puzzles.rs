//! End-to-end runs through the public API, with levels and programs written
//! the way they appear on disk.

use probot::engine::grid::Pos;
use probot::engine::source::LevelSource;
use probot::engine::{Level, Program, ProgramError, Run, start};
use probot::types::{FailureReason, NullSink, Outcome, RunEvent, StrikeTiming};

fn level(json: &str) -> Level {
    let source: LevelSource = serde_json::from_str(json).unwrap();
    source.build().unwrap()
}

fn program(json: &str) -> Program {
    serde_json::from_str(json).unwrap()
}

fn run(level: &Level, program: &Program) -> (Outcome, Vec<RunEvent>) {
    let mut events = Vec::new();
    let outcome = start(program, level, &mut events).unwrap();
    (outcome, events)
}

#[test]
fn eating_every_dot_solves_the_level() {
    let level = level(r#"{ "name": "corridor", "rows": [">oo"] }"#);
    let (outcome, events) = run(&level, &program(r#"["advance", "advance"]"#));

    assert_eq!(outcome, Outcome::Success);
    let eaten = events
        .iter()
        .filter(|e| matches!(e, RunEvent::CoinCollected { .. }))
        .count();
    assert_eq!(eaten, 2);
}

#[test]
fn stopping_short_leaves_dots_uneaten() {
    let level = level(r#"{ "rows": [">oo"] }"#);
    let (outcome, events) = run(&level, &program(r#"["advance"]"#));

    assert_eq!(
        outcome,
        Outcome::Failure(FailureReason::CoinsUneaten { remaining: 1 })
    );
    assert_eq!(events.last(), Some(&RunEvent::CoinsUneaten { remaining: 1 }));
}

#[test]
fn a_loop_runs_like_its_unrolled_body() {
    let level = level(r#"{ "rows": [">ooo."] }"#);
    let looped = run(&level, &program(r#"[{"loop_start": 3}, "advance", "loop_end"]"#));
    let unrolled = run(&level, &program(r#"["advance", "advance", "advance"]"#));

    assert_eq!(looped, unrolled);
    assert_eq!(looped.0, Outcome::Success);
}

#[test]
fn jumping_clears_a_live_beam_that_advancing_walks_into() {
    let json = r#"{ "rows": [".A.", ">..", "..."], "hazards_enabled": [true, false, false] }"#;
    let level = level(json);

    let (jumped, _) = run(&level, &program(r#"["jump"]"#));
    assert_eq!(jumped, Outcome::Success);

    let (advanced, events) = run(&level, &program(r#"["advance"]"#));
    let at = Pos::new(1, 1);
    assert_eq!(
        advanced,
        Outcome::Failure(FailureReason::Struck { actor: 0, at })
    );
    assert!(events.contains(&RunEvent::ActorStruck {
        actor: 0,
        at,
        timing: StrikeTiming::Instantaneous,
    }));
}

#[test]
fn stepping_on_a_toggle_under_its_own_beam_is_a_delayed_strike() {
    let level = level(r#"{ "rows": [".A.", ">1."] }"#);
    let (outcome, events) = run(&level, &program(r#"["advance"]"#));

    let at = Pos::new(1, 1);
    assert_eq!(outcome, Outcome::Failure(FailureReason::Struck { actor: 0, at }));
    assert!(events.contains(&RunEvent::ActorStruck {
        actor: 0,
        at,
        timing: StrikeTiming::Delayed,
    }));
    assert!(events.iter().any(|e| matches!(
        e,
        RunEvent::HazardsToggled { enabled: [true, false, false], .. }
    )));
}

#[test]
fn walking_off_the_edge_fails_with_a_tagged_reason() {
    let level = level(r#"{ "rows": [">."] }"#);
    let (outcome, _) = run(&level, &program(r#"["advance", "advance"]"#));

    let value = serde_json::to_value(&outcome).unwrap();
    assert_eq!(value["outcome"], "failure");
    assert_eq!(value["reason"], "off_grid");
    assert_eq!(value["from"]["col"], 1);
}

#[test]
fn unbalanced_programs_are_rejected_before_any_failure() {
    let level = level(r#"{ "rows": [">.."] }"#);
    let program = program(r#"["advance", "loop_end"]"#);

    assert_eq!(
        program.check(),
        Err(ProgramError::UnmatchedLoopEnd { index: 1 })
    );
    assert_eq!(
        start(&program, &level, &mut NullSink),
        Err(ProgramError::UnmatchedLoopEnd { index: 1 })
    );
}

#[test]
fn restoring_a_run_replays_identically() {
    let level = level(r#"{ "rows": [">o", ".."] }"#);
    let program = program(r#"["advance", "turn_right", "advance"]"#);
    let mut run = Run::new(&level);

    let mut first = Vec::new();
    let outcome = run.execute(&program, &mut first).unwrap();
    assert_eq!(outcome, Outcome::Success);
    assert_eq!(run.state().world.coins_remaining(), 0);

    run.restore();
    assert_eq!(run.state().world.coins_remaining(), 1);
    let mut second = Vec::new();
    assert_eq!(run.execute(&program, &mut second).unwrap(), Outcome::Success);
    assert_eq!(first, second);
}

#[test]
fn budgets_load_flattened_and_flag_overuse() {
    let level = level(r#"{ "rows": [">.."], "max_jumps": 1, "max_turns": null }"#);
    let program = program(r#"["jump", "turn_left", "jump"]"#);

    let over = program.over_budget(level.budgets());
    assert_eq!(over, vec![probot::engine::program::CommandClass::Jump]);
}
