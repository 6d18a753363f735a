//! Builds a small level in code and runs a program against it headless.
//!
//!     cargo run --example corridor

use probot::engine::level::{Budget, Budgets};
use probot::engine::source::LevelSource;
use probot::engine::{Command, Program, Run};
use probot::types::RunEvent;

fn main() -> anyhow::Result<()> {
    // Two lanes split by a red beam. The button at the end of the top lane
    // switches the beam off so the robot can cross back down.
    let level = LevelSource::from_rows(&[
        ">oo1",
        "a...",
        "oooo",
    ])
    .with_hazards([true, false, false])
    .with_budgets(Budgets {
        max_jumps: Budget::Limited(0),
        max_loop_blocks: Budget::Limited(1),
        max_turns: Budget::Limited(3),
    })
    .build()?;

    let program: Program = [
        Command::LoopStart(3),
        Command::Advance,
        Command::LoopEnd,
        Command::TurnRight,
        Command::Advance,
        Command::Advance,
        Command::TurnRight,
        Command::Advance,
        Command::Advance,
        Command::Advance,
    ]
    .into_iter()
    .collect();

    program.check()?;
    let over = program.over_budget(level.budgets());
    if !over.is_empty() {
        anyhow::bail!("program exceeds budget for {over:?}");
    }

    let mut run = Run::new(&level);
    let mut events: Vec<RunEvent> = Vec::new();
    let outcome = run.execute(&program, &mut events)?;

    for event in &events {
        println!("{event}");
    }
    println!("=> {outcome}");
    Ok(())
}
