//! Program execution.
//!
//! A run owns a fresh copy of the level state and its actors. Every
//! actor-affecting command executes actor by actor in spawn order, each in two
//! phases: a preview against a cloned sandbox that only emits events, then a
//! commit against the real state. Both phases go through [`actor::resolve`]
//! on the same world, so they cannot disagree.
//!
//! Loops recurse one level per `LoopStart`; the cursor travels by value in
//! and out of each frame.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing::{debug, info, trace};

use super::actor::{self, Actor, Resolution, Stride};
use super::level::Level;
use super::program::{Command, Program};
use super::world::World;
use crate::types::{EventSink, FailureReason, Outcome, RunEvent};

/// Structural defects in a program, found when execution reaches them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ProgramError {
    #[error("loop end at command {index} has no matching loop start")]
    UnmatchedLoopEnd { index: usize },
    #[error("loop started at command {index} is never closed")]
    UnclosedLoop { index: usize },
}

/// Shared flag used to stop a run between commands.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn reset(&self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Everything a run mutates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunState {
    pub world: World,
    pub actors: Vec<Actor>,
}

impl RunState {
    pub fn new(level: &Level) -> Self {
        let mut world = World::new(level);
        let actors = actor::spawn(&mut world);
        RunState { world, actors }
    }
}

/// Copy of the run state taken when a run is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot(RunState);

/// Why a block stopped early.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Halt {
    Failed(FailureReason),
    Cancelled,
}

/// How a block handed control back to its caller.
#[derive(Debug)]
enum Flow {
    /// Resume at this cursor.
    Next(usize),
    Halted(Halt),
}

pub struct Run {
    state: RunState,
    snapshot: RunSnapshot,
    cancel: CancelToken,
}

impl Run {
    pub fn new(level: &Level) -> Self {
        let state = RunState::new(level);
        Run {
            snapshot: RunSnapshot(state.clone()),
            state,
            cancel: CancelToken::new(),
        }
    }

    pub fn state(&self) -> &RunState {
        &self.state
    }

    pub fn snapshot(&self) -> &RunSnapshot {
        &self.snapshot
    }

    /// Handle that stops this run at the next command boundary.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Roll back to the state captured at creation and clear any pending
    /// cancellation.
    pub fn restore(&mut self) {
        self.state = self.snapshot.0.clone();
        self.cancel.reset();
    }

    /// Execute `program` from the top against the current state.
    pub fn execute(
        &mut self,
        program: &Program,
        sink: &mut dyn EventSink,
    ) -> Result<Outcome, ProgramError> {
        let mut exec = Executor {
            program,
            state: &mut self.state,
            cancel: &self.cancel,
            sink,
        };
        let outcome = match exec.block(0, None)? {
            Flow::Halted(halt) => halt.into_outcome(),
            Flow::Next(_) if exec.cancel.is_cancelled() => Outcome::Cancelled,
            Flow::Next(_) => exec.settle(),
        };
        info!(%outcome, "run finished");
        Ok(outcome)
    }
}

impl Halt {
    fn into_outcome(self) -> Outcome {
        match self {
            Halt::Failed(reason) => Outcome::Failure(reason),
            Halt::Cancelled => Outcome::Cancelled,
        }
    }
}

/// Run `program` on a fresh copy of `level`.
pub fn start(
    program: &Program,
    level: &Level,
    sink: &mut dyn EventSink,
) -> Result<Outcome, ProgramError> {
    Run::new(level).execute(program, sink)
}

struct Executor<'a> {
    program: &'a Program,
    state: &'a mut RunState,
    cancel: &'a CancelToken,
    sink: &'a mut dyn EventSink,
}

impl Executor<'_> {
    /// Run commands from `pc` until the block ends.
    ///
    /// `opener` is the index of the enclosing `LoopStart`, or `None` at top
    /// level. On success returns the cursor just past the block's `LoopEnd`
    /// (or the program length at top level).
    fn block(&mut self, mut pc: usize, opener: Option<usize>) -> Result<Flow, ProgramError> {
        loop {
            if self.cancel.is_cancelled() {
                debug!(pc, "cancelled");
                return Ok(Flow::Halted(Halt::Cancelled));
            }
            let Some(&step) = self.program.get(pc) else {
                return match opener {
                    Some(index) => Err(ProgramError::UnclosedLoop { index }),
                    None => Ok(Flow::Next(pc)),
                };
            };
            match step.command {
                Command::LoopEnd => {
                    return match opener {
                        Some(_) => Ok(Flow::Next(pc + 1)),
                        None => Err(ProgramError::UnmatchedLoopEnd { index: pc }),
                    };
                }
                Command::LoopStart(count) => match self.repeat(pc, count)? {
                    Flow::Next(next) => pc = next,
                    halted => return Ok(halted),
                },
                command => {
                    debug!(pc, depth = step.depth, ?command, "step");
                    if let Err(halt) = self.step(command) {
                        return Ok(Flow::Halted(halt));
                    }
                    pc += 1;
                }
            }
        }
    }

    fn repeat(&mut self, opener: usize, count: u32) -> Result<Flow, ProgramError> {
        if count == 0 {
            let end = self
                .program
                .matching_end(opener)
                .ok_or(ProgramError::UnclosedLoop { index: opener })?;
            return Ok(Flow::Next(end + 1));
        }
        let mut next = opener + 1;
        for iteration in 0..count {
            trace!(opener, iteration, "loop iteration");
            match self.block(opener + 1, Some(opener))? {
                Flow::Next(after) => next = after,
                halted => return Ok(halted),
            }
        }
        Ok(Flow::Next(next))
    }

    /// Apply `command` to every actor in spawn order, stopping at the first
    /// fatal resolution. Each actor sees the world its predecessors left.
    fn step(&mut self, command: Command) -> Result<(), Halt> {
        for index in 0..self.state.actors.len() {
            self.preview(index, command);
            self.commit(index, command)?;
        }
        Ok(())
    }

    /// Emit what `command` would do for one actor without touching state.
    fn preview(&mut self, index: usize, command: Command) {
        let Some(actor) = self.state.actors.get(index) else {
            return;
        };
        let mut sandbox = self.state.world.clone();
        let mut ghost = actor.clone();
        if let Some(res) = actor::resolve(&mut sandbox, &mut ghost, command) {
            preview_events(actor.id, &res, self.sink);
        }
    }

    fn commit(&mut self, index: usize, command: Command) -> Result<(), Halt> {
        let Some(actor) = self.state.actors.get_mut(index) else {
            return Ok(());
        };
        let id = actor.id;
        let Some(res) = actor::resolve(&mut self.state.world, actor, command) else {
            return Ok(());
        };
        if let Resolution::Moved(mv) = &res {
            if mv.coin {
                self.sink.emit(&RunEvent::CoinCollected { actor: id, at: mv.to });
            }
            if let Some(groups) = mv.toggled {
                self.sink.emit(&RunEvent::HazardsToggled {
                    groups,
                    enabled: self.state.world.hazards().enabled(),
                });
            }
        }
        if let Some(reason) = res.failure(id) {
            // A stop request beats whatever went wrong in this step.
            if self.cancel.is_cancelled() {
                return Err(Halt::Cancelled);
            }
            debug!(%reason, "step failed");
            return Err(Halt::Failed(reason));
        }
        Ok(())
    }

    /// End-of-program check: every coin must have been eaten.
    fn settle(&mut self) -> Outcome {
        let remaining = self.state.world.coins_remaining();
        if remaining == 0 {
            return Outcome::Success;
        }
        self.sink.emit(&RunEvent::CoinsUneaten { remaining });
        Outcome::Failure(FailureReason::CoinsUneaten { remaining })
    }
}

fn preview_events(actor: usize, res: &Resolution, sink: &mut dyn EventSink) {
    match *res {
        Resolution::Turned { turn, facing } => {
            sink.emit(&RunEvent::ActorTurned {
                actor,
                turn,
                facing,
            });
        }
        Resolution::Moved(mv) => {
            let event = match mv.stride {
                Stride::Advance => RunEvent::ActorAdvanced {
                    actor,
                    from: mv.from,
                    to: mv.to,
                },
                Stride::Jump => RunEvent::ActorJumped {
                    actor,
                    from: mv.from,
                    to: mv.to,
                },
            };
            sink.emit(&event);
            if let Some(timing) = mv.strike {
                sink.emit(&RunEvent::ActorStruck {
                    actor,
                    at: mv.to,
                    timing,
                });
            }
        }
        Resolution::Blocked {
            stride,
            from,
            obstacle,
        } => {
            sink.emit(&RunEvent::ActorBlocked {
                actor,
                stride,
                from,
                obstacle,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::grid::Pos;
    use crate::engine::level::{Group, GroupSet};
    use crate::engine::source::LevelSource;
    use crate::types::{NullSink, StrikeTiming};
    use Command::*;

    fn level(rows: &[&str]) -> Level {
        LevelSource::from_rows(rows).build().unwrap()
    }

    fn run(rows: &[&str], commands: Vec<Command>) -> (Outcome, Vec<RunEvent>, RunState) {
        let level = level(rows);
        let mut run = Run::new(&level);
        let mut events = Vec::new();
        let outcome = run.execute(&Program::from(commands), &mut events).unwrap();
        (outcome, events, run.state().clone())
    }

    /// Sink that requests cancellation once it has seen `after` events.
    struct CancelAfter {
        token: CancelToken,
        after: usize,
        seen: usize,
    }

    impl EventSink for CancelAfter {
        fn emit(&mut self, _event: &RunEvent) {
            self.seen += 1;
            if self.seen >= self.after {
                self.token.cancel();
            }
        }
    }

    #[test]
    fn eating_every_coin_succeeds() {
        let (outcome, events, state) = run(&[">oo"], vec![Advance, Advance]);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(state.world.coins_remaining(), 0);
        assert_eq!(state.actors[0].pos, Pos::new(0, 2));
        assert_eq!(
            events.iter().filter(|e| matches!(e, RunEvent::CoinCollected { .. })).count(),
            2
        );
    }

    #[test]
    fn leftover_coin_fails_after_clean_steps() {
        let (outcome, events, _) = run(&[">o.", "..o"], vec![Advance, Advance]);
        assert_eq!(
            outcome,
            Outcome::Failure(FailureReason::CoinsUneaten { remaining: 1 })
        );
        assert_eq!(events.last(), Some(&RunEvent::CoinsUneaten { remaining: 1 }));
        assert_eq!(
            outcome.to_string(),
            "failure: dots left uneaten (1 remaining)"
        );
    }

    #[test]
    fn walking_off_the_grid_fails() {
        let (outcome, events, state) = run(&["v", "."], vec![Advance, Advance]);
        assert_eq!(
            outcome,
            Outcome::Failure(FailureReason::OffGrid {
                actor: 0,
                from: Pos::new(1, 0)
            })
        );
        assert!(matches!(events.last(), Some(RunEvent::ActorBlocked { .. })));
        assert_eq!(state.actors[0].pos, Pos::new(1, 0));
    }

    #[test]
    fn jump_succeeds_where_advance_is_struck() {
        let rows = [".A.", ">.o", "..."];
        let mut source = LevelSource::from_rows(&rows);
        source.hazards_enabled = [true, false, false];
        let level = source.build().unwrap();

        let outcome = start(&Program::from(vec![Jump]), &level, &mut NullSink).unwrap();
        assert_eq!(outcome, Outcome::Success);

        let mut events = Vec::new();
        let outcome = start(&Program::from(vec![Advance, Advance]), &level, &mut events).unwrap();
        assert_eq!(
            outcome,
            Outcome::Failure(FailureReason::Struck {
                actor: 0,
                at: Pos::new(1, 1)
            })
        );
        assert!(events.contains(&RunEvent::ActorStruck {
            actor: 0,
            at: Pos::new(1, 1),
            timing: StrikeTiming::Instantaneous,
        }));
    }

    #[test]
    fn loop_matches_its_unrolled_form() {
        let rows = [">.o.o", "....."];
        let looped = run(&rows, vec![LoopStart(3), Advance, LoopEnd, Advance]);
        let unrolled = run(&rows, vec![Advance, Advance, Advance, Advance]);
        assert_eq!(looped, unrolled);
        assert_eq!(looped.0, Outcome::Success);
    }

    #[test]
    fn nested_loops_multiply() {
        let rows = [">........"];
        let (outcome, _, state) = run(
            &rows,
            vec![LoopStart(2), LoopStart(2), Advance, LoopEnd, Jump, LoopEnd],
        );
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(state.actors[0].pos, Pos::new(0, 8));
    }

    #[test]
    fn zero_repeat_skips_the_body() {
        let (outcome, _, state) = run(
            &[">.."],
            vec![LoopStart(0), Advance, LoopStart(2), Advance, LoopEnd, LoopEnd, Advance],
        );
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(state.actors[0].pos, Pos::new(0, 1));
    }

    #[test]
    fn failure_inside_a_loop_aborts_it() {
        let (outcome, events, _) = run(&[">.."], vec![LoopStart(5), Advance, LoopEnd]);
        assert!(matches!(outcome, Outcome::Failure(FailureReason::OffGrid { .. })));
        let moves = events
            .iter()
            .filter(|e| matches!(e, RunEvent::ActorAdvanced { .. }))
            .count();
        assert_eq!(moves, 2);
    }

    #[test]
    fn every_actor_runs_each_command() {
        let (outcome, events, state) = run(&[">.", ">."], vec![Advance]);
        assert_eq!(outcome, Outcome::Success);
        assert_eq!(state.actors[0].pos, Pos::new(0, 1));
        assert_eq!(state.actors[1].pos, Pos::new(1, 1));
        assert!(matches!(events[0], RunEvent::ActorAdvanced { actor: 0, .. }));
        assert!(matches!(events[1], RunEvent::ActorAdvanced { actor: 1, .. }));
    }

    #[test]
    fn later_actors_walk_into_beams_switched_on_earlier_in_the_step() {
        // Actor 0 presses the red button; the red source then covers (1,1)
        // just as actor 1 steps onto it.
        let (outcome, events, _) = run(&[">1..", ">..a"], vec![Advance]);
        let at = Pos::new(1, 1);
        assert_eq!(outcome, Outcome::Failure(FailureReason::Struck { actor: 1, at }));
        assert_eq!(
            events,
            vec![
                RunEvent::ActorAdvanced {
                    actor: 0,
                    from: Pos::new(0, 0),
                    to: Pos::new(0, 1)
                },
                RunEvent::HazardsToggled {
                    groups: GroupSet::single(Group::Red),
                    enabled: [true, false, false],
                },
                RunEvent::ActorAdvanced {
                    actor: 1,
                    from: Pos::new(1, 0),
                    to: at
                },
                RunEvent::ActorStruck {
                    actor: 1,
                    at,
                    timing: StrikeTiming::Instantaneous
                },
            ]
        );
    }

    #[test]
    fn later_actors_survive_beams_switched_off_earlier_in_the_step() {
        let level = LevelSource::from_rows(&[">1..", ">..a"])
            .with_hazards([true, false, false])
            .build()
            .unwrap();
        let mut events = Vec::new();
        let outcome = start(&Program::from(vec![Advance]), &level, &mut events).unwrap();
        assert_eq!(outcome, Outcome::Success);
        assert!(
            !events
                .iter()
                .any(|e| matches!(e, RunEvent::ActorStruck { .. }))
        );
    }

    #[test]
    fn a_fatal_actor_stops_later_actors_before_they_preview() {
        let (outcome, events, state) = run(&["^.", ">."], vec![Advance]);
        assert!(matches!(outcome, Outcome::Failure(FailureReason::OffGrid { actor: 0, .. })));
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], RunEvent::ActorBlocked { actor: 0, .. }));
        assert_eq!(state.actors[1].pos, Pos::new(1, 0));
    }

    #[test]
    fn malformed_programs_are_reported_not_failed() {
        let level = level(&[">..."]);
        assert_eq!(
            start(&Program::from(vec![Advance, LoopEnd]), &level, &mut NullSink),
            Err(ProgramError::UnmatchedLoopEnd { index: 1 })
        );
        assert_eq!(
            start(&Program::from(vec![LoopStart(2), Advance]), &level, &mut NullSink),
            Err(ProgramError::UnclosedLoop { index: 0 })
        );
        assert_eq!(
            start(&Program::from(vec![LoopStart(0), Advance]), &level, &mut NullSink),
            Err(ProgramError::UnclosedLoop { index: 0 })
        );
    }

    #[test]
    fn cancellation_wins_over_failure() {
        let level = level(&[">"]);
        let mut run = Run::new(&level);
        let mut sink = CancelAfter {
            token: run.cancel_token(),
            after: 1,
            seen: 0,
        };
        // The preview of the doomed step triggers the stop request.
        let outcome = run.execute(&Program::from(vec![Advance]), &mut sink).unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
    }

    #[test]
    fn cancellation_unwinds_loops_between_commands() {
        let level = level(&[">........"]);
        let mut run = Run::new(&level);
        let mut sink = CancelAfter {
            token: run.cancel_token(),
            after: 3,
            seen: 0,
        };
        let program = Program::from(vec![LoopStart(4), LoopStart(2), Advance, LoopEnd, LoopEnd]);
        let outcome = run.execute(&program, &mut sink).unwrap();
        assert_eq!(outcome, Outcome::Cancelled);
        assert_eq!(run.state().actors[0].pos, Pos::new(0, 3));
    }

    #[test]
    fn restore_rolls_back_to_the_snapshot() {
        let level = level(&[">o"]);
        let mut run = Run::new(&level);
        let before = run.state().clone();
        let outcome = run.execute(&Program::from(vec![Advance, Advance]), &mut NullSink).unwrap();
        assert!(matches!(outcome, Outcome::Failure(_)));
        assert_ne!(run.state(), &before);

        run.restore();
        assert_eq!(run.state(), &before);
        assert_eq!(run.snapshot(), &RunSnapshot(before));
    }

    #[test]
    fn preview_leaves_state_untouched() {
        // Stepping on the button would enable the source below it and light
        // the button cell itself.
        let level = level(&[">1o", ".A."]);
        let mut run = Run::new(&level);
        let before = run.state().clone();

        let program = Program::new();
        let cancel = CancelToken::new();
        let mut events = Vec::new();
        let mut exec = Executor {
            program: &program,
            state: &mut run.state,
            cancel: &cancel,
            sink: &mut events,
        };
        exec.preview(0, Advance);
        exec.preview(0, Jump);

        assert_eq!(run.state(), &before);
        assert_eq!(
            events,
            vec![
                RunEvent::ActorAdvanced {
                    actor: 0,
                    from: Pos::new(0, 0),
                    to: Pos::new(0, 1)
                },
                RunEvent::ActorStruck {
                    actor: 0,
                    at: Pos::new(0, 1),
                    timing: StrikeTiming::Delayed
                },
                RunEvent::ActorJumped {
                    actor: 0,
                    from: Pos::new(0, 0),
                    to: Pos::new(0, 2)
                },
            ]
        );
    }

    #[test]
    fn toggling_changes_the_committed_field() {
        let level = level(&[">1.", "..A"]);
        let mut run = Run::new(&level);
        let mut events = Vec::new();
        let program = Program::from(vec![Advance, TurnRight, TurnLeft]);
        let outcome = run.execute(&program, &mut events).unwrap();
        assert_eq!(outcome, Outcome::Success);
        assert!(run.state().world.hazards().enabled()[0]);
        assert!(run.state().world.hazards().is_live(Pos::new(0, 2)));
        assert!(events.contains(&RunEvent::HazardsToggled {
            groups: GroupSet::single(Group::Red),
            enabled: [true, false, false],
        }));
    }
}
