//! Actors and per-actor command resolution.
//!
//! [`resolve`] is the single evaluator used by both execution phases: the
//! preview runs it against a cloned sandbox, the commit against real state.

use serde::{Deserialize, Serialize};

use super::grid::{Direction, Pos, Turn};
use super::level::{CellKind, GroupSet};
use super::program::Command;
use super::world::World;
use crate::types::{FailureReason, Obstacle, StrikeTiming};

/// Identity colours handed out in spawn order.
pub const ROSTER: [ActorColor; 4] = [
    ActorColor::Orange,
    ActorColor::Violet,
    ActorColor::Teal,
    ActorColor::Pink,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorColor {
    Orange,
    Violet,
    Teal,
    Pink,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: usize,
    pub color: ActorColor,
    pub pos: Pos,
    pub facing: Direction,
}

/// Instantiate actors from start markers in grid-scan order and clear the
/// markers from the world.
pub fn spawn(world: &mut World) -> Vec<Actor> {
    let actors: Vec<Actor> = world
        .cells()
        .iter()
        .filter_map(|(pos, kind)| match kind {
            CellKind::StartFacing(facing) => Some((pos, *facing)),
            _ => None,
        })
        .zip(ROSTER)
        .enumerate()
        .map(|(id, ((pos, facing), color))| Actor {
            id,
            color,
            pos,
            facing,
        })
        .collect();
    let starts: Vec<Pos> = actors.iter().map(|a| a.pos).collect();
    world.clear_starts(&starts);
    actors
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stride {
    Advance,
    Jump,
}

impl Stride {
    pub fn distance(self) -> usize {
        match self {
            Stride::Advance => 1,
            Stride::Jump => 2,
        }
    }
}

/// A successful move and everything it triggered on arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Move {
    pub stride: Stride,
    pub from: Pos,
    pub to: Pos,
    pub coin: bool,
    pub toggled: Option<GroupSet>,
    pub strike: Option<StrikeTiming>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Turned { turn: Turn, facing: Direction },
    Moved(Move),
    Blocked {
        stride: Stride,
        from: Pos,
        obstacle: Obstacle,
    },
}

impl Resolution {
    /// Why this resolution ends the run for `actor`, if it does.
    pub fn failure(&self, actor: usize) -> Option<FailureReason> {
        match *self {
            Resolution::Turned { .. } => None,
            Resolution::Moved(mv) => mv.strike.map(|_| FailureReason::Struck { actor, at: mv.to }),
            Resolution::Blocked { from, obstacle, .. } => Some(match obstacle {
                Obstacle::OffGrid => FailureReason::OffGrid { actor, from },
                Obstacle::Solid { at } => FailureReason::Blocked { actor, at },
            }),
        }
    }
}

/// Evaluate `command` for one actor, mutating `actor` and `world`.
///
/// Returns `None` for commands that do not act on actors (loop markers and
/// the reserved conditionals).
pub fn resolve(world: &mut World, actor: &mut Actor, command: Command) -> Option<Resolution> {
    let resolution = match command {
        Command::TurnLeft => rotate(actor, Turn::Left),
        Command::TurnRight => rotate(actor, Turn::Right),
        Command::UTurn => rotate(actor, Turn::Around),
        Command::Advance => travel(world, actor, Stride::Advance),
        Command::Jump => travel(world, actor, Stride::Jump),
        Command::LoopStart(_)
        | Command::LoopEnd
        | Command::IfThen
        | Command::IfElse
        | Command::IfEnd => return None,
    };
    Some(resolution)
}

fn rotate(actor: &mut Actor, turn: Turn) -> Resolution {
    actor.facing = turn.apply(actor.facing);
    Resolution::Turned {
        turn,
        facing: actor.facing,
    }
}

fn travel(world: &mut World, actor: &mut Actor, stride: Stride) -> Resolution {
    let from = actor.pos;
    // Intermediate cells of a jump are never inspected.
    let target = from
        .offset(actor.facing, stride.distance())
        .and_then(|to| world.cell(to).map(|kind| (to, kind)));

    let to = match target {
        None => {
            return Resolution::Blocked {
                stride,
                from,
                obstacle: Obstacle::OffGrid,
            };
        }
        Some((to, kind)) if !kind.is_occupiable() => {
            return Resolution::Blocked {
                stride,
                from,
                obstacle: Obstacle::Solid { at: to },
            };
        }
        Some((to, _)) => to,
    };

    actor.pos = to;
    let entry = world.enter(to);
    let strike = match (entry.live_before, entry.live_after) {
        (_, false) => None,
        (true, true) => Some(StrikeTiming::Instantaneous),
        (false, true) => Some(StrikeTiming::Delayed),
    };
    Resolution::Moved(Move {
        stride,
        from,
        to,
        coin: entry.coin,
        toggled: entry.toggled,
        strike,
    })
}
