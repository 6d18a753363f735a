//! Shared boundary types for the Probot puzzle engine.
//!
//! This module defines the two data contracts that leave the engine:
//! - Engine → event sink: `RunEvent`s emitted while a program runs, and the
//!   terminal `Outcome` of the run
//! - Renderer → player: styled `Cell` grids ready for the terminal

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::actor::Stride;
use crate::engine::grid::{Direction, Pos, Turn};
use crate::engine::level::{GROUP_COUNT, GroupSet};

// ---------------------------------------------------------------------------
// Engine → event sink
// ---------------------------------------------------------------------------

/// When a strike lands relative to the move that caused it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrikeTiming {
    /// The destination was already live.
    Instantaneous,
    /// The destination went live because of the toggle it triggered.
    Delayed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Obstacle {
    OffGrid,
    Solid { at: Pos },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    // Preview phase
    ActorAdvanced {
        actor: usize,
        from: Pos,
        to: Pos,
    },
    ActorJumped {
        actor: usize,
        from: Pos,
        to: Pos,
    },
    ActorTurned {
        actor: usize,
        turn: Turn,
        facing: Direction,
    },
    ActorBlocked {
        actor: usize,
        stride: Stride,
        from: Pos,
        obstacle: Obstacle,
    },
    ActorStruck {
        actor: usize,
        at: Pos,
        timing: StrikeTiming,
    },

    // Commit phase
    CoinCollected {
        actor: usize,
        at: Pos,
    },
    HazardsToggled {
        groups: GroupSet,
        enabled: [bool; GROUP_COUNT],
    },

    // End of run
    CoinsUneaten {
        remaining: usize,
    },
}

impl std::fmt::Display for RunEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunEvent::ActorAdvanced { actor, from, to } => {
                write!(f, "actor {actor} advances {from} -> {to}")
            }
            RunEvent::ActorJumped { actor, from, to } => {
                write!(f, "actor {actor} jumps {from} -> {to}")
            }
            RunEvent::ActorTurned { actor, turn, facing } => {
                write!(f, "actor {actor} turns {turn:?}, now facing {facing:?}")
            }
            RunEvent::ActorBlocked {
                actor,
                from,
                obstacle,
                ..
            } => match obstacle {
                Obstacle::OffGrid => write!(f, "actor {actor} at {from} would leave the grid"),
                Obstacle::Solid { at } => write!(f, "actor {actor} at {from} is blocked by {at}"),
            },
            RunEvent::ActorStruck { actor, at, timing } => match timing {
                StrikeTiming::Instantaneous => write!(f, "actor {actor} is struck at {at}"),
                StrikeTiming::Delayed => {
                    write!(f, "actor {actor} is struck at {at} by the beam it switched on")
                }
            },
            RunEvent::CoinCollected { actor, at } => write!(f, "actor {actor} eats the dot at {at}"),
            RunEvent::HazardsToggled { enabled, .. } => {
                let state = |on: bool| if on { "on" } else { "off" };
                write!(
                    f,
                    "lazers toggled: red {}, blue {}, green {}",
                    state(enabled[0]),
                    state(enabled[1]),
                    state(enabled[2])
                )
            }
            RunEvent::CoinsUneaten { remaining } => write!(f, "{remaining} dots left uneaten"),
        }
    }
}

/// Receiver of run events, typically a renderer.
///
/// Sinks observe; they never get mutable access to engine state.
pub trait EventSink {
    fn emit(&mut self, event: &RunEvent);
}

impl EventSink for Vec<RunEvent> {
    fn emit(&mut self, event: &RunEvent) {
        self.push(event.clone());
    }
}

/// Discards every event.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: &RunEvent) {}
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("actor {actor} walked off the grid from {from}")]
    OffGrid { actor: usize, from: Pos },
    #[error("actor {actor} ran into a hazard source at {at}")]
    Blocked { actor: usize, at: Pos },
    #[error("actor {actor} was struck by a lazer at {at}")]
    Struck { actor: usize, at: Pos },
    #[error("dots left uneaten ({remaining} remaining)")]
    CoinsUneaten { remaining: usize },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success,
    Failure(FailureReason),
    Cancelled,
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Success => f.write_str("success"),
            Outcome::Failure(reason) => write!(f, "failure: {reason}"),
            Outcome::Cancelled => f.write_str("cancelled"),
        }
    }
}

// ---------------------------------------------------------------------------
// Renderer → player
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red,
    Green,
    Yellow,
    Blue,
    Magenta,
    Cyan,
    White,
    Rgb { r: u8, g: u8, b: u8 },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub dim: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub style: Style,
}

impl Default for Cell {
    fn default() -> Self {
        Cell {
            ch: ' ',
            style: Style::default(),
        }
    }
}
