//! Engine — the puzzle simulation core.
//!
//! Turns a `Level` and a `Program` into an `Outcome`, reporting every step to
//! an `EventSink` along the way.
//!
//! The engine understands grids, beams, actors and loops. It never deals with
//! terminals, key presses or animation timing.

pub mod actor;
pub mod grid;
pub mod hazard;
pub mod interpreter;
pub mod level;
pub mod program;
pub mod source;
pub mod world;

pub use interpreter::{CancelToken, ProgramError, Run, RunSnapshot, RunState, start};
pub use level::Level;
pub use program::{Command, Program};
