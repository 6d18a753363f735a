//! Programs: ordered command sequences with derived loop nesting.
//!
//! Nesting is recomputed in full after every mutation. Malformed nesting is
//! tolerated here and only reported when a run reaches it, or when an editor
//! asks through [`Program::check`].

use serde::{Deserialize, Serialize};

use super::interpreter::ProgramError;
use super::level::{Budget, Budgets};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    Advance,
    TurnRight,
    TurnLeft,
    UTurn,
    Jump,
    LoopStart(u32),
    LoopEnd,
    // Reserved for conditional forms; carried but never executed.
    IfThen,
    IfElse,
    IfEnd,
}

/// Budget classes a command can count against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandClass {
    Jump,
    Loop,
    Turn,
}

impl Command {
    pub fn class(self) -> Option<CommandClass> {
        match self {
            Command::Jump => Some(CommandClass::Jump),
            Command::LoopStart(_) => Some(CommandClass::Loop),
            Command::TurnLeft | Command::TurnRight | Command::UTurn => Some(CommandClass::Turn),
            _ => None,
        }
    }

    pub fn label(self) -> String {
        match self {
            Command::Advance => "Advance".into(),
            Command::TurnRight => "Turn right".into(),
            Command::TurnLeft => "Turn left".into(),
            Command::UTurn => "U-turn".into(),
            Command::Jump => "Jump".into(),
            Command::LoopStart(n) => format!("Repeat {n}x"),
            Command::LoopEnd => "End repeat".into(),
            Command::IfThen => "If".into(),
            Command::IfElse => "Else".into(),
            Command::IfEnd => "End if".into(),
        }
    }
}

impl CommandClass {
    fn budget(self, budgets: &Budgets) -> Budget {
        match self {
            CommandClass::Jump => budgets.max_jumps,
            CommandClass::Loop => budgets.max_loop_blocks,
            CommandClass::Turn => budgets.max_turns,
        }
    }
}

/// A command together with its derived nesting depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub command: Command,
    pub depth: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Command>", into = "Vec<Command>")]
pub struct Program {
    steps: Vec<Step>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn commands(&self) -> impl Iterator<Item = Command> + '_ {
        self.steps.iter().map(|s| s.command)
    }

    /// Insert at `index`, clamped to the end of the program.
    pub fn insert(&mut self, index: usize, command: Command) {
        let index = index.min(self.steps.len());
        self.steps.insert(index, Step { command, depth: 0 });
        self.renest();
    }

    pub fn push(&mut self, command: Command) {
        self.insert(self.steps.len(), command);
    }

    pub fn remove(&mut self, index: usize) -> Option<Command> {
        if index >= self.steps.len() {
            return None;
        }
        let step = self.steps.remove(index);
        self.renest();
        Some(step.command)
    }

    pub fn clear(&mut self) {
        self.steps.clear();
    }

    /// Remaining allowance for a command class under `budgets`.
    pub fn budget_remaining(&self, budgets: &Budgets, class: CommandClass) -> Budget {
        class.budget(budgets).remaining(self.count(class))
    }

    /// Classes whose count in this program exceeds the budget.
    pub fn over_budget(&self, budgets: &Budgets) -> Vec<CommandClass> {
        [CommandClass::Jump, CommandClass::Loop, CommandClass::Turn]
            .into_iter()
            .filter(|class| !class.budget(budgets).allows(self.count(*class)))
            .collect()
    }

    fn count(&self, class: CommandClass) -> usize {
        self.commands().filter(|c| c.class() == Some(class)).count()
    }

    /// Verify that every loop is closed and every `LoopEnd` has an opener.
    pub fn check(&self) -> Result<(), ProgramError> {
        let mut open = Vec::new();
        for (index, command) in self.commands().enumerate() {
            match command {
                Command::LoopStart(_) => open.push(index),
                Command::LoopEnd => {
                    if open.pop().is_none() {
                        return Err(ProgramError::UnmatchedLoopEnd { index });
                    }
                }
                _ => {}
            }
        }
        match open.first() {
            Some(&index) => Err(ProgramError::UnclosedLoop { index }),
            None => Ok(()),
        }
    }

    /// Index of the `LoopEnd` closing the `LoopStart` at `start`.
    pub(crate) fn matching_end(&self, start: usize) -> Option<usize> {
        let mut open = 0usize;
        for (offset, command) in self.commands().enumerate().skip(start) {
            match command {
                Command::LoopStart(_) => open += 1,
                Command::LoopEnd => {
                    open -= 1;
                    if open == 0 {
                        return Some(offset);
                    }
                }
                _ => {}
            }
        }
        None
    }

    fn renest(&mut self) {
        let mut depth = 0usize;
        for step in &mut self.steps {
            step.depth = depth;
            match step.command {
                Command::LoopStart(_) => depth += 1,
                Command::LoopEnd => depth = depth.saturating_sub(1),
                _ => {}
            }
        }
    }
}

impl From<Vec<Command>> for Program {
    fn from(commands: Vec<Command>) -> Self {
        let mut program = Program {
            steps: commands
                .into_iter()
                .map(|command| Step { command, depth: 0 })
                .collect(),
        };
        program.renest();
        program
    }
}

impl From<Program> for Vec<Command> {
    fn from(program: Program) -> Self {
        program.commands().collect()
    }
}

impl FromIterator<Command> for Program {
    fn from_iter<I: IntoIterator<Item = Command>>(iter: I) -> Self {
        Program::from(iter.into_iter().collect::<Vec<_>>())
    }
}
