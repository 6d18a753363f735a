use std::path::PathBuf;

use anyhow::Result;

use crate::config::Config;
use crate::engine::level::Budget;
use crate::engine::program::CommandClass;
use crate::engine::source::{load_level, load_program, save_program};
use crate::engine::{Command, Level, Program};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    ClearProgram,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Typing the repeat count for a new loop.
    RepeatCount {
        buf: String,
    },
    Confirm {
        message: String,
        /// 0 = Yes, 1 = No
        selected: usize,
        action: ConfirmAction,
    },
}

pub struct EditorState {
    pub level: Level,
    pub program: Program,
    pub program_path: PathBuf,
    /// Index of the selected command; new commands go right after it.
    pub cursor: usize,
    pub mode: Mode,
    pub config: Config,
    pub dirty: bool,
    pub status_message: Option<String>,
}

impl EditorState {
    pub fn open(level_path: &str, program_path: &str) -> Result<Self> {
        let level = load_level(level_path)?;
        let program = load_program(program_path)?;
        Ok(Self::new(level, program, program_path.into(), Config::load()))
    }

    pub fn new(level: Level, program: Program, program_path: PathBuf, config: Config) -> Self {
        EditorState {
            level,
            program,
            program_path,
            cursor: 0,
            mode: Mode::Normal,
            config,
            dirty: false,
            status_message: None,
        }
    }

    pub fn save(&mut self) -> Result<()> {
        save_program(&self.program_path, &self.program)?;
        self.dirty = false;
        self.status_message = Some("Saved".into());
        Ok(())
    }

    /// Insert after the selected command, unless the level's budget for the
    /// command's class is used up. Returns whether the command was placed.
    pub fn insert(&mut self, command: Command) -> bool {
        if let Some(class) = command.class() {
            let budgets = self.level.budgets();
            if self.program.budget_remaining(budgets, class) == Budget::Limited(0) {
                self.status_message = Some(format!("No {} left in this level", class_name(class)));
                return false;
            }
        }
        let index = if self.program.is_empty() {
            0
        } else {
            self.cursor + 1
        };
        self.program.insert(index, command);
        self.cursor = index.min(self.program.len() - 1);
        self.dirty = true;
        self.status_message = None;
        true
    }

    /// Insert a loop with its closing marker and select the opener.
    pub fn insert_loop(&mut self, count: u32) -> bool {
        if !self.insert(Command::LoopStart(count)) {
            return false;
        }
        let opener = self.cursor;
        self.program.insert(opener + 1, Command::LoopEnd);
        self.cursor = opener;
        true
    }

    pub fn delete_selected(&mut self) -> Option<Command> {
        let removed = self.program.remove(self.cursor)?;
        self.cursor = self.cursor.min(self.program.len().saturating_sub(1));
        self.dirty = true;
        Some(removed)
    }

    pub fn clear(&mut self) {
        self.program.clear();
        self.cursor = 0;
        self.dirty = true;
    }

    pub fn move_cursor(&mut self, delta: isize) {
        let last = self.program.len().saturating_sub(1);
        self.cursor = self.cursor.saturating_add_signed(delta).min(last);
    }

    /// One-line budget summary for the panel footer.
    pub fn budget_summary(&self) -> String {
        let budgets = self.level.budgets();
        [CommandClass::Jump, CommandClass::Loop, CommandClass::Turn]
            .into_iter()
            .map(|class| {
                let left = self.program.budget_remaining(budgets, class);
                format!("{} left: {left}", class_name(class))
            })
            .collect::<Vec<_>>()
            .join("  ")
    }
}

pub fn class_name(class: CommandClass) -> &'static str {
    match class {
        CommandClass::Jump => "jumps",
        CommandClass::Loop => "loops",
        CommandClass::Turn => "turns",
    }
}
