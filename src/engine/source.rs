//! Source level types — the human-authored JSON format.
//!
//! Levels are drawn as rows of symbols rather than nested cell objects so they
//! stay readable in a text editor:
//!
//! | symbol        | cell                                   |
//! |---------------|----------------------------------------|
//! | `.` or space  | empty floor                            |
//! | `o`           | coin                                   |
//! | `^ > v <`     | actor start facing north/east/south/west |
//! | `a b c`       | horizontal hazard source, group 0/1/2  |
//! | `A B C`       | vertical hazard source, group 0/1/2    |
//! | `1 2 3`       | toggle button for group 0/1/2          |
//! | `4 5 6`       | toggle button for groups 0+1/0+2/1+2   |
//! | `*`           | toggle button for every group          |

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::grid::{Direction, Grid, Pos};
use super::level::{Budgets, CellKind, GROUP_COUNT, Group, GroupSet, Level, LevelError};
use super::program::Program;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelSource {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub rows: Vec<String>,
    #[serde(default)]
    pub hazards_enabled: [bool; GROUP_COUNT],
    #[serde(flatten)]
    pub budgets: Budgets,
}

impl LevelSource {
    pub fn from_rows(rows: &[&str]) -> Self {
        LevelSource {
            name: None,
            rows: rows.iter().map(|r| r.to_string()).collect(),
            hazards_enabled: [false; GROUP_COUNT],
            budgets: Budgets::default(),
        }
    }

    pub fn with_hazards(mut self, enabled: [bool; GROUP_COUNT]) -> Self {
        self.hazards_enabled = enabled;
        self
    }

    pub fn with_budgets(mut self, budgets: Budgets) -> Self {
        self.budgets = budgets;
        self
    }

    /// Parse the rows and validate the result.
    pub fn build(&self) -> Result<Level, LevelError> {
        let expected = self.rows.first().map_or(0, |r| r.chars().count());
        let mut cells = Vec::with_capacity(self.rows.len());
        for (row, line) in self.rows.iter().enumerate() {
            let parsed = line
                .chars()
                .enumerate()
                .map(|(col, symbol)| {
                    parse_symbol(symbol).ok_or(LevelError::UnknownSymbol {
                        symbol,
                        pos: Pos::new(row, col),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            if parsed.len() != expected {
                return Err(LevelError::Ragged {
                    row,
                    expected,
                    found: parsed.len(),
                });
            }
            cells.push(parsed);
        }

        let mut level = Level::new(Grid::from_rows(cells), self.hazards_enabled, self.budgets)?;
        level.name = self.name.clone();
        Ok(level)
    }
}

/// Toggle symbols indexed by `GroupSet::bits() - 1`.
const TOGGLE_SYMBOLS: [char; 7] = ['1', '2', '4', '3', '5', '6', '*'];

fn parse_symbol(symbol: char) -> Option<CellKind> {
    let group = |i| Group::from_index(i);
    Some(match symbol {
        '.' | ' ' => CellKind::Empty,
        'o' => CellKind::Coin,
        '^' => CellKind::StartFacing(Direction::North),
        '>' => CellKind::StartFacing(Direction::East),
        'v' => CellKind::StartFacing(Direction::South),
        '<' => CellKind::StartFacing(Direction::West),
        'a'..='c' => CellKind::HorizontalHazardSource(group(symbol as usize - 'a' as usize)?),
        'A'..='C' => CellKind::VerticalHazardSource(group(symbol as usize - 'A' as usize)?),
        '1'..='6' | '*' => {
            let index = TOGGLE_SYMBOLS.iter().position(|&t| t == symbol)?;
            CellKind::ToggleButton(GroupSet::from_bits(index as u8 + 1)?)
        }
        _ => return None,
    })
}

pub fn load_level(path: impl AsRef<Path>) -> Result<Level> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let source: LevelSource = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    source
        .build()
        .with_context(|| format!("Invalid level {}", path.display()))
}

/// Load a program, or start an empty one when the file does not exist yet.
pub fn load_program(path: impl AsRef<Path>) -> Result<Program> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Program::new());
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

pub fn save_program(path: impl AsRef<Path>, program: &Program) -> Result<()> {
    let path = path.as_ref();
    let json = serde_json::to_string_pretty(program)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}
