//! Static level definition: cell contents, hazard defaults and budgets.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::actor::ROSTER;
use super::grid::{Direction, Grid, Pos};

pub const GROUP_COUNT: usize = 3;

/// One of the three independently toggleable hazard groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Group {
    Red,
    Blue,
    Green,
}

impl Group {
    pub const ALL: [Group; GROUP_COUNT] = [Group::Red, Group::Blue, Group::Green];

    pub fn index(self) -> usize {
        match self {
            Group::Red => 0,
            Group::Blue => 1,
            Group::Green => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Group> {
        Group::ALL.get(index).copied()
    }
}

/// Non-empty set of hazard groups referenced by a toggle button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Group>", into = "Vec<Group>")]
pub struct GroupSet(u8);

impl GroupSet {
    pub const ALL: GroupSet = GroupSet(0b111);

    pub fn single(group: Group) -> Self {
        GroupSet(1 << group.index())
    }

    /// Returns `None` for an empty selection.
    pub fn from_groups(groups: impl IntoIterator<Item = Group>) -> Option<Self> {
        let bits = groups
            .into_iter()
            .fold(0u8, |bits, g| bits | (1 << g.index()));
        (bits != 0).then_some(GroupSet(bits))
    }

    /// Inverse of `bits`; `None` for zero or unknown groups.
    pub fn from_bits(bits: u8) -> Option<Self> {
        (bits != 0 && bits & !GroupSet::ALL.0 == 0).then_some(GroupSet(bits))
    }

    /// One bit per group, group 0 lowest.
    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn contains(self, group: Group) -> bool {
        self.0 & (1 << group.index()) != 0
    }

    pub fn groups(self) -> impl Iterator<Item = Group> {
        Group::ALL.into_iter().filter(move |g| self.contains(*g))
    }
}

impl TryFrom<Vec<Group>> for GroupSet {
    type Error = &'static str;

    fn try_from(groups: Vec<Group>) -> Result<Self, Self::Error> {
        GroupSet::from_groups(groups).ok_or("a toggle must reference at least one group")
    }
}

impl From<GroupSet> for Vec<Group> {
    fn from(set: GroupSet) -> Self {
        set.groups().collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CellKind {
    Empty,
    Coin,
    StartFacing(Direction),
    HorizontalHazardSource(Group),
    VerticalHazardSource(Group),
    ToggleButton(GroupSet),
}

impl CellKind {
    /// Whether an actor may stand on this cell.
    pub fn is_occupiable(self) -> bool {
        match self {
            CellKind::Empty
            | CellKind::Coin
            | CellKind::StartFacing(_)
            | CellKind::ToggleButton(_) => true,
            CellKind::HorizontalHazardSource(_) | CellKind::VerticalHazardSource(_) => false,
        }
    }
}

/// An authoring-time cap on one class of command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Option<u32>", into = "Option<u32>")]
pub enum Budget {
    #[default]
    Unlimited,
    Limited(u32),
}

impl Budget {
    /// What is left after `used` commands have been placed. Saturates at zero.
    pub fn remaining(self, used: usize) -> Budget {
        match self {
            Budget::Unlimited => Budget::Unlimited,
            Budget::Limited(max) => {
                let used = u32::try_from(used).unwrap_or(u32::MAX);
                Budget::Limited(max.saturating_sub(used))
            }
        }
    }

    pub fn allows(self, used: usize) -> bool {
        match self {
            Budget::Unlimited => true,
            Budget::Limited(max) => used <= max as usize,
        }
    }
}

impl From<Option<u32>> for Budget {
    fn from(value: Option<u32>) -> Self {
        value.map_or(Budget::Unlimited, Budget::Limited)
    }
}

impl From<Budget> for Option<u32> {
    fn from(budget: Budget) -> Self {
        match budget {
            Budget::Unlimited => None,
            Budget::Limited(n) => Some(n),
        }
    }
}

impl std::fmt::Display for Budget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Budget::Unlimited => f.write_str("∞"),
            Budget::Limited(n) => write!(f, "{n}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Budgets {
    #[serde(default)]
    pub max_jumps: Budget,
    #[serde(default)]
    pub max_loop_blocks: Budget,
    #[serde(default)]
    pub max_turns: Budget,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LevelError {
    #[error("level has no rows")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unknown cell symbol {symbol:?} at {pos}")]
    UnknownSymbol { symbol: char, pos: Pos },
    #[error("level has no start marker")]
    NoStart,
    #[error("level has {found} start markers, at most {max} actors are supported")]
    TooManyStarts { found: usize, max: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level {
    pub name: Option<String>,
    cells: Grid<CellKind>,
    hazards_enabled: [bool; GROUP_COUNT],
    budgets: Budgets,
}

impl Level {
    pub fn new(
        cells: Grid<CellKind>,
        hazards_enabled: [bool; GROUP_COUNT],
        budgets: Budgets,
    ) -> Result<Self, LevelError> {
        if cells.height() == 0 || cells.width() == 0 {
            return Err(LevelError::Empty);
        }
        let starts = cells
            .iter()
            .filter(|(_, kind)| matches!(kind, CellKind::StartFacing(_)))
            .count();
        if starts == 0 {
            return Err(LevelError::NoStart);
        }
        if starts > ROSTER.len() {
            return Err(LevelError::TooManyStarts {
                found: starts,
                max: ROSTER.len(),
            });
        }
        Ok(Level {
            name: None,
            cells,
            hazards_enabled,
            budgets,
        })
    }

    pub fn cells(&self) -> &Grid<CellKind> {
        &self.cells
    }

    pub fn hazards_enabled(&self) -> [bool; GROUP_COUNT] {
        self.hazards_enabled
    }

    pub fn budgets(&self) -> &Budgets {
        &self.budgets
    }

    pub fn coin_count(&self) -> usize {
        count_coins(&self.cells)
    }
}

pub(crate) fn count_coins(cells: &Grid<CellKind>) -> usize {
    cells
        .iter()
        .filter(|(_, kind)| **kind == CellKind::Coin)
        .count()
}
