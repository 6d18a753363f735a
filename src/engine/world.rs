//! Mutable per-run level state: the cell grid (coins get eaten) and the
//! hazard toggle state derived from it.

use super::grid::{Grid, Pos};
use super::hazard::HazardState;
use super::level::{CellKind, GroupSet, Level, count_coins};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct World {
    cells: Grid<CellKind>,
    hazards: HazardState,
}

/// What entering a cell did to the world.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Entry {
    pub coin: bool,
    pub toggled: Option<GroupSet>,
    pub live_before: bool,
    pub live_after: bool,
}

impl World {
    pub fn new(level: &Level) -> Self {
        let cells = level.cells().clone();
        let hazards = HazardState::new(&cells, level.hazards_enabled());
        World { cells, hazards }
    }

    pub fn cells(&self) -> &Grid<CellKind> {
        &self.cells
    }

    pub fn hazards(&self) -> &HazardState {
        &self.hazards
    }

    pub fn cell(&self, pos: Pos) -> Option<CellKind> {
        self.cells.get(pos).copied()
    }

    pub fn coins_remaining(&self) -> usize {
        count_coins(&self.cells)
    }

    /// Turn start markers into plain floor once their actors exist.
    pub(crate) fn clear_starts(&mut self, starts: &[Pos]) {
        for pos in starts {
            if let Some(cell) = self.cells.get_mut(*pos) {
                *cell = CellKind::Empty;
            }
        }
    }

    pub(crate) fn toggle(&mut self, groups: GroupSet) {
        self.hazards.toggle(groups, &self.cells);
    }

    /// Apply the side effects of an actor landing on `pos`.
    pub(crate) fn enter(&mut self, pos: Pos) -> Entry {
        let live_before = self.hazards.is_live(pos);
        let mut entry = Entry {
            coin: false,
            toggled: None,
            live_before,
            live_after: live_before,
        };
        match self.cell(pos) {
            Some(CellKind::Coin) => {
                if let Some(cell) = self.cells.get_mut(pos) {
                    *cell = CellKind::Empty;
                }
                entry.coin = true;
            }
            Some(CellKind::ToggleButton(groups)) => {
                self.toggle(groups);
                entry.toggled = Some(groups);
                entry.live_after = self.hazards.is_live(pos);
            }
            _ => {}
        }
        entry
    }
}
