//! Hazard field derivation.
//!
//! The field is a pure function of the level's hazard sources, the enabled
//! vector and the group processing order. Beams from groups processed earlier
//! absorb beams from groups processed later, so the order matters: enabled
//! groups come first, and among themselves keep the order in which they were
//! switched on.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::grid::{Direction, Grid, Pos};
use super::level::{CellKind, GROUP_COUNT, Group, GroupSet};

/// Beam directions present in a cell, one bit per side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Beams(u8);

impl Beams {
    pub const NONE: Beams = Beams(0);

    pub fn side(dir: Direction) -> Beams {
        Beams(match dir {
            Direction::North => 0b0001,
            Direction::South => 0b0010,
            Direction::East => 0b0100,
            Direction::West => 0b1000,
        })
    }

    pub fn has(self, dir: Direction) -> bool {
        self.0 & Beams::side(dir).0 != 0
    }

    pub fn is_live(self) -> bool {
        self.0 != 0
    }

    pub fn bits(self) -> u8 {
        self.0
    }
}

impl std::ops::BitOr for Beams {
    type Output = Beams;

    fn bitor(self, rhs: Beams) -> Beams {
        Beams(self.0 | rhs.0)
    }
}

impl std::ops::BitOrAssign for Beams {
    fn bitor_assign(&mut self, rhs: Beams) {
        self.0 |= rhs.0;
    }
}

pub type HazardField = Grid<Beams>;

/// Processing precedence of the hazard groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupOrder([Group; GROUP_COUNT]);

impl GroupOrder {
    pub fn initial(enabled: &[bool; GROUP_COUNT]) -> Self {
        GroupOrder(Group::ALL).resorted(enabled)
    }

    /// A new order with enabled groups first. The sort is stable, so each
    /// partition keeps its relative order from `self`.
    pub fn resorted(&self, enabled: &[bool; GROUP_COUNT]) -> Self {
        let mut groups = self.0;
        groups.sort_by_key(|g| !enabled[g.index()]);
        GroupOrder(groups)
    }

    pub fn groups(&self) -> [Group; GROUP_COUNT] {
        self.0
    }
}

/// Build the hazard field from scratch.
pub fn derive(
    cells: &Grid<CellKind>,
    enabled: &[bool; GROUP_COUNT],
    order: &GroupOrder,
) -> HazardField {
    let mut field = Grid::filled(cells.width(), cells.height(), Beams::NONE);
    let mut owner: Grid<Option<Group>> = Grid::filled(cells.width(), cells.height(), None);

    for group in order.groups() {
        if !enabled[group.index()] {
            continue;
        }
        for (pos, kind) in cells.iter() {
            let dirs = match *kind {
                CellKind::HorizontalHazardSource(g) if g == group => [Direction::East, Direction::West],
                CellKind::VerticalHazardSource(g) if g == group => [Direction::North, Direction::South],
                _ => continue,
            };
            for dir in dirs {
                cast(&mut field, &mut owner, group, pos, dir);
            }
        }
    }

    field
}

fn cast(
    field: &mut HazardField,
    owner: &mut Grid<Option<Group>>,
    group: Group,
    source: Pos,
    dir: Direction,
) {
    let incoming = Beams::side(dir.reversed());
    let outgoing = Beams::side(dir);
    let mut at = source;

    while let Some(next) = at.offset(dir, 1).filter(|p| field.contains(*p)) {
        let (Some(claim), Some(beams)) = (owner.get_mut(next), field.get_mut(next)) else {
            break;
        };
        match *claim {
            Some(earlier) if earlier != group => {
                *beams |= incoming;
                trace!(?group, ?earlier, at = %next, "beam absorbed");
                break;
            }
            _ => {
                *beams |= incoming | outgoing;
                *claim = Some(group);
            }
        }
        at = next;
    }
}

/// Mutable toggle state threaded through a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HazardState {
    enabled: [bool; GROUP_COUNT],
    order: GroupOrder,
    field: HazardField,
}

impl HazardState {
    pub fn new(cells: &Grid<CellKind>, enabled: [bool; GROUP_COUNT]) -> Self {
        let order = GroupOrder::initial(&enabled);
        let field = derive(cells, &enabled, &order);
        HazardState {
            enabled,
            order,
            field,
        }
    }

    pub fn enabled(&self) -> [bool; GROUP_COUNT] {
        self.enabled
    }

    pub fn order(&self) -> &GroupOrder {
        &self.order
    }

    pub fn field(&self) -> &HazardField {
        &self.field
    }

    pub fn is_live(&self, pos: Pos) -> bool {
        self.field.get(pos).is_some_and(|b| b.is_live())
    }

    /// Flip every group in `groups`, then re-derive order and field.
    pub fn toggle(&mut self, groups: GroupSet, cells: &Grid<CellKind>) {
        for group in groups.groups() {
            self.enabled[group.index()] = !self.enabled[group.index()];
        }
        self.order = self.order.resorted(&self.enabled);
        self.field = derive(cells, &self.enabled, &self.order);
    }
}
