//! Renderer — the deterministic rasterizer.
//!
//! Keeps a `Board` mirror of a run, updated from `RunEvent`s alone, and turns
//! it into a grid of styled terminal cells. The renderer never reaches into a
//! live run; given the same starting state and events it always draws the
//! same picture.

use crate::engine::actor::{Actor, ActorColor};
use crate::engine::grid::{Direction, Pos};
use crate::engine::hazard::Beams;
use crate::engine::level::{CellKind, Group};
use crate::engine::world::World;
use crate::engine::RunState;
use crate::types::{Cell, Color, RunEvent, Style};

/// What a viewer knows about a run: the world, actor poses and strikes.
#[derive(Debug, Clone)]
pub struct Board {
    world: World,
    actors: Vec<Actor>,
    struck: Vec<Pos>,
}

impl Board {
    pub fn new(state: &RunState) -> Self {
        Board {
            world: state.world.clone(),
            actors: state.actors.clone(),
            struck: Vec::new(),
        }
    }

    pub fn actors(&self) -> &[Actor] {
        &self.actors
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    /// Fold one event into the mirror.
    pub fn apply(&mut self, event: &RunEvent) {
        match event {
            RunEvent::ActorAdvanced { actor, to, .. } | RunEvent::ActorJumped { actor, to, .. } => {
                if let Some(a) = self.actors.get_mut(*actor) {
                    a.pos = *to;
                }
            }
            RunEvent::ActorTurned { actor, facing, .. } => {
                if let Some(a) = self.actors.get_mut(*actor) {
                    a.facing = *facing;
                }
            }
            RunEvent::ActorStruck { at, .. } => self.struck.push(*at),
            RunEvent::CoinCollected { at, .. } => {
                self.world.enter(*at);
            }
            RunEvent::HazardsToggled { groups, .. } => self.world.toggle(*groups),
            RunEvent::ActorBlocked { .. } | RunEvent::CoinsUneaten { .. } => {}
        }
    }
}

pub struct Renderer;

impl Renderer {
    /// Rasterize a board, one terminal column per grid cell.
    ///
    /// Layers, lowest first: floor and fixtures, beams, actors, strikes.
    pub fn rasterize(board: &Board) -> Vec<Vec<Cell>> {
        let world = board.world();
        let field = world.hazards().field();

        let mut grid: Vec<Vec<Cell>> = world
            .cells()
            .rows()
            .map(|row| row.iter().map(|kind| fixture_cell(*kind)).collect())
            .collect();

        for (pos, beams) in field.iter() {
            if !beams.is_live() {
                continue;
            }
            if let Some(cell) = grid.get_mut(pos.row).and_then(|r| r.get_mut(pos.col)) {
                // Fixtures stay legible under a beam; only floor is redrawn.
                if matches!(world.cell(pos), Some(CellKind::Empty)) {
                    cell.ch = beam_glyph(*beams);
                }
                cell.style.bg = Some(Color::Rgb { r: 70, g: 0, b: 0 });
            }
        }

        for actor in board.actors() {
            if let Some(cell) = grid.get_mut(actor.pos.row).and_then(|r| r.get_mut(actor.pos.col)) {
                cell.ch = facing_glyph(actor.facing);
                cell.style.fg = Some(actor_color(actor.color));
                cell.style.bold = true;
            }
        }

        for pos in &board.struck {
            if let Some(cell) = grid.get_mut(pos.row).and_then(|r| r.get_mut(pos.col)) {
                cell.ch = '✖';
                cell.style = Style {
                    fg: Some(Color::White),
                    bg: Some(Color::Red),
                    bold: true,
                    dim: false,
                };
            }
        }

        grid
    }
}

fn fixture_cell(kind: CellKind) -> Cell {
    let (ch, style) = match kind {
        CellKind::Empty | CellKind::StartFacing(_) => (
            '·',
            Style {
                dim: true,
                ..Style::default()
            },
        ),
        CellKind::Coin => (
            '•',
            Style {
                fg: Some(Color::Yellow),
                bold: true,
                ..Style::default()
            },
        ),
        CellKind::HorizontalHazardSource(g) => ('◆', group_style(g)),
        CellKind::VerticalHazardSource(g) => ('◆', group_style(g)),
        CellKind::ToggleButton(set) => {
            let mut groups = set.groups();
            match (groups.next(), groups.next()) {
                (Some(g), None) => ('▣', group_style(g)),
                _ => (
                    '▣',
                    Style {
                        fg: Some(Color::White),
                        bold: true,
                        ..Style::default()
                    },
                ),
            }
        }
    };
    Cell { ch, style }
}

fn group_style(group: Group) -> Style {
    Style {
        fg: Some(group_color(group)),
        bold: true,
        ..Style::default()
    }
}

pub fn group_color(group: Group) -> Color {
    match group {
        Group::Red => Color::Red,
        Group::Blue => Color::Blue,
        Group::Green => Color::Green,
    }
}

fn actor_color(color: ActorColor) -> Color {
    match color {
        ActorColor::Orange => Color::Rgb { r: 255, g: 150, b: 0 },
        ActorColor::Violet => Color::Magenta,
        ActorColor::Teal => Color::Cyan,
        ActorColor::Pink => Color::Rgb { r: 255, g: 120, b: 200 },
    }
}

fn facing_glyph(facing: Direction) -> char {
    match facing {
        Direction::North => '▲',
        Direction::East => '▶',
        Direction::South => '▼',
        Direction::West => '◀',
    }
}

fn beam_glyph(beams: Beams) -> char {
    let vertical = beams.has(Direction::North) || beams.has(Direction::South);
    let horizontal = beams.has(Direction::East) || beams.has(Direction::West);
    match (horizontal, vertical) {
        (true, true) => '┼',
        (true, false) => '─',
        _ => '│',
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::source::LevelSource;
    use crate::engine::{Program, Run};

    fn text(grid: &[Vec<Cell>]) -> Vec<String> {
        grid.iter().map(|row| row.iter().map(|c| c.ch).collect()).collect()
    }

    #[test]
    fn draws_fixtures_beams_and_actors() {
        let level = LevelSource::from_rows(&["a..", ">o2"])
            .with_hazards([true, false, false])
            .build()
            .unwrap();
        let run = Run::new(&level);
        let board = Board::new(run.state());
        assert_eq!(text(&Renderer::rasterize(&board)), vec!["◆──", "▶•▣"]);
    }

    #[test]
    fn board_mirrors_the_run_from_events() {
        use crate::engine::Command::*;

        let level = LevelSource::from_rows(&[">o1.", "...A"]).build().unwrap();
        let mut run = Run::new(&level);
        let mut board = Board::new(run.state());
        let mut events = Vec::new();
        let program = Program::from(vec![Advance, Advance, TurnRight]);
        run.execute(&program, &mut events).unwrap();

        for event in &events {
            board.apply(event);
        }
        assert_eq!(board.world(), &run.state().world);
        assert_eq!(board.actors(), run.state().actors.as_slice());
    }
}
