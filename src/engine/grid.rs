//! Grid geometry shared by levels, hazard fields and actors.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn turned_right(self) -> Self {
        match self {
            Direction::North => Direction::East,
            Direction::East => Direction::South,
            Direction::South => Direction::West,
            Direction::West => Direction::North,
        }
    }

    pub fn turned_left(self) -> Self {
        match self {
            Direction::North => Direction::West,
            Direction::West => Direction::South,
            Direction::South => Direction::East,
            Direction::East => Direction::North,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::East => Direction::West,
            Direction::West => Direction::East,
        }
    }

    /// Row/column delta of one step in this direction.
    fn delta(self) -> (isize, isize) {
        match self {
            Direction::North => (-1, 0),
            Direction::South => (1, 0),
            Direction::East => (0, 1),
            Direction::West => (0, -1),
        }
    }
}

/// A rotation applied to an actor's facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Turn {
    Left,
    Right,
    Around,
}

impl Turn {
    pub fn apply(self, facing: Direction) -> Direction {
        match self {
            Turn::Left => facing.turned_left(),
            Turn::Right => facing.turned_right(),
            Turn::Around => facing.reversed(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Pos {
    pub row: usize,
    pub col: usize,
}

impl Pos {
    pub const fn new(row: usize, col: usize) -> Self {
        Pos { row, col }
    }

    /// Step `distance` cells in `dir`. Returns `None` when the step would
    /// leave the non-negative quadrant; upper bounds are checked by the grid.
    pub fn offset(self, dir: Direction, distance: usize) -> Option<Pos> {
        let (dr, dc) = dir.delta();
        let row = self.row.checked_add_signed(dr * distance as isize)?;
        let col = self.col.checked_add_signed(dc * distance as isize)?;
        Some(Pos { row, col })
    }
}

impl std::fmt::Display for Pos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Dense row-major matrix with fixed dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid<T> {
    width: usize,
    height: usize,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn filled(width: usize, height: usize, value: T) -> Self {
        Grid {
            width,
            height,
            cells: vec![value; width * height],
        }
    }
}

impl<T> Grid<T> {
    /// Build a grid from rows. Callers guarantee the rows are rectangular.
    pub(crate) fn from_rows(rows: Vec<Vec<T>>) -> Self {
        let height = rows.len();
        let width = rows.first().map_or(0, Vec::len);
        Grid {
            width,
            height,
            cells: rows.into_iter().flatten().collect(),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn contains(&self, pos: Pos) -> bool {
        pos.row < self.height && pos.col < self.width
    }

    pub fn get(&self, pos: Pos) -> Option<&T> {
        self.contains(pos)
            .then(|| &self.cells[pos.row * self.width + pos.col])
    }

    pub fn get_mut(&mut self, pos: Pos) -> Option<&mut T> {
        if self.contains(pos) {
            Some(&mut self.cells[pos.row * self.width + pos.col])
        } else {
            None
        }
    }

    /// Cells in grid-scan order (row by row, left to right).
    pub fn iter(&self) -> impl Iterator<Item = (Pos, &T)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (Pos::new(i / width, i % width), cell))
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.cells.chunks(self.width.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_refuses_negative_coordinates() {
        let origin = Pos::new(0, 1);
        assert_eq!(origin.offset(Direction::North, 1), None);
        assert_eq!(origin.offset(Direction::West, 1), Some(Pos::new(0, 0)));
        assert_eq!(origin.offset(Direction::West, 2), None);
        assert_eq!(origin.offset(Direction::South, 2), Some(Pos::new(2, 1)));
    }

    #[test]
    fn turns_compose_back_to_the_start() {
        for dir in Direction::ALL {
            assert_eq!(dir.turned_left().turned_right(), dir);
            assert_eq!(Turn::Around.apply(Turn::Around.apply(dir)), dir);
            assert_eq!(
                Turn::Right.apply(Turn::Right.apply(dir)),
                Turn::Around.apply(dir)
            );
        }
    }

    #[test]
    fn scan_order_is_row_major() {
        let grid = Grid::from_rows(vec![vec!['a', 'b'], vec!['c', 'd']]);
        let order: Vec<_> = grid.iter().map(|(pos, ch)| (pos, *ch)).collect();
        assert_eq!(
            order,
            vec![
                (Pos::new(0, 0), 'a'),
                (Pos::new(0, 1), 'b'),
                (Pos::new(1, 0), 'c'),
                (Pos::new(1, 1), 'd'),
            ]
        );
        assert!(grid.get(Pos::new(2, 0)).is_none());
    }
}
