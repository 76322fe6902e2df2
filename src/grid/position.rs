// src/grid/position.rs
//! Toroidal coordinates

use serde::{Deserialize, Serialize};
use std::fmt;

/// Size of the board
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: usize,
    pub height: usize,
}

impl Dimensions {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    pub const fn cell_count(&self) -> usize {
        self.width * self.height
    }

    /// Off-board sentinel for travelers that left the grid
    pub const fn vanished(&self) -> Position {
        Position {
            x: self.width,
            y: self.height,
        }
    }

    pub const fn contains(&self, position: Position) -> bool {
        position.x < self.width && position.y < self.height
    }

    /// Row-major index of an on-board position
    pub(crate) const fn index(&self, position: Position) -> usize {
        position.x * self.height + position.y
    }

    /// Every on-board position in row-major order
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.width).flat_map(move |x| (0..self.height).map(move |y| Position::new(x, y)))
    }
}

/// A grid coordinate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }

    /// Neighbor one step away, wrapping at the edges
    pub fn step(self, direction: Direction, dims: Dimensions) -> Position {
        let Position { x, y } = self;
        match direction {
            Direction::Up => Position::new(x, (y + dims.height - 1) % dims.height),
            Direction::Down => Position::new(x, (y + 1) % dims.height),
            Direction::Left => Position::new((x + dims.width - 1) % dims.width, y),
            Direction::Right => Position::new((x + 1) % dims.width, y),
        }
    }

    /// The four cardinal neighbors, in [`Direction::ALL`] order
    pub fn neighbors(self, dims: Dimensions) -> [Position; 4] {
        Direction::ALL.map(|direction| self.step(direction, dims))
    }

    /// Neighbors other than `self`, each listed once, in [`Direction::ALL`] order
    ///
    /// On a board one or two cells wide (or high) several directions wrap
    /// onto the same cell, or back onto `self`.
    pub fn distinct_neighbors(self, dims: Dimensions) -> Vec<Position> {
        let mut distinct = Vec::with_capacity(Direction::ALL.len());
        for neighbor in self.neighbors(dims) {
            if neighbor != self && !distinct.contains(&neighbor) {
                distinct.push(neighbor);
            }
        }
        distinct
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Cardinal movement direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// Fixed search order used by displacement
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const DIMS: Dimensions = Dimensions::new(15, 15);

    #[test]
    fn test_wraps_at_edges() {
        let corner = Position::new(0, 0);
        assert_eq!(corner.step(Direction::Up, DIMS), Position::new(0, 14));
        assert_eq!(corner.step(Direction::Left, DIMS), Position::new(14, 0));

        let far = Position::new(14, 14);
        assert_eq!(far.step(Direction::Down, DIMS), Position::new(14, 0));
        assert_eq!(far.step(Direction::Right, DIMS), Position::new(0, 14));
    }

    #[test]
    fn test_neighbors_order() {
        let neighbors = Position::new(5, 6).neighbors(DIMS);
        assert_eq!(
            neighbors,
            [
                Position::new(5, 5),
                Position::new(5, 7),
                Position::new(4, 6),
                Position::new(6, 6),
            ]
        );
    }

    #[test]
    fn test_distinct_neighbors_on_narrow_boards() {
        let strip = Dimensions::new(1, 3);
        assert_eq!(
            Position::new(0, 1).distinct_neighbors(strip),
            vec![Position::new(0, 0), Position::new(0, 2)]
        );

        let pair = Dimensions::new(2, 1);
        assert_eq!(
            Position::new(0, 0).distinct_neighbors(pair),
            vec![Position::new(1, 0)]
        );

        assert!(Position::new(0, 0)
            .distinct_neighbors(Dimensions::new(1, 1))
            .is_empty());
        assert_eq!(Position::new(5, 6).distinct_neighbors(DIMS).len(), 4);
    }

    #[test]
    fn test_vanished_is_off_board() {
        assert!(!DIMS.contains(DIMS.vanished()));
        assert_eq!(DIMS.positions().count(), DIMS.cell_count());
    }

    proptest! {
        #[test]
        fn step_stays_on_board(x in 0usize..15, y in 0usize..15, w in 1usize..30, h in 1usize..30) {
            let dims = Dimensions::new(w, h);
            let start = Position::new(x % w, y % h);
            for direction in Direction::ALL {
                prop_assert!(dims.contains(start.step(direction, dims)));
            }
        }

        #[test]
        fn opposite_steps_cancel(x in 0usize..15, y in 0usize..15) {
            let start = Position::new(x, y);
            prop_assert_eq!(start.step(Direction::Up, DIMS).step(Direction::Down, DIMS), start);
            prop_assert_eq!(start.step(Direction::Left, DIMS).step(Direction::Right, DIMS), start);
        }

        #[test]
        fn indices_are_unique(w in 1usize..12, h in 1usize..12) {
            let dims = Dimensions::new(w, h);
            let mut seen = vec![false; dims.cell_count()];
            for position in dims.positions() {
                let index = dims.index(position);
                prop_assert!(!seen[index]);
                seen[index] = true;
            }
        }
    }
}
