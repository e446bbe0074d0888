//! Placement validation.
//!
//! [`try_place`] answers "where would this unit land, and may it?" without
//! touching the board, so it can back hover previews as well as real
//! placements. Committing is [`Board::commit`](crate::Board::commit).

use gridwar_protocol::{Coord, Orientation};

use crate::{Board, GameError, Shape};

/// A validated, not yet committed unit position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Absolute cells in template order.
    pub cells: Vec<Coord>,
    /// Index into `cells` of the critical cell, if any.
    pub critical: Option<usize>,
    pub anchor: Coord,
    pub orientation: Orientation,
}

impl Placement {
    pub fn critical_cell(&self) -> Option<Coord> {
        self.critical.map(|i| self.cells[i])
    }
}

/// Rotates `shape`, translates it to `anchor`, and checks every resulting
/// cell against `board`.
///
/// # Errors
/// `OutOfBounds` or `Overlap` for the first offending cell in template
/// order.
pub fn try_place(
    board: &Board,
    shape: &Shape,
    anchor: Coord,
    orientation: Orientation,
) -> Result<Placement, GameError> {
    let cells = shape.project(anchor, orientation);
    check_cells(board, &cells)?;
    Ok(Placement {
        cells,
        critical: shape.critical(),
        anchor,
        orientation,
    })
}

pub(crate) fn check_cells(board: &Board, cells: &[Coord]) -> Result<(), GameError> {
    for &cell in cells {
        if !cell.in_bounds(board.size()) {
            return Err(GameError::OutOfBounds(cell));
        }
        if board.is_occupied(cell) {
            return Err(GameError::Overlap(cell));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn c(x: i32, y: i32) -> Coord {
        Coord::new(x, y)
    }

    #[test]
    fn test_try_place_returns_absolute_cells() {
        let board = Board::new(10);
        let placement = try_place(&board, &Shape::plane(), c(5, 2), Orientation::Up).unwrap();
        assert_eq!(placement.cells.len(), 10);
        assert_eq!(placement.critical_cell(), Some(c(5, 2)));
        assert!(placement.cells.contains(&c(3, 3)));
        assert!(placement.cells.contains(&c(6, 5)));
    }

    #[test]
    fn test_try_place_rejects_negative_cell() {
        // Facing right, the plane's tail reaches x = -1.
        let board = Board::new(10);
        let cells = Shape::plane().project(c(2, 3), Orientation::Right);
        assert!(cells.contains(&c(-1, 3)));

        let result = try_place(&board, &Shape::plane(), c(2, 3), Orientation::Right);
        assert!(matches!(result, Err(GameError::OutOfBounds(cell)) if cell.x < 0));
    }

    #[test]
    fn test_try_place_rejects_far_edge() {
        let board = Board::new(10);
        let result = try_place(&board, &Shape::line(5), c(6, 0), Orientation::Up);
        assert_eq!(result, Err(GameError::OutOfBounds(c(10, 0))));
    }

    #[test]
    fn test_try_place_rejects_overlap() {
        let mut board = Board::new(10);
        let first = try_place(&board, &Shape::line(5), c(0, 0), Orientation::Up).unwrap();
        board.commit(first).unwrap();

        let result = try_place(&board, &Shape::line(5), c(2, 2), Orientation::Left);
        assert_eq!(result, Err(GameError::Overlap(c(2, 0))));
    }

    #[test]
    fn test_try_place_extreme_anchor_is_out_of_bounds() {
        let board = Board::new(10);
        let result = try_place(&board, &Shape::plane(), c(i32::MAX, 0), Orientation::Up);
        assert_eq!(result, Err(GameError::OutOfBounds(c(i32::MAX, 0))));
        let result = try_place(&board, &Shape::line(5), c(i32::MIN, 0), Orientation::Down);
        assert_eq!(result, Err(GameError::OutOfBounds(c(i32::MIN, 0))));
    }

    #[test]
    fn test_try_place_does_not_mutate_board() {
        let board = Board::new(10);
        let before = board.view(true);
        let _ = try_place(&board, &Shape::plane(), c(5, 2), Orientation::Up).unwrap();
        let _ = try_place(&board, &Shape::plane(), c(0, 0), Orientation::Up);
        assert_eq!(board.view(true), before);
        assert_eq!(board.unit_count(), 0);
    }

    #[test]
    fn test_committed_units_are_disjoint() {
        let mut board = Board::new(10);
        let shape = Shape::plane();
        let mut committed = 0;
        for y in 0..10 {
            for x in 0..10 {
                for orientation in Orientation::ALL {
                    if let Ok(p) = try_place(&board, &shape, c(x, y), orientation) {
                        board.commit(p).unwrap();
                        committed += 1;
                    }
                }
            }
        }
        assert!(committed >= 2);

        let mut seen = HashSet::new();
        for unit in board.units() {
            for cell in unit.cells() {
                assert!(seen.insert(*cell), "cell {cell} claimed twice");
            }
        }
    }
}
