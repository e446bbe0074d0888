//! One player's grid: placed units plus per-cell attack state.

use gridwar_protocol::{AttackOutcome, CellView, Coord, Orientation};

use crate::GameError;
use crate::placement::{Placement, check_cells};

/// Public status of a single cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellStatus {
    Empty,
    Occupied,
    Hit,
    Miss,
}

/// Internal cell record. Occupied and hit cells remember which unit owns
/// them so attacks resolve without scanning the fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cell {
    Empty,
    Occupied(usize),
    Hit(usize),
    Miss,
}

/// A unit committed to a board.
///
/// Its absolute cells are fixed at placement; only the hit bitmap and the
/// destroyed flag change afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    cells: Vec<Coord>,
    critical: Option<usize>,
    anchor: Coord,
    orientation: Orientation,
    hits: Vec<bool>,
    destroyed: bool,
}

impl Unit {
    fn from_placement(placement: Placement) -> Self {
        let hits = vec![false; placement.cells.len()];
        Self {
            cells: placement.cells,
            critical: placement.critical,
            anchor: placement.anchor,
            orientation: placement.orientation,
            hits,
            destroyed: false,
        }
    }

    pub fn cells(&self) -> &[Coord] {
        &self.cells
    }

    pub fn critical_cell(&self) -> Option<Coord> {
        self.critical.map(|i| self.cells[i])
    }

    pub fn anchor(&self) -> Coord {
        self.anchor
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Per-cell damage, parallel to [`cells`](Self::cells).
    pub fn hits(&self) -> &[bool] {
        &self.hits
    }

    pub fn hit_count(&self) -> usize {
        self.hits.iter().filter(|hit| **hit).count()
    }

    /// A unit with a critical cell is destroyed only by hitting it; a unit
    /// without one is destroyed once every cell is hit.
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    fn strike(&mut self, cell_index: usize) -> AttackOutcome {
        self.hits[cell_index] = true;
        match self.critical {
            Some(critical) if critical == cell_index => {
                self.destroyed = true;
                AttackOutcome::CriticalHit
            }
            Some(_) => AttackOutcome::Hit,
            None => {
                if self.hits.iter().all(|hit| *hit) {
                    self.destroyed = true;
                }
                AttackOutcome::Hit
            }
        }
    }
}

/// A square grid owned by one player.
#[derive(Debug, Clone)]
pub struct Board {
    size: i32,
    cells: Vec<Cell>,
    units: Vec<Unit>,
}

impl Board {
    /// Creates an empty `size × size` board.
    pub fn new(size: i32) -> Self {
        let side = size.max(0) as usize;
        Self {
            size,
            cells: vec![Cell::Empty; side * side],
            units: Vec::new(),
        }
    }

    pub fn size(&self) -> i32 {
        self.size
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Row-major index, or `None` outside the board.
    fn index(&self, coord: Coord) -> Option<usize> {
        coord
            .in_bounds(self.size)
            .then(|| (coord.y * self.size + coord.x) as usize)
    }

    /// Status of a cell, or `None` outside the board.
    pub fn status(&self, coord: Coord) -> Option<CellStatus> {
        self.index(coord).map(|i| match self.cells[i] {
            Cell::Empty => CellStatus::Empty,
            Cell::Occupied(_) => CellStatus::Occupied,
            Cell::Hit(_) => CellStatus::Hit,
            Cell::Miss => CellStatus::Miss,
        })
    }

    /// Returns `true` if a unit covers the cell, damaged or not.
    pub fn is_occupied(&self, coord: Coord) -> bool {
        matches!(
            self.index(coord).map(|i| self.cells[i]),
            Some(Cell::Occupied(_) | Cell::Hit(_))
        )
    }

    /// Returns `true` if the cell was already hit or missed.
    pub fn is_attacked(&self, coord: Coord) -> bool {
        matches!(
            self.status(coord),
            Some(CellStatus::Hit | CellStatus::Miss)
        )
    }

    /// Attaches a validated placement to the board.
    ///
    /// The cells are checked again so a placement computed against an older
    /// board state can't break the no-overlap invariant.
    ///
    /// # Errors
    /// `OutOfBounds` or `Overlap` for the first offending cell.
    pub fn commit(&mut self, placement: Placement) -> Result<usize, GameError> {
        check_cells(self, &placement.cells)?;
        let unit_index = self.units.len();
        for cell in &placement.cells {
            if let Some(i) = self.index(*cell) {
                self.cells[i] = Cell::Occupied(unit_index);
            }
        }
        self.units.push(Unit::from_placement(placement));
        Ok(unit_index)
    }

    /// Resolves an attack against this board.
    ///
    /// # Errors
    /// `OutOfBounds` for a target outside the grid, `AlreadyAttacked` for
    /// a cell that was hit or missed before. Neither mutates the board.
    pub fn receive_attack(&mut self, target: Coord) -> Result<AttackOutcome, GameError> {
        let i = self.index(target).ok_or(GameError::OutOfBounds(target))?;
        match self.cells[i] {
            Cell::Hit(_) | Cell::Miss => Err(GameError::AlreadyAttacked(target)),
            Cell::Empty => {
                self.cells[i] = Cell::Miss;
                Ok(AttackOutcome::Miss)
            }
            Cell::Occupied(unit_index) => {
                let unit = &mut self.units[unit_index];
                let cell_index = unit
                    .cells
                    .iter()
                    .position(|c| *c == target)
                    .ok_or(GameError::OutOfBounds(target))?;
                let outcome = unit.strike(cell_index);
                self.cells[i] = Cell::Hit(unit_index);
                Ok(outcome)
            }
        }
    }

    /// Number of units not yet destroyed.
    pub fn surviving_units(&self) -> usize {
        self.units.iter().filter(|u| !u.is_destroyed()).count()
    }

    /// Returns `true` once the board holds at least one unit and every unit
    /// is destroyed.
    pub fn all_destroyed(&self) -> bool {
        !self.units.is_empty() && self.surviving_units() == 0
    }

    /// Renders the grid row by row (`view[y][x]`).
    ///
    /// With `reveal == false` the result is safe to show to the opponent:
    /// unattacked unit cells read as `Empty`.
    pub fn view(&self, reveal: bool) -> Vec<Vec<CellView>> {
        (0..self.size)
            .map(|y| {
                (0..self.size)
                    .map(|x| self.cell_view(Coord::new(x, y), reveal))
                    .collect()
            })
            .collect()
    }

    fn cell_view(&self, coord: Coord, reveal: bool) -> CellView {
        let Some(i) = self.index(coord) else {
            return CellView::Empty;
        };
        match self.cells[i] {
            Cell::Empty => CellView::Empty,
            Cell::Miss => CellView::Miss,
            Cell::Occupied(_) if !reveal => CellView::Empty,
            Cell::Occupied(u) => {
                if self.units[u].critical_cell() == Some(coord) {
                    CellView::Critical
                } else {
                    CellView::Unit
                }
            }
            Cell::Hit(u) => {
                if self.units[u].critical_cell() == Some(coord) {
                    CellView::CriticalHit
                } else {
                    CellView::Hit
                }
            }
        }
    }
}
