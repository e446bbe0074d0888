//! Unit shape templates and quarter-turn rotation.
//!
//! A [`Shape`] is an ordered list of offsets relative to an anchor. At most
//! one offset is critical: hitting it destroys the whole unit. Shapes are
//! immutable template data; placing a unit projects a rotated copy onto the
//! board and never changes the template.

use std::collections::{BTreeSet, HashSet};

use gridwar_protocol::{Coord, Orientation};
use serde::{Deserialize, Serialize};

use crate::ShapeError;

/// Offsets of the cross-shaped plane, nose first.
///
/// ```text
/// . . H . .
/// B B B B B
/// . . B . .
/// . B B B .
/// ```
const PLANE_OFFSETS: [Coord; 10] = [
    Coord::new(0, 0),
    Coord::new(-2, 1),
    Coord::new(-1, 1),
    Coord::new(0, 1),
    Coord::new(1, 1),
    Coord::new(2, 1),
    Coord::new(0, 2),
    Coord::new(-1, 3),
    Coord::new(0, 3),
    Coord::new(1, 3),
];

/// A validated polyomino template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawShape")]
pub struct Shape {
    offsets: Vec<Coord>,
    critical: Option<usize>,
}

/// Unvalidated form used for deserialization.
#[derive(Deserialize)]
struct RawShape {
    offsets: Vec<Coord>,
    #[serde(default)]
    critical: Option<usize>,
}

impl TryFrom<RawShape> for Shape {
    type Error = ShapeError;

    fn try_from(raw: RawShape) -> Result<Self, Self::Error> {
        Shape::new(raw.offsets, raw.critical)
    }
}

impl Shape {
    /// Builds a shape from offsets and an optional critical index.
    ///
    /// # Errors
    /// Fails if there are no offsets, an offset repeats, or `critical`
    /// doesn't index into `offsets`.
    pub fn new(offsets: Vec<Coord>, critical: Option<usize>) -> Result<Self, ShapeError> {
        if offsets.is_empty() {
            return Err(ShapeError::Empty);
        }
        let mut seen = HashSet::with_capacity(offsets.len());
        for offset in &offsets {
            if !seen.insert(*offset) {
                return Err(ShapeError::DuplicateOffset(*offset));
            }
        }
        if let Some(index) = critical {
            if index >= offsets.len() {
                return Err(ShapeError::CriticalOutOfRange {
                    index,
                    len: offsets.len(),
                });
            }
        }
        Ok(Self { offsets, critical })
    }

    /// A straight ship of `len` cells along +x, with no critical cell.
    /// Lengths below one are raised to one.
    pub fn line(len: usize) -> Self {
        let len = len.max(1) as i32;
        Self {
            offsets: (0..len).map(|x| Coord::new(x, 0)).collect(),
            critical: None,
        }
    }

    /// The ten-cell cross plane with its nose at the anchor as the
    /// critical cell.
    pub fn plane() -> Self {
        Self {
            offsets: PLANE_OFFSETS.to_vec(),
            critical: Some(0),
        }
    }

    pub fn offsets(&self) -> &[Coord] {
        &self.offsets
    }

    /// Index of the critical offset, if the shape has one.
    pub fn critical(&self) -> Option<usize> {
        self.critical
    }

    pub fn critical_offset(&self) -> Option<Coord> {
        self.critical.map(|i| self.offsets[i])
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Always `false` for a constructed shape; provided alongside `len`.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// The offsets as a set, for order-independent comparison.
    pub fn cell_set(&self) -> BTreeSet<Coord> {
        self.offsets.iter().copied().collect()
    }

    /// Returns this shape turned to face `orientation`.
    pub fn rotated(&self, orientation: Orientation) -> Shape {
        rotate(self, orientation.steps())
    }

    /// Absolute cells of this shape rotated to `orientation` and
    /// translated to `anchor`, in template order.
    pub fn project(&self, anchor: Coord, orientation: Orientation) -> Vec<Coord> {
        self.rotated(orientation)
            .offsets
            .into_iter()
            .map(|offset| offset.offset_by(anchor))
            .collect()
    }
}

/// Applies `steps` quarter turns, `(x, y) → (y, −x)`, to every offset.
/// With y pointing down this turns counter-clockwise on screen. Steps are
/// taken modulo four. Offset order, and with it the critical index, is
/// preserved.
pub fn rotate(shape: &Shape, steps: u8) -> Shape {
    let mut offsets = shape.offsets.clone();
    for _ in 0..steps % 4 {
        for offset in &mut offsets {
            *offset = quarter_turn(*offset);
        }
    }
    Shape {
        offsets,
        critical: shape.critical,
    }
}

fn quarter_turn(c: Coord) -> Coord {
    Coord::new(c.y, -c.x)
}
