use serde::{Deserialize, Serialize};

use crate::geom::Point;

/// Per-item position and velocity of a layout.
///
/// Owned exclusively by the running solver; each completed iteration replaces it as a whole.
/// Serialisable so a stopped layout can be resumed later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutState {
    pub(crate) positions: Vec<Point>,
    pub(crate) velocities: Vec<Point>,
}

impl LayoutState {
    /// State at rest at `positions`.
    pub fn at_rest(positions: Vec<Point>) -> Self {
        let velocities = vec![Point::ORIGIN; positions.len()];
        Self {
            positions,
            velocities,
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn positions(&self) -> &[Point] {
        &self.positions
    }

    pub fn velocities(&self) -> &[Point] {
        &self.velocities
    }

    pub fn into_positions(self) -> Vec<Point> {
        self.positions
    }
}
