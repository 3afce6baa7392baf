//! Per-tick movement resolution
//!
//! Rebuilds a full occupancy snapshot of the grid, then advances every
//! vehicle one path step in spawn order. A vehicle moves only if its whole
//! footprint at the candidate anchor is walkable on the map and unclaimed in
//! the snapshot; otherwise it stays put and its path cursor does not advance.
//!
//! The ordering is load-bearing: a committed move re-marks the mover's
//! footprint, so earlier-spawned vehicles block later ones within the same
//! tick.

use super::config::FootprintTable;
use super::grid::Grid;
use super::types::{Direction, Position, VehicleId};
use super::vehicle::Vehicle;

/// Per-tick mapping from grid cell to the vehicle covering it
pub struct OccupancyMap {
    width: i32,
    height: i32,
    cells: Vec<Option<VehicleId>>,
}

impl OccupancyMap {
    /// Snapshot every vehicle's current footprint
    pub fn snapshot(vehicles: &[Vehicle], grid: &Grid, table: &FootprintTable) -> Self {
        let mut map = Self {
            width: grid.width(),
            height: grid.height(),
            cells: vec![None; (grid.width() * grid.height()) as usize],
        };
        for v in vehicles {
            map.mark(v, grid, table);
        }
        map
    }

    fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    fn index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    /// The vehicle covering a cell, if any; out-of-bounds cells are empty
    pub fn occupant(&self, pos: Position) -> Option<VehicleId> {
        self.in_bounds(pos)
            .then(|| self.cells[self.index(pos)])
            .flatten()
    }

    fn mark(&mut self, v: &Vehicle, grid: &Grid, table: &FootprintTable) {
        for cell in v.footprint(table).cells(v.position) {
            if grid.in_bounds(cell) {
                let idx = self.index(cell);
                self.cells[idx] = Some(v.id);
            }
        }
    }

    /// Clear only cells this vehicle itself claims, so overlapping marks from
    /// other vehicles are left alone
    fn unmark(&mut self, v: &Vehicle, grid: &Grid, table: &FootprintTable) {
        for cell in v.footprint(table).cells(v.position) {
            if grid.in_bounds(cell) {
                let idx = self.index(cell);
                if self.cells[idx] == Some(v.id) {
                    self.cells[idx] = None;
                }
            }
        }
    }
}

/// Advance every vehicle one path step, in slice (spawn) order
pub fn resolve_moves(vehicles: &mut [Vehicle], grid: &Grid, table: &FootprintTable) {
    let mut occupancy = OccupancyMap::snapshot(vehicles, grid, table);

    for v in vehicles.iter_mut() {
        let Some(next) = v.path.as_ref().and_then(|p| p.next_step()) else {
            v.path = None;
            continue;
        };

        // Own footprint must never read as a blocker
        occupancy.unmark(v, grid, table);

        let heading = Direction::from_step(v.position, next).unwrap_or(v.heading);
        let footprint = table.for_direction(heading);

        let blocked = footprint.cells(next).any(|cell| {
            !grid.is_walkable(cell)
                || (grid.in_bounds(cell) && occupancy.occupant(cell).is_some())
        });

        if !blocked {
            v.position = next;
            v.heading = heading;
            if let Some(path) = v.path.as_mut() {
                path.advance();
                if path.is_exhausted() {
                    v.path = None;
                }
            }
        }

        occupancy.mark(v, grid, table);
    }
}
