//! Vehicle entity and lifecycle state

use super::config::FootprintTable;
use super::pathfinding::Path;
use super::types::{Direction, Footprint, Position, SpotId, VehicleId, WaypointId};

/// Lifecycle state of a vehicle.
///
/// `Driving` is the initial state, the waypoint-following state, and the
/// state while heading for the exit or the depot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VehicleState {
    Driving,
    /// A spot is reserved and a path into it is being followed
    Parking,
    Parked,
    /// Backing out of the spot, then driving off to the exit
    Leaving,
    /// Waiting at the exit-entry tile for the run to the depot
    ExitQueue,
}

/// A vehicle on the grid, anchored at the top-left of its footprint
#[derive(Debug, Clone)]
pub struct Vehicle {
    pub id: VehicleId,
    pub position: Position,
    pub heading: Direction,
    pub state: VehicleState,

    /// Active path, if any; `None` once exhausted
    pub path: Option<Path>,

    /// Waypoint tour assigned at spawn
    pub route: Vec<WaypointId>,
    pub route_pos: usize,

    /// Handle of the reserved spot; agrees with `ParkingSpot::occupant`
    pub assigned_spot: Option<SpotId>,
    /// Cleared after one parking episode so the vehicle heads for the exit
    pub wants_parking: bool,

    /// Dwell drawn once per parking episode, in ticks
    pub dwell_ticks_total: u32,
    pub dwell_ticks_remaining: u32,

    /// Scripted reverse-out steps left while `Leaving`
    pub reverse_steps_remaining: i32,
}

impl Vehicle {
    pub fn new(id: VehicleId, position: Position, heading: Direction) -> Self {
        Self {
            id,
            position,
            heading,
            state: VehicleState::Driving,
            path: None,
            route: Vec::new(),
            route_pos: 0,
            assigned_spot: None,
            wants_parking: true,
            dwell_ticks_total: 0,
            dwell_ticks_remaining: 0,
            reverse_steps_remaining: 0,
        }
    }

    /// Footprint for the current heading
    pub fn footprint(&self, table: &FootprintTable) -> Footprint {
        table.for_direction(self.heading)
    }

    /// Bottom-right corner of the current bounding box
    pub fn bounding_box_max(&self, table: &FootprintTable) -> Position {
        let fp = self.footprint(table);
        self.position.offset(fp.width - 1, fp.height - 1)
    }

    /// Whether the current footprint covers a grid cell
    pub fn covers(&self, pos: Position, table: &FootprintTable) -> bool {
        let max = self.bounding_box_max(table);
        pos.x >= self.position.x && pos.x <= max.x && pos.y >= self.position.y && pos.y <= max.y
    }

    /// Adopt a path: snap to its first step and keep it only while steps
    /// remain to be consumed
    pub fn set_path(&mut self, path: Path) {
        if let Some(start) = path.start() {
            self.position = start;
        }
        self.path = if path.is_exhausted() { None } else { Some(path) };
    }

    pub fn clear_path(&mut self) {
        self.path = None;
    }

    pub fn has_path(&self) -> bool {
        self.path.is_some()
    }

    /// The waypoint currently being driven toward, if the route has one left
    pub fn current_waypoint(&self) -> Option<WaypointId> {
        self.route.get(self.route_pos).copied()
    }
}
