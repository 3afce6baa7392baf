//! Core types for the parking-lot simulation
//!
//! Standalone types shared by the grid, pathfinding and traffic modules.

/// A unique identifier for simulation entities
/// This is a simple wrapper around a usize for type safety
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SimId(pub usize);

/// A wrapper type for vehicle IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VehicleId(pub SimId);

/// A wrapper type for parking spot IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpotId(pub SimId);

/// A wrapper type for waypoint IDs (single map digits, 1-9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WaypointId(pub u8);

/// A tile coordinate on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Manhattan distance to another position
    pub fn manhattan(&self, other: &Position) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Squared Euclidean distance between anchors
    pub fn distance_squared(&self, other: &Position) -> i64 {
        let dx = (self.x - other.x) as i64;
        let dy = (self.y - other.y) as i64;
        dx * dx + dy * dy
    }

    pub fn offset(&self, dx: i32, dy: i32) -> Position {
        Position::new(self.x + dx, self.y + dy)
    }
}

/// One of the four cardinal headings a vehicle can face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    /// Unit step in grid coordinates (y grows downward)
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::North => (0, -1),
            Direction::East => (1, 0),
            Direction::South => (0, 1),
            Direction::West => (-1, 0),
        }
    }

    pub fn opposite(&self) -> Direction {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// Derive a heading from a single-cell path step, if the step is cardinal
    pub fn from_step(from: Position, to: Position) -> Option<Direction> {
        match (to.x - from.x, to.y - from.y) {
            (1, 0) => Some(Direction::East),
            (-1, 0) => Some(Direction::West),
            (0, -1) => Some(Direction::North),
            (0, 1) => Some(Direction::South),
            _ => None,
        }
    }
}

/// A rectangle of tiles anchored at its top-left corner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footprint {
    pub width: i32,
    pub height: i32,
}

impl Footprint {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Iterate every cell the footprint covers when anchored at `anchor`
    pub fn cells(&self, anchor: Position) -> impl Iterator<Item = Position> {
        let (w, h) = (self.width, self.height);
        (0..h).flat_map(move |sy| (0..w).map(move |sx| anchor.offset(sx, sy)))
    }
}

/// Maximum number of steps a single path may contain; longer routes are
/// treated as "no path found"
pub const MAX_PATH_STEPS: usize = 256;

/// Maximum number of waypoints in a vehicle route
pub const MAX_ROUTE_WAYPOINTS: usize = 16;

/// Default search radius (in tiles) when looking for a nearby free spot
pub const PARKING_SEARCH_RADIUS: i32 = 12;

/// Payout earned per second of dwell time when a vehicle reaches the depot
pub const PAYOUT_PER_SECOND: i64 = 5;
