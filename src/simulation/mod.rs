//! Standalone parking-lot simulation core
//!
//! Everything here runs headless: the tile grid, pathfinding, the vehicle
//! state machine, parking allocation and the per-tick movement resolver.
//! Rendering, keyboard input and spawn cadence live outside and talk to this
//! module through the `ParkingWorld` query surface.

mod config;
mod grid;
mod movement;
mod pathfinding;
mod tile;
mod traffic;
mod types;
mod vehicle;
mod world;

// Re-export public types for external use
// These may not be used within this crate but are part of the public API
#[allow(unused_imports)]
pub use config::{FootprintTable, SimConfig};
#[allow(unused_imports)]
pub use grid::{Gate, Grid, ParkingSpot};
#[allow(unused_imports)]
pub use movement::OccupancyMap;
#[allow(unused_imports)]
pub use pathfinding::{find_path_with_footprint, NavGraph, Path};
#[allow(unused_imports)]
pub use tile::{Tile, TileType};
#[allow(unused_imports)]
pub use traffic::{find_near_free_spot, TickOutcome};
#[allow(unused_imports)]
pub use types::{
    Direction, Footprint, Position, SimId, SpotId, VehicleId, WaypointId, MAX_PATH_STEPS,
    MAX_ROUTE_WAYPOINTS, PARKING_SEARCH_RADIUS, PAYOUT_PER_SECOND,
};
#[allow(unused_imports)]
pub use vehicle::{Vehicle, VehicleState};
pub use world::ParkingWorld;
