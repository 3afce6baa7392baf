//! Main simulation world that ties everything together
//!
//! Owns the grid, the navigation graph and the vehicle collection, and runs
//! the tick sequence: per-vehicle state/route logic in spawn order, one
//! movement-resolution pass, then the deferred removal sweep.

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;

use super::config::SimConfig;
use super::grid::Grid;
use super::movement;
use super::pathfinding::NavGraph;
use super::traffic::{self, TickOutcome};
use super::types::{Direction, Position, SimId, SpotId, VehicleId};
use super::vehicle::{Vehicle, VehicleState};

/// The parking-lot world
pub struct ParkingWorld {
    grid: Grid,
    nav: NavGraph,
    /// Spawn order is movement priority; only the post-tick sweep removes
    vehicles: Vec<Vehicle>,
    config: SimConfig,
    next_id: usize,
    /// Optional seeded RNG for reproducible simulations
    rng: Option<StdRng>,
    balance: i64,
    ticks: u64,
    total_spawned: usize,
    total_departed: usize,
}

impl ParkingWorld {
    fn load_internal(source: &str, config: SimConfig, rng: Option<StdRng>) -> Result<Self> {
        let grid = Grid::load(source).context("failed to load map")?;
        let nav = NavGraph::new(&grid);
        Ok(Self {
            grid,
            nav,
            vehicles: Vec::new(),
            config,
            next_id: 0,
            rng,
            balance: 0,
            ticks: 0,
            total_spawned: 0,
            total_departed: 0,
        })
    }

    /// Load a world with the default (smooth-mode) configuration
    pub fn load(source: &str) -> Result<Self> {
        Self::load_internal(source, SimConfig::default(), None)
    }

    pub fn load_with_config(source: &str, config: SimConfig) -> Result<Self> {
        Self::load_internal(source, config, None)
    }

    /// Load with a seeded RNG so dwell draws are reproducible
    pub fn load_with_seed(source: &str, config: SimConfig, seed: u64) -> Result<Self> {
        Self::load_internal(source, config, Some(StdRng::seed_from_u64(seed)))
    }

    fn next_vehicle_id(&mut self) -> VehicleId {
        let id = VehicleId(SimId(self.next_id));
        self.next_id += 1;
        id
    }

    /// Spawn a vehicle and give it the default waypoint tour
    pub fn spawn_vehicle(&mut self, position: Position, heading: Direction) -> VehicleId {
        let id = self.next_vehicle_id();
        let mut vehicle = Vehicle::new(id, position, heading);
        traffic::init_route(&mut vehicle, &self.grid, &self.nav);
        self.vehicles.push(vehicle);
        self.total_spawned += 1;
        id
    }

    /// Spawn at the map's start marker
    pub fn spawn_vehicle_at_start(&mut self, heading: Direction) -> Result<VehicleId> {
        let start = self.grid.start().context("map has no start marker")?;
        Ok(self.spawn_vehicle(start, heading))
    }

    /// Run one simulation tick: state/route pass, movement pass, removal sweep
    pub fn advance_tick(&mut self) {
        let mut removals: Vec<(VehicleId, i64)> = Vec::new();

        for i in 0..self.vehicles.len() {
            let outcome = match &mut self.rng {
                Some(rng) => traffic::step_vehicle(
                    &mut self.vehicles[i],
                    &mut self.grid,
                    &self.nav,
                    &self.config,
                    rng,
                ),
                None => traffic::step_vehicle(
                    &mut self.vehicles[i],
                    &mut self.grid,
                    &self.nav,
                    &self.config,
                    &mut rand::rng(),
                ),
            };
            if let TickOutcome::Remove { payout } = outcome {
                removals.push((self.vehicles[i].id, payout));
            }
        }

        movement::resolve_moves(&mut self.vehicles, &self.grid, &self.config.footprints);

        for &(id, payout) in &removals {
            self.balance += payout;
            self.total_departed += 1;
            self.vehicles.retain(|v| v.id != id);
        }

        self.ticks += 1;
    }

    // --- read-only query surface for renderers and tests ---

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn vehicles(&self) -> &[Vehicle] {
        &self.vehicles
    }

    pub fn vehicle(&self, id: VehicleId) -> Option<&Vehicle> {
        self.vehicles.iter().find(|v| v.id == id)
    }

    pub fn balance(&self) -> i64 {
        self.balance
    }

    pub fn tick_count(&self) -> u64 {
        self.ticks
    }

    /// Whether a spot's indicator lamp should show occupied: the spot is
    /// reserved and its occupant has actually parked
    pub fn indicator_lit(&self, spot_id: SpotId) -> bool {
        self.grid
            .spot(spot_id)
            .filter(|spot| spot.occupied)
            .and_then(|spot| spot.occupant)
            .and_then(|id| self.vehicle(id))
            .is_some_and(|v| v.state == VehicleState::Parked)
    }

    pub fn set_entry_gate_open(&mut self, open: bool) {
        self.grid.set_entry_gate_open(open);
    }

    /// Every spot back-reference agrees with its vehicle's, and vice versa.
    /// Violations are defects; tests assert this after every tick.
    pub fn back_references_consistent(&self) -> bool {
        let spots_ok = self.grid.spots().iter().all(|spot| {
            (spot.occupied == spot.occupant.is_some())
                && spot.occupant.map_or(true, |id| {
                    self.vehicle(id).is_some_and(|v| v.assigned_spot == Some(spot.id))
                })
        });
        let vehicles_ok = self.vehicles.iter().all(|v| {
            v.assigned_spot.map_or(true, |id| {
                self.grid
                    .spot(id)
                    .is_some_and(|spot| spot.occupant == Some(v.id))
            })
        });
        spots_ok && vehicles_ok
    }

    /// One-line state dump for the headless runner
    pub fn summary(&self) -> String {
        let parked = self
            .vehicles
            .iter()
            .filter(|v| v.state == VehicleState::Parked)
            .count();
        let free = self.grid.spots().iter().filter(|s| !s.occupied).count();
        format!(
            "tick {} | vehicles {} ({} parked) | spots free {}/{} | departed {} | balance {}",
            self.ticks,
            self.vehicles.len(),
            parked,
            free,
            self.grid.spots().len(),
            self.total_departed,
            self.balance
        )
    }
}
