//! Numeric simulation configuration
//!
//! The config is read-only once the world is constructed. Footprint
//! dimensions are carried here explicitly instead of living in a process-wide
//! table, so tests can build vehicles of any size without global setup.

use super::types::{Direction, Footprint, PARKING_SEARCH_RADIUS};

/// Footprint dimensions per heading orientation.
///
/// Horizontal (east/west) and vertical (north/south) orientations may differ;
/// the default car is 8x2 lying down and 3x3 standing up, matching the
/// terminal sprite set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FootprintTable {
    pub horizontal: Footprint,
    pub vertical: Footprint,
}

impl FootprintTable {
    /// The standard small car
    pub fn car_small() -> Self {
        Self {
            horizontal: Footprint::new(8, 2),
            vertical: Footprint::new(3, 3),
        }
    }

    /// A single-tile occupant, mostly useful in tests
    pub fn unit() -> Self {
        Self {
            horizontal: Footprint::new(1, 1),
            vertical: Footprint::new(1, 1),
        }
    }

    /// Footprint for a given heading
    pub fn for_direction(&self, dir: Direction) -> Footprint {
        match dir {
            Direction::East | Direction::West => self.horizontal,
            Direction::North | Direction::South => self.vertical,
        }
    }
}

impl Default for FootprintTable {
    fn default() -> Self {
        Self::car_small()
    }
}

/// Numeric knobs consumed by the simulation core.
///
/// Spawn cadence is included for completeness; the core itself never reads
/// it, the external spawner does.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// Minimum dwell time in the Parked state, seconds
    pub min_parking_time_secs: u32,
    /// Maximum dwell time in the Parked state, seconds
    pub max_parking_time_secs: u32,
    /// Milliseconds of simulated time per tick
    pub tick_ms: u32,
    /// Milliseconds between vehicle spawns (read by the external spawner)
    pub spawn_rate_ms: u32,
    /// Radius in tiles for the nearby-spot search
    pub parking_search_radius: i32,
    /// Vehicle footprint dimensions per heading
    pub footprints: FootprintTable,
}

impl SimConfig {
    /// Relaxed traffic: long dwell times, slow ticks
    pub fn smooth() -> Self {
        Self {
            min_parking_time_secs: 3,
            max_parking_time_secs: 10,
            tick_ms: 150,
            spawn_rate_ms: 2000,
            parking_search_radius: PARKING_SEARCH_RADIUS,
            footprints: FootprintTable::car_small(),
        }
    }

    /// Rush hour: short dwell times, fast ticks
    pub fn busy() -> Self {
        Self {
            min_parking_time_secs: 1,
            max_parking_time_secs: 4,
            tick_ms: 60,
            spawn_rate_ms: 600,
            parking_search_radius: PARKING_SEARCH_RADIUS,
            footprints: FootprintTable::car_small(),
        }
    }

    /// Convert a dwell duration in seconds to whole ticks, at least one
    pub fn secs_to_ticks(&self, secs: u32) -> u32 {
        (secs * 1000 / self.tick_ms).max(1)
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self::smooth()
    }
}
