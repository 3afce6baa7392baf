//! Per-tick traffic orchestration
//!
//! Runs the state machine for one vehicle at a time: spot search and
//! reservation, arrival detection, dwell countdown, the scripted reverse-out,
//! exit queueing and the depot payout. Movement itself happens afterwards in
//! the movement resolver; every path planned here is only a proposal that the
//! resolver re-checks cell by cell.

use log::debug;
use rand::Rng;

use super::config::SimConfig;
use super::grid::Grid;
use super::pathfinding::{find_path_with_footprint, NavGraph};
use super::types::{SpotId, PAYOUT_PER_SECOND};
use super::vehicle::{Vehicle, VehicleState};

/// What the tick decided for a vehicle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Continue,
    /// Reached the depot; remove in the post-tick sweep and credit the payout
    Remove { payout: i64 },
}

/// Assign the default waypoint tour (all map waypoints in id order) and plan
/// the first leg
pub fn init_route(v: &mut Vehicle, grid: &Grid, nav: &NavGraph) {
    let mut route = grid.waypoint_ids();
    route.truncate(super::types::MAX_ROUTE_WAYPOINTS);
    if route.is_empty() {
        return;
    }
    v.route = route;
    v.route_pos = 0;
    plan_route_leg(v, grid, nav);
}

fn plan_route_leg(v: &mut Vehicle, grid: &Grid, nav: &NavGraph) {
    let Some(target) = v.current_waypoint().and_then(|id| grid.waypoint(id)) else {
        return;
    };
    match nav.find_path(v.position, target) {
        Some(path) => v.set_path(path),
        None => {
            debug!(
                "vehicle {:?}: no path to waypoint at ({},{})",
                v.id, target.x, target.y
            );
            v.clear_path();
        }
    }
}

/// Run one tick of state-machine logic for a single vehicle
pub fn step_vehicle<R: Rng>(
    v: &mut Vehicle,
    grid: &mut Grid,
    nav: &NavGraph,
    cfg: &SimConfig,
    rng: &mut R,
) -> TickOutcome {
    // Spot search: retried every tick until a spot is reserved and pathed
    if v.state == VehicleState::Driving && v.wants_parking && v.assigned_spot.is_none() {
        try_assign_spot(v, grid, cfg);
    }

    // Dwell countdown; runs before arrival so the arrival tick doesn't count
    if v.state == VehicleState::Parked {
        v.dwell_ticks_remaining = v.dwell_ticks_remaining.saturating_sub(1);
        if v.dwell_ticks_remaining == 0 {
            let width = v.footprint(&cfg.footprints).width;
            v.reverse_steps_remaining = width + 2;
            v.wants_parking = false;
            v.clear_path();
            v.state = VehicleState::Leaving;
            debug!(
                "vehicle {:?} leaving, reversing {} steps",
                v.id, v.reverse_steps_remaining
            );
        }
    }

    // Arrival: anchored on the spot with the path exhausted
    if v.state == VehicleState::Parking {
        if let Some(spot_id) = v.assigned_spot {
            let anchor = grid.spot(spot_id).map(|s| s.anchor);
            if anchor == Some(v.position) && !v.has_path() {
                if let Some(spot) = grid.spot_mut(spot_id) {
                    spot.occupied = true;
                    spot.occupant = Some(v.id);
                }
                let secs = rng.random_range(cfg.min_parking_time_secs..=cfg.max_parking_time_secs);
                v.dwell_ticks_total = cfg.secs_to_ticks(secs);
                v.dwell_ticks_remaining = v.dwell_ticks_total;
                v.state = VehicleState::Parked;
                debug!(
                    "vehicle {:?} parked in spot {:?} for {}s",
                    v.id, spot_id, secs
                );
            }
        }
    }

    // Scripted reverse-out: deliberately not collision-checked
    if v.state == VehicleState::Leaving {
        if v.reverse_steps_remaining > 0 {
            let (dx, dy) = v.heading.opposite().delta();
            v.position = v.position.offset(dx, dy);
            v.reverse_steps_remaining -= 1;
        }
        if v.reverse_steps_remaining == 0 {
            release_spot(v, grid);
            if let Some(exit) = grid.exit() {
                let footprint = v.footprint(&cfg.footprints);
                match find_path_with_footprint(grid, v.position, exit, footprint) {
                    Some(path) => {
                        v.set_path(path);
                        v.state = VehicleState::Driving;
                    }
                    None => {
                        // Stay in Leaving and retry next tick
                        debug!("vehicle {:?}: no path to exit yet", v.id);
                    }
                }
            }
        }
    }

    // Exit-entry reached: queue for the depot run
    if matches!(v.state, VehicleState::Driving | VehicleState::ExitQueue)
        && !v.wants_parking
        && !v.has_path()
        && grid.exit() == Some(v.position)
    {
        v.state = VehicleState::ExitQueue;
        grid.set_exit_gate_open(true);
        if let Some(depot) = grid.depot() {
            match nav.find_path(v.position, depot) {
                Some(path) => {
                    v.set_path(path);
                    v.state = VehicleState::Driving;
                }
                None => debug!("vehicle {:?}: no path to depot yet", v.id),
            }
        }
    }

    // Depot reached: pay out and mark for removal
    if v.state == VehicleState::Driving
        && !v.wants_parking
        && !v.has_path()
        && grid.depot() == Some(v.position)
    {
        let dwell_secs = (v.dwell_ticks_total * cfg.tick_ms / 1000) as i64;
        let payout = dwell_secs * PAYOUT_PER_SECOND;
        grid.set_exit_gate_open(false);
        debug!("vehicle {:?} reached depot, payout {}", v.id, payout);
        return TickOutcome::Remove { payout };
    }

    // Waypoint tour while not pursuing a spot
    if v.state == VehicleState::Driving && v.wants_parking && v.assigned_spot.is_none() {
        follow_route(v, grid, nav, cfg);
    }

    TickOutcome::Continue
}

fn follow_route(v: &mut Vehicle, grid: &Grid, nav: &NavGraph, cfg: &SimConfig) {
    let Some(target) = v.current_waypoint().and_then(|id| grid.waypoint(id)) else {
        return;
    };
    let reached = v.covers(target, &cfg.footprints);
    if reached && !v.has_path() {
        v.route_pos += 1;
        plan_route_leg(v, grid, nav);
    }
}

/// Pick the best free spot for a vehicle.
///
/// Prefers the free spot whose block is nearest the vehicle's bounding box
/// within the search radius; falls back to the globally nearest free spot by
/// anchor distance when none qualifies.
pub fn find_near_free_spot(
    v: &Vehicle,
    grid: &Grid,
    cfg: &SimConfig,
    radius: i32,
) -> Option<SpotId> {
    let bbox_max = v.bounding_box_max(&cfg.footprints);
    let radius_sq = (radius as i64) * (radius as i64);

    let mut best: Option<(SpotId, i64)> = None;
    for spot in grid.spots() {
        if spot.occupied {
            continue;
        }
        let dist_sq = spot.bbox_distance_squared(v.position, bbox_max);
        if dist_sq <= radius_sq && best.is_none_or(|(_, d)| dist_sq < d) {
            best = Some((spot.id, dist_sq));
        }
    }
    if let Some((id, dist_sq)) = best {
        debug!("vehicle {:?}: nearby spot {:?} dist2={}", v.id, id, dist_sq);
        return Some(id);
    }

    // Fallback: globally nearest free spot, measured anchor to anchor
    for spot in grid.spots() {
        if spot.occupied {
            continue;
        }
        let dist_sq = v.position.distance_squared(&spot.anchor);
        if best.is_none_or(|(_, d)| dist_sq < d) {
            best = Some((spot.id, dist_sq));
        }
    }
    match best {
        Some((id, dist_sq)) => {
            debug!(
                "vehicle {:?}: no spot within radius {}, global nearest {:?} dist2={}",
                v.id, radius, id, dist_sq
            );
            Some(id)
        }
        None => {
            debug!("vehicle {:?}: no free parking spots", v.id);
            None
        }
    }
}

/// Reserve a spot and plan a footprint-aware path into it.
///
/// Reservation happens before the path attempt so two vehicles can never
/// claim the same spot in one tick. If neither the anchor nor any interior
/// position yields a path, the reservation is released and the search retries
/// next tick.
fn try_assign_spot(v: &mut Vehicle, grid: &mut Grid, cfg: &SimConfig) {
    let Some(spot_id) = find_near_free_spot(v, grid, cfg, cfg.parking_search_radius) else {
        return;
    };

    let Some(spot) = grid.spot_mut(spot_id) else {
        return;
    };
    spot.occupied = true;
    spot.occupant = Some(v.id);
    let anchor = spot.anchor;
    let interior = spot.interior_anchors(v.footprint(&cfg.footprints));
    v.assigned_spot = Some(spot_id);

    let footprint = v.footprint(&cfg.footprints);
    let mut targets = vec![anchor];
    targets.extend(interior.into_iter().filter(|&p| p != anchor));

    for target in targets {
        if let Some(path) = find_path_with_footprint(grid, v.position, target, footprint) {
            debug!(
                "vehicle {:?}: path into spot {:?} via ({},{}), {} steps",
                v.id,
                spot_id,
                target.x,
                target.y,
                path.len()
            );
            v.set_path(path);
            v.state = VehicleState::Parking;
            return;
        }
    }

    debug!(
        "vehicle {:?}: no path into spot {:?}, releasing reservation",
        v.id, spot_id
    );
    release_spot(v, grid);
}

/// Clear both halves of the spot/vehicle back-reference pair
fn release_spot(v: &mut Vehicle, grid: &mut Grid) {
    if let Some(spot_id) = v.assigned_spot.take() {
        if let Some(spot) = grid.spot_mut(spot_id) {
            spot.occupied = false;
            spot.occupant = None;
        }
    }
}
