//! Parking-spot detection, allocation and reservation tests

use parking_sim::simulation::{
    find_near_free_spot, Direction, FootprintTable, Grid, ParkingWorld, Position, SimConfig, SimId,
    TileType, Vehicle, VehicleId, VehicleState,
};

/// Deterministic single-tile test config: one tick equals one second
fn test_config() -> SimConfig {
    SimConfig {
        min_parking_time_secs: 2,
        max_parking_time_secs: 2,
        tick_ms: 1000,
        spawn_rate_ms: 1000,
        parking_search_radius: 5,
        footprints: FootprintTable::unit(),
    }
}

#[test]
fn spot_detection_finds_rectangular_blocks() {
    let source = [
        "PPPP PP",
        "PPPP PP",
        "       ",
    ]
    .join("\n");
    let grid = Grid::load(&source).expect("load");
    let spots = grid.spots();
    assert_eq!(spots.len(), 2);

    assert_eq!(spots[0].anchor, Position::new(0, 0));
    assert_eq!((spots[0].width, spots[0].height), (4, 2));
    assert_eq!(spots[1].anchor, Position::new(5, 0));
    assert_eq!((spots[1].width, spots[1].height), (2, 2));

    // Every parking tile carries its spot back-reference
    for spot in spots {
        for y in spot.anchor.y..spot.anchor.y + spot.height {
            for x in spot.anchor.x..spot.anchor.x + spot.width {
                let tile = grid.tile(Position::new(x, y)).expect("in bounds");
                assert_eq!(tile.spot, Some(spot.id));
            }
        }
    }
}

#[test]
fn adjacent_wall_becomes_indicator_tile() {
    let source = [
        "      ",
        "|PP   ",
        "|PP   ",
    ]
    .join("\n");
    let grid = Grid::load(&source).expect("load");
    let spot = &grid.spots()[0];

    assert_eq!(spot.indicator, Some(Position::new(0, 1)));
    let tile = grid.tile(Position::new(0, 1)).expect("in bounds");
    assert_eq!(tile.tile_type, TileType::ParkingIndicator);
    assert_eq!(tile.spot, Some(spot.id));
    assert!(!grid.is_walkable(Position::new(0, 1)));
}

#[test]
fn waypoints_and_markers_are_detected() {
    let source = [
        "S 1   ",
        "    2 ",
        " E   D",
    ]
    .join("\n");
    let grid = Grid::load(&source).expect("load");

    // Leading-space rows must survive loading with their geometry intact
    assert_eq!((grid.width(), grid.height()), (6, 3));
    assert_eq!(grid.start(), Some(Position::new(0, 0)));
    assert_eq!(grid.exit(), Some(Position::new(1, 2)));
    assert_eq!(grid.depot(), Some(Position::new(5, 2)));
    assert_eq!(
        grid.waypoint(parking_sim::simulation::WaypointId(1)),
        Some(Position::new(2, 0))
    );
    assert_eq!(
        grid.waypoint(parking_sim::simulation::WaypointId(2)),
        Some(Position::new(4, 1))
    );
}

#[test]
fn empty_map_source_is_an_error() {
    assert!(Grid::load("").is_err());
    assert!(Grid::load("\n\n").is_err());
}

#[test]
fn vehicle_reserves_nearby_spot_and_parks() {
    let source = [
        "        ",
        " S  PP  ",
        "    PP  ",
        "        ",
    ]
    .join("\n");
    let mut world =
        ParkingWorld::load_with_seed(&source, test_config(), 7).expect("world loads");
    let id = world.spawn_vehicle(Position::new(1, 1), Direction::East);

    // Reservation happens on the very first tick the vehicle is evaluated
    world.advance_tick();
    let spot = &world.grid().spots()[0];
    assert!(spot.occupied);
    assert_eq!(spot.occupant, Some(id));
    let v = world.vehicle(id).expect("vehicle alive");
    assert_eq!(v.state, VehicleState::Parking);
    assert_eq!(v.assigned_spot, Some(spot.id));
    assert!(world.back_references_consistent());

    // Three more moves onto the anchor, then the arrival transition
    for _ in 0..3 {
        world.advance_tick();
        assert!(world.back_references_consistent());
    }
    world.advance_tick();

    let v = world.vehicle(id).expect("vehicle alive");
    assert_eq!(v.state, VehicleState::Parked);
    assert_eq!(v.position, world.grid().spots()[0].anchor);
    assert!(!v.has_path());
}

#[test]
fn one_spot_is_never_assigned_twice() {
    let source = [
        "        ",
        " S  PP  ",
        "    PP  ",
        "        ",
    ]
    .join("\n");
    let mut world = ParkingWorld::load_with_seed(&source, test_config(), 7).expect("world loads");
    let first = world.spawn_vehicle(Position::new(1, 1), Direction::East);
    let second = world.spawn_vehicle(Position::new(1, 2), Direction::East);

    world.advance_tick();

    let spot = &world.grid().spots()[0];
    assert_eq!(spot.occupant, Some(first));
    let loser = world.vehicle(second).expect("vehicle alive");
    assert_eq!(loser.assigned_spot, None);
    assert_eq!(loser.state, VehicleState::Driving);
    assert!(world.back_references_consistent());
}

#[test]
fn allocator_falls_back_to_global_nearest_outside_radius() {
    let source = [
        "                    ",
        "                 PP ",
        "                 PP ",
    ]
    .join("\n");
    let grid = Grid::load(&source).expect("load");
    let cfg = test_config();
    let v = Vehicle::new(
        VehicleId(SimId(0)),
        Position::new(0, 0),
        Direction::East,
    );

    // The block really is outside the search radius of 2
    let anchor = grid.spots()[0].anchor;
    assert!(v.position.distance_squared(&anchor) > 2 * 2);

    let spot = find_near_free_spot(&v, &grid, &cfg, 2).expect("fallback spot");
    assert_eq!(spot, grid.spots()[0].id);
}

#[test]
fn allocator_returns_none_without_free_spots() {
    let grid = Grid::load("      \n      ").expect("load");
    let cfg = test_config();
    let v = Vehicle::new(
        VehicleId(SimId(0)),
        Position::new(0, 0),
        Direction::East,
    );
    assert!(find_near_free_spot(&v, &grid, &cfg, 5).is_none());
}

#[test]
fn unreachable_spot_releases_its_reservation() {
    let source = [
        "S      ",
        " ||||  ",
        " |PP|  ",
        " |PP|  ",
        " ||||  ",
    ]
    .join("\n");
    let mut world = ParkingWorld::load_with_seed(&source, test_config(), 7).expect("world loads");
    let id = world.spawn_vehicle(Position::new(0, 0), Direction::East);

    world.advance_tick();

    let spot = &world.grid().spots()[0];
    assert!(!spot.occupied);
    assert_eq!(spot.occupant, None);
    let v = world.vehicle(id).expect("vehicle alive");
    assert_eq!(v.assigned_spot, None);
    assert_eq!(v.state, VehicleState::Driving);
    assert!(world.back_references_consistent());
}

#[test]
fn indicator_lights_only_once_occupant_is_parked() {
    let source = [
        "      ",
        "|PP   ",
        "|PP  S",
    ]
    .join("\n");
    let mut world = ParkingWorld::load_with_seed(&source, test_config(), 7).expect("world loads");
    let spot_id = world.grid().spots()[0].id;
    world.spawn_vehicle(Position::new(5, 2), Direction::West);

    world.advance_tick();
    // Reserved but still driving in: lamp stays dark
    assert!(world.grid().spot(spot_id).expect("spot").occupied);
    assert!(!world.indicator_lit(spot_id));

    // Tick until the occupant actually parks, then the lamp is lit
    for _ in 0..10 {
        world.advance_tick();
        if world.vehicles()[0].state == VehicleState::Parked {
            assert!(world.indicator_lit(spot_id));
            return;
        }
        assert!(!world.indicator_lit(spot_id));
    }
    panic!("vehicle never parked");
}
