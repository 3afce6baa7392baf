//! End-to-end tick-loop tests: route following, movement resolution and the
//! full park-and-depart lifecycle

use std::collections::HashSet;

use parking_sim::simulation::{
    Direction, FootprintTable, Grid, OccupancyMap, ParkingWorld, Position, SimConfig, SimId,
    Vehicle, VehicleId, VehicleState,
};

fn test_config() -> SimConfig {
    SimConfig {
        min_parking_time_secs: 1,
        max_parking_time_secs: 1,
        tick_ms: 1000,
        spawn_rate_ms: 1000,
        parking_search_radius: 5,
        footprints: FootprintTable::unit(),
    }
}

fn corridor_map() -> String {
    [
        "          ",
        "         1",
        "          ",
    ]
    .join("\n")
}

/// No two vehicles may cover the same cell
fn assert_no_overlap(world: &ParkingWorld) {
    let table = &world.config().footprints;
    let mut seen = HashSet::new();
    for v in world.vehicles() {
        for cell in v.footprint(table).cells(v.position) {
            assert!(
                seen.insert(cell),
                "two vehicles cover {:?} at tick {}",
                cell,
                world.tick_count()
            );
        }
    }
}

#[test]
fn vehicle_follows_route_to_waypoint() {
    let source = corridor_map();
    let mut world = ParkingWorld::load_with_seed(&source, test_config(), 1).expect("world loads");
    let id = world.spawn_vehicle(Position::new(0, 1), Direction::East);

    // One cell per tick down the corridor
    for _ in 0..9 {
        world.advance_tick();
    }
    let v = world.vehicle(id).expect("vehicle alive");
    assert_eq!(v.position, Position::new(9, 1));
    assert_eq!(v.heading, Direction::East);
    assert_eq!(v.state, VehicleState::Driving);
    assert!(!v.has_path());
}

#[test]
fn world_is_quiescent_after_route_ends() {
    let source = corridor_map();
    let mut world = ParkingWorld::load_with_seed(&source, test_config(), 1).expect("world loads");
    let id = world.spawn_vehicle(Position::new(0, 1), Direction::East);

    for _ in 0..9 {
        world.advance_tick();
    }
    let before = world.vehicle(id).expect("vehicle alive").clone();
    // The route genuinely completed; what follows is not trivial stillness
    assert_eq!(before.position, Position::new(9, 1));
    assert!(!before.has_path());

    // No spots and no route left: further ticks change nothing
    for _ in 0..5 {
        world.advance_tick();
        let v = world.vehicle(id).expect("vehicle alive");
        assert_eq!(v.position, before.position);
        assert_eq!(v.heading, before.heading);
        assert_eq!(v.state, before.state);
    }
}

#[test]
fn earlier_spawned_vehicle_wins_a_contested_cell() {
    // Both vehicles converge on the waypoint; spawn order breaks the tie
    let source = "  1  ";
    let mut world = ParkingWorld::load_with_seed(source, test_config(), 1).expect("world loads");
    let first = world.spawn_vehicle(Position::new(0, 0), Direction::East);
    let second = world.spawn_vehicle(Position::new(4, 0), Direction::West);

    world.advance_tick();
    assert_no_overlap(&world);
    assert_eq!(world.vehicle(first).expect("alive").position, Position::new(1, 0));
    assert_eq!(world.vehicle(second).expect("alive").position, Position::new(3, 0));

    world.advance_tick();
    assert_no_overlap(&world);
    // The earlier spawn took the waypoint cell; the later one is held back
    // with its path cursor untouched
    assert_eq!(world.vehicle(first).expect("alive").position, Position::new(2, 0));
    let blocked = world.vehicle(second).expect("alive");
    assert_eq!(blocked.position, Position::new(3, 0));
    assert_eq!(blocked.heading, Direction::West);
    let next = blocked.path.as_ref().and_then(|p| p.next_step());
    assert_eq!(next, Some(Position::new(2, 0)));

    // The winner never leaves the waypoint, so the follower stays put
    for _ in 0..5 {
        world.advance_tick();
        assert_no_overlap(&world);
        assert_eq!(world.vehicle(second).expect("alive").position, Position::new(3, 0));
    }
}

#[test]
fn vehicle_spawned_a_tick_later_yields_the_corridor() {
    let source = "  1  ";
    let mut world = ParkingWorld::load_with_seed(source, test_config(), 1).expect("world loads");
    let first = world.spawn_vehicle(Position::new(0, 0), Direction::East);
    world.advance_tick();
    let second = world.spawn_vehicle(Position::new(4, 0), Direction::West);

    world.advance_tick();
    assert_no_overlap(&world);
    assert_eq!(world.vehicle(first).expect("alive").position, Position::new(2, 0));
    assert_eq!(world.vehicle(second).expect("alive").position, Position::new(3, 0));

    // The head of the corridor sits on the waypoint for good, so the late
    // arrival never gets closer
    for _ in 0..4 {
        world.advance_tick();
        assert_no_overlap(&world);
        let blocked = world.vehicle(second).expect("alive");
        assert_eq!(blocked.position, Position::new(3, 0));
        assert!(blocked.has_path());
    }
}

#[test]
fn occupancy_queries_outside_the_grid_are_empty() {
    let source = ["   ", "   "].join("\n");
    let grid = Grid::load(&source).expect("load");
    let table = FootprintTable::unit();
    let id = VehicleId(SimId(0));
    let v = Vehicle::new(id, Position::new(2, 0), Direction::East);
    let map = OccupancyMap::snapshot(&[v], &grid, &table);

    assert_eq!(map.occupant(Position::new(2, 0)), Some(id));
    // (-1, 1) must not alias to the last cell of the row above
    assert_eq!(map.occupant(Position::new(-1, 1)), None);
    assert_eq!(map.occupant(Position::new(3, 0)), None);
    assert_eq!(map.occupant(Position::new(0, 5)), None);
}

#[test]
fn full_lifecycle_parks_departs_and_pays_out() {
    let source = [
        "            ",
        " S   P    E ",
        "       D    ",
    ]
    .join("\n");
    let mut world = ParkingWorld::load_with_seed(&source, test_config(), 3).expect("world loads");
    let id = world.spawn_vehicle_at_start(Direction::East).expect("spawn");
    let spot_id = world.grid().spots()[0].id;

    let mut seen_states = HashSet::new();
    let mut saw_exit_gate_open = false;
    for _ in 0..25 {
        world.advance_tick();
        if let Some(v) = world.vehicle(id) {
            seen_states.insert(v.state);
        }
        saw_exit_gate_open |= world.grid().exit_gate().open;
        assert!(world.back_references_consistent());
    }

    // Parked for one second at five per second, then gone
    assert!(world.vehicle(id).is_none());
    assert_eq!(world.balance(), 5);
    assert!(!world.grid().spot(spot_id).expect("spot").occupied);
    assert!(!world.grid().exit_gate().open);
    assert!(saw_exit_gate_open);

    for state in [
        VehicleState::Parking,
        VehicleState::Parked,
        VehicleState::Leaving,
    ] {
        assert!(seen_states.contains(&state), "never observed {:?}", state);
    }
}

#[test]
fn seeded_worlds_evolve_identically() {
    let source = [
        "        ",
        " S  PP  ",
        "    PP  ",
        "        ",
    ]
    .join("\n");
    let cfg = SimConfig {
        min_parking_time_secs: 1,
        max_parking_time_secs: 4,
        ..test_config()
    };
    let mut a = ParkingWorld::load_with_seed(&source, cfg.clone(), 42).expect("world loads");
    let mut b = ParkingWorld::load_with_seed(&source, cfg, 42).expect("world loads");
    a.spawn_vehicle_at_start(Direction::East).expect("spawn");
    b.spawn_vehicle_at_start(Direction::East).expect("spawn");

    for _ in 0..40 {
        a.advance_tick();
        b.advance_tick();
        assert_eq!(a.vehicles().len(), b.vehicles().len());
        for (va, vb) in a.vehicles().iter().zip(b.vehicles()) {
            assert_eq!(va.position, vb.position);
            assert_eq!(va.state, vb.state);
        }
    }
    assert_eq!(a.balance(), b.balance());
}
