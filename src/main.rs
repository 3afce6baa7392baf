mod simulation;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use simulation::{Direction, ParkingWorld, Position, SimConfig, VehicleState};

/// Built-in demo lot used when no map file is given
const DEFAULT_MAP: &str = "\
R__________________________________________T
|                                          |
|  1                               2       |
|                                          |
|   PPPPPPPPPP      PPPPPPPPPP             |
|   PPPPPPPPPP      PPPPPPPPPP             |
|                                          |
|                                          |
G                                          |
S  4                               3       |
G                                          |
|          PPPPPPPPPP                      |
|          PPPPPPPPPP                      g
|  E                           D           g
|                                          |
L__________________________________________J
";

#[derive(Parser)]
#[command(name = "parking_sim")]
#[command(about = "Parking-lot simulation, headless")]
struct Cli {
    /// Path to a map file; omit to use the built-in demo lot
    #[arg(long)]
    map: Option<PathBuf>,

    /// Number of simulation ticks to run
    #[arg(long, default_value = "400")]
    ticks: u32,

    /// Rush-hour timings instead of the relaxed defaults
    #[arg(long)]
    busy: bool,

    /// Seed for reproducible dwell draws
    #[arg(long)]
    seed: Option<u64>,

    /// Draw an ASCII frame every N ticks (0 = never)
    #[arg(long, default_value = "0")]
    draw_every: u32,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let source = match &cli.map {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("failed to read map file {}", path.display()))?,
        None => DEFAULT_MAP.to_string(),
    };

    let config = if cli.busy {
        SimConfig::busy()
    } else {
        SimConfig::smooth()
    };
    let spawn_every = (config.spawn_rate_ms / config.tick_ms).max(1);

    let mut world = match cli.seed {
        Some(seed) => ParkingWorld::load_with_seed(&source, config, seed)?,
        None => ParkingWorld::load_with_config(&source, config)?,
    };

    println!("Running parking simulation for {} ticks...", cli.ticks);

    for tick in 0..cli.ticks {
        // Stand-in for the external gate-timer/spawn-cadence machine: the
        // entry gate opens for the spawn tick and closes again right after
        if tick % spawn_every == 0 && world.grid().start().is_some() {
            world.set_entry_gate_open(true);
            world.spawn_vehicle_at_start(Direction::East)?;
        } else {
            world.set_entry_gate_open(false);
        }

        world.advance_tick();

        if cli.draw_every > 0 && tick % cli.draw_every == 0 {
            println!("{}", render_frame(&world));
        }
        if tick % 50 == 49 {
            println!("{}", world.summary());
        }
    }

    println!("=== Final state ===");
    println!("{}", world.summary());
    Ok(())
}

/// Plain ASCII frame from the read-only query surface
fn render_frame(world: &ParkingWorld) -> String {
    let grid = world.grid();
    let mut rows: Vec<Vec<char>> = (0..grid.height())
        .map(|y| {
            (0..grid.width())
                .map(|x| {
                    grid.tile(Position::new(x, y))
                        .map(|t| t.symbol)
                        .unwrap_or(' ')
                })
                .collect()
        })
        .collect();

    let mut put = |pos: Position, c: char| {
        if grid.in_bounds(pos) {
            rows[pos.y as usize][pos.x as usize] = c;
        }
    };

    for gate in [grid.entry_gate(), grid.exit_gate()] {
        for &pos in &gate.tiles {
            put(pos, if gate.open { ' ' } else { '|' });
        }
    }

    for spot in grid.spots() {
        if let Some(pos) = spot.indicator {
            put(pos, if world.indicator_lit(spot.id) { '!' } else { 'i' });
        }
    }

    for v in world.vehicles() {
        let glyph = match v.state {
            VehicleState::Parked => 'P',
            _ => match v.heading {
                Direction::North => '^',
                Direction::East => '>',
                Direction::South => 'v',
                Direction::West => '<',
            },
        };
        for cell in v.footprint(&world.config().footprints).cells(v.position) {
            put(cell, glyph);
        }
    }

    rows.into_iter()
        .map(|row| row.into_iter().collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}
