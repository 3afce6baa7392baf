//! Tile grid loaded from a character map
//!
//! The grid is immutable after load apart from parking-spot occupancy and the
//! two gate flags. It owns every tile and every parking spot; vehicles refer
//! to spots through `SpotId` handles only.

use anyhow::{bail, Result};
use log::{debug, warn};
use std::collections::BTreeMap;

use super::tile::{Tile, TileType};
use super::types::{Footprint, Position, SimId, SpotId, VehicleId, WaypointId};

/// A detected rectangular block of parking tiles
#[derive(Debug, Clone)]
pub struct ParkingSpot {
    pub id: SpotId,
    /// Top-left tile of the block
    pub anchor: Position,
    pub width: i32,
    pub height: i32,
    /// Adjacent wall tile repurposed as an occupancy lamp, if one exists
    pub indicator: Option<Position>,
    pub occupied: bool,
    /// Back-reference to the reserving vehicle; agrees with
    /// `Vehicle::assigned_spot` whenever either side is set
    pub occupant: Option<VehicleId>,
}

impl ParkingSpot {
    /// Every anchor position inside the block at which `footprint` still fits
    /// within the block bounds, in row-major order
    pub fn interior_anchors(&self, footprint: Footprint) -> Vec<Position> {
        let mut anchors = Vec::new();
        for py in self.anchor.y..=self.anchor.y + self.height - footprint.height {
            for px in self.anchor.x..=self.anchor.x + self.width - footprint.width {
                anchors.push(Position::new(px, py));
            }
        }
        anchors
    }

    /// Minimal squared distance between this block and the given bounding box
    /// (per-axis gap, squared-Euclidean combine)
    pub fn bbox_distance_squared(&self, top_left: Position, bottom_right: Position) -> i64 {
        let px1 = self.anchor.x + self.width - 1;
        let py1 = self.anchor.y + self.height - 1;

        let dx = if bottom_right.x < self.anchor.x {
            self.anchor.x - bottom_right.x
        } else if top_left.x > px1 {
            top_left.x - px1
        } else {
            0
        };
        let dy = if bottom_right.y < self.anchor.y {
            self.anchor.y - bottom_right.y
        } else if top_left.y > py1 {
            top_left.y - py1
        } else {
            0
        };

        (dx as i64) * (dx as i64) + (dy as i64) * (dy as i64)
    }
}

/// A contiguous vertical run of gate tiles with an open/closed flag.
///
/// The flag never affects walkability; the orchestrator uses it as a timing
/// gate and the renderer draws it.
#[derive(Debug, Clone, Default)]
pub struct Gate {
    pub tiles: Vec<Position>,
    pub open: bool,
}

/// The loaded map: tiles plus everything derived from them
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
    start: Option<Position>,
    exit: Option<Position>,
    depot: Option<Position>,
    waypoints: BTreeMap<WaypointId, Position>,
    gate_entry: Gate,
    gate_exit: Gate,
    spots: Vec<ParkingSpot>,
}

impl Grid {
    /// Parse a rectangular character map.
    ///
    /// Empty lines are skipped; lines shorter than the widest line are padded
    /// with empty tiles. Fails on an empty source, never returns a partial
    /// grid.
    pub fn load(source: &str) -> Result<Grid> {
        let lines: Vec<&str> = source
            .lines()
            .map(|l| l.trim_end_matches('\r'))
            .filter(|l| !l.is_empty())
            .collect();

        let width = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        if lines.is_empty() || width == 0 {
            bail!("map source is empty or contains no tiles");
        }

        let mut grid = Grid {
            width: width as i32,
            height: lines.len() as i32,
            tiles: Vec::with_capacity(width * lines.len()),
            start: None,
            exit: None,
            depot: None,
            waypoints: BTreeMap::new(),
            gate_entry: Gate::default(),
            gate_exit: Gate::default(),
            spots: Vec::new(),
        };

        for (y, line) in lines.iter().enumerate() {
            let mut chars = line.chars();
            for x in 0..width {
                let c = chars.next().unwrap_or(' ');
                let pos = Position::new(x as i32, y as i32);
                grid.record_marker(c, pos);
                grid.tiles.push(Tile::from_char(c));
            }
        }

        grid.detect_parking_spots();
        debug!(
            "loaded {}x{} grid: {} spots, {} waypoints",
            grid.width,
            grid.height,
            grid.spots.len(),
            grid.waypoints.len()
        );
        Ok(grid)
    }

    fn record_marker(&mut self, c: char, pos: Position) {
        match c {
            '1'..='9' => {
                let id = WaypointId(c as u8 - b'0');
                if self.waypoints.insert(id, pos).is_some() {
                    warn!("duplicate waypoint {} at ({},{})", id.0, pos.x, pos.y);
                }
            }
            'S' => {
                if self.start.replace(pos).is_some() {
                    warn!("multiple start markers; keeping the last one");
                }
            }
            'E' => {
                if self.exit.replace(pos).is_some() {
                    warn!("multiple exit markers; keeping the last one");
                }
            }
            'D' => {
                if self.depot.replace(pos).is_some() {
                    warn!("multiple depot markers; keeping the last one");
                }
            }
            'G' => self.gate_entry.tiles.push(pos),
            'g' => self.gate_exit.tiles.push(pos),
            _ => {}
        }
    }

    /// Scan for maximal rectangular blocks of parking tiles, left-to-right,
    /// top-to-bottom, skipping past each detected block's width
    fn detect_parking_spots(&mut self) {
        for y in 0..self.height {
            let mut x = 0;
            while x < self.width {
                let pos = Position::new(x, y);
                if !self.is_unclaimed_parking(pos) {
                    x += 1;
                    continue;
                }

                // Block width from the first row
                let mut block_w = 1;
                while self.is_unclaimed_parking(Position::new(x + block_w, y)) {
                    block_w += 1;
                }

                // Extend downward while the full-width row is parking
                let mut block_h = 1;
                'rows: loop {
                    for bx in 0..block_w {
                        if !self.is_unclaimed_parking(Position::new(x + bx, y + block_h)) {
                            break 'rows;
                        }
                    }
                    block_h += 1;
                }

                let id = SpotId(SimId(self.spots.len()));
                for by in 0..block_h {
                    for bx in 0..block_w {
                        let idx = self.index(Position::new(x + bx, y + by));
                        self.tiles[idx].spot = Some(id);
                    }
                }

                let indicator = self.claim_indicator(pos, block_w, id);
                debug!(
                    "parking spot {:?} anchor=({},{}) size={}x{}",
                    id, x, y, block_w, block_h
                );
                self.spots.push(ParkingSpot {
                    id,
                    anchor: pos,
                    width: block_w,
                    height: block_h,
                    indicator,
                    occupied: false,
                    occupant: None,
                });

                x += block_w;
            }
        }
    }

    /// If a wall tile borders the block's anchor row on the left or right,
    /// turn it into the spot's indicator lamp
    fn claim_indicator(&mut self, anchor: Position, block_w: i32, id: SpotId) -> Option<Position> {
        let candidates = [
            Position::new(anchor.x - 1, anchor.y),
            Position::new(anchor.x + block_w, anchor.y),
        ];
        for pos in candidates {
            if !self.in_bounds(pos) {
                continue;
            }
            let idx = self.index(pos);
            if self.tiles[idx].tile_type == TileType::Wall {
                self.tiles[idx].tile_type = TileType::ParkingIndicator;
                self.tiles[idx].spot = Some(id);
                return Some(pos);
            }
        }
        None
    }

    fn is_unclaimed_parking(&self, pos: Position) -> bool {
        self.in_bounds(pos) && {
            let tile = &self.tiles[self.index(pos)];
            tile.tile_type == TileType::Parking && tile.spot.is_none()
        }
    }

    fn index(&self, pos: Position) -> usize {
        (pos.y * self.width + pos.x) as usize
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, pos: Position) -> bool {
        pos.x >= 0 && pos.x < self.width && pos.y >= 0 && pos.y < self.height
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.in_bounds(pos).then(|| &self.tiles[self.index(pos)])
    }

    /// In bounds and of a walkable tile type
    pub fn is_walkable(&self, pos: Position) -> bool {
        self.tile(pos).is_some_and(|t| t.is_walkable())
    }

    /// Whether the whole footprint anchored at `anchor` lies on walkable tiles
    pub fn footprint_fits(&self, anchor: Position, footprint: Footprint) -> bool {
        footprint.cells(anchor).all(|pos| self.is_walkable(pos))
    }

    pub fn start(&self) -> Option<Position> {
        self.start
    }

    pub fn exit(&self) -> Option<Position> {
        self.exit
    }

    pub fn depot(&self) -> Option<Position> {
        self.depot
    }

    pub fn waypoint(&self, id: WaypointId) -> Option<Position> {
        self.waypoints.get(&id).copied()
    }

    /// Waypoint ids in ascending order; the default vehicle route
    pub fn waypoint_ids(&self) -> Vec<WaypointId> {
        self.waypoints.keys().copied().collect()
    }

    pub fn spots(&self) -> &[ParkingSpot] {
        &self.spots
    }

    pub fn spot(&self, id: SpotId) -> Option<&ParkingSpot> {
        self.spots.get(id.0 .0)
    }

    pub fn spot_mut(&mut self, id: SpotId) -> Option<&mut ParkingSpot> {
        self.spots.get_mut(id.0 .0)
    }

    pub fn entry_gate(&self) -> &Gate {
        &self.gate_entry
    }

    pub fn exit_gate(&self) -> &Gate {
        &self.gate_exit
    }

    pub fn set_entry_gate_open(&mut self, open: bool) {
        self.gate_entry.open = open;
    }

    pub fn set_exit_gate_open(&mut self, open: bool) {
        self.gate_exit.open = open;
    }
}
