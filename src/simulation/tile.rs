//! Tile classification for the character map

use super::types::SpotId;

/// Semantic tile type; walkability is a pure function of this
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileType {
    Empty,
    Wall,
    Parking,
    /// A wall tile repurposed to show whether its parking spot is occupied
    ParkingIndicator,
}

impl TileType {
    /// Vehicles may drive over empty and parking tiles. Walls and indicator
    /// tiles block; gates never do (their open flag is rendering/timing only).
    pub fn is_walkable(&self) -> bool {
        matches!(self, TileType::Empty | TileType::Parking)
    }
}

/// A single cell of the grid
#[derive(Debug, Clone, Copy)]
pub struct Tile {
    /// Display glyph; the renderer owns its meaning
    pub symbol: char,
    pub tile_type: TileType,
    /// Set on parking and indicator tiles once spot detection has run
    pub spot: Option<SpotId>,
}

impl Tile {
    /// Classify a map glyph.
    ///
    /// Walls are the box-drawing source glyphs; `P` marks parking; digits,
    /// gates and the S/E/D markers sit on ordinary walkable tiles (the grid
    /// records their coordinates separately).
    pub fn from_char(c: char) -> Tile {
        match c {
            '_' | '|' | 'R' | 'T' | 'L' | 'J' | '+' => Tile {
                symbol: c,
                tile_type: TileType::Wall,
                spot: None,
            },
            'P' => Tile {
                symbol: ' ',
                tile_type: TileType::Parking,
                spot: None,
            },
            _ => Tile {
                symbol: ' ',
                tile_type: TileType::Empty,
                spot: None,
            },
        }
    }

    pub fn is_walkable(&self) -> bool {
        self.tile_type.is_walkable()
    }
}
