use rand::Rng;

use crate::constants::{MAX_GHOSTS, TILE_SIZE};
use crate::types::{Position, Tile};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelError {
    Empty,
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },
    UnknownTile {
        row: usize,
        col: usize,
        ch: char,
    },
    MissingPlayerSpawn,
    NoCollectibles,
}

impl std::fmt::Display for LevelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "level has no rows"),
            Self::RaggedRow {
                row,
                expected,
                found,
            } => write!(f, "row {row} has {found} tiles, expected {expected}"),
            Self::UnknownTile { row, col, ch } => {
                write!(f, "unknown tile {ch:?} at row {row}, col {col}")
            }
            Self::MissingPlayerSpawn => write!(f, "level has no player spawn tile"),
            Self::NoCollectibles => write!(f, "level has no pellets to collect"),
        }
    }
}

impl std::error::Error for LevelError {}

/// Immutable level definition. Loading copies it into a [`Grid`].
#[derive(Clone, Debug, PartialEq)]
pub struct LevelTemplate {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl LevelTemplate {
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, LevelError> {
        let Some(first) = rows.first() else {
            return Err(LevelError::Empty);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(LevelError::Empty);
        }

        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(LevelError::RaggedRow {
                    row,
                    expected: width,
                    found,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let tile = Tile::from_char(ch).ok_or(LevelError::UnknownTile { row, col, ch })?;
                tiles.push(tile);
            }
        }

        if !tiles.contains(&Tile::PlayerSpawn) {
            return Err(LevelError::MissingPlayerSpawn);
        }
        if !tiles.iter().any(|tile| tile.is_collectible()) {
            return Err(LevelError::NoCollectibles);
        }

        Ok(Self {
            width: width as i32,
            height: rows.len() as i32,
            tiles,
        })
    }

    pub fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }
}

/// Mutable working copy of a level.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    width: i32,
    height: i32,
    tiles: Vec<Tile>,
}

impl Grid {
    pub fn dimensions(&self) -> (i32, i32) {
        (self.width, self.height)
    }

    pub fn in_bounds(&self, col: i32, row: i32) -> bool {
        col >= 0 && row >= 0 && col < self.width && row < self.height
    }

    /// Out-of-bounds cells read as `Empty`, so tunnel openings stay passable.
    pub fn tile_at(&self, col: i32, row: i32) -> Tile {
        if !self.in_bounds(col, row) {
            return Tile::Empty;
        }
        self.tiles[(row * self.width + col) as usize]
    }

    pub fn set_tile(&mut self, col: i32, row: i32, tile: Tile) {
        if !self.in_bounds(col, row) {
            return;
        }
        self.tiles[(row * self.width + col) as usize] = tile;
    }

    pub fn is_wall(&self, col: i32, row: i32) -> bool {
        self.tile_at(col, row) == Tile::Wall
    }

    pub fn pixel_width(&self) -> f32 {
        self.width as f32 * TILE_SIZE
    }

    pub fn pixel_height(&self) -> f32 {
        self.height as f32 * TILE_SIZE
    }

    pub fn remaining_collectibles(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.is_collectible()).count()
    }

    pub fn bonus_count(&self) -> usize {
        self.tiles.iter().filter(|tile| **tile == Tile::Bonus).count()
    }

    pub fn rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width.max(1) as usize)
            .map(|row| row.iter().map(|tile| tile.to_char()).collect())
            .collect()
    }
}

#[derive(Clone, Debug)]
pub struct LoadedLevel {
    pub grid: Grid,
    pub player_spawn: Position,
    /// Spawn positions indexed by ghost id.
    pub ghost_spawns: Vec<Position>,
}

pub fn tile_origin(col: i32, row: i32) -> Position {
    Position::new(col as f32 * TILE_SIZE, row as f32 * TILE_SIZE)
}

/// Copy `template` into working storage, pull out spawn markers and place the bonus.
pub fn load_level(template: &LevelTemplate, rng: &mut impl Rng, place_bonus: bool) -> LoadedLevel {
    let mut grid = Grid {
        width: template.width,
        height: template.height,
        tiles: template.tiles.clone(),
    };

    let mut player_spawn = None;
    let mut ghost_spawns = Vec::new();
    for row in 0..grid.height {
        for col in 0..grid.width {
            match grid.tile_at(col, row) {
                Tile::PlayerSpawn => {
                    if player_spawn.is_none() {
                        player_spawn = Some(tile_origin(col, row));
                    }
                    grid.set_tile(col, row, Tile::Empty);
                }
                Tile::GhostSpawn => {
                    if ghost_spawns.len() < MAX_GHOSTS {
                        ghost_spawns.push(tile_origin(col, row));
                    }
                    grid.set_tile(col, row, Tile::Empty);
                }
                Tile::Bonus => grid.set_tile(col, row, Tile::Empty),
                _ => {}
            }
        }
    }

    if place_bonus && grid.remaining_collectibles() > 1 {
        let pellets: Vec<usize> = grid
            .tiles
            .iter()
            .enumerate()
            .filter(|(_, tile)| **tile == Tile::Pellet)
            .map(|(idx, _)| idx)
            .collect();
        if !pellets.is_empty() {
            let idx = pellets[rng.random_range(0..pellets.len())];
            grid.tiles[idx] = Tile::Bonus;
        }
    }

    LoadedLevel {
        grid,
        // parse() rejects templates without a player spawn
        player_spawn: player_spawn.unwrap_or_default(),
        ghost_spawns,
    }
}
