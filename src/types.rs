use serde::Serialize;

use crate::config::SimulationConfig;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    None,
}

impl Direction {
    /// Cardinal directions in tie-break order.
    pub const CARDINALS: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    pub fn parse_move(value: &str) -> Option<Self> {
        match value {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Up => Self::Down,
            Self::Down => Self::Up,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::None => Self::None,
        }
    }

    pub fn delta(self) -> (f32, f32) {
        match self {
            Self::Up => (0.0, -1.0),
            Self::Down => (0.0, 1.0),
            Self::Left => (-1.0, 0.0),
            Self::Right => (1.0, 0.0),
            Self::None => (0.0, 0.0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tile {
    Empty,
    Wall,
    Pellet,
    PowerPellet,
    GhostSpawn,
    PlayerSpawn,
    Bonus,
}

impl Tile {
    pub fn from_char(value: char) -> Option<Self> {
        match value {
            ' ' => Some(Self::Empty),
            '#' => Some(Self::Wall),
            '.' => Some(Self::Pellet),
            'o' => Some(Self::PowerPellet),
            'G' => Some(Self::GhostSpawn),
            'P' => Some(Self::PlayerSpawn),
            'B' => Some(Self::Bonus),
            _ => None,
        }
    }

    pub fn to_char(self) -> char {
        match self {
            Self::Empty => ' ',
            Self::Wall => '#',
            Self::Pellet => '.',
            Self::PowerPellet => 'o',
            Self::GhostSpawn => 'G',
            Self::PlayerSpawn => 'P',
            Self::Bonus => 'B',
        }
    }

    pub fn is_collectible(self) -> bool {
        matches!(self, Self::Pellet | Self::PowerPellet)
    }
}

/// Continuous position in pixel units; the top-left corner of the entity box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
}

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Position) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn offset(self, dir: Direction, amount: f32) -> Self {
        let (dx, dy) = dir.delta();
        Self {
            x: self.x + dx * amount,
            y: self.y + dy * amount,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostState {
    Chase,
    /// Part of the state vocabulary; no built-in transition enters it.
    Scatter,
    Frightened,
    Eaten,
}

/// Fixed pursuit role, one per ghost id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostRole {
    Chaser,
    Ambusher,
    Flanker,
    Opportunist,
}

impl GhostRole {
    pub fn from_id(id: usize) -> Self {
        match id % 4 {
            0 => Self::Chaser,
            1 => Self::Ambusher,
            2 => Self::Flanker,
            _ => Self::Opportunist,
        }
    }
}

/// Discrete input accepted by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SetPlayerIntent(Direction),
    TogglePause,
    Restart { level: usize, keep_score: bool },
    AdvanceToNextLevel,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    PelletEaten {
        col: i32,
        row: i32,
    },
    PowerActivated {
        ticks: u32,
    },
    BonusEaten {
        col: i32,
        row: i32,
    },
    GhostEaten {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
    },
    PlayerCaught {
        #[serde(rename = "livesLeft")]
        lives_left: u32,
    },
    GhostRespawned {
        #[serde(rename = "ghostId")]
        ghost_id: usize,
    },
    LevelComplete {
        level: usize,
    },
    GameOver {
        score: u32,
    },
}

#[derive(Clone, Debug, Serialize)]
pub struct PlayerView {
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    #[serde(rename = "nextDir")]
    pub next_dir: Direction,
    #[serde(rename = "mouthPhase")]
    pub mouth_phase: f32,
}

#[derive(Clone, Debug, Serialize)]
pub struct GhostView {
    pub id: usize,
    pub role: GhostRole,
    pub state: GhostState,
    pub x: f32,
    pub y: f32,
    pub dir: Direction,
    pub target: Position,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct StatusView {
    pub score: u32,
    pub lives: u32,
    pub level: usize,
    pub paused: bool,
    #[serde(rename = "gameOver")]
    pub game_over: bool,
    #[serde(rename = "levelComplete")]
    pub level_complete: bool,
    #[serde(rename = "powerTicks")]
    pub power_ticks: u32,
}

#[derive(Clone, Debug, Serialize)]
pub struct LevelInit {
    pub level: usize,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "tileSize")]
    pub tile_size: f32,
    pub tiles: Vec<String>,
    pub config: SimulationConfig,
}

#[derive(Clone, Debug, Serialize)]
pub struct Snapshot {
    pub tick: u64,
    #[serde(rename = "nowMs")]
    pub now_ms: u64,
    pub level: usize,
    pub width: i32,
    pub height: i32,
    #[serde(rename = "tileSize")]
    pub tile_size: f32,
    pub tiles: Vec<String>,
    pub status: StatusView,
    pub player: PlayerView,
    pub ghosts: Vec<GhostView>,
    pub events: Vec<Notification>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opposite_is_an_involution() {
        for dir in Direction::CARDINALS {
            assert_eq!(dir.opposite().opposite(), dir);
            assert_ne!(dir.opposite(), dir);
        }
        assert_eq!(Direction::None.opposite(), Direction::None);
    }

    #[test]
    fn tile_chars_round_trip() {
        for ch in [' ', '#', '.', 'o', 'G', 'P', 'B'] {
            let tile = Tile::from_char(ch).expect("known tile char");
            assert_eq!(tile.to_char(), ch);
        }
        assert_eq!(Tile::from_char('x'), None);
    }

    #[test]
    fn ghost_roles_follow_fixed_ids() {
        assert_eq!(GhostRole::from_id(0), GhostRole::Chaser);
        assert_eq!(GhostRole::from_id(1), GhostRole::Ambusher);
        assert_eq!(GhostRole::from_id(2), GhostRole::Flanker);
        assert_eq!(GhostRole::from_id(3), GhostRole::Opportunist);
    }

    #[test]
    fn notifications_serialize_with_type_tag() {
        let value = serde_json::to_value(Notification::GhostEaten { ghost_id: 2 })
            .expect("notification should serialize");
        assert_eq!(value["type"], "ghost_eaten");
        assert_eq!(value["ghostId"], 2);
    }
}
