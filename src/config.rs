use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::{
    divides_tile, COLLISION_RADIUS_TILES, EATEN_REVERT_MS, GHOST_SPEED, PLAYER_SPEED, POWER_TICKS,
    STARTING_LIVES, TICK_RATE,
};

const CONFIG_ENV: &str = "MAZE_CHASE_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/maze_chase.toml";

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    Read { path: String, reason: String },
    Parse { path: String, reason: String },
    TickRate(u32),
    Speed { field: &'static str, value: f32 },
    PowerTicks(u32),
    Lives,
    CollisionRadius(f32),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, reason } => write!(f, "cannot read config {path}: {reason}"),
            Self::Parse { path, reason } => write!(f, "cannot parse config {path}: {reason}"),
            Self::TickRate(rate) => write!(f, "tick_rate must be > 0 (got {rate})"),
            Self::Speed { field, value } => {
                write!(f, "{field} must evenly divide the tile size (got {value})")
            }
            Self::PowerTicks(ticks) => write!(f, "power_ticks must be > 1 (got {ticks})"),
            Self::Lives => write!(f, "starting_lives must be > 0"),
            Self::CollisionRadius(radius) => {
                write!(f, "collision_radius_tiles must be in (0, 1] (got {radius})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Data-driven tuning for the simulation core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Ticks per second driven by the outer scheduler.
    pub tick_rate: u32,
    /// Player travel per tick in pixel units.
    pub player_speed: f32,
    /// Ghost travel per tick in pixel units.
    pub ghost_speed: f32,
    /// Length of power mode in ticks.
    pub power_ticks: u32,
    /// Wall-clock delay before an eaten ghost resumes the chase.
    pub eaten_revert_ms: u64,
    pub starting_lives: u32,
    /// Player/ghost contact distance as a fraction of a tile.
    pub collision_radius_tiles: f32,
    /// Turn one random pellet into the bonus item on level load.
    pub place_bonus: bool,
    /// Seed for bonus placement; a fresh one is drawn when unset.
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: TICK_RATE,
            player_speed: PLAYER_SPEED,
            ghost_speed: GHOST_SPEED,
            power_ticks: POWER_TICKS,
            eaten_revert_ms: EATEN_REVERT_MS,
            starting_lives: STARTING_LIVES,
            collision_radius_tiles: COLLISION_RADIUS_TILES,
            place_bonus: true,
            seed: None,
        }
    }
}

impl SimulationConfig {
    /// Load from `$MAZE_CHASE_CONFIG`, then `config/maze_chase.toml`, then defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let config = if let Ok(path) = std::env::var(CONFIG_ENV) {
            Self::from_file(Path::new(&path))?
        } else if Path::new(DEFAULT_CONFIG_PATH).is_file() {
            Self::from_file(Path::new(DEFAULT_CONFIG_PATH))?
        } else {
            Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml(&contents).map_err(|reason| ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        })
    }

    pub fn from_toml(contents: &str) -> Result<Self, String> {
        toml::from_str::<Self>(contents).map_err(|e| e.to_string())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::TickRate(self.tick_rate));
        }
        if !divides_tile(self.player_speed) {
            return Err(ConfigError::Speed {
                field: "player_speed",
                value: self.player_speed,
            });
        }
        if !divides_tile(self.ghost_speed) {
            return Err(ConfigError::Speed {
                field: "ghost_speed",
                value: self.ghost_speed,
            });
        }
        if self.power_ticks <= 1 {
            return Err(ConfigError::PowerTicks(self.power_ticks));
        }
        if self.starting_lives == 0 {
            return Err(ConfigError::Lives);
        }
        if !(self.collision_radius_tiles > 0.0 && self.collision_radius_tiles <= 1.0) {
            return Err(ConfigError::CollisionRadius(self.collision_radius_tiles));
        }
        Ok(())
    }

    pub fn tick_ms(&self) -> u64 {
        (1000 / self.tick_rate.max(1) as u64).max(1)
    }
}

/// Settings for the websocket host binary.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub listen_addr: String,
    pub static_dir: Option<String>,
    pub outbound_queue: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            static_dir: None,
            outbound_queue: 256,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from `PORT`, `STATIC_DIR` and `OUTBOUND_QUEUE`, ignoring unparsable values.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        if let Some(port) = lookup("PORT").and_then(|value| value.parse::<u16>().ok()) {
            config.listen_addr = format!("0.0.0.0:{port}");
        }
        config.static_dir = lookup("STATIC_DIR").filter(|value| !value.trim().is_empty());
        if let Some(queue) = lookup("OUTBOUND_QUEUE")
            .and_then(|value| value.parse::<usize>().ok())
            .filter(|queue| *queue > 0)
        {
            config.outbound_queue = queue;
        }
        config
    }
}
