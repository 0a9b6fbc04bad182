use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::config::{ConfigError, SimulationConfig};
use crate::constants::{MOUTH_STEP, TILE_SIZE};
use crate::levels;
use crate::types::{
    Command, Direction, GhostRole, GhostState, GhostView, LevelInit, Notification, PlayerView,
    Position, Snapshot, StatusView,
};
use crate::world::{load_level, Grid, LevelError, LevelTemplate};

mod collision_system;
mod ghost_system;
pub mod movement;
mod pickup_system;
pub mod schedule;
mod utils;

use self::movement::{advance, Actor};
use self::schedule::RevertSchedule;
use self::utils::{corner_targets, seam_distance, template_index, tile_of};

#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    NoLevels,
    Level(LevelError),
    Config(ConfigError),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoLevels => write!(f, "no levels to play"),
            Self::Level(err) => write!(f, "invalid level: {err}"),
            Self::Config(err) => write!(f, "invalid config: {err}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<LevelError> for EngineError {
    fn from(err: LevelError) -> Self {
        Self::Level(err)
    }
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err)
    }
}

#[derive(Clone, Debug)]
struct PlayerInternal {
    actor: Actor,
    spawn: Position,
    mouth_phase: f32,
}

#[derive(Clone, Debug)]
struct GhostInternal {
    id: usize,
    role: GhostRole,
    state: GhostState,
    actor: Actor,
    home: Position,
    target: Position,
}

impl GhostInternal {
    fn view(&self) -> GhostView {
        GhostView {
            id: self.id,
            role: self.role,
            state: self.state,
            x: self.actor.pos.x,
            y: self.actor.pos.y,
            dir: self.actor.dir,
            target: self.target,
        }
    }
}

/// Owns all mutable simulation state. One instance per game session.
#[derive(Clone, Debug)]
pub struct GameEngine {
    config: SimulationConfig,
    templates: Vec<LevelTemplate>,
    grid: Grid,
    rng: StdRng,

    player: PlayerInternal,
    ghosts: Vec<GhostInternal>,
    reverts: RevertSchedule,
    events: Vec<Notification>,

    score: u32,
    lives: u32,
    level: usize,
    paused: bool,
    game_over: bool,
    level_complete: bool,
    power_ticks: u32,

    now_ms: u64,
    tick_counter: u64,
}

impl GameEngine {
    pub fn new(
        templates: Vec<LevelTemplate>,
        config: SimulationConfig,
    ) -> Result<Self, EngineError> {
        config.validate()?;
        let Some(first) = templates.first() else {
            return Err(EngineError::NoLevels);
        };

        let seed = config.seed.unwrap_or_else(rand::random);
        let mut rng = StdRng::seed_from_u64(seed);
        let loaded = load_level(first, &mut rng, config.place_bonus);
        info!(seed, levels = templates.len(), "engine created");

        let mut engine = Self {
            player: PlayerInternal {
                actor: Actor::new(loaded.player_spawn, config.player_speed),
                spawn: loaded.player_spawn,
                mouth_phase: 0.0,
            },
            ghosts: Vec::new(),
            grid: loaded.grid,
            rng,
            reverts: RevertSchedule::default(),
            events: Vec::new(),
            score: 0,
            lives: config.starting_lives,
            level: 0,
            paused: false,
            game_over: false,
            level_complete: false,
            power_ticks: 0,
            now_ms: 0,
            tick_counter: 0,
            templates,
            config,
        };
        engine.seat_ghosts(&loaded.ghost_spawns);
        Ok(engine)
    }

    pub fn with_builtin_levels(config: SimulationConfig) -> Result<Self, EngineError> {
        Self::new(levels::builtin()?, config)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn level_count(&self) -> usize {
        self.templates.len()
    }

    /// True while pause, game over or level complete gates the tick.
    pub fn is_halted(&self) -> bool {
        self.paused || self.game_over || self.level_complete
    }

    pub fn status(&self) -> StatusView {
        StatusView {
            score: self.score,
            lives: self.lives,
            level: self.level,
            paused: self.paused,
            game_over: self.game_over,
            level_complete: self.level_complete,
            power_ticks: self.power_ticks,
        }
    }

    pub fn apply_command(&mut self, command: Command) {
        match command {
            Command::SetPlayerIntent(dir) => {
                self.player.actor.next_dir = dir;
            }
            Command::TogglePause => {
                if self.game_over || self.level_complete {
                    debug!(
                        game_over = self.game_over,
                        level_complete = self.level_complete,
                        "pause toggle ignored"
                    );
                    return;
                }
                self.paused = !self.paused;
            }
            Command::Restart { level, keep_score } => self.restart(level, keep_score),
            Command::AdvanceToNextLevel => {
                if self.game_over {
                    debug!("advance ignored after game over");
                    return;
                }
                let next = self.level.wrapping_add(1);
                self.load(next);
            }
        }
    }

    /// Advance the clock by `dt_ms` and run one simulation tick unless halted.
    pub fn step(&mut self, dt_ms: u64) {
        self.tick_counter += 1;
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        self.fire_due_reverts();
        self.settle_power_mode();
        if self.is_halted() {
            return;
        }

        self.update_power_countdown();
        self.update_player();
        self.apply_pickups();
        if self.check_level_complete() {
            return;
        }
        self.update_ghosts();
        self.resolve_collisions();
        self.settle_power_mode();
    }

    pub fn build_snapshot(&mut self, include_events: bool) -> Snapshot {
        let (width, height) = self.grid.dimensions();
        Snapshot {
            tick: self.tick_counter,
            now_ms: self.now_ms,
            level: self.level,
            width,
            height,
            tile_size: TILE_SIZE,
            tiles: self.grid.rows(),
            status: self.status(),
            player: PlayerView {
                x: self.player.actor.pos.x,
                y: self.player.actor.pos.y,
                dir: self.player.actor.dir,
                next_dir: self.player.actor.next_dir,
                mouth_phase: self.player.mouth_phase,
            },
            ghosts: self.ghosts.iter().map(GhostInternal::view).collect(),
            events: if include_events {
                std::mem::take(&mut self.events)
            } else {
                Vec::new()
            },
        }
    }

    pub fn level_init(&self) -> LevelInit {
        let (width, height) = self.grid.dimensions();
        LevelInit {
            level: self.level,
            width,
            height,
            tile_size: TILE_SIZE,
            tiles: self.grid.rows(),
            config: self.config.clone(),
        }
    }

    fn restart(&mut self, level: usize, keep_score: bool) {
        if keep_score {
            if self.lives == 0 {
                self.lives = self.config.starting_lives;
            }
        } else {
            self.score = 0;
            self.lives = self.config.starting_lives;
        }
        self.load(level);
    }

    /// Load `level` (wrapping over the template list) and clear every gate flag.
    fn load(&mut self, level: usize) {
        let idx = template_index(level, self.templates.len());
        let Some(template) = self.templates.get(idx) else {
            return;
        };
        let loaded = load_level(template, &mut self.rng, self.config.place_bonus);

        self.reverts.cancel_all();
        self.grid = loaded.grid;
        self.player = PlayerInternal {
            actor: Actor::new(loaded.player_spawn, self.config.player_speed),
            spawn: loaded.player_spawn,
            mouth_phase: 0.0,
        };
        self.seat_ghosts(&loaded.ghost_spawns);
        self.level = level;
        self.paused = false;
        self.game_over = false;
        self.level_complete = false;
        self.power_ticks = 0;
        info!(
            level,
            template = idx,
            score = self.score,
            lives = self.lives,
            "level loaded"
        );
    }

    fn update_player(&mut self) {
        if advance(&mut self.player.actor, &self.grid) {
            self.player.mouth_phase = (self.player.mouth_phase + MOUTH_STEP) % 1.0;
        }
    }

    fn fire_due_reverts(&mut self) {
        for pending in self.reverts.take_due(self.now_ms) {
            let Some(ghost) = self.ghosts.iter_mut().find(|g| g.id == pending.ghost_id) else {
                continue;
            };
            if ghost.state != GhostState::Eaten {
                continue;
            }
            ghost.state = GhostState::Chase;
            debug!(ghost_id = ghost.id, now_ms = self.now_ms, "ghost reverted to chase");
            self.events.push(Notification::GhostRespawned { ghost_id: ghost.id });
        }
    }
}
