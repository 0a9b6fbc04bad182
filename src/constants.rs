pub const TICK_RATE: u32 = 60;
pub const TICK_MS: u64 = 1000 / TICK_RATE as u64;

pub const TILE_SIZE: f32 = 25.0;
pub const PROBE_BUFFER: f32 = 1.0;

pub const PLAYER_SPEED: f32 = 2.5;
pub const GHOST_SPEED: f32 = 2.5;
pub const MOUTH_STEP: f32 = 0.1;

pub const POWER_TICKS: u32 = 600;
pub const EATEN_REVERT_MS: u64 = 7_000;
pub const STARTING_LIVES: u32 = 3;
pub const COLLISION_RADIUS_TILES: f32 = 0.8;

pub const MAX_GHOSTS: usize = 4;
pub const AMBUSH_LOOKAHEAD_TILES: f32 = 4.0;
pub const OPPORTUNIST_RETREAT_TILES: f32 = 8.0;

pub const PELLET_SCORE: u32 = 10;
pub const POWER_PELLET_SCORE: u32 = 50;
pub const BONUS_SCORE: u32 = 100;
pub const GHOST_SCORE: u32 = 200;

/// Whether `speed` lands on every tile boundary when stepped from one.
///
/// Speeds must also be multiples of 1/8 so repeated f32 addition stays exact.
pub fn divides_tile(speed: f32) -> bool {
    if !speed.is_finite() || speed <= 0.0 || speed > TILE_SIZE {
        return false;
    }
    if (speed * 8.0).fract() != 0.0 {
        return false;
    }
    let steps = TILE_SIZE / speed;
    (steps - steps.round()).abs() < 1e-4
}
