//! Sub-tile movement over the grid.
//!
//! Positions are the top-left corner of a tile-sized box. Turns are only
//! committed on tile centers inside the grid; anything outside the grid is
//! tunnel space and always passable.

use crate::constants::{PROBE_BUFFER, TILE_SIZE};
use crate::types::{Direction, Position};
use crate::world::Grid;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Actor {
    pub pos: Position,
    pub dir: Direction,
    /// Buffered turn, applied at the next tile center where it is open.
    pub next_dir: Direction,
    pub speed: f32,
}

impl Actor {
    pub fn new(pos: Position, speed: f32) -> Self {
        Self {
            pos,
            dir: Direction::None,
            next_dir: Direction::None,
            speed,
        }
    }
}

pub fn is_tile_centered(pos: Position) -> bool {
    pos.x % TILE_SIZE == 0.0 && pos.y % TILE_SIZE == 0.0
}

/// Whether the whole entity box lies on the grid (i.e. not in a tunnel).
pub fn within_grid(pos: Position, grid: &Grid) -> bool {
    pos.x >= 0.0
        && pos.y >= 0.0
        && pos.x + TILE_SIZE <= grid.pixel_width()
        && pos.y + TILE_SIZE <= grid.pixel_height()
}

/// Tiles where turns and ghost decisions are evaluated.
pub fn is_decision_point(pos: Position, grid: &Grid) -> bool {
    is_tile_centered(pos) && within_grid(pos, grid)
}

fn cell_of(value: f32) -> i32 {
    (value / TILE_SIZE).floor() as i32
}

/// Probe the two leading-edge corners of the box after a `step` in `dir`.
///
/// The box is shrunk by [`PROBE_BUFFER`] so grazing a wall corner does not block.
pub fn can_advance(pos: Position, dir: Direction, grid: &Grid, step: f32) -> bool {
    if dir == Direction::None {
        return false;
    }
    let moved = pos.offset(dir, step);
    let left = moved.x + PROBE_BUFFER;
    let right = moved.x + TILE_SIZE - PROBE_BUFFER;
    let top = moved.y + PROBE_BUFFER;
    let bottom = moved.y + TILE_SIZE - PROBE_BUFFER;

    let probes = match dir {
        Direction::Up => [(left, top), (right, top)],
        Direction::Down => [(left, bottom), (right, bottom)],
        Direction::Left => [(left, top), (left, bottom)],
        Direction::Right => [(right, top), (right, bottom)],
        Direction::None => return false,
    };
    probes
        .iter()
        .all(|(x, y)| !grid.is_wall(cell_of(*x), cell_of(*y)))
}

/// Move one tick. Returns whether the actor changed position.
pub fn advance(actor: &mut Actor, grid: &Grid) -> bool {
    if actor.next_dir != Direction::None
        && actor.next_dir != actor.dir
        && is_decision_point(actor.pos, grid)
        && can_advance(actor.pos, actor.next_dir, grid, actor.speed)
    {
        actor.dir = actor.next_dir;
    }
    if actor.dir == Direction::None {
        return false;
    }

    if can_advance(actor.pos, actor.dir, grid, actor.speed) {
        actor.pos = actor.pos.offset(actor.dir, actor.speed);
        actor.pos = wrap(actor.pos, actor.speed, grid);
        true
    } else {
        if within_grid(actor.pos, grid) {
            actor.dir = Direction::None;
        }
        false
    }
}

/// Re-enter from the opposite edge once a box has fully left the grid.
///
/// Leaving left at speed `s` lands at `width - s`; leaving right lands at
/// `-tile + s`. Both keep the sub-tile phase.
pub fn wrap(pos: Position, speed: f32, grid: &Grid) -> Position {
    let width = grid.pixel_width();
    let height = grid.pixel_height();
    let mut wrapped = pos;
    if pos.x < -TILE_SIZE {
        wrapped.x = width - speed;
    } else if pos.x > width {
        wrapped.x = -TILE_SIZE + speed;
    }
    if pos.y < -TILE_SIZE {
        wrapped.y = height - speed;
    } else if pos.y > height {
        wrapped.y = -TILE_SIZE + speed;
    }
    wrapped
}
