use super::*;
use crate::constants::{AMBUSH_LOOKAHEAD_TILES, OPPORTUNIST_RETREAT_TILES};

use super::movement::{can_advance, is_decision_point};

/// What every ghost can see of the chase when it picks a target.
struct Pursuit {
    player: Position,
    player_dir: Direction,
    leader: Option<Position>,
    corners: [Position; 4],
}

impl GameEngine {
    pub(super) fn seat_ghosts(&mut self, spawns: &[Position]) {
        self.ghosts = spawns
            .iter()
            .enumerate()
            .map(|(id, home)| GhostInternal {
                id,
                role: GhostRole::from_id(id),
                state: GhostState::Chase,
                actor: Actor::new(*home, self.config.ghost_speed),
                home: *home,
                target: *home,
            })
            .collect();
    }

    /// Put the player and every ghost back on their spawn tiles, chasing.
    ///
    /// Ghosts come back undirected and pick their heading on the next tick.
    pub(super) fn reset_actors(&mut self) {
        self.player.actor = Actor::new(self.player.spawn, self.config.player_speed);
        for ghost in &mut self.ghosts {
            ghost.actor = Actor::new(ghost.home, self.config.ghost_speed);
            ghost.state = GhostState::Chase;
            ghost.target = ghost.home;
        }
    }

    pub(super) fn update_ghosts(&mut self) {
        let pursuit = Pursuit {
            player: self.player.actor.pos,
            player_dir: self.player.actor.dir,
            leader: self
                .ghosts
                .iter()
                .find(|ghost| ghost.id == 0)
                .map(|ghost| ghost.actor.pos),
            corners: corner_targets(&self.grid),
        };

        let grid = &self.grid;
        for ghost in &mut self.ghosts {
            if ghost.actor.dir == Direction::None || is_decision_point(ghost.actor.pos, grid) {
                ghost.target = ghost_target(ghost, &pursuit);
                let chosen = choose_direction(&ghost.actor, ghost.target, grid);
                if chosen != Direction::None {
                    ghost.actor.next_dir = chosen;
                    if ghost.actor.dir == Direction::None {
                        ghost.actor.dir = chosen;
                    }
                }
            }
            advance(&mut ghost.actor, grid);
        }
    }
}

fn ghost_target(ghost: &GhostInternal, pursuit: &Pursuit) -> Position {
    match ghost.state {
        GhostState::Eaten => ghost.home,
        GhostState::Frightened | GhostState::Scatter => pursuit.corners[ghost.id % 4],
        GhostState::Chase => role_target(ghost, pursuit),
    }
}

fn role_target(ghost: &GhostInternal, pursuit: &Pursuit) -> Position {
    let player = pursuit.player;
    match ghost.role {
        GhostRole::Chaser => player,
        GhostRole::Ambusher => {
            let ahead = AMBUSH_LOOKAHEAD_TILES * TILE_SIZE;
            // Up and Left share the diagonal offset; Down and Right stay on one axis.
            match pursuit.player_dir {
                Direction::Up | Direction::Left => {
                    Position::new(player.x - ahead, player.y - ahead)
                }
                Direction::Down => Position::new(player.x, player.y + ahead),
                Direction::Right => Position::new(player.x + ahead, player.y),
                Direction::None => player,
            }
        }
        GhostRole::Flanker => match pursuit.leader {
            Some(leader) => Position::new(2.0 * player.x - leader.x, 2.0 * player.y - leader.y),
            None => player,
        },
        GhostRole::Opportunist => {
            if ghost.actor.pos.distance(player) > OPPORTUNIST_RETREAT_TILES * TILE_SIZE {
                pursuit.corners[2]
            } else {
                player
            }
        }
    }
}

/// Least-distance pick among open directions, reversal only at dead ends.
///
/// Ties resolve in `Direction::CARDINALS` order.
fn choose_direction(actor: &Actor, target: Position, grid: &Grid) -> Direction {
    let reverse = actor.dir.opposite();
    let open: Vec<Direction> = Direction::CARDINALS
        .into_iter()
        .filter(|dir| can_advance(actor.pos, *dir, grid, actor.speed))
        .collect();
    let forward: Vec<Direction> = open
        .iter()
        .copied()
        .filter(|dir| actor.dir == Direction::None || *dir != reverse)
        .collect();
    let candidates = if forward.is_empty() { open } else { forward };

    let mut best = Direction::None;
    let mut best_distance = f32::INFINITY;
    for dir in candidates {
        let distance = actor.pos.offset(dir, TILE_SIZE).distance(target);
        if distance < best_distance {
            best = dir;
            best_distance = distance;
        }
    }
    best
}
