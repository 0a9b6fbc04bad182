use super::*;
use crate::constants::GHOST_SCORE;

impl GameEngine {
    pub(super) fn resolve_collisions(&mut self) {
        let reach = self.config.collision_radius_tiles * TILE_SIZE;
        let player = self.player.actor.pos;

        for idx in 0..self.ghosts.len() {
            if seam_distance(self.ghosts[idx].actor.pos, player, &self.grid) >= reach {
                continue;
            }
            match self.ghosts[idx].state {
                GhostState::Frightened => self.eat_ghost(idx),
                GhostState::Chase | GhostState::Scatter => {
                    self.lose_life();
                    return;
                }
                GhostState::Eaten => {}
            }
        }
    }

    fn eat_ghost(&mut self, idx: usize) {
        let ghost_id = self.ghosts[idx].id;
        self.ghosts[idx].state = GhostState::Eaten;
        self.score += GHOST_SCORE;
        let due_ms = self.now_ms.saturating_add(self.config.eaten_revert_ms);
        self.reverts.schedule(ghost_id, due_ms);
        debug!(ghost_id, due_ms, score = self.score, "ghost eaten");
        self.events.push(Notification::GhostEaten { ghost_id });
    }

    /// Caught by a chasing ghost: drop a life, reset the board and pause.
    pub(super) fn lose_life(&mut self) {
        self.lives = self.lives.saturating_sub(1);
        self.events.push(Notification::PlayerCaught {
            lives_left: self.lives,
        });
        info!(lives = self.lives, score = self.score, "player caught");

        self.reset_actors();
        self.reverts.cancel_all();
        self.power_ticks = 0;
        self.paused = true;

        if self.lives == 0 && !self.game_over {
            self.game_over = true;
            info!(score = self.score, level = self.level, "game over");
            self.events.push(Notification::GameOver { score: self.score });
        }
    }
}
