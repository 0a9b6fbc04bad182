use super::*;
use crate::constants::{BONUS_SCORE, PELLET_SCORE, POWER_PELLET_SCORE};
use crate::types::Tile;

impl GameEngine {
    pub(super) fn apply_pickups(&mut self) {
        let (col, row) = tile_of(self.player.actor.pos);
        match self.grid.tile_at(col, row) {
            Tile::Pellet => {
                self.grid.set_tile(col, row, Tile::Empty);
                self.score += PELLET_SCORE;
                self.events.push(Notification::PelletEaten { col, row });
            }
            Tile::PowerPellet => {
                self.grid.set_tile(col, row, Tile::Empty);
                self.score += POWER_PELLET_SCORE;
                self.activate_power();
            }
            Tile::Bonus => {
                self.grid.set_tile(col, row, Tile::Empty);
                self.score += BONUS_SCORE;
                self.events.push(Notification::BonusEaten { col, row });
            }
            _ => {}
        }
    }

    fn activate_power(&mut self) {
        self.power_ticks = self.config.power_ticks;
        for ghost in &mut self.ghosts {
            if ghost.state != GhostState::Eaten {
                ghost.state = GhostState::Frightened;
            }
        }
        self.events.push(Notification::PowerActivated {
            ticks: self.power_ticks,
        });
    }

    /// One tick of power mode; frightened ghosts resume the chase on the final tick.
    pub(super) fn update_power_countdown(&mut self) {
        if self.power_ticks == 0 {
            return;
        }
        if self.power_ticks == 1 {
            for ghost in &mut self.ghosts {
                if ghost.state == GhostState::Frightened {
                    ghost.state = GhostState::Chase;
                }
            }
        }
        self.power_ticks -= 1;
    }

    /// Power mode only lasts while some ghost is still frightened or eaten.
    pub(super) fn settle_power_mode(&mut self) {
        if self.power_ticks == 0 {
            return;
        }
        let vulnerable = self
            .ghosts
            .iter()
            .any(|ghost| matches!(ghost.state, GhostState::Frightened | GhostState::Eaten));
        if !vulnerable {
            self.power_ticks = 0;
        }
    }

    pub(super) fn check_level_complete(&mut self) -> bool {
        if self.grid.remaining_collectibles() > 0 {
            return false;
        }
        self.level_complete = true;
        self.paused = true;
        info!(level = self.level, score = self.score, "level complete");
        self.events.push(Notification::LevelComplete { level: self.level });
        true
    }
}
