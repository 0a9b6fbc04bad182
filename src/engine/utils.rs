use crate::constants::TILE_SIZE;
use crate::types::Position;
use crate::world::Grid;

/// Tile under the entity's center point.
pub(super) fn tile_of(pos: Position) -> (i32, i32) {
    let half = TILE_SIZE / 2.0;
    (
        ((pos.x + half) / TILE_SIZE).floor() as i32,
        ((pos.y + half) / TILE_SIZE).floor() as i32,
    )
}

/// Top-left, top-right, bottom-left, bottom-right tile origins.
pub(super) fn corner_targets(grid: &Grid) -> [Position; 4] {
    let right = grid.pixel_width() - TILE_SIZE;
    let bottom = grid.pixel_height() - TILE_SIZE;
    [
        Position::new(0.0, 0.0),
        Position::new(right, 0.0),
        Position::new(0.0, bottom),
        Position::new(right, bottom),
    ]
}

/// Distance with the tunnel seam closed up.
///
/// `movement::wrap` re-enters one tile past each edge, so each axis repeats
/// every `extent + TILE_SIZE` pixels.
pub(super) fn seam_distance(a: Position, b: Position, grid: &Grid) -> f32 {
    let across = |delta: f32, period: f32| {
        let delta = delta.abs() % period;
        delta.min(period - delta)
    };
    let dx = across(a.x - b.x, grid.pixel_width() + TILE_SIZE);
    let dy = across(a.y - b.y, grid.pixel_height() + TILE_SIZE);
    (dx * dx + dy * dy).sqrt()
}

pub(super) fn template_index(level: usize, count: usize) -> usize {
    if count == 0 {
        return 0;
    }
    level % count
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::world::{load_level, LevelTemplate};

    #[test]
    fn tile_of_uses_the_center_point() {
        assert_eq!(tile_of(Position::new(50.0, 25.0)), (2, 1));
        assert_eq!(tile_of(Position::new(37.5, 25.0)), (2, 1));
        assert_eq!(tile_of(Position::new(35.0, 25.0)), (1, 1));
        assert_eq!(tile_of(Position::new(-20.0, 25.0)), (-1, 1));
    }

    #[test]
    fn seam_distance_joins_opposite_tunnel_mouths() {
        let template =
            LevelTemplate::parse(&["########", "#P  .G #", "########"]).expect("test level parses");
        let mut rng = StdRng::seed_from_u64(0);
        let grid = load_level(&template, &mut rng, false).grid;

        let inside = seam_distance(Position::new(25.0, 25.0), Position::new(75.0, 25.0), &grid);
        assert_eq!(inside, 50.0);
        let across = seam_distance(Position::new(-22.5, 25.0), Position::new(190.0, 25.0), &grid);
        assert_eq!(across, 12.5);
        let edges = seam_distance(Position::new(0.0, 25.0), Position::new(175.0, 25.0), &grid);
        assert_eq!(edges, 50.0);
    }

    #[test]
    fn level_selection_wraps_around() {
        assert_eq!(template_index(0, 2), 0);
        assert_eq!(template_index(3, 2), 1);
        assert_eq!(template_index(5, 0), 0);
    }
}
