use crate::world::{LevelError, LevelTemplate};

const LEVEL_ONE: [&str; 19] = [
    "###################",
    "#o.......#.......o#",
    "#.##.###.#.###.##.#",
    "#.................#",
    "#.##.#.#####.#.##.#",
    "#....#...#...#....#",
    "####.### # ###.####",
    "####.#  GGGG #.####",
    "    .  #####  .    ",
    "####.#       #.####",
    "####.# ##### #.####",
    "#........#........#",
    "#.##.###.#.###.##.#",
    "#o.#.....P.....#.o#",
    "##.#.#.#####.#.#.##",
    "#....#...#...#....#",
    "#.######.#.######.#",
    "#.................#",
    "###################",
];

// Column 10 runs through the top and bottom edge.
const LEVEL_TWO: [&str; 15] = [
    "##########.##########",
    "#o........ ........o#",
    "#.###.###.#.###.###.#",
    "#.#.....#...#.....#.#",
    "#.#.###.#####.###.#.#",
    "#.........G.........#",
    "###.#.###G#G###.#.###",
    "   .#...#.G.#...#.   ",
    "###.###.#####.###.###",
    "#.........P.........#",
    "#.###.#.#####.#.###.#",
    "#o..#.#...#...#.#..o#",
    "###.#.###.#.###.#.###",
    "#...................#",
    "##########.##########",
];

/// Parse the levels shipped with the crate, in play order.
pub fn builtin() -> Result<Vec<LevelTemplate>, LevelError> {
    [&LEVEL_ONE[..], &LEVEL_TWO[..]]
        .into_iter()
        .map(LevelTemplate::parse)
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::constants::{MAX_GHOSTS, TILE_SIZE};
    use crate::types::Tile;
    use crate::world::load_level;

    #[test]
    fn builtin_levels_parse() {
        let levels = builtin().expect("builtin levels are well formed");
        assert_eq!(levels.len(), 2);
        assert_eq!(levels[0].dimensions(), (19, 19));
        assert_eq!(levels[1].dimensions(), (21, 15));
    }

    #[test]
    fn builtin_levels_seat_a_full_ghost_roster() {
        let mut rng = StdRng::seed_from_u64(0);
        for template in builtin().expect("builtin levels are well formed") {
            let level = load_level(&template, &mut rng, true);
            assert_eq!(level.ghost_spawns.len(), MAX_GHOSTS);
            assert_eq!(level.grid.bonus_count(), 1);
        }
    }

    #[test]
    fn tunnel_rows_are_open_on_both_edges() {
        let mut rng = StdRng::seed_from_u64(0);
        let levels = builtin().expect("builtin levels are well formed");

        let first = load_level(&levels[0], &mut rng, false);
        assert_eq!(first.grid.tile_at(0, 8), Tile::Empty);
        assert_eq!(first.grid.tile_at(18, 8), Tile::Empty);

        let second = load_level(&levels[1], &mut rng, false);
        assert_eq!(second.grid.tile_at(0, 7), Tile::Empty);
        assert_eq!(second.grid.tile_at(20, 7), Tile::Empty);
        assert_eq!(second.grid.tile_at(10, 0), Tile::Pellet);
        assert_eq!(second.grid.tile_at(10, 14), Tile::Pellet);
    }

    #[test]
    fn every_open_tile_is_reachable_without_the_seam() {
        let mut rng = StdRng::seed_from_u64(0);
        for template in builtin().expect("builtin levels are well formed") {
            let level = load_level(&template, &mut rng, false);
            let grid = &level.grid;
            let (width, height) = grid.dimensions();
            let start = (
                (level.player_spawn.x / TILE_SIZE) as i32,
                (level.player_spawn.y / TILE_SIZE) as i32,
            );

            let mut seen = HashSet::from([start]);
            let mut frontier = vec![start];
            while let Some((col, row)) = frontier.pop() {
                for (dc, dr) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
                    let next = (col + dc, row + dr);
                    if grid.in_bounds(next.0, next.1)
                        && !grid.is_wall(next.0, next.1)
                        && seen.insert(next)
                    {
                        frontier.push(next);
                    }
                }
            }

            for row in 0..height {
                for col in 0..width {
                    if !grid.is_wall(col, row) {
                        assert!(seen.contains(&(col, row)), "({col}, {row}) is sealed off");
                    }
                }
            }
        }
    }
}
