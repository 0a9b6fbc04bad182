use maze_chase_server::config::SimulationConfig;
use maze_chase_server::constants::{POWER_TICKS, TICK_MS};
use maze_chase_server::engine::GameEngine;
use maze_chase_server::types::{Command, Direction, GhostState, Notification, Snapshot};
use maze_chase_server::world::LevelTemplate;

fn engine(rows: &[&str], lives: u32) -> GameEngine {
    let template = LevelTemplate::parse(rows).expect("test level parses");
    let config = SimulationConfig {
        place_bonus: false,
        seed: Some(21),
        starting_lives: lives,
        ..SimulationConfig::default()
    };
    GameEngine::new(vec![template], config).expect("engine builds")
}

/// Step until `done` holds for a snapshot, collecting every notification on the way.
fn run_until(
    engine: &mut GameEngine,
    max_ticks: usize,
    mut done: impl FnMut(&Snapshot) -> bool,
) -> (Snapshot, Vec<Notification>) {
    let mut events = Vec::new();
    for _ in 0..max_ticks {
        engine.step(TICK_MS);
        let snapshot = engine.build_snapshot(true);
        events.extend(snapshot.events.iter().cloned());
        if done(&snapshot) {
            return (snapshot, events);
        }
    }
    panic!("condition not reached within {max_ticks} ticks");
}

#[test]
fn walking_onto_a_pellet_clears_it_and_scores_ten() {
    let mut engine = engine(&["######", "#P...#", "######"], 3);
    engine.apply_command(Command::SetPlayerIntent(Direction::Right));

    let (snapshot, events) = run_until(&mut engine, 20, |s| s.player.x == 50.0);
    assert_eq!(snapshot.tiles[1], "#  ..#");
    assert_eq!(snapshot.status.score, 10);
    assert_eq!(events, vec![Notification::PelletEaten { col: 2, row: 1 }]);
}

#[test]
fn power_pellet_frightens_all_four_ghosts() {
    let mut engine = engine(
        &[
            "#########",
            "#Po....##",
            "#########",
            "#G G G G#",
            "#########",
        ],
        3,
    );
    engine.apply_command(Command::SetPlayerIntent(Direction::Right));

    let (snapshot, _) = run_until(&mut engine, 20, |s| s.status.power_ticks > 0);
    assert_eq!(snapshot.status.power_ticks, POWER_TICKS);
    assert_eq!(snapshot.status.score, 50);
    assert_eq!(snapshot.ghosts.len(), 4);
    assert!(snapshot
        .ghosts
        .iter()
        .all(|ghost| ghost.state == GhostState::Frightened));
    assert!(snapshot
        .events
        .contains(&Notification::PowerActivated { ticks: POWER_TICKS }));
}

#[test]
fn eaten_ghost_returns_to_chase_after_the_delay() {
    let mut engine = engine(&["#########", "#P.o...G#", "#########"], 3);
    engine.apply_command(Command::SetPlayerIntent(Direction::Right));

    let (eaten, _) = run_until(&mut engine, 120, |s| {
        s.events
            .contains(&Notification::GhostEaten { ghost_id: 0 })
    });
    assert_eq!(eaten.ghosts[0].state, GhostState::Eaten);
    let eaten_at = eaten.now_ms;
    let score_with_ghost = eaten.status.score;
    assert!(score_with_ghost >= 260);

    let (respawned, _) = run_until(&mut engine, 1_000, |s| {
        s.events
            .contains(&Notification::GhostRespawned { ghost_id: 0 })
    });
    assert!(respawned.now_ms - eaten_at >= 7_000);
    assert_eq!(respawned.ghosts[0].state, GhostState::Chase);
}

#[test]
fn restart_before_the_delay_cancels_the_revert() {
    let mut engine = engine(&["#########", "#P.o...G#", "#########"], 3);
    engine.apply_command(Command::SetPlayerIntent(Direction::Right));
    run_until(&mut engine, 120, |s| {
        s.events
            .contains(&Notification::GhostEaten { ghost_id: 0 })
    });

    engine.apply_command(Command::Restart {
        level: 0,
        keep_score: true,
    });
    let mut respawns = 0;
    for _ in 0..600 {
        engine.step(TICK_MS);
        respawns += engine
            .build_snapshot(true)
            .events
            .iter()
            .filter(|event| matches!(event, Notification::GhostRespawned { .. }))
            .count();
    }
    assert_eq!(respawns, 0);
}

#[test]
fn chase_collision_on_the_last_life_ends_the_game() {
    let mut engine = engine(&["######", "#P..G#", "######"], 1);

    let (snapshot, events) = run_until(&mut engine, 60, |s| s.status.game_over);
    assert_eq!(snapshot.status.lives, 0);
    assert!(snapshot.status.paused);
    assert_eq!(
        events
            .iter()
            .filter(|event| matches!(event, Notification::GameOver { .. }))
            .count(),
        1
    );

    engine.apply_command(Command::SetPlayerIntent(Direction::Right));
    engine.apply_command(Command::TogglePause);
    for _ in 0..30 {
        engine.step(TICK_MS);
    }
    let after = engine.build_snapshot(true);
    assert_eq!(after.player.x, snapshot.player.x);
    assert_eq!(after.ghosts[0].x, snapshot.ghosts[0].x);
    assert_eq!(after.status, snapshot.status);
}

#[test]
fn clearing_the_last_pellet_completes_the_level() {
    let mut engine = engine(&["#####", "#P. #", "#####"], 3);
    engine.apply_command(Command::SetPlayerIntent(Direction::Right));

    let (snapshot, events) = run_until(&mut engine, 20, |s| s.status.level_complete);
    assert!(snapshot.status.paused);
    assert!(events.contains(&Notification::LevelComplete { level: 0 }));

    for _ in 0..10 {
        engine.step(TICK_MS);
    }
    assert_eq!(engine.build_snapshot(false).player.x, snapshot.player.x);

    engine.apply_command(Command::AdvanceToNextLevel);
    let next = engine.build_snapshot(false);
    assert_eq!(next.status.level, 1);
    assert_eq!(next.status.score, 10);
    assert!(!next.status.level_complete);
    assert!(!next.status.paused);
    assert_eq!(next.tiles[1], "# . #");
}

#[test]
fn player_caught_with_lives_left_pauses_and_resets() {
    let mut engine = engine(&["#######", "#P...G#", "#######"], 3);

    let (snapshot, events) = run_until(&mut engine, 60, |s| s.status.paused);
    assert_eq!(snapshot.status.lives, 2);
    assert!(!snapshot.status.game_over);
    assert_eq!((snapshot.player.x, snapshot.player.y), (25.0, 25.0));
    assert_eq!((snapshot.ghosts[0].x, snapshot.ghosts[0].y), (125.0, 25.0));
    assert!(events.contains(&Notification::PlayerCaught { lives_left: 2 }));

    engine.apply_command(Command::TogglePause);
    engine.step(TICK_MS);
    assert!(!engine.status().paused);
}
