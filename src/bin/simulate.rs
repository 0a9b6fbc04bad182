use clap::Parser;
use maze_chase_server::config::SimulationConfig;
use maze_chase_server::engine::{EngineError, GameEngine};
use maze_chase_server::types::{Command, Direction, GhostState, Notification, Snapshot, StatusView};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashSet;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Headless autopilot runs that check engine invariants every tick.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Number of independent runs.
    #[arg(long, default_value_t = 3)]
    runs: usize,
    /// Tick budget per run.
    #[arg(long, default_value_t = 20_000)]
    ticks: u64,
    /// Base seed; run `n` uses `seed + n`.
    #[arg(long)]
    seed: Option<u64>,
    /// Level index to start from.
    #[arg(long, default_value_t = 0)]
    level: usize,
    /// TOML file overriding the simulation config.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    run_id: Option<String>,
    #[arg(long)]
    summary_out: Option<PathBuf>,
}

#[derive(Clone, Debug, Serialize)]
struct RunResultLine {
    run: usize,
    seed: u64,
    ticks: u64,
    level: usize,
    score: u32,
    lives: u32,
    #[serde(rename = "levelsCleared")]
    levels_cleared: u32,
    #[serde(rename = "livesLost")]
    lives_lost: u32,
    #[serde(rename = "ghostsEaten")]
    ghosts_eaten: u32,
    #[serde(rename = "pelletsEaten")]
    pellets_eaten: u32,
    #[serde(rename = "gameOver")]
    game_over: bool,
    anomalies: Vec<String>,
}

#[derive(Clone, Debug, Serialize)]
struct AnomalyRecord {
    tick: u64,
    message: String,
}

#[derive(Clone, Debug)]
struct RunOutcome {
    result: RunResultLine,
    anomaly_records: Vec<AnomalyRecord>,
}

#[derive(Clone, Debug, Serialize)]
struct RunSummary {
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(rename = "startedAtMs")]
    started_at_ms: u64,
    #[serde(rename = "finishedAtMs")]
    finished_at_ms: u64,
    #[serde(rename = "runCount")]
    run_count: usize,
    #[serde(rename = "anomalyCount")]
    anomaly_count: usize,
    #[serde(rename = "averageScore")]
    average_score: u64,
    #[serde(rename = "gameOvers")]
    game_overs: usize,
    runs: Vec<RunResultLine>,
}

#[derive(Clone, Debug, Serialize)]
struct StructuredLogLine {
    #[serde(rename = "timestampMs")]
    timestamp_ms: u64,
    level: String,
    event: String,
    #[serde(rename = "runId")]
    run_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    run: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    seed: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tick: Option<u64>,
    details: Value,
}

/// Random-walk player: holds a heading for a while, resumes after a caught
/// pause and advances past cleared levels.
struct Autopilot {
    rng: StdRng,
    hold: u32,
}

impl Autopilot {
    fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed ^ 0x5eed),
            hold: 0,
        }
    }

    fn next_command(&mut self, status: &StatusView) -> Option<Command> {
        if status.game_over {
            return None;
        }
        if status.level_complete {
            return Some(Command::AdvanceToNextLevel);
        }
        if status.paused {
            return Some(Command::TogglePause);
        }
        if self.hold > 0 {
            self.hold -= 1;
            return None;
        }
        self.hold = self.rng.random_range(8..40);
        let dir = Direction::CARDINALS[self.rng.random_range(0..Direction::CARDINALS.len())];
        Some(Command::SetPlayerIntent(dir))
    }
}

fn main() {
    let cli = Cli::parse();
    let run_started_at_ms = now_ms();
    let base_seed = cli.seed.unwrap_or(run_started_at_ms);
    let run_id = cli
        .run_id
        .clone()
        .unwrap_or_else(|| default_run_id(base_seed, run_started_at_ms));

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(error) => {
            emit_log(
                "error",
                "config_invalid",
                &run_id,
                None,
                None,
                None,
                json!({ "error": error.to_string() }),
            );
            std::process::exit(2);
        }
    };

    let mut has_anomaly = false;
    let mut results = Vec::new();
    let mut total_anomalies = 0usize;

    for run in 0..cli.runs {
        let seed = base_seed.wrapping_add(run as u64);
        emit_log(
            "info",
            "run_started",
            &run_id,
            Some(run),
            Some(seed),
            None,
            json!({
                "ticks": cli.ticks,
                "level": cli.level,
            }),
        );

        let outcome = match run_simulation(run, seed, cli.ticks, cli.level, &config) {
            Ok(outcome) => outcome,
            Err(error) => {
                emit_log(
                    "error",
                    "engine_failed",
                    &run_id,
                    Some(run),
                    Some(seed),
                    None,
                    json!({ "error": error.to_string() }),
                );
                std::process::exit(2);
            }
        };

        for anomaly in &outcome.anomaly_records {
            emit_log(
                "warn",
                "anomaly_detected",
                &run_id,
                Some(run),
                Some(seed),
                Some(anomaly.tick),
                json!({ "message": anomaly.message }),
            );
        }
        if !outcome.result.anomalies.is_empty() {
            has_anomaly = true;
        }
        total_anomalies += outcome.anomaly_records.len();

        emit_log(
            "info",
            "run_finished",
            &run_id,
            Some(run),
            Some(seed),
            Some(outcome.result.ticks),
            json!({
                "score": outcome.result.score,
                "level": outcome.result.level,
                "gameOver": outcome.result.game_over,
                "anomalyCount": outcome.anomaly_records.len(),
            }),
        );

        match serde_json::to_string(&outcome.result) {
            Ok(line) => println!("{line}"),
            Err(error) => emit_log(
                "error",
                "result_serialize_failed",
                &run_id,
                Some(run),
                Some(seed),
                None,
                json!({ "error": error.to_string() }),
            ),
        }
        results.push(outcome.result);
    }

    let summary = build_run_summary(
        run_id.clone(),
        run_started_at_ms,
        now_ms(),
        results,
        total_anomalies,
    );

    let mut summary_out_written: Option<String> = None;
    if let Some(path) = cli.summary_out.as_ref() {
        if let Err(error) = write_summary(path, &summary) {
            emit_log(
                "error",
                "summary_write_failed",
                &run_id,
                None,
                None,
                None,
                json!({
                    "path": path.to_string_lossy(),
                    "error": error.to_string(),
                }),
            );
            std::process::exit(2);
        }
        summary_out_written = Some(path.to_string_lossy().to_string());
    }

    emit_log(
        "info",
        "simulation_finished",
        &run_id,
        None,
        None,
        None,
        json!({
            "runCount": summary.run_count,
            "anomalyCount": summary.anomaly_count,
            "averageScore": summary.average_score,
            "gameOvers": summary.game_overs,
            "summaryOut": summary_out_written,
        }),
    );

    if has_anomaly {
        std::process::exit(1);
    }
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig, Box<dyn std::error::Error>> {
    let config = match path {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::load()?,
    };
    config.validate()?;
    Ok(config)
}

fn run_simulation(
    run: usize,
    seed: u64,
    ticks: u64,
    start_level: usize,
    base: &SimulationConfig,
) -> Result<RunOutcome, EngineError> {
    let config = SimulationConfig {
        seed: Some(seed),
        ..base.clone()
    };
    let starting_lives = config.starting_lives;
    let tick_ms = config.tick_ms();
    let mut engine = GameEngine::with_builtin_levels(config)?;
    if start_level != 0 {
        engine.apply_command(Command::Restart {
            level: start_level,
            keep_score: false,
        });
    }

    let mut autopilot = Autopilot::new(seed);
    let mut anomalies = Vec::new();
    let mut anomaly_records = Vec::new();
    let mut anomaly_seen = HashSet::new();
    let mut previous: Option<Snapshot> = None;
    let mut result = RunResultLine {
        run,
        seed,
        ticks: 0,
        level: start_level,
        score: 0,
        lives: starting_lives,
        levels_cleared: 0,
        lives_lost: 0,
        ghosts_eaten: 0,
        pellets_eaten: 0,
        game_over: false,
        anomalies: Vec::new(),
    };

    for tick in 1..=ticks {
        if let Some(command) = autopilot.next_command(&engine.status()) {
            engine.apply_command(command);
        }
        engine.step(tick_ms);
        let snapshot = engine.build_snapshot(true);

        for event in &snapshot.events {
            match event {
                Notification::PelletEaten { .. } => result.pellets_eaten += 1,
                Notification::GhostEaten { .. } => result.ghosts_eaten += 1,
                Notification::PlayerCaught { .. } => result.lives_lost += 1,
                Notification::LevelComplete { .. } => result.levels_cleared += 1,
                _ => {}
            }
        }
        for message in collect_snapshot_anomalies(previous.as_ref(), &snapshot, starting_lives) {
            push_anomaly(
                &mut anomalies,
                &mut anomaly_records,
                &mut anomaly_seen,
                tick,
                message,
            );
        }

        result.ticks = tick;
        result.level = snapshot.status.level;
        result.score = snapshot.status.score;
        result.lives = snapshot.status.lives;
        result.game_over = snapshot.status.game_over;
        let finished = snapshot.status.game_over;
        previous = Some(snapshot);
        if finished {
            break;
        }
    }

    result.anomalies = anomalies;
    Ok(RunOutcome {
        result,
        anomaly_records,
    })
}

fn collect_snapshot_anomalies(
    previous: Option<&Snapshot>,
    snapshot: &Snapshot,
    starting_lives: u32,
) -> Vec<String> {
    let mut anomalies = Vec::new();
    let status = &snapshot.status;

    if let Some(previous) = previous {
        if status.score < previous.status.score {
            anomalies.push(format!(
                "score decreased: {} -> {}",
                previous.status.score, status.score
            ));
        }
        if status.lives > previous.status.lives {
            anomalies.push(format!(
                "lives increased without restart: {} -> {}",
                previous.status.lives, status.lives
            ));
        }
    }
    if status.lives > starting_lives {
        anomalies.push(format!("lives above starting count: {}", status.lives));
    }
    if status.game_over && status.lives != 0 {
        anomalies.push(format!("game over with {} lives left", status.lives));
    }

    if status.power_ticks == 0 {
        for ghost in &snapshot.ghosts {
            if ghost.state == GhostState::Frightened {
                anomalies.push(format!("ghost {} frightened with power mode off", ghost.id));
            }
        }
    } else if !snapshot
        .ghosts
        .iter()
        .any(|ghost| matches!(ghost.state, GhostState::Frightened | GhostState::Eaten))
    {
        anomalies.push(format!(
            "power mode on ({} ticks) with no frightened or eaten ghost",
            status.power_ticks
        ));
    }

    let bonus_tiles: usize = snapshot.tiles.iter().map(|row| row.matches('B').count()).sum();
    if bonus_tiles > 1 {
        anomalies.push(format!("{bonus_tiles} bonus tiles on the grid"));
    }

    let slack = snapshot.tile_size * 2.0;
    let max_x = snapshot.width as f32 * snapshot.tile_size + slack;
    let max_y = snapshot.height as f32 * snapshot.tile_size + slack;
    let player = &snapshot.player;
    if player.x < -slack || player.y < -slack || player.x > max_x || player.y > max_y {
        anomalies.push(format!("player left the map: ({}, {})", player.x, player.y));
    }
    anomalies
}

fn push_anomaly(
    anomalies: &mut Vec<String>,
    anomaly_records: &mut Vec<AnomalyRecord>,
    anomaly_seen: &mut HashSet<String>,
    tick: u64,
    message: String,
) {
    anomaly_records.push(AnomalyRecord {
        tick,
        message: message.clone(),
    });
    if anomaly_seen.insert(message.clone()) {
        anomalies.push(message);
    }
}

fn default_run_id(seed: u64, timestamp_ms: u64) -> String {
    format!("sim-{seed}-{timestamp_ms}")
}

fn build_run_summary(
    run_id: String,
    started_at_ms: u64,
    finished_at_ms: u64,
    runs: Vec<RunResultLine>,
    anomaly_count: usize,
) -> RunSummary {
    let run_count = runs.len();
    let total_score: u64 = runs.iter().map(|run| run.score as u64).sum();
    let average_score = if run_count == 0 {
        0
    } else {
        total_score / run_count as u64
    };
    let game_overs = runs.iter().filter(|run| run.game_over).count();
    RunSummary {
        run_id,
        started_at_ms,
        finished_at_ms,
        run_count,
        anomaly_count,
        average_score,
        game_overs,
        runs,
    }
}

fn emit_log(
    level: &str,
    event: &str,
    run_id: &str,
    run: Option<usize>,
    seed: Option<u64>,
    tick: Option<u64>,
    details: Value,
) {
    let log_line = StructuredLogLine {
        timestamp_ms: now_ms(),
        level: level.to_string(),
        event: event.to_string(),
        run_id: run_id.to_string(),
        run,
        seed,
        tick,
        details,
    };
    if let Ok(line) = serde_json::to_string(&log_line) {
        eprintln!("{line}");
    }
}

fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

fn write_summary(path: &Path, summary: &RunSummary) -> io::Result<()> {
    let summary_text = serde_json::to_string_pretty(summary).map_err(io::Error::other)?;
    std::fs::write(path, summary_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_result(score: u32, game_over: bool) -> RunResultLine {
        RunResultLine {
            run: 0,
            seed: 42,
            ticks: 100,
            level: 0,
            score,
            lives: if game_over { 0 } else { 2 },
            levels_cleared: 0,
            lives_lost: 1,
            ghosts_eaten: 0,
            pellets_eaten: 0,
            game_over,
            anomalies: Vec::new(),
        }
    }

    fn sample_snapshot() -> Snapshot {
        let config = SimulationConfig {
            seed: Some(9),
            ..SimulationConfig::default()
        };
        let mut engine = GameEngine::with_builtin_levels(config).expect("engine builds");
        engine.build_snapshot(false)
    }

    #[test]
    fn default_run_id_contains_seed_and_timestamp() {
        assert_eq!(default_run_id(42, 123456789), "sim-42-123456789");
    }

    #[test]
    fn build_run_summary_averages_scores() {
        let summary = build_run_summary(
            "sim-42-1".to_string(),
            1,
            2,
            vec![make_result(100, true), make_result(300, false)],
            0,
        );
        assert_eq!(summary.average_score, 200);
        assert_eq!(summary.run_count, 2);
        assert_eq!(summary.game_overs, 1);
    }

    #[test]
    fn write_summary_returns_error_when_parent_does_not_exist() {
        let target = std::env::temp_dir()
            .join(format!("maze-chase-missing-{}", now_ms()))
            .join("summary.json");
        let summary = build_run_summary("sim-1-1".to_string(), 1, 2, Vec::new(), 0);
        assert!(write_summary(&target, &summary).is_err());
    }

    #[test]
    fn push_anomaly_keeps_records_and_deduplicates_summary_messages() {
        let mut anomalies = Vec::new();
        let mut records = Vec::new();
        let mut seen = HashSet::new();
        push_anomaly(&mut anomalies, &mut records, &mut seen, 10, "same".to_string());
        push_anomaly(&mut anomalies, &mut records, &mut seen, 11, "same".to_string());

        assert_eq!(anomalies.len(), 1);
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].tick, 11);
    }

    #[test]
    fn fresh_snapshot_has_no_anomalies() {
        let snapshot = sample_snapshot();
        assert!(collect_snapshot_anomalies(None, &snapshot, 3).is_empty());
    }

    #[test]
    fn broken_invariants_are_reported() {
        let previous = sample_snapshot();
        let mut snapshot = previous.clone();
        snapshot.status.score = 0;
        let mut richer = previous.clone();
        richer.status.score = 50;
        snapshot.ghosts[0].state = GhostState::Frightened;
        snapshot.tiles.push("BB".to_string());

        let anomalies = collect_snapshot_anomalies(Some(&richer), &snapshot, 3);
        assert!(anomalies.iter().any(|a| a.starts_with("score decreased")));
        assert!(anomalies.iter().any(|a| a.contains("frightened with power mode off")));
        assert!(anomalies.iter().any(|a| a.contains("bonus tiles")));
    }

    #[test]
    fn power_mode_without_vulnerable_ghosts_is_reported() {
        let mut snapshot = sample_snapshot();
        snapshot.status.power_ticks = 30;
        let anomalies = collect_snapshot_anomalies(None, &snapshot, 3);
        assert!(anomalies
            .iter()
            .any(|a| a.contains("no frightened or eaten ghost")));

        snapshot.ghosts[2].state = GhostState::Eaten;
        assert!(collect_snapshot_anomalies(None, &snapshot, 3).is_empty());
    }

    #[test]
    fn autopilot_resumes_and_advances() {
        let mut pilot = Autopilot::new(1);
        let mut status = sample_snapshot().status;

        status.paused = true;
        assert_eq!(pilot.next_command(&status), Some(Command::TogglePause));
        status.level_complete = true;
        assert_eq!(pilot.next_command(&status), Some(Command::AdvanceToNextLevel));
        status.game_over = true;
        assert_eq!(pilot.next_command(&status), None);

        let fresh = sample_snapshot().status;
        assert!(matches!(
            pilot.next_command(&fresh),
            Some(Command::SetPlayerIntent(_))
        ));
    }

    #[test]
    fn seeded_runs_finish_without_anomalies() {
        let config = SimulationConfig::default();
        for seed in [1u64, 2, 3] {
            let outcome = run_simulation(0, seed, 3_000, 0, &config).expect("run completes");
            assert!(
                outcome.result.anomalies.is_empty(),
                "seed {seed}: {:?}",
                outcome.result.anomalies
            );
            assert!(outcome.result.ticks > 0);
        }
    }
}
