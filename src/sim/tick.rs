//! Fixed timestep simulation tick
//!
//! Core game loop that advances simulation deterministically.

use glam::Vec2;

use super::collision::{apply_magnet, resolve_blocks, resolve_power_ups};
use super::progression::{Difficulty, check_level_up, level_color, level_name};
use super::state::{EntityKind, FallingEntity, GameEvent, GamePhase, GameState, PowerUpKind};
use crate::consts::*;
use crate::highscores::RunRecord;

/// Input snapshot for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Move left held
    pub left: bool,
    /// Move right held
    pub right: bool,
    /// Pause toggle
    pub pause: bool,
    /// Quit (from pause or game over)
    pub quit: bool,
    /// Restart after game over
    pub restart: bool,
    /// Idle/demo mode - AI plays the game
    pub idle_mode: bool,
}

const CATCH_PARTICLES: usize = 15;
const DEFLECT_PARTICLES: usize = 20;
const PICKUP_PARTICLES: usize = 20;
const LEVEL_UP_PARTICLES: usize = 100;

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    state.events.clear();

    match state.session.phase {
        GamePhase::Paused => {
            if input.quit {
                end_session(state);
            } else if input.pause {
                state.session.phase = GamePhase::Running;
                state.events.push(GameEvent::Resumed);
            }
            return;
        }
        GamePhase::Over => {
            if input.quit {
                state.exit_requested = true;
            } else if input.restart {
                state.reset();
                log::info!("Session restarted (high score {})", state.session.high_score);
                state.events.push(GameEvent::Restarted);
            }
            return;
        }
        GamePhase::Running => {
            if input.pause {
                state.session.phase = GamePhase::Paused;
                state.events.push(GameEvent::Paused);
                return;
            }
        }
    }

    state.time_ticks += 1;
    state.session.ticks += 1;

    // 1. Catcher
    let (left, right) = if input.idle_mode {
        autopilot(state)
    } else {
        (input.left, input.right)
    };
    state.catcher.steer(left, right, PLAYFIELD_WIDTH);

    // 2. Magnet
    if state.effects.is_active(PowerUpKind::Magnet) {
        apply_magnet(
            &state.catcher,
            &mut state.blocks,
            state.tuning.magnet_radius,
            state.tuning.magnet_step,
        );
    }

    // 3. Spawning
    if let Some(block) = state
        .spawner
        .maybe_spawn_block(&mut state.rng, &state.difficulty)
    {
        state.blocks.push(block);
    }
    if let Some(power_up) = state
        .spawner
        .maybe_spawn_power_up(&mut state.rng, &state.difficulty)
    {
        state.power_ups.push(power_up);
    }

    // 4. Movement
    state
        .blocks
        .iter_mut()
        .chain(state.power_ups.iter_mut())
        .for_each(FallingEntity::fall);

    // 5. Blocks
    let blocks = std::mem::take(&mut state.blocks);
    let resolution = resolve_blocks(
        &state.catcher,
        blocks,
        &state.effects,
        &mut state.session,
        &state.tuning,
        PLAYFIELD_HEIGHT,
    );
    state.blocks = resolution.survivors;
    state.events.extend(resolution.events);

    // 6. Power-ups
    let power_ups = std::mem::take(&mut state.power_ups);
    let resolution = resolve_power_ups(
        &state.catcher,
        power_ups,
        &mut state.effects,
        PLAYFIELD_HEIGHT,
    );
    state.power_ups = resolution.survivors;
    state.events.extend(resolution.events);

    // 7. Effects decay, then speeds for next tick
    state.effects.tick();
    state.effects.override_block_speeds(
        &mut state.blocks,
        state.difficulty.fall_speed,
        state.tuning.slow_motion_factor,
    );

    // 8. Progression
    let level = check_level_up(
        state.session.score,
        state.session.level,
        &state.tuning.level_thresholds,
    );
    if level > state.session.level {
        state.session.level = level;
        state.difficulty = Difficulty::for_level(level, &state.tuning);
        log::info!(
            "Level up: {} - {} (speed {}, spawn 1/{})",
            level,
            level_name(level),
            state.difficulty.fall_speed,
            state.difficulty.spawn_rate
        );
        state.events.push(GameEvent::LevelUp { level });
    }

    // 9. Terminal condition
    if state.session.is_dead() {
        end_session(state);
    }

    // 10. Cosmetics
    spawn_particles(state);
    state.particles.tick();
}

/// Running/Paused -> Over, folding the score into the high score and run table
fn end_session(state: &mut GameState) {
    state.session.end();
    let place = state.high_scores.record(RunRecord {
        score: state.session.score,
        level: state.session.level,
        ticks: state.session.ticks,
    });
    log::info!(
        "Game over: score {}, level {}, high score {}, place {:?}",
        state.session.score,
        state.session.level,
        state.session.high_score,
        place
    );
    state.events.push(GameEvent::GameOver {
        score: state.session.score,
        level: state.session.level,
    });
}

/// Particle bursts for this tick's events
fn spawn_particles(state: &mut GameState) {
    for event in &state.events {
        match *event {
            GameEvent::BlockCaught { grade, at, .. } => {
                state.particles.spawn(at, grade.color(), CATCH_PARTICLES);
            }
            GameEvent::Deflected { at, .. } => {
                state
                    .particles
                    .spawn(at, PowerUpKind::Shield.color(), DEFLECT_PARTICLES);
            }
            GameEvent::PowerUpCollected { kind, at } => {
                log::debug!("Picked up {}", kind.name());
                state.particles.spawn(at, kind.color(), PICKUP_PARTICLES);
            }
            GameEvent::LevelUp { level } => {
                let center = Vec2::new(PLAYFIELD_WIDTH / 2.0, PLAYFIELD_HEIGHT / 2.0);
                state
                    .particles
                    .spawn(center, level_color(level), LEVEL_UP_PARTICLES);
            }
            _ => {}
        }
    }
}

/// Demo-mode steering: chase the lowest helpful entity, dodge harmful ones
fn autopilot(state: &GameState) -> (bool, bool) {
    let catcher_x = state.catcher.center().x;
    let helpful = |e: &&FallingEntity| match e.kind {
        EntityKind::Block(grade) => !grade.is_harmful(),
        EntityKind::PowerUp(_) => true,
    };

    let target = state
        .blocks
        .iter()
        .chain(state.power_ups.iter())
        .filter(helpful)
        .filter(|e| e.pos.y < state.catcher.pos.y)
        .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y));

    // Sidestep a harmful block that is about to land on us
    let shielded = state.effects.is_active(PowerUpKind::Shield);
    let threat = state
        .blocks
        .iter()
        .filter(|e| !shielded && e.grade().is_some_and(|g| g.is_harmful()))
        .filter(|e| e.pos.y > state.catcher.pos.y - 120.0 && e.pos.y < state.catcher.pos.y)
        .find(|e| (e.center().x - catcher_x).abs() < state.catcher.width * 0.75);

    if let Some(threat) = threat {
        let go_left = threat.center().x >= catcher_x;
        let blocked = if go_left {
            state.catcher.pos.x <= 0.0
        } else {
            state.catcher.pos.x + state.catcher.width >= PLAYFIELD_WIDTH
        };
        let go_left = go_left != blocked;
        return (go_left, !go_left);
    }

    match target {
        Some(target) => {
            let dx = target.center().x - catcher_x;
            let deadband = state.catcher.speed / 2.0;
            (dx < -deadband, dx > deadband)
        }
        None => (false, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::Settings;
    use crate::sim::state::{BlockGrade, FallingEntity, SessionState};
    use crate::tuning::Tuning;

    fn new_state(seed: u64) -> GameState {
        GameState::new(seed, Tuning::default(), &Settings::default()).unwrap()
    }

    /// State that never spawns on its own
    fn quiet_state() -> GameState {
        let mut tuning = Tuning::default();
        tuning.base_spawn_rate = u32::MAX;
        tuning.power_up_chance = 0.0;
        GameState::new(1, tuning, &Settings::default()).unwrap()
    }

    fn block_above_catcher(state: &GameState, id: u32, grade: BlockGrade) -> FallingEntity {
        let mut block = FallingEntity::spawn(
            id,
            EntityKind::Block(grade),
            0.0,
            state.difficulty.fall_speed,
            PLAYFIELD_WIDTH,
        );
        // One fall step from overlapping
        block.pos = state.catcher.pos + Vec2::new(30.0, -ENTITY_SIZE - 1.0);
        block
    }

    #[test]
    fn test_tick_pause() {
        let mut state = new_state(12345);
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };

        tick(&mut state, &pause);
        assert_eq!(state.session.phase, GamePhase::Paused);
        assert_eq!(state.events, vec![GameEvent::Paused]);

        // Paused ticks freeze the world
        let frozen = state.time_ticks;
        tick(&mut state, &TickInput::default());
        tick(&mut state, &TickInput::default());
        assert_eq!(state.time_ticks, frozen);

        tick(&mut state, &pause);
        assert_eq!(state.session.phase, GamePhase::Running);
    }

    #[test]
    fn test_quit_while_paused_ends_session() {
        let mut state = new_state(1);
        state.session.score = 300;
        tick(&mut state, &TickInput {
            pause: true,
            ..Default::default()
        });
        tick(&mut state, &TickInput {
            quit: true,
            ..Default::default()
        });
        assert_eq!(state.session.phase, GamePhase::Over);
        assert_eq!(state.session.high_score, 300);
        assert!(!state.exit_requested);

        tick(&mut state, &TickInput {
            quit: true,
            ..Default::default()
        });
        assert!(state.exit_requested);
    }

    #[test]
    fn test_quit_while_running_is_ignored() {
        let mut state = new_state(1);
        tick(&mut state, &TickInput {
            quit: true,
            ..Default::default()
        });
        assert_eq!(state.session.phase, GamePhase::Running);
        assert!(!state.exit_requested);
    }

    #[test]
    fn test_game_over_and_restart() {
        let mut state = quiet_state();
        state.session.high_score = 50;
        state.session.score = 120;
        state.session.health = 10;
        let block = block_above_catcher(&state, 1, BlockGrade::Bomb);
        state.blocks.push(block);
        state.effects.activate(PowerUpKind::Magnet);

        tick(&mut state, &TickInput::default());
        assert_eq!(state.session.health, 0);
        assert_eq!(state.session.phase, GamePhase::Over);
        assert_eq!(state.session.score, 90);
        assert_eq!(state.session.high_score, 90);
        assert!(state
            .events
            .contains(&GameEvent::GameOver { score: 90, level: 1 }));
        assert_eq!(
            state.high_scores.runs(),
            &[RunRecord {
                score: 90,
                level: 1,
                ticks: 1,
            }]
        );

        // Only restart or quit do anything now
        tick(&mut state, &TickInput {
            pause: true,
            ..Default::default()
        });
        assert_eq!(state.session.phase, GamePhase::Over);

        tick(&mut state, &TickInput {
            restart: true,
            ..Default::default()
        });
        assert_eq!(state.session, SessionState {
            high_score: 90,
            ..Default::default()
        });
        assert!(state.blocks.is_empty());
        assert!(state.power_ups.is_empty());
        assert!(state.effects.active().next().is_none());
        assert_eq!(state.difficulty, Difficulty::initial(&state.tuning));
        assert!(state.particles.is_empty());
        // The run table outlives the session
        assert_eq!(state.high_scores.runs().len(), 1);
    }

    #[test]
    fn test_high_score_keeps_max() {
        let mut state = quiet_state();
        state.session.high_score = 1000;
        state.session.score = 10;
        state.session.health = 0;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.session.phase, GamePhase::Over);
        assert_eq!(state.session.high_score, 1000);
    }

    #[test]
    fn test_catch_in_tick_scores_and_consumes() {
        let mut state = quiet_state();
        let block = block_above_catcher(&state, 1, BlockGrade::Special);
        state.blocks.push(block);
        state.session.health = 50;

        tick(&mut state, &TickInput::default());
        assert_eq!(state.session.score, 20);
        assert_eq!(state.session.health, 55);
        assert!(state.blocks.is_empty());
        assert!(!state.particles.is_empty());
    }

    #[test]
    fn test_missed_block_in_tick() {
        let mut state = quiet_state();
        let mut block = block_above_catcher(&state, 1, BlockGrade::Bomb);
        block.pos = Vec2::new(0.0, PLAYFIELD_HEIGHT - 1.0);
        state.blocks.push(block);

        tick(&mut state, &TickInput::default());
        assert!(state.blocks.is_empty());
        assert_eq!(state.session.score, 0);
        assert_eq!(state.session.health, 100);
    }

    #[test]
    fn test_slow_motion_overrides_speed_after_tick() {
        let mut state = quiet_state();
        let mut block = block_above_catcher(&state, 1, BlockGrade::Good);
        block.pos = Vec2::new(0.0, 10.0);
        block.speed = 3.5;
        state.blocks.push(block);
        state.effects.activate(PowerUpKind::SlowMotion);

        tick(&mut state, &TickInput::default());
        // Moved by its own speed this tick, forced afterwards
        assert_eq!(state.blocks[0].pos.y, 13.5);
        assert_eq!(state.blocks[0].speed, 1.5);

        state.effects.clear();
        tick(&mut state, &TickInput::default());
        assert_eq!(state.blocks[0].pos.y, 15.0);
        assert_eq!(state.blocks[0].speed, 3.0);
    }

    #[test]
    fn test_magnet_pulls_only_while_active() {
        let fall = Vec2::new(0.0, 3.0);
        let start = |state: &GameState| {
            let mut block = block_above_catcher(state, 1, BlockGrade::Good);
            // Center 128 units from the catcher center, inside the radius
            block.pos = state.catcher.center() + Vec2::new(-100.0, -80.0) - Vec2::splat(15.0);
            block
        };

        let mut state = quiet_state();
        let block = start(&state);
        state.blocks.push(block.clone());
        tick(&mut state, &TickInput::default());
        assert_eq!(state.blocks[0].pos - block.pos, fall);

        let mut state = quiet_state();
        state.blocks.push(block.clone());
        state.effects.activate(PowerUpKind::Magnet);
        tick(&mut state, &TickInput::default());
        let pull = state.blocks[0].pos - block.pos - fall;
        assert!((pull.length() - 5.0).abs() < 1e-3, "pull {pull:?}");
        // Toward the catcher: right and down
        assert!(pull.x > 0.0 && pull.y > 0.0);

        // Expired magnet stops pulling
        state.effects.clear();
        let before = state.blocks[0].pos;
        tick(&mut state, &TickInput::default());
        assert_eq!(state.blocks[0].pos - before, fall);
    }

    #[test]
    fn test_level_up_in_tick() {
        let mut state = quiet_state();
        state.session.score = 1500;

        tick(&mut state, &TickInput::default());
        assert_eq!(state.session.level, 2);
        assert_eq!(state.difficulty.fall_speed, 5.0);
        assert!(state.events.contains(&GameEvent::LevelUp { level: 2 }));

        tick(&mut state, &TickInput::default());
        assert_eq!(state.session.level, 3);
        assert_eq!(state.difficulty.fall_speed, 6.0);

        tick(&mut state, &TickInput::default());
        assert_eq!(state.session.level, 3);
    }

    #[test]
    fn test_catcher_moves_and_clamps() {
        let mut state = quiet_state();
        let left = TickInput {
            left: true,
            ..Default::default()
        };
        tick(&mut state, &left);
        assert_eq!(state.catcher.pos.x, 342.0);
        for _ in 0..100 {
            tick(&mut state, &left);
        }
        assert_eq!(state.catcher.pos.x, 0.0);
    }

    #[test]
    fn test_determinism() {
        // Two states with same seed should produce identical results
        let mut state1 = new_state(99999);
        let mut state2 = new_state(99999);

        let inputs = [
            TickInput {
                left: true,
                ..Default::default()
            },
            TickInput {
                right: true,
                ..Default::default()
            },
            TickInput::default(),
        ];

        for i in 0..600 {
            let input = &inputs[i % inputs.len()];
            tick(&mut state1, input);
            tick(&mut state2, input);
        }

        assert_eq!(state1.time_ticks, state2.time_ticks);
        assert_eq!(state1.blocks, state2.blocks);
        assert_eq!(state1.power_ups, state2.power_ups);
        assert_eq!(state1.session, state2.session);
    }

    #[test]
    fn test_invariants_over_long_demo_run() {
        let mut state = new_state(2024);
        let demo = TickInput {
            idle_mode: true,
            ..Default::default()
        };
        let mut last_level = state.session.level;

        for _ in 0..20_000 {
            tick(&mut state, &demo);
            assert!((0..=MAX_HEALTH).contains(&state.session.health));
            assert!(state.session.level >= last_level);
            last_level = state.session.level;
            assert!(state.catcher.pos.x >= 0.0);
            assert!(state.catcher.pos.x <= PLAYFIELD_WIDTH - CATCHER_WIDTH);
            assert!(state.blocks.iter().all(|b| b.pos.y <= PLAYFIELD_HEIGHT));
            if state.session.phase == GamePhase::Over {
                assert!(state.session.high_score >= state.session.score);
                tick(&mut state, &TickInput {
                    restart: true,
                    ..Default::default()
                });
                last_level = 1;
            }
        }
    }

    #[test]
    fn test_autopilot_chases_good_block() {
        let mut state = quiet_state();
        let mut block = block_above_catcher(&state, 1, BlockGrade::Good);
        block.pos = Vec2::new(700.0, 100.0);
        state.blocks.push(block);
        assert_eq!(autopilot(&state), (false, true));

        state.blocks[0].pos.x = 10.0;
        assert_eq!(autopilot(&state), (true, false));
    }

    #[test]
    fn test_autopilot_dodges_bomb() {
        let mut state = quiet_state();
        let mut bomb = block_above_catcher(&state, 1, BlockGrade::Bomb);
        bomb.pos.x = state.catcher.center().x - 5.0;
        state.blocks.push(bomb);
        let (left, right) = autopilot(&state);
        assert!(left ^ right);

        state.effects.activate(PowerUpKind::Shield);
        assert_eq!(autopilot(&state), (false, false));
    }
}
