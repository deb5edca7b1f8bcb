//! Game state and core simulation types
//!
//! Everything a tick reads or writes lives in [`GameState`]. There are no
//! process-wide singletons; the loop owns one state and passes it down.

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::collision::Rect;
use super::effects::EffectTracker;
use super::particles::{Particle, ParticleSystem};
use super::progression::Difficulty;
use super::spawner::Spawner;
use crate::consts::*;
use crate::highscores::HighScores;
use crate::settings::Settings;
use crate::tuning::{Tuning, TuningError};

/// Cosmetic color tag carried by entities and particles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColorTag {
    White,
    Black,
    Red,
    Green,
    Blue,
    Yellow,
    Orange,
    Purple,
    Cyan,
    Pink,
}

/// Block types, in spawn-table order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlockGrade {
    /// Plain positive block
    Good,
    /// Negative block, deals default damage
    Bad,
    /// Positive block that heals a little
    Special,
    /// Rare high-value block that heals
    Bonus,
    /// Very rare hazard with heavy damage
    Bomb,
}

impl BlockGrade {
    pub const ALL: [BlockGrade; 5] = [
        BlockGrade::Good,
        BlockGrade::Bad,
        BlockGrade::Special,
        BlockGrade::Bonus,
        BlockGrade::Bomb,
    ];

    /// Signed score delta when caught
    pub fn points(self) -> i64 {
        match self {
            BlockGrade::Good => 10,
            BlockGrade::Bad => -10,
            BlockGrade::Special => 20,
            BlockGrade::Bonus => 50,
            BlockGrade::Bomb => -30,
        }
    }

    /// Health restored when caught
    pub fn heal(self) -> Option<i32> {
        match self {
            BlockGrade::Special => Some(5),
            BlockGrade::Bonus => Some(10),
            _ => None,
        }
    }

    /// Explicit health damage when caught
    pub fn damage(self) -> Option<i32> {
        match self {
            BlockGrade::Bomb => Some(20),
            _ => None,
        }
    }

    /// Negative blocks are the ones a shield deflects
    pub fn is_harmful(self) -> bool {
        self.points() < 0
    }

    pub fn color(self) -> ColorTag {
        match self {
            BlockGrade::Good => ColorTag::Green,
            BlockGrade::Bad => ColorTag::Red,
            BlockGrade::Special => ColorTag::Yellow,
            BlockGrade::Bonus => ColorTag::Orange,
            BlockGrade::Bomb => ColorTag::Black,
        }
    }
}

/// Power-up types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    SlowMotion,
    DoublePoints,
    Magnet,
    Shield,
}

impl PowerUpKind {
    pub const ALL: [PowerUpKind; 4] = [
        PowerUpKind::SlowMotion,
        PowerUpKind::DoublePoints,
        PowerUpKind::Magnet,
        PowerUpKind::Shield,
    ];

    /// Stable slot index for per-kind tables
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            PowerUpKind::SlowMotion => "Slow Motion",
            PowerUpKind::DoublePoints => "Double Points",
            PowerUpKind::Magnet => "Magnet",
            PowerUpKind::Shield => "Shield",
        }
    }

    pub fn color(self) -> ColorTag {
        match self {
            PowerUpKind::SlowMotion => ColorTag::Cyan,
            PowerUpKind::DoublePoints => ColorTag::Yellow,
            PowerUpKind::Magnet => ColorTag::Pink,
            PowerUpKind::Shield => ColorTag::Purple,
        }
    }
}

/// What a falling entity is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Block(BlockGrade),
    PowerUp(PowerUpKind),
}

impl EntityKind {
    pub fn color(self) -> ColorTag {
        match self {
            EntityKind::Block(grade) => grade.color(),
            EntityKind::PowerUp(kind) => kind.color(),
        }
    }
}

/// A falling block or power-up
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallingEntity {
    pub id: u32,
    pub kind: EntityKind,
    /// Top-left corner
    pub pos: Vec2,
    /// Units per tick, downward
    pub speed: f32,
    pub size: f32,
}

impl FallingEntity {
    /// Create an entity at the top edge, x clamped into the playfield
    pub fn spawn(id: u32, kind: EntityKind, x: f32, speed: f32, playfield_width: f32) -> Self {
        let max_x = (playfield_width - ENTITY_SIZE).max(0.0);
        Self {
            id,
            kind,
            pos: Vec2::new(x.clamp(0.0, max_x), 0.0),
            speed,
            size: ENTITY_SIZE,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos, Vec2::splat(self.size))
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    /// Advance by current fall speed
    #[inline]
    pub fn fall(&mut self) {
        self.pos.y += self.speed;
    }

    pub fn grade(&self) -> Option<BlockGrade> {
        match self.kind {
            EntityKind::Block(grade) => Some(grade),
            EntityKind::PowerUp(_) => None,
        }
    }
}

/// The player's catcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Catcher {
    /// Top-left corner; y never changes
    pub pos: Vec2,
    pub width: f32,
    pub height: f32,
    /// Units per tick
    pub speed: f32,
}

impl Default for Catcher {
    fn default() -> Self {
        Self {
            pos: Vec2::new(
                (PLAYFIELD_WIDTH / 2.0 - CATCHER_WIDTH / 2.0).floor(),
                PLAYFIELD_HEIGHT - CATCHER_BOTTOM_OFFSET,
            ),
            width: CATCHER_WIDTH,
            height: CATCHER_HEIGHT,
            speed: CATCHER_SPEED,
        }
    }
}

impl Catcher {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.pos, Vec2::new(self.width, self.height))
    }

    pub fn center(&self) -> Vec2 {
        self.bounds().center()
    }

    /// Apply held directions, clamped to the playfield
    pub fn steer(&mut self, left: bool, right: bool, playfield_width: f32) {
        if left {
            self.pos.x -= self.speed;
        }
        if right {
            self.pos.x += self.speed;
        }
        self.pos.x = self.pos.x.clamp(0.0, (playfield_width - self.width).max(0.0));
    }
}

/// Current phase of play
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Active gameplay
    Running,
    /// Game is paused
    Paused,
    /// Session ended, waiting for restart or quit
    Over,
}

/// Score, health, level and phase of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub score: i64,
    /// Always within [0, MAX_HEALTH]
    pub health: i32,
    /// 1-based, never decreases within a session
    pub level: u32,
    /// Best score this process run
    pub high_score: i64,
    pub phase: GamePhase,
    /// Running ticks survived
    pub ticks: u64,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            score: 0,
            health: MAX_HEALTH,
            level: 1,
            high_score: 0,
            phase: GamePhase::Running,
            ticks: 0,
        }
    }
}

impl SessionState {
    /// Apply a heal (positive) or damage (negative), clamped
    pub fn change_health(&mut self, delta: i32) {
        self.health = self.health.saturating_add(delta).clamp(0, MAX_HEALTH);
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    /// Move to Over, folding the score into the high score
    pub fn end(&mut self) {
        self.high_score = self.high_score.max(self.score);
        self.phase = GamePhase::Over;
    }

    /// Fresh session, keeping the high score
    pub fn reset(&mut self) {
        *self = Self {
            high_score: self.high_score,
            ..Self::default()
        };
    }
}

/// Things that happened during a tick, for audio and logging
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    /// Block caught and scored (points already include any doubling)
    BlockCaught {
        grade: BlockGrade,
        points: i64,
        at: Vec2,
    },
    /// Harmful block bounced off the shield
    Deflected { grade: BlockGrade, at: Vec2 },
    /// Entity fell past the bottom edge
    Missed { kind: EntityKind },
    PowerUpCollected { kind: PowerUpKind, at: Vec2 },
    LevelUp { level: u32 },
    Paused,
    Resumed,
    GameOver { score: i64, level: u32 },
    Restarted,
}

/// Immutable per-frame view handed to presentation
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot<'a> {
    pub tick: u64,
    pub catcher: &'a Catcher,
    pub blocks: &'a [FallingEntity],
    pub power_ups: &'a [FallingEntity],
    pub effects: &'a EffectTracker,
    pub session: &'a SessionState,
    pub difficulty: &'a Difficulty,
    pub particles: &'a [Particle],
    pub high_scores: &'a HighScores,
}

/// Complete game state (deterministic for a given seed and input stream)
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// Gameplay RNG (spawning only)
    pub(crate) rng: Pcg32,
    pub tuning: Tuning,
    /// Simulation tick counter (running ticks only)
    pub time_ticks: u64,
    pub session: SessionState,
    pub difficulty: Difficulty,
    pub catcher: Catcher,
    pub blocks: Vec<FallingEntity>,
    pub power_ups: Vec<FallingEntity>,
    pub effects: EffectTracker,
    pub spawner: Spawner,
    /// Visual particles (not gameplay-affecting)
    pub particles: ParticleSystem,
    /// Finished runs, kept across restarts
    pub high_scores: HighScores,
    /// Events raised by the most recent tick
    pub events: Vec<GameEvent>,
    /// Quit was requested from the Over screen
    pub exit_requested: bool,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64, tuning: Tuning, settings: &Settings) -> Result<Self, TuningError> {
        tuning.validate()?;
        let spawner = Spawner::new(&tuning, PLAYFIELD_WIDTH)?;

        Ok(Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            time_ticks: 0,
            session: SessionState::default(),
            difficulty: Difficulty::initial(&tuning),
            catcher: Catcher::default(),
            blocks: Vec::new(),
            power_ups: Vec::new(),
            effects: EffectTracker::new(&tuning.effect_durations),
            spawner,
            particles: ParticleSystem::new(seed, settings.max_particles()),
            high_scores: HighScores::new(),
            events: Vec::new(),
            exit_requested: false,
            tuning,
        })
    }

    /// Full session reset; the high score and the run table survive
    pub fn reset(&mut self) {
        self.session.reset();
        self.difficulty = Difficulty::initial(&self.tuning);
        self.catcher = Catcher::default();
        self.blocks.clear();
        self.power_ups.clear();
        self.effects.clear();
        self.particles.clear();
        self.exit_requested = false;
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            tick: self.time_ticks,
            catcher: &self.catcher,
            blocks: &self.blocks,
            power_ups: &self.power_ups,
            effects: &self.effects,
            session: &self.session,
            difficulty: &self.difficulty,
            particles: self.particles.particles(),
            high_scores: &self.high_scores,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_grade_table_matches_classic_values() {
        let points: Vec<i64> = BlockGrade::ALL.iter().map(|g| g.points()).collect();
        assert_eq!(points, vec![10, -10, 20, 50, -30]);
        assert_eq!(BlockGrade::Bomb.damage(), Some(20));
        assert_eq!(BlockGrade::Bad.damage(), None);
        assert_eq!(BlockGrade::Bonus.heal(), Some(10));
        assert!(BlockGrade::Bad.is_harmful());
        assert!(!BlockGrade::Special.is_harmful());
    }

    #[test]
    fn test_power_up_indices_are_dense() {
        for (i, kind) in PowerUpKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_spawn_clamps_x() {
        let kind = EntityKind::Block(BlockGrade::Good);
        let e = FallingEntity::spawn(1, kind, 900.0, 3.0, PLAYFIELD_WIDTH);
        assert_eq!(e.pos.x, PLAYFIELD_WIDTH - ENTITY_SIZE);
        let e = FallingEntity::spawn(2, kind, -5.0, 3.0, PLAYFIELD_WIDTH);
        assert_eq!(e.pos.x, 0.0);
        assert_eq!(e.pos.y, 0.0);
    }

    #[test]
    fn test_catcher_steer_clamps() {
        let mut catcher = Catcher::default();
        assert_eq!(catcher.pos, Vec2::new(350.0, 570.0));
        for _ in 0..100 {
            catcher.steer(true, false, PLAYFIELD_WIDTH);
        }
        assert_eq!(catcher.pos.x, 0.0);
        for _ in 0..200 {
            catcher.steer(false, true, PLAYFIELD_WIDTH);
        }
        assert_eq!(catcher.pos.x, PLAYFIELD_WIDTH - CATCHER_WIDTH);
        // Both held cancel out
        catcher.steer(true, true, PLAYFIELD_WIDTH);
        assert_eq!(catcher.pos.x, PLAYFIELD_WIDTH - CATCHER_WIDTH);
    }

    #[test]
    fn test_session_end_and_reset_keep_high_score() {
        let mut session = SessionState {
            score: 420,
            high_score: 100,
            ..Default::default()
        };
        session.end();
        assert_eq!(session.phase, GamePhase::Over);
        assert_eq!(session.high_score, 420);

        session.reset();
        assert_eq!(session, SessionState {
            high_score: 420,
            ..Default::default()
        });

        session.score = 50;
        session.end();
        assert_eq!(session.high_score, 420);
    }

    #[test]
    fn test_snapshot_serializes() {
        let state = GameState::new(7, Tuning::default(), &Settings::default()).unwrap();
        let json = serde_json::to_value(state.snapshot()).unwrap();
        assert_eq!(json["session"]["health"], 100);
        assert_eq!(json["session"]["phase"], "Running");
        assert!(json["blocks"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_invalid_tuning_rejected() {
        let mut tuning = Tuning::default();
        tuning.level_thresholds = vec![5];
        assert!(GameState::new(1, tuning, &Settings::default()).is_err());
    }

    proptest! {
        #[test]
        fn prop_health_stays_clamped(deltas in prop::collection::vec(-200i32..200, 0..50)) {
            let mut session = SessionState::default();
            for delta in deltas {
                session.change_health(delta);
                prop_assert!((0..=MAX_HEALTH).contains(&session.health));
            }
        }
    }
}
