//! Per-tick entity spawning

use rand::Rng;

use super::progression::Difficulty;
use super::state::{BlockGrade, EntityKind, FallingEntity, PowerUpKind};
use super::weighted::WeightedTable;
use crate::consts::ENTITY_SIZE;
use crate::tuning::{Tuning, TuningError};

/// Decides whether and what enters the playfield each tick
#[derive(Debug, Clone)]
pub struct Spawner {
    grades: WeightedTable<BlockGrade>,
    power_up_chance: f64,
    power_up_speed_factor: f32,
    speed_jitter: (f32, f32),
    playfield_width: f32,
    next_id: u32,
}

impl Spawner {
    pub fn new(tuning: &Tuning, playfield_width: f32) -> Result<Self, TuningError> {
        let w = &tuning.grade_weights;
        let grades = WeightedTable::new([
            (BlockGrade::Good, w.good),
            (BlockGrade::Bad, w.bad),
            (BlockGrade::Special, w.special),
            (BlockGrade::Bonus, w.bonus),
            (BlockGrade::Bomb, w.bomb),
        ])?;

        Ok(Self {
            grades,
            power_up_chance: tuning.power_up_chance,
            power_up_speed_factor: tuning.power_up_speed_factor,
            speed_jitter: tuning.block_speed_jitter,
            playfield_width,
            next_id: 1,
        })
    }

    /// Allocate a new entity ID
    fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Uniform integer x such that the entity fits the playfield
    fn random_x<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        let max_x = (self.playfield_width - ENTITY_SIZE).max(0.0) as u32;
        rng.random_range(0..=max_x) as f32
    }

    /// Pick a grade from the weight table
    pub fn pick_grade<R: Rng + ?Sized>(&self, rng: &mut R) -> BlockGrade {
        self.grades.sample(rng)
    }

    /// Bernoulli 1/spawn_rate, then a weighted grade with jittered speed
    pub fn maybe_spawn_block<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        difficulty: &Difficulty,
    ) -> Option<FallingEntity> {
        if rng.random_range(1..=difficulty.spawn_rate.max(1)) != 1 {
            return None;
        }

        let grade = self.pick_grade(rng);
        let x = self.random_x(rng);
        let (lo, hi) = self.speed_jitter;
        let factor = lo + (hi - lo) * rng.random::<f32>();
        let id = self.next_entity_id();

        log::trace!("Spawned {:?} block #{} at x={}", grade, id, x);
        Some(FallingEntity::spawn(
            id,
            EntityKind::Block(grade),
            x,
            difficulty.fall_speed * factor,
            self.playfield_width,
        ))
    }

    /// Fixed-chance power-up, uniform over kinds, slower than blocks
    pub fn maybe_spawn_power_up<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        difficulty: &Difficulty,
    ) -> Option<FallingEntity> {
        if !rng.random_bool(self.power_up_chance) {
            return None;
        }

        let kind = PowerUpKind::ALL[rng.random_range(0..PowerUpKind::ALL.len())];
        let x = self.random_x(rng);
        let id = self.next_entity_id();

        log::trace!("Spawned {:?} power-up #{} at x={}", kind, id, x);
        Some(FallingEntity::spawn(
            id,
            EntityKind::PowerUp(kind),
            x,
            difficulty.fall_speed * self.power_up_speed_factor,
            self.playfield_width,
        ))
    }
}
