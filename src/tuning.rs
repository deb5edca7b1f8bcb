//! Data-driven game balance
//!
//! Every number that shapes difficulty lives here so it can be tweaked from a
//! config file. Defaults reproduce the classic arcade feel.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sim::WeightError;

/// Relative spawn weights, in declaration order of [`crate::sim::BlockGrade`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradeWeights {
    pub good: u32,
    pub bad: u32,
    pub special: u32,
    pub bonus: u32,
    pub bomb: u32,
}

impl Default for GradeWeights {
    fn default() -> Self {
        Self {
            good: 60,
            bad: 25,
            special: 10,
            bonus: 4,
            bomb: 1,
        }
    }
}

/// Power-up durations in ticks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectDurations {
    pub slow_motion: u32,
    pub double_points: u32,
    pub magnet: u32,
    pub shield: u32,
}

impl Default for EffectDurations {
    fn default() -> Self {
        Self {
            slow_motion: 300,
            double_points: 450,
            magnet: 600,
            shield: 500,
        }
    }
}

/// Balance parameters for a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub grade_weights: GradeWeights,
    pub effect_durations: EffectDurations,

    // === Spawning ===
    /// Per-tick power-up spawn probability
    pub power_up_chance: f64,
    /// Power-up fall speed relative to the base fall speed
    pub power_up_speed_factor: f32,
    /// Random block speed factor range (min, max)
    pub block_speed_jitter: (f32, f32),

    // === Difficulty ===
    /// Score needed to reach each level (index 0 is level 1)
    pub level_thresholds: Vec<i64>,
    pub base_fall_speed: f32,
    pub fall_speed_per_level: f32,
    pub base_spawn_rate: u32,
    pub spawn_rate_per_level: u32,
    pub min_spawn_rate: u32,

    // === Effects ===
    pub slow_motion_factor: f32,
    pub magnet_radius: f32,
    pub magnet_step: f32,
    pub shield_bonus: i64,

    /// Damage dealt by negative blocks that carry no explicit damage
    pub default_damage: i32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            grade_weights: GradeWeights::default(),
            effect_durations: EffectDurations::default(),

            power_up_chance: 0.01,
            power_up_speed_factor: 0.8,
            block_speed_jitter: (0.8, 1.2),

            level_thresholds: vec![0, 500, 1000, 2000, 5000],
            base_fall_speed: 3.0,
            fall_speed_per_level: 1.0,
            base_spawn_rate: 30,
            spawn_rate_per_level: 3,
            min_spawn_rate: 5,

            slow_motion_factor: 0.5,
            magnet_radius: 150.0,
            magnet_step: 5.0,
            shield_bonus: 5,

            default_damage: 10,
        }
    }
}

impl Tuning {
    /// Highest reachable level
    pub fn max_level(&self) -> u32 {
        self.level_thresholds.len() as u32
    }

    /// Reject balance tables that would break simulation invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        let w = &self.grade_weights;
        let total = [w.good, w.bad, w.special, w.bonus, w.bomb]
            .iter()
            .try_fold(0u32, |acc, &x| acc.checked_add(x))
            .ok_or(TuningError::WeightOverflow)?;
        if total == 0 {
            return Err(TuningError::ZeroWeights);
        }

        if !(0.0..=1.0).contains(&self.power_up_chance) {
            return Err(TuningError::Probability(self.power_up_chance));
        }

        let (lo, hi) = self.block_speed_jitter;
        if !(lo > 0.0 && lo <= hi) {
            return Err(TuningError::Jitter(lo, hi));
        }

        match self.level_thresholds.first() {
            None => return Err(TuningError::NoLevels),
            Some(&first) if first != 0 => return Err(TuningError::FirstThreshold(first)),
            _ => {}
        }
        if let Some(i) = self
            .level_thresholds
            .windows(2)
            .position(|pair| pair[0] >= pair[1])
        {
            return Err(TuningError::ThresholdOrder(i + 1));
        }

        if self.min_spawn_rate == 0 || self.base_spawn_rate == 0 {
            return Err(TuningError::ZeroSpawnRate);
        }

        for (name, value) in [
            ("base_fall_speed", self.base_fall_speed),
            ("power_up_speed_factor", self.power_up_speed_factor),
            ("slow_motion_factor", self.slow_motion_factor),
            ("magnet_step", self.magnet_step),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(TuningError::NonPositive(name));
            }
        }
        if !(self.magnet_radius.is_finite() && self.magnet_radius >= 0.0) {
            return Err(TuningError::NonPositive("magnet_radius"));
        }

        // A negative per-level speed eventually stops blocks from ever falling out
        if !(self.fall_speed_per_level.is_finite() && self.fall_speed_per_level >= 0.0) {
            return Err(TuningError::Negative("fall_speed_per_level"));
        }
        if self.default_damage < 0 {
            return Err(TuningError::Negative("default_damage"));
        }
        if self.shield_bonus < 0 {
            return Err(TuningError::Negative("shield_bonus"));
        }

        Ok(())
    }
}

/// Invalid balance configuration (fatal at startup)
#[derive(Debug, Clone, PartialEq)]
pub enum TuningError {
    /// All grade weights are zero
    ZeroWeights,
    /// Grade weights sum past `u32::MAX`
    WeightOverflow,
    /// Power-up chance outside [0, 1]
    Probability(f64),
    /// Speed jitter range empty or non-positive
    Jitter(f32, f32),
    /// Threshold table is empty
    NoLevels,
    /// Level 1 must start at score 0
    FirstThreshold(i64),
    /// Threshold at this index does not ascend
    ThresholdOrder(usize),
    /// A spawn rate denominator is zero
    ZeroSpawnRate,
    /// Named parameter must be positive
    NonPositive(&'static str),
    /// Named parameter must not be negative
    Negative(&'static str),
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::ZeroWeights => write!(f, "grade weights sum to zero"),
            TuningError::WeightOverflow => write!(f, "grade weights overflow u32"),
            TuningError::Probability(p) => {
                write!(f, "power-up chance {p} is outside [0, 1]")
            }
            TuningError::Jitter(lo, hi) => {
                write!(f, "block speed jitter ({lo}, {hi}) is not a positive range")
            }
            TuningError::NoLevels => write!(f, "level threshold table is empty"),
            TuningError::FirstThreshold(t) => {
                write!(f, "first level threshold must be 0, got {t}")
            }
            TuningError::ThresholdOrder(i) => {
                write!(f, "level threshold {i} is not strictly ascending")
            }
            TuningError::ZeroSpawnRate => write!(f, "spawn rate denominators must be >= 1"),
            TuningError::NonPositive(name) => write!(f, "{name} must be positive"),
            TuningError::Negative(name) => write!(f, "{name} must not be negative"),
        }
    }
}

impl std::error::Error for TuningError {}

impl From<WeightError> for TuningError {
    fn from(e: WeightError) -> Self {
        match e {
            WeightError::Empty | WeightError::ZeroTotal => TuningError::ZeroWeights,
            WeightError::Overflow => TuningError::WeightOverflow,
        }
    }
}
