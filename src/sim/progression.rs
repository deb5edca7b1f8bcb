//! Level progression and difficulty scaling

use serde::{Deserialize, Serialize};

use super::state::ColorTag;
use crate::tuning::Tuning;

const LEVEL_NAMES: [&str; 5] = ["Beginner", "Intermediate", "Advanced", "Expert", "Master"];
const LEVEL_COLORS: [ColorTag; 5] = [
    ColorTag::Blue,
    ColorTag::Green,
    ColorTag::Purple,
    ColorTag::Orange,
    ColorTag::Red,
];

/// Parameters that scale with level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difficulty {
    /// Base block fall speed (units per tick)
    pub fall_speed: f32,
    /// A block spawns with probability 1/spawn_rate per tick
    pub spawn_rate: u32,
}

impl Difficulty {
    /// Session start values
    pub fn initial(tuning: &Tuning) -> Self {
        Self {
            fall_speed: tuning.base_fall_speed,
            spawn_rate: tuning.base_spawn_rate,
        }
    }

    /// Values after reaching `level`
    pub fn for_level(level: u32, tuning: &Tuning) -> Self {
        let spawn_rate = tuning
            .base_spawn_rate
            .saturating_sub(tuning.spawn_rate_per_level.saturating_mul(level))
            .max(tuning.min_spawn_rate);
        Self {
            fall_speed: tuning.base_fall_speed + tuning.fall_speed_per_level * level as f32,
            spawn_rate,
        }
    }
}

/// Next level for `score`, advancing at most one threshold per call
///
/// Returns `current` when no threshold above it has been reached. A score
/// that jumps several thresholds catches up over consecutive calls.
pub fn check_level_up(score: i64, current: u32, thresholds: &[i64]) -> u32 {
    thresholds
        .iter()
        .enumerate()
        .map(|(i, &threshold)| (i as u32 + 1, threshold))
        .find(|&(level, threshold)| score >= threshold && level > current)
        .map_or(current, |(level, _)| level)
}

pub fn level_name(level: u32) -> &'static str {
    let i = (level.max(1) as usize - 1).min(LEVEL_NAMES.len() - 1);
    LEVEL_NAMES[i]
}

pub fn level_color(level: u32) -> ColorTag {
    let i = (level.max(1) as usize - 1).min(LEVEL_COLORS.len() - 1);
    LEVEL_COLORS[i]
}
