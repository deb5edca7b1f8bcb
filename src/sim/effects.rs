//! Timed power-up effects

use serde::{Deserialize, Serialize};

use super::state::{EntityKind, FallingEntity, PowerUpKind};
use crate::tuning::EffectDurations;

/// Remaining ticks per power-up kind (0 = inactive)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectTracker {
    remaining: [u32; 4],
    durations: [u32; 4],
}

impl EffectTracker {
    pub fn new(durations: &EffectDurations) -> Self {
        let mut table = [0; 4];
        table[PowerUpKind::SlowMotion.index()] = durations.slow_motion;
        table[PowerUpKind::DoublePoints.index()] = durations.double_points;
        table[PowerUpKind::Magnet.index()] = durations.magnet;
        table[PowerUpKind::Shield.index()] = durations.shield;
        Self {
            remaining: [0; 4],
            durations: table,
        }
    }

    /// Start or restart an effect at full duration (never additive)
    pub fn activate(&mut self, kind: PowerUpKind) {
        self.remaining[kind.index()] = self.durations[kind.index()];
    }

    #[inline]
    pub fn is_active(&self, kind: PowerUpKind) -> bool {
        self.remaining[kind.index()] > 0
    }

    pub fn remaining(&self, kind: PowerUpKind) -> u32 {
        self.remaining[kind.index()]
    }

    /// Active effects with their remaining ticks
    pub fn active(&self) -> impl Iterator<Item = (PowerUpKind, u32)> + '_ {
        PowerUpKind::ALL
            .into_iter()
            .map(|kind| (kind, self.remaining(kind)))
            .filter(|&(_, ticks)| ticks > 0)
    }

    /// Decrement every active effect by one tick
    pub fn tick(&mut self) {
        for ticks in &mut self.remaining {
            *ticks = ticks.saturating_sub(1);
        }
    }

    pub fn clear(&mut self) {
        self.remaining = [0; 4];
    }

    /// Force block fall speeds from the current slow-motion state
    ///
    /// Power-ups keep their own speed.
    pub fn override_block_speeds(
        &self,
        blocks: &mut [FallingEntity],
        base_speed: f32,
        slow_factor: f32,
    ) {
        let speed = if self.is_active(PowerUpKind::SlowMotion) {
            base_speed * slow_factor
        } else {
            base_speed
        };
        for block in blocks
            .iter_mut()
            .filter(|e| matches!(e.kind, EntityKind::Block(_)))
        {
            block.speed = speed;
        }
    }
}
