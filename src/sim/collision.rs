//! Collision detection and catch resolution
//!
//! Everything here is axis-aligned: the catcher and every falling entity are
//! rectangles. Resolution consumes the entity list and hands back the
//! survivors, so nothing is removed while it is being scanned.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::effects::EffectTracker;
use super::state::{Catcher, EntityKind, FallingEntity, GameEvent, PowerUpKind, SessionState};
use crate::tuning::Tuning;

/// Axis-aligned rectangle (top-left origin, y grows downward)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub min: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub fn new(min: Vec2, size: Vec2) -> Self {
        Self { min, size }
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.min + self.size
    }

    #[inline]
    pub fn center(&self) -> Vec2 {
        self.min + self.size * 0.5
    }

    /// True when both axis intervals intersect; shared edges do not count
    pub fn overlaps(&self, other: &Rect) -> bool {
        let (a_max, b_max) = (self.max(), other.max());
        self.min.x < b_max.x
            && other.min.x < a_max.x
            && self.min.y < b_max.y
            && other.min.y < a_max.y
    }
}

/// Outcome of a resolution pass
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Entities still in flight
    pub survivors: Vec<FallingEntity>,
    pub events: Vec<GameEvent>,
}

/// Pull nearby blocks toward the catcher center
///
/// Only blocks strictly inside `radius` move, each by exactly `step` along
/// the unit direction to the catcher. Power-ups are never pulled.
pub fn apply_magnet(catcher: &Catcher, entities: &mut [FallingEntity], radius: f32, step: f32) {
    let target = catcher.center();
    for entity in entities
        .iter_mut()
        .filter(|e| matches!(e.kind, EntityKind::Block(_)))
    {
        let to_target = target - entity.center();
        if to_target.length() < radius {
            entity.pos += to_target.normalize_or_zero() * step;
        }
    }
}

/// Resolve catches and misses for falling blocks
pub fn resolve_blocks(
    catcher: &Catcher,
    blocks: Vec<FallingEntity>,
    effects: &EffectTracker,
    session: &mut SessionState,
    tuning: &Tuning,
    playfield_height: f32,
) -> Resolution {
    let catcher_bounds = catcher.bounds();
    let shielded = effects.is_active(PowerUpKind::Shield);
    let doubled = effects.is_active(PowerUpKind::DoublePoints);
    let mut out = Resolution::default();

    for block in blocks {
        let EntityKind::Block(grade) = block.kind else {
            // Power-ups have their own pass
            out.survivors.push(block);
            continue;
        };

        if catcher_bounds.overlaps(&block.bounds()) {
            let at = block.center();

            if grade.is_harmful() && shielded {
                session.score += tuning.shield_bonus;
                out.events.push(GameEvent::Deflected { grade, at });
                continue;
            }

            let mut points = grade.points();
            if points > 0 && doubled {
                points *= 2;
            }
            session.score += points;

            if let Some(damage) = grade.damage() {
                session.change_health(-damage);
            } else if grade.is_harmful() {
                session.change_health(-tuning.default_damage);
            }
            if let Some(heal) = grade.heal() {
                session.change_health(heal);
            }

            out.events.push(GameEvent::BlockCaught { grade, points, at });
        } else if block.pos.y > playfield_height {
            out.events.push(GameEvent::Missed { kind: block.kind });
        } else {
            out.survivors.push(block);
        }
    }

    out
}

/// Resolve pickups and misses for falling power-ups
pub fn resolve_power_ups(
    catcher: &Catcher,
    power_ups: Vec<FallingEntity>,
    effects: &mut EffectTracker,
    playfield_height: f32,
) -> Resolution {
    let catcher_bounds = catcher.bounds();
    let mut out = Resolution::default();

    for power_up in power_ups {
        let EntityKind::PowerUp(kind) = power_up.kind else {
            out.survivors.push(power_up);
            continue;
        };

        if catcher_bounds.overlaps(&power_up.bounds()) {
            effects.activate(kind);
            out.events.push(GameEvent::PowerUpCollected {
                kind,
                at: power_up.center(),
            });
        } else if power_up.pos.y > playfield_height {
            out.events.push(GameEvent::Missed {
                kind: power_up.kind,
            });
        } else {
            out.survivors.push(power_up);
        }
    }

    out
}
