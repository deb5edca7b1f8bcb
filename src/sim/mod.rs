//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Entity removal by filter pass, never mid-scan
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod effects;
pub mod particles;
pub mod progression;
pub mod spawner;
pub mod state;
pub mod tick;
pub mod weighted;

pub use collision::{Rect, Resolution, apply_magnet, resolve_blocks, resolve_power_ups};
pub use effects::EffectTracker;
pub use particles::{Particle, ParticleSystem};
pub use progression::{Difficulty, check_level_up, level_color, level_name};
pub use spawner::Spawner;
pub use state::{
    BlockGrade, Catcher, ColorTag, EntityKind, FallingEntity, GameEvent, GamePhase, GameState,
    PowerUpKind, SessionState, Snapshot,
};
pub use tick::{TickInput, tick};
pub use weighted::{WeightError, WeightedTable};
