//! Block Catcher - A falling-blocks arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (spawning, effects, collisions, progression)
//! - `renderer`: Presentation sinks (terminal, null)
//! - `platform`: Input mapping and fixed-timestep scheduling
//! - `audio`: Fire-and-forget sound effects
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod config;
pub mod highscores;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use config::{ConfigError, GameConfig};
pub use highscores::HighScores;
pub use settings::Settings;
pub use tuning::{Tuning, TuningError};

/// Game configuration constants
pub mod consts {
    use std::time::Duration;

    /// Fixed simulation rate
    pub const SIM_HZ: u32 = 60;
    /// Fixed simulation timestep
    pub const SIM_DT: Duration = Duration::from_nanos(1_000_000_000 / SIM_HZ as u64);
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Playfield dimensions
    pub const PLAYFIELD_WIDTH: f32 = 800.0;
    pub const PLAYFIELD_HEIGHT: f32 = 600.0;

    /// Catcher defaults - rides 30 units above the bottom edge
    pub const CATCHER_WIDTH: f32 = 100.0;
    pub const CATCHER_HEIGHT: f32 = 20.0;
    pub const CATCHER_SPEED: f32 = 8.0;
    pub const CATCHER_BOTTOM_OFFSET: f32 = 30.0;

    /// Side length of every falling block and power-up
    pub const ENTITY_SIZE: f32 = 30.0;

    /// Health bounds
    pub const MAX_HEALTH: i32 = 100;
}
