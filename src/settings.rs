//! Player preferences
//!
//! Cosmetic and audio options. Nothing here changes gameplay; balance lives
//! in [`crate::tuning`].

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // === Visual Effects ===
    /// Particle effects (catch bursts, level-up fireworks)
    pub particles: bool,
    /// Hard cap on live particles
    pub max_particles: usize,

    // === HUD ===
    /// Show frame rate in the status line
    pub show_fps: bool,

    // === Audio ===
    /// Master volume (0.0 - 1.0)
    pub master_volume: f32,
    /// Sound effects volume (0.0 - 1.0)
    pub sfx_volume: f32,
    /// Mute all audio
    pub muted: bool,
    /// Ring the terminal bell when no sound device opens
    pub terminal_bell: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            particles: true,
            max_particles: 500,

            show_fps: false,

            master_volume: 0.8,
            sfx_volume: 1.0,
            muted: false,
            terminal_bell: false,
        }
    }
}

impl Settings {
    /// Effective particle count cap
    pub fn max_particles(&self) -> usize {
        if !self.particles {
            0
        } else {
            self.max_particles
        }
    }
}
