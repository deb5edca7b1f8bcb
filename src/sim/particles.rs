//! Cosmetic particle bursts
//!
//! Particles never touch gameplay. They draw from their own RNG stream so
//! toggling them off leaves spawning identical for a given seed.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::state::ColorTag;

/// A particle for visual effects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    pub color: ColorTag,
    /// Ticks left
    pub life: u32,
    pub size: f32,
}

impl Particle {
    /// Advance one tick; false once expired
    pub fn tick(&mut self) -> bool {
        self.pos += self.vel;
        self.life = self.life.saturating_sub(1);
        self.size = (self.size - 0.1).max(0.0);
        self.life > 0
    }
}

#[derive(Debug, Clone)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: Pcg32,
    max_particles: usize,
}

impl ParticleSystem {
    pub fn new(seed: u64, max_particles: usize) -> Self {
        Self {
            particles: Vec::new(),
            // Separate stream from gameplay
            rng: Pcg32::new(seed, 0xa02b_dbf7_bb3c_0a7),
            max_particles,
        }
    }

    /// Burst of `count` particles at `pos`, dropped once the cap is hit
    pub fn spawn(&mut self, pos: Vec2, color: ColorTag, count: usize) {
        let room = self.max_particles.saturating_sub(self.particles.len());
        for _ in 0..count.min(room) {
            let particle = Particle {
                pos,
                vel: Vec2::new(
                    self.rng.random_range(-3.0..=3.0),
                    self.rng.random_range(-3.0..=3.0),
                ),
                color,
                life: self.rng.random_range(20..=40),
                size: self.rng.random_range(2..=6) as f32,
            };
            self.particles.push(particle);
        }
    }

    /// Advance all particles and drop expired ones
    pub fn tick(&mut self) {
        self.particles.retain_mut(Particle::tick);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }
}
