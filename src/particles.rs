//! Corner-impact particle bursts
//!
//! Simulation only: a burst is a flat list of points launched radially from
//! one origin and pulled down by constant gravity. Drawing happens in the web
//! layer, which clears its canvas once `is_empty` turns true.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::consts::{
    MAX_FRAME_DT, PARTICLE_GRAVITY, PARTICLE_SIZE_MAX, PARTICLE_SIZE_MIN, PARTICLE_SPEED_MAX,
    PARTICLE_SPEED_MIN,
};
use crate::dvd::Impact;

/// Hard cap on live particles
pub const MAX_PARTICLES: usize = 256;

/// A particle for visual effects
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// Seconds since spawn
    pub age: f32,
    /// Seconds until removal
    pub lifetime: f32,
    pub size: f32,
}

impl Particle {
    /// Opacity, fading linearly to zero over the lifetime
    pub fn alpha(&self) -> f32 {
        if self.lifetime <= 0.0 {
            return 0.0;
        }
        (1.0 - self.age / self.lifetime).clamp(0.0, 1.0)
    }
}

/// Parameters for one `spawn` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BurstPreset {
    pub count: usize,
    pub lifetime_ms: f32,
    pub speed_mult: f32,
    pub size_mult: f32,
}

impl BurstPreset {
    /// First scripted corner hit
    pub const CORNER: Self = Self {
        count: 36,
        lifetime_ms: 900.0,
        speed_mult: 1.0,
        size_mult: 1.0,
    };
    /// Final landing; larger and longer
    pub const FINAL: Self = Self {
        count: 72,
        lifetime_ms: 1400.0,
        speed_mult: 1.5,
        size_mult: 1.4,
    };
    /// Loose corner graze
    pub const SPARKLE: Self = Self {
        count: 14,
        lifetime_ms: 600.0,
        speed_mult: 0.6,
        size_mult: 0.7,
    };

    pub fn for_impact(impact: Impact) -> Self {
        match impact {
            Impact::Corner => Self::CORNER,
            Impact::Final => Self::FINAL,
        }
    }
}

/// The single live burst
#[derive(Debug, Clone)]
pub struct ParticleBurst {
    particles: Vec<Particle>,
    rng: Pcg32,
}

impl Default for ParticleBurst {
    fn default() -> Self {
        Self::new(0x5eed_f011)
    }
}

impl ParticleBurst {
    pub fn new(seed: u64) -> Self {
        Self {
            particles: Vec::new(),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// Replace whatever is live with a fresh radial burst at `origin`
    pub fn spawn(&mut self, origin: Vec2, count: usize, lifetime_ms: f32, speed_mult: f32, size_mult: f32) {
        self.particles.clear();
        let count = count.min(MAX_PARTICLES);
        let lifetime = (lifetime_ms / 1000.0).max(0.0);
        if count == 0 || lifetime <= 0.0 {
            return;
        }

        let speed_mult = speed_mult.max(0.0);
        let size_mult = size_mult.max(0.0);
        for i in 0..count {
            // Evenly spread headings with a little jitter
            let jitter: f32 = self.rng.random_range(-0.5..0.5);
            let angle = (i as f32 + jitter) / count as f32 * std::f32::consts::TAU;
            let speed = self.rng.random_range(PARTICLE_SPEED_MIN..PARTICLE_SPEED_MAX) * speed_mult;
            let size = self.rng.random_range(PARTICLE_SIZE_MIN..PARTICLE_SIZE_MAX) * size_mult;
            let life = lifetime * self.rng.random_range(0.7..1.0);

            self.particles.push(Particle {
                pos: origin,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                age: 0.0,
                lifetime: life,
                size,
            });
        }
    }

    pub fn spawn_preset(&mut self, origin: Vec2, preset: BurstPreset) {
        self.spawn(
            origin,
            preset.count,
            preset.lifetime_ms,
            preset.speed_mult,
            preset.size_mult,
        );
    }

    /// Integrate one frame; returns true while anything is left to draw
    pub fn advance(&mut self, dt: f32) -> bool {
        if self.particles.is_empty() {
            return false;
        }
        let dt = dt.clamp(0.0, MAX_FRAME_DT);
        let gravity = Vec2::new(0.0, PARTICLE_GRAVITY);

        for p in self.particles.iter_mut() {
            p.vel += gravity * dt;
            p.pos += p.vel * dt;
            p.age += dt;
        }
        self.particles.retain(|p| p.age < p.lifetime);
        !self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
