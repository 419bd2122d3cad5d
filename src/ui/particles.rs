/// Death-burst particles: fire-and-forget visual feedback.
///
/// Particles live in level pixel space and fade linearly; the renderer
/// maps them onto terminal cells. Nothing here feeds back into the
/// simulation.

use crossterm::style::Color;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Life lost per update; a particle lasts 50 updates.
const FADE_PER_TICK: f32 = 0.02;
const MAX_SPEED: f32 = 5.0;

#[derive(Clone, Debug)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// 1.0 fresh, 0.0 gone.
    pub life: f32,
    pub color: Color,
    pub size: f32,
}

pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new() -> Self {
        ParticleSystem { particles: Vec::new(), rng: StdRng::from_os_rng() }
    }

    #[cfg(test)]
    fn seeded(seed: u64) -> Self {
        ParticleSystem { particles: Vec::new(), rng: StdRng::seed_from_u64(seed) }
    }

    /// Spawn `count` particles at (x, y) with random velocity in ±5 px/tick.
    pub fn emit(&mut self, x: f32, y: f32, color: Color, count: usize) {
        self.particles.reserve(count);
        for _ in 0..count {
            let p = Particle {
                x,
                y,
                vx: self.rng.random_range(-MAX_SPEED..MAX_SPEED),
                vy: self.rng.random_range(-MAX_SPEED..MAX_SPEED),
                life: 1.0,
                color,
                size: self.rng.random_range(2.0..7.0),
            };
            self.particles.push(p);
        }
    }

    pub fn update(&mut self) {
        for p in &mut self.particles {
            p.x += p.vx;
            p.y += p.vy;
            p.life -= FADE_PER_TICK;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.particles.len()
    }
}
