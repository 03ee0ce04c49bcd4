//! Streak starfield: a fixed pool of light streaks flowing past the craft.
//!
//! Streaks are drawn from two spawn regions. Most come from a wide far field
//! with long, fast-reading streaks; a minority come from a tight near field
//! with short streaks. The mix is what sells depth, so the split is part of the
//! look and not a tuning accident.
//!
//! A streak that leaves view is moved back to the x it spawned at. Nothing
//! else is re-rolled, so each streak keeps its colour, speed and length for
//! the lifetime of the field.

use glam::Vec3;
use rand::prelude::*;

/// Default pool size.
pub const STREAK_COUNT: usize = 200;
/// Streaks past this x are out of view and get recycled.
pub const OUT_OF_VIEW_X: f32 = 40.0;
/// Extra x advance per frame at full turbo.
pub const TURBO_BOOST_FACTOR: f32 = 1.0;
/// Share of the pool spawned in the near field.
pub const NEAR_FIELD_SHARE: f32 = 0.2;

/// Streak palette as sRGB hex.
pub const PALETTE_HEX: [u32; 5] = [0x260C73, 0x57016D, 0x1C488F, 0x529EEA, 0x126778];
/// Palette colours are pushed past 1.0 so they bloom.
const PALETTE_GAIN: f32 = 3.0;

const SPEED_RANGE: (f32, f32) = (19.5, 42.0);

/// Which spawn distribution a streak was drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnRegion {
    /// Tight spread close to the flight line, short streaks.
    Near,
    /// Wide spread, long streaks.
    Far,
}

impl SpawnRegion {
    /// (x, y, z) ranges as (a, b) pairs, and the streak length range.
    fn bounds(self) -> ([(f32, f32); 3], (f32, f32)) {
        match self {
            SpawnRegion::Near => ([(-10.0, -30.0), (-5.0, 5.0), (6.0, -6.0)], (1.5, 15.0)),
            SpawnRegion::Far => ([(-15.0, -45.0), (-10.5, 1.5), (30.0, -45.0)], (2.5, 20.0)),
        }
    }
}

/// One light streak.
#[derive(Debug, Clone, PartialEq)]
pub struct StreakParticle {
    pub position: Vec3,
    /// Length along x; the streak quad is scaled by this.
    pub streak_length: f32,
    /// Units per second along +x.
    pub speed: f32,
    /// Linear RGB, may exceed 1.
    pub color: Vec3,
    /// x the streak returns to when recycled.
    pub spawn_x: f32,
    pub region: SpawnRegion,
}

/// Tunables for [`ParticleField::generate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarfieldSettings {
    pub count: usize,
    pub seed: u64,
    pub out_of_view_x: f32,
    pub turbo_boost_factor: f32,
}

impl Default for StarfieldSettings {
    fn default() -> Self {
        Self {
            count: STREAK_COUNT,
            seed: 0x5EED_57A2,
            out_of_view_x: OUT_OF_VIEW_X,
            turbo_boost_factor: TURBO_BOOST_FACTOR,
        }
    }
}

/// The streak pool. Allocated once; particles are only ever mutated in place.
#[derive(Debug, Clone)]
pub struct ParticleField {
    particles: Vec<StreakParticle>,
    out_of_view_x: f32,
    turbo_boost_factor: f32,
}

impl ParticleField {
    /// Generate the pool from a seed.
    pub fn generate(settings: StarfieldSettings) -> Self {
        let mut rng = StdRng::seed_from_u64(settings.seed);
        let palette = palette_linear();

        let particles: Vec<StreakParticle> = (0..settings.count)
            .map(|_| {
                let region = if rng.gen::<f32>() < NEAR_FIELD_SHARE {
                    SpawnRegion::Near
                } else {
                    SpawnRegion::Far
                };
                let ([x, y, z], length) = region.bounds();
                let position = Vec3::new(
                    random_between(&mut rng, x),
                    random_between(&mut rng, y),
                    random_between(&mut rng, z),
                );
                StreakParticle {
                    position,
                    streak_length: random_between(&mut rng, length),
                    speed: random_between(&mut rng, SPEED_RANGE),
                    color: palette[rng.gen_range(0..palette.len())],
                    spawn_x: position.x,
                    region,
                }
            })
            .collect();

        log::debug!("Generated starfield with {} streaks", particles.len());

        Self {
            particles,
            out_of_view_x: settings.out_of_view_x,
            turbo_boost_factor: settings.turbo_boost_factor,
        }
    }

    /// Move every streak along +x by `speed * dt + boost * turbo`, recycling
    /// those that passed the out-of-view bound.
    pub fn advance(&mut self, dt: f32, turbo: f32) {
        let boost = self.turbo_boost_factor * turbo;
        for p in &mut self.particles {
            p.position.x += p.speed * dt + boost;
            if p.position.x > self.out_of_view_x {
                p.position.x = p.spawn_x;
            }
        }
    }

    pub fn particles(&self) -> &[StreakParticle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Current streak positions, in pool order.
    pub fn positions(&self) -> impl Iterator<Item = Vec3> + '_ {
        self.particles.iter().map(|p| p.position)
    }
}

/// Uniform sample between `a` and `b`. Either bound may be the larger one.
fn random_between(rng: &mut StdRng, (a, b): (f32, f32)) -> f32 {
    a + rng.gen::<f32>() * (b - a)
}

/// The palette converted from sRGB to linear and scaled for bloom.
pub fn palette_linear() -> [Vec3; PALETTE_HEX.len()] {
    PALETTE_HEX.map(|hex| {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Vec3::new(srgb_to_linear(r), srgb_to_linear(g), srgb_to_linear(b)) * PALETTE_GAIN
    })
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}
