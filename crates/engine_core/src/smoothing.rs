//! Frame-stepped smoothing helpers used by the craft and camera.
//!
//! These step once per rendered frame rather than per second. The gains are
//! tuned against that cadence, so changing the frame rate changes the feel.

/// Linear interpolation.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Turn a per-second rate into a blend factor for one step of `dt` seconds,
/// capped at 1 so long frames land on the target instead of overshooting.
#[inline]
pub fn lerp_factor(rate: f32, dt: f32) -> f32 {
    (rate * dt).clamp(0.0, 1.0)
}

/// One scalar driven toward a target by accumulating an acceleration and then
/// damping it. The two-stage step gives a soft overshooting drift rather than
/// the snap of a critically damped spring.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DampedAxis {
    pub value: f32,
    pub velocity: f32,
    /// Fraction of the remaining error added to velocity each step.
    pub gain: f32,
    /// Multiplier applied to velocity after the gain each step.
    pub damping: f32,
}

impl DampedAxis {
    pub fn new(gain: f32, damping: f32) -> Self {
        Self {
            value: 0.0,
            velocity: 0.0,
            gain,
            damping,
        }
    }

    /// Advance one frame toward `target` using this axis' own gain.
    pub fn step(&mut self, target: f32) {
        self.step_with_gain(target, self.gain);
    }

    /// Advance one frame toward `target` with an overridden gain.
    pub fn step_with_gain(&mut self, target: f32, gain: f32) {
        self.velocity += (target - self.value) * gain;
        self.velocity *= self.damping;
        self.value += self.velocity;
    }
}
