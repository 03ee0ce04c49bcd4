//! Post-processing parameters driven by the turbo state machine.

use bytemuck::{Pod, Zeroable};

/// Intensities of the screen-space effects layered over the scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisualEffects {
    pub distortion: f32,
    pub chromatic_aberration: f32,
    pub motion_blur: f32,
    pub glow_intensity: f32,
}

impl VisualEffects {
    /// Resting values: everything off except a faint glow.
    pub const BASELINE: VisualEffects = VisualEffects {
        distortion: 0.0,
        chromatic_aberration: 0.0,
        motion_blur: 0.0,
        glow_intensity: 0.3,
    };

    pub fn is_finite(&self) -> bool {
        self.distortion.is_finite()
            && self.chromatic_aberration.is_finite()
            && self.motion_blur.is_finite()
            && self.glow_intensity.is_finite()
    }
}

impl Default for VisualEffects {
    fn default() -> Self {
        Self::BASELINE
    }
}

/// Post-fx uniform (must match the composite shader's PostFxUniform).
#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
pub struct PostFxUniform {
    pub distortion: f32,
    pub chromatic_aberration: f32,
    /// Streak blur strength: the larger of the jump blur and the turbo scalar.
    pub motion_blur: f32,
    pub glow_intensity: f32,
    pub turbo: f32,
    /// Seconds since mount, for shader noise.
    pub time: f32,
    pub _pad: [f32; 2],
}

impl PostFxUniform {
    pub fn new(effects: &VisualEffects, turbo: f32, time: f32) -> Self {
        Self {
            distortion: effects.distortion,
            chromatic_aberration: effects.chromatic_aberration,
            motion_blur: effects.motion_blur.max(turbo),
            glow_intensity: effects.glow_intensity,
            turbo,
            time,
            _pad: [0.0; 2],
        }
    }
}

impl Default for PostFxUniform {
    fn default() -> Self {
        Self::new(&VisualEffects::BASELINE, 0.0, 0.0)
    }
}
