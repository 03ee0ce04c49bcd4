//! Craft steering and the boost departure.
//!
//! In cruise the craft drifts toward the pointer target on three damped axes:
//! vertical offset, roll and pitch. While turbo is engaged steering is ignored,
//! every axis settles back to neutral, and the craft peels away from the
//! camera along a fixed departure path.

use engine_core::{DampedAxis, Transform};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_2, PI};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CraftSettings {
    /// Vertical offset is kept within this band.
    pub vertical_min: f32,
    pub vertical_max: f32,
    pub vertical_gain: f32,
    pub vertical_damping: f32,

    pub roll_limit_degrees: f32,
    pub roll_gain: f32,
    pub roll_damping: f32,

    /// Pitch target per unit of target depth (radians).
    pub pitch_scale: f32,
    pub pitch_limit_degrees: f32,
    pub pitch_gain: f32,
    pub pitch_damping: f32,

    /// Gain used on every axis while recentering during boost.
    pub recenter_gain: f32,

    /// Seconds of boost before the one-shot boost-complete signal.
    pub boost_complete_after: f32,
    /// Seconds the departure path takes to play out.
    pub departure_duration: f32,
    /// Offset reached at the end of the departure.
    pub departure_offset: Vec3,
    /// Yaw reached at the end of the departure (radians).
    pub departure_yaw: f32,

    pub model_scale: f32,
}

impl Default for CraftSettings {
    fn default() -> Self {
        Self {
            vertical_min: -3.0,
            vertical_max: 1.0,
            vertical_gain: 0.002,
            vertical_damping: 0.95,
            roll_limit_degrees: 45.0,
            roll_gain: 0.01,
            roll_damping: 0.75,
            pitch_scale: 0.5,
            pitch_limit_degrees: 30.0,
            pitch_gain: 0.01,
            pitch_damping: 0.85,
            recenter_gain: 0.01,
            boost_complete_after: 2.0,
            departure_duration: 1.5,
            departure_offset: Vec3::new(0.0, 20.0, -10.0),
            departure_yaw: PI,
            model_scale: 0.5,
        }
    }
}

/// Craft pose for one frame. Angles in radians.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CraftPose {
    pub vertical_offset: f32,
    pub roll: f32,
    pub pitch: f32,
    pub yaw: f32,
    /// Extra displacement from the departure path.
    pub departure: Vec3,
    /// Model opacity, fades out during departure.
    pub opacity: f32,
    pub scale: f32,
}

impl CraftPose {
    fn neutral(scale: f32) -> Self {
        Self {
            vertical_offset: 0.0,
            roll: 0.0,
            pitch: 0.0,
            yaw: 0.0,
            departure: Vec3::ZERO,
            opacity: 1.0,
            scale,
        }
    }

    /// World position of the craft.
    pub fn position(&self) -> Vec3 {
        Vec3::new(0.0, self.vertical_offset, 0.0) + self.departure
    }

    pub fn transform(&self) -> Transform {
        Transform::from_euler(self.position(), self.yaw, self.pitch, self.roll, self.scale)
    }

    pub fn is_finite(&self) -> bool {
        self.vertical_offset.is_finite()
            && self.roll.is_finite()
            && self.pitch.is_finite()
            && self.yaw.is_finite()
            && self.departure.is_finite()
            && self.opacity.is_finite()
    }
}

/// Drives the craft pose from a steering target and the turbo scalar.
#[derive(Debug, Clone)]
pub struct CraftAnimator {
    settings: CraftSettings,
    vertical: DampedAxis,
    roll: DampedAxis,
    pitch: DampedAxis,
    target: Vec3,
    boosting: bool,
    boost_elapsed: f32,
    boost_notified: bool,
    pose: CraftPose,
}

impl CraftAnimator {
    pub fn new(settings: CraftSettings) -> Self {
        Self {
            vertical: DampedAxis::new(settings.vertical_gain, settings.vertical_damping),
            roll: DampedAxis::new(settings.roll_gain, settings.roll_damping),
            pitch: DampedAxis::new(settings.pitch_gain, settings.pitch_damping),
            target: Vec3::ZERO,
            boosting: false,
            boost_elapsed: 0.0,
            boost_notified: false,
            pose: CraftPose::neutral(settings.model_scale),
            settings,
        }
    }

    /// Set the steering target. Rejected if non-finite or while boosting.
    pub fn set_target(&mut self, target: Vec3) -> bool {
        if !target.is_finite() {
            log::warn!("Ignoring non-finite steering target {target}");
            return false;
        }
        if self.boosting {
            return false;
        }
        self.target = target;
        true
    }

    /// Step one frame. Returns `true` on the frame the boost-complete signal fires.
    pub fn update(&mut self, dt: f32, turbo: f32) -> bool {
        let saved = (self.vertical, self.roll, self.pitch, self.pose);

        let completed = if turbo > 0.0 {
            self.step_boost(dt)
        } else {
            if self.boosting {
                self.end_boost();
            }
            self.step_cruise();
            false
        };

        self.pose.vertical_offset = self.vertical.value;
        self.pose.roll = self.roll.value;
        self.pose.pitch = self.pitch.value;

        if !self.pose.is_finite() {
            log::warn!("Craft pose went non-finite, rolling back");
            (self.vertical, self.roll, self.pitch, self.pose) = saved;
        }
        completed
    }

    fn step_cruise(&mut self) {
        let s = &self.settings;

        let vertical_target = self.target.y.clamp(s.vertical_min, s.vertical_max);
        self.vertical.step(vertical_target);

        let craft = Vec3::new(0.0, self.vertical.value, 0.0);
        let direction = (self.target - craft).normalize_or_zero();
        let roll_target = if direction == Vec3::ZERO {
            0.0
        } else {
            let limit = s.roll_limit_degrees.to_radians();
            (direction.angle_between(Vec3::Y) - FRAC_PI_2).clamp(-limit, limit)
        };
        self.roll.step(roll_target);

        let pitch_limit = s.pitch_limit_degrees.to_radians();
        let pitch_target = (self.target.z * s.pitch_scale).clamp(-pitch_limit, pitch_limit);
        self.pitch.step(pitch_target);
    }

    fn step_boost(&mut self, dt: f32) -> bool {
        if !self.boosting {
            self.boosting = true;
            self.boost_elapsed = 0.0;
            self.boost_notified = false;
            log::debug!("Craft departing");
        }
        self.boost_elapsed += dt.max(0.0);

        let gain = self.settings.recenter_gain;
        self.vertical.step_with_gain(0.0, gain);
        self.roll.step_with_gain(0.0, gain);
        self.pitch.step_with_gain(0.0, gain);

        let progress = if self.settings.departure_duration > 0.0 {
            (self.boost_elapsed / self.settings.departure_duration).min(1.0)
        } else {
            1.0
        };
        self.pose.departure = self.settings.departure_offset * progress;
        self.pose.yaw = self.settings.departure_yaw * progress;
        self.pose.opacity = 1.0 - progress;

        if !self.boost_notified && self.boost_elapsed >= self.settings.boost_complete_after {
            self.boost_notified = true;
            log::debug!("Boost complete");
            return true;
        }
        false
    }

    fn end_boost(&mut self) {
        self.boosting = false;
        self.boost_elapsed = 0.0;
        self.pose.departure = Vec3::ZERO;
        self.pose.yaw = 0.0;
        self.pose.opacity = 1.0;
    }

    pub fn pose(&self) -> &CraftPose {
        &self.pose
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn is_boosting(&self) -> bool {
        self.boosting
    }

    pub fn settings(&self) -> &CraftSettings {
        &self.settings
    }
}
