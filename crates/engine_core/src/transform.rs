//! Transform component and utilities for spatial positioning.

use glam::{EulerRot, Quat, Vec3};

/// A 3D transform representing position, rotation, and scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// Create a transform from position, Euler angles (radians) and uniform scale.
    /// Angles are applied yaw (Y), then pitch (X), then roll (Z).
    pub fn from_euler(position: Vec3, yaw: f32, pitch: f32, roll: f32, scale: f32) -> Self {
        Self {
            position,
            rotation: Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll),
            scale: Vec3::splat(scale),
        }
    }
}
