//! Core types shared by every scene system.
//!
//! This crate provides the foundational pieces the animation core is built on:
//! - Frame timing
//! - Transform and spatial helpers
//! - Frame-stepped smoothing primitives

pub mod smoothing;
pub mod time;
pub mod transform;

pub use smoothing::*;
pub use time::*;
pub use transform::*;

// Re-export commonly used types
pub use glam::{Mat4, Quat, Vec2, Vec3, Vec4};
