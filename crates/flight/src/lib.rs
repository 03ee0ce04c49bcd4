//! Hyperspace flythrough scene core.
//!
//! A craft cruises through a field of light streaks, steered by the pointer.
//! Engaging turbo charges an FTL jump; the jump sweeps the camera wide, blasts
//! the streaks past and sends the craft away, then everything settles back.
//! This crate owns the timing and state; drawing is left to the host.

pub mod assets;
pub mod config;
pub mod craft;
pub mod scene;
pub mod turbo;

pub use assets::{AssetError, CraftModel, ModelAssetProvider};
pub use config::FlightConfig;
pub use craft::{CraftAnimator, CraftPose, CraftSettings};
pub use scene::{FrameSnapshot, SceneCore, SceneEvent, TurboGauges};
pub use turbo::{PhaseChange, TurboController, TurboPhase, TurboSettings};
