//! Live environment reflections for the craft.
//!
//! Every frame the scene is captured into a fresh environment map from the
//! craft's position, with the craft itself left out of the pass so it never
//! reflects its own hull. The new map replaces the old one on the craft's
//! material and the old one is released right away, so at most two maps are
//! alive for the duration of one update and one between updates.

use glam::Vec3;
use std::collections::HashSet;
use thiserror::Error;

/// Handle to an object in the host scene graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneObjectId(pub u32);

/// Handle to a captured environment map owned by an [`EnvironmentCapture`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnvMapId(pub u64);

#[derive(Debug, Error, PartialEq)]
pub enum ReflectionError {
    #[error("environment capture failed: {0}")]
    Capture(String),
    #[error("environment capture used after dispose")]
    Disposed,
}

/// Per-capture render parameters.
#[derive(Debug, Clone, Copy)]
pub struct CaptureParams<'a> {
    /// World position the map is captured from.
    pub origin: Vec3,
    /// Objects skipped by the capture pass.
    pub exclude: &'a [SceneObjectId],
    /// Whether the scene background is drawn into the map.
    pub include_background: bool,
}

/// Something that can render the scene into environment maps.
pub trait EnvironmentCapture {
    /// Render a new map. The returned handle stays valid until [`release`](Self::release).
    fn capture(&mut self, params: &CaptureParams<'_>) -> Result<EnvMapId, ReflectionError>;
    /// Free one map.
    fn release(&mut self, map: EnvMapId);
    /// Free every map and the generator itself.
    fn dispose(&mut self);
}

/// The slice of the craft's material the reflection updater is allowed to touch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReflectiveMaterial {
    pub env_map: Option<EnvMapId>,
    pub env_map_intensity: f32,
}

impl Default for ReflectiveMaterial {
    fn default() -> Self {
        Self {
            env_map: None,
            env_map_intensity: 1.0,
        }
    }
}

/// Owns one capture generator and the single map currently applied to the craft.
pub struct ReflectionUpdater<C: EnvironmentCapture> {
    capture: Option<C>,
    current: Option<EnvMapId>,
    intensity: f32,
    exclude: Vec<SceneObjectId>,
    failures: u64,
}

impl<C: EnvironmentCapture> ReflectionUpdater<C> {
    pub fn new(capture: C, intensity: f32) -> Self {
        Self {
            capture: Some(capture),
            current: None,
            intensity,
            exclude: Vec::new(),
            failures: 0,
        }
    }

    /// Leave `object` out of every capture (the craft, typically).
    pub fn exclude(&mut self, object: SceneObjectId) {
        if !self.exclude.contains(&object) {
            self.exclude.push(object);
        }
    }

    /// Capture a fresh map and apply it. On failure the error is logged and the
    /// material keeps its previous map. Returns whether a new map was applied.
    pub fn update(&mut self, origin: Vec3, material: &mut ReflectiveMaterial) -> bool {
        let Some(capture) = self.capture.as_mut() else {
            return false;
        };

        let params = CaptureParams {
            origin,
            exclude: &self.exclude,
            include_background: false,
        };

        match capture.capture(&params) {
            Ok(map) => {
                material.env_map = Some(map);
                material.env_map_intensity = self.intensity;
                if let Some(old) = self.current.replace(map) {
                    capture.release(old);
                }
                true
            }
            Err(e) => {
                self.failures += 1;
                log::warn!("Reflection capture failed, keeping previous map: {e}");
                false
            }
        }
    }

    /// Map currently applied to the craft.
    pub fn current_map(&self) -> Option<EnvMapId> {
        self.current
    }

    /// Number of failed captures since creation.
    pub fn failures(&self) -> u64 {
        self.failures
    }

    pub fn is_disposed(&self) -> bool {
        self.capture.is_none()
    }

    pub fn capture(&self) -> Option<&C> {
        self.capture.as_ref()
    }

    pub fn capture_mut(&mut self) -> Option<&mut C> {
        self.capture.as_mut()
    }

    /// Unbind the map from `material`, release it, and dispose the generator.
    /// Safe to call more than once.
    pub fn teardown(&mut self, material: &mut ReflectiveMaterial) {
        if material.env_map == self.current {
            material.env_map = None;
        }
        self.release_all();
    }

    fn release_all(&mut self) {
        if let Some(mut capture) = self.capture.take() {
            if let Some(map) = self.current.take() {
                capture.release(map);
            }
            capture.dispose();
            log::debug!("Reflection resources released");
        }
    }
}

impl<C: EnvironmentCapture> Drop for ReflectionUpdater<C> {
    fn drop(&mut self) {
        self.release_all();
    }
}

/// Capture backend with no GPU behind it. Hands out map handles and tracks
/// which are live; used for headless runs and tests.
#[derive(Debug, Default)]
pub struct HeadlessCapture {
    next_id: u64,
    live: HashSet<EnvMapId>,
    captures: u64,
    fail: bool,
    disposed: bool,
    last_exclude: Vec<SceneObjectId>,
    last_included_background: Option<bool>,
}

impl HeadlessCapture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent captures fail until switched back.
    pub fn set_failing(&mut self, fail: bool) {
        self.fail = fail;
    }

    pub fn live_maps(&self) -> usize {
        self.live.len()
    }

    pub fn captures(&self) -> u64 {
        self.captures
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn last_exclude(&self) -> &[SceneObjectId] {
        &self.last_exclude
    }

    pub fn last_included_background(&self) -> Option<bool> {
        self.last_included_background
    }
}

impl EnvironmentCapture for HeadlessCapture {
    fn capture(&mut self, params: &CaptureParams<'_>) -> Result<EnvMapId, ReflectionError> {
        if self.disposed {
            return Err(ReflectionError::Disposed);
        }
        self.last_exclude = params.exclude.to_vec();
        self.last_included_background = Some(params.include_background);
        if self.fail {
            return Err(ReflectionError::Capture("headless capture set to fail".into()));
        }
        self.captures += 1;
        self.next_id += 1;
        let id = EnvMapId(self.next_id);
        self.live.insert(id);
        Ok(id)
    }

    fn release(&mut self, map: EnvMapId) {
        self.live.remove(&map);
    }

    fn dispose(&mut self) {
        self.live.clear();
        self.disposed = true;
    }
}
