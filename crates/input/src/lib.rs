//! Input handling: turns window events into scene inputs.
//!
//! The scene only understands two things: where the pointer is steering, and
//! whether the turbo control is engaged. Keyboard users hold the control;
//! touch users get a switch that flips on one tap and off on the next.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How the turbo control behaves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ActivationMode {
    /// Press engages; release is reported but does not cancel.
    #[default]
    Hold,
    /// Each press flips the switch; switching off cancels a charge.
    Toggle,
}

/// Input the scene core consumes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneInput {
    /// New steering target in world space.
    PointerMoved(Vec3),
    /// Turbo control engaged (`true`) or released/switched off (`false`).
    Activate(bool),
}

/// Maps a normalized pointer position onto a world-space steering target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PointerMapping {
    /// World half-extent reached at the viewport edges (x, y).
    pub extent: Vec2,
    /// Depth reached at the left/right viewport edges.
    pub depth: f32,
}

impl Default for PointerMapping {
    fn default() -> Self {
        Self {
            extent: Vec2::new(6.0, 4.0),
            depth: 4.0,
        }
    }
}

impl PointerMapping {
    /// World target for a pointer in normalized device coordinates (y up).
    pub fn to_world(&self, ndc: Vec2) -> Vec3 {
        Vec3::new(ndc.x * self.extent.x, ndc.y * self.extent.y, ndc.x * self.depth)
    }
}

/// Manages input state between frames.
#[derive(Debug)]
pub struct InputState {
    /// Keys currently held down.
    keys_held: HashSet<KeyCode>,
    /// Mouse buttons currently held.
    mouse_held: HashSet<MouseButton>,

    /// Mouse position in window coordinates.
    mouse_position: Vec2,
    /// Viewport size in physical pixels.
    viewport: Vec2,

    mode: ActivationMode,
    mapping: PointerMapping,
    /// Toggle-mode switch position.
    switch_on: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self::new(ActivationMode::default(), PointerMapping::default())
    }
}

impl InputState {
    pub fn new(mode: ActivationMode, mapping: PointerMapping) -> Self {
        Self {
            keys_held: HashSet::new(),
            mouse_held: HashSet::new(),
            mouse_position: Vec2::ZERO,
            viewport: Vec2::ZERO,
            mode,
            mapping,
            switch_on: false,
        }
    }

    pub fn mode(&self) -> ActivationMode {
        self.mode
    }

    /// Record the viewport size (call on resize).
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.viewport = Vec2::new(width as f32, height as f32);
    }

    /// Force the toggle switch position. Toggle-mode hosts call this every frame
    /// with the scene's `turbo_engaged` so a finished or refused charge reads as off.
    pub fn set_switch(&mut self, on: bool) {
        self.switch_on = on;
    }

    pub fn is_switch_on(&self) -> bool {
        self.switch_on
    }

    /// Process a keyboard event. Space is the turbo control.
    pub fn process_keyboard(&mut self, key: KeyCode, state: ElementState) -> Option<SceneInput> {
        let fresh = match state {
            ElementState::Pressed => self.keys_held.insert(key),
            ElementState::Released => self.keys_held.remove(&key),
        };
        if key != KeyCode::Space || !fresh {
            return None;
        }
        self.activation(state)
    }

    /// Process a mouse button event. Left click is the turbo control.
    pub fn process_mouse_button(
        &mut self,
        button: MouseButton,
        state: ElementState,
    ) -> Option<SceneInput> {
        let fresh = match state {
            ElementState::Pressed => self.mouse_held.insert(button),
            ElementState::Released => self.mouse_held.remove(&button),
        };
        if button != MouseButton::Left || !fresh {
            return None;
        }
        self.activation(state)
    }

    fn activation(&mut self, state: ElementState) -> Option<SceneInput> {
        match (self.mode, state) {
            (ActivationMode::Hold, ElementState::Pressed) => Some(SceneInput::Activate(true)),
            (ActivationMode::Hold, ElementState::Released) => Some(SceneInput::Activate(false)),
            (ActivationMode::Toggle, ElementState::Pressed) => {
                self.switch_on = !self.switch_on;
                Some(SceneInput::Activate(self.switch_on))
            }
            (ActivationMode::Toggle, ElementState::Released) => None,
        }
    }

    /// Process cursor position update.
    pub fn process_cursor_position(&mut self, position: (f64, f64)) -> Option<SceneInput> {
        let position = Vec2::new(position.0 as f32, position.1 as f32);
        if !position.is_finite() {
            log::warn!("Ignoring non-finite cursor position {position}");
            return None;
        }
        self.mouse_position = position;
        let ndc = self.pointer_ndc()?;
        Some(SceneInput::PointerMoved(self.mapping.to_world(ndc)))
    }

    /// Pointer in normalized device coordinates, y up. `None` until a viewport is known.
    pub fn pointer_ndc(&self) -> Option<Vec2> {
        if self.viewport.x <= 0.0 || self.viewport.y <= 0.0 {
            return None;
        }
        Some(Vec2::new(
            self.mouse_position.x / self.viewport.x * 2.0 - 1.0,
            1.0 - self.mouse_position.y / self.viewport.y * 2.0,
        ))
    }

    /// Get the mouse position in window coordinates.
    pub fn mouse_position(&self) -> Vec2 {
        self.mouse_position
    }

    /// Check if a key is currently held.
    pub fn is_key_held(&self, key: KeyCode) -> bool {
        self.keys_held.contains(&key)
    }

    /// Check if a mouse button is held.
    pub fn is_mouse_held(&self, button: MouseButton) -> bool {
        self.mouse_held.contains(&button)
    }
}

// Re-export for convenience
pub use winit::event::{ElementState, MouseButton};
pub use winit::keyboard::KeyCode;
