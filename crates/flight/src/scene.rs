//! The scene core: one object that owns every animated system and steps them
//! in a fixed order each frame.
//!
//! Per tick: clock, turbo state machine, craft, camera, starfield, then the
//! reflection capture from the craft's new position. Everything downstream of
//! the state machine reads the same turbo value for the whole frame.

use crate::assets::{load_or_placeholder, CraftModel, ModelAssetProvider};
use crate::config::FlightConfig;
use crate::craft::{CraftAnimator, CraftPose};
use crate::turbo::{PhaseChange, TurboController, TurboPhase};
use engine_core::{Time, Transform};
use glam::Vec3;
use input::{ActivationMode, SceneInput};
use procgen::ParticleField;
use renderer::{
    CameraPose, CameraRig, CameraUniform, EnvironmentCapture, PostFxUniform, ReflectionUpdater,
    StreakInstance, VisualEffects,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEvent {
    PhaseChanged(PhaseChange),
    /// The craft has been boosting long enough to count as departed.
    BoostComplete,
}

/// Read-only gauges for a HUD.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurboGauges {
    pub phase: TurboPhase,
    pub charge_progress: f32,
    pub energy: f32,
    pub energy_percentage: f32,
    pub ftl_charge: f32,
    pub cooldown_progress: f32,
    pub is_cooldown_active: bool,
    pub can_activate: bool,
    pub can_activate_ftl: bool,
    pub is_ftl_ready: bool,
    pub is_energy_critical: bool,
}

impl TurboGauges {
    fn read(turbo: &TurboController) -> Self {
        Self {
            phase: turbo.phase(),
            charge_progress: turbo.charge_progress(),
            energy: turbo.energy(),
            energy_percentage: turbo.energy_percentage(),
            ftl_charge: turbo.ftl_charge(),
            cooldown_progress: turbo.cooldown_progress(),
            is_cooldown_active: turbo.is_cooldown_active(),
            can_activate: turbo.can_activate(),
            can_activate_ftl: turbo.can_activate_ftl(),
            is_ftl_ready: turbo.is_ftl_ready(),
            is_energy_critical: turbo.is_energy_critical(),
        }
    }
}

/// Everything a host needs to draw one frame.
#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub frame: u64,
    /// Seconds since mount.
    pub time: f32,
    pub camera: CameraPose,
    pub camera_uniform: CameraUniform,
    pub craft: CraftPose,
    pub craft_transform: Transform,
    pub particle_positions: Vec<Vec3>,
    pub streaks: Vec<StreakInstance>,
    pub turbo_intensity: f32,
    /// A charge is in progress. Toggle-mode hosts mirror this into their switch.
    pub turbo_engaged: bool,
    pub visual_effects: VisualEffects,
    pub post_fx: PostFxUniform,
    pub gauges: TurboGauges,
    pub placeholder_model: bool,
    /// What happened during this tick.
    pub events: Vec<SceneEvent>,
}

pub struct SceneCore<C: EnvironmentCapture> {
    time: Time,
    turbo: TurboController,
    craft: CraftAnimator,
    camera: CameraRig,
    stars: ParticleField,
    reflections: ReflectionUpdater<C>,
    model: CraftModel,
    activation: ActivationMode,
    mounted: bool,
}

impl<C: EnvironmentCapture> SceneCore<C> {
    /// Build every system, load the craft, and start capturing reflections.
    pub fn mount(config: &FlightConfig, assets: &mut dyn ModelAssetProvider, capture: C) -> Self {
        let model = load_or_placeholder(assets);

        let mut reflections = ReflectionUpdater::new(capture, config.reflection.intensity);
        reflections.exclude(model.object);

        log::info!(
            "Scene mounted ({} streaks, {:?} activation)",
            config.starfield.count,
            config.input.activation
        );

        Self {
            time: Time::new(),
            turbo: TurboController::new(config.turbo),
            craft: CraftAnimator::new(config.craft),
            camera: CameraRig::new(config.camera.rig_settings()),
            stars: ParticleField::generate(config.starfield.settings()),
            reflections,
            model,
            activation: config.input.activation,
            mounted: true,
        }
    }

    /// Viewport changed.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.camera.set_aspect(width, height);
    }

    /// New steering target in world space.
    pub fn on_pointer_move(&mut self, target: Vec3) -> bool {
        self.mounted && self.craft.set_target(target)
    }

    /// Turbo control pressed or released. In hold mode a release does nothing;
    /// in toggle mode switching off cancels a charge.
    pub fn on_activate_input(&mut self, pressed: bool) -> bool {
        if !self.mounted {
            return false;
        }
        if pressed {
            return self.turbo.activate();
        }
        match self.activation {
            ActivationMode::Hold => false,
            ActivationMode::Toggle => self.turbo.cancel(),
        }
    }

    pub fn handle_input(&mut self, input: SceneInput) -> bool {
        match input {
            SceneInput::PointerMoved(target) => self.on_pointer_move(target),
            SceneInput::Activate(pressed) => self.on_activate_input(pressed),
        }
    }

    /// Advance one frame by `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> FrameSnapshot {
        if !self.mounted {
            return self.snapshot();
        }

        let dt = self.time.advance(dt);
        self.turbo.tick(dt);

        let mut events: Vec<SceneEvent> =
            self.turbo.take_changes().into_iter().map(SceneEvent::PhaseChanged).collect();

        let turbo = self.turbo.intensity();
        if self.craft.update(dt, turbo) {
            events.push(SceneEvent::BoostComplete);
        }
        self.camera.update(turbo);
        self.stars.advance(dt, turbo);
        self.reflections.update(self.craft.pose().position(), &mut self.model.material);

        self.build_snapshot(events)
    }

    /// Current state without advancing anything.
    pub fn snapshot(&self) -> FrameSnapshot {
        self.build_snapshot(Vec::new())
    }

    /// Stop every timer and release reflection resources. Safe to call twice.
    pub fn unmount(&mut self) {
        if !self.mounted {
            return;
        }
        self.turbo.shutdown();
        self.reflections.teardown(&mut self.model.material);
        self.mounted = false;
        log::info!("Scene unmounted after {} frames", self.time.frame_count());
    }

    fn build_snapshot(&self, events: Vec<SceneEvent>) -> FrameSnapshot {
        let turbo = self.turbo.intensity();
        let effects = *self.turbo.visual_effects();
        let mut camera_uniform = CameraUniform::new();
        camera_uniform.update(&self.camera);

        FrameSnapshot {
            frame: self.time.frame_count(),
            time: self.time.elapsed_seconds(),
            camera: *self.camera.pose(),
            camera_uniform,
            craft: *self.craft.pose(),
            craft_transform: self.craft.pose().transform(),
            particle_positions: self.stars.positions().collect(),
            streaks: self
                .stars
                .particles()
                .iter()
                .map(|p| StreakInstance::new(p.position, p.streak_length, p.color))
                .collect(),
            turbo_intensity: turbo,
            turbo_engaged: self.turbo.is_charging(),
            visual_effects: effects,
            post_fx: PostFxUniform::new(&effects, turbo, self.time.elapsed_seconds()),
            gauges: TurboGauges::read(&self.turbo),
            placeholder_model: self.model.placeholder,
            events,
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn turbo(&self) -> &TurboController {
        &self.turbo
    }

    pub fn craft(&self) -> &CraftAnimator {
        &self.craft
    }

    pub fn camera(&self) -> &CameraRig {
        &self.camera
    }

    pub fn starfield(&self) -> &ParticleField {
        &self.stars
    }

    pub fn reflections(&self) -> &ReflectionUpdater<C> {
        &self.reflections
    }

    pub fn model(&self) -> &CraftModel {
        &self.model
    }
}

impl<C: EnvironmentCapture> Drop for SceneCore<C> {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::{AssetError, PLACEHOLDER_OBJECT};
    use crate::turbo::TurboSettings;
    use input::{ElementState, InputState, MouseButton, PointerMapping};
    use renderer::{HeadlessCapture, SceneObjectId};

    const CRAFT: SceneObjectId = SceneObjectId(11);
    /// Exact in binary so phase deadlines land on frame boundaries.
    const STEP: f32 = 0.125;

    fn racer() -> Result<CraftModel, AssetError> {
        Ok(CraftModel::new("racer", CRAFT, 4))
    }

    fn mount_with(config: FlightConfig) -> SceneCore<HeadlessCapture> {
        let mut assets = racer;
        SceneCore::mount(&config, &mut assets, HeadlessCapture::new())
    }

    fn affordable() -> FlightConfig {
        FlightConfig {
            turbo: TurboSettings { energy_consumption_rate: 10.0, ..Default::default() },
            ..Default::default()
        }
    }

    fn run(scene: &mut SceneCore<HeadlessCapture>, seconds: f32) -> Vec<SceneEvent> {
        let steps = (seconds / STEP).round() as usize;
        (0..steps).flat_map(|_| scene.tick(STEP).events).collect()
    }

    fn phases(events: &[SceneEvent]) -> Vec<TurboPhase> {
        events
            .iter()
            .filter_map(|e| match e {
                SceneEvent::PhaseChanged(c) => Some(c.to),
                SceneEvent::BoostComplete => None,
            })
            .collect()
    }

    #[test]
    fn mount_starts_at_rest() {
        let scene = mount_with(FlightConfig::default());
        let snap = scene.snapshot();
        assert_eq!(snap.camera, CameraPose::CRUISE);
        assert_eq!(snap.turbo_intensity, 0.0);
        assert_eq!(snap.gauges.phase, TurboPhase::Idle);
        assert_eq!(snap.streaks.len(), 200);
        assert_eq!(snap.particle_positions.len(), 200);
        assert!(!snap.placeholder_model);
    }

    #[test]
    fn failed_model_load_mounts_placeholder() {
        let mut assets = || -> Result<CraftModel, AssetError> { Err(AssetError::Decode("bad header".into())) };
        let scene = SceneCore::mount(&FlightConfig::default(), &mut assets, HeadlessCapture::new());
        assert!(scene.snapshot().placeholder_model);
        assert_eq!(scene.model().object, PLACEHOLDER_OBJECT);
    }

    #[test]
    fn every_tick_captures_without_the_craft() {
        let mut scene = mount_with(FlightConfig::default());
        for _ in 0..5 {
            scene.tick(STEP);
        }
        let capture = scene.reflections().capture().unwrap();
        assert_eq!(capture.captures(), 5);
        assert_eq!(capture.live_maps(), 1);
        assert_eq!(capture.last_exclude(), &[CRAFT]);
        assert_eq!(capture.last_included_background(), Some(false));
        assert_eq!(scene.model().material.env_map, scene.reflections().current_map());
        assert_eq!(scene.model().material.env_map_intensity, 1.5);
    }

    #[test]
    fn default_energy_cycle_aborts_without_boost() {
        let mut scene = mount_with(FlightConfig::default());
        assert!(scene.on_activate_input(true));
        let events = run(&mut scene, 1.5);
        assert_eq!(phases(&events), vec![TurboPhase::Charging, TurboPhase::Resetting]);
        assert_eq!(scene.snapshot().turbo_intensity, 0.0);
        assert_eq!(*scene.camera().pose(), CameraPose::CRUISE);
    }

    #[test]
    fn jump_drives_camera_craft_and_streaks() {
        let mut scene = mount_with(affordable());
        scene.on_pointer_move(Vec3::new(3.0, 1.0, 0.0));
        run(&mut scene, 1.0);
        scene.on_activate_input(true);
        run(&mut scene, 1.5);

        let snap = scene.tick(STEP);
        assert_eq!(snap.gauges.phase, TurboPhase::Jumping);
        assert_eq!(snap.turbo_intensity, 1.0);
        assert!(snap.camera.fov_degrees > CameraPose::CRUISE.fov_degrees);
        assert_eq!(snap.camera.look_at, CameraPose::BOOST.look_at);
        assert!(snap.craft.departure.y > 0.0);
        assert!(snap.post_fx.motion_blur >= 1.0);
        assert!(!scene.on_pointer_move(Vec3::new(-3.0, 0.0, 0.0)));

        let events = run(&mut scene, 5.0);
        assert_eq!(phases(&events), vec![TurboPhase::Resetting, TurboPhase::Idle]);
        assert_eq!(scene.snapshot().turbo_intensity, 0.0);
        assert!(scene.on_pointer_move(Vec3::new(-3.0, 0.0, 0.0)));
    }

    #[test]
    fn boost_complete_reported_once() {
        // A longer jump so turbo stays up past the 2s departure.
        let mut config = affordable();
        config.turbo.jump_duration = 3.0;
        let mut scene = mount_with(config);
        scene.on_activate_input(true);
        let events = run(&mut scene, 8.0);
        let completes = events.iter().filter(|e| **e == SceneEvent::BoostComplete).count();
        assert_eq!(completes, 1);
    }

    #[test]
    fn hold_release_does_not_cancel() {
        let mut scene = mount_with(FlightConfig::default());
        scene.on_activate_input(true);
        run(&mut scene, 0.5);
        assert!(!scene.on_activate_input(false));
        assert_eq!(scene.turbo().phase(), TurboPhase::Charging);
    }

    #[test]
    fn toggle_off_cancels_charge() {
        let mut config = FlightConfig::default();
        config.input.activation = ActivationMode::Toggle;
        let mut scene = mount_with(config);
        assert!(scene.handle_input(SceneInput::Activate(true)));
        run(&mut scene, 0.5);
        assert!(scene.handle_input(SceneInput::Activate(false)));
        assert!(!scene.handle_input(SceneInput::Activate(false)));
        let events = scene.tick(STEP).events;
        assert_eq!(phases(&events), vec![TurboPhase::Idle]);
        assert_eq!(scene.snapshot().gauges.charge_progress, 0.0);
    }

    fn toggle_scene(config: FlightConfig) -> (SceneCore<HeadlessCapture>, InputState) {
        let mut config = config;
        config.input.activation = ActivationMode::Toggle;
        let input = InputState::new(ActivationMode::Toggle, PointerMapping::default());
        (mount_with(config), input)
    }

    fn tap(scene: &mut SceneCore<HeadlessCapture>, input: &mut InputState) -> Option<bool> {
        let pressed = input.process_mouse_button(MouseButton::Left, ElementState::Pressed);
        let released = input.process_mouse_button(MouseButton::Left, ElementState::Released);
        assert_eq!(released, None);
        pressed.map(|event| {
            scene.handle_input(event);
            event == SceneInput::Activate(true)
        })
    }

    fn run_synced(scene: &mut SceneCore<HeadlessCapture>, input: &mut InputState, seconds: f32) {
        let steps = (seconds / STEP).round() as usize;
        for _ in 0..steps {
            let snap = scene.tick(STEP);
            input.set_switch(snap.turbo_engaged);
        }
    }

    #[test]
    fn toggle_switch_rearms_after_a_full_cycle() {
        let (mut scene, mut input) = toggle_scene(affordable());
        assert_eq!(tap(&mut scene, &mut input), Some(true));
        assert!(scene.snapshot().turbo_engaged);

        run_synced(&mut scene, &mut input, 8.0);
        assert_eq!(scene.turbo().phase(), TurboPhase::Idle);
        assert!(!input.is_switch_on());

        assert_eq!(tap(&mut scene, &mut input), Some(true));
        assert_eq!(scene.turbo().phase(), TurboPhase::Charging);
    }

    #[test]
    fn toggle_switch_stays_off_when_activation_is_refused() {
        let (mut scene, mut input) = toggle_scene(FlightConfig::default());
        tap(&mut scene, &mut input);
        run_synced(&mut scene, &mut input, 1.5);
        assert_eq!(scene.turbo().phase(), TurboPhase::Resetting);
        assert!(!input.is_switch_on());

        // Refused mid-reset; the next frame puts the switch back.
        assert_eq!(tap(&mut scene, &mut input), Some(true));
        assert!(input.is_switch_on());
        assert_eq!(scene.turbo().phase(), TurboPhase::Resetting);
        run_synced(&mut scene, &mut input, STEP);
        assert!(!input.is_switch_on());

        // Idle from 2.7 s, back above the threshold after 2 s of recharge.
        run_synced(&mut scene, &mut input, 3.25);
        assert_eq!(tap(&mut scene, &mut input), Some(true));
        assert_eq!(scene.turbo().phase(), TurboPhase::Charging);
    }

    #[test]
    fn streaks_drift_right_in_cruise() {
        let mut scene = mount_with(FlightConfig::default());
        let before: Vec<f32> = scene.starfield().positions().map(|p| p.x).collect();
        scene.tick(STEP);
        let moved = scene
            .starfield()
            .positions()
            .zip(before)
            .filter(|(p, x)| p.x > *x)
            .count();
        // A few may have wrapped back to their spawn x.
        assert!(moved > 150);
    }

    #[test]
    fn capture_failure_keeps_previous_map() {
        let mut scene = mount_with(FlightConfig::default());
        scene.tick(STEP);
        let map = scene.model().material.env_map;
        assert!(map.is_some());
        scene.reflections.capture_mut().unwrap().set_failing(true);
        scene.tick(STEP);
        assert_eq!(scene.model().material.env_map, map);
        assert_eq!(scene.reflections().failures(), 1);
    }

    #[test]
    fn unmount_is_final_and_idempotent() {
        let mut scene = mount_with(affordable());
        scene.on_activate_input(true);
        run(&mut scene, 0.5);
        scene.unmount();
        scene.unmount();

        assert!(!scene.is_mounted());
        assert!(scene.reflections().is_disposed());
        assert_eq!(scene.model().material.env_map, None);

        let frame = scene.snapshot().frame;
        let snap = scene.tick(STEP);
        assert_eq!(snap.frame, frame);
        assert!(snap.events.is_empty());
        assert!(!scene.on_activate_input(true));
        assert!(!scene.on_pointer_move(Vec3::ONE));
    }

    #[test]
    fn resize_updates_aspect() {
        let mut scene = mount_with(FlightConfig::default());
        scene.resize(1000, 500);
        assert_eq!(scene.camera().aspect(), 2.0);
        scene.resize(0, 500);
        assert_eq!(scene.camera().aspect(), 2.0);
    }
}
