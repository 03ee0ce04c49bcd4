//! Turbo / FTL state machine.
//!
//! A jump cycle runs Idle → Charging → Jumping → Resetting → Idle. Charging
//! can be cancelled back to Idle, and a charge that finishes without enough
//! energy skips the jump and goes straight to Resetting. A cooldown window
//! opens when Resetting starts and outlives it.
//!
//! All timing is derived from one clock advanced by [`TurboController::tick`].
//! Each phase carries at most one deadline; cancelling or superseding a phase
//! simply clears it, so nothing stale can fire later. A tick is cut at every
//! deadline it crosses; each slice updates energy and charge, then visual
//! effects, and the transition fires at the end of its slice.

use engine_core::{lerp, lerp_factor};
use renderer::VisualEffects;
use serde::{Deserialize, Serialize};

/// Effects while the jump is in progress.
pub const JUMP_EFFECTS: VisualEffects = VisualEffects {
    distortion: 5.0,
    chromatic_aberration: 1.0,
    motion_blur: 0.8,
    glow_intensity: 3.0,
};

/// Per-second decay rates back to baseline while resetting.
const EFFECT_DECAY_RATE: f32 = 2.0;
const BLUR_DECAY_RATE: f32 = 3.0;
/// Decaying effects snap to baseline once every value is this close.
const EFFECT_SETTLE_EPSILON: f32 = 1e-3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurboPhase {
    Idle,
    Charging,
    Jumping,
    Resetting,
}

/// One phase change, dated on the state machine's clock (seconds).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseChange {
    pub from: TurboPhase,
    pub to: TurboPhase,
    pub at: f32,
}

/// Energy model and timings. Rates are per second, durations in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurboSettings {
    pub max_energy: f32,
    pub energy_recharge_rate: f32,
    pub energy_consumption_rate: f32,
    /// Fraction of full FTL charge gained per second while charging.
    pub ftl_charge_rate: f32,
    /// Fraction of full FTL charge lost per second otherwise.
    pub ftl_discharge_rate: f32,
    /// Share of `max_energy` needed to start and to complete a jump.
    pub ftl_threshold_ratio: f32,
    pub charge_duration: f32,
    pub jump_duration: f32,
    pub reset_duration: f32,
    pub cooldown_duration: f32,
}

impl Default for TurboSettings {
    fn default() -> Self {
        Self {
            max_energy: 100.0,
            energy_recharge_rate: 5.0,
            energy_consumption_rate: 20.0,
            ftl_charge_rate: 0.5,
            ftl_discharge_rate: 2.0,
            ftl_threshold_ratio: 0.8,
            charge_duration: 1.5,
            jump_duration: 1.0,
            reset_duration: 1.2,
            cooldown_duration: 3.0,
        }
    }
}

impl TurboSettings {
    /// Energy needed for a jump.
    pub fn ftl_threshold(&self) -> f32 {
        self.max_energy * self.ftl_threshold_ratio
    }

    fn sanitized(mut self) -> Self {
        self.max_energy = self.max_energy.max(0.0);
        self.charge_duration = self.charge_duration.max(0.0);
        self.jump_duration = self.jump_duration.max(0.0);
        self.reset_duration = self.reset_duration.max(0.0);
        self.cooldown_duration = self.cooldown_duration.max(0.0);
        self
    }
}

/// Owns every piece of turbo state. Nothing outside this type writes it.
#[derive(Debug, Clone)]
pub struct TurboController {
    settings: TurboSettings,
    phase: TurboPhase,
    /// Seconds since creation.
    now: f32,
    phase_started: f32,
    /// When the current phase ends on its own.
    deadline: Option<f32>,
    cooldown_started: Option<f32>,

    charge_progress: f32,
    energy: f32,
    ftl_charge: f32,
    cooldown_progress: f32,
    cooldown_active: bool,
    can_activate: bool,
    /// The current cycle reached Jumping (an aborted charge did not).
    jumped: bool,
    effects: VisualEffects,

    changes: Vec<PhaseChange>,
    halted: bool,
}

impl TurboController {
    pub fn new(settings: TurboSettings) -> Self {
        let settings = settings.sanitized();
        Self {
            settings,
            phase: TurboPhase::Idle,
            now: 0.0,
            phase_started: 0.0,
            deadline: None,
            cooldown_started: None,
            charge_progress: 0.0,
            energy: settings.max_energy,
            ftl_charge: 0.0,
            cooldown_progress: 0.0,
            cooldown_active: false,
            can_activate: true,
            jumped: false,
            effects: VisualEffects::BASELINE,
            changes: Vec::new(),
            halted: false,
        }
    }

    /// Try to start charging. Needs Idle, no activation in flight, and enough energy.
    pub fn activate(&mut self) -> bool {
        if self.halted || self.phase != TurboPhase::Idle || !self.can_activate {
            return false;
        }
        if self.energy < self.settings.ftl_threshold() {
            log::debug!(
                "Turbo refused: energy {:.1} below threshold {:.1}",
                self.energy,
                self.settings.ftl_threshold()
            );
            return false;
        }

        self.clear_pending();
        self.cooldown_active = false;
        self.cooldown_progress = 0.0;
        self.charge_progress = 0.0;
        self.can_activate = false;
        self.jumped = false;
        self.enter(TurboPhase::Charging, self.now);
        true
    }

    /// Abandon a charge in progress. No-op outside Charging, so repeated calls are harmless.
    pub fn cancel(&mut self) -> bool {
        if self.halted || self.phase != TurboPhase::Charging {
            return false;
        }
        self.clear_pending();
        self.charge_progress = 0.0;
        self.can_activate = true;
        self.enter(TurboPhase::Idle, self.now);
        true
    }

    /// Remove energy outside the normal per-second model.
    pub fn drain_energy(&mut self, amount: f32) {
        if amount.is_finite() && amount > 0.0 {
            self.energy = (self.energy - amount).max(0.0);
        }
    }

    /// Drop every pending deadline and stop responding. Used on unmount.
    pub fn shutdown(&mut self) {
        self.clear_pending();
        self.halted = true;
    }

    /// Advance the clock by `dt` seconds.
    ///
    /// The step is split at every deadline it crosses: energy and charge are
    /// integrated up to the deadline under the old phase, the transition fires,
    /// and the remainder runs under the new phase. The outcome does not depend
    /// on how the host slices its frames.
    pub fn tick(&mut self, dt: f32) {
        if self.halted {
            return;
        }
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            log::warn!("Turbo tick ignored bad delta {dt}");
            0.0
        };
        let end = self.now + dt;

        while let Some(deadline) = self.deadline.filter(|d| *d <= end) {
            self.advance_to(deadline);
            self.fire_deadline(deadline);
        }
        self.advance_to(end);
        self.update_cooldown();
        self.enforce_invariants();
    }

    /// Phase changes since the last call.
    pub fn take_changes(&mut self) -> Vec<PhaseChange> {
        std::mem::take(&mut self.changes)
    }

    fn update_energy(&mut self, dt: f32) {
        let s = &self.settings;
        match self.phase {
            TurboPhase::Charging => {
                self.energy -= s.energy_consumption_rate * dt;
                self.ftl_charge += s.ftl_charge_rate * 100.0 * dt;
            }
            TurboPhase::Jumping => {
                self.energy -= s.energy_consumption_rate * dt;
                self.ftl_charge -= s.ftl_discharge_rate * 100.0 * dt;
            }
            TurboPhase::Idle => {
                self.energy += s.energy_recharge_rate * dt;
                self.ftl_charge -= s.ftl_discharge_rate * 100.0 * dt;
            }
            TurboPhase::Resetting => {
                self.ftl_charge -= s.ftl_discharge_rate * 100.0 * dt;
            }
        }
        self.energy = self.energy.clamp(0.0, s.max_energy);
        self.ftl_charge = self.ftl_charge.clamp(0.0, 100.0);
    }

    fn update_charge_progress(&mut self) {
        if self.phase == TurboPhase::Charging {
            self.charge_progress = self.fraction_elapsed(self.settings.charge_duration);
        }
    }

    /// Integrate the continuous state up to clock time `to` under the current phase.
    fn advance_to(&mut self, to: f32) {
        let step = (to - self.now).max(0.0);
        self.now = to.max(self.now);
        self.update_energy(step);
        self.update_charge_progress();
        self.update_effects(step);
    }

    fn fire_deadline(&mut self, deadline: f32) {
        match self.phase {
            TurboPhase::Charging => {
                // Energy kept draining during the charge; check it again now.
                if self.energy >= self.settings.ftl_threshold() {
                    self.ftl_charge = 0.0;
                    self.charge_progress = 1.0;
                    self.jumped = true;
                    log::info!("FTL jump");
                    self.enter(TurboPhase::Jumping, deadline);
                } else {
                    log::debug!("Charge complete but energy {:.1} too low, aborting", self.energy);
                    self.begin_reset(deadline);
                }
            }
            TurboPhase::Jumping => self.begin_reset(deadline),
            TurboPhase::Resetting => {
                self.charge_progress = 0.0;
                self.can_activate = true;
                self.jumped = false;
                self.enter(TurboPhase::Idle, deadline);
            }
            TurboPhase::Idle => {
                debug_assert!(false, "Idle has no deadline");
                self.deadline = None;
            }
        }
    }

    fn begin_reset(&mut self, at: f32) {
        self.cooldown_started = Some(at);
        self.cooldown_active = true;
        self.cooldown_progress = 0.0;
        self.enter(TurboPhase::Resetting, at);
    }

    fn update_cooldown(&mut self) {
        let Some(started) = self.cooldown_started else {
            return;
        };
        let duration = self.settings.cooldown_duration;
        self.cooldown_progress = if duration > 0.0 {
            ((self.now - started) / duration).clamp(0.0, 1.0)
        } else {
            1.0
        };
        if self.cooldown_progress >= 1.0 {
            self.cooldown_active = false;
            self.cooldown_started = None;
        }
    }

    fn update_effects(&mut self, dt: f32) {
        self.effects = match self.phase {
            TurboPhase::Charging => charging_effects(self.charge_progress),
            TurboPhase::Jumping => JUMP_EFFECTS,
            TurboPhase::Resetting | TurboPhase::Idle => decay_effects(&self.effects, dt),
        };
    }

    fn enforce_invariants(&mut self) {
        debug_assert!(self.energy >= 0.0 && self.energy <= self.settings.max_energy);
        debug_assert!((0.0..=100.0).contains(&self.ftl_charge));
        if !self.energy.is_finite() {
            self.energy = 0.0;
        }
        if !self.effects.is_finite() {
            self.effects = VisualEffects::BASELINE;
        }
    }

    /// Switch phase at clock time `at`, arming the new phase's deadline.
    fn enter(&mut self, to: TurboPhase, at: f32) {
        let from = self.phase;
        self.phase = to;
        self.phase_started = at;
        self.deadline = self.phase_duration(to).map(|d| at + d);
        log::debug!("Turbo {from:?} -> {to:?} at {at:.3}s");
        self.changes.push(PhaseChange { from, to, at });
    }

    fn phase_duration(&self, phase: TurboPhase) -> Option<f32> {
        match phase {
            TurboPhase::Idle => None,
            TurboPhase::Charging => Some(self.settings.charge_duration),
            TurboPhase::Jumping => Some(self.settings.jump_duration),
            TurboPhase::Resetting => Some(self.settings.reset_duration),
        }
    }

    fn clear_pending(&mut self) {
        self.deadline = None;
        self.cooldown_started = None;
    }

    fn fraction_elapsed(&self, duration: f32) -> f32 {
        if duration > 0.0 {
            ((self.now - self.phase_started) / duration).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    // Queries

    /// The scalar every other system follows: 1 during a jump, easing back to 0
    /// over the reset that follows it, 0 otherwise.
    pub fn intensity(&self) -> f32 {
        match self.phase {
            TurboPhase::Jumping => 1.0,
            TurboPhase::Resetting if self.jumped => {
                1.0 - self.fraction_elapsed(self.settings.reset_duration)
            }
            _ => 0.0,
        }
    }

    pub fn phase(&self) -> TurboPhase {
        self.phase
    }

    pub fn is_idle(&self) -> bool {
        self.phase == TurboPhase::Idle
    }

    pub fn is_charging(&self) -> bool {
        self.phase == TurboPhase::Charging
    }

    pub fn is_jumping(&self) -> bool {
        self.phase == TurboPhase::Jumping
    }

    pub fn is_resetting(&self) -> bool {
        self.phase == TurboPhase::Resetting
    }

    pub fn charge_progress(&self) -> f32 {
        self.charge_progress
    }

    pub fn energy(&self) -> f32 {
        self.energy
    }

    pub fn max_energy(&self) -> f32 {
        self.settings.max_energy
    }

    pub fn ftl_threshold(&self) -> f32 {
        self.settings.ftl_threshold()
    }

    pub fn ftl_charge(&self) -> f32 {
        self.ftl_charge
    }

    pub fn cooldown_progress(&self) -> f32 {
        self.cooldown_progress
    }

    pub fn is_cooldown_active(&self) -> bool {
        self.cooldown_active
    }

    /// True once the previous cycle's reset finished, even if cooldown is still running.
    pub fn can_activate(&self) -> bool {
        self.can_activate && !self.halted
    }

    pub fn is_ftl_ready(&self) -> bool {
        self.ftl_charge >= 100.0 && self.energy >= self.settings.ftl_threshold()
    }

    /// Stricter gate for UI: idle, enough energy, and out of cooldown.
    pub fn can_activate_ftl(&self) -> bool {
        self.can_activate()
            && self.phase == TurboPhase::Idle
            && !self.cooldown_active
            && self.energy >= self.settings.ftl_threshold()
    }

    pub fn energy_percentage(&self) -> f32 {
        if self.settings.max_energy > 0.0 {
            self.energy / self.settings.max_energy * 100.0
        } else {
            0.0
        }
    }

    pub fn ftl_charge_percentage(&self) -> f32 {
        self.ftl_charge
    }

    pub fn is_energy_critical(&self) -> bool {
        self.energy < self.settings.ftl_threshold() / 2.0
    }

    pub fn visual_effects(&self) -> &VisualEffects {
        &self.effects
    }

    /// Seconds on the state machine's clock.
    pub fn now(&self) -> f32 {
        self.now
    }

    pub fn settings(&self) -> &TurboSettings {
        &self.settings
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }
}

/// Effects ramp linearly with charge progress.
fn charging_effects(progress: f32) -> VisualEffects {
    VisualEffects {
        distortion: progress * 2.0,
        chromatic_aberration: progress * 0.5,
        motion_blur: 0.0,
        glow_intensity: VisualEffects::BASELINE.glow_intensity + progress * 2.0,
    }
}

fn decay_effects(current: &VisualEffects, dt: f32) -> VisualEffects {
    let base = VisualEffects::BASELINE;
    let t = lerp_factor(EFFECT_DECAY_RATE, dt);
    let decayed = VisualEffects {
        distortion: lerp(current.distortion, base.distortion, t),
        chromatic_aberration: lerp(current.chromatic_aberration, base.chromatic_aberration, t),
        motion_blur: lerp(current.motion_blur, base.motion_blur, lerp_factor(BLUR_DECAY_RATE, dt)),
        glow_intensity: lerp(current.glow_intensity, base.glow_intensity, t),
    };
    let settled = (decayed.distortion - base.distortion).abs() < EFFECT_SETTLE_EPSILON
        && (decayed.chromatic_aberration - base.chromatic_aberration).abs() < EFFECT_SETTLE_EPSILON
        && (decayed.motion_blur - base.motion_blur).abs() < EFFECT_SETTLE_EPSILON
        && (decayed.glow_intensity - base.glow_intensity).abs() < EFFECT_SETTLE_EPSILON;
    if settled {
        base
    } else {
        decayed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    /// Exact in binary, so clock sums land on the deadlines.
    const STEP: f32 = 0.125;

    fn run(turbo: &mut TurboController, seconds: f32) {
        let steps = (seconds / STEP).round() as usize;
        for _ in 0..steps {
            turbo.tick(STEP);
        }
    }

    /// Drains slowly enough that a full charge can still afford the jump.
    fn affordable() -> TurboSettings {
        TurboSettings { energy_consumption_rate: 10.0, ..Default::default() }
    }

    fn phase_flags(t: &TurboController) -> usize {
        [t.is_idle(), t.is_charging(), t.is_jumping(), t.is_resetting()]
            .iter()
            .filter(|f| **f)
            .count()
    }

    #[test]
    fn starts_idle_with_full_energy() {
        let t = TurboController::new(TurboSettings::default());
        assert_eq!(t.phase(), TurboPhase::Idle);
        assert_eq!(t.energy(), 100.0);
        assert_eq!(t.ftl_threshold(), 80.0);
        assert!(t.can_activate());
        assert!(t.can_activate_ftl());
        assert_eq!(*t.visual_effects(), VisualEffects::BASELINE);
        assert_eq!(t.intensity(), 0.0);
    }

    #[test]
    fn default_constants_abort_to_resetting() {
        // 20/s over a 1.5s charge leaves 70 of 100, under the threshold of 80.
        let mut t = TurboController::new(TurboSettings::default());
        assert!(t.activate());
        assert_eq!(t.phase(), TurboPhase::Charging);

        run(&mut t, 1.375);
        assert_eq!(t.phase(), TurboPhase::Charging);

        t.tick(STEP);
        assert_eq!(t.phase(), TurboPhase::Resetting);
        assert!((t.energy() - 70.0).abs() < 1e-3);
        assert!(t.is_cooldown_active());
        assert_eq!(t.intensity(), 0.0);

        let changes = t.take_changes();
        let tos: Vec<TurboPhase> = changes.iter().map(|c| c.to).collect();
        assert_eq!(tos, vec![TurboPhase::Charging, TurboPhase::Resetting]);
        assert_eq!(changes[1].at, 1.5);
    }

    #[test]
    fn energy_checked_again_when_charge_completes() {
        let zero_drain = TurboSettings { energy_consumption_rate: 0.0, ..Default::default() };

        let mut control = TurboController::new(zero_drain);
        control.drain_energy(20.0);
        assert_eq!(control.energy(), control.ftl_threshold());
        assert!(control.activate());
        run(&mut control, 1.5);
        assert_eq!(control.phase(), TurboPhase::Jumping);

        let mut raced = TurboController::new(zero_drain);
        raced.drain_energy(20.0);
        assert!(raced.activate());
        run(&mut raced, 1.0);
        raced.drain_energy(1.0);
        run(&mut raced, 0.5);
        assert_eq!(raced.phase(), TurboPhase::Resetting);
        assert!(raced.take_changes().iter().all(|c| c.to != TurboPhase::Jumping));
    }

    #[test]
    fn full_cycle_with_affordable_charge() {
        let mut t = TurboController::new(affordable());
        assert!(t.activate());
        run(&mut t, 1.5);
        assert_eq!(t.phase(), TurboPhase::Jumping);
        assert_eq!(t.charge_progress(), 1.0);
        assert_eq!(t.ftl_charge(), 0.0);
        assert_eq!(t.intensity(), 1.0);
        assert_eq!(*t.visual_effects(), JUMP_EFFECTS);
        assert!(!t.can_activate());

        run(&mut t, 1.0);
        assert_eq!(t.phase(), TurboPhase::Resetting);
        assert!(t.intensity() > 0.0 && t.intensity() <= 1.0);

        run(&mut t, 1.25);
        assert_eq!(t.phase(), TurboPhase::Idle);
        assert!(t.can_activate());
        assert_eq!(t.charge_progress(), 0.0);
        assert_eq!(t.intensity(), 0.0);
        // Cooldown runs 3s from the start of the reset, past its 1.2s.
        assert!(t.is_cooldown_active());
        assert!(!t.can_activate_ftl());

        run(&mut t, 1.75);
        assert!(!t.is_cooldown_active());
        assert_eq!(t.cooldown_progress(), 1.0);
    }

    #[test]
    fn activation_needs_threshold_energy() {
        let mut t = TurboController::new(TurboSettings::default());
        t.drain_energy(25.0);
        assert!(!t.activate());
        assert_eq!(t.phase(), TurboPhase::Idle);
        assert!(t.take_changes().is_empty());
    }

    #[test]
    fn activation_refused_mid_cycle() {
        let mut t = TurboController::new(affordable());
        assert!(t.activate());
        assert!(!t.activate());
        run(&mut t, 1.5);
        assert!(!t.activate());
        assert_eq!(t.phase(), TurboPhase::Jumping);
    }

    #[test]
    fn cancel_twice_equals_cancel_once() {
        let mut t = TurboController::new(TurboSettings::default());
        assert!(t.activate());
        run(&mut t, 0.5);
        assert!(t.charge_progress() > 0.0);

        assert!(t.cancel());
        assert!(!t.cancel());
        assert_eq!(t.phase(), TurboPhase::Idle);
        assert_eq!(t.charge_progress(), 0.0);
        assert!(t.can_activate());
        t.take_changes();

        run(&mut t, 5.0);
        assert_eq!(t.phase(), TurboPhase::Idle);
        assert!(t.take_changes().is_empty());
        assert!(!t.is_cooldown_active());
    }

    #[test]
    fn cancel_outside_charging_is_ignored() {
        let mut t = TurboController::new(affordable());
        assert!(!t.cancel());
        t.activate();
        run(&mut t, 1.5);
        assert!(!t.cancel());
        assert_eq!(t.phase(), TurboPhase::Jumping);
    }

    #[test]
    fn reactivation_allowed_during_cooldown_and_clears_it() {
        let mut t = TurboController::new(TurboSettings {
            energy_consumption_rate: 5.0,
            ..Default::default()
        });
        t.activate();
        run(&mut t, 3.75);
        assert!(t.is_idle() && t.is_cooldown_active() && t.can_activate());
        // 100 - 7.5 for the charge - 5 for the jump, still above threshold.
        assert!(t.energy() >= t.ftl_threshold());
        assert!(t.activate());
        assert!(!t.is_cooldown_active());
        assert_eq!(t.cooldown_progress(), 0.0);
    }

    #[test]
    fn charging_effects_ramp_with_progress() {
        let mut t = TurboController::new(TurboSettings::default());
        t.activate();
        run(&mut t, 0.75);
        let fx = *t.visual_effects();
        assert!((t.charge_progress() - 0.5).abs() < 1e-5);
        assert!((fx.distortion - 1.0).abs() < 1e-4);
        assert!((fx.chromatic_aberration - 0.25).abs() < 1e-4);
        assert!((fx.glow_intensity - 1.3).abs() < 1e-4);
        assert_eq!(fx.motion_blur, 0.0);
    }

    #[test]
    fn resetting_effects_decay_toward_baseline() {
        let mut t = TurboController::new(affordable());
        t.activate();
        run(&mut t, 2.5);
        assert!(t.is_resetting());
        // The reset starts on this frame boundary, so nothing has decayed yet.
        assert_eq!(*t.visual_effects(), JUMP_EFFECTS);
        t.tick(STEP);
        let mut last = *t.visual_effects();
        assert!(last.distortion < JUMP_EFFECTS.distortion);
        for _ in 0..8 {
            t.tick(STEP);
            let fx = *t.visual_effects();
            if !t.is_resetting() {
                break;
            }
            assert!(fx.distortion < last.distortion);
            assert!(fx.motion_blur < last.motion_blur);
            assert!(fx.glow_intensity > VisualEffects::BASELINE.glow_intensity);
            last = fx;
        }
    }

    #[test]
    fn ftl_charge_rises_while_charging_and_decays_after() {
        let mut t = TurboController::new(TurboSettings::default());
        t.activate();
        run(&mut t, 1.0);
        assert!((t.ftl_charge() - 50.0).abs() < 1e-3);
        assert!(!t.is_ftl_ready());
        t.cancel();
        run(&mut t, 0.125);
        assert!((t.ftl_charge() - 25.0).abs() < 1e-3);
        run(&mut t, 1.0);
        assert_eq!(t.ftl_charge(), 0.0);
    }

    #[test]
    fn ftl_ready_needs_full_charge_and_energy() {
        let slow = TurboSettings { charge_duration: 3.0, energy_consumption_rate: 0.0, ..Default::default() };
        let mut t = TurboController::new(slow);
        t.activate();
        run(&mut t, 2.0);
        assert_eq!(t.ftl_charge(), 100.0);
        assert!(t.is_ftl_ready());
    }

    #[test]
    fn gauges() {
        let mut t = TurboController::new(TurboSettings::default());
        t.drain_energy(65.0);
        assert!((t.energy_percentage() - 35.0).abs() < 1e-4);
        assert!(t.is_energy_critical());
        assert!(!t.can_activate_ftl());
        t.drain_energy(1000.0);
        assert_eq!(t.energy(), 0.0);
    }

    #[test]
    fn long_tick_crosses_several_deadlines_in_order() {
        let mut t = TurboController::new(TurboSettings {
            energy_consumption_rate: 0.0,
            ..Default::default()
        });
        t.activate();
        t.take_changes();
        t.tick(10.0);
        let changes = t.take_changes();
        let path: Vec<(TurboPhase, f32)> = changes.iter().map(|c| (c.to, c.at)).collect();
        assert_eq!(
            path,
            vec![
                (TurboPhase::Jumping, 1.5),
                (TurboPhase::Resetting, 2.5),
                (TurboPhase::Idle, 3.7),
            ]
        );
        assert!(!t.is_cooldown_active());
    }

    #[test]
    fn long_tick_with_drain_dates_abort_at_the_deadline() {
        let mut t = TurboController::new(TurboSettings::default());
        t.activate();
        t.take_changes();
        t.tick(10.0);
        let path: Vec<(TurboPhase, f32)> = t.take_changes().iter().map(|c| (c.to, c.at)).collect();
        assert_eq!(path, vec![(TurboPhase::Resetting, 1.5), (TurboPhase::Idle, 2.7)]);
    }

    #[test]
    fn coarse_and_fine_ticks_agree_across_the_charge_deadline() {
        // 13/s leaves 80.5 at the deadline (jump); 14/s leaves 79 (abort).
        for (rate, expected) in [(13.0, TurboPhase::Jumping), (14.0, TurboPhase::Resetting)] {
            let settings = TurboSettings { energy_consumption_rate: rate, ..Default::default() };

            let mut fine = TurboController::new(settings);
            fine.activate();
            for _ in 0..16 {
                fine.tick(0.1);
            }

            let mut coarse = TurboController::new(settings);
            coarse.activate();
            coarse.tick(1.6);

            assert_eq!(fine.phase(), expected, "rate {rate}");
            assert_eq!(coarse.phase(), expected, "rate {rate}");
            assert!((fine.energy() - coarse.energy()).abs() < 1e-3, "rate {rate}");
            let dated = |t: &mut TurboController| t.take_changes().last().map(|c| c.at);
            assert_eq!(dated(&mut fine), Some(1.5));
            assert_eq!(dated(&mut coarse), Some(1.5));
        }
    }

    #[test]
    fn idle_effects_keep_decaying_after_reset() {
        let mut t = TurboController::new(affordable());
        t.activate();
        run(&mut t, 3.625);
        assert!(t.is_resetting());
        let last_resetting = *t.visual_effects();

        t.tick(STEP);
        assert!(t.is_idle());
        let first_idle = *t.visual_effects();
        assert!(first_idle.distortion > 0.0);
        assert!(first_idle.distortion < last_resetting.distortion);
        assert!(first_idle.glow_intensity > VisualEffects::BASELINE.glow_intensity);

        run(&mut t, 5.0);
        assert_eq!(*t.visual_effects(), VisualEffects::BASELINE);
    }

    #[test]
    fn shutdown_cancels_everything() {
        let mut t = TurboController::new(affordable());
        t.activate();
        run(&mut t, 0.5);
        t.shutdown();
        t.take_changes();
        run(&mut t, 5.0);
        assert_eq!(t.phase(), TurboPhase::Charging);
        assert!(t.take_changes().is_empty());
        assert!(!t.activate());
        assert!(!t.can_activate());
    }

    #[test]
    fn bad_deltas_do_not_move_the_clock() {
        let mut t = TurboController::new(TurboSettings::default());
        t.tick(f32::NAN);
        t.tick(-1.0);
        assert_eq!(t.now(), 0.0);
    }

    #[test]
    fn energy_and_charge_stay_in_range_under_random_use() {
        let mut rng = StdRng::seed_from_u64(42);
        for settings in [TurboSettings::default(), affordable()] {
            let mut t = TurboController::new(settings);
            for _ in 0..5000 {
                match rng.gen_range(0..10) {
                    0 => {
                        t.activate();
                    }
                    1 => {
                        t.cancel();
                    }
                    2 => t.drain_energy(rng.gen::<f32>() * 30.0),
                    _ => t.tick(rng.gen::<f32>() * 0.3),
                }
                assert!(t.energy() >= 0.0 && t.energy() <= t.max_energy());
                assert!(t.ftl_charge() >= 0.0 && t.ftl_charge() <= 100.0);
                assert!((0.0..=1.0).contains(&t.charge_progress()));
                assert!((0.0..=1.0).contains(&t.cooldown_progress()));
                assert!((0.0..=1.0).contains(&t.intensity()));
                assert_eq!(phase_flags(&t), 1);
            }
        }
    }
}
