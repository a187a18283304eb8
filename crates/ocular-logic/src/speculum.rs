//! Speculum tool: placement on the eye and eyelid opening.
//!
//! The speculum travels between the tray and the eye along a placement clip
//! (time 0 = on tray, `placement_duration` = on eye). Once seated, its
//! opening weight chases the trigger input and the eye's Open channel
//! mirrors it. Squeezing agitates the eye. Putting it down while seated first
//! relaxes the opening, then the tool travels back to the tray, and the eye
//! may blink and twitch again once it lands.
//!
//! The speculum never touches the eye directly; every step returns the
//! [`EyeEffect`]s the caller should apply to the eyeball.

use serde::{Deserialize, Serialize};

use crate::math::move_towards;
use crate::motion::MotionState;
use crate::tuning::{require_non_negative, TuningError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SpeculumState {
    #[default]
    OnTray,
    OnAir,
    OnEye,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeculumTuning {
    /// Length of the tray → eye placement clip (seconds).
    pub placement_duration: f32,
    /// Chase gain toward the trigger target (per second, scaled by distance).
    pub catch_up_speed: f32,
    /// Weight units per second while relaxing before lift-off.
    pub reset_speed: f32,
    /// Opening weight at or below which the relax is considered done.
    pub reset_threshold: f32,
}

impl Default for SpeculumTuning {
    fn default() -> Self {
        Self {
            placement_duration: 0.8,
            catch_up_speed: 6.0,
            reset_speed: 150.0,
            reset_threshold: 0.5,
        }
    }
}

impl SpeculumTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        require_non_negative("speculum.placement_duration", self.placement_duration)?;
        require_non_negative("speculum.catch_up_speed", self.catch_up_speed)?;
        require_non_negative("speculum.reset_speed", self.reset_speed)?;
        require_non_negative("speculum.reset_threshold", self.reset_threshold)
    }
}

/// A change the speculum asks of the eyeball.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EyeEffect {
    SetMotionState(MotionState),
    SetCanAnimate(bool),
    SetEyeOpen(f32),
}

#[derive(Debug, Clone)]
pub struct Speculum {
    tuning: SpeculumTuning,
    state: SpeculumState,
    moving_towards_eye: bool,
    clip_time: f32,
    weight: f32,
    resetting: bool,
    trigger: f32,
}

impl Speculum {
    pub fn new(tuning: SpeculumTuning) -> Self {
        Self {
            tuning,
            state: SpeculumState::OnTray,
            moving_towards_eye: true,
            clip_time: 0.0,
            weight: 0.0,
            resetting: false,
            trigger: 0.0,
        }
    }

    pub fn state(&self) -> SpeculumState {
        self.state
    }

    /// Position along the placement clip, for the host to sample.
    pub fn clip_time(&self) -> f32 {
        self.clip_time
    }

    /// Opening weight in [0, 100].
    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn is_resetting(&self) -> bool {
        self.resetting
    }

    pub fn is_moving_towards_eye(&self) -> bool {
        self.moving_towards_eye
    }

    /// Trigger pressure in [0, 1].
    pub fn set_trigger(&mut self, value: f32) {
        self.trigger = if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) };
    }

    /// Lifted off the tray: head for the eye.
    pub fn picked_up(&mut self) -> Vec<EyeEffect> {
        if self.resetting {
            self.resetting = false;
        }
        self.moving_towards_eye = true;
        self.state = SpeculumState::OnAir;
        vec![EyeEffect::SetCanAnimate(false)]
    }

    /// Returned to the tray: relax first if seated, then head back.
    pub fn put_down(&mut self) {
        self.moving_towards_eye = false;
        if self.state == SpeculumState::OnEye {
            log::debug!("Speculum relax started");
            self.resetting = true;
        }
    }

    /// Trigger squeezed. Only agitates the eye while seated.
    pub fn pull_started(&mut self) -> Option<EyeEffect> {
        if self.state != SpeculumState::OnEye {
            return None;
        }
        Some(EyeEffect::SetMotionState(MotionState::Agitated))
    }

    /// Trigger released.
    pub fn pull_ended(&mut self) -> EyeEffect {
        EyeEffect::SetMotionState(MotionState::Idling)
    }

    /// Advance by `dt` seconds.
    pub fn step(&mut self, dt: f32) -> Vec<EyeEffect> {
        let dt = dt.max(0.0);
        let mut effects = Vec::new();

        match self.state {
            SpeculumState::OnTray => {}
            SpeculumState::OnEye if self.resetting => {
                self.weight = move_towards(self.weight, 0.0, self.tuning.reset_speed * dt);
                effects.push(EyeEffect::SetEyeOpen(self.weight));
                if self.weight <= self.tuning.reset_threshold {
                    self.weight = 0.0;
                    self.resetting = false;
                    self.state = SpeculumState::OnAir;
                    effects.push(EyeEffect::SetEyeOpen(0.0));
                    effects.push(EyeEffect::SetMotionState(MotionState::Idling));
                    log::debug!("Speculum relax finished");
                }
            }
            SpeculumState::OnEye => {
                let target = self.trigger * 100.0;
                let speed = (target - self.weight).abs() * self.tuning.catch_up_speed;
                self.weight = move_towards(self.weight, target, speed * dt);
                effects.push(EyeEffect::SetEyeOpen(self.weight));
            }
            SpeculumState::OnAir => {
                if self.moving_towards_eye {
                    self.clip_time += dt;
                    if self.clip_time >= self.tuning.placement_duration {
                        self.clip_time = self.tuning.placement_duration;
                        self.state = SpeculumState::OnEye;
                    }
                } else {
                    self.clip_time -= dt;
                    if self.clip_time <= 0.0 {
                        self.clip_time = 0.0;
                        self.state = SpeculumState::OnTray;
                        effects.push(EyeEffect::SetCanAnimate(true));
                    }
                }
            }
        }

        effects
    }
}

impl Default for Speculum {
    fn default() -> Self {
        Self::new(SpeculumTuning::default())
    }
}
