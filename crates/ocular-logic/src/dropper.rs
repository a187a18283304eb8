//! Eye dropper and pupil dilation.
//!
//! The dropper rises off its tray, hangs over the eye, and releases one drop
//! per squeeze. Drops fall a fixed distance; each one that lands asks the
//! pupil to dilate, which it only does if the patient's eye reacts.

use serde::{Deserialize, Serialize};

use crate::cadence::PatientProfile;
use crate::math::move_towards;
use crate::tuning::{require_non_negative, TuningError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DropperTuning {
    /// Seconds from leaving the tray to hanging over the eye.
    pub rise_duration: f32,
    /// Seconds a squeeze keeps the dropper busy.
    pub squeeze_duration: f32,
    /// Distance from the dropper tip to the eye surface.
    pub drop_distance: f32,
    /// Drop fall speed (distance per second).
    pub drop_speed: f32,
    /// Pupil dilation change per second, in [0, 1] units.
    pub dilation_speed: f32,
}

impl Default for DropperTuning {
    fn default() -> Self {
        Self {
            rise_duration: 0.6,
            squeeze_duration: 0.35,
            drop_distance: 0.08,
            drop_speed: 0.4,
            dilation_speed: 2.0,
        }
    }
}

impl DropperTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        require_non_negative("dropper.rise_duration", self.rise_duration)?;
        require_non_negative("dropper.squeeze_duration", self.squeeze_duration)?;
        require_non_negative("dropper.drop_distance", self.drop_distance)?;
        require_non_negative("dropper.drop_speed", self.drop_speed)?;
        require_non_negative("dropper.dilation_speed", self.dilation_speed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DropperState {
    OnTray,
    Rising { remaining: f32 },
    PickedUp,
    Squeezing { remaining: f32 },
}

#[derive(Debug, Clone)]
pub struct Dropper {
    tuning: DropperTuning,
    state: DropperState,
    /// Remaining fall distance of each drop in the air.
    drops: Vec<f32>,
}

impl Dropper {
    pub fn new(tuning: DropperTuning) -> Self {
        Self {
            tuning,
            state: DropperState::OnTray,
            drops: Vec::new(),
        }
    }

    pub fn state(&self) -> DropperState {
        self.state
    }

    pub fn drops_in_flight(&self) -> &[f32] {
        &self.drops
    }

    /// Lift off the tray. Only works from the tray.
    pub fn pick_up(&mut self) -> bool {
        if self.state != DropperState::OnTray {
            return false;
        }
        self.state = DropperState::Rising {
            remaining: self.tuning.rise_duration,
        };
        true
    }

    /// Back to the tray. Only works while hanging idle over the eye.
    pub fn put_down(&mut self) -> bool {
        if self.state != DropperState::PickedUp {
            return false;
        }
        self.state = DropperState::OnTray;
        true
    }

    /// Release a drop. Only works while hanging idle over the eye.
    pub fn squeeze(&mut self) -> bool {
        if self.state != DropperState::PickedUp {
            return false;
        }
        self.drops.push(self.tuning.drop_distance);
        self.state = DropperState::Squeezing {
            remaining: self.tuning.squeeze_duration,
        };
        true
    }

    /// Advance by `dt` seconds. Returns how many drops reached the eye.
    pub fn step(&mut self, dt: f32) -> usize {
        let dt = dt.max(0.0);

        self.state = match self.state {
            DropperState::Rising { remaining } | DropperState::Squeezing { remaining }
                if remaining - dt <= 0.0 =>
            {
                DropperState::PickedUp
            }
            DropperState::Rising { remaining } => DropperState::Rising {
                remaining: remaining - dt,
            },
            DropperState::Squeezing { remaining } => DropperState::Squeezing {
                remaining: remaining - dt,
            },
            other => other,
        };

        let fall = self.tuning.drop_speed * dt;
        let before = self.drops.len();
        self.drops.retain_mut(|left| {
            *left -= fall;
            *left > 0.0
        });
        before - self.drops.len()
    }
}

impl Default for Dropper {
    fn default() -> Self {
        Self::new(DropperTuning::default())
    }
}

/// Pupil dilation in [0, 1], easing toward fully dilated or at rest.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pupil {
    dilated: bool,
    amount: f32,
    speed: f32,
}

impl Pupil {
    pub fn new(speed: f32) -> Self {
        Self {
            dilated: false,
            amount: 0.0,
            speed,
        }
    }

    pub fn is_dilated(&self) -> bool {
        self.dilated
    }

    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// A drop reached the eye. Returns whether the pupil reacts.
    pub fn drop_landed(&mut self, patient: &PatientProfile) -> bool {
        if patient.dilates() {
            self.dilated = true;
        }
        self.dilated
    }

    /// Back to rest, e.g. after a verdict or a patient change.
    pub fn reset(&mut self) {
        self.dilated = false;
    }

    pub fn step(&mut self, dt: f32) {
        let target = if self.dilated { 1.0 } else { 0.0 };
        self.amount = move_towards(self.amount, target, self.speed * dt.max(0.0));
    }
}

impl Default for Pupil {
    fn default() -> Self {
        Self::new(DropperTuning::default().dilation_speed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn raised() -> Dropper {
        let mut dropper = Dropper::default();
        assert!(dropper.pick_up());
        for _ in 0..60 {
            dropper.step(DT);
        }
        assert_eq!(dropper.state(), DropperState::PickedUp);
        dropper
    }

    #[test]
    fn test_pick_up_only_from_tray() {
        let mut dropper = Dropper::default();
        assert!(!dropper.squeeze());
        assert!(!dropper.put_down());
        assert!(dropper.pick_up());
        assert!(matches!(dropper.state(), DropperState::Rising { .. }));
        assert!(!dropper.pick_up());
        // still rising, so it cannot drip or go back yet
        assert!(!dropper.squeeze());
        assert!(!dropper.put_down());
    }

    #[test]
    fn test_squeeze_releases_one_drop_that_lands() {
        let mut dropper = raised();
        assert!(dropper.squeeze());
        assert_eq!(dropper.drops_in_flight().len(), 1);
        assert!(!dropper.squeeze());

        let tuning = DropperTuning::default();
        let settle = (tuning.drop_distance / tuning.drop_speed).max(tuning.squeeze_duration);
        let mut landed = 0;
        let mut t = 0.0;
        while t < settle + 0.1 {
            landed += dropper.step(DT);
            t += DT;
        }
        assert_eq!(landed, 1);
        assert!(dropper.drops_in_flight().is_empty());
        assert_eq!(dropper.state(), DropperState::PickedUp);
    }

    #[test]
    fn test_put_down_returns_to_tray() {
        let mut dropper = raised();
        assert!(dropper.put_down());
        assert_eq!(dropper.state(), DropperState::OnTray);
    }

    #[test]
    fn test_pupil_dilation_depends_on_patient() {
        let healthy = PatientProfile::default();
        let stubborn = PatientProfile {
            infected: true,
            ..PatientProfile::default()
        };
        let reactive = PatientProfile {
            infected: true,
            will_dilate: true,
            ..PatientProfile::default()
        };

        assert!(Pupil::default().drop_landed(&healthy));
        assert!(!Pupil::default().drop_landed(&stubborn));
        assert!(Pupil::default().drop_landed(&reactive));
    }

    #[test]
    fn test_pupil_eases_and_resets() {
        let mut pupil = Pupil::default();
        pupil.drop_landed(&PatientProfile::default());
        for _ in 0..60 {
            pupil.step(DT);
        }
        assert_eq!(pupil.amount(), 1.0);

        pupil.reset();
        pupil.step(DT);
        assert!(pupil.amount() < 1.0);
        for _ in 0..60 {
            pupil.step(DT);
        }
        assert_eq!(pupil.amount(), 0.0);
    }

    #[test]
    fn test_validation() {
        assert!(DropperTuning::default().validate().is_ok());
        let bad = DropperTuning {
            drop_speed: -1.0,
            ..DropperTuning::default()
        };
        assert!(bad.validate().is_err());
    }
}
