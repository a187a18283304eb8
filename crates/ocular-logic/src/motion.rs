//! Eyeball motion: state-conditioned jitter/saccade sampling and easing.
//!
//! Each step has two halves:
//! 1. The sampler checks the schedule for the active [`MotionState`] and may
//!    pick a new target rotation (micro jitter, corrective saccade, return to
//!    base, agitated drift or agitated base reset).
//! 2. The current rotation turns toward the target at a bounded angular
//!    speed, whichever branch fired.
//!
//! All waits are absolute timestamps on the controller's own clock, which
//! only advances through [`EyeMotion::step`].

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Deserializer, Serialize};

use crate::math::{quat_from_euler_deg, rotate_towards};
use crate::tuning::{
    require_non_negative, require_non_negative_range, sample_symmetric, IntervalRange,
    TuningError,
};

/// Behavioral state of the eyeball. Exactly one is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum MotionState {
    /// Small micro jitter plus occasional corrective saccades.
    #[default]
    Idling,
    /// About to look at a target. No sampling.
    StartTracking,
    /// Looking at a target; falls back to idling without one.
    Tracking,
    /// About to stop looking at a target. No sampling.
    EndTracking,
    /// Faster, wider saccades around a drifting base.
    Agitated,
}

impl MotionState {
    pub fn name(self) -> &'static str {
        match self {
            Self::Idling => "Idling",
            Self::StartTracking => "StartTracking",
            Self::Tracking => "Tracking",
            Self::EndTracking => "EndTracking",
            Self::Agitated => "Agitated",
        }
    }
}

/// Jitter and saccade parameters for one behavior.
///
/// Deserializing a bare profile needs every field. Inside [`MotionTuning`]
/// each section fills its gaps from its own preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SaccadeProfile {
    /// Micro jitter extent per axis (degrees).
    pub micro_range: f32,
    /// Corrective saccade extent per axis (degrees).
    pub correction_range: f32,
    /// Easing speed toward the target (degrees per second).
    pub saccade_speed: f32,
    /// Seconds between micro jitters.
    pub micro_interval: IntervalRange,
    /// Seconds between corrective saccades.
    pub correction_interval: IntervalRange,
}

impl SaccadeProfile {
    pub fn idle() -> Self {
        Self {
            micro_range: 0.6,
            correction_range: 4.0,
            saccade_speed: 400.0,
            micro_interval: IntervalRange::new(0.08, 0.25),
            correction_interval: IntervalRange::new(1.5, 4.0),
        }
    }

    pub fn agitated() -> Self {
        Self {
            micro_range: 1.5,
            correction_range: 10.0,
            saccade_speed: 900.0,
            micro_interval: IntervalRange::new(0.03, 0.1),
            correction_interval: IntervalRange::new(0.25, 0.8),
        }
    }

    fn validate(&self, prefix: &'static str) -> Result<(), TuningError> {
        require_non_negative(prefix, self.micro_range)?;
        require_non_negative(prefix, self.correction_range)?;
        require_non_negative(prefix, self.saccade_speed)?;
        require_non_negative_range(prefix, &self.micro_interval)?;
        require_non_negative_range(prefix, &self.correction_interval)
    }
}

impl Default for SaccadeProfile {
    fn default() -> Self {
        Self::idle()
    }
}

/// A tuning-file section that overrides some fields of a preset profile.
#[derive(Debug, Deserialize)]
struct ProfileOverride {
    micro_range: Option<f32>,
    correction_range: Option<f32>,
    saccade_speed: Option<f32>,
    micro_interval: Option<IntervalRange>,
    correction_interval: Option<IntervalRange>,
}

impl ProfileOverride {
    fn apply(self, preset: SaccadeProfile) -> SaccadeProfile {
        SaccadeProfile {
            micro_range: self.micro_range.unwrap_or(preset.micro_range),
            correction_range: self.correction_range.unwrap_or(preset.correction_range),
            saccade_speed: self.saccade_speed.unwrap_or(preset.saccade_speed),
            micro_interval: self.micro_interval.unwrap_or(preset.micro_interval),
            correction_interval: self
                .correction_interval
                .unwrap_or(preset.correction_interval),
        }
    }
}

fn idle_section<'de, D: Deserializer<'de>>(d: D) -> Result<SaccadeProfile, D::Error> {
    Ok(ProfileOverride::deserialize(d)?.apply(SaccadeProfile::idle()))
}

fn agitated_section<'de, D: Deserializer<'de>>(d: D) -> Result<SaccadeProfile, D::Error> {
    Ok(ProfileOverride::deserialize(d)?.apply(SaccadeProfile::agitated()))
}

/// Tuning for the whole motion controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionTuning {
    #[serde(deserialize_with = "idle_section")]
    pub idle: SaccadeProfile,
    #[serde(deserialize_with = "agitated_section")]
    pub agitated: SaccadeProfile,
    /// Seconds between agitated snaps back to the fixed base.
    pub base_reset_interval: IntervalRange,
    /// Delay before an idle corrective saccade returns to base.
    pub return_to_base_delay: f32,
}

impl Default for MotionTuning {
    fn default() -> Self {
        Self {
            idle: SaccadeProfile::idle(),
            agitated: SaccadeProfile::agitated(),
            base_reset_interval: IntervalRange::new(2.0, 5.0),
            return_to_base_delay: 1.0,
        }
    }
}

impl MotionTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        self.idle.validate("motion.idle")?;
        self.agitated.validate("motion.agitated")?;
        require_non_negative_range("motion.base_reset_interval", &self.base_reset_interval)?;
        require_non_negative("motion.return_to_base_delay", self.return_to_base_delay)
    }

    /// Easing speed used while in `state`.
    pub fn speed_for(&self, state: MotionState) -> f32 {
        if state == MotionState::Agitated {
            self.agitated.saccade_speed
        } else {
            self.idle.saccade_speed
        }
    }
}

/// Reference, current and target orientations of the eyeball.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RotationState {
    /// Fixed reference orientation captured at activation.
    pub base: Quat,
    /// Orientation actually shown this step.
    pub current: Quat,
    /// Orientation the current rotation is easing toward.
    pub target: Quat,
    /// Agitated-only drifting reference; `None` until first agitated step.
    pub dynamic_base: Option<Quat>,
}

impl RotationState {
    pub fn at_rest(base: Quat) -> Self {
        Self {
            base,
            current: base,
            target: base,
            dynamic_base: None,
        }
    }
}

/// Absolute timestamps of the next sampler events.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TimingSchedule {
    pub next_micro: f32,
    pub next_correction: f32,
    pub return_to_base_at: Option<f32>,
    pub next_base_reset: Option<f32>,
}

/// What the sampler did during a step. Offsets are (pitch, yaw) in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SampleEvent {
    MicroJitter { pitch: f32, yaw: f32 },
    CorrectiveSaccade { pitch: f32, yaw: f32 },
    ReturnToBase,
    AgitatedJitter { pitch: f32, yaw: f32 },
    DynamicBaseShift { pitch: f32, yaw: f32 },
    BaseReset,
}

/// The eyeball motion controller.
#[derive(Debug, Clone)]
pub struct EyeMotion {
    tuning: MotionTuning,
    state: MotionState,
    rotation: RotationState,
    schedule: TimingSchedule,
    tracking_target: Option<Vec3>,
    clock: f32,
}

impl EyeMotion {
    /// Start idling at `base` with fresh idle schedules.
    pub fn new<R: Rng + ?Sized>(tuning: MotionTuning, base: Quat, rng: &mut R) -> Self {
        let mut motion = Self {
            tuning,
            state: MotionState::Idling,
            rotation: RotationState::at_rest(base),
            schedule: TimingSchedule::default(),
            tracking_target: None,
            clock: 0.0,
        };
        motion.schedule.next_micro = motion.clock + tuning.idle.micro_interval.sample(rng);
        motion.schedule.next_correction =
            motion.clock + tuning.idle.correction_interval.sample(rng);
        motion
    }

    pub fn tuning(&self) -> &MotionTuning {
        &self.tuning
    }

    pub fn state(&self) -> MotionState {
        self.state
    }

    /// Switch behavior. In-flight easing is not reset.
    pub fn set_state(&mut self, state: MotionState) {
        if state != self.state {
            log::debug!(
                "Eyeball motion {} -> {}",
                self.state.name(),
                state.name()
            );
        }
        self.state = state;
    }

    pub fn tracking_target(&self) -> Option<Vec3> {
        self.tracking_target
    }

    pub fn set_tracking_target(&mut self, target: Option<Vec3>) {
        self.tracking_target = target;
    }

    pub fn rotation(&self) -> &RotationState {
        &self.rotation
    }

    pub fn current(&self) -> Quat {
        self.rotation.current
    }

    pub fn schedule(&self) -> &TimingSchedule {
        &self.schedule
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    /// Advance by `dt` seconds: sample, then ease toward the target.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> Vec<SampleEvent> {
        let dt = dt.max(0.0);
        self.clock += dt;
        let mut events = Vec::new();

        if let Some(at) = self.schedule.return_to_base_at {
            if self.clock >= at {
                self.rotation.target = self.rotation.base;
                self.schedule.return_to_base_at = None;
                events.push(SampleEvent::ReturnToBase);
            }
        }

        match self.state {
            MotionState::Idling => self.sample_idle(rng, &mut events),
            MotionState::Tracking => {
                if self.tracking_target.is_none() {
                    self.sample_idle(rng, &mut events);
                }
                // With a target the last target is held; aiming is not defined.
            }
            MotionState::Agitated => self.sample_agitated(rng, &mut events),
            MotionState::StartTracking | MotionState::EndTracking => {}
        }

        let max_degrees = self.tuning.speed_for(self.state) * dt;
        self.rotation.current =
            rotate_towards(self.rotation.current, self.rotation.target, max_degrees);

        events
    }

    fn sample_idle<R: Rng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<SampleEvent>) {
        let profile = self.tuning.idle;

        if self.clock >= self.schedule.next_micro {
            let pitch = sample_symmetric(rng, profile.micro_range);
            let yaw = sample_symmetric(rng, profile.micro_range);
            self.rotation.target = self.rotation.base * quat_from_euler_deg(pitch, yaw, 0.0);
            self.schedule.next_micro = self.clock + profile.micro_interval.sample(rng);
            events.push(SampleEvent::MicroJitter { pitch, yaw });
        }

        if self.clock >= self.schedule.next_correction {
            let pitch = sample_symmetric(rng, profile.correction_range);
            let yaw = sample_symmetric(rng, profile.correction_range);
            self.rotation.target = self.rotation.base * quat_from_euler_deg(pitch, yaw, 0.0);
            self.schedule.return_to_base_at = Some(self.clock + self.tuning.return_to_base_delay);
            self.schedule.next_correction = self.clock + profile.correction_interval.sample(rng);
            events.push(SampleEvent::CorrectiveSaccade { pitch, yaw });
        }
    }

    fn sample_agitated<R: Rng + ?Sized>(&mut self, rng: &mut R, events: &mut Vec<SampleEvent>) {
        let profile = self.tuning.agitated;
        let base = self.rotation.base;
        let dynamic_base = *self.rotation.dynamic_base.get_or_insert(base);

        if self.clock >= self.schedule.next_micro {
            let pitch = sample_symmetric(rng, profile.micro_range);
            let yaw = sample_symmetric(rng, profile.micro_range);
            self.rotation.target = dynamic_base * quat_from_euler_deg(pitch, yaw, 0.0);
            self.schedule.next_micro = self.clock + profile.micro_interval.sample(rng);
            events.push(SampleEvent::AgitatedJitter { pitch, yaw });
        }

        if self.clock >= self.schedule.next_correction {
            let pitch = sample_symmetric(rng, profile.correction_range);
            let yaw = sample_symmetric(rng, profile.correction_range);
            let shifted = base * quat_from_euler_deg(pitch, yaw, 0.0);
            self.rotation.dynamic_base = Some(shifted);
            self.rotation.target = shifted;
            self.schedule.next_correction = self.clock + profile.correction_interval.sample(rng);
            events.push(SampleEvent::DynamicBaseShift { pitch, yaw });
        }

        let reset_at = match self.schedule.next_base_reset {
            Some(at) => at,
            None => {
                let at = self.clock + self.tuning.base_reset_interval.sample(rng);
                self.schedule.next_base_reset = Some(at);
                at
            }
        };

        if self.clock >= reset_at {
            self.rotation.dynamic_base = Some(base);
            self.rotation.target = base;
            self.schedule.next_base_reset = None;
            events.push(SampleEvent::BaseReset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::angle_between_deg;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn controller(seed: u64) -> (EyeMotion, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let motion = EyeMotion::new(MotionTuning::default(), Quat::IDENTITY, &mut rng);
        (motion, rng)
    }

    #[test]
    fn test_starts_idling_at_rest() {
        let (motion, _) = controller(1);
        assert_eq!(motion.state(), MotionState::Idling);
        assert_eq!(motion.current(), Quat::IDENTITY);
        assert!(motion.schedule().next_micro > 0.0);
        assert!(motion.schedule().next_correction > 0.0);
    }

    #[test]
    fn test_idle_offsets_stay_within_ranges() {
        let (mut motion, mut rng) = controller(2);
        let tuning = MotionTuning::default();
        let mut micro = 0;
        let mut corrections = 0;
        for _ in 0..(60 * 60) {
            for event in motion.step(DT, &mut rng) {
                match event {
                    SampleEvent::MicroJitter { pitch, yaw } => {
                        micro += 1;
                        assert!(pitch.abs() <= tuning.idle.micro_range);
                        assert!(yaw.abs() <= tuning.idle.micro_range);
                    }
                    SampleEvent::CorrectiveSaccade { pitch, yaw } => {
                        corrections += 1;
                        assert!(pitch.abs() <= tuning.idle.correction_range);
                        assert!(yaw.abs() <= tuning.idle.correction_range);
                    }
                    _ => {}
                }
            }
        }
        assert!(micro > 100);
        assert!(corrections > 5);
    }

    #[test]
    fn test_schedule_is_resampled_after_firing() {
        let (mut motion, mut rng) = controller(3);
        let first = motion.schedule().next_micro;
        while motion.clock() < first {
            motion.step(DT, &mut rng);
        }
        assert!(motion.schedule().next_micro > motion.clock());
    }

    #[test]
    fn test_angular_step_is_bounded() {
        let (mut motion, mut rng) = controller(4);
        motion.set_state(MotionState::Agitated);
        let speed = motion.tuning().agitated.saccade_speed;
        for _ in 0..600 {
            let before = motion.current();
            motion.step(DT, &mut rng);
            let moved = angle_between_deg(before, motion.current());
            assert!(moved <= speed * DT + 0.05, "moved {} in one step", moved);
        }
    }

    #[test]
    fn test_corrective_saccade_returns_to_base() {
        let (mut motion, mut rng) = controller(5);
        let mut saw_return = false;
        for _ in 0..(60 * 20) {
            if motion
                .step(DT, &mut rng)
                .contains(&SampleEvent::ReturnToBase)
            {
                saw_return = true;
                break;
            }
        }
        assert!(saw_return);
    }

    #[test]
    fn test_agitated_base_reset_fires() {
        let (mut motion, mut rng) = controller(6);
        motion.set_state(MotionState::Agitated);
        let limit = MotionTuning::default().base_reset_interval.high() + 1.0;
        let mut reset_seen = false;
        while motion.clock() < limit {
            let events = motion.step(DT, &mut rng);
            if events.contains(&SampleEvent::BaseReset) {
                assert_eq!(motion.rotation().dynamic_base, Some(motion.rotation().base));
                assert_eq!(motion.rotation().target, motion.rotation().base);
                reset_seen = true;
            }
        }
        assert!(reset_seen);
    }

    #[test]
    fn test_tracking_without_target_degrades_to_idle() {
        let (mut motion, mut rng) = controller(7);
        motion.set_state(MotionState::Tracking);
        let mut sampled = false;
        for _ in 0..120 {
            if !motion.step(DT, &mut rng).is_empty() {
                sampled = true;
            }
        }
        assert!(sampled);
    }

    #[test]
    fn test_tracking_with_target_holds_last_target() {
        let (mut motion, mut rng) = controller(8);
        for _ in 0..60 {
            motion.step(DT, &mut rng);
        }
        motion.set_state(MotionState::Tracking);
        motion.set_tracking_target(Some(Vec3::new(0.0, 0.0, 1.0)));
        // Pending return-to-base may still land; let it settle first.
        for _ in 0..90 {
            motion.step(DT, &mut rng);
        }
        let held = motion.rotation().target;
        for _ in 0..600 {
            assert!(motion.step(DT, &mut rng).is_empty());
        }
        assert_eq!(motion.rotation().target, held);
    }

    #[test]
    fn test_state_switch_keeps_interpolation() {
        let (mut motion, mut rng) = controller(9);
        for _ in 0..30 {
            motion.step(DT, &mut rng);
        }
        let current = motion.current();
        let target = motion.rotation().target;
        motion.set_state(MotionState::StartTracking);
        assert_eq!(motion.current(), current);
        assert_eq!(motion.rotation().target, target);
    }

    #[test]
    fn test_agitated_speed_differs() {
        let tuning = MotionTuning::default();
        assert_eq!(
            tuning.speed_for(MotionState::Agitated),
            tuning.agitated.saccade_speed
        );
        assert_eq!(tuning.speed_for(MotionState::Tracking), tuning.idle.saccade_speed);
    }

    #[test]
    fn test_non_finite_intervals_do_not_stop_stepping() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut tuning = MotionTuning::default();
        tuning.idle.micro_interval = IntervalRange::new(0.1, f32::INFINITY);
        tuning.idle.correction_range = f32::NAN;
        tuning.agitated.correction_interval = IntervalRange::new(f32::NAN, 0.5);
        assert!(tuning.validate().is_err());

        let mut motion = EyeMotion::new(tuning, Quat::IDENTITY, &mut rng);
        for _ in 0..600 {
            motion.step(DT, &mut rng);
        }
        motion.set_state(MotionState::Agitated);
        for _ in 0..600 {
            motion.step(DT, &mut rng);
        }
        assert!(motion.current().is_finite());
    }

    #[test]
    fn test_new_correction_replaces_pending_return() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut tuning = MotionTuning::default();
        tuning.idle.correction_interval = IntervalRange::new(0.2, 0.2);
        tuning.return_to_base_delay = 1.0;
        let mut motion = EyeMotion::new(tuning, Quat::IDENTITY, &mut rng);

        let mut corrections = 0;
        for _ in 0..(60 * 10) {
            let events = motion.step(DT, &mut rng);
            assert!(!events.contains(&SampleEvent::ReturnToBase));
            corrections += events
                .iter()
                .filter(|e| matches!(e, SampleEvent::CorrectiveSaccade { .. }))
                .count();
        }
        assert!(corrections > 10);
        let pending = motion.schedule().return_to_base_at;
        assert!(matches!(pending, Some(at) if at > motion.clock()));
    }

    #[test]
    fn test_validation_rejects_negative_speed() {
        let mut tuning = MotionTuning::default();
        tuning.agitated.saccade_speed = -5.0;
        assert!(tuning.validate().is_err());
        assert!(MotionTuning::default().validate().is_ok());
    }
}
