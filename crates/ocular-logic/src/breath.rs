//! Breath oscillator: sinusoidal rise/fall of the carrying transform.
//!
//! The vertical offset is a primary sinusoid plus a faster, smaller one that
//! roughens the motion; the same primary phase also tips the carrier around
//! its X axis. Breathing pauses on a randomized timer, or manually. While
//! paused the breath clock stands still and the pose is held.

use glam::{Quat, Vec3};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::math::quat_from_euler_deg;
use crate::tuning::{require_non_negative, require_non_negative_range, IntervalRange, TuningError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathTuning {
    /// Vertical travel of the primary wave (meters).
    pub amplitude: f32,
    /// Pitch travel of the primary wave (degrees).
    pub rotation_amplitude: f32,
    /// Breaths per second.
    pub base_frequency: f32,
    /// Vertical travel of the secondary wave (meters).
    pub noise_amplitude: f32,
    /// Secondary wave frequency (Hz).
    pub noise_frequency: f32,
    /// Seconds of breathing between automatic pauses.
    pub pause_interval: IntervalRange,
    /// Seconds an automatic pause lasts.
    pub pause_duration: IntervalRange,
}

impl Default for BreathTuning {
    fn default() -> Self {
        Self {
            amplitude: 0.004,
            rotation_amplitude: 1.2,
            base_frequency: 0.25,
            noise_amplitude: 0.0008,
            noise_frequency: 1.7,
            pause_interval: IntervalRange::new(6.0, 14.0),
            pause_duration: IntervalRange::new(1.0, 3.0),
        }
    }
}

impl BreathTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        require_non_negative("breath.amplitude", self.amplitude)?;
        require_non_negative("breath.rotation_amplitude", self.rotation_amplitude)?;
        require_non_negative("breath.base_frequency", self.base_frequency)?;
        require_non_negative("breath.noise_amplitude", self.noise_amplitude)?;
        require_non_negative("breath.noise_frequency", self.noise_frequency)?;
        require_non_negative_range("breath.pause_interval", &self.pause_interval)?;
        require_non_negative_range("breath.pause_duration", &self.pause_duration)
    }

    /// Primary wave at breath time `t`, in [-amplitude, amplitude].
    pub fn primary(&self, t: f32) -> f32 {
        (t * self.base_frequency * TAU).sin() * self.amplitude
    }

    /// Secondary "noise" wave at breath time `t`.
    pub fn secondary(&self, t: f32) -> f32 {
        (t * self.noise_frequency * TAU).sin() * self.noise_amplitude
    }

    /// Total vertical offset at breath time `t`.
    pub fn vertical_offset(&self, t: f32) -> f32 {
        self.primary(t) + self.secondary(t)
    }

    /// Pitch offset (degrees) at breath time `t`.
    pub fn pitch_offset(&self, t: f32) -> f32 {
        (t * self.base_frequency * TAU).sin() * self.rotation_amplitude
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BreathState {
    /// Breath clock; only advances while breathing.
    pub breath_time: f32,
    pub paused: bool,
    /// When the next automatic pause begins.
    pub next_pause_at: f32,
    /// When the current automatic pause ends. `None` for a manual pause.
    pub pause_end_at: Option<f32>,
    pub base_position: Vec3,
    pub base_rotation: Quat,
}

#[derive(Debug, Clone)]
pub struct BreathOscillator {
    tuning: BreathTuning,
    state: BreathState,
    clock: f32,
    position: Vec3,
    rotation: Quat,
}

impl BreathOscillator {
    pub fn new<R: Rng + ?Sized>(
        tuning: BreathTuning,
        base_position: Vec3,
        base_rotation: Quat,
        rng: &mut R,
    ) -> Self {
        let mut breath = Self {
            tuning,
            state: BreathState {
                breath_time: 0.0,
                paused: false,
                next_pause_at: 0.0,
                pause_end_at: None,
                base_position,
                base_rotation,
            },
            clock: 0.0,
            position: base_position,
            rotation: base_rotation,
        };
        breath.schedule_next_pause(rng);
        breath
    }

    pub fn tuning(&self) -> &BreathTuning {
        &self.tuning
    }

    pub fn state(&self) -> &BreathState {
        &self.state
    }

    pub fn clock(&self) -> f32 {
        self.clock
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    /// Local position of the carrier this step.
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// Local rotation of the carrier this step.
    pub fn rotation(&self) -> Quat {
        self.rotation
    }

    /// Advance by `dt` seconds.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) {
        let dt = dt.max(0.0);
        self.clock += dt;

        if self.state.paused {
            match self.state.pause_end_at {
                Some(end) if self.clock >= end => self.resume(rng),
                _ => return,
            }
        } else if self.clock >= self.state.next_pause_at {
            self.state.paused = true;
            self.state.pause_end_at = Some(self.clock + self.tuning.pause_duration.sample(rng));
            return;
        }

        self.state.breath_time += dt;
        let t = self.state.breath_time;

        self.position = self.state.base_position + Vec3::new(0.0, self.tuning.vertical_offset(t), 0.0);
        self.rotation =
            self.state.base_rotation * quat_from_euler_deg(self.tuning.pitch_offset(t), 0.0, 0.0);
    }

    /// Hold breath until [`resume`](Self::resume) is called.
    pub fn pause(&mut self) {
        if !self.state.paused {
            log::debug!("Breath paused manually at {:.2}s", self.clock);
        }
        self.state.paused = true;
        self.state.pause_end_at = None;
    }

    /// Start breathing again and schedule the next automatic pause.
    pub fn resume<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.state.paused = false;
        self.state.pause_end_at = None;
        self.schedule_next_pause(rng);
    }

    fn schedule_next_pause<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.state.next_pause_at = self.clock + self.tuning.pause_interval.sample(rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn oscillator(seed: u64) -> (BreathOscillator, StdRng) {
        let mut rng = StdRng::seed_from_u64(seed);
        let breath =
            BreathOscillator::new(BreathTuning::default(), Vec3::ZERO, Quat::IDENTITY, &mut rng);
        (breath, rng)
    }

    #[test]
    fn test_primary_wave_is_periodic() {
        let tuning = BreathTuning::default();
        let period = 1.0 / tuning.base_frequency;
        for i in 0..50 {
            let t = i as f32 * 0.137;
            assert!((tuning.primary(t) - tuning.primary(t + period)).abs() < 1e-5);
        }
    }

    #[test]
    fn test_primary_wave_is_bounded() {
        let tuning = BreathTuning::default();
        for i in 0..1000 {
            assert!(tuning.primary(i as f32 * 0.01).abs() <= tuning.amplitude + 1e-7);
        }
    }

    #[test]
    fn test_breath_moves_carrier() {
        let (mut breath, mut rng) = oscillator(1);
        for _ in 0..30 {
            breath.step(DT, &mut rng);
        }
        assert!(breath.position().y.abs() > 0.0);
        assert_eq!(breath.position().x, 0.0);
    }

    #[test]
    fn test_manual_pause_freezes_clock_and_pose() {
        let (mut breath, mut rng) = oscillator(2);
        for _ in 0..20 {
            breath.step(DT, &mut rng);
        }
        breath.pause();
        let t = breath.state().breath_time;
        let pos = breath.position();
        for _ in 0..600 {
            breath.step(DT, &mut rng);
        }
        assert!(breath.is_paused());
        assert_eq!(breath.state().breath_time, t);
        assert_eq!(breath.position(), pos);
    }

    #[test]
    fn test_resume_schedules_pause_no_earlier_than_min_interval() {
        let (mut breath, mut rng) = oscillator(3);
        for _ in 0..40 {
            breath.step(DT, &mut rng);
        }
        breath.pause();
        breath.step(DT, &mut rng);
        breath.resume(&mut rng);
        let min = breath.tuning().pause_interval.low();
        assert!(breath.state().next_pause_at >= breath.clock() + min);
    }

    #[test]
    fn test_automatic_pause_and_resume() {
        let (mut breath, mut rng) = oscillator(4);
        let mut paused_seen = false;
        let mut resumed_after_pause = false;
        let mut last_pause_at = breath.state().next_pause_at;
        for _ in 0..(60 * 60) {
            breath.step(DT, &mut rng);
            if breath.is_paused() {
                paused_seen = true;
                assert!(breath.state().pause_end_at.is_some());
            } else if paused_seen {
                resumed_after_pause = true;
            }
            // scheduled pauses never move backwards
            assert!(breath.state().next_pause_at >= last_pause_at);
            last_pause_at = breath.state().next_pause_at;
        }
        assert!(paused_seen);
        assert!(resumed_after_pause);
    }
}
