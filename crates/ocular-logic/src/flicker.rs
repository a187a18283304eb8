//! Unstable hallway light.
//!
//! The light cycles through an on phase with jittery, noisy intensity, an
//! optional hard blink (off, bright spike, off), and an off phase that is
//! occasionally long. Each phase is a countdown advanced by [`FlickerLight::step`].

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::noise::gradient_noise;
use crate::tuning::{
    require_non_negative, require_non_negative_range, require_probability, IntervalRange,
    TuningError,
};

const HARD_BLINK_DARK: IntervalRange = IntervalRange::new(0.06, 0.16);
const HARD_BLINK_SPIKE: IntervalRange = IntervalRange::new(0.08, 0.18);
const HARD_BLINK_TAIL: IntervalRange = IntervalRange::new(0.05, 0.12);

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlickerTuning {
    pub base_intensity: f32,
    pub jitter_intensity: f32,
    pub emission_boost: f32,
    pub on_range: IntervalRange,
    pub off_range: IntervalRange,
    pub long_off_chance: f32,
    pub long_off_range: IntervalRange,
    pub hard_blink_chance: f32,
    pub noise_speed: f32,
    pub noise_amount: f32,
}

impl Default for FlickerTuning {
    fn default() -> Self {
        Self {
            base_intensity: 1.6,
            jitter_intensity: 0.35,
            emission_boost: 2.0,
            on_range: IntervalRange::new(0.12, 0.42),
            off_range: IntervalRange::new(0.06, 0.22),
            long_off_chance: 0.08,
            long_off_range: IntervalRange::new(0.5, 1.25),
            hard_blink_chance: 0.22,
            noise_speed: 5.5,
            noise_amount: 0.12,
        }
    }
}

impl FlickerTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        require_non_negative("flicker.base_intensity", self.base_intensity)?;
        require_non_negative("flicker.jitter_intensity", self.jitter_intensity)?;
        require_non_negative("flicker.emission_boost", self.emission_boost)?;
        require_non_negative_range("flicker.on_range", &self.on_range)?;
        require_non_negative_range("flicker.off_range", &self.off_range)?;
        require_probability("flicker.long_off_chance", self.long_off_chance)?;
        require_non_negative_range("flicker.long_off_range", &self.long_off_range)?;
        require_probability("flicker.hard_blink_chance", self.hard_blink_chance)?;
        require_non_negative("flicker.noise_speed", self.noise_speed)?;
        require_non_negative("flicker.noise_amount", self.noise_amount)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FlickerPhase {
    On { remaining: f32 },
    HardBlinkDark { remaining: f32 },
    HardBlinkSpike { remaining: f32 },
    HardBlinkTail { remaining: f32 },
    Off { remaining: f32 },
}

/// One-shot signals raised during a step, for audio or effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlickerSignals {
    pub zap: bool,
    pub buzz_started: bool,
    pub buzz_stopped: bool,
}

#[derive(Debug, Clone)]
pub struct FlickerLight {
    tuning: FlickerTuning,
    phase: FlickerPhase,
    seed: u32,
    clock: f32,
    enabled: bool,
    intensity: f32,
    emission: f32,
}

impl FlickerLight {
    /// Start in an on phase at base intensity.
    pub fn new<R: Rng + ?Sized>(tuning: FlickerTuning, rng: &mut R) -> Self {
        let remaining = tuning.on_range.sample(rng);
        Self {
            tuning,
            phase: FlickerPhase::On { remaining },
            seed: rng.gen_range(0..1000),
            clock: 0.0,
            enabled: true,
            intensity: tuning.base_intensity,
            emission: tuning.base_intensity * tuning.emission_boost,
        }
    }

    pub fn phase(&self) -> FlickerPhase {
        self.phase
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Light intensity, never negative.
    pub fn intensity(&self) -> f32 {
        self.intensity
    }

    /// Linear emission level for the bulb mesh.
    pub fn emission(&self) -> f32 {
        self.emission
    }

    fn set_active(&mut self, on: bool, signals: &mut FlickerSignals) {
        if on && !self.enabled {
            signals.buzz_started = true;
        }
        if !on && self.enabled {
            signals.buzz_stopped = true;
        }
        self.enabled = on;
        self.set_emission(if on { self.tuning.base_intensity } else { 0.0 });
    }

    fn set_intensity(&mut self, value: f32) {
        self.intensity = value.max(0.0);
    }

    fn set_emission(&mut self, like_intensity: f32) {
        self.emission = like_intensity.max(0.0) * self.tuning.emission_boost;
    }

    fn enter_off<R: Rng + ?Sized>(&mut self, rng: &mut R, signals: &mut FlickerSignals) {
        let remaining = if rng.gen::<f32>() < self.tuning.long_off_chance {
            self.tuning.long_off_range.sample(rng)
        } else {
            self.tuning.off_range.sample(rng)
        };
        self.set_active(false, signals);
        self.phase = FlickerPhase::Off { remaining };
    }

    /// Advance by `dt` seconds.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> FlickerSignals {
        let dt = dt.max(0.0);
        self.clock += dt;
        let mut signals = FlickerSignals::default();

        match self.phase {
            FlickerPhase::On { remaining } => {
                let hand = (rng.gen::<f32>() * 2.0 - 1.0) * self.tuning.jitter_intensity * 0.5;
                let n = gradient_noise(self.seed, self.clock * self.tuning.noise_speed) * 2.0 - 1.0;
                let noisy = self.tuning.base_intensity + hand + n * self.tuning.noise_amount;
                self.set_intensity(noisy);
                self.set_emission(noisy);

                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = FlickerPhase::On { remaining };
                } else if rng.gen::<f32>() < self.tuning.hard_blink_chance {
                    self.set_active(false, &mut signals);
                    signals.zap = true;
                    self.phase = FlickerPhase::HardBlinkDark {
                        remaining: HARD_BLINK_DARK.sample(rng),
                    };
                } else {
                    self.enter_off(rng, &mut signals);
                }
            }
            FlickerPhase::HardBlinkDark { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = FlickerPhase::HardBlinkDark { remaining };
                } else {
                    let spike = self.tuning.base_intensity + self.tuning.jitter_intensity * 1.4;
                    self.set_intensity(spike);
                    // emission after the enable, so the spike glow is not reset to base
                    self.set_active(true, &mut signals);
                    self.set_emission(spike * 1.2);
                    self.phase = FlickerPhase::HardBlinkSpike {
                        remaining: HARD_BLINK_SPIKE.sample(rng),
                    };
                }
            }
            FlickerPhase::HardBlinkSpike { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = FlickerPhase::HardBlinkSpike { remaining };
                } else {
                    self.set_active(false, &mut signals);
                    self.phase = FlickerPhase::HardBlinkTail {
                        remaining: HARD_BLINK_TAIL.sample(rng),
                    };
                }
            }
            FlickerPhase::HardBlinkTail { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = FlickerPhase::HardBlinkTail { remaining };
                } else {
                    self.enter_off(rng, &mut signals);
                }
            }
            FlickerPhase::Off { remaining } => {
                let remaining = remaining - dt;
                if remaining > 0.0 {
                    self.phase = FlickerPhase::Off { remaining };
                } else {
                    self.set_active(true, &mut signals);
                    self.phase = FlickerPhase::On {
                        remaining: self.tuning.on_range.sample(rng),
                    };
                }
            }
        }

        signals
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_intensity_never_negative() {
        let mut rng = StdRng::seed_from_u64(1);
        let tuning = FlickerTuning {
            base_intensity: 0.05,
            jitter_intensity: 2.0,
            noise_amount: 1.0,
            ..FlickerTuning::default()
        };
        let mut light = FlickerLight::new(tuning, &mut rng);
        for _ in 0..(60 * 60) {
            light.step(DT, &mut rng);
            assert!(light.intensity() >= 0.0);
            assert!(light.emission() >= 0.0);
        }
    }

    #[test]
    fn test_cycles_on_and_off() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut light = FlickerLight::new(FlickerTuning::default(), &mut rng);
        let (mut on, mut off) = (0, 0);
        for _ in 0..(60 * 30) {
            light.step(DT, &mut rng);
            if light.is_enabled() {
                on += 1;
            } else {
                off += 1;
            }
        }
        assert!(on > 0);
        assert!(off > 0);
    }

    #[test]
    fn test_buzz_signals_track_enabled_edges() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut light = FlickerLight::new(FlickerTuning::default(), &mut rng);
        let mut was_enabled = light.is_enabled();
        for _ in 0..(60 * 30) {
            let s = light.step(DT, &mut rng);
            assert_eq!(s.buzz_started, !was_enabled && light.is_enabled());
            assert_eq!(s.buzz_stopped, was_enabled && !light.is_enabled());
            was_enabled = light.is_enabled();
        }
    }

    #[test]
    fn test_hard_blink_spikes_above_base() {
        let mut rng = StdRng::seed_from_u64(4);
        let tuning = FlickerTuning {
            hard_blink_chance: 1.0,
            ..FlickerTuning::default()
        };
        let mut light = FlickerLight::new(tuning, &mut rng);
        let mut zapped = false;
        let mut spiked = false;
        for _ in 0..(60 * 5) {
            if light.step(DT, &mut rng).zap {
                zapped = true;
            }
            if let FlickerPhase::HardBlinkSpike { .. } = light.phase() {
                spiked = true;
                let spike = tuning.base_intensity + tuning.jitter_intensity * 1.4;
                assert!(light.intensity() > tuning.base_intensity);
                // the bulb glows brighter than the light during a spike
                assert!((light.emission() - spike * 1.2 * tuning.emission_boost).abs() < 1e-4);
            }
        }
        assert!(zapped);
        assert!(spiked);
    }

    #[test]
    fn test_validation() {
        assert!(FlickerTuning::default().validate().is_ok());
        let bad = FlickerTuning {
            long_off_chance: 2.0,
            ..FlickerTuning::default()
        };
        assert!(bad.validate().is_err());
    }
}
