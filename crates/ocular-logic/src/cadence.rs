//! Blink and twitch cadence for the patient in the chair.
//!
//! Infected patients blink on a different cooldown than healthy ones, and a
//! patient with a twitch degree also twitches on its own cooldown. A trigger
//! fires once its cooldown has run out; the cooldown is redrawn immediately.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::playback::TwitchDegree;
use crate::tuning::{require_non_negative_range, IntervalRange, TuningError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CadenceTuning {
    pub human_blink_cooldown: IntervalRange,
    pub infected_blink_cooldown: IntervalRange,
    pub infected_twitch_cooldown: IntervalRange,
}

impl Default for CadenceTuning {
    fn default() -> Self {
        Self {
            human_blink_cooldown: IntervalRange::new(3.0, 7.0),
            infected_blink_cooldown: IntervalRange::new(1.5, 4.0),
            infected_twitch_cooldown: IntervalRange::new(2.0, 6.0),
        }
    }
}

impl CadenceTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        require_non_negative_range("cadence.human_blink_cooldown", &self.human_blink_cooldown)?;
        require_non_negative_range(
            "cadence.infected_blink_cooldown",
            &self.infected_blink_cooldown,
        )?;
        require_non_negative_range(
            "cadence.infected_twitch_cooldown",
            &self.infected_twitch_cooldown,
        )
    }
}

/// The slice of patient data that shapes eye behavior and scoring.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PatientProfile {
    pub infected: bool,
    pub twitch_degree: TwitchDegree,
    /// Whether an infected patient's pupil still reacts to drops.
    pub will_dilate: bool,
    /// People lost if this patient is let in while infected.
    pub people_killed: u32,
}

impl PatientProfile {
    pub fn twitches(&self) -> bool {
        self.twitch_degree != TwitchDegree::None
    }

    /// Healthy pupils always dilate; infected ones only when flagged.
    pub fn dilates(&self) -> bool {
        !self.infected || self.will_dilate
    }
}

/// Triggers produced by one cadence step.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CadenceStep {
    pub blink: bool,
    pub twitch: Option<TwitchDegree>,
}

#[derive(Debug, Clone)]
pub struct BlinkCadence {
    tuning: CadenceTuning,
    profile: PatientProfile,
    blink_cooldown: f32,
    twitch_cooldown: f32,
}

impl BlinkCadence {
    pub fn new<R: Rng + ?Sized>(tuning: CadenceTuning, profile: PatientProfile, rng: &mut R) -> Self {
        let mut cadence = Self {
            tuning,
            profile,
            blink_cooldown: 0.0,
            twitch_cooldown: 0.0,
        };
        cadence.set_profile(profile, rng);
        cadence
    }

    pub fn profile(&self) -> PatientProfile {
        self.profile
    }

    pub fn blink_cooldown(&self) -> f32 {
        self.blink_cooldown
    }

    pub fn twitch_cooldown(&self) -> f32 {
        self.twitch_cooldown
    }

    /// Switch to a new patient and redraw both cooldowns.
    pub fn set_profile<R: Rng + ?Sized>(&mut self, profile: PatientProfile, rng: &mut R) {
        self.profile = profile;
        self.blink_cooldown = self.draw_blink(rng);
        self.twitch_cooldown = if profile.twitches() {
            self.tuning.infected_twitch_cooldown.sample(rng)
        } else {
            0.0
        };
    }

    fn draw_blink<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        if self.profile.infected {
            self.tuning.infected_blink_cooldown.sample(rng)
        } else {
            self.tuning.human_blink_cooldown.sample(rng)
        }
    }

    /// Fire due triggers, then count the cooldowns down by `dt`.
    pub fn step<R: Rng + ?Sized>(&mut self, dt: f32, rng: &mut R) -> CadenceStep {
        let dt = dt.max(0.0);
        let mut out = CadenceStep::default();

        if self.blink_cooldown <= 0.0 {
            out.blink = true;
            self.blink_cooldown = self.draw_blink(rng);
        }

        let twitches = self.profile.twitches();
        if twitches && self.twitch_cooldown <= 0.0 {
            out.twitch = Some(self.profile.twitch_degree);
            self.twitch_cooldown = self.tuning.infected_twitch_cooldown.sample(rng);
        }

        self.blink_cooldown -= dt;
        if twitches {
            self.twitch_cooldown -= dt;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn run(profile: PatientProfile, seconds: f32) -> (usize, usize) {
        let mut rng = StdRng::seed_from_u64(42);
        let mut cadence = BlinkCadence::new(CadenceTuning::default(), profile, &mut rng);
        let (mut blinks, mut twitches) = (0, 0);
        let steps = (seconds / DT) as usize;
        for _ in 0..steps {
            let out = cadence.step(DT, &mut rng);
            if out.blink {
                blinks += 1;
            }
            if out.twitch.is_some() {
                twitches += 1;
            }
        }
        (blinks, twitches)
    }

    #[test]
    fn test_healthy_patient_blinks_without_twitching() {
        let (blinks, twitches) = run(PatientProfile::default(), 60.0);
        // 3..7 s cooldown over a minute
        assert!((8..=20).contains(&blinks), "blinks = {}", blinks);
        assert_eq!(twitches, 0);
    }

    #[test]
    fn test_infected_patient_blinks_more_and_twitches() {
        let profile = PatientProfile {
            infected: true,
            twitch_degree: TwitchDegree::Medium,
            ..PatientProfile::default()
        };
        let (infected_blinks, twitches) = run(profile, 60.0);
        let (healthy_blinks, _) = run(PatientProfile::default(), 60.0);
        assert!(infected_blinks > healthy_blinks);
        assert!(twitches >= 9);
    }

    #[test]
    fn test_twitch_trigger_carries_degree() {
        let mut rng = StdRng::seed_from_u64(3);
        let profile = PatientProfile {
            infected: true,
            twitch_degree: TwitchDegree::Large,
            ..PatientProfile::default()
        };
        let mut cadence = BlinkCadence::new(CadenceTuning::default(), profile, &mut rng);
        let mut seen = None;
        for _ in 0..(60 * 10) {
            if let Some(degree) = cadence.step(DT, &mut rng).twitch {
                seen = Some(degree);
                break;
            }
        }
        assert_eq!(seen, Some(TwitchDegree::Large));
    }

    #[test]
    fn test_cooldown_redrawn_after_firing() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut cadence = BlinkCadence::new(CadenceTuning::default(), PatientProfile::default(), &mut rng);
        while !cadence.step(DT, &mut rng).blink {}
        let range = CadenceTuning::default().human_blink_cooldown;
        assert!(cadence.blink_cooldown() + DT >= range.low() - 1e-4);
        assert!(cadence.blink_cooldown() + DT <= range.high() + 1e-4);
    }
}
