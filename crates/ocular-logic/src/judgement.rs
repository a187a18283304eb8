//! Judgement stamp and exam scoring.
//!
//! The stamp is either resting on the desk or lifted. While lifted, one
//! verdict may be pressed, unless the ID card is still sliding. The press
//! takes `press_duration` seconds to land; when it does the verdict is scored
//! against the patient and the stamp drops back to rest.

use serde::{Deserialize, Serialize};

use crate::cadence::PatientProfile;
use crate::tuning::{require_non_negative, TuningError};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgementTuning {
    /// Population of the settlement when the shift starts.
    pub starting_population: i64,
    /// Seconds between pressing a verdict and the stamp landing.
    pub press_duration: f32,
}

impl Default for JudgementTuning {
    fn default() -> Self {
        Self {
            starting_population: 404,
            press_duration: 0.35,
        }
    }
}

impl JudgementTuning {
    pub fn validate(&self) -> Result<(), TuningError> {
        require_non_negative("judgement.press_duration", self.press_duration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Verdict {
    Accepted,
    Infected,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StampState {
    Resting,
    Lifted,
    Pressing { verdict: Verdict, remaining: f32 },
}

/// Running totals for a shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExamTally {
    pub population: i64,
    /// Patients judged infected, rightly or not.
    pub patients_killed: u32,
    pub infected_accepted: u32,
    /// Healthy patients judged infected.
    pub innocents_turned_away: u32,
}

/// One scored verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JudgementOutcome {
    pub verdict: Verdict,
    pub correct: bool,
    pub population_lost: u32,
}

#[derive(Debug, Clone)]
pub struct JudgementStamp {
    tuning: JudgementTuning,
    state: StampState,
    tally: ExamTally,
}

impl JudgementStamp {
    pub fn new(tuning: JudgementTuning) -> Self {
        Self {
            tuning,
            state: StampState::Resting,
            tally: ExamTally {
                population: tuning.starting_population,
                ..ExamTally::default()
            },
        }
    }

    pub fn state(&self) -> StampState {
        self.state
    }

    pub fn tally(&self) -> ExamTally {
        self.tally
    }

    /// Picked up off the desk. A press already on its way is left alone.
    pub fn lift(&mut self) -> bool {
        if matches!(self.state, StampState::Pressing { .. }) {
            return false;
        }
        self.state = StampState::Lifted;
        true
    }

    /// Put back on the desk without judging.
    pub fn rest(&mut self) -> bool {
        if self.state != StampState::Lifted {
            return false;
        }
        self.state = StampState::Resting;
        true
    }

    /// Start pressing a verdict. Refused unless lifted and the card is still.
    pub fn press(&mut self, verdict: Verdict, card_moving: bool) -> bool {
        if self.state != StampState::Lifted || card_moving {
            return false;
        }
        self.state = StampState::Pressing {
            verdict,
            remaining: self.tuning.press_duration,
        };
        true
    }

    /// Advance by `dt` seconds. Returns the outcome when a press lands.
    pub fn step(&mut self, dt: f32, patient: &PatientProfile) -> Option<JudgementOutcome> {
        let StampState::Pressing { verdict, remaining } = self.state else {
            return None;
        };
        let remaining = remaining - dt.max(0.0);
        if remaining > 0.0 {
            self.state = StampState::Pressing { verdict, remaining };
            return None;
        }
        self.state = StampState::Resting;
        Some(self.score(verdict, patient))
    }

    fn score(&mut self, verdict: Verdict, patient: &PatientProfile) -> JudgementOutcome {
        let mut population_lost = 0;
        match verdict {
            Verdict::Infected => {
                self.tally.patients_killed += 1;
                if !patient.infected {
                    self.tally.innocents_turned_away += 1;
                }
            }
            Verdict::Accepted => {
                if patient.infected {
                    population_lost = patient.people_killed;
                    self.tally.population -= i64::from(patient.people_killed);
                    self.tally.infected_accepted += 1;
                }
            }
        }
        let correct = (verdict == Verdict::Infected) == patient.infected;
        log::info!(
            "Judged {:?} (correct: {}, population {})",
            verdict,
            correct,
            self.tally.population
        );
        JudgementOutcome {
            verdict,
            correct,
            population_lost,
        }
    }
}

impl Default for JudgementStamp {
    fn default() -> Self {
        Self::new(JudgementTuning::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn infected(people_killed: u32) -> PatientProfile {
        PatientProfile {
            infected: true,
            people_killed,
            ..PatientProfile::default()
        }
    }

    fn land(stamp: &mut JudgementStamp, patient: &PatientProfile) -> Option<JudgementOutcome> {
        for _ in 0..120 {
            if let Some(outcome) = stamp.step(DT, patient) {
                return Some(outcome);
            }
        }
        None
    }

    #[test]
    fn test_resting_stamp_cannot_judge() {
        let mut stamp = JudgementStamp::default();
        assert!(!stamp.press(Verdict::Accepted, false));
        assert_eq!(stamp.state(), StampState::Resting);
        assert_eq!(stamp.step(DT, &PatientProfile::default()), None);
    }

    #[test]
    fn test_moving_card_blocks_press() {
        let mut stamp = JudgementStamp::default();
        stamp.lift();
        assert!(!stamp.press(Verdict::Infected, true));
        assert!(stamp.press(Verdict::Infected, false));
    }

    #[test]
    fn test_one_judgement_per_lift() {
        let mut stamp = JudgementStamp::default();
        let patient = PatientProfile::default();
        stamp.lift();
        assert!(stamp.press(Verdict::Accepted, false));
        assert!(!stamp.press(Verdict::Infected, false));
        assert!(!stamp.lift());
        assert!(land(&mut stamp, &patient).is_some());
        assert_eq!(stamp.state(), StampState::Resting);
        assert!(!stamp.press(Verdict::Infected, false));

        stamp.lift();
        assert!(stamp.press(Verdict::Infected, false));
    }

    #[test]
    fn test_accepting_infected_costs_population() {
        let mut stamp = JudgementStamp::default();
        stamp.lift();
        stamp.press(Verdict::Accepted, false);
        let outcome = land(&mut stamp, &infected(12));
        assert_eq!(
            outcome,
            Some(JudgementOutcome {
                verdict: Verdict::Accepted,
                correct: false,
                population_lost: 12,
            })
        );
        let tally = stamp.tally();
        assert_eq!(tally.population, 404 - 12);
        assert_eq!(tally.infected_accepted, 1);
        assert_eq!(tally.patients_killed, 0);
    }

    #[test]
    fn test_rejecting_healthy_counts_innocent() {
        let mut stamp = JudgementStamp::default();
        stamp.lift();
        stamp.press(Verdict::Infected, false);
        let outcome = land(&mut stamp, &PatientProfile::default());
        assert_eq!(outcome.map(|o| o.correct), Some(false));
        let tally = stamp.tally();
        assert_eq!(tally.patients_killed, 1);
        assert_eq!(tally.innocents_turned_away, 1);
        assert_eq!(tally.population, 404);
    }

    #[test]
    fn test_correct_verdicts_keep_population() {
        let mut stamp = JudgementStamp::default();
        stamp.lift();
        stamp.press(Verdict::Infected, false);
        assert_eq!(land(&mut stamp, &infected(30)).map(|o| o.correct), Some(true));
        stamp.lift();
        stamp.press(Verdict::Accepted, false);
        assert_eq!(
            land(&mut stamp, &PatientProfile::default()).map(|o| o.correct),
            Some(true)
        );

        let tally = stamp.tally();
        assert_eq!(tally.population, 404);
        assert_eq!(tally.patients_killed, 1);
        assert_eq!(tally.innocents_turned_away, 0);
        assert_eq!(tally.infected_accepted, 0);
    }

    #[test]
    fn test_rest_without_judging() {
        let mut stamp = JudgementStamp::default();
        assert!(!stamp.rest());
        stamp.lift();
        assert!(stamp.rest());
        assert_eq!(stamp.tally(), JudgementStamp::default().tally());
    }
}
