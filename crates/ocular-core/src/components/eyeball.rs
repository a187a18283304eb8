//! Eyeball entity components.

use glam::Quat;
use ocular_logic::blend_shapes::{BlendShapeVector, GazeMapping};
use ocular_logic::breath::BreathOscillator;
use ocular_logic::cadence::{BlinkCadence, CadenceStep, PatientProfile};
use ocular_logic::dropper::Pupil;
use ocular_logic::motion::{EyeMotion, SampleEvent};
use ocular_logic::playback::{EyelidAnimator, PlaybackKind};
use ocular_logic::tween::Pose;
use rand::Rng;

use crate::config::Tuning;

/// Marks an eyeball entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eyeball {
    /// Shown in log lines.
    pub label: String,
}

/// What an eyeball did during the last update.
///
/// Cleared at the start of every update, then filled in by the systems.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EyeActivity {
    pub cadence: CadenceStep,
    pub started: Option<PlaybackKind>,
    pub completed: Option<PlaybackKind>,
    pub samples: Vec<SampleEvent>,
}

impl EyeActivity {
    pub fn clear(&mut self) {
        self.cadence = CadenceStep::default();
        self.started = None;
        self.completed = None;
        self.samples.clear();
    }
}

/// Everything an eyeball entity is spawned with.
pub type EyeballBundle = (
    Eyeball,
    EyeMotion,
    BreathOscillator,
    BlinkCadence,
    EyelidAnimator,
    BlendShapeVector,
    GazeMapping,
    Pupil,
    EyeActivity,
);

/// Build the components for one eyeball.
///
/// `carrier` is the rest pose of the transform that breathes; `eye_rotation`
/// is the eyeball's own rest orientation inside it.
pub fn eyeball_bundle<R: Rng + ?Sized>(
    label: &str,
    tuning: &Tuning,
    carrier: Pose,
    eye_rotation: Quat,
    profile: PatientProfile,
    rng: &mut R,
) -> EyeballBundle {
    (
        Eyeball {
            label: label.to_string(),
        },
        EyeMotion::new(tuning.motion, eye_rotation, rng),
        BreathOscillator::new(tuning.breath, carrier.position, carrier.rotation, rng),
        BlinkCadence::new(tuning.cadence, profile, rng),
        EyelidAnimator::new(tuning.clips.clone()),
        BlendShapeVector::new(),
        tuning.gaze,
        Pupil::new(tuning.dropper.dilation_speed),
        EyeActivity::default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use hecs::World;
    use ocular_logic::motion::MotionState;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_bundle_spawns_at_rest() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut world = World::new();
        let eye_rotation = Quat::from_rotation_y(0.2);
        let eye = world.spawn(eyeball_bundle(
            "left",
            &Tuning::default(),
            Pose::default(),
            eye_rotation,
            PatientProfile::default(),
            &mut rng,
        ));

        let motion = world.get::<&EyeMotion>(eye).map(|m| (m.state(), m.current()));
        assert_eq!(motion.ok(), Some((MotionState::Idling, eye_rotation)));
        let label = world.get::<&Eyeball>(eye).map(|e| e.label.clone());
        assert_eq!(label.ok().as_deref(), Some("left"));
    }

    #[test]
    fn test_activity_clear() {
        let mut activity = EyeActivity {
            started: Some(PlaybackKind::Blink),
            samples: vec![SampleEvent::ReturnToBase],
            ..EyeActivity::default()
        };
        activity.clear();
        assert_eq!(activity, EyeActivity::default());
    }
}
