//! Exam engine - main entry point for stepping an exam room

use glam::Quat;
use hecs::{Component, Entity, World};
use ocular_logic::blend_shapes::{BlendShapeSink, BlendShapeVector};
use ocular_logic::breath::BreathOscillator;
use ocular_logic::cadence::PatientProfile;
use ocular_logic::dropper::{Dropper, DropperState, Pupil};
use ocular_logic::flicker::FlickerLight;
use ocular_logic::judgement::{ExamTally, JudgementOutcome, JudgementStamp, StampState};
use ocular_logic::motion::{EyeMotion, MotionState};
use ocular_logic::speculum::{Speculum, SpeculumState};
use ocular_logic::tween::{Pose, TransformTween};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::commands::{Command, CommandQueue};
use crate::components::*;
use crate::config::Tuning;
use crate::systems::*;

/// Main exam engine
pub struct ExamEngine {
    /// ECS world containing all entities
    pub world: World,
    /// Seconds simulated since creation
    elapsed: f64,
    /// Commands waiting for the next update
    commands: CommandQueue,
    tuning: Tuning,
    rng: StdRng,
    time_scale: f32,
    spawned_eyes: usize,
}

impl ExamEngine {
    /// Create an empty exam room with default tuning
    pub fn new(seed: u64) -> Self {
        Self::with_tuning(Tuning::default(), seed)
    }

    /// Create an empty exam room. The same tuning, seed and inputs always
    /// produce the same outputs.
    ///
    /// Tuning that fails validation is still used; bad ranges are clamped
    /// when sampled.
    pub fn with_tuning(tuning: Tuning, seed: u64) -> Self {
        if let Err(e) = tuning.validate() {
            log::warn!("Running with unvalidated tuning: {}", e);
        }
        Self {
            world: World::new(),
            elapsed: 0.0,
            commands: CommandQueue::new(),
            tuning,
            rng: StdRng::seed_from_u64(seed),
            time_scale: 1.0,
            spawned_eyes: 0,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    /// Spawn an eyeball. `carrier` is the rest pose of the breathing parent;
    /// `eye_rotation` is the eyeball's rest orientation.
    pub fn spawn_eyeball(&mut self, carrier: Pose, eye_rotation: Quat, profile: PatientProfile) -> Entity {
        self.spawned_eyes += 1;
        let label = format!("eye-{}", self.spawned_eyes);
        let bundle = eyeball_bundle(&label, &self.tuning, carrier, eye_rotation, profile, &mut self.rng);
        let eye = self.world.spawn(bundle);
        log::info!("Spawned {} (infected: {})", label, profile.infected);
        eye
    }

    /// Spawn a speculum on its tray, linked to `eye`. Returns `None` if the
    /// eye does not exist.
    pub fn spawn_speculum(&mut self, eye: Entity) -> Option<Entity> {
        if !self.world.contains(eye) {
            log::warn!("Cannot link speculum to missing eye {:?}", eye);
            return None;
        }
        let speculum = Speculum::new(self.tuning.speculum);
        Some(self.world.spawn((SpeculumTool { speculum, eye },)))
    }

    /// Spawn an eye dropper on its tray, aimed at `eye`.
    pub fn spawn_dropper(&mut self, eye: Entity) -> Option<Entity> {
        if !self.world.contains(eye) {
            log::warn!("Cannot aim dropper at missing eye {:?}", eye);
            return None;
        }
        let dropper = Dropper::new(self.tuning.dropper);
        Some(self.world.spawn((DropperTool {
            dropper,
            eye,
            landed: 0,
        },)))
    }

    /// Spawn a resting judgement stamp for the patient behind `eye`. With a
    /// card, lifting the stamp zooms the card in and a verdict slides it back.
    pub fn spawn_stamp(&mut self, eye: Entity, card: Option<CardRig>) -> Option<Entity> {
        if !self.world.contains(eye) {
            log::warn!("Cannot link stamp to missing eye {:?}", eye);
            return None;
        }
        let stamp = JudgementStamp::new(self.tuning.judgement);
        Some(self.world.spawn((StampTool {
            stamp,
            eye,
            card,
            outcome: None,
        },)))
    }

    pub fn spawn_lamp(&mut self) -> Entity {
        let light = FlickerLight::new(self.tuning.flicker, &mut self.rng);
        self.world.spawn((Lamp::new(light),))
    }

    pub fn spawn_prop(&mut self, name: &str, pose: Pose) -> Entity {
        self.world.spawn((
            Prop {
                name: name.to_string(),
            },
            TransformTween::new(pose),
        ))
    }

    /// Queue a command for the next update
    pub fn push(&mut self, target: Entity, command: Command) {
        self.commands.push(target, command);
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Advance the room by `delta_seconds`
    pub fn update(&mut self, delta_seconds: f32) {
        let dt = (delta_seconds * self.time_scale).max(0.0);
        self.elapsed += dt as f64;

        for (_, activity) in self.world.query_mut::<&mut EyeActivity>() {
            activity.clear();
        }

        command_system(&mut self.world, &mut self.commands, &mut self.rng);

        cadence_system(&mut self.world, dt, &mut self.rng);
        playback_system(&mut self.world, dt);
        speculum_system(&mut self.world, dt);
        dropper_system(&mut self.world, dt);
        judgement_system(&mut self.world, dt);
        motion_system(&mut self.world, dt, &mut self.rng);
        breath_system(&mut self.world, dt, &mut self.rng);
        blend_mapping_system(&mut self.world);
        pupil_system(&mut self.world, dt);
        flicker_system(&mut self.world, dt, &mut self.rng);
        for prop in tween_system(&mut self.world, dt) {
            log::debug!("Prop {:?} reached its target", prop);
        }
    }

    /// Set time scale (1.0 = real-time, 2.0 = 2x speed, etc.)
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = scale.max(0.0);
    }

    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Seconds simulated so far
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    fn read<T: Component, U>(&self, entity: Entity, f: impl FnOnce(&T) -> U) -> Option<U> {
        self.world.get::<&T>(entity).ok().map(|c| f(&*c))
    }

    /// Push an eye's blend-shape weights to a renderer. Returns false if the
    /// entity is not an eyeball.
    pub fn write_blend_shapes<S: BlendShapeSink + ?Sized>(&self, eye: Entity, sink: &mut S) -> bool {
        self.read::<BlendShapeVector, _>(eye, |w| w.write_to(sink)).is_some()
    }

    pub fn blend_shapes(&self, eye: Entity) -> Option<BlendShapeVector> {
        self.read::<BlendShapeVector, _>(eye, |w| *w)
    }

    /// The eyeball's local rotation this step
    pub fn eye_rotation(&self, eye: Entity) -> Option<Quat> {
        self.read::<EyeMotion, _>(eye, |m| m.current())
    }

    pub fn motion_state(&self, eye: Entity) -> Option<MotionState> {
        self.read::<EyeMotion, _>(eye, |m| m.state())
    }

    /// The breathing carrier's local pose this step
    pub fn carrier_pose(&self, eye: Entity) -> Option<Pose> {
        self.read::<BreathOscillator, _>(eye, |b| Pose::new(b.position(), b.rotation()))
    }

    pub fn activity(&self, eye: Entity) -> Option<EyeActivity> {
        self.read::<EyeActivity, _>(eye, |a| a.clone())
    }

    pub fn speculum(&self, tool: Entity) -> Option<Speculum> {
        self.read::<SpeculumTool, _>(tool, |t| t.speculum.clone())
    }

    pub fn speculum_state(&self, tool: Entity) -> Option<SpeculumState> {
        self.read::<SpeculumTool, _>(tool, |t| t.speculum.state())
    }

    /// Pupil dilation in [0, 1]
    pub fn pupil_dilation(&self, eye: Entity) -> Option<f32> {
        self.read::<Pupil, _>(eye, |p| p.amount())
    }

    pub fn dropper_state(&self, tool: Entity) -> Option<DropperState> {
        self.read::<DropperTool, _>(tool, |t| t.dropper.state())
    }

    pub fn stamp_state(&self, tool: Entity) -> Option<StampState> {
        self.read::<StampTool, _>(tool, |t| t.stamp.state())
    }

    /// Shift totals kept by a stamp
    pub fn tally(&self, tool: Entity) -> Option<ExamTally> {
        self.read::<StampTool, _>(tool, |t| t.stamp.tally())
    }

    /// The verdict that landed during the last update, if any
    pub fn judgement_outcome(&self, tool: Entity) -> Option<JudgementOutcome> {
        self.read::<StampTool, _>(tool, |t| t.outcome).flatten()
    }

    pub fn lamp(&self, lamp: Entity) -> Option<Lamp> {
        self.read::<Lamp, _>(lamp, |l| l.clone())
    }

    pub fn prop_pose(&self, prop: Entity) -> Option<Pose> {
        self.read::<TransformTween, _>(prop, |t| t.pose())
    }

    pub fn prop_moving(&self, prop: Entity) -> Option<bool> {
        self.read::<TransformTween, _>(prop, |t| t.is_moving())
    }
}
