//! Motion systems - eyeball rotation, breathing and gaze blend shapes

use hecs::World;
use ocular_logic::blend_shapes::{BlendShapeVector, GazeMapping};
use ocular_logic::breath::BreathOscillator;
use ocular_logic::motion::EyeMotion;
use rand::Rng;

use crate::components::EyeActivity;

/// Sample new targets and ease every eyeball toward its target.
pub fn motion_system<R: Rng + ?Sized>(world: &mut World, delta_seconds: f32, rng: &mut R) {
    for (_, (motion, activity)) in world.query_mut::<(&mut EyeMotion, &mut EyeActivity)>() {
        let samples = motion.step(delta_seconds, rng);
        activity.samples.extend(samples);
    }
}

/// Move every carrier along its breath cycle.
pub fn breath_system<R: Rng + ?Sized>(world: &mut World, delta_seconds: f32, rng: &mut R) {
    for (_, breath) in world.query_mut::<&mut BreathOscillator>() {
        breath.step(delta_seconds, rng);
    }
}

/// Derive the directional blend-shape weights from each eye's rotation.
pub fn blend_mapping_system(world: &mut World) {
    for (_, (motion, gaze, weights)) in
        world.query_mut::<(&EyeMotion, &GazeMapping, &mut BlendShapeVector)>()
    {
        weights.apply_gaze(motion.current(), gaze);
    }
}
