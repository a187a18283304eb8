//! Prop systems - flickering lamps and tweened props

use hecs::{Entity, World};
use ocular_logic::tween::TransformTween;
use rand::Rng;

use crate::components::Lamp;

/// Step every lamp and record the signals it raised.
pub fn flicker_system<R: Rng + ?Sized>(world: &mut World, delta_seconds: f32, rng: &mut R) {
    for (_, lamp) in world.query_mut::<&mut Lamp>() {
        lamp.signals = lamp.light.step(delta_seconds, rng);
    }
}

/// Step every tween. Returns the entities whose tween landed this update.
pub fn tween_system(world: &mut World, delta_seconds: f32) -> Vec<Entity> {
    let mut landed = Vec::new();
    for (entity, tween) in world.query_mut::<&mut TransformTween>() {
        if tween.step(delta_seconds) {
            landed.push(entity);
        }
    }
    landed
}
