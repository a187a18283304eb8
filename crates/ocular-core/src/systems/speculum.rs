//! Speculum system - steps speculum tools and applies their effects to eyes

use hecs::{ComponentError, Entity, World};
use ocular_logic::blend_shapes::{BlendShape, BlendShapeVector};
use ocular_logic::motion::EyeMotion;
use ocular_logic::playback::EyelidAnimator;
use ocular_logic::speculum::EyeEffect;

use crate::components::SpeculumTool;

/// Step every speculum, then hand its effects to the linked eyeball.
pub fn speculum_system(world: &mut World, delta_seconds: f32) {
    let mut pending: Vec<(Entity, Vec<EyeEffect>)> = Vec::new();
    for (_, tool) in world.query_mut::<&mut SpeculumTool>() {
        let effects = tool.speculum.step(delta_seconds);
        if !effects.is_empty() {
            pending.push((tool.eye, effects));
        }
    }

    for (eye, effects) in pending {
        apply_eye_effects(world, eye, &effects);
    }
}

/// Apply speculum effects to an eyeball, warning once if it is gone.
pub fn apply_eye_effects(world: &mut World, eye: Entity, effects: &[EyeEffect]) {
    for effect in effects {
        if let Err(e) = apply_eye_effect(world, eye, *effect) {
            log::warn!("Speculum effect {:?} dropped for {:?}: {}", effect, eye, e);
            return;
        }
    }
}

fn apply_eye_effect(world: &mut World, eye: Entity, effect: EyeEffect) -> Result<(), ComponentError> {
    match effect {
        EyeEffect::SetMotionState(state) => world.get::<&mut EyeMotion>(eye)?.set_state(state),
        EyeEffect::SetCanAnimate(can) => world.get::<&mut EyelidAnimator>(eye)?.set_can_animate(can),
        EyeEffect::SetEyeOpen(weight) => {
            world.get::<&mut BlendShapeVector>(eye)?.set(BlendShape::Open, weight)
        }
    }
    Ok(())
}
