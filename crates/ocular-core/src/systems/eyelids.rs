//! Eyelid systems - blink/twitch cadence and clip playback

use hecs::World;
use ocular_logic::blend_shapes::BlendShapeVector;
use ocular_logic::cadence::BlinkCadence;
use ocular_logic::playback::{EyelidAnimator, PlaybackKind};
use rand::Rng;

use crate::components::EyeActivity;

/// Count down blink/twitch cooldowns and start clips that come due.
pub fn cadence_system<R: Rng + ?Sized>(world: &mut World, delta_seconds: f32, rng: &mut R) {
    for (_, (cadence, animator, activity)) in
        world.query_mut::<(&mut BlinkCadence, &mut EyelidAnimator, &mut EyeActivity)>()
    {
        let triggers = cadence.step(delta_seconds, rng);
        activity.cadence = triggers;

        if triggers.blink && animator.start_blink() {
            activity.started = Some(PlaybackKind::Blink);
        }
        if let Some(degree) = triggers.twitch {
            if animator.start_twitch(degree) {
                activity.started = Some(PlaybackKind::Twitch(degree));
            }
        }
    }
}

/// Advance running clips and write Blink/Twitch weights.
pub fn playback_system(world: &mut World, delta_seconds: f32) {
    for (_, (animator, weights, activity)) in
        world.query_mut::<(&mut EyelidAnimator, &mut BlendShapeVector, &mut EyeActivity)>()
    {
        if let Some(kind) = animator.step(delta_seconds, weights) {
            activity.completed = Some(kind);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::eyeball_bundle;
    use crate::config::Tuning;
    use glam::Quat;
    use ocular_logic::blend_shapes::BlendShape;
    use ocular_logic::cadence::PatientProfile;
    use ocular_logic::tween::Pose;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    #[test]
    fn test_cadence_drives_blinks() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut world = World::new();
        let eye = world.spawn(eyeball_bundle(
            "test",
            &Tuning::default(),
            Pose::default(),
            Quat::IDENTITY,
            PatientProfile::default(),
            &mut rng,
        ));

        let (mut started, mut completed, mut peak) = (0, 0, 0.0f32);
        for _ in 0..(60 * 20) {
            if let Ok(mut activity) = world.get::<&mut EyeActivity>(eye) {
                activity.clear();
            }
            cadence_system(&mut world, DT, &mut rng);
            playback_system(&mut world, DT);

            if let Ok(activity) = world.get::<&EyeActivity>(eye) {
                if activity.started == Some(PlaybackKind::Blink) {
                    started += 1;
                }
                if activity.completed == Some(PlaybackKind::Blink) {
                    completed += 1;
                }
            }
            if let Ok(weights) = world.get::<&BlendShapeVector>(eye) {
                peak = peak.max(weights.get(BlendShape::Blink));
            }
        }

        // 3..7 s human cooldown over 20 s
        assert!(started >= 2, "started = {}", started);
        assert!(completed + 1 >= started);
        assert!(peak > 90.0);
    }

    #[test]
    fn test_locked_eye_never_blinks() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut world = World::new();
        let eye = world.spawn(eyeball_bundle(
            "test",
            &Tuning::default(),
            Pose::default(),
            Quat::IDENTITY,
            PatientProfile::default(),
            &mut rng,
        ));
        if let Ok(mut animator) = world.get::<&mut EyelidAnimator>(eye) {
            animator.set_can_animate(false);
        }

        for _ in 0..(60 * 20) {
            cadence_system(&mut world, DT, &mut rng);
            playback_system(&mut world, DT);
        }
        let busy = world.get::<&EyelidAnimator>(eye).map(|a| a.is_busy());
        assert_eq!(busy.ok(), Some(false));
        let blink = world.get::<&BlendShapeVector>(eye).map(|w| w.get(BlendShape::Blink));
        assert_eq!(blink.ok(), Some(0.0));
    }
}
