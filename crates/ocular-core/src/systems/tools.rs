//! Dropper and judgement stamp systems

use hecs::{Entity, World};
use ocular_logic::cadence::{BlinkCadence, PatientProfile};
use ocular_logic::dropper::Pupil;
use ocular_logic::tween::{Pose, TransformTween};

use crate::components::{CardRig, DropperTool, StampTool};

/// Step every dropper; landed drops dilate the linked eye if the patient
/// reacts.
pub fn dropper_system(world: &mut World, delta_seconds: f32) {
    let mut landings: Vec<Entity> = Vec::new();
    for (_, tool) in world.query_mut::<&mut DropperTool>() {
        tool.landed = tool.dropper.step(delta_seconds);
        if tool.landed > 0 {
            landings.push(tool.eye);
        }
    }

    for eye in landings {
        let Some(patient) = patient_of(world, eye) else {
            log::warn!("Drop landed on missing eye {:?}", eye);
            continue;
        };
        if let Ok(mut pupil) = world.get::<&mut Pupil>(eye) {
            if pupil.drop_landed(&patient) {
                log::debug!("Pupil of {:?} dilating", eye);
            }
        }
    }
}

/// Ease every pupil toward its dilation target.
pub fn pupil_system(world: &mut World, delta_seconds: f32) {
    for (_, pupil) in world.query_mut::<&mut Pupil>() {
        pupil.step(delta_seconds);
    }
}

/// Step every stamp. A landed verdict resets the eye's pupil and slides the
/// card back to rest.
pub fn judgement_system(world: &mut World, delta_seconds: f32) {
    let stamps: Vec<(Entity, Entity)> = world
        .query_mut::<&StampTool>()
        .into_iter()
        .map(|(entity, tool)| (entity, tool.eye))
        .collect();

    for (stamp, eye) in stamps {
        let patient = patient_of(world, eye);
        let landed = {
            let Ok(mut tool) = world.get::<&mut StampTool>(stamp) else {
                continue;
            };
            let outcome = match patient {
                Some(patient) => tool.stamp.step(delta_seconds, &patient),
                None => None,
            };
            tool.outcome = outcome;
            let card = tool.card;
            outcome.map(|_| card)
        };

        if let Some(card) = landed {
            if let Ok(mut pupil) = world.get::<&mut Pupil>(eye) {
                pupil.reset();
            }
            if let Some(rig) = card {
                move_card(world, &rig, rig.rest);
            }
        }
    }
}

fn patient_of(world: &World, eye: Entity) -> Option<PatientProfile> {
    world.get::<&BlinkCadence>(eye).ok().map(|c| c.profile())
}

pub(crate) fn card_is_moving(world: &World, rig: &CardRig) -> bool {
    world
        .get::<&TransformTween>(rig.card)
        .map(|t| t.is_moving())
        .unwrap_or(false)
}

pub(crate) fn move_card(world: &mut World, rig: &CardRig, target: Pose) {
    match world.get::<&mut TransformTween>(rig.card) {
        Ok(mut tween) => tween.start(target, rig.duration),
        Err(e) => log::warn!("Card {:?} cannot move: {}", rig.card, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::eyeball_bundle;
    use crate::config::Tuning;
    use glam::{Quat, Vec3};
    use ocular_logic::dropper::Dropper;
    use ocular_logic::judgement::{JudgementStamp, StampState, Verdict};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const DT: f32 = 1.0 / 60.0;

    fn world_with_patient(profile: PatientProfile) -> (World, Entity) {
        let mut rng = StdRng::seed_from_u64(41);
        let mut world = World::new();
        let eye = world.spawn(eyeball_bundle(
            "test",
            &Tuning::default(),
            Pose::default(),
            Quat::IDENTITY,
            profile,
            &mut rng,
        ));
        (world, eye)
    }

    fn drip_once(world: &mut World, eye: Entity) {
        let mut dropper = Dropper::default();
        dropper.pick_up();
        for _ in 0..60 {
            dropper.step(DT);
        }
        dropper.squeeze();
        world.spawn((DropperTool {
            dropper,
            eye,
            landed: 0,
        },));
        for _ in 0..120 {
            dropper_system(world, DT);
            pupil_system(world, DT);
        }
    }

    fn dilation(world: &World, eye: Entity) -> Option<f32> {
        world.get::<&Pupil>(eye).ok().map(|p| p.amount())
    }

    #[test]
    fn test_drop_dilates_healthy_eye() {
        let (mut world, eye) = world_with_patient(PatientProfile::default());
        drip_once(&mut world, eye);
        assert_eq!(dilation(&world, eye), Some(1.0));
    }

    #[test]
    fn test_drop_leaves_stubborn_infected_eye() {
        let (mut world, eye) = world_with_patient(PatientProfile {
            infected: true,
            will_dilate: false,
            ..PatientProfile::default()
        });
        drip_once(&mut world, eye);
        assert_eq!(dilation(&world, eye), Some(0.0));
    }

    #[test]
    fn test_verdict_resets_pupil_and_returns_card() {
        let (mut world, eye) = world_with_patient(PatientProfile::default());
        drip_once(&mut world, eye);

        let rest = Pose::default();
        let inspect = Pose::new(Vec3::new(0.0, 0.2, 0.3), Quat::IDENTITY);
        let card = world.spawn((TransformTween::new(inspect),));
        let mut stamp = JudgementStamp::default();
        stamp.lift();
        stamp.press(Verdict::Accepted, false);
        let tool = world.spawn((StampTool {
            stamp,
            eye,
            card: Some(CardRig {
                card,
                rest,
                inspect,
                duration: 0.5,
            }),
            outcome: None,
        },));

        let mut landed = false;
        for _ in 0..60 {
            judgement_system(&mut world, DT);
            let outcome = world.get::<&StampTool>(tool).ok().and_then(|t| t.outcome);
            if outcome.is_some() {
                landed = true;
                break;
            }
        }
        assert!(landed);
        let pupil = world.get::<&Pupil>(eye).map(|p| p.is_dilated());
        assert_eq!(pupil.ok(), Some(false));
        let moving = world.get::<&TransformTween>(card).map(|t| t.is_moving());
        assert_eq!(moving.ok(), Some(true));
        let state = world.get::<&StampTool>(tool).map(|t| t.stamp.state());
        assert_eq!(state.ok(), Some(StampState::Resting));
    }
}
