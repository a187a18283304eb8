//! Command system - applies queued host commands to their entities

use hecs::{ComponentError, Entity, World};
use ocular_logic::breath::BreathOscillator;
use ocular_logic::cadence::BlinkCadence;
use ocular_logic::dropper::Pupil;
use ocular_logic::motion::EyeMotion;
use ocular_logic::playback::{EyelidAnimator, PlaybackKind};
use ocular_logic::tween::TransformTween;
use rand::Rng;

use super::speculum::apply_eye_effects;
use super::tools::{card_is_moving, move_card};
use crate::commands::{Command, CommandQueue};
use crate::components::{DropperTool, EyeActivity, SpeculumTool, StampTool};

/// Apply every queued command in order. Returns how many were applied.
///
/// A command whose target is gone, or lacks the component it needs, is
/// dropped with a warning.
pub fn command_system<R: Rng + ?Sized>(
    world: &mut World,
    queue: &mut CommandQueue,
    rng: &mut R,
) -> usize {
    let mut applied = 0;
    for (target, command) in queue.drain() {
        match apply_command(world, target, command, rng) {
            Ok(()) => applied += 1,
            Err(e) => log::warn!("Dropped {} for {:?}: {}", command.name(), target, e),
        }
    }
    applied
}

fn apply_command<R: Rng + ?Sized>(
    world: &mut World,
    target: Entity,
    command: Command,
    rng: &mut R,
) -> Result<(), ComponentError> {
    match command {
        Command::SetMotionState(state) => world.get::<&mut EyeMotion>(target)?.set_state(state),
        Command::SetTrackingTarget(point) => {
            world.get::<&mut EyeMotion>(target)?.set_tracking_target(point)
        }
        Command::SetCanAnimate(can) => {
            world.get::<&mut EyelidAnimator>(target)?.set_can_animate(can)
        }
        Command::SetPatient(profile) => {
            world.get::<&mut BlinkCadence>(target)?.set_profile(profile, rng);
            world.get::<&mut Pupil>(target)?.reset();
        }
        Command::PauseBreathing => world.get::<&mut BreathOscillator>(target)?.pause(),
        Command::ResumeBreathing => world.get::<&mut BreathOscillator>(target)?.resume(rng),
        Command::Blink => start_clip(world, target, PlaybackKind::Blink)?,
        Command::Twitch(degree) => start_clip(world, target, PlaybackKind::Twitch(degree))?,
        Command::StopBlink => world.get::<&mut EyelidAnimator>(target)?.stop_blink(),
        Command::StopTwitch => world.get::<&mut EyelidAnimator>(target)?.stop_twitch(),
        Command::SpeculumPickedUp => {
            let (eye, effects) = {
                let mut tool = world.get::<&mut SpeculumTool>(target)?;
                let eye = tool.eye;
                (eye, tool.speculum.picked_up())
            };
            apply_eye_effects(world, eye, &effects);
        }
        Command::SpeculumPutDown => world.get::<&mut SpeculumTool>(target)?.speculum.put_down(),
        Command::SpeculumPullStarted => {
            let (eye, effect) = {
                let mut tool = world.get::<&mut SpeculumTool>(target)?;
                let eye = tool.eye;
                (eye, tool.speculum.pull_started())
            };
            if let Some(effect) = effect {
                apply_eye_effects(world, eye, &[effect]);
            }
        }
        Command::SpeculumPullEnded => {
            let (eye, effect) = {
                let mut tool = world.get::<&mut SpeculumTool>(target)?;
                let eye = tool.eye;
                (eye, tool.speculum.pull_ended())
            };
            apply_eye_effects(world, eye, &[effect]);
        }
        Command::SpeculumTrigger(value) => {
            world.get::<&mut SpeculumTool>(target)?.speculum.set_trigger(value)
        }
        Command::DropperPickedUp => {
            world.get::<&mut DropperTool>(target)?.dropper.pick_up();
        }
        Command::DropperPutDown => {
            world.get::<&mut DropperTool>(target)?.dropper.put_down();
        }
        Command::DropperSqueezed => {
            world.get::<&mut DropperTool>(target)?.dropper.squeeze();
        }
        Command::StampLifted => {
            let card = {
                let mut tool = world.get::<&mut StampTool>(target)?;
                let lifted = tool.stamp.lift();
                tool.card.filter(|_| lifted)
            };
            if let Some(rig) = card {
                move_card(world, &rig, rig.inspect);
            }
        }
        Command::StampRested => {
            let card = {
                let mut tool = world.get::<&mut StampTool>(target)?;
                let rested = tool.stamp.rest();
                tool.card.filter(|_| rested)
            };
            if let Some(rig) = card {
                move_card(world, &rig, rig.rest);
            }
        }
        Command::Judge(verdict) => {
            let card = world.get::<&StampTool>(target)?.card;
            let moving = card.map_or(false, |rig| card_is_moving(world, &rig));
            let pressed = world
                .get::<&mut StampTool>(target)?
                .stamp
                .press(verdict, moving);
            if !pressed {
                log::debug!("Stamp refused {:?}", verdict);
            }
        }
        Command::TweenTo {
            target: pose,
            duration,
        } => world.get::<&mut TransformTween>(target)?.start(pose, duration),
    }
    Ok(())
}

fn start_clip(world: &mut World, eye: Entity, kind: PlaybackKind) -> Result<(), ComponentError> {
    let started = {
        let mut animator = world.get::<&mut EyelidAnimator>(eye)?;
        match kind {
            PlaybackKind::Blink => animator.start_blink(),
            PlaybackKind::Twitch(degree) => animator.start_twitch(degree),
        }
    };
    if started {
        if let Ok(mut activity) = world.get::<&mut EyeActivity>(eye) {
            activity.started = Some(kind);
        }
    }
    Ok(())
}
