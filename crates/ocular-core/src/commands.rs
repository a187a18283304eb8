//! Typed commands from the host.
//!
//! Input handlers, UI buttons and scripted exam steps never touch components
//! directly. They push a [`Command`] addressed to an entity, and the engine
//! applies every queued command at the start of its next update, in order.

use std::collections::VecDeque;

use glam::Vec3;
use hecs::Entity;
use ocular_logic::cadence::PatientProfile;
use ocular_logic::judgement::Verdict;
use ocular_logic::motion::MotionState;
use ocular_logic::playback::TwitchDegree;
use ocular_logic::tween::Pose;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    // Eyeball
    SetMotionState(MotionState),
    SetTrackingTarget(Option<Vec3>),
    SetCanAnimate(bool),
    SetPatient(PatientProfile),
    PauseBreathing,
    ResumeBreathing,
    Blink,
    Twitch(TwitchDegree),
    StopBlink,
    StopTwitch,

    // Speculum
    SpeculumPickedUp,
    SpeculumPutDown,
    SpeculumPullStarted,
    SpeculumPullEnded,
    /// Trigger pressure in [0, 1].
    SpeculumTrigger(f32),

    // Dropper
    DropperPickedUp,
    DropperPutDown,
    DropperSqueezed,

    // Judgement stamp
    StampLifted,
    StampRested,
    Judge(Verdict),

    // Props
    TweenTo { target: Pose, duration: f32 },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SetMotionState(_) => "SetMotionState",
            Command::SetTrackingTarget(_) => "SetTrackingTarget",
            Command::SetCanAnimate(_) => "SetCanAnimate",
            Command::SetPatient(_) => "SetPatient",
            Command::PauseBreathing => "PauseBreathing",
            Command::ResumeBreathing => "ResumeBreathing",
            Command::Blink => "Blink",
            Command::Twitch(_) => "Twitch",
            Command::StopBlink => "StopBlink",
            Command::StopTwitch => "StopTwitch",
            Command::SpeculumPickedUp => "SpeculumPickedUp",
            Command::SpeculumPutDown => "SpeculumPutDown",
            Command::SpeculumPullStarted => "SpeculumPullStarted",
            Command::SpeculumPullEnded => "SpeculumPullEnded",
            Command::SpeculumTrigger(_) => "SpeculumTrigger",
            Command::DropperPickedUp => "DropperPickedUp",
            Command::DropperPutDown => "DropperPutDown",
            Command::DropperSqueezed => "DropperSqueezed",
            Command::StampLifted => "StampLifted",
            Command::StampRested => "StampRested",
            Command::Judge(_) => "Judge",
            Command::TweenTo { .. } => "TweenTo",
        }
    }
}

/// FIFO of commands waiting for the next update.
#[derive(Debug, Clone, Default)]
pub struct CommandQueue {
    pending: VecDeque<(Entity, Command)>,
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, target: Entity, command: Command) {
        self.pending.push_back((target, command));
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Take every queued command, oldest first.
    pub fn drain(&mut self) -> impl Iterator<Item = (Entity, Command)> + '_ {
        self.pending.drain(..)
    }
}
