//! Components for the tools and fixtures around the eye.

use hecs::Entity;
use ocular_logic::dropper::Dropper;
use ocular_logic::flicker::{FlickerLight, FlickerSignals};
use ocular_logic::judgement::{JudgementOutcome, JudgementStamp};
use ocular_logic::speculum::Speculum;
use ocular_logic::tween::Pose;

/// A speculum and the eyeball it acts on.
#[derive(Debug, Clone)]
pub struct SpeculumTool {
    pub speculum: Speculum,
    pub eye: Entity,
}

/// An eye dropper aimed at an eyeball.
#[derive(Debug, Clone)]
pub struct DropperTool {
    pub dropper: Dropper,
    pub eye: Entity,
    /// Drops that reached the eye during the last update.
    pub landed: usize,
}

/// The ID card a stamp zooms in on while lifted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardRig {
    /// Prop entity carrying the card's tween.
    pub card: Entity,
    pub rest: Pose,
    pub inspect: Pose,
    /// Seconds for each card move.
    pub duration: f32,
}

/// A judgement stamp, the eyeball of the patient it judges, and its card.
#[derive(Debug, Clone)]
pub struct StampTool {
    pub stamp: JudgementStamp,
    pub eye: Entity,
    pub card: Option<CardRig>,
    /// Verdict that landed during the last update.
    pub outcome: Option<JudgementOutcome>,
}

/// A flickering light and the signals it raised during the last update.
#[derive(Debug, Clone)]
pub struct Lamp {
    pub light: FlickerLight,
    pub signals: FlickerSignals,
}

impl Lamp {
    pub fn new(light: FlickerLight) -> Self {
        Self {
            light,
            signals: FlickerSignals::default(),
        }
    }
}

/// A movable prop (ID card, stamp) driven by a transform tween.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prop {
    pub name: String,
}
