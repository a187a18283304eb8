//! Systems - logic that steps components
//!
//! Each system is a plain function over the `hecs::World`. The engine calls
//! them once per update in this order: commands, cadence, playback,
//! speculum, dropper, judgement, motion, breath, blend mapping, pupil,
//! flicker, tween.

mod commands;
mod eyelids;
mod motion;
mod props;
mod speculum;
mod tools;

pub use commands::*;
pub use eyelids::*;
pub use motion::*;
pub use props::*;
pub use speculum::*;
pub use tools::{dropper_system, judgement_system, pupil_system};
