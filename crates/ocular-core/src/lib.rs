//! Ocular Core - Eyeball Inspection Engine
//!
//! An ECS-based host for the procedural eye animation in `ocular-logic`.
//! One engine owns every eyeball, speculum, light and prop in an exam room
//! and steps them together.
//!
//! # Architecture
//!
//! The engine uses an Entity Component System (ECS) architecture via `hecs`:
//! - **Entities**: Eyeballs, speculum tools, flickering lights, tweened props
//! - **Components**: The logic crate's state machines plus a little glue
//! - **Systems**: Functions that step those state machines in a fixed order
//! - **Commands**: Typed requests queued by the host and drained each update
//!
//! # Example
//!
//! ```rust,no_run
//! use ocular_core::prelude::*;
//!
//! let mut engine = ExamEngine::new(42);
//! let eye = engine.spawn_eyeball(Pose::default(), Quat::IDENTITY, PatientProfile::default());
//!
//! engine.push(eye, Command::SetMotionState(MotionState::Agitated));
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod commands;
pub mod components;
pub mod config;
pub mod engine;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::commands::{Command, CommandQueue};
    pub use crate::components::*;
    pub use crate::config::{ConfigError, Tuning};
    pub use crate::engine::ExamEngine;
    pub use glam::{Quat, Vec3};
    pub use ocular_logic::blend_shapes::{BlendShape, BlendShapeSink, BlendShapeVector};
    pub use ocular_logic::cadence::PatientProfile;
    pub use ocular_logic::dropper::DropperState;
    pub use ocular_logic::judgement::{StampState, Verdict};
    pub use ocular_logic::motion::MotionState;
    pub use ocular_logic::playback::TwitchDegree;
    pub use ocular_logic::speculum::SpeculumState;
    pub use ocular_logic::tween::Pose;
}
