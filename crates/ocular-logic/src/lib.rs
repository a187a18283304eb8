//! Pure eyeball animation logic for Ocular.
//!
//! This crate contains the procedural animation kernel of the inspection
//! game, independent of any ECS, renderer, or engine. Every state machine is
//! advanced explicitly with an elapsed-time delta and a caller-supplied RNG,
//! so each one can be unit-tested and driven from any host loop.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`math`] | Clamped range mapping, angle normalization, bounded rotation steps |
//! | [`tuning`] | Serde-backed tuning parameters and interval ranges |
//! | [`motion`] | Eyeball motion states, jitter/saccade sampling, rotation easing |
//! | [`breath`] | Breath oscillator with automatic and manual pauses |
//! | [`blend_shapes`] | Blend-shape weight vector and rotation-to-weight mapping |
//! | [`playback`] | Keyframed blink/twitch clips and the single-slot player |
//! | [`cadence`] | Per-patient blink and twitch cooldown scheduling |
//! | [`speculum`] | Speculum tool placement and eyelid-opening state machine |
//! | [`dropper`] | Eye dropper, falling drops and pupil dilation |
//! | [`judgement`] | Judgement stamp, verdict scoring and shift tally |
//! | [`flicker`] | Unstable light intensity phases (on, off, hard blink) |
//! | [`tween`] | Smoothstep position/rotation tweens |
//! | [`noise`] | Seeded 1-D gradient noise |

pub mod blend_shapes;
pub mod breath;
pub mod cadence;
pub mod dropper;
pub mod flicker;
pub mod judgement;
pub mod math;
pub mod motion;
pub mod noise;
pub mod playback;
pub mod speculum;
pub mod tuning;
pub mod tween;
