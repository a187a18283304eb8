//! Blend-shape weights and the rotation → gaze-direction mapping.
//!
//! The eye mesh exposes seven channels. Blink, Twitch and Open are written by
//! clip playback and the speculum; the four directional channels follow the
//! eyeball rotation every step.

use glam::Quat;
use serde::{Deserialize, Serialize};

use crate::math::{map_clamped, pitch_yaw_deg};

/// Blend-shape channels, in mesh order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BlendShape {
    Blink = 0,
    Twitch = 1,
    Open = 2,
    Up = 3,
    Down = 4,
    Left = 5,
    Right = 6,
}

impl BlendShape {
    pub const COUNT: usize = 7;

    pub const ALL: [BlendShape; Self::COUNT] = [
        Self::Blink,
        Self::Twitch,
        Self::Open,
        Self::Up,
        Self::Down,
        Self::Left,
        Self::Right,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Blink => "Blink",
            Self::Twitch => "Twitch",
            Self::Open => "Open",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
        }
    }
}

/// Lowest and highest weight a channel may hold.
pub const WEIGHT_MIN: f32 = 0.0;
pub const WEIGHT_MAX: f32 = 100.0;

/// Ordered channel weights, each kept in [0, 100].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BlendShapeVector {
    weights: [f32; BlendShape::COUNT],
}

impl BlendShapeVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, shape: BlendShape) -> f32 {
        self.weights[shape.index()]
    }

    /// Set a channel; the value is clamped into [0, 100].
    pub fn set(&mut self, shape: BlendShape, weight: f32) {
        let weight = if weight.is_nan() { WEIGHT_MIN } else { weight };
        self.weights[shape.index()] = weight.clamp(WEIGHT_MIN, WEIGHT_MAX);
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.weights
    }

    pub fn iter(&self) -> impl Iterator<Item = (BlendShape, f32)> + '_ {
        BlendShape::ALL.iter().map(move |s| (*s, self.get(*s)))
    }

    /// Overwrite the four directional channels from a rotation.
    pub fn apply_gaze(&mut self, rotation: Quat, mapping: &GazeMapping) {
        let gaze = mapping.weights_for(rotation);
        self.set(BlendShape::Up, gaze.up);
        self.set(BlendShape::Down, gaze.down);
        self.set(BlendShape::Left, gaze.left);
        self.set(BlendShape::Right, gaze.right);
    }

    /// Push every channel to a renderer.
    pub fn write_to<S: BlendShapeSink + ?Sized>(&self, sink: &mut S) {
        for (i, w) in self.weights.iter().enumerate() {
            sink.set_blend_shape_weight(i, *w);
        }
    }
}

/// Anything that accepts indexed blend-shape weights (a skinned mesh, a
/// debug overlay, a recorder).
pub trait BlendShapeSink {
    fn set_blend_shape_weight(&mut self, index: usize, weight: f32);
}

impl BlendShapeSink for Vec<f32> {
    fn set_blend_shape_weight(&mut self, index: usize, weight: f32) {
        if index >= self.len() {
            self.resize(index + 1, 0.0);
        }
        self[index] = weight;
    }
}

/// Rotation extents (degrees) at which each directional channel reaches 100.
///
/// Pitch is negative looking up; yaw is positive looking left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GazeMapping {
    pub up_pitch: f32,
    pub down_pitch: f32,
    pub left_yaw: f32,
    pub right_yaw: f32,
}

impl Default for GazeMapping {
    fn default() -> Self {
        Self {
            up_pitch: -13.0,
            down_pitch: 13.0,
            left_yaw: 21.0,
            right_yaw: -25.0,
        }
    }
}

/// Directional weights derived from one rotation.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GazeWeights {
    pub up: f32,
    pub down: f32,
    pub left: f32,
    pub right: f32,
}

impl GazeMapping {
    /// Map pitch/yaw (degrees, already in (-180, 180]) to weights.
    pub fn weights_for_angles(&self, pitch: f32, yaw: f32) -> GazeWeights {
        GazeWeights {
            up: map_clamped(pitch, 0.0, self.up_pitch, WEIGHT_MIN, WEIGHT_MAX),
            down: map_clamped(pitch, 0.0, self.down_pitch, WEIGHT_MIN, WEIGHT_MAX),
            left: map_clamped(yaw, 0.0, self.left_yaw, WEIGHT_MIN, WEIGHT_MAX),
            right: map_clamped(yaw, 0.0, self.right_yaw, WEIGHT_MIN, WEIGHT_MAX),
        }
    }

    pub fn weights_for(&self, rotation: Quat) -> GazeWeights {
        let (pitch, yaw) = pitch_yaw_deg(rotation);
        self.weights_for_angles(pitch, yaw)
    }
}
