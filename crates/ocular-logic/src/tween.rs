//! Smoothstep transform tweens for moving props between poses.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::math::smoothstep;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Pose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct ActiveTween {
    from: Pose,
    to: Pose,
    duration: f32,
    elapsed: f32,
}

/// A pose that can be eased toward a target over a fixed duration.
///
/// Starting a new tween replaces the one in progress, beginning from
/// wherever the pose currently is.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformTween {
    pose: Pose,
    active: Option<ActiveTween>,
}

impl TransformTween {
    pub fn new(pose: Pose) -> Self {
        Self { pose, active: None }
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn is_moving(&self) -> bool {
        self.active.is_some()
    }

    pub fn start(&mut self, target: Pose, duration: f32) {
        if self.active.is_some() {
            log::debug!("Tween replaced before finishing");
        }
        if duration <= 0.0 {
            self.pose = target;
            self.active = None;
            return;
        }
        self.active = Some(ActiveTween {
            from: self.pose,
            to: target,
            duration,
            elapsed: 0.0,
        });
    }

    /// Advance by `dt`. Returns true on the step the tween lands.
    pub fn step(&mut self, dt: f32) -> bool {
        let Some(mut tween) = self.active else {
            return false;
        };
        tween.elapsed += dt.max(0.0);
        if tween.elapsed >= tween.duration {
            self.pose = tween.to;
            self.active = None;
            return true;
        }
        let t = smoothstep(tween.elapsed / tween.duration);
        self.pose = Pose {
            position: tween.from.position.lerp(tween.to.position, t),
            rotation: tween.from.rotation.slerp(tween.to.rotation, t).normalize(),
        };
        self.active = Some(tween);
        false
    }
}

impl Default for TransformTween {
    fn default() -> Self {
        Self::new(Pose::default())
    }
}
