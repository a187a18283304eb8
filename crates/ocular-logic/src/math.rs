//! Small numeric helpers shared by every animation module.
//!
//! Angles handed to and returned from these functions are in degrees unless
//! the name says otherwise. Rotations use `glam::Quat` with the yaw-pitch-roll
//! composition `yaw * pitch * roll` (Y, then X, then Z).

use glam::{EulerRot, Quat};

/// Normalized position of `value` inside `[a, b]`, clamped to [0, 1].
///
/// A degenerate range (`a == b`) yields 0.
pub fn inverse_lerp(a: f32, b: f32, value: f32) -> f32 {
    if a == b {
        return 0.0;
    }
    ((value - a) / (b - a)).clamp(0.0, 1.0)
}

/// Linear interpolation with `t` clamped to [0, 1].
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Map `value` from `[from_min, from_max]` onto `[to_min, to_max]`.
///
/// Values outside the source range clamp to the nearest end of the target
/// range. The source range may be descending (e.g. `0 → -13`).
pub fn map_clamped(value: f32, from_min: f32, from_max: f32, to_min: f32, to_max: f32) -> f32 {
    let t = inverse_lerp(from_min, from_max, value);
    lerp(to_min, to_max, t)
}

/// Bring an angle into (-180, 180].
pub fn normalize_degrees(angle: f32) -> f32 {
    let mut a = angle % 360.0;
    if a > 180.0 {
        a -= 360.0;
    } else if a <= -180.0 {
        a += 360.0;
    }
    a
}

/// Move `current` toward `target` by at most `max_delta`.
pub fn move_towards(current: f32, target: f32, max_delta: f32) -> f32 {
    let diff = target - current;
    if diff.abs() <= max_delta {
        target
    } else {
        current + diff.signum() * max_delta
    }
}

/// Cubic Hermite ease, `t²(3 − 2t)`, with `t` clamped to [0, 1].
pub fn smoothstep(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Rotation from pitch (x), yaw (y) and roll (z) in degrees.
pub fn quat_from_euler_deg(pitch: f32, yaw: f32, roll: f32) -> Quat {
    Quat::from_euler(
        EulerRot::YXZ,
        yaw.to_radians(),
        pitch.to_radians(),
        roll.to_radians(),
    )
}

/// Decompose a rotation into (pitch, yaw) degrees, each in (-180, 180].
pub fn pitch_yaw_deg(rotation: Quat) -> (f32, f32) {
    let (yaw, pitch, _roll) = rotation.to_euler(EulerRot::YXZ);
    (
        normalize_degrees(pitch.to_degrees()),
        normalize_degrees(yaw.to_degrees()),
    )
}

/// Angle between two rotations in degrees.
pub fn angle_between_deg(a: Quat, b: Quat) -> f32 {
    a.angle_between(b).to_degrees()
}

/// Rotate `from` toward `to` by at most `max_degrees`, along the shortest arc.
///
/// Returns `to` exactly once it is within reach.
pub fn rotate_towards(from: Quat, to: Quat, max_degrees: f32) -> Quat {
    let angle = angle_between_deg(from, to);
    if angle <= max_degrees.max(0.0) || angle <= f32::EPSILON {
        return to;
    }
    if max_degrees <= 0.0 {
        return from;
    }
    from.slerp(to, max_degrees / angle).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_clamped_midpoint() {
        assert!((map_clamped(5.0, 0.0, 10.0, 0.0, 100.0) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_map_clamped_below_range() {
        assert_eq!(map_clamped(-5.0, 0.0, 10.0, 0.0, 100.0), 0.0);
    }

    #[test]
    fn test_map_clamped_above_range() {
        assert_eq!(map_clamped(15.0, 0.0, 10.0, 0.0, 100.0), 100.0);
    }

    #[test]
    fn test_map_clamped_descending_source() {
        // 0 → -13 is the "look up" source range
        assert!((map_clamped(-6.5, 0.0, -13.0, 0.0, 100.0) - 50.0).abs() < 1e-3);
        assert_eq!(map_clamped(4.0, 0.0, -13.0, 0.0, 100.0), 0.0);
    }

    #[test]
    fn test_degenerate_range_maps_to_start() {
        assert_eq!(map_clamped(3.0, 2.0, 2.0, 10.0, 20.0), 10.0);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(0.0), 0.0);
        assert_eq!(normalize_degrees(180.0), 180.0);
        assert_eq!(normalize_degrees(350.0), -10.0);
        assert_eq!(normalize_degrees(-180.0), 180.0);
        assert!((normalize_degrees(725.0) - 5.0).abs() < 1e-4);
    }

    #[test]
    fn test_move_towards() {
        assert_eq!(move_towards(0.0, 10.0, 3.0), 3.0);
        assert_eq!(move_towards(10.0, 0.0, 3.0), 7.0);
        assert_eq!(move_towards(9.0, 10.0, 3.0), 10.0);
    }

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert!((smoothstep(0.5) - 0.5).abs() < 1e-6);
        assert_eq!(smoothstep(2.0), 1.0);
    }

    #[test]
    fn test_euler_roundtrip_small_angles() {
        let q = quat_from_euler_deg(-7.0, 12.0, 0.0);
        let (pitch, yaw) = pitch_yaw_deg(q);
        assert!((pitch + 7.0).abs() < 1e-2);
        assert!((yaw - 12.0).abs() < 1e-2);
    }

    #[test]
    fn test_rotate_towards_is_bounded() {
        let from = Quat::IDENTITY;
        let to = quat_from_euler_deg(0.0, 90.0, 0.0);
        let step = rotate_towards(from, to, 10.0);
        assert!((angle_between_deg(from, step) - 10.0).abs() < 0.2);

        let done = rotate_towards(step, to, 500.0);
        assert_eq!(done, to);
    }
}
