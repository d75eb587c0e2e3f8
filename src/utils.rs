use glam::{Quat, Vec3};
use std::f32::consts::{PI, TAU};

/// Wrap an angle in radians into (-PI, PI]
pub fn wrap_angle(angle: f32) -> f32 {
    let mut wrapped = angle.rem_euclid(TAU);
    if wrapped > PI {
        wrapped -= TAU;
    }
    wrapped
}

/// Unit vector on the XZ plane for a yaw angle (rotation about +Y, 0 faces +Z)
pub fn heading_vector(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Yaw angle of an XZ direction, inverse of `heading_vector`
pub fn yaw_of_direction(dir: Vec3) -> f32 {
    dir.x.atan2(dir.z)
}

/// Yaw of an orientation quaternion, measured from its forward (+Z) axis
pub fn yaw_of(orientation: Quat) -> f32 {
    yaw_of_direction(orientation * Vec3::Z)
}

/// Signed angle on the XZ plane turning `from` onto `to`.
/// The magnitude comes from the dot product; the sign from the Y component of
/// the cross product (positive turns counter-clockwise seen from above).
pub fn signed_angle_xz(from: Vec3, to: Vec3) -> f32 {
    let a = Vec3::new(from.x, 0.0, from.z).normalize_or_zero();
    let b = Vec3::new(to.x, 0.0, to.z).normalize_or_zero();
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return 0.0;
    }
    let angle = a.dot(b).clamp(-1.0, 1.0).acos();
    if a.cross(b).y < 0.0 { -angle } else { angle }
}

/// Step `current` towards `target` by at most `max_step` radians, taking the
/// short way round. Snaps onto the target once within `tolerance`.
/// Returns the new angle and whether it has converged.
pub fn rotate_towards(current: f32, target: f32, max_step: f32, tolerance: f32) -> (f32, bool) {
    let diff = wrap_angle(target - current);
    if diff.abs() <= tolerance {
        return (wrap_angle(target), true);
    }
    let step = diff.clamp(-max_step, max_step);
    let next = wrap_angle(current + step);
    let converged = wrap_angle(target - next).abs() <= tolerance;
    if converged {
        (wrap_angle(target), true)
    } else {
        (next, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn test_wrap_angle() {
        assert_approx_eq!(wrap_angle(0.0), 0.0);
        assert_approx_eq!(wrap_angle(TAU + 0.5), 0.5);
        assert_approx_eq!(wrap_angle(-PI - 0.5), PI - 0.5);
        assert_approx_eq!(wrap_angle(PI), PI);
    }

    #[test]
    fn test_heading_round_trip() {
        let yaw = 1.2;
        assert_approx_eq!(yaw_of_direction(heading_vector(yaw)), yaw);
        assert_approx_eq!(yaw_of(Quat::from_rotation_y(yaw)), yaw, 1e-5);
    }

    #[test]
    fn test_signed_angle_sign_follows_cross_product() {
        // +Z onto +X is a positive rotation about +Y
        assert_approx_eq!(signed_angle_xz(Vec3::Z, Vec3::X), PI / 2.0, 1e-5);
        assert_approx_eq!(signed_angle_xz(Vec3::Z, -Vec3::X), -PI / 2.0, 1e-5);
        assert_approx_eq!(signed_angle_xz(Vec3::Z, Vec3::Z), 0.0, 1e-5);
        // Degenerate input
        assert_approx_eq!(signed_angle_xz(Vec3::ZERO, Vec3::X), 0.0);
    }

    #[test]
    fn test_rotate_towards_steps_then_snaps() {
        let (angle, done) = rotate_towards(0.0, 1.0, 0.3, 0.1);
        assert_approx_eq!(angle, 0.3);
        assert!(!done);

        let (angle, done) = rotate_towards(0.85, 1.0, 0.3, 0.1);
        assert_approx_eq!(angle, 1.0);
        assert!(done);
    }

    #[test]
    fn test_rotate_towards_takes_short_way() {
        // From just below PI to just above -PI should step forward across the seam
        let (angle, _) = rotate_towards(PI - 0.2, -PI + 0.2, 0.1, 0.01);
        assert_approx_eq!(angle, PI - 0.1, 1e-5);
    }
}
