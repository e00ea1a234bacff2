//! Angle helpers

use std::f64::consts::PI;

/// Wrap an angle to `[-PI, PI)`.
///
/// Uses a floored modulo so the result is the shortest signed rotation.
pub fn wrap_angle(angle: f64) -> f64 {
    (angle + PI).rem_euclid(2.0 * PI) - PI
}

/// Shortest signed rotation from `current` to `target` (radians)
pub fn heading_delta(target: f64, current: f64) -> f64 {
    wrap_angle(target - current)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrap_angle_identity_inside_range() {
        assert!((wrap_angle(0.5) - 0.5).abs() < 1e-12);
        assert!((wrap_angle(-0.5) + 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_wrap_angle_folds_large_angles() {
        assert!((wrap_angle(3.0 * PI) + PI).abs() < 1e-9);
        assert!((wrap_angle(2.0 * PI + 0.25) - 0.25).abs() < 1e-9);
        assert!((wrap_angle(-2.0 * PI - 0.25) + 0.25).abs() < 1e-9);
    }

    #[test]
    fn test_heading_delta_stays_in_range() {
        let mut target = -720.0_f64;
        while target <= 720.0 {
            let mut current = -720.0_f64;
            while current <= 720.0 {
                let delta = heading_delta(target.to_radians(), current.to_radians());
                assert!(delta >= -PI && delta <= PI, "delta {} out of range", delta);
                current += 17.5;
            }
            target += 13.0;
        }
    }

    #[test]
    fn test_heading_delta_takes_short_way() {
        // 170 deg to -170 deg is a 20 deg counter-clockwise turn
        let delta = heading_delta((-170.0_f64).to_radians(), 170.0_f64.to_radians());
        assert!((delta - 20.0_f64.to_radians()).abs() < 1e-9);
    }
}
