//! Source-to-PMX coordinate conversion.
//!
//! The source engine is left-handed Y-up; PMX wants the X and Z axes
//! negated. Positions are additionally scaled by [`SCALE_FACTOR`] in source
//! world space before the flip so that one source unit maps to the size MMD
//! tools expect. Note the axis negation reverses apparent triangle winding;
//! face order is deliberately left untouched downstream.

use glam::Vec3;

/// Uniform scale applied to positions (not directions) before axis flip.
pub const SCALE_FACTOR: f32 = 8.0;

/// Map a source-space vector or direction into PMX space.
///
/// Self-inverse: applying it twice yields the input.
pub fn to_pmx_space(v: Vec3) -> Vec3 {
    Vec3::new(-v.x, v.y, -v.z)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negates_x_and_z() {
        let v = to_pmx_space(Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(v, Vec3::new(-1.0, 2.0, -3.0));
    }

    #[test]
    fn involution() {
        let v = Vec3::new(-4.5, 0.25, 12.0);
        assert_eq!(to_pmx_space(to_pmx_space(v)), v);
    }
}
