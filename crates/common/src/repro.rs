//! Transcendental functions for simulation code.
//!
//! `f32::sin`, `f32::powf` and friends lower to the platform libm, whose
//! last-bit results differ between targets. Everything here runs the same
//! pure-Rust routines on every machine, so simulation state stays
//! bit-identical across hosts. Presentation code may keep using `f32`
//! methods.

use glam::Vec2;

/// `(sin, cos)` of an angle in radians.
pub fn sin_cos(radians: f32) -> (f32, f32) {
    libm::sincosf(radians)
}

/// Angle of `(x, y)` from the positive x axis, in radians.
pub fn atan2(y: f32, x: f32) -> f32 {
    libm::atan2f(y, x)
}

pub fn powf(base: f32, exponent: f32) -> f32 {
    libm::powf(base, exponent)
}

/// Unit vector at `radians`, a reproducible `Vec2::from_angle`.
pub fn unit_vector(radians: f32) -> Vec2 {
    let (sin, cos) = sin_cos(radians);
    Vec2::new(cos, sin)
}

/// Angle of `v` in degrees.
pub fn heading_degrees(v: Vec2) -> f32 {
    atan2(v.y, v.x).to_degrees()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn unit_vector_matches_axes() {
        assert!((unit_vector(0.0) - Vec2::X).length() < 1e-6);
        assert!((unit_vector(FRAC_PI_2) - Vec2::Y).length() < 1e-6);
        assert!((unit_vector(PI) + Vec2::X).length() < 1e-6);
    }

    #[test]
    fn heading_inverts_unit_vector() {
        for degrees in [-135.0_f32, -30.0, 0.0, 45.0, 90.0, 170.0] {
            let heading = heading_degrees(unit_vector(degrees.to_radians()));
            assert!((heading - degrees).abs() < 1e-3, "{degrees} -> {heading}");
        }
    }

    #[test]
    fn powf_agrees_with_std_on_simple_cases() {
        assert_eq!(powf(2.0, 3.0), 8.0);
        assert_eq!(powf(0.5, 0.0), 1.0);
        assert!((powf(0.9, 0.5) - 0.9_f32.sqrt()).abs() < 1e-6);
    }
}
