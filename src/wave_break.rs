//! # Wave Breaking Depth Model
//!
//! Predicts the water depth at which a wave of a given height breaks, using
//! the Miche criterion: a wave breaks once its height exceeds a fixed
//! fraction of the local depth.
//!
//! ## Baseline
//! ```text
//! depth = H / K        K = 0.78
//! ```
//!
//! ## Angle of Incidence
//! The breaking index is scaled by the cosine of the incidence angle θ
//! between the wave direction and the coast normal, so oblique waves get a
//! smaller index and a greater breaking depth:
//! ```text
//! γ(θ) = K · cos θ
//! depth = H / γ(θ)
//! ```
//! θ is folded into [0°, 90°] first, so only the acute angle between the wave
//! ray and the shore normal matters. A wave travelling parallel to the coast
//! (θ = 90°) has no defined breaking depth and is reported as
//! [`ProfileError::InvalidGeometry`].
//!
//! Every function here is pure and safe to call from any thread.

use crate::ProfileError;

/// Miche breaking index (wave height / water depth at breaking).
pub const MICHE_BREAKING_INDEX: f64 = 0.78;

/// Smallest adjusted breaking index still treated as positive.
///
/// `cos(π/2)` evaluates to ~6e-17 rather than zero, which would otherwise
/// yield a breaking depth in the order of 10^16 m.
const MIN_BREAKING_INDEX: f64 = 1e-9;

/// Breaking depth in metres for a wave of `wave_height` metres.
///
/// # Example
/// ```
/// use beach_profile_lib::wave_break::breaking_depth;
///
/// assert!((breaking_depth(3.9) - 5.0).abs() < 1e-12);
/// ```
pub fn breaking_depth(wave_height: f64) -> f64 {
    wave_height / MICHE_BREAKING_INDEX
}

/// Incidence angle in radians between the wave direction and the coast
/// normal, folded into [0, π/2].
///
/// Both directions are compass bearings in degrees (0 = North).
pub fn incidence_angle(wave_direction_deg: f64, coast_normal_deg: f64) -> f64 {
    let mut theta = (wave_direction_deg - coast_normal_deg).abs() % 360.0;

    // [0°, 180°]
    if theta > 180.0 {
        theta = 360.0 - theta;
    }

    // [0°, 90°], cos(θ) = -cos(180° - θ)
    if theta > 90.0 {
        theta = 180.0 - theta;
    }

    theta.to_radians()
}

/// Breaking depth corrected for the angle of incidence.
///
/// Fails with [`ProfileError::InvalidGeometry`] when the adjusted breaking
/// index is not positive. There is no fallback to [`breaking_depth`].
pub fn breaking_depth_with_angle(
    wave_height: f64,
    wave_direction_deg: f64,
    coast_normal_deg: f64,
) -> Result<f64, ProfileError> {
    let theta = incidence_angle(wave_direction_deg, coast_normal_deg);
    let gamma = MICHE_BREAKING_INDEX * theta.cos();

    if gamma <= MIN_BREAKING_INDEX {
        return Err(ProfileError::InvalidGeometry {
            theta_deg: theta.to_degrees(),
            gamma,
        });
    }

    Ok(wave_height / gamma)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_baseline_matches_miche_ratio() {
        for h in [0.1, 0.5, 1.0, 2.34, 3.9, 10.0] {
            assert!((breaking_depth(h) - h / 0.78).abs() < EPS);
        }
        assert!((breaking_depth(3.9) - 5.0).abs() < EPS);
    }

    #[test]
    fn test_baseline_is_monotonic() {
        let depths: Vec<f64> = (1..50).map(|i| breaking_depth(i as f64 * 0.1)).collect();
        assert!(depths.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_zero_incidence_equals_baseline() {
        let adjusted = breaking_depth_with_angle(2.0, 135.0, 135.0).unwrap();
        assert_eq!(adjusted, breaking_depth(2.0));
    }

    #[test]
    fn test_incidence_angle_wraps_around_north() {
        let a = incidence_angle(350.0, 0.0);
        let b = incidence_angle(10.0, 0.0);
        assert!((a - b).abs() < EPS);
        assert!((a.to_degrees() - 10.0).abs() < EPS);

        // Same difference, directions on the other side of the normal
        let c = incidence_angle(0.0, 350.0);
        assert!((a - c).abs() < EPS);
    }

    #[test]
    fn test_incidence_angle_folds_past_ninety() {
        let theta = incidence_angle(95.0, 0.0);
        assert!((theta.to_degrees() - 85.0).abs() < EPS);

        let theta = incidence_angle(180.0, 0.0);
        assert!(theta.abs() < EPS);

        let theta = incidence_angle(720.0 + 30.0, 0.0);
        assert!((theta.to_degrees() - 30.0).abs() < EPS);
    }

    #[test]
    fn test_oblique_wave_breaks_deeper_than_normal_wave() {
        let normal = breaking_depth_with_angle(1.5, 90.0, 90.0).unwrap();
        let oblique = breaking_depth_with_angle(1.5, 150.0, 90.0).unwrap();
        assert!(oblique > normal);
        // cos(60°) = 0.5 doubles the depth
        assert!((oblique - 2.0 * normal).abs() < 1e-9);
    }

    #[test]
    fn test_parallel_wave_is_invalid_geometry() {
        let err = breaking_depth_with_angle(1.0, 90.0, 0.0).unwrap_err();
        match err {
            ProfileError::InvalidGeometry { theta_deg, gamma } => {
                assert!((theta_deg - 90.0).abs() < EPS);
                assert!(gamma <= MIN_BREAKING_INDEX);
            }
            other => panic!("expected InvalidGeometry, got {other:?}"),
        }

        assert!(breaking_depth_with_angle(1.0, 270.0, 0.0).is_err());
    }
}
