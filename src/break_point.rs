//! # Break Point Location
//!
//! Scans a transect against a breaking depth and reports where the wave is
//! predicted to break.
//!
//! Every sample whose depth is at or below the breaking depth replaces the
//! previous candidate, so the reported point is the **last** qualifying sample
//! in sampling order rather than the first crossing. Rendered plots and
//! stored artifacts depend on this choice.
//!
//! The result is always one of the surveyed samples; nothing is interpolated
//! between them.

use crate::{BreakPoint, Coordinate};

/// Last sample with `depth <= breaking_depth`, or `None` when the wave does
/// not break inside the surveyed domain.
///
/// # Example
/// ```
/// use beach_profile_lib::{break_point::locate, Coordinate};
///
/// let samples: Vec<Coordinate> = [10.0, 8.0, 3.0, 9.0, 2.0]
///     .iter()
///     .enumerate()
///     .map(|(i, &depth)| Coordinate { x: i as f64, depth })
///     .collect();
///
/// let point = locate(&samples, 5.0).unwrap();
/// assert_eq!(point.depth, 2.0);
/// ```
pub fn locate(coordinates: &[Coordinate], breaking_depth: f64) -> Option<BreakPoint> {
    let mut candidate = None;
    for sample in coordinates {
        if sample.depth <= breaking_depth {
            candidate = Some(*sample);
        }
    }
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(depths: &[f64]) -> Vec<Coordinate> {
        depths
            .iter()
            .enumerate()
            .map(|(i, &depth)| Coordinate {
                x: i as f64 * 5.0,
                depth,
            })
            .collect()
    }

    #[test]
    fn test_returns_last_qualifying_sample_not_first() {
        let samples = profile(&[10.0, 8.0, 3.0, 9.0, 2.0]);
        let point = locate(&samples, 5.0).unwrap();
        assert_eq!(point, Coordinate { x: 20.0, depth: 2.0 });
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let samples = profile(&[9.0, 5.0, 7.0]);
        let point = locate(&samples, 5.0).unwrap();
        assert_eq!(point, Coordinate { x: 5.0, depth: 5.0 });
    }

    #[test]
    fn test_none_when_profile_never_reaches_breaking_depth() {
        let samples = profile(&[12.0, 9.0, 6.5]);
        assert_eq!(locate(&samples, 5.0), None);
        assert_eq!(locate(&[], 5.0), None);
    }

    #[test]
    fn test_negative_depths_count_as_shallow() {
        // Points above the datum (dry beach) qualify as well
        let samples = profile(&[-1.5, 0.0, 2.0, 6.0]);
        let point = locate(&samples, 3.0).unwrap();
        assert_eq!(point, Coordinate { x: 10.0, depth: 2.0 });
    }
}
