//! Steering primitives.
//!
//! Stateless vector helpers shared by the follower and enemy behaviour
//! blends. Every helper that could divide by a zero length returns `None`
//! instead of producing `NaN`, and helpers that need at least one candidate
//! return [`SteeringError::NoCandidates`] for an empty slice.
use glam::Vec2;
use thiserror::Error;

use crate::NORMALISE_EPSILON;

/// Precondition failures reported by the steering primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SteeringError {
    /// A helper that selects among candidates received an empty slice.
    #[error("steering helper called with no candidates")]
    NoCandidates,
}

/// Returns the length of the offset `delta`.
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use sheepdog::vector_math::distance;
/// assert!((distance(Vec2::new(3.0, 4.0)) - 5.0).abs() < f32::EPSILON);
/// ```
#[must_use]
pub fn distance(delta: Vec2) -> f32 {
    delta.length()
}

/// Returns the unit vector along `delta`.
///
/// Returns `None` when the vector is not finite or shorter than
/// [`NORMALISE_EPSILON`].
///
/// # Examples
/// ```
/// use glam::Vec2;
/// use sheepdog::vector_math::normalize;
/// let unit = normalize(Vec2::new(0.0, -2.0)).unwrap_or(Vec2::ZERO);
/// assert_eq!(unit, Vec2::new(0.0, -1.0));
/// assert_eq!(normalize(Vec2::ZERO), None);
/// ```
#[must_use]
pub fn normalize(delta: Vec2) -> Option<Vec2> {
    if !delta.is_finite() {
        return None;
    }
    let length = delta.length();
    if length < NORMALISE_EPSILON {
        return None;
    }
    Some(delta / length)
}

/// Unit vector from `origin` toward the centroid of `points`.
///
/// The offset to each point is averaged before normalising. `Ok(None)` means
/// the centroid coincides with `origin`.
///
/// # Errors
/// Returns [`SteeringError::NoCandidates`] when `points` is empty.
pub fn toward_centroid(points: &[Vec2], origin: Vec2) -> Result<Option<Vec2>, SteeringError> {
    if points.is_empty() {
        return Err(SteeringError::NoCandidates);
    }
    let sum: Vec2 = points.iter().map(|&p| p - origin).sum();
    #[expect(
        clippy::cast_precision_loss,
        reason = "Neighbour counts are far below f32's exact integer range."
    )]
    let count = points.len() as f32;
    Ok(normalize(sum / count))
}

/// Inverse-square repulsion from every point within `radius` of `origin`.
///
/// Each qualifying point contributes `(origin - p) / d²`; the contributions
/// are averaged and normalised. Points beyond `radius` and points coinciding
/// with `origin` are skipped. Returns `None` when nothing qualifies, which
/// callers treat as "behaviour inactive this tick".
#[must_use]
pub fn avoid_many(points: &[Vec2], origin: Vec2, radius: f32) -> Option<Vec2> {
    let mut total = Vec2::ZERO;
    let mut count = 0_u32;

    for &point in points {
        let away = origin - point;
        let d = away.length();
        if d > radius || d < NORMALISE_EPSILON {
            continue;
        }
        total += away / (d * d);
        count += 1;
    }

    if count == 0 {
        return None;
    }
    #[expect(
        clippy::cast_precision_loss,
        reason = "Neighbour counts are far below f32's exact integer range."
    )]
    let averaged = total / count as f32;
    normalize(averaged)
}

/// Unit repulsion from a single `point` when it lies within `radius`.
#[must_use]
pub fn avoid_one(point: Vec2, origin: Vec2, radius: f32) -> Option<Vec2> {
    let away = origin - point;
    if away.length() > radius {
        return None;
    }
    normalize(away)
}

/// Index of and distance to the point closest to `origin`.
///
/// Ties keep the first point encountered.
///
/// # Errors
/// Returns [`SteeringError::NoCandidates`] when `points` is empty.
pub fn closest(points: &[Vec2], origin: Vec2) -> Result<(usize, f32), SteeringError> {
    points
        .iter()
        .map(|&p| p.distance(origin))
        .enumerate()
        .fold(None, |best: Option<(usize, f32)>, (index, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((index, d)),
        })
        .ok_or(SteeringError::NoCandidates)
}

/// Unit repulsion from the point closest to `origin`.
///
/// No radius filter is applied; callers pre-filter `points`. `Ok(None)`
/// means the closest point coincides with `origin`.
///
/// # Errors
/// Returns [`SteeringError::NoCandidates`] when `points` is empty.
pub fn avoid_nearest(points: &[Vec2], origin: Vec2) -> Result<Option<Vec2>, SteeringError> {
    let (index, _) = closest(points, origin)?;
    Ok(points.get(index).and_then(|&p| normalize(origin - p)))
}

/// Unit attraction toward the point closest to `origin`.
///
/// Mirror image of [`avoid_nearest`].
///
/// # Errors
/// Returns [`SteeringError::NoCandidates`] when `points` is empty.
pub fn seek_nearest(points: &[Vec2], origin: Vec2) -> Result<Option<Vec2>, SteeringError> {
    let (index, _) = closest(points, origin)?;
    Ok(points.get(index).and_then(|&p| normalize(p - origin)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[rstest]
    #[case::axis(Vec2::new(4.0, 0.0), Vec2::X)]
    #[case::negative(Vec2::new(0.0, -0.5), Vec2::NEG_Y)]
    fn normalize_produces_unit_vectors(#[case] input: Vec2, #[case] expected: Vec2) {
        let unit = normalize(input).unwrap_or(Vec2::ZERO);
        assert_relative_eq!(unit.x, expected.x);
        assert_relative_eq!(unit.y, expected.y);
    }

    #[rstest]
    #[case::zero(Vec2::ZERO)]
    #[case::tiny(Vec2::splat(1e-9))]
    #[case::nan(Vec2::new(f32::NAN, 1.0))]
    #[case::infinite(Vec2::new(f32::INFINITY, 0.0))]
    fn normalize_rejects_degenerate_input(#[case] input: Vec2) {
        assert_eq!(normalize(input), None);
    }

    #[test]
    fn centroid_points_toward_average_offset() {
        let points = [Vec2::new(10.0, 0.0), Vec2::new(10.0, 10.0)];
        let unit = toward_centroid(&points, Vec2::ZERO)
            .ok()
            .flatten()
            .unwrap_or(Vec2::ZERO);
        assert_relative_eq!(unit.x, 2.0 / 5.0_f32.sqrt(), epsilon = 1e-6);
        assert_relative_eq!(unit.y, 1.0 / 5.0_f32.sqrt(), epsilon = 1e-6);
    }

    #[test]
    fn centroid_of_nothing_is_an_error() {
        assert_eq!(
            toward_centroid(&[], Vec2::ZERO),
            Err(SteeringError::NoCandidates)
        );
    }

    #[test]
    fn centroid_at_origin_has_no_direction() {
        let points = [Vec2::new(-1.0, 0.0), Vec2::new(1.0, 0.0)];
        assert_eq!(toward_centroid(&points, Vec2::ZERO), Ok(None));
    }

    #[test]
    fn avoid_many_pushes_away_from_closer_points_harder() {
        // The point at distance 1 outweighs the one at distance 4.
        let points = [Vec2::new(1.0, 0.0), Vec2::new(-4.0, 0.0)];
        let away = avoid_many(&points, Vec2::ZERO, 10.0).unwrap_or(Vec2::ZERO);
        assert_relative_eq!(away.x, -1.0);
        assert_relative_eq!(away.y, 0.0);
    }

    #[test]
    fn avoid_many_averages_both_axes() {
        let points = [Vec2::new(-1.0, 0.0), Vec2::new(0.0, -1.0)];
        let away = avoid_many(&points, Vec2::ZERO, 10.0).unwrap_or(Vec2::ZERO);
        assert_relative_eq!(away.x, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
        assert_relative_eq!(away.y, std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-6);
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::out_of_range(&[Vec2::new(50.0, 0.0)])]
    #[case::coincident(&[Vec2::ZERO])]
    fn avoid_many_is_inactive_without_qualifying_points(#[case] points: &[Vec2]) {
        assert_eq!(avoid_many(points, Vec2::ZERO, 10.0), None);
    }

    #[test]
    fn avoid_one_respects_radius() {
        assert_eq!(avoid_one(Vec2::new(5.0, 0.0), Vec2::ZERO, 4.0), None);
        assert_eq!(
            avoid_one(Vec2::new(3.0, 0.0), Vec2::ZERO, 4.0),
            Some(Vec2::NEG_X)
        );
    }

    #[test]
    fn nearest_helpers_pick_the_closest_point() {
        let points = [Vec2::new(0.0, 9.0), Vec2::new(2.0, 0.0), Vec2::new(-3.0, 0.0)];
        assert_eq!(closest(&points, Vec2::ZERO), Ok((1, 2.0)));
        assert_eq!(avoid_nearest(&points, Vec2::ZERO), Ok(Some(Vec2::NEG_X)));
        assert_eq!(seek_nearest(&points, Vec2::ZERO), Ok(Some(Vec2::X)));
    }

    #[test]
    fn closest_breaks_ties_by_order() {
        let points = [Vec2::new(0.0, 2.0), Vec2::new(2.0, 0.0)];
        assert_eq!(closest(&points, Vec2::ZERO), Ok((0, 2.0)));
    }

    #[test]
    fn nearest_helpers_reject_empty_input() {
        assert_eq!(
            avoid_nearest(&[], Vec2::ZERO),
            Err(SteeringError::NoCandidates)
        );
        assert_eq!(
            seek_nearest(&[], Vec2::ZERO),
            Err(SteeringError::NoCandidates)
        );
    }
}
