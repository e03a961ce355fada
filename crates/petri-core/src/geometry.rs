//! Exact intersection and projection routines.
//!
//! Degenerate input (zero-length segments, parallel lines, disjoint or nested circles)
//! yields an empty result rather than an error.

use crate::Vector2;
use std::f64::consts::TAU;

/// Intersections of the segment `start..end` with a circle, ordered by position along the segment.
#[must_use]
pub fn line_circle_intersections(
    center: Vector2,
    radius: f64,
    start: Vector2,
    end: Vector2,
) -> Vec<Vector2> {
    let direction = end - start;
    let offset = start - center;
    let b = -2.0 * direction.dot(offset);
    let c = 2.0 * direction.dot(direction);
    if c == 0.0 {
        return Vec::new();
    }
    let d = (b * b - 2.0 * c * (offset.dot(offset) - radius * radius)).sqrt();
    if d.is_nan() {
        return Vec::new();
    }

    [(b - d) / c, (b + d) / c]
        .into_iter()
        .filter(|t| (0.0..=1.0).contains(t))
        .map(|t| start + direction * t)
        .collect()
}

/// The two boundary crossing points of two circles.
///
/// Empty when the circles are apart, concentric, or one lies strictly inside the other.
#[must_use]
pub fn circle_circle_intersections(
    center1: Vector2,
    radius1: f64,
    center2: Vector2,
    radius2: f64,
) -> Vec<Vector2> {
    let distance = center1.distance(center2);
    if distance > radius1 + radius2 {
        return Vec::new();
    }

    let distance_sq = distance * distance;
    let radii_diff = radius1 * radius1 - radius2 * radius2;
    let along = center1.midpoint(center2) + (center2 - center1) * (radii_diff / (2.0 * distance_sq));
    let spread = 0.5
        * (2.0 * (radius1 * radius1 + radius2 * radius2) / distance_sq
            - radii_diff * radii_diff / (distance_sq * distance_sq)
            - 1.0)
            .sqrt();
    let across = Vector2::new(center2.y - center1.y, center1.x - center2.x) * spread;

    if !along.is_finite() || !across.is_finite() {
        return Vec::new();
    }
    vec![along + across, along - across]
}

/// Intersection point of two segments, or `None` when they are parallel or do not meet.
#[must_use]
pub fn lines_intersection(
    line_a: (Vector2, Vector2),
    line_b: (Vector2, Vector2),
) -> Option<Vector2> {
    let slope_a = (line_a.1.y - line_a.0.y) / (line_a.1.x - line_a.0.x);
    let slope_b = (line_b.1.y - line_b.0.y) / (line_b.1.x - line_b.0.x);

    if slope_a.is_nan()
        || slope_b.is_nan()
        || (slope_a.is_infinite() && slope_b.is_infinite())
        || slope_a == slope_b
    {
        return None;
    }
    if slope_a.is_infinite() {
        return vertical_line_intersection(line_a, line_b);
    }
    if slope_b.is_infinite() {
        return vertical_line_intersection(line_b, line_a);
    }

    let offset_a = line_a.0.y - slope_a * line_a.0.x;
    let offset_b = line_b.0.y - slope_b * line_b.0.x;
    let x = (offset_b - offset_a) / (slope_a - slope_b);
    let intersection = Vector2::new(x, slope_a * x + offset_a);

    (within_span(intersection, line_a) && within_span(intersection, line_b)).then_some(intersection)
}

fn within_span(point: Vector2, line: (Vector2, Vector2)) -> bool {
    let middle = line.0.midpoint(line.1);
    let half_width = (line.0.x - line.1.x).abs() / 2.0;
    let half_height = (line.0.y - line.1.y).abs() / 2.0;
    (point.x - middle.x).abs() <= half_width && (point.y - middle.y).abs() <= half_height
}

fn vertical_line_intersection(
    vertical: (Vector2, Vector2),
    other: (Vector2, Vector2),
) -> Option<Vector2> {
    if other.0.x == other.1.x {
        return None;
    }
    let slope = (other.1.y - other.0.y) / (other.1.x - other.0.x);
    let offset = other.0.y - slope * other.0.x;
    let x = vertical.0.x;
    let intersection = Vector2::new(x, slope * x + offset);

    if (other.0.x < x && other.1.x < x) || (other.0.x > x && other.1.x > x) {
        return None;
    }
    let middle_y = (vertical.0.y + vertical.1.y) / 2.0;
    let half_height = (vertical.0.y - vertical.1.y).abs() / 2.0;
    ((intersection.y - middle_y).abs() <= half_height).then_some(intersection)
}

/// Perpendicular projection of `point` onto the infinite line through `line`.
#[must_use]
pub fn project_point_onto_line(point: Vector2, line: (Vector2, Vector2)) -> Vector2 {
    let (a, b) = line;
    if a.x == b.x {
        return Vector2::new(a.x, point.y);
    }
    let along = a.to(b);
    along * (a.to(point).dot(along) / along.dot(along)) + a
}

/// Returns true when the segment touches or lies inside the circle.
#[must_use]
pub fn segment_overlaps_circle(center: Vector2, radius: f64, start: Vector2, end: Vector2) -> bool {
    start.distance(center) <= radius
        || end.distance(center) <= radius
        || !line_circle_intersections(center, radius, start, end).is_empty()
}

/// `min(max(value, min), max)`; never panics on crossed bounds.
#[must_use]
pub fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Normalise an angle into `[0, 2π)`.
#[must_use]
pub fn wrap_unsigned_angle(angle: f64) -> f64 {
    if !angle.is_finite() {
        return 0.0;
    }
    let wrapped = angle.rem_euclid(TAU);
    if wrapped >= TAU { 0.0 } else { wrapped }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx_eq(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    fn v(x: f64, y: f64) -> Vector2 {
        Vector2::new(x, y)
    }

    #[test]
    fn segment_through_circle_hits_twice_in_order() {
        let hits = line_circle_intersections(v(0.0, 0.0), 5.0, v(-10.0, 0.0), v(10.0, 0.0));
        assert_eq!(hits.len(), 2);
        assert!(approx_eq(hits[0].x, -5.0, 1e-9));
        assert!(approx_eq(hits[1].x, 5.0, 1e-9));

        let reversed = line_circle_intersections(v(0.0, 0.0), 5.0, v(10.0, 0.0), v(-10.0, 0.0));
        assert!(approx_eq(reversed[0].x, 5.0, 1e-9));
    }

    #[test]
    fn segment_ending_inside_circle_hits_once() {
        let hits = line_circle_intersections(v(0.0, 0.0), 5.0, v(-10.0, 0.0), v(0.0, 0.0));
        assert_eq!(hits.len(), 1);
        assert!(approx_eq(hits[0].x, -5.0, 1e-9));
    }

    #[test]
    fn missing_and_degenerate_segments_are_empty() {
        assert!(line_circle_intersections(v(0.0, 0.0), 1.0, v(-5.0, 3.0), v(5.0, 3.0)).is_empty());
        assert!(line_circle_intersections(v(0.0, 0.0), 1.0, v(0.5, 0.0), v(0.5, 0.0)).is_empty());
        // Fully inside: the boundary is never crossed.
        assert!(line_circle_intersections(v(0.0, 0.0), 10.0, v(-1.0, 0.0), v(1.0, 0.0)).is_empty());
        assert!(segment_overlaps_circle(v(0.0, 0.0), 10.0, v(-1.0, 0.0), v(1.0, 0.0)));
    }

    #[test]
    fn overlapping_circles_cross_at_two_points() {
        let hits = circle_circle_intersections(v(0.0, 0.0), 5.0, v(8.0, 0.0), 5.0);
        assert_eq!(hits.len(), 2);
        for hit in &hits {
            assert!(approx_eq(hit.x, 4.0, 1e-9));
            assert!(approx_eq(hit.y.abs(), 3.0, 1e-9));
            assert!(approx_eq(hit.distance(v(0.0, 0.0)), 5.0, 1e-9));
        }
    }

    #[test]
    fn separated_nested_and_concentric_circles_are_empty() {
        assert!(circle_circle_intersections(v(0.0, 0.0), 1.0, v(10.0, 0.0), 1.0).is_empty());
        assert!(circle_circle_intersections(v(0.0, 0.0), 10.0, v(1.0, 0.0), 2.0).is_empty());
        assert!(circle_circle_intersections(v(0.0, 0.0), 3.0, v(0.0, 0.0), 3.0).is_empty());
    }

    #[test]
    fn crossing_segments_intersect() {
        let hit = lines_intersection((v(0.0, 0.0), v(10.0, 10.0)), (v(0.0, 10.0), v(10.0, 0.0)))
            .expect("intersection");
        assert!(approx_eq(hit.x, 5.0, 1e-9));
        assert!(approx_eq(hit.y, 5.0, 1e-9));
    }

    #[test]
    fn vertical_segments_use_the_special_case() {
        let hit = lines_intersection((v(3.0, -5.0), v(3.0, 5.0)), (v(0.0, 1.0), v(6.0, 1.0)))
            .expect("intersection");
        assert!(approx_eq(hit.x, 3.0, 1e-12));
        assert!(approx_eq(hit.y, 1.0, 1e-12));

        let swapped = lines_intersection((v(0.0, 1.0), v(6.0, 1.0)), (v(3.0, -5.0), v(3.0, 5.0)));
        assert_eq!(swapped, Some(hit));

        assert!(lines_intersection((v(3.0, 2.0), v(3.0, 5.0)), (v(0.0, 1.0), v(6.0, 1.0))).is_none());
    }

    #[test]
    fn parallel_and_disjoint_segments_do_not_intersect() {
        assert!(lines_intersection((v(0.0, 0.0), v(1.0, 1.0)), (v(0.0, 1.0), v(1.0, 2.0))).is_none());
        assert!(lines_intersection((v(0.0, 0.0), v(0.0, 1.0)), (v(1.0, 0.0), v(1.0, 1.0))).is_none());
        assert!(lines_intersection((v(0.0, 0.0), v(1.0, 1.0)), (v(5.0, 0.0), v(6.0, -1.0))).is_none());
    }

    #[test]
    fn projection_lands_on_the_line() {
        let projected = project_point_onto_line(v(2.0, 5.0), (v(0.0, 0.0), v(10.0, 0.0)));
        assert_eq!(projected, v(2.0, 0.0));
        let vertical = project_point_onto_line(v(7.0, 3.0), (v(1.0, 0.0), v(1.0, 10.0)));
        assert_eq!(vertical, v(1.0, 3.0));
        let diagonal = project_point_onto_line(v(0.0, 2.0), (v(0.0, 0.0), v(2.0, 2.0)));
        assert!(approx_eq(diagonal.x, 1.0, 1e-12));
        assert!(approx_eq(diagonal.y, 1.0, 1e-12));
    }

    #[test]
    fn clamp_tolerates_crossed_bounds() {
        assert_eq!(clamp(5.0, 0.0, 1.0), 1.0);
        assert_eq!(clamp(-5.0, 0.0, 1.0), 0.0);
        assert_eq!(clamp(0.5, 1.0, 0.0), 0.0);
    }

    #[test]
    fn angles_wrap_into_one_turn() {
        assert!(approx_eq(wrap_unsigned_angle(-std::f64::consts::FRAC_PI_2), 1.5 * std::f64::consts::PI, 1e-12));
        assert!(approx_eq(wrap_unsigned_angle(3.0 * TAU + 0.25), 0.25, 1e-9));
        assert_eq!(wrap_unsigned_angle(f64::NAN), 0.0);
    }
}
