// Planar geometry over normalized landmarks

use crate::models::pose::{BodyLandmark, LandmarkSet};

/// Vectors shorter than this are treated as degenerate
pub const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point2) -> Point2 {
        Point2::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(self, other: Point2) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// A point on the body: a detected landmark or one synthesized from a pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyPoint {
    Landmark(BodyLandmark),
    /// Midpoint of a pair; absent unless both sides are present
    Midpoint(BodyLandmark, BodyLandmark),
    /// Midpoint of a pair, or whichever side is present
    Center(BodyLandmark, BodyLandmark),
}

impl BodyPoint {
    pub fn resolve(&self, landmarks: &LandmarkSet) -> Option<Point2> {
        let point = |id: BodyLandmark| landmarks.get(id).map(|l| Point2::new(l.x, l.y));

        match *self {
            BodyPoint::Landmark(id) => point(id),
            BodyPoint::Midpoint(a, b) => Some(point(a)?.midpoint(point(b)?)),
            BodyPoint::Center(a, b) => match (point(a), point(b)) {
                (Some(pa), Some(pb)) => Some(pa.midpoint(pb)),
                (Some(p), None) | (None, Some(p)) => Some(p),
                (None, None) => None,
            },
        }
    }
}

/// Angle in degrees at vertex `b` between `b->a` and `b->c`, in [0, 180].
///
/// Uses atan2(|cross|, dot), which stays well-defined near 0 and 180 degrees.
/// Returns None when either arm is shorter than `EPSILON`.
pub fn angle_at_vertex(a: Point2, b: Point2, c: Point2) -> Option<f64> {
    let (bax, bay) = (a.x - b.x, a.y - b.y);
    let (bcx, bcy) = (c.x - b.x, c.y - b.y);

    if bax.hypot(bay) < EPSILON || bcx.hypot(bcy) < EPSILON {
        return None;
    }

    let cross = bax * bcy - bay * bcx;
    let dot = bax * bcx + bay * bcy;
    let degrees = cross.abs().atan2(dot).to_degrees();

    Some(degrees.clamp(0.0, 180.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::pose::Landmark;

    #[test]
    fn test_right_angle() {
        let angle = angle_at_vertex(
            Point2::new(0.0, 1.0),
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
        )
        .unwrap();
        assert!((angle - 90.0).abs() < 1e-6);
    }

    #[test]
    fn test_straight_and_folded() {
        let straight = angle_at_vertex(
            Point2::new(0.5, 0.2),
            Point2::new(0.5, 0.5),
            Point2::new(0.5, 0.8),
        )
        .unwrap();
        assert!((straight - 180.0).abs() < 1e-9);

        let folded = angle_at_vertex(
            Point2::new(0.5, 0.2),
            Point2::new(0.5, 0.5),
            Point2::new(0.5, 0.3),
        )
        .unwrap();
        assert!(folded.abs() < 1e-9);
    }

    #[test]
    fn test_angle_range_over_many_configurations() {
        let b = Point2::new(0.5, 0.5);
        for i in 0..72 {
            for j in 0..72 {
                let ta = (i as f64) * 5.0_f64.to_radians();
                let tc = (j as f64) * 5.0_f64.to_radians();
                let a = Point2::new(0.5 + 0.3 * ta.cos(), 0.5 + 0.3 * ta.sin());
                let c = Point2::new(0.5 + 0.2 * tc.cos(), 0.5 + 0.2 * tc.sin());
                let angle = angle_at_vertex(a, b, c).unwrap();
                assert!((0.0..=180.0).contains(&angle));
            }
        }
    }

    #[test]
    fn test_degenerate_arm_is_absent() {
        let b = Point2::new(0.3, 0.3);
        assert!(angle_at_vertex(b, b, Point2::new(0.4, 0.4)).is_none());
        assert!(angle_at_vertex(Point2::new(0.3, 0.3000001), b, Point2::new(0.4, 0.4)).is_none());
    }

    #[test]
    fn test_body_point_resolution() {
        let mut set = LandmarkSet::new();
        set.insert(BodyLandmark::LeftShoulder, Landmark::new(0.4, 0.3, 0.9));

        let mid = BodyPoint::Midpoint(BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder);
        let center = BodyPoint::Center(BodyLandmark::LeftShoulder, BodyLandmark::RightShoulder);
        assert!(mid.resolve(&set).is_none());
        assert_eq!(center.resolve(&set), Some(Point2::new(0.4, 0.3)));

        set.insert(BodyLandmark::RightShoulder, Landmark::new(0.6, 0.3, 0.9));
        let resolved = mid.resolve(&set).unwrap();
        assert!((resolved.x - 0.5).abs() < 1e-12);
        assert_eq!(center.resolve(&set), mid.resolve(&set));
    }
}
