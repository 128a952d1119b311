use crate::telemetry::GeoPoint;

/// Radius of the simulated home body, m.
pub const KERBIN_RADIUS: f64 = 600_000.0;

// ---------------------------------------------------------------------------
// Great-circle navigation on a sphere
// ---------------------------------------------------------------------------

/// Haversine surface distance between two points on the default body (m).
pub fn distance(a: GeoPoint, b: GeoPoint) -> f64 {
    distance_on(a, b, KERBIN_RADIUS)
}

/// Haversine surface distance on a sphere of the given radius (m).
///
/// Symmetric, zero for coincident points and never larger than `pi * radius`.
pub fn distance_on(a: GeoPoint, b: GeoPoint, radius: f64) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push h a hair outside [0, 1] for antipodal points.
    let h = h.clamp(0.0, 1.0);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    radius * c
}

/// Initial great-circle bearing from `from` to `to`, degrees in [0, 360).
/// 0 = north, 90 = east. Coincident points give 0 (atan2(0, 0)).
pub fn bearing(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.latitude.to_radians();
    let lat2 = to.latitude.to_radians();
    let dlon = (to.longitude - from.longitude).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();
    let theta = y.atan2(x).to_degrees();

    ((theta % 360.0) + 360.0) % 360.0
}

/// Clamp `value` into `[lo, hi]`. Callers guarantee `lo <= hi`.
pub fn clip(lo: f64, value: f64, hi: f64) -> f64 {
    lo.max(value.min(hi))
}

/// Smallest absolute difference between two compass headings, degrees in [0, 180].
pub fn angle_between_headings(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rstest::rstest;
    use std::f64::consts::PI;

    fn p(latitude: f64, longitude: f64) -> GeoPoint {
        GeoPoint::new(latitude, longitude)
    }

    #[rstest]
    #[case(p(0.0, 0.0), p(0.0, 90.0))]
    #[case(p(-0.0485, -74.713), p(-0.0461, -73.757))]
    #[case(p(45.0, 10.0), p(-30.0, -120.0))]
    #[case(p(89.9, 0.0), p(-89.9, 180.0))]
    #[case(p(0.0, 0.0), p(0.0, 180.0))]
    fn distance_is_symmetric_and_bounded(#[case] a: GeoPoint, #[case] b: GeoPoint) {
        let ab = distance(a, b);
        let ba = distance(b, a);
        assert_abs_diff_eq!(ab, ba, epsilon = 1e-6);
        assert!(ab <= PI * KERBIN_RADIUS + 1e-6, "distance {ab} exceeds half circumference");
        assert_abs_diff_eq!(distance(a, a), 0.0);
    }

    #[test]
    fn quarter_circumference_along_equator() {
        let d = distance(p(0.0, 0.0), p(0.0, 90.0));
        assert_abs_diff_eq!(d, PI / 2.0 * KERBIN_RADIUS, epsilon = 1e-6);
    }

    #[test]
    fn distance_uses_given_radius() {
        let d = distance_on(p(0.0, 0.0), p(0.0, 180.0), 1.0);
        assert_abs_diff_eq!(d, PI, epsilon = 1e-9);
    }

    #[rstest]
    #[case(p(0.0, 0.0), p(1.0, 0.0), 0.0)]
    #[case(p(0.0, 0.0), p(0.0, 1.0), 90.0)]
    #[case(p(0.0, 0.0), p(-1.0, 0.0), 180.0)]
    #[case(p(0.0, 0.0), p(0.0, -1.0), 270.0)]
    fn cardinal_bearings(#[case] from: GeoPoint, #[case] to: GeoPoint, #[case] expected: f64) {
        assert_abs_diff_eq!(bearing(from, to), expected, epsilon = 1e-9);
    }

    #[rstest]
    #[case(p(10.0, 20.0), p(-40.0, 170.0))]
    #[case(p(-0.0485, -74.713), p(-0.0489, -74.617))]
    #[case(p(0.0, 179.0), p(0.0, -179.0))]
    #[case(p(0.0, 0.0), p(0.0, -1e-12))]
    fn bearing_stays_in_range(#[case] from: GeoPoint, #[case] to: GeoPoint) {
        let b = bearing(from, to);
        assert!((0.0..360.0).contains(&b), "bearing {b} out of range");
    }

    #[test]
    fn coincident_points_bear_north() {
        let a = p(12.5, -33.0);
        assert_eq!(bearing(a, a), 0.0);
    }

    #[rstest]
    #[case(-1.0, 0.5, 1.0)]
    #[case(-1.0, -7.0, 1.0)]
    #[case(0.01, 2500.0, 2000.0)]
    #[case(-30.0, 30.0, 30.0)]
    fn clip_is_idempotent(#[case] lo: f64, #[case] v: f64, #[case] hi: f64) {
        let once = clip(lo, v, hi);
        assert_eq!(clip(lo, once, hi), once);
        assert!(once >= lo && once <= hi);
        if (lo..=hi).contains(&v) {
            assert_eq!(once, v);
        }
    }

    #[test]
    fn heading_difference_wraps() {
        assert_abs_diff_eq!(angle_between_headings(359.0, 1.0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_between_headings(90.0, 270.0), 180.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angle_between_headings(10.0, 25.0), 15.0, epsilon = 1e-12);
    }
}
