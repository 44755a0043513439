//! Great-circle distance on (lon, lat) degree pairs (spec.md §4.1).

/// Mean earth radius in kilometres, matching the original `osmprob`/`osmdata`
/// haversine constant.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine great-circle distance between two (lon, lat) points in degrees,
/// returned in kilometres. Symmetric, non-negative, zero on coincident
/// points. Uses the numerically stable `2R asin(sqrt(a))` form rather than
/// `2R atan2(sqrt(a), sqrt(1-a))`.
pub fn haversine(lon1: f64, lat1: f64, lon2: f64, lat2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().asin()
}

/// Sum of haversine distances over consecutive (lon, lat) pairs in a
/// coordinate sequence, grounded in the original `getDist` total-path
/// variant.
pub fn total_haversine(coords: &[(f64, f64)]) -> f64 {
    coords
        .windows(2)
        .map(|pair| haversine(pair[0].0, pair[0].1, pair[1].0, pair[1].1))
        .sum()
}
