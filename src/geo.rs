//! Great circle geometry over the spherical earth model.

/// Mean earth radius, in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Two coordinates closer than this are considered identical, in degrees.
const COINCIDENT_EPS: f64 = 1e-9;

/// Computes the great circle distance between two points, in kilometers.
/// All inputs are decimal degrees, south and west negative.
pub fn earth_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lon2 - lon1).to_radians();

    let radicand =
        (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);
    // rounding may push the radicand past 1.0 near antipodal points
    let radicand = radicand.clamp(0.0, 1.0);

    2.0 * EARTH_RADIUS_KM * radicand.sqrt().asin()
}

/// Computes the initial bearing (forward azimuth) from point 1 to point 2,
/// in degrees, normalized to [0, 360). Coincident points bear 0.
pub fn bearing_to(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    if (lat1 - lat2).abs() < COINCIDENT_EPS && (lon1 - lon2).abs() < COINCIDENT_EPS {
        return 0.0;
    }

    let (phi1, phi2) = (lat1.to_radians(), lat2.to_radians());
    let dlambda = (lon2 - lon1).to_radians();

    let y = dlambda.sin() * phi2.cos();
    let x = phi1.cos() * phi2.sin() - phi1.sin() * phi2.cos() * dlambda.cos();

    y.atan2(x).to_degrees().rem_euclid(360.0)
}
