// core/src/geo.rs

pub const EARTH_RADIUS_M: f64 = 6_371_000.0; // middelradius (m)

/// Haversine – storsirkelavstand i meter mellom to WGS84-koordinater.
/// Symmetrisk, og 0.0 for like punkter.
pub fn distance_m(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();
    let r_lat1 = lat1.to_radians();
    let r_lat2 = lat2.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + r_lat1.cos() * r_lat2.cos() * (d_lon / 2.0).sin().powi(2);
    // klem mot [0, 1] så avrunding ikke gir NaN i sqrt(1 - a)
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_M * c
}
