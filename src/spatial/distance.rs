/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in km between two (lon, lat) pairs in degrees
pub fn haversine_km(lon_a: f64, lat_a: f64, lon_b: f64, lat_b: f64) -> f64 {
    let lat_a = lat_a.to_radians();
    let lat_b = lat_b.to_radians();
    let d_lat = lat_b - lat_a;
    let d_lon = (lon_b - lon_a).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_for_same_point() {
        assert_eq!(haversine_km(7.8, 48.0, 7.8, 48.0), 0.0);
    }

    #[test]
    fn test_symmetric() {
        let ab = haversine_km(7.8, 48.0, 7.85, 47.98);
        let ba = haversine_km(7.85, 47.98, 7.8, 48.0);
        assert!((ab - ba).abs() < 1e-12);
        assert!(ab > 0.0);
    }

    #[test]
    fn test_one_degree_latitude() {
        // 6371 * pi / 180
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.195).abs() < 0.001, "{d}");
    }

    #[test]
    fn test_triangle_inequality_nearby() {
        let a = (7.80, 48.00);
        let b = (7.82, 48.01);
        let c = (7.85, 47.99);
        let ab = haversine_km(a.0, a.1, b.0, b.1);
        let bc = haversine_km(b.0, b.1, c.0, c.1);
        let ac = haversine_km(a.0, a.1, c.0, c.1);
        assert!(ac <= ab + bc + 1e-9);
    }

    #[test]
    fn test_known_distance_freiburg_basel() {
        // Freiburg Hbf -> Basel SBB is roughly 52 km as the crow flies
        let d = haversine_km(7.8414, 47.9977, 7.5896, 47.5476);
        assert!((50.0..55.0).contains(&d), "{d}");
    }
}
