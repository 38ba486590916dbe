use crate::models::{BoundingBox, GeoPoint};

/// Kilometres per degree of latitude, treated as constant
pub const KM_PER_DEG_LAT: f64 = 110.574;
/// Kilometres per degree of longitude at the equator; scaled by cos(latitude)
pub const KM_PER_DEG_LON_EQUATOR: f64 = 111.320;

/// Box of size 2*radius x 2*radius km around `center`.
///
/// Uses a locally linear degree/km conversion. The longitude extent diverges
/// as the center approaches a pole; callers must reject negative radii.
pub fn bounding_box(radius_km: f64, center: &GeoPoint) -> BoundingBox {
    let lat_radius = radius_km / KM_PER_DEG_LAT;
    let lon_radius = radius_km / (KM_PER_DEG_LON_EQUATOR * center.lat.to_radians().cos());

    BoundingBox::new(
        center.lon - lon_radius,
        center.lat - lat_radius,
        center.lon + lon_radius,
        center.lat + lat_radius,
    )
}
