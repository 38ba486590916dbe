//! Distance, bounding box and coordinate repair on plain lat/lon data.

mod bbox;
mod distance;
mod repair;

pub use bbox::{bounding_box, KM_PER_DEG_LAT, KM_PER_DEG_LON_EQUATOR};
pub use distance::{haversine_km, EARTH_RADIUS_KM};
pub use repair::{fallback_point, fix_missing_coordinates};
