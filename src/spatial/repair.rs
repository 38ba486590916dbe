use geo::BoundingRect;
use tracing::debug;

use crate::models::{GeoPoint, PoiGeometry, PoiRow};

/// Representative point of a geometry: the min-x/min-y corner of its bounds.
///
/// Polygons use the bounds of their exterior ring, every other shape its
/// overall bounds.
pub fn fallback_point(geometry: &PoiGeometry) -> Option<GeoPoint> {
    let rect = match geometry {
        PoiGeometry::Polygon(poly) => poly.exterior().bounding_rect(),
        PoiGeometry::MultiPolygon(multi) => multi.bounding_rect(),
        PoiGeometry::LineString(line) => line.bounding_rect(),
        PoiGeometry::MultiLineString(lines) => lines.bounding_rect(),
    }?;

    Some(GeoPoint::new(rect.min().y, rect.min().x))
}

/// Assign a point to every row that has a geometry but no usable coordinates.
///
/// Returns the number of repaired rows. Rows with neither stay as they are.
pub fn fix_missing_coordinates(rows: &mut [PoiRow]) -> usize {
    let mut repaired = 0;

    for row in rows.iter_mut() {
        if row.valid_location().is_some() {
            continue;
        }
        let Some(point) = row.geometry.as_ref().and_then(fallback_point) else {
            continue;
        };
        debug!(
            "Repaired coordinates of {} to ({}, {})",
            row.source_id(),
            point.lat,
            point.lon
        );
        row.location = Some(point);
        repaired += 1;
    }

    repaired
}
