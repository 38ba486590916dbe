use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use geo::BoundingRect;
use indicatif::{ProgressBar, ProgressStyle};
use osmpbfreader::{OsmObj, OsmPbfReader, Tags};
use tracing::{debug, info, warn};

use super::GeometryResolver;
use crate::error::{Error, Result};
use crate::models::{BoundingBox, GeoPoint, OsmTag, OsmType, PoiGeometry, PoiRow};

/// Build a row from an object's tags if it carries the filter key
pub fn poi_from_tags(osm_type: OsmType, osm_id: i64, tags: &Tags, key: &str) -> Option<PoiRow> {
    let category = tags.get(key)?;
    let mut row = PoiRow::new(osm_type, osm_id, category.as_str());
    row.name = tags.get("name").map(|v| v.to_string());
    row.phone = tags
        .get("phone")
        .or_else(|| tags.get("contact:phone"))
        .map(|v| v.to_string());
    Some(row)
}

/// Read every POI matching `tag` inside `bbox` from a PBF extract.
///
/// Fails with `InvalidOsmKey` when no object in the file carries the key,
/// and with `DatasetLoad` when the file cannot be read or decoded.
pub fn extract_pois(dataset: &Path, tag: &OsmTag, bbox: &BoundingBox) -> Result<Vec<PoiRow>> {
    read_pois(dataset, tag, bbox).map_err(|e| e.while_loading(dataset))
}

fn read_pois(dataset: &Path, tag: &OsmTag, bbox: &BoundingBox) -> Result<Vec<PoiRow>> {
    info!("Loading POIs for '{}' from {}", tag, dataset.display());

    let file = File::open(dataset)?;
    let mut reader = OsmPbfReader::new(BufReader::new(file));
    let resolver = GeometryResolver::build(&mut reader, &tag.key)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {pos} objects ({per_sec}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );

    reader.rewind()?;
    let mut carrying_key = 0usize;
    let mut rows = Vec::new();

    for obj in reader.iter() {
        pb.inc(1);
        let obj = match obj {
            Ok(o) => o,
            Err(e) => {
                warn!("Error reading OSM object: {}", e);
                continue;
            }
        };

        let row = match &obj {
            OsmObj::Node(node) => {
                poi_from_tags(OsmType::Node, node.id.0, &node.tags, &tag.key).map(|mut row| {
                    row.location = Some(GeoPoint::new(node.lat(), node.lon()));
                    row
                })
            }
            OsmObj::Way(way) => {
                poi_from_tags(OsmType::Way, way.id.0, &way.tags, &tag.key).map(|mut row| {
                    row.geometry = resolver.resolve_way(way.id);
                    row
                })
            }
            OsmObj::Relation(rel) => {
                poi_from_tags(OsmType::Relation, rel.id.0, &rel.tags, &tag.key).map(|mut row| {
                    row.geometry = resolver.resolve_relation(rel.id);
                    row
                })
            }
        };

        let Some(row) = row else {
            continue;
        };
        carrying_key += 1;

        if !tag.matches(&row.category) || !in_bbox(&row, bbox) {
            continue;
        }
        debug!("Candidate {} ({:?})", row.source_id(), row.name);
        rows.push(row);
    }

    pb.finish_with_message("done");

    if carrying_key == 0 {
        return Err(Error::InvalidOsmKey(tag.key.clone()));
    }

    info!(
        "Found {} objects tagged '{}', {} matching '{}' inside the search box",
        carrying_key,
        tag.key,
        rows.len(),
        tag
    );
    Ok(rows)
}

/// Rows whose shape could not be resolved are kept; ranking reports them
fn in_bbox(row: &PoiRow, bbox: &BoundingBox) -> bool {
    if let Some(point) = row.location {
        return bbox.contains(&point);
    }
    let rect = match &row.geometry {
        Some(PoiGeometry::Polygon(g)) => g.bounding_rect(),
        Some(PoiGeometry::MultiPolygon(g)) => g.bounding_rect(),
        Some(PoiGeometry::LineString(g)) => g.bounding_rect(),
        Some(PoiGeometry::MultiLineString(g)) => g.bounding_rect(),
        None => return true,
    };
    rect.is_some_and(|r| bbox.intersects(r.min().x, r.min().y, r.max().x, r.max().y))
}
