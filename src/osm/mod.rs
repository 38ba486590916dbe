//! Reading POIs out of OSM PBF extracts.
//!
//! Ways and relations only carry node references, so their shapes are
//! resolved through an on-disk node store before the POIs are emitted.

mod geometry;
mod pois;

pub use geometry::{merge_rings_to_polygons, GeometryResolver};
pub use pois::{extract_pois, poi_from_tags};
