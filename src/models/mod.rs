//! Core data models for the POI finder.

pub mod place;
pub mod poi;

pub use place::{Address, BoundingBox, GeoPoint};
pub use poi::{OsmTag, OsmType, PoiGeometry, PoiRow, RankedTarget, NAME_NOT_SPECIFIED, PHONE_NOT_SPECIFIED};
