//! tagfinder - find OSM points of interest near an address
//!
//! This library provides the ranking pipeline and service clients used by
//! the `tagfinder` binary.

pub mod config;
pub mod error;
pub mod gateways;
pub mod models;
pub mod normalize;
pub mod osm;
pub mod phones;
pub mod ranking;
pub mod scrape;
pub mod spatial;

pub use error::{Error, Result};
pub use models::{Address, BoundingBox, GeoPoint, OsmTag, PoiRow, RankedTarget};
pub use ranking::{rank_targets, Ranking};
