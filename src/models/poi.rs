//! POI rows as read from the map and the ranked targets built from them.

use std::fmt;
use std::str::FromStr;

use geo::{LineString, MultiLineString, MultiPolygon, Polygon};
use serde::{Deserialize, Serialize};

use super::GeoPoint;
use crate::error::Error;

pub const NAME_NOT_SPECIFIED: &str = "Name not specified";
pub const PHONE_NOT_SPECIFIED: &str = "Phone not specified";

/// Type of OSM object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsmType {
    Node,
    Way,
    Relation,
}

impl fmt::Display for OsmType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OsmType::Node => write!(f, "node"),
            OsmType::Way => write!(f, "way"),
            OsmType::Relation => write!(f, "relation"),
        }
    }
}

/// Shape of a POI that is not a plain node
#[derive(Debug, Clone, PartialEq)]
pub enum PoiGeometry {
    Polygon(Polygon<f64>),
    MultiPolygon(MultiPolygon<f64>),
    LineString(LineString<f64>),
    MultiLineString(MultiLineString<f64>),
}

/// Raw candidate extracted from the map
#[derive(Debug, Clone, PartialEq)]
pub struct PoiRow {
    pub osm_type: OsmType,
    pub osm_id: i64,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<GeoPoint>,
    pub geometry: Option<PoiGeometry>,
    /// Value of the filter key on this object (e.g. "biergarten" for `amenity`)
    pub category: String,
}

impl PoiRow {
    pub fn new(osm_type: OsmType, osm_id: i64, category: impl Into<String>) -> Self {
        Self {
            osm_type,
            osm_id,
            name: None,
            phone: None,
            location: None,
            geometry: None,
            category: category.into(),
        }
    }

    /// "{osm_type}/{osm_id}", for log messages
    pub fn source_id(&self) -> String {
        format!("{}/{}", self.osm_type, self.osm_id)
    }

    /// The point, if present and numerically usable
    pub fn valid_location(&self) -> Option<GeoPoint> {
        self.location.filter(GeoPoint::is_valid)
    }
}

/// A POI inside the radius, ready for output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedTarget {
    pub name: String,
    pub phone: String,
    pub distance_km: f64,
}

impl RankedTarget {
    pub fn has_name(&self) -> bool {
        self.name != NAME_NOT_SPECIFIED
    }
}

/// `key` or `key=value` tag filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OsmTag {
    pub key: String,
    pub value: Option<String>,
}

impl OsmTag {
    /// Whether a POI with this category value passes the filter
    pub fn matches(&self, category: &str) -> bool {
        match &self.value {
            Some(value) => value == category,
            None => true,
        }
    }

    /// The most specific term of the tag, used for web searches
    pub fn search_term(&self) -> &str {
        self.value.as_deref().unwrap_or(&self.key)
    }
}

impl FromStr for OsmTag {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidTag(s.to_string());
        let valid_part = |p: &str| !p.is_empty() && !p.chars().any(char::is_whitespace);

        let mut parts = s.split('=');
        let key = parts.next().filter(|k| valid_part(k)).ok_or_else(invalid)?;
        let value = match parts.next() {
            Some(v) if valid_part(v) => Some(v.to_string()),
            Some(_) => return Err(invalid()),
            None => None,
        };
        if parts.next().is_some() {
            return Err(invalid());
        }

        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

impl fmt::Display for OsmTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(value) => write!(f, "{}={}", self.key, value),
            None => write!(f, "{}", self.key),
        }
    }
}
