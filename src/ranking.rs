//! Distance ranking of repaired POI rows.

use hashbrown::HashMap;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{GeoPoint, PoiRow, RankedTarget, NAME_NOT_SPECIFIED, PHONE_NOT_SPECIFIED};
use crate::spatial::haversine_km;

/// Targets within the radius, nearest first
#[derive(Debug, Clone, PartialEq)]
pub struct Ranking {
    targets: Vec<RankedTarget>,
}

impl Ranking {
    pub fn targets(&self) -> &[RankedTarget] {
        &self.targets
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.name.clone()).collect()
    }

    pub fn phones(&self) -> Vec<String> {
        self.targets.iter().map(|t| t.phone.clone()).collect()
    }
}

/// Rank rows by distance from `center` and keep those within `radius_km`.
///
/// Entries with identical name AND phone (sentinels included) are merged,
/// keeping the nearest distance. Rows without a usable point are skipped.
/// An empty result is an error.
pub fn rank_targets(rows: &[PoiRow], center: &GeoPoint, radius_km: f64) -> Result<Ranking> {
    if radius_km < 0.0 {
        return Err(Error::NegativeRadius(radius_km));
    }

    let mut by_key: HashMap<(String, String), f64> = HashMap::new();
    let mut skipped = 0usize;

    for row in rows {
        let Some(point) = row.valid_location() else {
            skipped += 1;
            continue;
        };

        let name = row.name.clone().unwrap_or_else(|| NAME_NOT_SPECIFIED.to_string());
        let phone = row.phone.clone().unwrap_or_else(|| PHONE_NOT_SPECIFIED.to_string());
        let distance = haversine_km(center.lon, center.lat, point.lon, point.lat);

        by_key
            .entry((name, phone))
            .and_modify(|d| *d = d.min(distance))
            .or_insert(distance);
    }

    if skipped > 0 {
        warn!("Skipped {} objects without coordinates or geometry", skipped);
    }
    let merged = rows.len() - skipped - by_key.len();
    if merged > 0 {
        debug!("Merged {} objects sharing name and phone", merged);
    }

    let mut targets: Vec<RankedTarget> = by_key
        .into_iter()
        .map(|((name, phone), distance_km)| RankedTarget {
            name,
            phone,
            distance_km,
        })
        .filter(|t| t.distance_km <= radius_km)
        .collect();

    targets.sort_by(|a, b| {
        a.distance_km
            .total_cmp(&b.distance_km)
            .then_with(|| a.name.cmp(&b.name))
            .then_with(|| a.phone.cmp(&b.phone))
    });

    if targets.is_empty() {
        return Err(Error::NoTargetsInRadius { radius: radius_km });
    }

    Ok(Ranking { targets })
}
