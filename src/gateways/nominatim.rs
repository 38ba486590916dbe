//! Address lookup against a Nominatim instance.

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info};
use url::Url;

use super::ensure_success;
use crate::error::{Error, Result};
use crate::models::{Address, GeoPoint};
use crate::normalize::transliterate;

/// Resolves free-text addresses to structured addresses and coordinates
pub struct AddressResolver {
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    lat: String,
    lon: String,
    #[serde(default)]
    address: AddressDetails,
}

#[derive(Debug, Default, Deserialize)]
struct AddressDetails {
    house_number: Option<String>,
    road: Option<String>,
    city: Option<String>,
    village: Option<String>,
    state: Option<String>,
}

impl AddressDetails {
    fn into_address(self) -> Address {
        let clean = |v: Option<String>| v.as_deref().map(transliterate).unwrap_or_default();
        Address {
            housenumber: self.house_number.unwrap_or_default(),
            street: clean(self.road),
            city: clean(self.city.or(self.village)),
            state: clean(self.state),
        }
    }
}

impl AddressResolver {
    pub fn new(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Look up `query`; fails with `AddressNotFound` if Nominatim has no hit
    pub async fn resolve(&self, query: &str) -> Result<(Address, GeoPoint)> {
        let url = Url::parse_with_params(
            &format!("{}/search", self.base_url),
            &[
                ("q", query),
                ("format", "jsonv2"),
                ("addressdetails", "1"),
                ("limit", "1"),
            ],
        )?;

        debug!("Geocoding '{}'", query);
        let response = ensure_success(self.client.get(url).send().await?)?;
        let hits: Vec<SearchHit> = response.json().await?;

        let not_found = || Error::AddressNotFound(query.to_string());
        let hit = hits.into_iter().next().ok_or_else(not_found)?;
        let location = GeoPoint::new(
            hit.lat.parse().map_err(|_| not_found())?,
            hit.lon.parse().map_err(|_| not_found())?,
        );
        if !location.is_valid() {
            return Err(not_found());
        }

        let address = hit.address.into_address();
        info!(
            "Resolved '{}' to {} {}, {} ({}) at ({}, {})",
            query,
            address.street,
            address.housenumber,
            address.city,
            address.state,
            location.lat,
            location.lon
        );
        Ok((address, location))
    }
}
