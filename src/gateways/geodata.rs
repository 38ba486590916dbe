//! Map-data acquisition from Geofabrik and BBBike, with a local download cache.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::Client;
use serde::Deserialize;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::ensure_success;
use crate::config::GeodataConfig;
use crate::error::{Error, Result};
use crate::normalize::{region_key, transliterate};

/// Region catalog published by Geofabrik (`index-v1-nogeom.json`)
#[derive(Debug, Deserialize)]
pub struct GeofabrikIndex {
    features: Vec<GeofabrikFeature>,
}

#[derive(Debug, Deserialize)]
struct GeofabrikFeature {
    properties: GeofabrikRegion,
}

#[derive(Debug, Deserialize)]
struct GeofabrikRegion {
    id: String,
    name: String,
    urls: GeofabrikUrls,
}

#[derive(Debug, Deserialize)]
struct GeofabrikUrls {
    pbf: Option<String>,
}

impl GeofabrikIndex {
    /// PBF download URL of the region whose id or name matches `place`
    pub fn find_pbf(&self, place: &str) -> Option<&str> {
        let wanted = region_key(place);
        self.features
            .iter()
            .map(|f| &f.properties)
            .find(|r| region_key(&r.id) == wanted || region_key(&r.name) == wanted)
            .and_then(|r| r.urls.pbf.as_deref())
    }
}

/// Finds and downloads the smallest available extract for an address
pub struct GeodataProvider {
    client: Client,
    config: GeodataConfig,
}

impl GeodataProvider {
    pub fn new(client: Client, config: GeodataConfig) -> Self {
        Self { client, config }
    }

    /// Try each candidate region in order and return the first extract found.
    pub async fn fetch(&self, candidates: &[String]) -> Result<PathBuf> {
        info!("Starting download of PBF data...");

        let index = match self.load_index().await {
            Ok(index) => Some(index),
            Err(e) => {
                warn!("Geofabrik index unavailable ({}), trying BBBike only", e);
                None
            }
        };

        let mut failed = Vec::new();
        for candidate in candidates {
            let geofabrik = index.as_ref().and_then(|i| i.find_pbf(candidate));
            let url = match geofabrik {
                Some(url) => Some(url.to_string()),
                None => self.probe_bbbike(candidate).await,
            };
            let Some(url) = url else {
                info!("Could not find PBF data for '{}'.", candidate);
                continue;
            };

            match self.download(&url).await {
                Ok(path) => {
                    info!("Completed download of PBF data for '{}'.", candidate);
                    return Ok(path);
                }
                Err(e) => {
                    warn!("Download of PBF data for '{}' failed: {}", candidate, e);
                    failed.push(format!("{candidate}: {e}"));
                }
            }
        }

        Err(Error::NoGeodata {
            candidates: candidates.to_vec(),
            failed,
        })
    }

    async fn load_index(&self) -> Result<GeofabrikIndex> {
        debug!("Fetching Geofabrik index from {}", self.config.geofabrik_index_url);
        let response = ensure_success(
            self.client
                .get(&self.config.geofabrik_index_url)
                .send()
                .await?,
        )?;
        Ok(response.json().await?)
    }

    /// BBBike city extracts live at `{base}/{City}/{City}.osm.pbf`
    async fn probe_bbbike(&self, place: &str) -> Option<String> {
        let city = bbbike_city_name(place)?;
        let url = format!(
            "{}/{city}/{city}.osm.pbf",
            self.config.bbbike_url.trim_end_matches('/')
        );
        match self.client.head(&url).send().await {
            Ok(response) if response.status().is_success() => Some(url),
            Ok(response) => {
                debug!("BBBike has no extract at {} ({})", url, response.status());
                None
            }
            Err(e) => {
                debug!("BBBike probe for {} failed: {}", url, e);
                None
            }
        }
    }

    /// Download `url` into the cache directory, re-using an earlier download
    async fn download(&self, url: &str) -> Result<PathBuf> {
        let file_name = url
            .rsplit('/')
            .next()
            .filter(|n| !n.is_empty())
            .unwrap_or("extract.osm.pbf");
        tokio::fs::create_dir_all(&self.config.cache_dir).await?;
        let target = self.config.cache_dir.join(file_name);

        if is_cached(&target).await {
            info!("Using cached {}", target.display());
            return Ok(target);
        }

        info!("Downloading {}", url);
        let response = ensure_success(self.client.get(url).send().await?)?;

        let pb = match response.content_length() {
            Some(len) => ProgressBar::new(len),
            None => ProgressBar::new_spinner(),
        };
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let partial = target.with_extension("part");
        let written = stream_to_file(response, &partial, &pb).await;
        pb.finish_and_clear();
        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&partial).await {
                debug!("Could not remove {}: {}", partial.display(), cleanup);
            }
            return Err(e);
        }
        tokio::fs::rename(&partial, &target).await?;

        Ok(target)
    }
}

async fn stream_to_file(mut response: reqwest::Response, path: &Path, pb: &ProgressBar) -> Result<()> {
    let mut file = tokio::fs::File::create(path).await?;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        pb.inc(chunk.len() as u64);
    }
    file.flush().await?;
    Ok(())
}

async fn is_cached(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file() && m.len() > 0)
        .unwrap_or(false)
}

/// "freiburg" -> "Freiburg", "Frankfurt am Main" -> "FrankfurtAmMain"
fn bbbike_city_name(place: &str) -> Option<String> {
    let mut city = String::new();
    for word in transliterate(place).split([' ', '-']).filter(|w| !w.is_empty()) {
        let mut chars = word.chars();
        if let Some(first) = chars.next() {
            city.extend(first.to_uppercase());
            city.push_str(chars.as_str());
        }
    }
    if city.is_empty() || !city.chars().all(|c| c.is_ascii_alphanumeric()) {
        return None;
    }
    Some(city)
}
