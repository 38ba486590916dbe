//! Runtime configuration, optionally loaded from a TOML file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub http: HttpConfig,
    pub nominatim: NominatimConfig,
    pub geodata: GeodataConfig,
    pub search: SearchConfig,
    pub oracle: OracleConfig,
    pub scrape: ScrapeConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct HttpConfig {
    /// Connect timeout and longest wait for the next chunk of a response
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: "tag_finder".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct NominatimConfig {
    pub url: String,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            url: "https://nominatim.openstreetmap.org".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeodataConfig {
    pub geofabrik_index_url: String,
    pub bbbike_url: String,
    /// Downloaded PBF files are kept here and re-used
    pub cache_dir: PathBuf,
}

impl Default for GeodataConfig {
    fn default() -> Self {
        Self {
            geofabrik_index_url: "https://download.geofabrik.de/index-v1-nogeom.json".to_string(),
            bbbike_url: "https://download.bbbike.org/osm/bbbike".to_string(),
            cache_dir: std::env::temp_dir().join("tagfinder"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct SearchConfig {
    pub url: String,
    pub lang: String,
    pub num_results: u32,
    /// Browser-like UA; search pages serve a reduced page to unknown agents
    pub user_agent: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            url: "https://www.google.com/search".to_string(),
            lang: "de".to_string(),
            num_results: 2,
            user_agent: "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                .to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OracleConfig {
    pub enabled: bool,
    pub url: String,
    pub model: String,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "http://localhost:11434".to_string(),
            model: "qwen2.5:translate".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ScrapeConfig {
    /// Parallel search+fetch requests
    pub concurrency: usize,
    /// Above this many targets scraping is turned off
    pub max_targets: usize,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            concurrency: 4,
            max_targets: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct OutputConfig {
    pub max_rows: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { max_rows: 100 }
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
