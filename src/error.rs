//! Error taxonomy shared by the library modules.

use std::path::{Path, PathBuf};

use thiserror::Error;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("address \"{0}\" could not be resolved")]
    AddressNotFound(String),

    #[error("no map data found for any of: {}{}", .candidates.join(", "), failure_note(.failed))]
    NoGeodata {
        candidates: Vec<String>,
        /// "candidate: error" for every extract whose download failed
        failed: Vec<String>,
    },

    #[error("{0} is not a valid OSM key (no object in the map carries it)")]
    InvalidOsmKey(String),

    #[error("invalid OSM tag \"{0}\": expected `key` or `key=value`")]
    InvalidTag(String),

    #[error("failed to load map data {}: {reason}", .dataset.display())]
    DatasetLoad { dataset: PathBuf, reason: String },

    #[error("no target found within {radius} km; either the OSM tag is not valid or no objects are in the radius")]
    NoTargetsInRadius { radius: f64 },

    #[error("negative radius ({0}) is not allowed")]
    NegativeRadius(f64),

    #[error("phone lists differ in length: {primary} map phones, {scraped} scraped phones")]
    LengthMismatch { primary: usize, scraped: usize },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("PBF decode error: {0}")]
    Pbf(String),

    #[error("node store error: {0}")]
    Sled(#[from] sled::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

fn failure_note(failed: &[String]) -> String {
    if failed.is_empty() {
        String::new()
    } else {
        format!(" (failed downloads: {})", failed.join("; "))
    }
}

impl From<osmpbfreader::Error> for Error {
    fn from(e: osmpbfreader::Error) -> Self {
        Error::Pbf(e.to_string())
    }
}

impl Error {
    /// Attach the dataset path to errors raised while reading it
    pub(crate) fn while_loading(self, dataset: &Path) -> Self {
        match self {
            Error::Pbf(reason) => Error::DatasetLoad {
                dataset: dataset.to_path_buf(),
                reason,
            },
            Error::Io(e) => Error::DatasetLoad {
                dataset: dataset.to_path_buf(),
                reason: e.to_string(),
            },
            other => other,
        }
    }
}
