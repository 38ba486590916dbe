//! Thin clients for the third-party services the pipeline relies on.

mod geodata;
mod html;
mod nominatim;
mod oracle;
mod search;

pub use geodata::{GeofabrikIndex, GeodataProvider};
pub use html::HtmlFetcher;
pub use nominatim::AddressResolver;
pub use oracle::Oracle;
pub use search::{parse_result_links, SearchClient};

use std::time::Duration;

use reqwest::Client;

use crate::config::HttpConfig;
use crate::error::{Error, Result};

/// Shared HTTP client with the configured timeouts and user agent.
///
/// The timeout bounds connecting and each read, not the whole transfer, so
/// large extracts keep streaming as long as data arrives.
pub fn build_client(config: &HttpConfig) -> Result<Client> {
    let timeout = Duration::from_secs(config.timeout_secs);
    Ok(Client::builder()
        .user_agent(config.user_agent.as_str())
        .connect_timeout(timeout)
        .read_timeout(timeout)
        .build()?)
}

/// Fail on non-2xx responses, keeping the URL for the report
pub(crate) fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(Error::UnexpectedStatus {
            status: status.as_u16(),
            url: response.url().to_string(),
        })
    }
}
