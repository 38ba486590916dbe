//! Web search returning the first organic result URL.

use std::sync::LazyLock;

use regex::Regex;
use reqwest::Client;
use tracing::debug;
use url::Url;

use super::ensure_success;
use crate::config::SearchConfig;
use crate::error::Result;

static RESULT_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"href="(/url\?q=)?(https?://[^"&]+)"#).expect("result link pattern compiles")
});

/// External links of a search results page, in page order.
///
/// Redirect links (`/url?q=...`) are unwrapped and links back to
/// `search_host` are dropped.
pub fn parse_result_links(html: &str, search_host: &str) -> Vec<String> {
    RESULT_LINK
        .captures_iter(html)
        .filter_map(|caps| {
            let raw = caps.get(2)?.as_str();
            let link = if caps.get(1).is_some() {
                url::form_urlencoded::parse(format!("q={raw}").as_bytes())
                    .next()
                    .map(|(_, v)| v.into_owned())?
            } else {
                raw.to_string()
            };
            let host = Url::parse(&link).ok()?.host_str()?.to_string();
            (host != search_host && !host.ends_with(&format!(".{search_host}"))).then_some(link)
        })
        .collect()
}

pub struct SearchClient {
    client: Client,
    config: SearchConfig,
}

impl SearchClient {
    pub fn new(client: Client, config: SearchConfig) -> Self {
        Self { client, config }
    }

    /// First result URL for `query`, or `""` for an empty query, no result,
    /// or a result that is itself a search page
    pub async fn first_result(&self, query: &str) -> Result<String> {
        if query.is_empty() {
            return Ok(String::new());
        }

        let endpoint = Url::parse(&self.config.url)?;
        let search_host = endpoint
            .host_str()
            .unwrap_or_default()
            .trim_start_matches("www.")
            .to_string();
        let num = self.config.num_results.to_string();
        let mut url = endpoint.clone();
        url.query_pairs_mut()
            .append_pair("q", query)
            .append_pair("num", &num)
            .append_pair("hl", &self.config.lang);

        let response = ensure_success(
            self.client
                .get(url)
                .header(reqwest::header::USER_AGENT, &self.config.user_agent)
                .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
                .send()
                .await?,
        )?;
        let html = response.text().await?;

        let first = parse_result_links(&html, &search_host)
            .into_iter()
            .next()
            .filter(|link| !link.contains("search?"))
            .unwrap_or_default();
        debug!("Search '{}' -> '{}'", query, first);
        Ok(first)
    }
}
