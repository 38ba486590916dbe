use reqwest::Client;

use super::ensure_success;
use crate::error::Result;

/// Plain GET of result pages
pub struct HtmlFetcher {
    client: Client,
    user_agent: String,
}

impl HtmlFetcher {
    pub fn new(client: Client, user_agent: &str) -> Self {
        Self {
            client,
            user_agent: user_agent.to_string(),
        }
    }

    /// Body of `url` as text; `""` for an empty URL
    pub async fn fetch(&self, url: &str) -> Result<String> {
        if url.is_empty() {
            return Ok(String::new());
        }
        let response = self
            .client
            .get(url)
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .header(reqwest::header::ACCEPT, "text/html,application/xhtml+xml")
            .send()
            .await?;
        Ok(ensure_success(response)?.text().await?)
    }
}
