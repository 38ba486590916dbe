//! Web lookup of phone numbers for ranked targets.

use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::gateways::{HtmlFetcher, SearchClient};
use crate::models::RankedTarget;
use crate::phones::extract_phone;

/// One query per target: "{name} {term} {city}", or "" for unnamed targets
pub fn search_terms(targets: &[RankedTarget], term: &str, city: &str) -> Vec<String> {
    targets
        .iter()
        .map(|t| {
            if t.has_name() {
                [t.name.as_str(), term, city]
                    .iter()
                    .filter(|part| !part.is_empty())
                    .copied()
                    .collect::<Vec<_>>()
                    .join(" ")
            } else {
                String::new()
            }
        })
        .collect()
}

pub struct Scraper {
    search: SearchClient,
    html: HtmlFetcher,
    concurrency: usize,
}

impl Scraper {
    pub fn new(search: SearchClient, html: HtmlFetcher, concurrency: usize) -> Self {
        Self {
            search,
            html,
            concurrency: concurrency.max(1),
        }
    }

    /// Scraped phone per search term, in input order; `""` where none was found
    pub async fn scrape_phones(&self, terms: &[String]) -> Vec<String> {
        info!("Starting web scraping for {} targets...", terms.len());

        let pb = ProgressBar::new(terms.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({per_sec})")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        let phones: Vec<String> = stream::iter(terms)
            .map(|term| {
                let pb = pb.clone();
                async move {
                    let phone = self.scrape_one(term).await;
                    pb.inc(1);
                    phone
                }
            })
            .buffered(self.concurrency)
            .collect()
            .await;

        pb.finish_and_clear();
        let found = phones.iter().filter(|p| !p.is_empty()).count();
        info!("Completed web scraping, found {} phone numbers.", found);
        phones
    }

    /// Failures are treated as "not found"
    async fn scrape_one(&self, term: &str) -> String {
        if term.is_empty() {
            return String::new();
        }

        let url = match self.search.first_result(term).await {
            Ok(url) if !url.is_empty() => url,
            Ok(_) => return String::new(),
            Err(e) => {
                debug!("Search for '{}' failed: {}", term, e);
                return String::new();
            }
        };

        match self.html.fetch(&url).await {
            Ok(html) => extract_phone(&html),
            Err(e) => {
                debug!("Fetching {} failed: {}", url, e);
                String::new()
            }
        }
    }
}
