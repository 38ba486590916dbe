//! tagfinder command line tool.
//!
//! Finds OSM objects carrying a tag near an address, ranks them by distance
//! and fills in phone numbers from the map data or the web.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use tagfinder::config::Config;
use tagfinder::gateways::{build_client, AddressResolver, GeodataProvider, HtmlFetcher, Oracle, SearchClient};
use tagfinder::normalize::region_candidates;
use tagfinder::osm::extract_pois;
use tagfinder::phones::reconcile_phones;
use tagfinder::scrape::{search_terms, Scraper};
use tagfinder::spatial::{bounding_box, fix_missing_coordinates};
use tagfinder::{rank_targets, OsmTag};

use crate::output::render_table;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[derive(Parser, Debug)]
#[command(name = "tagfinder")]
#[command(about = "Find OSM points of interest near an address")]
struct Args {
    /// OSM key or key=value, e.g. "amenity=biergarten"
    input_tag: String,

    /// Free-text address to search around
    input_address: String,

    /// Search radius in kilometres
    #[arg(short, long, default_value = "3", value_parser = parse_radius)]
    radius: f64,

    /// Map area to use instead of the address' city
    #[arg(short, long)]
    map: Option<String>,

    /// Skip the web lookup of phone numbers
    #[arg(short, long)]
    noscrape: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_radius(s: &str) -> Result<f64, String> {
    let radius: f64 = s.parse().map_err(|_| format!("'{s}' is not a number"))?;
    if !radius.is_finite() || radius < 0.0 {
        return Err(format!("radius must be a non-negative number of kilometres, got {s}"));
    }
    Ok(radius)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install logger: {e}");
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<()> {
    let tag: OsmTag = args.input_tag.parse()?;

    let config = match &args.config {
        Some(path) => Config::load_from_file(path)?,
        None => Config::default(),
    };
    let client = build_client(&config.http).context("Failed to build HTTP client")?;

    // Address
    let resolver = AddressResolver::new(client.clone(), &config.nominatim.url);
    let (mut address, location) = resolver.resolve(&args.input_address).await?;
    if let Some(map) = &args.map {
        info!("Using map area '{}' instead of '{}'", map, address.city);
        address.city = map.clone();
    }

    // Geodata
    let bbox = bounding_box(args.radius, &location);
    let candidates = region_candidates(&address.city, &address.state);
    let provider = GeodataProvider::new(client.clone(), config.geodata.clone());
    let dataset = provider.fetch(&candidates).await?;

    // Extraction and ranking
    let mut rows = {
        let tag = tag.clone();
        tokio::task::spawn_blocking(move || extract_pois(&dataset, &tag, &bbox))
            .await
            .context("POI extraction task panicked")??
    };
    let repaired = fix_missing_coordinates(&mut rows);
    if repaired > 0 {
        info!("Repaired coordinates of {} targets from their geometry", repaired);
    }

    let ranking = rank_targets(&rows, &location, args.radius)?;
    info!("Found {} targets within {} km", ranking.len(), args.radius);

    let mut noscrape = args.noscrape;
    if !noscrape && ranking.len() > config.scrape.max_targets {
        info!(
            "More than {} targets found, skipping web scraping",
            config.scrape.max_targets
        );
        noscrape = true;
    }

    let phones = if noscrape {
        ranking.phones()
    } else {
        let oracle = Oracle::new(client.clone(), config.oracle.clone());
        let term = oracle.translate_or_keep(tag.search_term()).await;
        let terms = search_terms(ranking.targets(), &term, &address.city);

        let scraper = Scraper::new(
            SearchClient::new(client.clone(), config.search.clone()),
            HtmlFetcher::new(client, &config.search.user_agent),
            config.scrape.concurrency,
        );
        let scraped = scraper.scrape_phones(&terms).await;
        reconcile_phones(&ranking.phones(), &scraped)?
    };

    print!("{}", render_table(ranking.targets(), &phones, config.output.max_rows));
    Ok(())
}
