//! Integration tests for the service clients.
//!
//! Each test stands up a local `wiremock` server, so no real network
//! traffic is made.

use std::time::Duration;

use serde_json::json;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tagfinder::config::{GeodataConfig, HttpConfig, OracleConfig, SearchConfig};
use tagfinder::gateways::{build_client, AddressResolver, GeodataProvider, HtmlFetcher, Oracle, SearchClient};
use tagfinder::Error;

fn test_client() -> reqwest::Client {
    let config = HttpConfig {
        timeout_secs: 5,
        user_agent: "tagfinder-test/0.1".to_string(),
    };
    build_client(&config).expect("failed to build test client")
}

/// Raw HTTP server that announces `declared_len` body bytes, then writes
/// `body` one byte at a time with `pause` before each byte and hangs up.
async fn spawn_trickle_server(body: &'static [u8], declared_len: usize, pause: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut request = [0u8; 4096];
                let _ = socket.read(&mut request).await;
                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {declared_len}\r\nConnection: close\r\n\r\n"
                );
                if socket.write_all(head.as_bytes()).await.is_err() {
                    return;
                }
                for byte in body {
                    tokio::time::sleep(pause).await;
                    if socket.write_all(&[*byte]).await.is_err() {
                        return;
                    }
                    let _ = socket.flush().await;
                }
            });
        }
    });
    format!("http://{addr}")
}

/// Geofabrik index listing `(name, pbf url)` regions
async fn mount_index(server: &MockServer, regions: &[(&str, String)]) {
    let features: Vec<serde_json::Value> = regions
        .iter()
        .map(|(name, url)| {
            json!({
                "type": "Feature",
                "properties": {"id": name.to_lowercase(), "name": name, "urls": {"pbf": url}}
            })
        })
        .collect();
    Mock::given(method("GET"))
        .and(path("/index-v1-nogeom.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"features": features})))
        .mount(server)
        .await;
}

fn search_config(server: &MockServer) -> SearchConfig {
    SearchConfig {
        url: format!("{}/search", server.uri()),
        ..SearchConfig::default()
    }
}

fn oracle_config(server: &MockServer) -> OracleConfig {
    OracleConfig {
        enabled: true,
        url: server.uri(),
        model: "qwen2.5:translate".to_string(),
    }
}

fn geodata_config(server: &MockServer, cache: &tempfile::TempDir) -> GeodataConfig {
    GeodataConfig {
        geofabrik_index_url: format!("{}/index-v1-nogeom.json", server.uri()),
        bbbike_url: format!("{}/bbbike", server.uri()),
        cache_dir: cache.path().to_path_buf(),
    }
}

// ---------------------------------------------------------------------------
// Address resolution
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resolve_returns_transliterated_address_and_location() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Idinger Str. 1, Freiburg"))
        .and(query_param("format", "jsonv2"))
        .and(query_param("addressdetails", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "lat": "47.9990077",
            "lon": "7.8421043",
            "address": {
                "house_number": "1",
                "road": "Idinger Straße",
                "city": "Freiburg im Breisgau",
                "state": "Baden-Württemberg"
            }
        }])))
        .expect(1)
        .mount(&server)
        .await;

    let resolver = AddressResolver::new(test_client(), &server.uri());
    let (address, location) = resolver.resolve("Idinger Str. 1, Freiburg").await.unwrap();

    assert_eq!(address.street, "Idinger Strasse");
    assert_eq!(address.housenumber, "1");
    assert_eq!(address.city, "Freiburg im Breisgau");
    assert_eq!(address.state, "Baden-Wuerttemberg");
    assert!((location.lat - 47.9990077).abs() < 1e-9);
    assert!((location.lon - 7.8421043).abs() < 1e-9);
}

#[tokio::test]
async fn resolve_without_hit_is_address_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let resolver = AddressResolver::new(test_client(), &server.uri());
    let result = resolver.resolve("Nowhere 0, Atlantis").await;

    assert!(
        matches!(result, Err(Error::AddressNotFound(ref q)) if q == "Nowhere 0, Atlantis"),
        "expected AddressNotFound, got: {result:?}"
    );
}

#[tokio::test]
async fn resolve_server_error_is_unexpected_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let resolver = AddressResolver::new(test_client(), &server.uri());
    let result = resolver.resolve("Freiburg").await;

    assert!(
        matches!(result, Err(Error::UnexpectedStatus { status: 503, .. })),
        "expected UnexpectedStatus, got: {result:?}"
    );
}

// ---------------------------------------------------------------------------
// Geodata
// ---------------------------------------------------------------------------

#[tokio::test]
async fn geodata_downloads_geofabrik_extract_once() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/index-v1-nogeom.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {
                    "id": "freiburg-regbez",
                    "name": "Freiburg",
                    "urls": {"pbf": format!("{}/europe/freiburg-latest.osm.pbf", server.uri())}
                }
            }]
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/europe/freiburg-latest.osm.pbf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"PBFDATA".to_vec()))
        .expect(1)
        .mount(&server)
        .await;

    let provider = GeodataProvider::new(test_client(), geodata_config(&server, &cache));
    let candidates = vec!["Freiburg im Breisgau".to_string(), "Freiburg".to_string()];

    let first = provider.fetch(&candidates).await.unwrap();
    assert_eq!(first, cache.path().join("freiburg-latest.osm.pbf"));
    assert_eq!(std::fs::read(&first).unwrap(), b"PBFDATA");

    // Served from the cache the second time
    let second = provider.fetch(&candidates).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn geodata_falls_back_to_bbbike() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/index-v1-nogeom.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    Mock::given(method("HEAD"))
        .and(path("/bbbike/Freiburg/Freiburg.osm.pbf"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/bbbike/Freiburg/Freiburg.osm.pbf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"BBBIKE".to_vec()))
        .mount(&server)
        .await;

    let provider = GeodataProvider::new(test_client(), geodata_config(&server, &cache));
    let candidates = vec!["Freiburg im Breisgau".to_string(), "Freiburg".to_string()];
    let dataset = provider.fetch(&candidates).await.unwrap();

    assert_eq!(dataset, cache.path().join("Freiburg.osm.pbf"));
    assert_eq!(std::fs::read(&dataset).unwrap(), b"BBBIKE");
}

#[tokio::test]
async fn geodata_exhausted_ladder_is_no_geodata() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/index-v1-nogeom.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"features": []})))
        .mount(&server)
        .await;

    let provider = GeodataProvider::new(test_client(), geodata_config(&server, &cache));
    let candidates = vec!["Atlantis".to_string(), "Poseidonia".to_string()];
    let result = provider.fetch(&candidates).await;

    match result {
        Err(Error::NoGeodata { candidates: tried, failed }) => {
            assert_eq!(tried, candidates);
            assert!(failed.is_empty(), "nothing was downloaded: {failed:?}");
        }
        other => panic!("expected NoGeodata, got: {other:?}"),
    }
}

#[tokio::test]
async fn geodata_failed_download_moves_to_next_candidate() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    mount_index(
        &server,
        &[
            ("Freiburg", format!("{}/freiburg.osm.pbf", server.uri())),
            ("Baden-Wuerttemberg", format!("{}/baden-wuerttemberg.osm.pbf", server.uri())),
        ],
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/freiburg.osm.pbf"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/baden-wuerttemberg.osm.pbf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"STATE".to_vec()))
        .mount(&server)
        .await;

    let provider = GeodataProvider::new(test_client(), geodata_config(&server, &cache));
    let candidates = vec!["Freiburg".to_string(), "Baden-Wuerttemberg".to_string()];
    let dataset = provider.fetch(&candidates).await.unwrap();

    assert_eq!(dataset, cache.path().join("baden-wuerttemberg.osm.pbf"));
    assert_eq!(std::fs::read(&dataset).unwrap(), b"STATE");
}

#[tokio::test]
async fn geodata_reports_failed_downloads() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    mount_index(&server, &[("Freiburg", format!("{}/freiburg.osm.pbf", server.uri()))]).await;

    Mock::given(method("GET"))
        .and(path("/freiburg.osm.pbf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let provider = GeodataProvider::new(test_client(), geodata_config(&server, &cache));
    let err = provider.fetch(&["Freiburg".to_string()]).await.unwrap_err();

    assert!(err.to_string().contains("failed downloads: Freiburg: "), "{err}");
    match err {
        Error::NoGeodata { failed, .. } => {
            assert_eq!(failed.len(), 1);
            assert!(failed[0].contains("404"), "{failed:?}");
        }
        other => panic!("expected NoGeodata, got: {other:?}"),
    }
}

#[tokio::test]
async fn geodata_slow_download_is_not_cut_off() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();
    let body: &'static [u8] = b"SLOWDATA";

    // 8 bytes, 300 ms apart: well past the 1 s timeout in total
    let slow = spawn_trickle_server(body, body.len(), Duration::from_millis(300)).await;
    mount_index(&server, &[("Freiburg", format!("{slow}/freiburg.osm.pbf"))]).await;

    let client = build_client(&HttpConfig {
        timeout_secs: 1,
        user_agent: "tagfinder-test/0.1".to_string(),
    })
    .unwrap();
    let provider = GeodataProvider::new(client, geodata_config(&server, &cache));
    let dataset = provider.fetch(&["Freiburg".to_string()]).await.unwrap();

    assert_eq!(std::fs::read(&dataset).unwrap(), body);
}

#[tokio::test]
async fn geodata_truncated_download_leaves_no_partial_file() {
    let server = MockServer::start().await;
    let cache = tempfile::tempdir().unwrap();

    // Promises 100 bytes, sends 4 and hangs up
    let broken = spawn_trickle_server(b"PBF!", 100, Duration::from_millis(10)).await;
    mount_index(&server, &[("Freiburg", format!("{broken}/freiburg.osm.pbf"))]).await;

    let provider = GeodataProvider::new(test_client(), geodata_config(&server, &cache));
    let result = provider.fetch(&["Freiburg".to_string()]).await;

    assert!(matches!(result, Err(Error::NoGeodata { ref failed, .. }) if failed.len() == 1), "{result:?}");
    let leftovers: Vec<_> = std::fs::read_dir(cache.path()).unwrap().collect();
    assert!(leftovers.is_empty(), "cache should be empty: {leftovers:?}");
}

// ---------------------------------------------------------------------------
// Search, HTML and translation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn search_returns_first_external_result() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .and(query_param("q", "Feierling Biergarten Freiburg"))
        .and(query_param("num", "2"))
        .and(query_param("hl", "de"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<a href="/url?q=https://www.feierling.de/&amp;sa=U">Feierling</a>
               <a href="https://www.example.org/other">Other</a>"#,
        ))
        .mount(&server)
        .await;

    let search = SearchClient::new(test_client(), search_config(&server));
    let url = search.first_result("Feierling Biergarten Freiburg").await.unwrap();

    assert_eq!(url, "https://www.feierling.de/");
}

#[tokio::test]
async fn search_result_pointing_to_search_page_is_empty() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/search"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<a href="https://maps.example.com/search?q=feierling">Maps</a>"#),
        )
        .mount(&server)
        .await;

    let search = SearchClient::new(test_client(), search_config(&server));
    assert_eq!(search.first_result("Feierling").await.unwrap(), "");
}

#[tokio::test]
async fn search_with_empty_query_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let search = SearchClient::new(test_client(), search_config(&server));
    assert_eq!(search.first_result("").await.unwrap(), "");
}

#[tokio::test]
async fn html_fetch_returns_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/kontakt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Tel. 0761/2183456</p>"))
        .mount(&server)
        .await;

    let fetcher = HtmlFetcher::new(test_client(), "Mozilla/5.0");
    let body = fetcher.fetch(&format!("{}/kontakt", server.uri())).await.unwrap();

    assert_eq!(body, "<p>Tel. 0761/2183456</p>");
    assert_eq!(fetcher.fetch("").await.unwrap(), "");
}

#[tokio::test]
async fn oracle_returns_trimmed_translation() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .and(body_partial_json(json!({
            "model": "qwen2.5:translate",
            "stream": false,
            "messages": [{"role": "user", "content": "biergarten"}]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "model": "qwen2.5:translate",
            "message": {"role": "assistant", "content": " Biergarten\n"},
            "done": true
        })))
        .mount(&server)
        .await;

    let oracle = Oracle::new(test_client(), oracle_config(&server));
    assert_eq!(oracle.translate("biergarten").await.unwrap(), "Biergarten");
}

#[tokio::test]
async fn oracle_failure_keeps_term() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let oracle = Oracle::new(test_client(), oracle_config(&server));
    assert_eq!(oracle.translate_or_keep("psychotherapist").await, "psychotherapist");
}

#[tokio::test]
async fn disabled_oracle_makes_no_request() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let config = OracleConfig {
        enabled: false,
        ..oracle_config(&server)
    };
    let oracle = Oracle::new(test_client(), config);
    assert_eq!(oracle.translate_or_keep("bakery").await, "bakery");
}
