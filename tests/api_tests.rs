use axum_test::TestServer;
use serde_json::json;

use moodseed_api::api::{create_router, AppState};
use moodseed_api::services::catalog::Catalog;

/// Five tracks spread across the tempo axis, plus labels for class-bias
/// coverage. Everything else neutral so tempo dominates the ordering.
const SEED_CSV: &str = "\
uri,tempo,energy,valence,danceability,labels
track:60,60,0.5,0.5,0.5,0
track:90,90,0.5,0.5,0.5,1
track:120,120,0.5,0.5,0.5,2
track:150,150,0.5,0.5,0.5,3
track:180,180,0.5,0.5,0.5,2
";

fn create_test_server() -> TestServer {
    create_test_server_with(SEED_CSV)
}

fn create_test_server_with(csv: &str) -> TestServer {
    let catalog = Catalog::from_csv_reader(csv.as_bytes()).unwrap();
    let state = AppState::new(catalog);
    let app = create_router(state);
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_search_returns_ranked_tracks() {
    let server = create_test_server();

    let response = server
        .post("/search")
        .json(&json!({
            "bpm_range": [100, 140],
            "k": 2
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);

    // The in-band 120 BPM track wins; the 90 BPM track takes second via
    // the stable tie-break over the equally-distant 150 BPM track
    assert_eq!(results[0]["uri"], "track:120");
    assert_eq!(results[1]["uri"], "track:90");
    assert!(results[0]["score"].as_f64().unwrap() > results[1]["score"].as_f64().unwrap());

    // Each result carries the raw feature values and a links map
    assert_eq!(results[0]["tempo"], 120.0);
    assert_eq!(results[0]["energy"], 0.5);
    assert!(results[0]["links"].as_object().unwrap().is_empty());
}

#[tokio::test]
async fn test_search_defaults_with_empty_body() {
    let server = create_test_server();

    let response = server.post("/search").json(&json!({})).await;
    response.assert_status_ok();

    // Default k is 6, larger than the snapshot: every track comes back
    let body: serde_json::Value = response.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn test_search_clamps_k() {
    let server = create_test_server();

    let response = server.post("/search").json(&json!({ "k": 50 })).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 5);

    let response = server.post("/search").json(&json!({ "k": 0 })).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_applies_class_bias() {
    let server = create_test_server();

    let response = server
        .post("/search")
        .json(&json!({
            "mood_class": "energetic",
            "k": 5
        }))
        .await;

    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    let results = body["results"].as_array().unwrap();

    // All tempi align equally badly or well with the median target, so the
    // two label-2 tracks get the bonus and float to the top
    assert_eq!(results[0]["label"], 2);
}

#[tokio::test]
async fn test_search_empty_catalog_returns_empty_results() {
    let server = create_test_server_with("uri,tempo\n");

    let response = server.post("/search").json(&json!({ "k": 3 })).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["results"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_links_derived_for_recognized_uris() {
    let server = create_test_server_with(
        "uri,tempo\n\
         spotify:track:4uLU6hMCjMI75M1A2tKUQC,120\n",
    );

    let response = server.post("/search").json(&json!({ "k": 1 })).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(
        body["results"][0]["links"]["spotify"],
        "https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"
    );
}
