//! End-to-end test: spin the dashboard router on an ephemeral port, upload a
//! CSV and drive the JSON APIs the way the page does.

use std::sync::Arc;

use behavior_scorecard::config::Config;
use behavior_scorecard::engine::ScoringEngine;
use behavior_scorecard::web::server::WebServer;

const SAMPLE: &str = "\
CustomerID,PD,income
CUST_001,0.02,45000
CUST_002,0.50,32000
CUST_003,0.97,27000
";

async fn spawn_server() -> String {
    let config: Config = toml::from_str("").expect("default config");
    let engine = Arc::new(ScoringEngine::new(Arc::new(config)).expect("engine"));
    let app = WebServer::router(engine);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve");
    });
    format!("http://{}", addr)
}

#[tokio::test]
async fn test_upload_then_dashboard_flow() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    // Before any upload the summary reports nothing loaded
    let summary: serde_json::Value = client
        .get(format!("{}/api/summary", base))
        .send()
        .await
        .expect("summary")
        .json()
        .await
        .expect("summary json");
    assert_eq!(summary["loaded"], false);

    // Upload the PD file
    let res = client
        .post(format!("{}/api/upload?name=test.csv", base))
        .header("content-type", "text/csv")
        .body(SAMPLE)
        .send()
        .await
        .expect("upload");
    assert!(res.status().is_success());
    let body: serde_json::Value = res.json().await.expect("upload json");
    assert_eq!(body["source"], "upload:test.csv");
    assert_eq!(body["kpis"]["customers"], 3);

    // KPIs: PD 0.5 scores at the offset (~686.44), 0.97 lands High
    let summary: serde_json::Value = client
        .get(format!("{}/api/summary", base))
        .send()
        .await
        .expect("summary")
        .json()
        .await
        .expect("summary json");
    assert_eq!(summary["loaded"], true);
    assert_eq!(summary["kpis"]["high_risk"], 1);

    // Distributions have bins that cover every row
    let dist: serde_json::Value = client
        .get(format!("{}/api/distribution?bins=10", base))
        .send()
        .await
        .expect("dist")
        .json()
        .await
        .expect("dist json");
    let pd_total: u64 = dist["pd"]
        .as_array()
        .expect("pd bins")
        .iter()
        .map(|b| b["count"].as_u64().unwrap_or(0))
        .sum();
    assert_eq!(pd_total, 3);

    // Category breakdown always carries the three tiers
    let cats: serde_json::Value = client
        .get(format!("{}/api/categories", base))
        .send()
        .await
        .expect("cats")
        .json()
        .await
        .expect("cats json");
    assert_eq!(cats["categories"].as_array().expect("cats array").len(), 3);

    // Top risk is sorted by PD descending
    let top: serde_json::Value = client
        .get(format!("{}/api/top-risk?limit=2", base))
        .send()
        .await
        .expect("top")
        .json()
        .await
        .expect("top json");
    let records = top["records"].as_array().expect("records");
    assert_eq!(records[0]["id"], "CUST_003");

    // Scored CSV download carries the derived columns
    let csv = client
        .get(format!("{}/api/download", base))
        .send()
        .await
        .expect("download")
        .text()
        .await
        .expect("download text");
    assert!(csv.starts_with("CustomerID,PD,income,Behavior_Score,Risk_Category"));
    assert!(csv.contains("High Risk"));

    // What-if predictor falls back to the heuristic in PD-column mode
    let prediction: serde_json::Value = client
        .post(format!("{}/api/predict", base))
        .json(&serde_json::json!({ "income": 34666.666666666664 }))
        .send()
        .await
        .expect("predict")
        .json()
        .await
        .expect("predict json");
    assert_eq!(prediction["source"], "heuristic");
    let pd = prediction["pd"].as_f64().expect("pd");
    // Inputs at the column mean leave the heuristic at the mean PD
    assert!((pd - (0.02 + 0.50 + 0.97) / 3.0).abs() < 1e-9);

    // Metrics reflect the run
    let metrics = client
        .get(format!("{}/metrics", base))
        .send()
        .await
        .expect("metrics")
        .text()
        .await
        .expect("metrics text");
    assert!(metrics.contains("scorecard_uploads_total 1"));
    assert!(metrics.contains("scorecard_rows_scored_total 3"));
}

#[tokio::test]
async fn test_upload_without_pd_column_is_rejected() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let res = client
        .post(format!("{}/api/upload", base))
        .header("content-type", "text/csv")
        .body("CustomerID,income\nCUST_001,45000\n")
        .send()
        .await
        .expect("upload");
    assert_eq!(res.status(), reqwest::StatusCode::BAD_REQUEST);
    let message = res.text().await.expect("error text");
    assert!(message.contains("'PD' column"), "message was: {}", message);

    // Nothing was installed
    let summary: serde_json::Value = client
        .get(format!("{}/api/summary", base))
        .send()
        .await
        .expect("summary")
        .json()
        .await
        .expect("summary json");
    assert_eq!(summary["loaded"], false);
}

#[tokio::test]
async fn test_download_before_upload_is_404() {
    let base = spawn_server().await;
    let client = reqwest::Client::new();

    let res = client
        .get(format!("{}/api/download", base))
        .send()
        .await
        .expect("download");
    assert_eq!(res.status(), reqwest::StatusCode::NOT_FOUND);
}
