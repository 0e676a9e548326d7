use std::path::PathBuf;

use scan_highlight::models::ScanStatus;
use scan_highlight::{App, Config};

fn temp_output() -> PathBuf {
    std::env::temp_dir().join(format!("scan_highlight_{}", uuid::Uuid::new_v4()))
}

#[tokio::test]
async fn test_replay_folder_end_to_end() {
    let output = temp_output();
    let config = Config {
        replay_folder: concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/replays").to_string(),
        output_folder: output.to_string_lossy().to_string(),
        export_base_delay_ms: 1,
        ..Config::default()
    };
    assert!(config.provider_api_token.is_empty());

    let app = App::initialize(config).await.expect("初始化失败");
    let stats = app.run().await.expect("回放失败");

    assert_eq!(stats.total, 2);
    assert_eq!(stats.success, 1);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.failed, 0);

    let record = app.lifecycle().get("demo-1").unwrap();
    assert_eq!(record.status, ScanStatus::Completed);
    assert_eq!(record.credits, Some(1));
    assert!(record.export_started);
    assert_eq!(record.export_healthy, Some(true));
    assert_eq!(record.new_results.len(), 1);
    assert_eq!(record.report.as_deref(), Some(&b"%PDF-1.4 replay"[..]));
    assert_eq!(record.options.filename.as_deref(), Some("sample.txt"));
    assert_eq!(record.exported.len(), 1);
    assert_eq!(record.editorial.len(), 1);

    let markup = std::fs::read_to_string(output.join("demo-1.html")).unwrap();
    assert!(markup.contains(r#"<mark class="hl hl-spelling""#));
    assert!(markup.contains(r#"data-source="https://example.com/cats""#));
    assert!(markup.contains("Cats &lt;and&gt; dogs"));

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(output.join("demo-1.json")).unwrap()).unwrap();
    assert_eq!(report["stats"]["editorial_count"], 1);
    assert_eq!(report["stats"]["content_match_count"], 2);
    let lines = report["lines"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["line"], 2);
    assert_eq!(lines[1]["text"], "A dog barked twice.");

    let summaries = app.lifecycle().list().unwrap();
    assert_eq!(summaries.len(), 2);

    let _ = std::fs::remove_dir_all(&output);
}

#[tokio::test]
async fn test_missing_replay_folder_is_error() {
    let config = Config {
        replay_folder: "does/not/exist".to_string(),
        output_folder: temp_output().to_string_lossy().to_string(),
        ..Config::default()
    };

    let app = App::initialize(config).await.unwrap();
    assert!(app.run().await.is_err());
}
