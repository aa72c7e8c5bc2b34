//! Cross-crate 에러 경로 테스트.
//!
//! 셀렉터, 배출량 입력, 설정 파일, 스토리지 경계에서의 실패 처리를 검증한다.

use assert_matches::assert_matches;
use chrono::Utc;
use ecoprompt_core::config::{MonitorConfig, ProviderConfig, DEFAULT_TOKEN_RATIO};
use ecoprompt_core::config_manager::ConfigManager;
use ecoprompt_core::error::CoreError;
use ecoprompt_core::models::settings::SettingsUpdate;
use ecoprompt_core::ports::storage::MetricsHistory;
use ecoprompt_emissions::{compute, format_for_display};
use ecoprompt_monitor::{MonitorSession, VirtualDocument};
use ecoprompt_storage::SqliteStorage;

#[test]
fn broken_selector_does_not_stop_monitoring() {
    let mut providers = ProviderConfig::default();
    providers.selectors.insert(
        "custom".to_string(),
        vec!["div[data-testid=".to_string(), "article".to_string()],
    );
    let mut session = MonitorSession::new(MonitorConfig::default(), &providers, "custom");
    let doc = VirtualDocument::new();
    let node = doc.create_element(doc.root(), "article", &[]).unwrap();
    doc.set_text(node, "still observed").unwrap();

    let now = Utc::now();
    session.on_mutations(&doc, now);
    assert!(session.tracked(node).is_some());

    let probes = session.probe_selectors(&doc);
    assert_eq!(probes.len(), 2);
    assert_eq!(probes[0].selector, "article");
    assert_eq!(probes[0].match_count, 1);
    assert!(probes[1].error.is_some());
}

#[test]
fn invalid_emissions_input_is_typed_failure() {
    let report = compute(0, 10.0, 100.0, "gpt-4o");
    assert!(!report.success);
    assert_eq!(report.error.as_deref(), Some("Invalid output tokens"));
    assert_eq!(report.energy.wh, 0.0);
    assert_eq!(report.water.ml, 0.0);
    assert_eq!(report.carbon.grams, 0.0);

    let report = compute(10, 0.0, 100.0, "gpt-4o");
    assert!(!report.success);
    assert_eq!(format_for_display(&report).energy, "N/A");
}

#[test]
fn corrupt_config_file_is_config_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();

    let result = ConfigManager::with_path(path);
    assert!(result.is_err());
}

#[test]
fn invalid_token_ratio_falls_back_when_persisted() {
    let dir = tempfile::TempDir::new().unwrap();
    let manager = ConfigManager::with_path(dir.path().join("config.json")).unwrap();
    let config = manager.apply_settings(&SettingsUpdate::token_ratio(-2.0)).unwrap();
    assert_eq!(config.monitor.token_ratio, DEFAULT_TOKEN_RATIO);
}

#[test]
fn storage_path_is_a_directory() {
    let dir = tempfile::TempDir::new().unwrap();
    let result = SqliteStorage::open(dir.path(), 50);
    assert_matches!(result, Err(CoreError::Internal(_)));
}

#[tokio::test]
async fn storage_empty_history() {
    let storage = SqliteStorage::open_in_memory(50).unwrap();
    assert!(storage.last_metrics().await.unwrap().is_none());
    assert_eq!(storage.enforce_history_limit().await.unwrap(), 0);
}
