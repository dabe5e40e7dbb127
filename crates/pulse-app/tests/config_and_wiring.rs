//! 설정 및 DI 와이어링 통합 테스트.
//!
//! AppConfig/사용자 설정 → 어댑터 생성, 이력 → 내보내기.

use pulse_alert::AlertEngine;
use pulse_core::config::AppConfig;
use pulse_core::config_manager::{ConfigManager, CONFIG_FILE_NAME};
use pulse_core::ports::settings::{SettingsStore, UserSettings};
use pulse_monitor::{HealthHistory, MetricsMonitor, MonitorOptions, SysInfoProbe};
use pulse_storage::export::DeviceDescriptor;
use pulse_storage::settings::SETTINGS_FILE_NAME;
use pulse_storage::{export_snapshot, ExportFormat, ExportMetadata, Exporter, JsonSettingsStore};
use pulse_usage::{demo_apps, SyntheticUsageSource, TrackerOptions, UsageTracker};
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

#[test]
fn config_defaults_are_valid() {
    let config = AppConfig::default_config();
    config.validate().unwrap();

    assert!(config.monitor.history_capacity > 0);
    assert!(config.monitor.speed_test_timeout_ms > 0);
    assert!(config.usage.tick_interval_ms > config.monitor.sample_interval_ms);
    assert!(config.notification.enabled);
}

#[test]
fn config_manager_creates_then_reads_edited_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join(CONFIG_FILE_NAME);

    let manager = ConfigManager::with_path(path.clone()).unwrap();
    assert!(path.exists());

    let mut edited = manager.get();
    edited.monitor.sample_interval_ms = 1_500;
    std::fs::write(&path, serde_json::to_string_pretty(&edited).unwrap()).unwrap();

    let reopened = ConfigManager::with_path(path).unwrap();
    assert_eq!(reopened.get().monitor.sample_interval_ms, 1_500);
}

#[test]
fn options_follow_config() {
    let mut config = AppConfig::default_config();
    config.monitor.sample_interval_ms = 2_000;
    config.usage.history_capacity = 10;

    let monitor = MonitorOptions::from_config(&config);
    assert_eq!(monitor.sample_interval, Duration::from_secs(2));
    assert_eq!(monitor.speed_test_timeout, Duration::from_secs(3));

    let tracker = TrackerOptions::from_config(&config);
    assert_eq!(tracker.history_capacity, 10);
}

#[test]
fn user_settings_persist_in_data_dir() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join(SETTINGS_FILE_NAME);
    {
        let store = Arc::new(JsonSettingsStore::open(path.clone()).unwrap());
        let settings = UserSettings::new(store);
        settings
            .set_refresh_interval(Duration::from_secs(15))
            .unwrap();
        settings.set_show_alerts(false).unwrap();
    }
    let settings = UserSettings::new(Arc::new(JsonSettingsStore::open(path).unwrap()));
    assert_eq!(settings.refresh_interval(), Some(Duration::from_secs(15)));
    assert!(!settings.show_alerts());
    assert!(settings.notifications_enabled());
}

#[tokio::test]
async fn all_adapters_instantiate_and_export() {
    let dir = TempDir::new().unwrap();
    let config = AppConfig::default_config();

    let settings_store =
        Arc::new(JsonSettingsStore::open(dir.path().join(SETTINGS_FILE_NAME)).unwrap());
    let engine = Arc::new(AlertEngine::new());
    let history = Arc::new(HealthHistory::new(config.monitor.history_capacity));
    let monitor = MetricsMonitor::new(
        Arc::new(SysInfoProbe::new()),
        None,
        MonitorOptions::from_config(&config),
    );
    monitor.add_subscriber(engine.clone());
    monitor.add_subscriber(history.clone());

    let tracker = UsageTracker::new(
        Arc::new(SyntheticUsageSource::default()),
        demo_apps(),
        TrackerOptions::from_config(&config),
    );
    tracker.add_sink(engine.clone());

    monitor.start().await.unwrap();
    tracker.start().await.unwrap();
    monitor.stop().await;
    tracker.stop().await;

    // 프로브 실패 여부와 무관하게 스냅샷 1개
    assert_eq!(history.len(), 1);
    assert!(!engine.recommendations().is_empty());

    let snapshots: Vec<_> = history.snapshots().iter().map(|s| (**s).clone()).collect();
    let doc = export_snapshot(
        ExportMetadata::new("0.1.0", "test", DeviceDescriptor::current()),
        settings_store.snapshot(),
        &snapshots,
        &engine.alerts(),
        &engine.recommendations(),
    );

    let exporter = Exporter::new(dir.path().join("exports"));
    let json = exporter.export_to_file(&doc, ExportFormat::Json).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(json).unwrap()).unwrap();
    assert_eq!(value["health_history"].as_array().unwrap().len(), 1);

    let csv = exporter.export_to_file(&doc, ExportFormat::Csv).unwrap();
    let text = std::fs::read_to_string(csv).unwrap();
    assert!(text.starts_with("# metadata\n"));
    assert!(text.contains("# recommendations\ntype,title,description,action,impact,completed\n"));
}
