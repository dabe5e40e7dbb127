//! 헬스 파이프라인 통합 테스트.
//!
//! 프로브 → 모니터 → 경고 엔진/이력 → 경고 수신자.

use async_trait::async_trait;
use pulse_alert::{AlertEngine, StaticUpdateChecker};
use pulse_core::error::CoreError;
use pulse_core::models::alert::{Alert, AlertKind, RecommendationKind, Severity};
use pulse_core::models::health::{ConnectionType, MemoryPressure};
use pulse_core::ports::probe::{
    BatteryReading, MemoryReading, MetricsProbe, NetworkReading, StorageReading,
};
use pulse_core::ports::subscriber::AlertSink;
use pulse_core::ports::update::SecurityUpdate;
use pulse_monitor::{HealthHistory, MetricsMonitor, MonitorOptions};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const GB: u64 = 1_000_000_000;

/// 메모리 사용량만 바꿀 수 있는 고정 프로브
struct AdjustableProbe {
    memory_used: AtomicU64,
}

impl AdjustableProbe {
    fn new(memory_used: u64) -> Self {
        Self {
            memory_used: AtomicU64::new(memory_used),
        }
    }

    fn set_memory_used(&self, used: u64) {
        self.memory_used.store(used, Ordering::SeqCst);
    }
}

#[async_trait]
impl MetricsProbe for AdjustableProbe {
    async fn read_memory(&self) -> Result<MemoryReading, CoreError> {
        Ok(MemoryReading {
            used: self.memory_used.load(Ordering::SeqCst),
            total: 8 * GB,
        })
    }

    async fn read_cpu(&self) -> Result<f64, CoreError> {
        Ok(20.0)
    }

    async fn read_battery(&self) -> Result<BatteryReading, CoreError> {
        Ok(BatteryReading {
            level: 0.9,
            is_charging: true,
            is_low_power_mode: false,
            cycle_count: Some(120),
        })
    }

    async fn read_storage(&self) -> Result<StorageReading, CoreError> {
        Ok(StorageReading {
            total: 256 * GB,
            used: 100 * GB,
        })
    }

    async fn read_network(&self) -> Result<NetworkReading, CoreError> {
        Ok(NetworkReading {
            connection_type: ConnectionType::Wifi,
            is_connected: true,
        })
    }
}

/// 받은 경고를 기록하는 수신자
#[derive(Default)]
struct RecordingSink {
    alerts: Mutex<Vec<Alert>>,
    calls: AtomicUsize,
}

impl RecordingSink {
    fn kinds(&self) -> Vec<AlertKind> {
        self.alerts.lock().unwrap().iter().map(|a| a.kind).collect()
    }
}

#[async_trait]
impl AlertSink for RecordingSink {
    async fn alert_raised(&self, alert: &Alert) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.alerts.lock().unwrap().push(alert.clone());
    }
}

fn options() -> MonitorOptions {
    MonitorOptions {
        sample_interval: Duration::from_secs(3600),
        speed_test_timeout: Duration::from_millis(100),
    }
}

#[tokio::test]
async fn memory_pressure_raises_high_memory_once() {
    let probe = Arc::new(AdjustableProbe::new(5_600_000_000));
    let sink = Arc::new(RecordingSink::default());
    let engine = Arc::new(AlertEngine::new().with_sink(sink.clone()));
    let history = Arc::new(HealthHistory::new(10));

    let monitor = MetricsMonitor::new(probe.clone(), None, options());
    monitor.add_subscriber(engine.clone());
    monitor.add_subscriber(history.clone());
    monitor.start().await.unwrap();

    // 70%: 경고 단계 압력, 높음 아님
    let first = monitor.current().unwrap();
    assert_eq!(first.memory.pressure, MemoryPressure::Warning);
    assert!(!first.memory.is_high);
    assert!(engine.alerts().is_empty());

    // 85%: 위험 단계, 경고 1회
    probe.set_memory_used(6_800_000_000);
    let second = monitor.request_resample().await.unwrap();
    assert_eq!(second.memory.pressure, MemoryPressure::Critical);
    assert!(second.memory.is_high);
    assert_eq!(sink.kinds(), vec![AlertKind::HighMemory]);

    // 조건이 유지돼도 중복 없음
    monitor.request_resample().await.unwrap();
    monitor.request_resample().await.unwrap();
    let high: Vec<_> = engine
        .alerts()
        .into_iter()
        .filter(|a| a.kind == AlertKind::HighMemory)
        .collect();
    assert_eq!(high.len(), 1);
    assert_eq!(high[0].severity, Severity::Medium);
    assert_eq!(sink.calls.load(Ordering::SeqCst), 1);

    assert!(engine
        .recommendations()
        .iter()
        .any(|r| r.kind == RecommendationKind::CloseBackgroundApps));
    assert_eq!(history.len(), 4);

    monitor.stop().await;
    assert!(!monitor.is_running());
}

#[tokio::test]
async fn resolved_alert_refires_after_purge() {
    let probe = Arc::new(AdjustableProbe::new(6_800_000_000));
    let engine = Arc::new(AlertEngine::new());
    let monitor = MetricsMonitor::new(probe.clone(), None, options());
    monitor.add_subscriber(engine.clone());
    monitor.start().await.unwrap();

    let original = engine.unresolved_alerts();
    assert_eq!(original.len(), 1);
    assert!(engine.resolve_alert(original[0].id));

    // 다음 패스: 해결된 경고 제거 후 조건 지속으로 새 id 재발생
    monitor.request_resample().await.unwrap();
    let refired = engine.unresolved_alerts();
    assert_eq!(refired.len(), 1);
    assert_ne!(refired[0].id, original[0].id);

    // 조건 해소 후 해결하면 더 이상 나타나지 않음
    probe.set_memory_used(GB);
    assert!(engine.resolve_alert(refired[0].id));
    monitor.request_resample().await.unwrap();
    assert!(engine.alerts().is_empty());

    monitor.stop().await;
}

#[tokio::test]
async fn security_update_is_raised_from_checker() {
    let probe = Arc::new(AdjustableProbe::new(GB));
    let checker = Arc::new(StaticUpdateChecker::new(None));
    let sink = Arc::new(RecordingSink::default());
    let engine = Arc::new(
        AlertEngine::new()
            .with_update_checker(checker.clone())
            .with_sink(sink.clone()),
    );
    let monitor = MetricsMonitor::new(probe, None, options());
    monitor.add_subscriber(engine.clone());
    monitor.start().await.unwrap();
    assert!(sink.kinds().is_empty());

    checker.set(Some(SecurityUpdate {
        version: "17.4.1".to_string(),
        summary: "보안 패치".to_string(),
    }));
    monitor.request_resample().await.unwrap();
    monitor.request_resample().await.unwrap();

    assert_eq!(sink.kinds(), vec![AlertKind::SecurityUpdate]);
    monitor.stop().await;
}

#[tokio::test]
async fn stopped_monitor_ignores_resample() {
    let monitor = MetricsMonitor::new(Arc::new(AdjustableProbe::new(GB)), None, options());
    assert!(monitor.request_resample().await.is_none());

    monitor.start().await.unwrap();
    monitor.stop().await;
    monitor.stop().await;
    assert!(monitor.request_resample().await.is_none());
    assert!(monitor.current().is_some());
}
