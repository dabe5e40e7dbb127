//! 사용량 파이프라인 통합 테스트.
//!
//! 증분 공급자 → 추적기 → 한도 평가 → 경고 엔진/수신자.

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use pulse_alert::AlertEngine;
use pulse_core::models::alert::{AlertKind, Severity};
use pulse_core::models::period::{Period, PeriodType};
use pulse_core::models::usage::{
    AlertThreshold, AppUsage, LimitType, NetworkKind, ThresholdLevel, UsageAlert, UsageDelta,
    UsageLimit,
};
use pulse_core::ports::subscriber::AlertSink;
use pulse_core::ports::usage_source::UsageDeltaSource;
use pulse_usage::{SyntheticUsageSource, TrackerOptions, UsageTracker};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const GB: u64 = 1_000_000_000;

/// 틱마다 정해진 셀룰러 바이트를 돌려주는 공급자
#[derive(Default)]
struct CellularScript {
    steps: Mutex<VecDeque<u64>>,
}

impl CellularScript {
    fn push(&self, bytes: u64) {
        self.steps.lock().unwrap().push_back(bytes);
    }
}

impl UsageDeltaSource for CellularScript {
    fn deltas(&self, apps: &[AppUsage], _elapsed: Duration) -> Vec<UsageDelta> {
        let Some(bytes) = self.steps.lock().unwrap().pop_front() else {
            return Vec::new();
        };
        apps.first()
            .map(|app| UsageDelta {
                bundle_id: app.bundle_id.clone(),
                network: NetworkKind::Cellular,
                bytes,
            })
            .into_iter()
            .collect()
    }
}

#[derive(Default)]
struct CountingSink {
    usage: AtomicUsize,
}

#[async_trait]
impl AlertSink for CountingSink {
    async fn usage_alert_raised(&self, _alert: &UsageAlert) {
        self.usage.fetch_add(1, Ordering::SeqCst);
    }
}

fn apps() -> Vec<AppUsage> {
    vec![
        AppUsage::new("com.google.ios.youtube", "YouTube"),
        AppUsage::new("com.spotify.client", "Spotify"),
    ]
}

fn five_gb_limit() -> UsageLimit {
    UsageLimit::new(
        LimitType::Cellular,
        5 * GB,
        PeriodType::ThisMonth,
        vec![
            AlertThreshold::new(75.0, ThresholdLevel::Warning).unwrap(),
            AlertThreshold::new(90.0, ThresholdLevel::Critical).unwrap(),
        ],
    )
    .unwrap()
}

#[tokio::test]
async fn cellular_limit_raises_warning_then_critical() {
    let source = Arc::new(CellularScript::default());
    let tracker = UsageTracker::new(source.clone(), apps(), TrackerOptions::default());
    let engine = Arc::new(AlertEngine::new());
    let sink = Arc::new(CountingSink::default());
    tracker.add_sink(engine.clone());
    tracker.add_sink(sink.clone());
    tracker.add_limit(five_gb_limit()).unwrap();

    let now = Utc::now();
    source.push(3_900_000_000);
    source.push(700_000_000);
    source.push(10_000_000);

    // 78%: 경고 1개
    let raised = tracker.tick_at(now).await.unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].threshold.level, ThresholdLevel::Warning);

    // 92%: 위험 1개 추가, 경고 유지
    let raised = tracker
        .tick_at(now + ChronoDuration::seconds(30))
        .await
        .unwrap();
    assert_eq!(raised.len(), 1);
    assert_eq!(raised[0].threshold.level, ThresholdLevel::Critical);

    // 계속 초과해도 중복 없음
    let raised = tracker
        .tick_at(now + ChronoDuration::seconds(60))
        .await
        .unwrap();
    assert!(raised.is_empty());

    let alerts = tracker.usage_alerts();
    assert_eq!(alerts.len(), 2);
    assert_ne!(alerts[0].id, alerts[1].id);
    assert_eq!(sink.usage.load(Ordering::SeqCst), 2);

    // 경고 엔진은 셀룰러 한도 경고를 1개만 보유
    let cellular: Vec<_> = engine
        .alerts()
        .into_iter()
        .filter(|a| a.kind == AlertKind::CellularLimit)
        .collect();
    assert_eq!(cellular.len(), 1);
    assert_eq!(cellular[0].severity, Severity::Medium);
}

#[tokio::test]
async fn read_alert_allows_refire_on_next_evaluation() {
    let source = Arc::new(CellularScript::default());
    let tracker = UsageTracker::new(source.clone(), apps(), TrackerOptions::default());
    let limit = UsageLimit::new(
        LimitType::Cellular,
        5 * GB,
        PeriodType::ThisMonth,
        vec![AlertThreshold::new(75.0, ThresholdLevel::Warning).unwrap()],
    )
    .unwrap();
    tracker.add_limit(limit).unwrap();

    let now = Utc::now();
    source.push(4 * GB);
    assert_eq!(tracker.tick_at(now).await.unwrap().len(), 1);

    assert_eq!(tracker.mark_all_alerts_read(), 1);
    let again = tracker
        .tick_at(now + ChronoDuration::seconds(1))
        .await
        .unwrap();
    assert_eq!(again.len(), 1);
    assert_eq!(tracker.usage_alerts().len(), 2);
}

#[tokio::test]
async fn synthetic_source_feeds_aggregation() {
    let tracker = UsageTracker::new(
        Arc::new(SyntheticUsageSource::new(1_000)),
        apps(),
        TrackerOptions::default(),
    );
    tracker.start().await.unwrap();

    let start = Utc::now();
    for i in 1..=3 {
        tracker
            .tick_at(start + ChronoDuration::seconds(10 * i))
            .await
            .unwrap();
    }
    tracker.stop().await;

    let window = Period::custom(start, start + ChronoDuration::minutes(5)).unwrap();
    let summary = tracker.usage_for_period(&window);
    let current = tracker.current_summary().unwrap();
    assert!(summary.total_bytes() > 0);
    assert_eq!(summary.total_bytes(), current.total_bytes());

    let stats = tracker.statistics(&window);
    assert_eq!(stats.average_daily_bytes, summary.total_bytes() / 3);
    assert_eq!(tracker.chart_data(&window).len(), 3);
}
