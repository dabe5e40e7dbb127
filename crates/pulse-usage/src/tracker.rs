//! 데이터 사용량 추적기.
//!
//! 앱별 누적 카운터 테이블과 주기 틱 루프를 소유한다. 틱마다 증분 요약을
//! 이력에 추가하고 같은 증분을 날짜별 누계에 합산한다. "현재" 요약은 오늘
//! 누계, 한도는 각자의 기간 누계로 평가한다. 이력은 틱별 증분이므로 기간
//! 합계는 이력 요약을 그대로 더하면 된다.

use chrono::{DateTime, Local, Utc};
use parking_lot::RwLock;
use pulse_core::config::AppConfig;
use pulse_core::error::CoreError;
use pulse_core::history::BoundedHistory;
use pulse_core::models::period::{Period, PeriodType};
use pulse_core::models::usage::{
    AppUsage, ChartPoint, UsageAlert, UsageLimit, UsageStatistics, UsageSummary,
};
use pulse_core::ports::subscriber::AlertSink;
use pulse_core::ports::usage_source::UsageDeltaSource;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::ledger::DailyLedger;
use crate::limits::LimitBook;
use crate::period;

/// 추적기 동작 옵션
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerOptions {
    pub tick_interval: Duration,
    pub history_capacity: usize,
    pub max_alerts: usize,
}

impl TrackerOptions {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            tick_interval: config.usage_tick_interval(),
            history_capacity: config.usage.history_capacity,
            max_alerts: config.usage.max_usage_alerts,
        }
    }

    /// 틱 주기, 이력 용량, 경고 보관 한도는 0보다 커야 한다
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.tick_interval.is_zero() {
            return Err(CoreError::invalid("tick_interval", "0보다 커야 합니다"));
        }
        if self.history_capacity == 0 {
            return Err(CoreError::invalid("history_capacity", "0보다 커야 합니다"));
        }
        if self.max_alerts == 0 {
            return Err(CoreError::invalid("max_alerts", "0보다 커야 합니다"));
        }
        Ok(())
    }
}

impl Default for TrackerOptions {
    fn default() -> Self {
        Self::from_config(&AppConfig::default_config())
    }
}

struct TrackerState {
    /// 추적 시작 이후 누적 카운터 (bundle id 키)
    apps: BTreeMap<String, AppUsage>,
    /// 틱별 증분 요약
    history: BoundedHistory<UsageSummary>,
    /// 날짜별 증분 누계 (이력에서 밀려난 증분 포함)
    ledger: DailyLedger,
    current: Option<UsageSummary>,
    limits: LimitBook,
    last_tick: Option<DateTime<Utc>>,
}

impl TrackerState {
    /// 오늘 누계로 현재 요약 재생성 (추적 중인 앱 전부 포함)
    fn rebuild_current(&mut self, now: DateTime<Utc>) -> Result<(), CoreError> {
        let today = today(now)?;
        let used = self.ledger.apps_within(&today);
        let apps = self
            .apps
            .values()
            .map(|tracked| {
                used.iter()
                    .find(|u| u.bundle_id == tracked.bundle_id)
                    .cloned()
                    .unwrap_or_else(|| AppUsage::new(&tracked.bundle_id, &tracked.display_name))
            })
            .collect();
        self.current = Some(UsageSummary::from_apps(today, apps, now));
        Ok(())
    }
}

fn today(now: DateTime<Utc>) -> Result<Period, CoreError> {
    period::resolve_period(PeriodType::Today, &now.with_timezone(&Local))
}

/// 한도 평가에 쓰는 기간들 (마지막 항목이 지난달)
fn limit_windows(now: DateTime<Utc>) -> Result<Vec<Period>, CoreError> {
    let local = now.with_timezone(&Local);
    [
        PeriodType::Today,
        PeriodType::ThisWeek,
        PeriodType::ThisMonth,
        PeriodType::LastMonth,
    ]
    .into_iter()
    .map(|t| period::resolve_period(t, &local))
    .collect()
}

struct LoopHandle {
    shutdown_tx: watch::Sender<bool>,
    join: JoinHandle<()>,
}

struct TrackerInner {
    source: Arc<dyn UsageDeltaSource>,
    options: TrackerOptions,
    state: RwLock<TrackerState>,
    sinks: RwLock<Vec<Arc<dyn AlertSink>>>,
    tick_gate: Mutex<()>,
    running: AtomicBool,
}

impl TrackerInner {
    async fn tick_at(&self, now: DateTime<Utc>) -> Result<Vec<UsageAlert>, CoreError> {
        let _gate = self.tick_gate.lock().await;
        let today = today(now)?;
        let windows = limit_windows(now)?;

        let raised = {
            let mut state = self.state.write();
            let elapsed = state
                .last_tick
                .and_then(|t| (now - t).to_std().ok())
                .unwrap_or(Duration::ZERO);

            let tracked: Vec<AppUsage> = state.apps.values().cloned().collect();
            let deltas = self.source.deltas(&tracked, elapsed);

            let mut delta_apps: BTreeMap<String, AppUsage> = tracked
                .iter()
                .map(|a| (a.bundle_id.clone(), AppUsage::new(&a.bundle_id, &a.display_name)))
                .collect();
            for delta in deltas {
                let (Some(app), Some(tick_app)) = (
                    state.apps.get_mut(&delta.bundle_id),
                    delta_apps.get_mut(&delta.bundle_id),
                ) else {
                    debug!("추적하지 않는 앱의 증분 무시: {}", delta.bundle_id);
                    continue;
                };
                app.add(delta.network, delta.bytes);
                tick_app.add(delta.network, delta.bytes);
            }

            for delta in delta_apps.values() {
                state.ledger.record(today.start, delta);
            }
            if let Some(last_month) = windows.last() {
                state.ledger.prune_before(last_month.start);
            }

            let summary = UsageSummary::from_apps(today, delta_apps.into_values().collect(), now);
            debug!(
                "사용량 틱: 셀룰러 +{} 와이파이 +{} ({}ms)",
                summary.total_cellular_bytes,
                summary.total_wifi_bytes,
                elapsed.as_millis()
            );
            if state.history.push(summary).is_some() {
                debug!("가장 오래된 사용량 요약 제거");
            }

            state.last_tick = Some(now);
            state.rebuild_current(now)?;

            let TrackerState { limits, ledger, .. } = &mut *state;
            limits.evaluate(now, |limit| {
                windows
                    .iter()
                    .find(|w| w.period_type == limit.period_type)
                    .map_or((0, 0), |w| ledger.totals(w))
            })
        };

        if !raised.is_empty() {
            info!("사용량 경고 {}개 발생", raised.len());
            let sinks = self.sinks.read().clone();
            for alert in &raised {
                for sink in &sinks {
                    sink.usage_alert_raised(alert).await;
                }
            }
        }
        Ok(raised)
    }
}

/// 데이터 사용량 추적기
pub struct UsageTracker {
    inner: Arc<TrackerInner>,
    handle: Mutex<Option<LoopHandle>>,
}

impl UsageTracker {
    /// 추적 앱 목록과 증분 공급자로 생성 (정지 상태)
    pub fn new(
        source: Arc<dyn UsageDeltaSource>,
        apps: Vec<AppUsage>,
        options: TrackerOptions,
    ) -> Self {
        let apps = apps
            .into_iter()
            .map(|a| (a.bundle_id.clone(), a))
            .collect();
        Self {
            inner: Arc::new(TrackerInner {
                source,
                options,
                state: RwLock::new(TrackerState {
                    apps,
                    history: BoundedHistory::new(options.history_capacity),
                    ledger: DailyLedger::new(),
                    current: None,
                    limits: LimitBook::new(options.max_alerts),
                    last_tick: None,
                }),
                sinks: RwLock::new(Vec::new()),
                tick_gate: Mutex::new(()),
                running: AtomicBool::new(false),
            }),
            handle: Mutex::new(None),
        }
    }

    /// 사용량 경고 수신자 등록
    pub fn add_sink(&self, sink: Arc<dyn AlertSink>) {
        self.inner.sinks.write().push(sink);
    }

    // ============================================================
    // 수명 주기
    // ============================================================

    /// 추적 시작 (이미 실행 중이면 무시)
    ///
    /// 경과 시간 기준점을 현재로 맞추고 현재 요약을 즉시 만든다.
    /// 옵션이 잘못되면 시작하지 않고 `InvalidArgument`를 반환한다.
    pub async fn start(&self) -> Result<(), CoreError> {
        self.inner.options.validate()?;

        let mut handle = self.handle.lock().await;
        if handle.is_some() {
            debug!("사용량 추적기가 이미 실행 중");
            return Ok(());
        }

        {
            let now = Utc::now();
            let mut state = self.inner.state.write();
            state.last_tick = Some(now);
            state.rebuild_current(now)?;
        }
        self.inner.running.store(true, Ordering::Release);

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let inner = Arc::clone(&self.inner);
        let period = inner.options.tick_interval;

        let join = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = shutdown_rx.changed() => {
                        break;
                    }
                    _ = interval.tick() => {
                        if let Err(e) = inner.tick_at(Utc::now()).await {
                            warn!("사용량 틱 실패: {e}");
                        }
                    }
                }
            }
            debug!("사용량 추적 루프 종료");
        });

        *handle = Some(LoopHandle { shutdown_tx, join });
        info!("사용량 추적 시작: 주기 {}ms", period.as_millis());
        Ok(())
    }

    /// 추적 정지 (멱등, 진행 중 틱 대기)
    pub async fn stop(&self) {
        let mut handle = self.handle.lock().await;
        let Some(LoopHandle { shutdown_tx, join }) = handle.take() else {
            return;
        };
        self.inner.running.store(false, Ordering::Release);
        let _ = shutdown_tx.send(true);
        if let Err(e) = join.await {
            warn!("사용량 추적 루프 종료 실패: {e}");
        }
        drop(self.inner.tick_gate.lock().await);
        info!("사용량 추적 정지");
    }

    pub fn is_running(&self) -> bool {
        self.inner.running.load(Ordering::Acquire)
    }

    /// 지정 시각으로 틱 1회 실행
    pub async fn tick_at(&self, now: DateTime<Utc>) -> Result<Vec<UsageAlert>, CoreError> {
        self.inner.tick_at(now).await
    }

    // ============================================================
    // 조회
    // ============================================================

    /// 기간 합계 (앱은 bundle id 기준 병합)
    pub fn usage_for_period(&self, period: &Period) -> UsageSummary {
        let state = self.inner.state.read();
        period::aggregate(state.history.iter(), period)
    }

    pub fn statistics(&self, period: &Period) -> UsageStatistics {
        let state = self.inner.state.read();
        period::statistics(state.history.iter(), period)
    }

    pub fn chart_data(&self, period: &Period) -> Vec<ChartPoint> {
        let state = self.inner.state.read();
        period::chart_data(state.history.iter(), period)
    }

    /// 오늘 누계 요약
    pub fn current_summary(&self) -> Option<UsageSummary> {
        self.inner.state.read().current.clone()
    }

    /// 오래된 순 증분 요약 이력
    pub fn history(&self) -> Vec<UsageSummary> {
        self.inner.state.read().history.to_vec()
    }

    /// 추적 시작 이후 누적 카운터 복사본
    pub fn apps(&self) -> Vec<AppUsage> {
        self.inner.state.read().apps.values().cloned().collect()
    }

    // ============================================================
    // 추적 앱 관리
    // ============================================================

    /// 앱 추가 (이미 있으면 false)
    pub fn track_app(&self, bundle_id: &str, display_name: &str) -> bool {
        let mut state = self.inner.state.write();
        if state.apps.contains_key(bundle_id) {
            return false;
        }
        state
            .apps
            .insert(bundle_id.to_string(), AppUsage::new(bundle_id, display_name));
        true
    }

    /// 앱 제거, 마지막 누적값 반환
    pub fn untrack_app(&self, bundle_id: &str) -> Option<AppUsage> {
        let mut state = self.inner.state.write();
        state.ledger.forget_app(bundle_id);
        state.apps.remove(bundle_id)
    }

    /// 외부에서 만든 요약을 이력에 직접 추가
    pub fn record_summary(&self, summary: UsageSummary) {
        self.inner.state.write().history.push(summary);
    }

    // ============================================================
    // 한도
    // ============================================================

    pub fn add_limit(&self, limit: UsageLimit) -> Result<Uuid, CoreError> {
        self.inner.state.write().limits.add_limit(limit)
    }

    pub fn update_limit(&self, limit: UsageLimit) -> Result<bool, CoreError> {
        self.inner.state.write().limits.update_limit(limit)
    }

    pub fn delete_limit(&self, id: Uuid) -> bool {
        self.inner.state.write().limits.delete_limit(id)
    }

    pub fn toggle_limit(&self, id: Uuid) -> bool {
        self.inner.state.write().limits.toggle_limit(id)
    }

    pub fn limits(&self) -> Vec<UsageLimit> {
        self.inner.state.read().limits.limits().to_vec()
    }

    // ============================================================
    // 사용량 경고
    // ============================================================

    pub fn usage_alerts(&self) -> Vec<UsageAlert> {
        self.inner.state.read().limits.alerts()
    }

    pub fn mark_alert_read(&self, id: Uuid) -> bool {
        self.inner.state.write().limits.mark_read(id)
    }

    pub fn mark_all_alerts_read(&self) -> usize {
        self.inner.state.write().limits.mark_all_read()
    }

    pub fn clear_usage_alerts(&self) {
        self.inner.state.write().limits.clear_alerts();
    }

    // ============================================================
    // 초기화
    // ============================================================

    /// 모든 카운터 0, 이력 비움
    pub fn reset_all(&self) -> Result<(), CoreError> {
        let now = Utc::now();
        let mut state = self.inner.state.write();
        state.apps.values_mut().for_each(AppUsage::reset);
        state.history.clear();
        state.ledger.clear();
        state.rebuild_current(now)?;
        info!("사용량 전체 초기화");
        Ok(())
    }

    /// 기간 내 이력 제거, 제거된 개수 반환
    ///
    /// 기간 안의 날짜별 누계를 함께 지우고 그만큼 누적 카운터에서 뺀다.
    /// 이력에서 이미 밀려난 증분도 누계에 남아 있으므로 같이 빠진다.
    /// 현재 요약이 기간 안에 있으면 즉시 다시 만든다.
    pub fn reset_for_period(&self, period_type: PeriodType) -> Result<usize, CoreError> {
        let now = Utc::now();
        let window = period::resolve_period(period_type, &now.with_timezone(&Local))?;
        let mut state = self.inner.state.write();

        let removed = state.history.retain(|s| !window.contains(s.timestamp));

        let removed_usage = state.ledger.remove_within(&window);
        for app in &removed_usage {
            if let Some(counter) = state.apps.get_mut(&app.bundle_id) {
                counter.cellular_bytes = counter.cellular_bytes.saturating_sub(app.cellular_bytes);
                counter.wifi_bytes = counter.wifi_bytes.saturating_sub(app.wifi_bytes);
            }
        }

        let current_in_window = state
            .current
            .as_ref()
            .is_some_and(|c| window.contains(c.timestamp));
        if current_in_window {
            state.current = None;
            state.rebuild_current(now)?;
        }

        info!("기간 사용량 초기화: {:?} {}개 제거", period_type, removed);
        Ok(removed)
    }
}
