//! 경고 엔진.
//!
//! 스냅샷마다 규칙을 평가하고, 같은 유형의 미해결 경고가 있으면 후보를 버린다.
//! 삽입 후 해결된 경고를 제거하고 권장 조치 목록은 통째로 교체한다.

use async_trait::async_trait;
use parking_lot::RwLock;
use pulse_core::models::alert::{Alert, Recommendation};
use pulse_core::models::health::HealthSnapshot;
use pulse_core::models::usage::UsageAlert;
use pulse_core::ports::subscriber::{AlertSink, SnapshotSubscriber};
use pulse_core::ports::update::{SecurityUpdate, UpdateChecker};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::recommendations::recommend;
use crate::rules;

/// 분석 패스 결과
#[derive(Debug, Clone)]
pub struct Analysis {
    /// 패스 이후 활성 경고 전체
    pub alerts: Vec<Alert>,
    /// 새 권장 조치 목록
    pub recommendations: Vec<Recommendation>,
    /// 이번 패스에서 새로 추가된 경고
    pub raised: Vec<Alert>,
}

#[derive(Debug, Default)]
struct EngineState {
    alerts: Vec<Alert>,
    recommendations: Vec<Recommendation>,
}

impl EngineState {
    /// 같은 유형의 미해결 경고가 없을 때만 추가
    fn insert(&mut self, candidate: Alert) -> bool {
        let duplicate = self
            .alerts
            .iter()
            .any(|a| !a.resolved && a.kind == candidate.kind);
        if duplicate {
            return false;
        }
        self.alerts.push(candidate);
        true
    }
}

/// 경고 엔진
#[derive(Default)]
pub struct AlertEngine {
    state: RwLock<EngineState>,
    update_checker: Option<Arc<dyn UpdateChecker>>,
    sinks: RwLock<Vec<Arc<dyn AlertSink>>>,
}

impl AlertEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 보안 업데이트 확인기 지정
    pub fn with_update_checker(mut self, checker: Arc<dyn UpdateChecker>) -> Self {
        self.update_checker = Some(checker);
        self
    }

    /// 새 경고 수신자 등록
    pub fn with_sink(self, sink: Arc<dyn AlertSink>) -> Self {
        self.add_sink(sink);
        self
    }

    pub fn add_sink(&self, sink: Arc<dyn AlertSink>) {
        self.sinks.write().push(sink);
    }

    /// 분석 패스 1회
    ///
    /// 해결 표시된 경고는 이번 패스 삽입 이후 제거된다. 조건이 계속 유지되면
    /// 새 id로 다시 발생한다.
    pub fn analyze(
        &self,
        snapshot: &HealthSnapshot,
        pending_update: Option<&SecurityUpdate>,
    ) -> Analysis {
        let mut candidates = rules::evaluate(snapshot);
        if let Some(update) = pending_update {
            candidates.push(rules::security_update(update, snapshot.timestamp));
        }

        let mut state = self.state.write();
        let mut raised = Vec::new();
        for candidate in candidates {
            if state.insert(candidate.clone()) {
                debug!("경고 발생: {}", candidate.kind.as_str());
                raised.push(candidate);
            }
        }

        let before = state.alerts.len();
        state.alerts.retain(|a| !a.resolved);
        let purged = before - state.alerts.len();
        if purged > 0 {
            debug!("해결된 경고 {purged}개 제거");
        }

        state.recommendations = recommend(snapshot);

        Analysis {
            alerts: state.alerts.clone(),
            recommendations: state.recommendations.clone(),
            raised,
        }
    }

    /// 외부에서 만든 경고를 중복 억제 규칙으로 추가
    pub fn raise(&self, alert: Alert) -> bool {
        self.state.write().insert(alert)
    }

    /// 전체 경고 (해결 표시 포함)
    pub fn alerts(&self) -> Vec<Alert> {
        self.state.read().alerts.clone()
    }

    pub fn unresolved_alerts(&self) -> Vec<Alert> {
        self.state
            .read()
            .alerts
            .iter()
            .filter(|a| !a.resolved)
            .cloned()
            .collect()
    }

    pub fn recommendations(&self) -> Vec<Recommendation> {
        self.state.read().recommendations.clone()
    }

    /// 해결 표시 (다음 패스에서 제거). 없는 id면 false
    pub fn resolve_alert(&self, id: Uuid) -> bool {
        let mut state = self.state.write();
        match state.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) => {
                alert.resolved = true;
                true
            }
            None => false,
        }
    }

    /// 즉시 제거. 없는 id면 false
    pub fn dismiss_alert(&self, id: Uuid) -> bool {
        let mut state = self.state.write();
        let before = state.alerts.len();
        state.alerts.retain(|a| a.id != id);
        state.alerts.len() != before
    }

    /// 권장 조치 완료 표시. 없는 id면 false
    pub fn complete_recommendation(&self, id: Uuid) -> bool {
        let mut state = self.state.write();
        match state.recommendations.iter_mut().find(|r| r.id == id) {
            Some(rec) => {
                rec.is_completed = true;
                true
            }
            None => false,
        }
    }

    /// 경고와 권장 조치 모두 비우기
    pub fn clear_all(&self) {
        let mut state = self.state.write();
        state.alerts.clear();
        state.recommendations.clear();
        info!("경고/권장 조치 초기화");
    }

    async fn pending_update(&self) -> Option<SecurityUpdate> {
        let checker = self.update_checker.as_ref()?;
        match checker.pending_security_update().await {
            Ok(update) => update,
            Err(e) => {
                warn!("보안 업데이트 확인 실패: {e}");
                None
            }
        }
    }

    async fn forward(&self, raised: &[Alert]) {
        if raised.is_empty() {
            return;
        }
        let sinks = self.sinks.read().clone();
        for alert in raised {
            for sink in &sinks {
                sink.alert_raised(alert).await;
            }
        }
    }
}

#[async_trait]
impl SnapshotSubscriber for AlertEngine {
    fn name(&self) -> &str {
        "alert_engine"
    }

    async fn on_snapshot(&self, snapshot: Arc<HealthSnapshot>) {
        let update = self.pending_update().await;
        let analysis = self.analyze(&snapshot, update.as_ref());
        if !analysis.raised.is_empty() {
            info!(
                "새 경고 {}개 (활성 {}개)",
                analysis.raised.len(),
                analysis.alerts.len()
            );
        }
        self.forward(&analysis.raised).await;
    }
}

/// 셀룰러 사용량 경고를 `CellularLimit` 경고로 받아들인다 (재알림 없음)
#[async_trait]
impl AlertSink for AlertEngine {
    async fn usage_alert_raised(&self, alert: &UsageAlert) {
        if let Some(candidate) = rules::cellular_limit(alert) {
            if self.raise(candidate) {
                debug!("셀룰러 한도 경고 추가");
            }
        }
    }
}

/// 고정 응답 업데이트 확인기
pub struct StaticUpdateChecker {
    pending: RwLock<Option<SecurityUpdate>>,
}

impl StaticUpdateChecker {
    pub fn new(pending: Option<SecurityUpdate>) -> Self {
        Self {
            pending: RwLock::new(pending),
        }
    }

    pub fn set(&self, pending: Option<SecurityUpdate>) {
        *self.pending.write() = pending;
    }
}

#[async_trait]
impl UpdateChecker for StaticUpdateChecker {
    async fn pending_security_update(
        &self,
    ) -> Result<Option<SecurityUpdate>, pulse_core::error::CoreError> {
        Ok(self.pending.read().clone())
    }
}

impl std::fmt::Debug for AlertEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("AlertEngine")
            .field("alerts", &state.alerts.len())
            .field("recommendations", &state.recommendations.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_core::models::alert::{AlertKind, RecommendationKind};
    use pulse_core::models::health::MemoryPressure;
    use pulse_core::models::usage::{AlertThreshold, LimitType, ThresholdLevel};
    use pulse_monitor::builder::{HealthSnapshotBuilder, ProbeFallbacks, ProbeReadings};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn readings() -> ProbeReadings {
        let f = ProbeFallbacks::default();
        ProbeReadings {
            memory: f.memory,
            cpu_percent: 0.0,
            battery: f.battery,
            storage: f.storage,
            network: f.network,
        }
    }

    fn snapshot_with_memory(used: u64, total: u64) -> HealthSnapshot {
        let mut r = readings();
        r.memory.used = used;
        r.memory.total = total;
        HealthSnapshotBuilder::new().assemble(&r, None, Utc::now())
    }

    fn stressed_snapshot() -> HealthSnapshot {
        let mut r = readings();
        r.memory.used = r.memory.total;
        r.cpu_percent = 95.0;
        r.storage.used = r.storage.total;
        HealthSnapshotBuilder::new().assemble(&r, None, Utc::now())
    }

    #[derive(Default)]
    struct CountingSink {
        alerts: AtomicUsize,
    }

    #[async_trait]
    impl AlertSink for CountingSink {
        async fn alert_raised(&self, _alert: &Alert) {
            self.alerts.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn repeated_analysis_is_idempotent() {
        let engine = AlertEngine::new();
        let snapshot = stressed_snapshot();

        let first = engine.analyze(&snapshot, None);
        assert_eq!(first.raised.len(), 3);

        for _ in 0..5 {
            let again = engine.analyze(&snapshot, None);
            assert!(again.raised.is_empty());
            assert_eq!(again.alerts.len(), 3);
        }
        let ids: Vec<_> = engine.alerts().iter().map(|a| a.id).collect();
        let first_ids: Vec<_> = first.alerts.iter().map(|a| a.id).collect();
        assert_eq!(ids, first_ids);
    }

    #[test]
    fn resolved_alert_is_purged_on_next_pass() {
        let engine = AlertEngine::new();
        let stressed = stressed_snapshot();
        engine.analyze(&stressed, None);

        let target = engine
            .alerts()
            .into_iter()
            .find(|a| a.kind == AlertKind::HighCpu)
            .unwrap();
        assert!(engine.resolve_alert(target.id));
        assert!(engine
            .alerts()
            .iter()
            .any(|a| a.id == target.id && a.resolved));
        assert_eq!(engine.unresolved_alerts().len(), 2);

        let mut calm = readings();
        calm.memory.used = calm.memory.total;
        calm.storage.used = calm.storage.total;
        let calm = HealthSnapshotBuilder::new().assemble(&calm, None, Utc::now());
        let analysis = engine.analyze(&calm, None);

        assert!(analysis.alerts.iter().all(|a| a.id != target.id));
        assert!(analysis.alerts.iter().all(|a| a.kind != AlertKind::HighCpu));
        assert_eq!(analysis.alerts.len(), 2);
    }

    #[test]
    fn resolved_kind_can_fire_again_with_new_id() {
        let engine = AlertEngine::new();
        let stressed = stressed_snapshot();
        engine.analyze(&stressed, None);
        let cpu = engine
            .alerts()
            .into_iter()
            .find(|a| a.kind == AlertKind::HighCpu)
            .unwrap();
        engine.resolve_alert(cpu.id);

        let analysis = engine.analyze(&stressed, None);
        let again: Vec<_> = analysis
            .alerts
            .iter()
            .filter(|a| a.kind == AlertKind::HighCpu)
            .collect();
        assert_eq!(again.len(), 1);
        assert_ne!(again[0].id, cpu.id);
        assert!(!again[0].resolved);
    }

    #[test]
    fn memory_pressure_scenario() {
        let engine = AlertEngine::new();

        let warning = snapshot_with_memory(5_600_000_000, 8_000_000_000);
        assert_eq!(warning.memory.pressure, MemoryPressure::Warning);
        assert!(!warning.memory.is_high);
        let analysis = engine.analyze(&warning, None);
        assert!(analysis
            .alerts
            .iter()
            .all(|a| a.kind != AlertKind::HighMemory));

        let critical = snapshot_with_memory(6_800_000_000, 8_000_000_000);
        assert_eq!(critical.memory.pressure, MemoryPressure::Critical);
        assert!(critical.memory.is_high);
        engine.analyze(&critical, None);
        engine.analyze(&critical, None);

        let high: Vec<_> = engine
            .alerts()
            .into_iter()
            .filter(|a| a.kind == AlertKind::HighMemory)
            .collect();
        assert_eq!(high.len(), 1);
    }

    #[test]
    fn recommendations_replaced_each_pass() {
        let engine = AlertEngine::new();
        let snapshot = stressed_snapshot();
        let first = engine.analyze(&snapshot, None);
        let second = engine.analyze(&snapshot, None);

        let kinds = |list: &[Recommendation]| list.iter().map(|r| r.kind).collect::<Vec<_>>();
        assert_eq!(kinds(&first.recommendations), kinds(&second.recommendations));
        assert!(first
            .recommendations
            .iter()
            .zip(&second.recommendations)
            .all(|(a, b)| a.id != b.id));
        let second_kinds = kinds(&second.recommendations);
        assert!(second_kinds.contains(&RecommendationKind::CloseBackgroundApps));
    }

    #[test]
    fn unknown_ids_are_noops() {
        let engine = AlertEngine::new();
        engine.analyze(&stressed_snapshot(), None);
        let missing = Uuid::new_v4();
        assert!(!engine.resolve_alert(missing));
        assert!(!engine.dismiss_alert(missing));
        assert!(!engine.complete_recommendation(missing));
        assert_eq!(engine.alerts().len(), 3);
    }

    #[test]
    fn dismiss_and_complete() {
        let engine = AlertEngine::new();
        let analysis = engine.analyze(&stressed_snapshot(), None);

        assert!(engine.dismiss_alert(analysis.alerts[0].id));
        assert_eq!(engine.alerts().len(), 2);

        let rec = analysis.recommendations[0].id;
        assert!(engine.complete_recommendation(rec));
        assert!(engine.recommendations()[0].is_completed);

        engine.clear_all();
        assert!(engine.alerts().is_empty());
        assert!(engine.recommendations().is_empty());
    }

    #[tokio::test]
    async fn subscriber_uses_update_checker_and_forwards_new_alerts() {
        let checker = Arc::new(StaticUpdateChecker::new(Some(SecurityUpdate {
            version: "17.4.1".to_string(),
            summary: "WebKit 취약점 수정".to_string(),
        })));
        let sink = Arc::new(CountingSink::default());
        let engine = AlertEngine::new()
            .with_update_checker(checker.clone())
            .with_sink(sink.clone());

        let snapshot = Arc::new(stressed_snapshot());
        engine.on_snapshot(Arc::clone(&snapshot)).await;
        engine.on_snapshot(Arc::clone(&snapshot)).await;

        assert_eq!(sink.alerts.load(Ordering::SeqCst), 4);
        let security: Vec<_> = engine
            .alerts()
            .into_iter()
            .filter(|a| a.kind == AlertKind::SecurityUpdate)
            .collect();
        assert_eq!(security.len(), 1);

        checker.set(None);
        engine.resolve_alert(security[0].id);
        engine.on_snapshot(snapshot).await;
        assert!(engine
            .alerts()
            .iter()
            .all(|a| a.kind != AlertKind::SecurityUpdate));
    }

    #[tokio::test]
    async fn cellular_usage_alert_becomes_cellular_limit() {
        let sink = Arc::new(CountingSink::default());
        let engine = AlertEngine::new().with_sink(sink.clone());
        let usage = UsageAlert {
            id: Uuid::new_v4(),
            limit_type: LimitType::Cellular,
            current_usage: 3_900_000_000,
            limit_value: 5_000_000_000,
            threshold: AlertThreshold::new(75.0, ThresholdLevel::Warning).unwrap(),
            timestamp: Utc::now(),
            is_read: false,
        };

        engine.usage_alert_raised(&usage).await;
        engine.usage_alert_raised(&usage).await;

        let cellular: Vec<_> = engine
            .alerts()
            .into_iter()
            .filter(|a| a.kind == AlertKind::CellularLimit)
            .collect();
        assert_eq!(cellular.len(), 1);
        assert_eq!(sink.alerts.load(Ordering::SeqCst), 0);
    }
}
