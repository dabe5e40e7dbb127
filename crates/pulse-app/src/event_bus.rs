//! 내부 이벤트 버스.
//!
//! `tokio::broadcast` 기반. 모니터 구독자/경고 수신자로 등록되어
//! 스냅샷과 경고를 앱 이벤트로 중계한다.

use async_trait::async_trait;
use pulse_core::models::alert::Alert;
use pulse_core::models::health::HealthSnapshot;
use pulse_core::models::usage::UsageAlert;
use pulse_core::ports::subscriber::{AlertSink, SnapshotSubscriber};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::debug;

/// 내부 앱 이벤트
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// 새 헬스 스냅샷 게시
    SnapshotPublished(Arc<HealthSnapshot>),
    /// 새 시스템 경고
    AlertRaised(Alert),
    /// 새 사용량 경고
    UsageAlertRaised(UsageAlert),
}

/// 내부 이벤트 버스
pub struct EventBus {
    tx: broadcast::Sender<AppEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// 이벤트 발행 (수신자가 없으면 버림)
    pub fn publish(&self, event: AppEvent) {
        debug!("이벤트 발행: {:?}", std::mem::discriminant(&event));
        let _ = self.tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(128)
    }
}

#[async_trait]
impl SnapshotSubscriber for EventBus {
    fn name(&self) -> &str {
        "event_bus"
    }

    async fn on_snapshot(&self, snapshot: Arc<HealthSnapshot>) {
        self.publish(AppEvent::SnapshotPublished(snapshot));
    }
}

#[async_trait]
impl AlertSink for EventBus {
    async fn alert_raised(&self, alert: &Alert) {
        self.publish(AppEvent::AlertRaised(alert.clone()));
    }

    async fn usage_alert_raised(&self, alert: &UsageAlert) {
        self.publish(AppEvent::UsageAlertRaised(alert.clone()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use pulse_core::models::alert::{AlertKind, Severity};

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        let alert = Alert::new(AlertKind::HighCpu, "CPU", "95%", Severity::Medium, Utc::now());
        bus.alert_raised(&alert).await;

        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::AlertRaised(a) if a.id == alert.id));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let alert = Alert::new(AlertKind::LowStorage, "저장공간", "", Severity::High, Utc::now());
        bus.publish(AppEvent::AlertRaised(alert));

        assert!(matches!(rx1.recv().await.unwrap(), AppEvent::AlertRaised(_)));
        assert!(matches!(rx2.recv().await.unwrap(), AppEvent::AlertRaised(_)));
    }

    #[test]
    fn publish_without_receivers_is_dropped() {
        let bus = EventBus::default();
        let alert = Alert::new(AlertKind::HighCpu, "CPU", "", Severity::Medium, Utc::now());
        bus.publish(AppEvent::AlertRaised(alert));
    }
}
