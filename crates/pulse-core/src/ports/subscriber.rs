//! 스냅샷 구독 / 경고 수신 포트.
//!
//! 구독자는 등록 순서대로, 발행과 같은 틱 안에서 순차 호출된다.

use async_trait::async_trait;
use std::sync::Arc;

use crate::models::alert::Alert;
use crate::models::health::HealthSnapshot;
use crate::models::usage::UsageAlert;

/// 헬스 스냅샷 구독자
#[async_trait]
pub trait SnapshotSubscriber: Send + Sync {
    /// 로그용 이름
    fn name(&self) -> &str;

    /// 새 스냅샷 발행 시 호출
    async fn on_snapshot(&self, snapshot: Arc<HealthSnapshot>);
}

/// 새로 발생한 경고 수신자
#[async_trait]
pub trait AlertSink: Send + Sync {
    /// 새 시스템 경고
    async fn alert_raised(&self, _alert: &Alert) {}

    /// 새 사용량 경고
    async fn usage_alert_raised(&self, _alert: &UsageAlert) {}
}
