//! 차트용 헬스 스냅샷 이력.

use async_trait::async_trait;
use parking_lot::RwLock;
use pulse_core::history::BoundedHistory;
use pulse_core::models::health::HealthSnapshot;
use pulse_core::ports::subscriber::SnapshotSubscriber;
use std::sync::Arc;

/// 게시된 스냅샷을 고정 용량으로 보관하는 구독자
pub struct HealthHistory {
    entries: RwLock<BoundedHistory<Arc<HealthSnapshot>>>,
}

impl HealthHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(BoundedHistory::new(capacity)),
        }
    }

    /// 오래된 순 스냅샷 목록
    pub fn snapshots(&self) -> Vec<Arc<HealthSnapshot>> {
        self.entries.read().to_vec()
    }

    /// 최근 `limit`개 (최신 우선)
    pub fn recent(&self, limit: usize) -> Vec<Arc<HealthSnapshot>> {
        self.entries
            .read()
            .recent(limit)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn latest(&self) -> Option<Arc<HealthSnapshot>> {
        self.entries.read().latest().cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }
}

#[async_trait]
impl SnapshotSubscriber for HealthHistory {
    fn name(&self) -> &str {
        "health_history"
    }

    async fn on_snapshot(&self, snapshot: Arc<HealthSnapshot>) {
        self.entries.write().push(snapshot);
    }
}
