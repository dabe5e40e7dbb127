//! 로그 기반 알림 어댑터.

use async_trait::async_trait;
use pulse_core::error::CoreError;
use pulse_core::ports::notifier::Notifier;
use tracing::info;

/// 알림을 로그로 출력 (헤드리스 실행용)
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn show_notification(&self, title: &str, body: &str) -> Result<(), CoreError> {
        info!(target: "pulse::notification", "🔔 {title}: {body}");
        Ok(())
    }
}
